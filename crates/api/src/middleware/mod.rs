//! Request extractors.
//!
//! - [`auth::AuthUser`] -- Extracts the authenticated tenant from a JWT Bearer token.

pub mod auth;
