//! Domain types and pure logic for tours, steps and widget analytics.
//!
//! Nothing in this crate touches the database; `tourflow-db` applies the
//! orderings and aggregations computed here.

pub mod analytics;
pub mod embed;
pub mod error;
pub mod ordering;
pub mod tour;
pub mod types;
