//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async CRUD methods
//! that accept `&PgPool` as the first argument.

pub mod analytics_repo;
pub mod profile_repo;
pub mod tour_repo;
pub mod tour_step_repo;

pub use analytics_repo::AnalyticsRepo;
pub use profile_repo::ProfileRepo;
pub use tour_repo::TourRepo;
pub use tour_step_repo::TourStepRepo;
