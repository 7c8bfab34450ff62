pub mod analytics;
pub mod dashboard;
pub mod me;
pub mod step;
pub mod tour;
pub mod widget;
