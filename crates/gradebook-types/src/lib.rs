pub mod api;
pub mod events;
pub mod grading;
pub mod models;
