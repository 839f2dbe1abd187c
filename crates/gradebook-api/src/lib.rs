pub mod assignments;
pub mod auth;
pub mod chatrooms;
pub mod convert;
pub mod error;
pub mod extract;
pub mod grades;
pub mod groups;
pub mod notifications;
pub mod notify;
pub mod private_messages;
pub mod profile;
pub mod remarks;
pub mod routes;
pub mod students;
pub mod targets;
pub mod task;
pub mod uploads;

pub use auth::{AppState, AppStateInner};
pub use error::ApiError;
pub use routes::router;
pub use uploads::Storage;
