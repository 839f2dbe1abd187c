//! Entity stores. Each module adds `impl Database` methods for one table
//! family; free functions taking `&Connection` are shared by reads that run
//! inside a wider transaction.

pub mod assignments;
pub mod chatrooms;
pub mod grades;
pub mod groups;
pub mod notifications;
pub mod private_messages;
pub mod remarks;
pub mod students;
pub mod targets;
pub mod users;
