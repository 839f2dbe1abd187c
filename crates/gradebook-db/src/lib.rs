pub mod error;
pub mod migrations;
pub mod models;
mod queries;

pub use error::{DbError, Result};
pub use queries::grades::MAX_GRADES_PER_STUDENT;

use chrono::{SecondsFormat, Utc};
use rusqlite::{Connection, Transaction};
use std::path::Path;
use std::sync::Mutex;
use tracing::info;

pub struct Database {
    conn: Mutex<Connection>,
}

impl Database {
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;

        // WAL mode for concurrent readers from other processes
        conn.pragma_update(None, "journal_mode", "WAL")?;
        let db = Self::init(conn)?;

        info!("Database opened at {}", path.display());
        Ok(db)
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self> {
        conn.pragma_update(None, "foreign_keys", "ON")?;
        migrations::run(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Run a single-statement operation: a read or an autocommitted write.
    pub fn with_conn<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> Result<T>,
    {
        let conn = self.conn.lock().map_err(|_| DbError::LockPoisoned)?;
        f(&conn)
    }

    /// Run `f` inside one transaction.
    ///
    /// Commits when `f` returns `Ok`. On `Err` the transaction is dropped,
    /// which rolls it back, and the error is returned unchanged. The
    /// connection lock is released on every path.
    pub fn transaction<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Transaction<'_>) -> Result<T>,
    {
        let mut conn = self.conn.lock().map_err(|_| DbError::LockPoisoned)?;
        let tx = conn.transaction()?;
        let value = f(&tx)?;
        tx.commit()?;
        Ok(value)
    }
}

/// Server-assigned write timestamp. Fixed width so rows sort as text.
pub(crate) fn now() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true)
}

#[cfg(test)]
pub(crate) mod test_support {
    use gradebook_types::models::Role;

    use crate::Database;
    use crate::models::NewUser;

    pub fn db() -> Database {
        Database::open_in_memory().unwrap()
    }

    pub fn new_id() -> String {
        uuid::Uuid::new_v4().to_string()
    }

    pub fn teacher(db: &Database, email: &str) -> String {
        let id = new_id();
        db.create_user(&NewUser {
            id: &id,
            name: "Ms Teacher",
            email,
            password_hash: "hash",
            role: Role::Teacher,
            teacher_id: None,
        })
        .unwrap();
        id
    }

    pub fn student(db: &Database, email: &str, teacher_id: &str) -> String {
        let id = new_id();
        db.create_user(&NewUser {
            id: &id,
            name: "Sam Student",
            email,
            password_hash: "hash",
            role: Role::Student,
            teacher_id: Some(teacher_id),
        })
        .unwrap();
        id
    }
}
