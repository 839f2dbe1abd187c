use rusqlite::ffi;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, DbError>;

#[derive(Debug, Error)]
pub enum DbError {
    /// A UNIQUE or PRIMARY KEY constraint rejected the write.
    #[error("conflict: {0}")]
    Conflict(String),

    #[error("database lock poisoned")]
    LockPoisoned,

    #[error("sqlite error: {0}")]
    Sqlite(rusqlite::Error),
}

impl DbError {
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict(_))
    }
}

impl From<rusqlite::Error> for DbError {
    fn from(err: rusqlite::Error) -> Self {
        match &err {
            rusqlite::Error::SqliteFailure(e, msg)
                if e.extended_code == ffi::SQLITE_CONSTRAINT_UNIQUE
                    || e.extended_code == ffi::SQLITE_CONSTRAINT_PRIMARYKEY =>
            {
                Self::Conflict(msg.clone().unwrap_or_else(|| e.to_string()))
            }
            _ => Self::Sqlite(err),
        }
    }
}
