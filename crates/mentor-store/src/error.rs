use thiserror::Error;

/// All store-layer errors. Kept separate from the scheduler's error type so
/// the engine can classify store failures as transient per user.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("User not found: {0}")]
    UserNotFound(String),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Corrupt row in {table}: {reason}")]
    CorruptRow { table: String, reason: String },
}

pub type Result<T> = std::result::Result<T, StoreError>;
