//! Error types for storage operations

use lingo_common::{EntityId, LingoError};
use thiserror::Error;

/// Errors returned by the store
#[derive(Error, Debug)]
pub enum StoreError {
    /// Underlying database failure
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Schema migration failure
    #[error("Migration to schema version {version} failed: {source}")]
    Migration {
        version: i64,
        #[source]
        source: sqlx::Error,
    },

    /// The owning entity no longer exists (deleted while a write was in flight)
    #[error("Entity {0} does not exist")]
    EntityMissing(EntityId),

    /// The referenced language is not in the languages table
    #[error("Unknown language: {0}")]
    UnknownLanguage(String),

    /// A uniqueness constraint was violated and could not be resolved in place
    #[error("Constraint violation: {0}")]
    ConstraintViolation(String),

    /// An attempt to modify or delete an append-only ledger row
    #[error("Append-only violation: {0}")]
    AppendOnlyViolation(String),

    /// JSON column encoding or decoding failure
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A stored row could not be mapped back to a domain value
    #[error("Corrupt row in {table}: {message}")]
    CorruptRow { table: &'static str, message: String },
}

impl StoreError {
    pub(crate) fn corrupt(table: &'static str, message: impl ToString) -> Self {
        Self::CorruptRow {
            table,
            message: message.to_string(),
        }
    }

    /// Classifies a write error by the constraint that rejected it.
    pub(crate) fn from_write(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &err {
            match db_err.kind() {
                sqlx::error::ErrorKind::UniqueViolation => {
                    return Self::ConstraintViolation(db_err.message().to_string());
                }
                _ if db_err.message().contains("append-only") => {
                    return Self::AppendOnlyViolation(db_err.message().to_string());
                }
                _ => {}
            }
        }
        Self::Database(err)
    }

    /// Whether the error is a foreign-key violation.
    pub(crate) fn is_foreign_key(err: &sqlx::Error) -> bool {
        matches!(err, sqlx::Error::Database(db_err)
            if matches!(db_err.kind(), sqlx::error::ErrorKind::ForeignKeyViolation))
    }
}

impl From<StoreError> for LingoError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::EntityMissing(id) => LingoError::not_found("entity", id),
            StoreError::UnknownLanguage(code) => {
                LingoError::validation_field(format!("unknown language: {code}"), "language")
            }
            other => LingoError::database_with_source("store operation failed", other),
        }
    }
}

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;
