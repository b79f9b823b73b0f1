//! Persistence layer: append-only SQLite store for blockchain snapshots.
//!
//! [`SnapshotStore`] reads paginated history and hands out
//! [`SnapshotBatch`]es, which accumulate rows and write them in a single
//! transaction. The concrete implementation uses `sqlx::SqlitePool`.

pub mod models;
pub mod sqlite;

pub use sqlite::{CommitOutcome, SnapshotBatch, SnapshotPage, SnapshotStore};

/// Storage-layer failure.
#[derive(Debug, thiserror::Error)]
pub enum PersistenceError {
    /// The database rejected or failed the operation.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A text value exceeds its column's maximum length.
    #[error("value for column {column} is {len} characters, maximum is {max}")]
    ColumnTooLong {
        /// Column name.
        column: &'static str,
        /// Maximum allowed characters.
        max: usize,
        /// Actual characters.
        len: usize,
    },
}
