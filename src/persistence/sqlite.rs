//! SQLite implementation of the snapshot store.

use std::future::Future;
use std::str::FromStr;
use std::time::Duration;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Sqlite, SqlitePool, Transaction};

use super::PersistenceError;
use super::models::{SnapshotRow, check_column_lengths};
use crate::domain::BlockchainSnapshot;

const SCHEMA: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS blockchain_data (
        id BLOB PRIMARY KEY NOT NULL,
        created_at TEXT NOT NULL,
        name TEXT NOT NULL,
        height INTEGER NOT NULL,
        hash TEXT NOT NULL,
        time TEXT NOT NULL,
        latest_url TEXT NOT NULL,
        previous_hash TEXT NOT NULL,
        previous_url TEXT NOT NULL,
        peer_count INTEGER NOT NULL,
        unconfirmed_count INTEGER NOT NULL,
        last_fork_height INTEGER NOT NULL,
        last_fork_hash TEXT NOT NULL,
        high_fee_per_kb INTEGER,
        medium_fee_per_kb INTEGER,
        low_fee_per_kb INTEGER,
        high_gas_price INTEGER,
        medium_gas_price INTEGER,
        low_gas_price INTEGER,
        high_priority_fee INTEGER,
        medium_priority_fee INTEGER,
        low_priority_fee INTEGER,
        base_fee INTEGER
    )",
    "CREATE INDEX IF NOT EXISTS ix_blockchain_data_name_created_at \
     ON blockchain_data (name, created_at)",
    "CREATE INDEX IF NOT EXISTS ix_blockchain_data_created_at \
     ON blockchain_data (created_at)",
];

const SELECT_COLUMNS: &str = "SELECT id, created_at, name, height, hash, time, latest_url, \
     previous_hash, previous_url, peer_count, unconfirmed_count, last_fork_height, \
     last_fork_hash, high_fee_per_kb, medium_fee_per_kb, low_fee_per_kb, high_gas_price, \
     medium_gas_price, low_gas_price, high_priority_fee, medium_priority_fee, \
     low_priority_fee, base_fee FROM blockchain_data";

/// One page of stored snapshots plus the total number of matching rows.
pub type SnapshotPage = (Vec<BlockchainSnapshot>, u64);

/// Result of committing a [`SnapshotBatch`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitOutcome {
    /// The transaction committed this many rows.
    Committed(usize),
    /// Cancellation was observed before the commit; nothing was written.
    Cancelled,
}

/// SQLite-backed snapshot store using `sqlx::SqlitePool`.
#[derive(Debug, Clone)]
pub struct SnapshotStore {
    pool: SqlitePool,
}

impl SnapshotStore {
    /// Creates a store over an existing connection pool.
    #[must_use]
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Opens a pool for `database_url`, creating the database file if
    /// missing.
    ///
    /// # Errors
    ///
    /// Returns a [`PersistenceError::Database`] if the URL is invalid or no
    /// connection can be established within `connect_timeout`.
    pub async fn connect(
        database_url: &str,
        max_connections: u32,
        connect_timeout: Duration,
    ) -> Result<Self, PersistenceError> {
        let options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(connect_timeout)
            .connect_with(options)
            .await?;
        Ok(Self::new(pool))
    }

    /// Opens a single-connection in-memory store with the schema applied.
    ///
    /// The connection never idles out, so the database lives as long as
    /// the store.
    ///
    /// # Errors
    ///
    /// Returns a [`PersistenceError::Database`] if SQLite cannot be opened.
    pub async fn in_memory() -> Result<Self, PersistenceError> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect("sqlite::memory:")
            .await?;
        let store = Self::new(pool);
        store.ensure_schema().await?;
        Ok(store)
    }

    /// Creates the table and its indexes if they do not exist yet.
    ///
    /// # Errors
    ///
    /// Returns a [`PersistenceError::Database`] on database failure.
    pub async fn ensure_schema(&self) -> Result<(), PersistenceError> {
        for statement in SCHEMA {
            sqlx::query(statement).execute(&self.pool).await?;
        }
        Ok(())
    }

    /// Checks that the database answers a trivial query.
    ///
    /// # Errors
    ///
    /// Returns a [`PersistenceError::Database`] if the store is unreachable.
    pub async fn ping(&self) -> Result<(), PersistenceError> {
        sqlx::query_scalar::<_, i64>("SELECT 1")
            .fetch_one(&self.pool)
            .await?;
        Ok(())
    }

    /// Closes every pooled connection.
    pub async fn close(&self) {
        self.pool.close().await;
    }

    /// Starts an empty batch of pending inserts.
    #[must_use]
    pub fn batch(&self) -> SnapshotBatch {
        SnapshotBatch {
            pool: self.pool.clone(),
            pending: Vec::new(),
        }
    }

    /// Loads one page of all snapshots, newest first.
    ///
    /// Rows with equal `created_at` are ordered by insertion sequence,
    /// most recent first.
    ///
    /// # Errors
    ///
    /// Returns a [`PersistenceError::Database`] on database failure.
    pub async fn get_all(&self, page: u32, page_size: u32) -> Result<SnapshotPage, PersistenceError> {
        let total = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM blockchain_data")
            .fetch_one(&self.pool)
            .await?;

        let rows = sqlx::query_as::<_, SnapshotRow>(&format!(
            "{SELECT_COLUMNS} ORDER BY created_at DESC, rowid DESC LIMIT ?1 OFFSET ?2"
        ))
        .bind(i64::from(page_size))
        .bind(offset(page, page_size))
        .fetch_all(&self.pool)
        .await?;

        Ok(into_page(rows, total))
    }

    /// Loads one page of snapshots whose name equals `name`, ignoring case.
    ///
    /// # Errors
    ///
    /// Returns a [`PersistenceError::Database`] on database failure.
    pub async fn get_by_name(
        &self,
        name: &str,
        page: u32,
        page_size: u32,
    ) -> Result<SnapshotPage, PersistenceError> {
        let total = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM blockchain_data WHERE name = ?1 COLLATE NOCASE",
        )
        .bind(name)
        .fetch_one(&self.pool)
        .await?;

        let rows = sqlx::query_as::<_, SnapshotRow>(&format!(
            "{SELECT_COLUMNS} WHERE name = ?1 COLLATE NOCASE \
             ORDER BY created_at DESC, rowid DESC LIMIT ?2 OFFSET ?3"
        ))
        .bind(name)
        .bind(i64::from(page_size))
        .bind(offset(page, page_size))
        .fetch_all(&self.pool)
        .await?;

        Ok(into_page(rows, total))
    }
}

/// Pending inserts that are written together in one transaction.
///
/// Rows are only ever inserted, never updated. Dropping a batch without
/// committing it writes nothing.
#[derive(Debug)]
pub struct SnapshotBatch {
    pool: SqlitePool,
    pending: Vec<BlockchainSnapshot>,
}

impl SnapshotBatch {
    /// Marks `snapshots` as pending insert.
    pub fn add_range<I>(&mut self, snapshots: I)
    where
        I: IntoIterator<Item = BlockchainSnapshot>,
    {
        self.pending.extend(snapshots);
    }

    /// Writes every pending row atomically.
    ///
    /// # Errors
    ///
    /// Returns a [`PersistenceError`] if any row violates a column bound or
    /// the transaction fails; in either case nothing is written.
    pub async fn commit(self) -> Result<usize, PersistenceError> {
        match self.commit_or_cancel(std::future::pending::<()>()).await? {
            CommitOutcome::Committed(count) => Ok(count),
            CommitOutcome::Cancelled => Ok(0),
        }
    }

    /// Writes every pending row atomically unless `cancelled` resolves first.
    ///
    /// Cancellation is observed up to the point the transaction is asked to
    /// commit. Once the commit starts it runs to completion, so the outcome
    /// is always all rows or none.
    ///
    /// # Errors
    ///
    /// Returns a [`PersistenceError`] if any row violates a column bound or
    /// the transaction fails; in either case nothing is written.
    pub async fn commit_or_cancel<F>(self, cancelled: F) -> Result<CommitOutcome, PersistenceError>
    where
        F: Future<Output = ()>,
    {
        for snapshot in &self.pending {
            check_column_lengths(snapshot)?;
        }

        tokio::pin!(cancelled);

        let staged = tokio::select! {
            biased;
            () = &mut cancelled => None,
            staged = stage(&self.pool, &self.pending) => Some(staged?),
        };
        let Some(tx) = staged else {
            tracing::info!(pending = self.pending.len(), "batch cancelled before commit");
            return Ok(CommitOutcome::Cancelled);
        };

        tx.commit().await?;
        tracing::info!(count = self.pending.len(), "snapshot batch committed");
        Ok(CommitOutcome::Committed(self.pending.len()))
    }
}

/// Opens a transaction and inserts every row into it without committing.
async fn stage(
    pool: &SqlitePool,
    snapshots: &[BlockchainSnapshot],
) -> Result<Transaction<'static, Sqlite>, PersistenceError> {
    let mut tx = pool.begin().await?;
    for s in snapshots {
        sqlx::query(
            "INSERT INTO blockchain_data (id, created_at, name, height, hash, time, latest_url, \
             previous_hash, previous_url, peer_count, unconfirmed_count, last_fork_height, \
             last_fork_hash, high_fee_per_kb, medium_fee_per_kb, low_fee_per_kb, high_gas_price, \
             medium_gas_price, low_gas_price, high_priority_fee, medium_priority_fee, \
             low_priority_fee, base_fee) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, \
             ?18, ?19, ?20, ?21, ?22, ?23)",
        )
        .bind(*s.id.as_uuid())
        .bind(s.created_at)
        .bind(&s.name)
        .bind(s.height)
        .bind(&s.hash)
        .bind(&s.time)
        .bind(&s.latest_url)
        .bind(&s.previous_hash)
        .bind(&s.previous_url)
        .bind(s.peer_count)
        .bind(s.unconfirmed_count)
        .bind(s.last_fork_height)
        .bind(&s.last_fork_hash)
        .bind(s.high_fee_per_kb)
        .bind(s.medium_fee_per_kb)
        .bind(s.low_fee_per_kb)
        .bind(s.high_gas_price)
        .bind(s.medium_gas_price)
        .bind(s.low_gas_price)
        .bind(s.high_priority_fee)
        .bind(s.medium_priority_fee)
        .bind(s.low_priority_fee)
        .bind(s.base_fee)
        .execute(&mut *tx)
        .await?;
    }
    Ok(tx)
}

fn offset(page: u32, page_size: u32) -> i64 {
    i64::from(page.saturating_sub(1)) * i64::from(page_size)
}

fn into_page(rows: Vec<SnapshotRow>, total: i64) -> SnapshotPage {
    let total = u64::try_from(total).unwrap_or(0);
    (rows.into_iter().map(BlockchainSnapshot::from).collect(), total)
}
