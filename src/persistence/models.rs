//! Database row model and column bounds for `blockchain_data`.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::PersistenceError;
use crate::domain::{BlockchainSnapshot, SnapshotId};

/// Maximum stored length (in characters) of each bounded text column.
pub mod column_lengths {
    /// `name`
    pub const NAME: usize = 50;
    /// `hash`
    pub const HASH: usize = 256;
    /// `time`
    pub const TIME: usize = 100;
    /// `latest_url`
    pub const LATEST_URL: usize = 500;
    /// `previous_hash`
    pub const PREVIOUS_HASH: usize = 256;
    /// `previous_url`
    pub const PREVIOUS_URL: usize = 500;
    /// `last_fork_hash`
    pub const LAST_FORK_HASH: usize = 256;
}

/// A stored row from the `blockchain_data` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct SnapshotRow {
    /// Gateway-assigned UUID.
    pub id: Uuid,
    /// Ingestion timestamp.
    pub created_at: DateTime<Utc>,
    /// Chain name as received.
    pub name: String,
    /// Tip height.
    pub height: i64,
    /// Tip hash.
    pub hash: String,
    /// Tip time.
    pub time: String,
    /// Tip block URL.
    pub latest_url: String,
    /// Previous block hash.
    pub previous_hash: String,
    /// Previous block URL.
    pub previous_url: String,
    /// Connected peers.
    pub peer_count: i32,
    /// Unconfirmed transactions.
    pub unconfirmed_count: i32,
    /// Last fork height.
    pub last_fork_height: i64,
    /// Last fork hash.
    pub last_fork_hash: String,
    /// High fee per kb.
    pub high_fee_per_kb: Option<i64>,
    /// Medium fee per kb.
    pub medium_fee_per_kb: Option<i64>,
    /// Low fee per kb.
    pub low_fee_per_kb: Option<i64>,
    /// High gas price.
    pub high_gas_price: Option<i64>,
    /// Medium gas price.
    pub medium_gas_price: Option<i64>,
    /// Low gas price.
    pub low_gas_price: Option<i64>,
    /// High priority fee.
    pub high_priority_fee: Option<i64>,
    /// Medium priority fee.
    pub medium_priority_fee: Option<i64>,
    /// Low priority fee.
    pub low_priority_fee: Option<i64>,
    /// Base fee.
    pub base_fee: Option<i64>,
}

impl From<SnapshotRow> for BlockchainSnapshot {
    fn from(row: SnapshotRow) -> Self {
        Self {
            id: SnapshotId::from_uuid(row.id),
            created_at: row.created_at,
            name: row.name,
            height: row.height,
            hash: row.hash,
            time: row.time,
            latest_url: row.latest_url,
            previous_hash: row.previous_hash,
            previous_url: row.previous_url,
            peer_count: row.peer_count,
            unconfirmed_count: row.unconfirmed_count,
            last_fork_height: row.last_fork_height,
            last_fork_hash: row.last_fork_hash,
            high_fee_per_kb: row.high_fee_per_kb,
            medium_fee_per_kb: row.medium_fee_per_kb,
            low_fee_per_kb: row.low_fee_per_kb,
            high_gas_price: row.high_gas_price,
            medium_gas_price: row.medium_gas_price,
            low_gas_price: row.low_gas_price,
            high_priority_fee: row.high_priority_fee,
            medium_priority_fee: row.medium_priority_fee,
            low_priority_fee: row.low_priority_fee,
            base_fee: row.base_fee,
        }
    }
}

/// Checks every bounded text column of `snapshot` against its limit.
///
/// # Errors
///
/// Returns [`PersistenceError::ColumnTooLong`] for the first column that
/// exceeds its bound.
pub fn check_column_lengths(snapshot: &BlockchainSnapshot) -> Result<(), PersistenceError> {
    let columns: [(&'static str, &str, usize); 7] = [
        ("name", &snapshot.name, column_lengths::NAME),
        ("hash", &snapshot.hash, column_lengths::HASH),
        ("time", &snapshot.time, column_lengths::TIME),
        ("latest_url", &snapshot.latest_url, column_lengths::LATEST_URL),
        ("previous_hash", &snapshot.previous_hash, column_lengths::PREVIOUS_HASH),
        ("previous_url", &snapshot.previous_url, column_lengths::PREVIOUS_URL),
        ("last_fork_hash", &snapshot.last_fork_hash, column_lengths::LAST_FORK_HASH),
    ];
    for (column, value, max) in columns {
        let len = value.chars().count();
        if len > max {
            return Err(PersistenceError::ColumnTooLong { column, max, len });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::snapshot::fixtures::utxo_snapshot;

    #[test]
    fn fixture_fits_all_columns() {
        assert!(check_column_lengths(&utxo_snapshot("BTC.main", 1)).is_ok());
    }

    #[test]
    fn over_long_name_is_rejected() {
        let snapshot = BlockchainSnapshot {
            name: "x".repeat(column_lengths::NAME + 1),
            ..utxo_snapshot("BTC.main", 1)
        };
        assert!(matches!(
            check_column_lengths(&snapshot),
            Err(PersistenceError::ColumnTooLong { column: "name", max: 50, len: 51 })
        ));
    }

    #[test]
    fn bound_is_inclusive_and_counts_chars() {
        let snapshot = BlockchainSnapshot {
            hash: "é".repeat(column_lengths::HASH),
            ..utxo_snapshot("BTC.main", 1)
        };
        assert!(check_column_lengths(&snapshot).is_ok());
    }
}
