//! Persisted point-in-time reading of a chain's tip state.

use chrono::{DateTime, Utc};

use super::{ChainFamily, ChainName, SnapshotId};

/// One ingested reading of a chain tip, as stored in `blockchain_data`.
///
/// Rows are append-only: `id` and `created_at` are assigned when the
/// BlockCypher response is mapped and never change. All other scalar fields
/// are copied verbatim from the source. Exactly one fee group is populated
/// per chain family; the other group's fields are `None`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockchainSnapshot {
    /// Gateway-assigned identifier.
    pub id: SnapshotId,
    /// Ingestion timestamp, the ordering key for history queries.
    pub created_at: DateTime<Utc>,
    /// Chain identifier as returned by the source (e.g. `"BTC.main"`).
    pub name: String,
    /// Tip block height.
    pub height: i64,
    /// Tip block hash.
    pub hash: String,
    /// Tip block time as reported by the source.
    pub time: String,
    /// URL of the tip block resource.
    pub latest_url: String,
    /// Hash of the block preceding the tip.
    pub previous_hash: String,
    /// URL of the block preceding the tip.
    pub previous_url: String,
    /// Number of peers the source is connected to.
    pub peer_count: i32,
    /// Number of unconfirmed transactions in the source's mempool.
    pub unconfirmed_count: i32,
    /// Height of the most recent fork seen by the source.
    pub last_fork_height: i64,
    /// Hash of the most recent fork seen by the source.
    pub last_fork_hash: String,
    /// High-priority fee per kilobyte (UTXO chains).
    pub high_fee_per_kb: Option<i64>,
    /// Medium-priority fee per kilobyte (UTXO chains).
    pub medium_fee_per_kb: Option<i64>,
    /// Low-priority fee per kilobyte (UTXO chains).
    pub low_fee_per_kb: Option<i64>,
    /// High gas price (account chains).
    pub high_gas_price: Option<i64>,
    /// Medium gas price (account chains).
    pub medium_gas_price: Option<i64>,
    /// Low gas price (account chains).
    pub low_gas_price: Option<i64>,
    /// High priority fee (account chains).
    pub high_priority_fee: Option<i64>,
    /// Medium priority fee (account chains).
    pub medium_priority_fee: Option<i64>,
    /// Low priority fee (account chains).
    pub low_priority_fee: Option<i64>,
    /// Base fee (account chains).
    pub base_fee: Option<i64>,
}

impl BlockchainSnapshot {
    /// Chain this snapshot belongs to, if the stored name is a supported one.
    #[must_use]
    pub fn chain(&self) -> Option<ChainName> {
        ChainName::parse(&self.name)
    }

    /// Fee layout inferred from which fee fields are populated.
    ///
    /// Returns `None` when neither group carries a value.
    #[must_use]
    pub fn fee_family(&self) -> Option<ChainFamily> {
        let utxo = [self.high_fee_per_kb, self.medium_fee_per_kb, self.low_fee_per_kb];
        let account = [
            self.high_gas_price,
            self.medium_gas_price,
            self.low_gas_price,
            self.high_priority_fee,
            self.medium_priority_fee,
            self.low_priority_fee,
            self.base_fee,
        ];
        if account.iter().any(Option::is_some) {
            Some(ChainFamily::Account)
        } else if utxo.iter().any(Option::is_some) {
            Some(ChainFamily::Utxo)
        } else {
            None
        }
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    //! Snapshot builders shared by tests across the crate.

    use super::*;

    /// A BTC-style snapshot with the fee-per-kb group populated.
    pub(crate) fn utxo_snapshot(name: &str, height: i64) -> BlockchainSnapshot {
        BlockchainSnapshot {
            id: SnapshotId::new(),
            created_at: Utc::now(),
            name: name.to_string(),
            height,
            hash: format!("hash-{height}"),
            time: "2024-01-01T00:00:00Z".to_string(),
            latest_url: format!("https://api.blockcypher.com/v1/btc/main/blocks/hash-{height}"),
            previous_hash: format!("hash-{}", height - 1),
            previous_url: format!(
                "https://api.blockcypher.com/v1/btc/main/blocks/hash-{}",
                height - 1
            ),
            peer_count: 250,
            unconfirmed_count: 1200,
            last_fork_height: height - 100,
            last_fork_hash: "fork-hash".to_string(),
            high_fee_per_kb: Some(30_000),
            medium_fee_per_kb: Some(20_000),
            low_fee_per_kb: Some(10_000),
            high_gas_price: None,
            medium_gas_price: None,
            low_gas_price: None,
            high_priority_fee: None,
            medium_priority_fee: None,
            low_priority_fee: None,
            base_fee: None,
        }
    }

    /// An ETH-style snapshot with the gas group populated.
    pub(crate) fn account_snapshot(height: i64) -> BlockchainSnapshot {
        BlockchainSnapshot {
            name: "ETH.main".to_string(),
            high_fee_per_kb: None,
            medium_fee_per_kb: None,
            low_fee_per_kb: None,
            high_gas_price: Some(40_000_000_000),
            medium_gas_price: Some(25_000_000_000),
            low_gas_price: Some(10_000_000_000),
            high_priority_fee: Some(2_000_000_000),
            medium_priority_fee: Some(1_500_000_000),
            low_priority_fee: Some(1_000_000_000),
            base_fee: Some(9_000_000_000),
            ..utxo_snapshot("ETH.main", height)
        }
    }
}
