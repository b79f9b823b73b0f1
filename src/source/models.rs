//! Wire model of the BlockCypher chain endpoint (`GET /v1/{coin}/{chain}`).

use chrono::Utc;
use serde::Deserialize;

use crate::domain::{BlockchainSnapshot, SnapshotId};

/// JSON body returned by a BlockCypher chain endpoint.
///
/// `name`, `height`, `hash` and `time` are always present in the source
/// format and are required here; every other field defaults when missing.
/// Only one of the two fee groups is ever populated.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct BlockcypherResponse {
    /// Chain identifier, e.g. `"BTC.main"`.
    pub name: String,
    /// Tip block height.
    pub height: i64,
    /// Tip block hash.
    pub hash: String,
    /// Tip block time.
    pub time: String,
    /// URL of the tip block.
    #[serde(default)]
    pub latest_url: String,
    /// Hash of the previous block.
    #[serde(default)]
    pub previous_hash: String,
    /// URL of the previous block.
    #[serde(default)]
    pub previous_url: String,
    /// Connected peers.
    #[serde(default)]
    pub peer_count: i32,
    /// Unconfirmed transactions.
    #[serde(default)]
    pub unconfirmed_count: i32,
    /// Height of the last fork.
    #[serde(default)]
    pub last_fork_height: i64,
    /// Hash of the last fork.
    #[serde(default)]
    pub last_fork_hash: String,
    /// High fee per kb (UTXO chains).
    #[serde(default)]
    pub high_fee_per_kb: Option<i64>,
    /// Medium fee per kb (UTXO chains).
    #[serde(default)]
    pub medium_fee_per_kb: Option<i64>,
    /// Low fee per kb (UTXO chains).
    #[serde(default)]
    pub low_fee_per_kb: Option<i64>,
    /// High gas price (account chains).
    #[serde(default)]
    pub high_gas_price: Option<i64>,
    /// Medium gas price (account chains).
    #[serde(default)]
    pub medium_gas_price: Option<i64>,
    /// Low gas price (account chains).
    #[serde(default)]
    pub low_gas_price: Option<i64>,
    /// High priority fee (account chains).
    #[serde(default)]
    pub high_priority_fee: Option<i64>,
    /// Medium priority fee (account chains).
    #[serde(default)]
    pub medium_priority_fee: Option<i64>,
    /// Low priority fee (account chains).
    #[serde(default)]
    pub low_priority_fee: Option<i64>,
    /// Base fee (account chains).
    #[serde(default)]
    pub base_fee: Option<i64>,
}

impl BlockcypherResponse {
    /// Maps the response onto a new snapshot row.
    ///
    /// A fresh identifier and the current time are assigned here, at mapping
    /// time, not when the HTTP response arrived.
    #[must_use]
    pub fn into_snapshot(self) -> BlockchainSnapshot {
        BlockchainSnapshot {
            id: SnapshotId::new(),
            created_at: Utc::now(),
            name: self.name,
            height: self.height,
            hash: self.hash,
            time: self.time,
            latest_url: self.latest_url,
            previous_hash: self.previous_hash,
            previous_url: self.previous_url,
            peer_count: self.peer_count,
            unconfirmed_count: self.unconfirmed_count,
            last_fork_height: self.last_fork_height,
            last_fork_hash: self.last_fork_hash,
            high_fee_per_kb: self.high_fee_per_kb,
            medium_fee_per_kb: self.medium_fee_per_kb,
            low_fee_per_kb: self.low_fee_per_kb,
            high_gas_price: self.high_gas_price,
            medium_gas_price: self.medium_gas_price,
            low_gas_price: self.low_gas_price,
            high_priority_fee: self.high_priority_fee,
            medium_priority_fee: self.medium_priority_fee,
            low_priority_fee: self.low_priority_fee,
            base_fee: self.base_fee,
        }
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    const BTC_BODY: &str = r#"{
        "name": "BTC.main",
        "height": 840000,
        "hash": "0000000000000000000320283a032748cef8227873ff4872689bf23f1cda83a5",
        "time": "2024-04-20T00:09:27.160429Z",
        "latest_url": "https://api.blockcypher.com/v1/btc/main/blocks/0000000000000000000320283a032748cef8227873ff4872689bf23f1cda83a5",
        "previous_hash": "0000000000000000000172014ba58d66455762add0512355ad651207918494ab",
        "previous_url": "https://api.blockcypher.com/v1/btc/main/blocks/0000000000000000000172014ba58d66455762add0512355ad651207918494ab",
        "peer_count": 1003,
        "unconfirmed_count": 5120,
        "high_fee_per_kb": 45000,
        "medium_fee_per_kb": 27000,
        "low_fee_per_kb": 14000,
        "last_fork_height": 839877,
        "last_fork_hash": "00000000000000000002fa4c1b4b3b0d8fea4a5b4a3c1e7b95e3f0d1a4b7c2d9"
    }"#;

    #[test]
    fn decodes_utxo_chain_body() {
        let Ok(response) = serde_json::from_str::<BlockcypherResponse>(BTC_BODY) else {
            panic!("decode failed");
        };
        assert_eq!(response.name, "BTC.main");
        assert_eq!(response.height, 840_000);
        assert_eq!(response.peer_count, 1003);
        assert_eq!(response.high_fee_per_kb, Some(45_000));
        assert_eq!(response.base_fee, None);
    }

    #[test]
    fn optional_fields_default_when_missing() {
        let body = r#"{"name":"LTC.main","height":1,"hash":"h","time":"t"}"#;
        let Ok(response) = serde_json::from_str::<BlockcypherResponse>(body) else {
            panic!("decode failed");
        };
        assert_eq!(response.latest_url, "");
        assert_eq!(response.unconfirmed_count, 0);
        assert_eq!(response.low_fee_per_kb, None);
    }

    #[test]
    fn missing_required_field_is_rejected() {
        let body = r#"{"name":"LTC.main","height":1,"time":"t"}"#;
        assert!(serde_json::from_str::<BlockcypherResponse>(body).is_err());
    }

    #[test]
    fn into_snapshot_copies_fields_and_assigns_identity() {
        let Ok(response) = serde_json::from_str::<BlockcypherResponse>(BTC_BODY) else {
            panic!("decode failed");
        };
        let before = Utc::now();
        let first = response.clone().into_snapshot();
        let second = response.clone().into_snapshot();

        assert_ne!(first.id, second.id);
        assert!(first.created_at >= before);
        assert_eq!(first.name, response.name);
        assert_eq!(first.hash, response.hash);
        assert_eq!(first.previous_url, response.previous_url);
        assert_eq!(first.last_fork_height, response.last_fork_height);
        assert_eq!(first.medium_fee_per_kb, Some(27_000));
        assert_eq!(first.high_gas_price, None);
    }
}
