//! Snapshot DTOs for the history and fetch endpoints.

use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::domain::{BlockchainSnapshot, ChainName};
use crate::service::Paginated;

/// One stored chain-tip snapshot.
///
/// Only the fee group of the snapshot's chain family is serialized; the
/// other group's fields are omitted.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotDto {
    /// Snapshot identifier.
    pub id: Uuid,
    /// Ingestion timestamp.
    pub created_at: DateTime<Utc>,
    /// Chain name as returned by BlockCypher (e.g. `"BTC.main"`).
    pub name: String,
    /// Tip block height.
    pub height: i64,
    /// Tip block hash.
    pub hash: String,
    /// Tip block time as reported by the source.
    pub time: String,
    /// URL of the tip block.
    pub latest_url: String,
    /// Hash of the block before the tip.
    pub previous_hash: String,
    /// URL of the block before the tip.
    pub previous_url: String,
    /// Connected peers.
    pub peer_count: i32,
    /// Unconfirmed transactions.
    pub unconfirmed_count: i32,
    /// Height of the last fork.
    pub last_fork_height: i64,
    /// Hash of the last fork.
    pub last_fork_hash: String,
    /// UTXO chains: high fee per kilobyte.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub high_fee_per_kb: Option<i64>,
    /// UTXO chains: medium fee per kilobyte.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub medium_fee_per_kb: Option<i64>,
    /// UTXO chains: low fee per kilobyte.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub low_fee_per_kb: Option<i64>,
    /// Account chains: high gas price.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub high_gas_price: Option<i64>,
    /// Account chains: medium gas price.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub medium_gas_price: Option<i64>,
    /// Account chains: low gas price.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub low_gas_price: Option<i64>,
    /// Account chains: high priority fee.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub high_priority_fee: Option<i64>,
    /// Account chains: medium priority fee.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub medium_priority_fee: Option<i64>,
    /// Account chains: low priority fee.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub low_priority_fee: Option<i64>,
    /// Account chains: base fee.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_fee: Option<i64>,
}

impl From<&BlockchainSnapshot> for SnapshotDto {
    fn from(s: &BlockchainSnapshot) -> Self {
        Self {
            id: *s.id.as_uuid(),
            created_at: s.created_at,
            name: s.name.clone(),
            height: s.height,
            hash: s.hash.clone(),
            time: s.time.clone(),
            latest_url: s.latest_url.clone(),
            previous_hash: s.previous_hash.clone(),
            previous_url: s.previous_url.clone(),
            peer_count: s.peer_count,
            unconfirmed_count: s.unconfirmed_count,
            last_fork_height: s.last_fork_height,
            last_fork_hash: s.last_fork_hash.clone(),
            high_fee_per_kb: s.high_fee_per_kb,
            medium_fee_per_kb: s.medium_fee_per_kb,
            low_fee_per_kb: s.low_fee_per_kb,
            high_gas_price: s.high_gas_price,
            medium_gas_price: s.medium_gas_price,
            low_gas_price: s.low_gas_price,
            high_priority_fee: s.high_priority_fee,
            medium_priority_fee: s.medium_priority_fee,
            low_priority_fee: s.low_priority_fee,
            base_fee: s.base_fee,
        }
    }
}

/// Paginated snapshot history.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotPageResponse {
    /// Snapshots on this page, newest first.
    pub items: Vec<SnapshotDto>,
    /// Current page number.
    pub page: u32,
    /// Items per page.
    pub page_size: u32,
    /// Total number of matching snapshots.
    pub total_count: u64,
    /// Total number of pages.
    pub total_pages: u64,
}

impl From<&Paginated<BlockchainSnapshot>> for SnapshotPageResponse {
    fn from(page: &Paginated<BlockchainSnapshot>) -> Self {
        Self {
            items: page.items.iter().map(SnapshotDto::from).collect(),
            page: page.page,
            page_size: page.page_size,
            total_count: page.total_count,
            total_pages: page.total_pages(),
        }
    }
}

/// A chain the gateway snapshots.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ChainInfoDto {
    /// Canonical chain name, accepted by `GET /api/blockchain/{name}`.
    pub name: &'static str,
    /// BlockCypher endpoint path.
    pub endpoint: &'static str,
    /// Fee group the chain populates: `utxo` or `account`.
    pub family: &'static str,
}

impl From<ChainName> for ChainInfoDto {
    fn from(chain: ChainName) -> Self {
        Self {
            name: chain.as_str(),
            endpoint: chain.endpoint(),
            family: chain.family().as_str(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::domain::snapshot::fixtures::{account_snapshot, utxo_snapshot};

    fn to_json(dto: &SnapshotDto) -> serde_json::Value {
        let Ok(json) = serde_json::to_value(dto) else {
            panic!("serialization failed");
        };
        json
    }

    #[test]
    fn utxo_snapshot_omits_gas_fields() {
        let json = to_json(&SnapshotDto::from(&utxo_snapshot("BTC.main", 7)));
        assert_eq!(json["name"], "BTC.main");
        assert_eq!(json["highFeePerKb"], 30_000);
        assert_eq!(json["lastForkHeight"], -93);
        assert!(json.get("baseFee").is_none());
        assert!(json.get("highGasPrice").is_none());
    }

    #[test]
    fn account_snapshot_omits_fee_per_kb() {
        let json = to_json(&SnapshotDto::from(&account_snapshot(7)));
        assert!(json.get("highFeePerKb").is_none());
        assert!(json.get("baseFee").is_some());
        assert!(json.get("latestUrl").is_some());
    }

    #[test]
    fn page_response_carries_total_pages() {
        let page = Paginated {
            items: vec![utxo_snapshot("LTC.main", 1)],
            page: 1,
            page_size: 2,
            total_count: 5,
        };
        let Ok(json) = serde_json::to_value(SnapshotPageResponse::from(&page)) else {
            panic!("serialization failed");
        };
        assert_eq!(json["totalPages"], 3);
        assert_eq!(json["pageSize"], 2);
        assert_eq!(json["totalCount"], 5);
        assert_eq!(json["items"].as_array().map(Vec::len), Some(1));
    }

    #[test]
    fn chain_info_lists_family() {
        let info = ChainInfoDto::from(ChainName::EthMain);
        assert_eq!(info.family, "account");
        assert_eq!(info.endpoint, "/v1/eth/main");
    }
}
