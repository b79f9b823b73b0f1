//! Domain layer: snapshot model, supported chains, and the response cache.
//!
//! This module contains the server-side domain model: the append-only
//! [`BlockchainSnapshot`] row and its identity, the closed set of
//! [`ChainName`]s, and the shared [`ResponseCache`] with its single
//! invalidation generation.

pub mod chain_name;
pub mod response_cache;
pub mod snapshot;
pub mod snapshot_id;

pub use chain_name::{ChainFamily, ChainName};
pub use response_cache::{CacheGeneration, ResponseCache};
pub use snapshot::BlockchainSnapshot;
pub use snapshot_id::SnapshotId;
