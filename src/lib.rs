//! # chainsnap-gateway
//!
//! REST gateway that snapshots the chain tips reported by BlockCypher into
//! SQLite and serves their paginated history.
//!
//! A fetch fans out one request per configured endpoint, keeps whatever
//! succeeded, stores the batch in one transaction and voids every cached
//! query result. History queries are validated and cached for a few
//! minutes.
//!
//! ## Architecture
//!
//! ```text
//! Clients (HTTP)
//!     │
//!     ├── REST Handlers (api/)
//!     │
//!     ├── FetchService ──── BlockchainSource (source/) ── BlockCypher
//!     ├── QueryService ──── ResponseCache (domain/)
//!     │
//!     └── SnapshotStore (persistence/) ── SQLite
//! ```

pub mod api;
pub mod app_state;
pub mod config;
pub mod domain;
pub mod error;
pub mod persistence;
pub mod service;
pub mod shutdown;
pub mod source;
