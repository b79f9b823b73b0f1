//! Data Transfer Objects for REST response serialization.
//!
//! Field names are camelCase; absent optional fields are omitted.

pub mod common_dto;
pub mod snapshot_dto;

pub use common_dto::*;
pub use snapshot_dto::*;
