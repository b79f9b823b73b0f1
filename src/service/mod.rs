//! Service layer: business logic orchestration.
//!
//! [`FetchService`] is the write path (fetch, persist, invalidate).
//! [`QueryService`] is the read path (validate, cache, read). Both run
//! their work through the stages in [`pipeline`].

pub mod fetch_service;
pub mod pipeline;
pub mod query_service;

pub use fetch_service::FetchService;
pub use query_service::{
    PageRequest, Paginated, QueryService, SnapshotPageResult, SnapshotQuery,
};
