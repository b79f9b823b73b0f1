//! Paginated snapshot history queries behind the response cache.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use super::pipeline::{logged, validated};
use crate::domain::{BlockchainSnapshot, ChainName, ResponseCache};
use crate::error::GatewayError;
use crate::persistence::SnapshotStore;

/// Page number used when the client sends none.
pub const DEFAULT_PAGE: u32 = 1;
/// Page size used when the client sends none.
pub const DEFAULT_PAGE_SIZE: u32 = 50;
/// Largest page size a client may request.
pub const MAX_PAGE_SIZE: u32 = 200;

/// Clamped pagination parameters.
///
/// `page` is at least 1 and `page_size` lies in `[1, MAX_PAGE_SIZE]`,
/// whatever the client asked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    page: u32,
    page_size: u32,
}

impl PageRequest {
    /// Builds a page request from raw client input, applying defaults and
    /// clamping out-of-range values.
    #[must_use]
    pub fn new(page: Option<i64>, page_size: Option<i64>) -> Self {
        let page = page.unwrap_or(i64::from(DEFAULT_PAGE)).max(1);
        let page_size = page_size
            .unwrap_or(i64::from(DEFAULT_PAGE_SIZE))
            .clamp(1, i64::from(MAX_PAGE_SIZE));
        Self {
            page: u32::try_from(page).unwrap_or(u32::MAX),
            page_size: u32::try_from(page_size).unwrap_or(DEFAULT_PAGE_SIZE),
        }
    }

    /// 1-based page number.
    #[must_use]
    pub const fn page(&self) -> u32 {
        self.page
    }

    /// Number of items per page.
    #[must_use]
    pub const fn page_size(&self) -> u32 {
        self.page_size
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::new(None, None)
    }
}

/// A history query. Both variants are cacheable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SnapshotQuery {
    /// Every stored snapshot, newest first.
    All(PageRequest),
    /// Snapshots of one chain, newest first.
    ByName {
        /// Chain name as sent by the client.
        name: String,
        /// Pagination.
        paging: PageRequest,
    },
}

impl SnapshotQuery {
    /// Pagination of this query.
    #[must_use]
    pub const fn paging(&self) -> PageRequest {
        match self {
            Self::All(paging) | Self::ByName { paging, .. } => *paging,
        }
    }

    /// Deterministic cache key for this query and its clamped parameters.
    #[must_use]
    pub fn cache_key(&self) -> String {
        match self {
            Self::All(p) => format!("blockchain-all-p{}-s{}", p.page(), p.page_size()),
            Self::ByName { name, paging: p } => format!(
                "blockchain-{}-p{}-s{}",
                name.to_lowercase(),
                p.page(),
                p.page_size()
            ),
        }
    }

    /// Returns every validation message for this query, empty if valid.
    #[must_use]
    pub fn validate(&self) -> Vec<String> {
        let Self::ByName { name, .. } = self else {
            return Vec::new();
        };

        let mut errors = Vec::new();
        if name.trim().is_empty() {
            errors.push("Blockchain name is required.".to_string());
        }
        if !name.is_empty() && ChainName::parse(name).is_none() {
            errors.push(format!(
                "Blockchain name must be one of: {}.",
                ChainName::joined()
            ));
        }
        errors
    }
}

impl fmt::Display for SnapshotQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::All(p) => write!(
                f,
                "GetAllBlockchainData(page={}, pageSize={})",
                p.page(),
                p.page_size()
            ),
            Self::ByName { name, paging: p } => write!(
                f,
                "GetBlockchainDataByName(name={name}, page={}, pageSize={})",
                p.page(),
                p.page_size()
            ),
        }
    }
}

/// One page of results with pagination metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Paginated<T> {
    /// Items on this page.
    pub items: Vec<T>,
    /// 1-based page number.
    pub page: u32,
    /// Requested page size.
    pub page_size: u32,
    /// Number of matching items across all pages.
    pub total_count: u64,
}

impl<T> Paginated<T> {
    /// Number of pages needed to hold `total_count` items.
    #[must_use]
    pub fn total_pages(&self) -> u64 {
        if self.page_size == 0 {
            return 0;
        }
        self.total_count.div_ceil(u64::from(self.page_size))
    }
}

/// Cached page of snapshots, shared between the cache and responses.
pub type SnapshotPageResult = Arc<Paginated<BlockchainSnapshot>>;

/// Read side of the gateway: validated, cached history queries.
#[derive(Debug, Clone)]
pub struct QueryService {
    store: SnapshotStore,
    cache: ResponseCache<SnapshotPageResult>,
    cache_ttl: Duration,
}

impl QueryService {
    /// Creates a query service over `store`, caching results in `cache`
    /// for `cache_ttl`.
    #[must_use]
    pub const fn new(
        store: SnapshotStore,
        cache: ResponseCache<SnapshotPageResult>,
        cache_ttl: Duration,
    ) -> Self {
        Self {
            store,
            cache,
            cache_ttl,
        }
    }

    /// Runs `query` through logging, validation and the response cache.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Validation`] for an invalid chain name and
    /// [`GatewayError::Persistence`] if storage cannot be read.
    pub async fn execute(&self, query: SnapshotQuery) -> Result<SnapshotPageResult, GatewayError> {
        logged(&query, validated(query.validate(), self.cached(&query))).await
    }

    async fn cached(&self, query: &SnapshotQuery) -> Result<SnapshotPageResult, GatewayError> {
        let cache_key = query.cache_key();
        if let Some(hit) = self.cache.get(&cache_key) {
            tracing::debug!(%cache_key, "cache hit");
            return Ok(hit);
        }

        tracing::info!(%cache_key, "cache miss, executing handler");
        let generation = self.cache.generation();
        let result = Arc::new(self.handle(query).await?);

        self.cache
            .set_at(cache_key.clone(), Arc::clone(&result), self.cache_ttl, generation);
        tracing::info!(
            %cache_key,
            ttl_secs = self.cache_ttl.as_secs(),
            "cached response"
        );
        Ok(result)
    }

    async fn handle(
        &self,
        query: &SnapshotQuery,
    ) -> Result<Paginated<BlockchainSnapshot>, GatewayError> {
        let paging = query.paging();
        let (items, total_count) = match query {
            SnapshotQuery::All(_) => {
                self.store
                    .get_all(paging.page(), paging.page_size())
                    .await?
            }
            SnapshotQuery::ByName { name, .. } => {
                self.store
                    .get_by_name(name, paging.page(), paging.page_size())
                    .await?
            }
        };

        Ok(Paginated {
            items,
            page: paging.page(),
            page_size: paging.page_size(),
            total_count,
        })
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::domain::snapshot::fixtures::utxo_snapshot;

    const TTL: Duration = Duration::from_secs(300);

    async fn service_with(snapshots: Vec<BlockchainSnapshot>) -> (QueryService, SnapshotStore) {
        let Ok(store) = SnapshotStore::in_memory().await else {
            panic!("in-memory store failed");
        };
        let mut batch = store.batch();
        batch.add_range(snapshots);
        let Ok(_) = batch.commit().await else {
            panic!("seed commit failed");
        };
        let service = QueryService::new(store.clone(), ResponseCache::new(100), TTL);
        (service, store)
    }

    fn all(page: i64, page_size: i64) -> SnapshotQuery {
        SnapshotQuery::All(PageRequest::new(Some(page), Some(page_size)))
    }

    fn by_name(name: &str) -> SnapshotQuery {
        SnapshotQuery::ByName {
            name: name.to_string(),
            paging: PageRequest::default(),
        }
    }

    #[test]
    fn page_request_clamps_and_defaults() {
        assert_eq!(PageRequest::default().page(), 1);
        assert_eq!(PageRequest::default().page_size(), 50);

        let clamped = PageRequest::new(Some(-3), Some(10_000));
        assert_eq!(clamped.page(), 1);
        assert_eq!(clamped.page_size(), 200);

        assert_eq!(PageRequest::new(Some(2), Some(0)).page_size(), 1);
    }

    #[test]
    fn cache_keys_use_clamped_parameters_and_lowercase_names() {
        assert_eq!(all(0, 500).cache_key(), "blockchain-all-p1-s200");
        assert_eq!(by_name("BTC.Main").cache_key(), "blockchain-btc.main-p1-s50");
        assert_eq!(
            by_name("btc.main").cache_key(),
            by_name("BTC.MAIN").cache_key()
        );
        assert_ne!(all(1, 50).cache_key(), all(2, 50).cache_key());
    }

    #[test]
    fn validation_messages() {
        assert!(all(1, 50).validate().is_empty());
        assert!(by_name("ltc.MAIN").validate().is_empty());
        assert_eq!(by_name("").validate(), vec!["Blockchain name is required."]);
        assert_eq!(
            by_name("bogus").validate(),
            vec![
                "Blockchain name must be one of: ETH.main, DASH.main, BTC.main, BTC.test3, LTC.main."
            ]
        );
    }

    #[test]
    fn total_pages_rounds_up() {
        let page = Paginated::<u8> {
            items: Vec::new(),
            page: 2,
            page_size: 2,
            total_count: 5,
        };
        assert_eq!(page.total_pages(), 3);

        let empty = Paginated::<u8> {
            items: Vec::new(),
            page: 1,
            page_size: 50,
            total_count: 0,
        };
        assert_eq!(empty.total_pages(), 0);
    }

    #[tokio::test]
    async fn second_page_of_five() {
        let seeded = (1..=5).map(|h| utxo_snapshot("BTC.main", h)).collect();
        let (service, _) = service_with(seeded).await;

        let Ok(page) = service.execute(all(2, 2)).await else {
            panic!("query failed");
        };
        let heights: Vec<i64> = page.items.iter().map(|s| s.height).collect();
        assert_eq!(heights, vec![3, 2]);
        assert_eq!(page.total_count, 5);
        assert_eq!(page.total_pages(), 3);
    }

    #[tokio::test]
    async fn name_filter_ignores_case() {
        let seeded = vec![
            utxo_snapshot("BTC.main", 1),
            utxo_snapshot("LTC.main", 2),
            utxo_snapshot("BTC.main", 3),
        ];
        let (service, _) = service_with(seeded).await;

        let Ok(page) = service.execute(by_name("btc.main")).await else {
            panic!("query failed");
        };
        assert_eq!(page.total_count, 2);
        assert!(page.items.iter().all(|s| s.name == "BTC.main"));
    }

    #[tokio::test]
    async fn repeat_query_is_served_from_cache() {
        let (service, store) = service_with(vec![utxo_snapshot("BTC.main", 1)]).await;

        let Ok(first) = service.execute(all(1, 50)).await else {
            panic!("first query failed");
        };
        store.close().await;

        let Ok(second) = service.execute(all(1, 50)).await else {
            panic!("second query should not reach storage");
        };
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[tokio::test]
    async fn invalidation_forces_a_fresh_read() {
        let (service, store) = service_with(vec![utxo_snapshot("BTC.main", 1)]).await;

        let Ok(first) = service.execute(all(1, 50)).await else {
            panic!("first query failed");
        };
        assert_eq!(first.total_count, 1);

        let mut batch = store.batch();
        batch.add_range([utxo_snapshot("BTC.main", 2)]);
        let Ok(_) = batch.commit().await else {
            panic!("commit failed");
        };
        service.cache.invalidate_all();

        let Ok(second) = service.execute(all(1, 50)).await else {
            panic!("second query failed");
        };
        assert_eq!(second.total_count, 2);
    }

    #[tokio::test]
    async fn invalid_name_never_reaches_storage() {
        let (service, store) = service_with(Vec::new()).await;
        store.close().await;

        let result = service.execute(by_name("bogus")).await;
        let Err(GatewayError::Validation(errors)) = result else {
            panic!("expected validation failure");
        };
        assert_eq!(errors.len(), 1);
    }

    #[tokio::test]
    async fn storage_failure_is_not_cached() {
        let (service, store) = service_with(Vec::new()).await;
        store.close().await;

        let result = service.execute(all(1, 50)).await;
        assert!(matches!(result, Err(GatewayError::Persistence(_))));
        assert!(service.cache.get(&all(1, 50).cache_key()).is_none());
    }
}
