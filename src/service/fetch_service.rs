//! Fetch-and-store: pull every chain tip, persist the batch, void the cache.

use std::sync::Arc;

use super::pipeline::logged;
use super::query_service::SnapshotPageResult;
use crate::domain::{BlockchainSnapshot, ResponseCache};
use crate::error::GatewayError;
use crate::persistence::{CommitOutcome, PersistenceError, SnapshotStore};
use crate::shutdown::ShutdownSignal;
use crate::source::BlockchainSource;

/// Write side of the gateway.
///
/// One call to [`FetchService::fetch_and_store`] is exactly one attempt:
///
/// 1. fetch all endpoints through the [`BlockchainSource`]; a stage-level
///    failure aborts with an external-service error and nothing else
///    happens,
/// 2. insert every fetched snapshot in one transaction (an empty batch is
///    fine),
/// 3. invalidate the response cache.
///
/// Steps 2 and 3 run in a spawned task, so a caller that goes away
/// mid-commit cannot separate them.
///
/// Overlapping calls are not serialized; each appends its own batch.
#[derive(Debug, Clone)]
pub struct FetchService {
    source: Arc<dyn BlockchainSource>,
    store: SnapshotStore,
    cache: ResponseCache<SnapshotPageResult>,
    endpoints: Arc<[String]>,
}

impl FetchService {
    /// Creates the service.
    #[must_use]
    pub fn new(
        source: Arc<dyn BlockchainSource>,
        store: SnapshotStore,
        cache: ResponseCache<SnapshotPageResult>,
        endpoints: Vec<String>,
    ) -> Self {
        Self {
            source,
            store,
            cache,
            endpoints: endpoints.into(),
        }
    }

    /// Fetches, persists and invalidates, returning the stored snapshots
    /// in fetch order.
    ///
    /// `signal` aborts the outbound calls and the pending write. A
    /// cancelled call commits nothing and leaves the cache untouched.
    ///
    /// # Errors
    ///
    /// - [`GatewayError::ExternalService`] if the fetch stage fails as a whole
    /// - [`GatewayError::Persistence`] if the batch cannot be written
    /// - [`GatewayError::Cancelled`] if `signal` fires before the commit
    pub async fn fetch_and_store(
        &self,
        signal: &ShutdownSignal,
    ) -> Result<Vec<BlockchainSnapshot>, GatewayError> {
        logged("FetchAndStoreBlockchainData", self.run(signal)).await
    }

    async fn run(&self, signal: &ShutdownSignal) -> Result<Vec<BlockchainSnapshot>, GatewayError> {
        tracing::info!(
            endpoints = self.endpoints.len(),
            "fetching blockchain data from all configured endpoints"
        );

        let fetched = tokio::select! {
            biased;
            () = signal.cancelled() => return Err(GatewayError::Cancelled),
            fetched = self.source.fetch_all(&self.endpoints) => fetched,
        };
        let snapshots = fetched.map_err(|e| {
            tracing::error!(error = %e, "fetch stage failed");
            GatewayError::external(e)
        })?;
        tracing::info!(
            count = snapshots.len(),
            "fetched blockchain records, persisting to database"
        );

        let persist = tokio::spawn(persist_and_invalidate(
            self.store.clone(),
            self.cache.clone(),
            signal.clone(),
            snapshots.clone(),
        ));
        let outcome = persist
            .await
            .map_err(|e| GatewayError::Internal(format!("persist task failed: {e}")))??;

        match outcome {
            CommitOutcome::Committed(_) => Ok(snapshots),
            CommitOutcome::Cancelled => Err(GatewayError::Cancelled),
        }
    }
}

/// Commits the batch and invalidates the cache as one unit.
///
/// Runs detached from the request so that dropping the caller never leaves
/// a committed batch behind a stale cache.
async fn persist_and_invalidate(
    store: SnapshotStore,
    cache: ResponseCache<SnapshotPageResult>,
    signal: ShutdownSignal,
    snapshots: Vec<BlockchainSnapshot>,
) -> Result<CommitOutcome, PersistenceError> {
    let mut batch = store.batch();
    batch.add_range(snapshots);

    let outcome = batch.commit_or_cancel(signal.cancelled()).await?;
    if let CommitOutcome::Committed(count) = outcome {
        cache.invalidate_all();
        tracing::info!(count, "persisted blockchain records and invalidated cache");
    }
    Ok(outcome)
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use std::time::Duration;

    use async_trait::async_trait;

    use super::*;
    use crate::domain::snapshot::fixtures::{account_snapshot, utxo_snapshot};
    use crate::service::query_service::Paginated;
    use crate::shutdown;
    use crate::source::FetchError;

    #[derive(Debug)]
    enum FakeSource {
        Returns(Vec<BlockchainSnapshot>),
        Fails,
        Hangs,
    }

    #[async_trait]
    impl BlockchainSource for FakeSource {
        async fn fetch_all(
            &self,
            _endpoints: &[String],
        ) -> Result<Vec<BlockchainSnapshot>, FetchError> {
            match self {
                Self::Returns(snapshots) => Ok(snapshots.clone()),
                Self::Fails => Err(FetchError::Transport("connection refused".into())),
                Self::Hangs => {
                    tokio::time::sleep(Duration::from_secs(60)).await;
                    Ok(Vec::new())
                }
            }
        }
    }

    const CACHED_KEY: &str = "blockchain-all-p1-s50";

    type Fixture = (FetchService, SnapshotStore, ResponseCache<SnapshotPageResult>);

    async fn setup(source: FakeSource) -> Fixture {
        let Ok(store) = SnapshotStore::in_memory().await else {
            panic!("in-memory store failed");
        };
        let cache = ResponseCache::new(100);
        cache.set(
            CACHED_KEY,
            Arc::new(Paginated {
                items: Vec::new(),
                page: 1,
                page_size: 50,
                total_count: 0,
            }),
            Duration::from_secs(300),
        );
        let service = FetchService::new(
            Arc::new(source),
            store.clone(),
            cache.clone(),
            vec!["/v1/btc/main".to_string(), "/v1/eth/main".to_string()],
        );
        (service, store, cache)
    }

    async fn stored_count(store: &SnapshotStore) -> u64 {
        let Ok((_, total)) = store.get_all(1, 50).await else {
            panic!("read failed");
        };
        total
    }

    #[tokio::test]
    async fn persists_in_fetch_order_and_invalidates() {
        let fetched = vec![account_snapshot(10), utxo_snapshot("BTC.main", 20)];
        let (service, store, cache) = setup(FakeSource::Returns(fetched.clone())).await;

        let Ok(stored) = service.fetch_and_store(&ShutdownSignal::never()).await else {
            panic!("fetch-and-store failed");
        };
        assert_eq!(stored, fetched);
        assert_eq!(stored_count(&store).await, 2);
        assert!(cache.get(CACHED_KEY).is_none());
    }

    #[tokio::test]
    async fn transport_failure_persists_nothing_and_keeps_cache() {
        let (service, store, cache) = setup(FakeSource::Fails).await;

        let result = service.fetch_and_store(&ShutdownSignal::never()).await;
        let Err(err) = result else {
            panic!("expected failure");
        };
        assert!(matches!(err, GatewayError::ExternalService { .. }));
        assert_eq!(err.status_code().as_u16(), 502);
        assert_eq!(stored_count(&store).await, 0);
        assert!(cache.get(CACHED_KEY).is_some());
    }

    #[tokio::test]
    async fn empty_fetch_still_invalidates() {
        let (service, store, cache) = setup(FakeSource::Returns(Vec::new())).await;

        let Ok(stored) = service.fetch_and_store(&ShutdownSignal::never()).await else {
            panic!("empty fetch should succeed");
        };
        assert!(stored.is_empty());
        assert_eq!(stored_count(&store).await, 0);
        assert!(cache.get(CACHED_KEY).is_none());
    }

    #[tokio::test]
    async fn persistence_failure_keeps_cache() {
        let overlong = BlockchainSnapshot {
            name: "x".repeat(51),
            ..utxo_snapshot("BTC.main", 1)
        };
        let (service, store, cache) = setup(FakeSource::Returns(vec![
            utxo_snapshot("LTC.main", 1),
            overlong,
        ]))
        .await;

        let result = service.fetch_and_store(&ShutdownSignal::never()).await;
        assert!(matches!(result, Err(GatewayError::Persistence(_))));
        assert_eq!(stored_count(&store).await, 0);
        assert!(cache.get(CACHED_KEY).is_some());
    }

    #[tokio::test]
    async fn cancellation_aborts_in_flight_fetch() {
        let (service, store, cache) = setup(FakeSource::Hangs).await;
        let (trigger, signal) = shutdown::channel();

        let task = tokio::spawn({
            let service = service.clone();
            async move { service.fetch_and_store(&signal).await }
        });
        tokio::time::sleep(Duration::from_millis(20)).await;
        trigger.trigger();

        let Ok(Ok(joined)) = tokio::time::timeout(Duration::from_secs(2), task).await else {
            panic!("cancelled fetch did not finish");
        };
        assert!(matches!(joined, Err(GatewayError::Cancelled)));
        assert_eq!(stored_count(&store).await, 0);
        assert!(cache.get(CACHED_KEY).is_some());
    }

    #[tokio::test]
    async fn already_cancelled_commits_nothing() {
        let (service, store, cache) =
            setup(FakeSource::Returns(vec![utxo_snapshot("BTC.main", 1)])).await;
        let (trigger, signal) = shutdown::channel();
        trigger.trigger();

        let result = service.fetch_and_store(&signal).await;
        assert!(matches!(result, Err(GatewayError::Cancelled)));
        assert_eq!(stored_count(&store).await, 0);
        assert!(cache.get(CACHED_KEY).is_some());
    }

    #[tokio::test]
    async fn dropped_caller_never_splits_commit_from_invalidation() {
        let never = ShutdownSignal::never();
        for polls in 1..=60 {
            let (service, store, cache) =
                setup(FakeSource::Returns(vec![utxo_snapshot("BTC.main", 1)])).await;

            let mut call = Box::pin(service.fetch_and_store(&never));
            for _ in 0..polls {
                if futures_util::poll!(call.as_mut()).is_ready() {
                    break;
                }
                tokio::task::yield_now().await;
            }
            drop(call);
            tokio::time::sleep(Duration::from_millis(100)).await;

            let committed = stored_count(&store).await == 1;
            let invalidated = cache.get(CACHED_KEY).is_none();
            assert_eq!(
                committed, invalidated,
                "dropped after {polls} polls: committed={committed} invalidated={invalidated}"
            );
        }
    }
}
