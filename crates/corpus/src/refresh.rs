//! Background corpus refresh.
//!
//! Rust concepts you'll learn:
//! - `spawn_blocking` for CPU work inside an async program
//! - `Mutex::try_lock` as a "skip if busy" guard
//! - `tokio::time::interval` with a missed-tick policy

use crate::error::{CorpusError, Result};
use crate::snapshot::{CorpusSnapshot, SnapshotHolder};
use crate::tfidf::StopWords;
use data_loader::CatalogStore;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, instrument, warn};

/// What a call to [`CorpusRefresher::refresh`] did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// A new snapshot with this version is now served
    Published(u64),
    /// Another refresh was still running
    Skipped,
}

/// Rebuilds the corpus from the catalog store and publishes it.
pub struct CorpusRefresher {
    store: Arc<dyn CatalogStore>,
    holder: SnapshotHolder,
    stop_words: StopWords,
    /// Held by the running build, not by the caller's future
    in_flight: Arc<Mutex<()>>,
}

impl CorpusRefresher {
    pub fn new(store: Arc<dyn CatalogStore>, holder: SnapshotHolder, stop_words: StopWords) -> Self {
        Self {
            store,
            holder,
            stop_words,
            in_flight: Arc::new(Mutex::new(())),
        }
    }

    pub fn holder(&self) -> &SnapshotHolder {
        &self.holder
    }

    /// Build and publish one snapshot.
    ///
    /// The build runs on the blocking pool and holds the in-flight guard until
    /// it publishes, so dropping this future does not let a second build start
    /// while the first is still running. On error the previously published
    /// snapshot stays in place.
    #[instrument(skip(self))]
    pub async fn refresh(&self) -> Result<RefreshOutcome> {
        let Ok(guard) = Arc::clone(&self.in_flight).try_lock_owned() else {
            debug!("Refresh already in progress, skipping");
            return Ok(RefreshOutcome::Skipped);
        };

        let store = Arc::clone(&self.store);
        let holder = self.holder.clone();
        let stop_words = self.stop_words;

        let built = tokio::task::spawn_blocking(move || {
            let _guard = guard;
            let version = holder.current().version() + 1;
            let snapshot = CorpusSnapshot::from_store(version, &*store, stop_words)?;

            let documents = snapshot.len();
            let vocabulary = snapshot.matrix().vocabulary_size();
            let built_at = snapshot.built_at();
            holder.publish(snapshot);

            info!(version, documents, vocabulary, ?built_at, "Published corpus snapshot");
            Ok::<_, CorpusError>(version)
        })
        .await
        .map_err(|e| CorpusError::Build(e.to_string()))
        .and_then(|result| result);

        match built {
            Ok(version) => Ok(RefreshOutcome::Published(version)),
            Err(e) => {
                warn!(
                    error = %e,
                    serving_version = self.holder.current().version(),
                    "Corpus refresh failed, keeping previous snapshot"
                );
                Err(e)
            }
        }
    }

    /// Refresh now, then once per `interval` until the task is aborted.
    ///
    /// Ticks that fall behind a slow refresh are skipped rather than queued.
    pub fn spawn(self: Arc<Self>, interval: Duration) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                // The first tick completes immediately
                ticker.tick().await;
                // Failures are logged inside refresh; the next tick retries
                let _ = self.refresh().await;
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use data_loader::{DataIndex, DataLoadError, InteractionRecord, Movie, MovieId, MovieLink, UserId, WatchlistId};
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    /// Wraps a DataIndex and can be switched into an outage or made slow.
    /// Also counts catalog reads and how many ran at the same time.
    struct FlakyStore {
        inner: DataIndex,
        down: AtomicBool,
        /// Number of upcoming reads that fail before the store recovers
        fail_next: AtomicUsize,
        delay: Duration,
        reads: AtomicUsize,
        active: AtomicUsize,
        max_active: AtomicUsize,
    }

    impl FlakyStore {
        fn new(delay: Duration) -> Self {
            let mut inner = DataIndex::new();
            inner.insert_movie(Movie::new(1, "Heat", "Thieves plan a heist"));
            inner.insert_movie(Movie::new(2, "Ronin", "Mercenaries chase a case"));
            Self {
                inner,
                down: AtomicBool::new(false),
                fail_next: AtomicUsize::new(0),
                delay,
                reads: AtomicUsize::new(0),
                active: AtomicUsize::new(0),
                max_active: AtomicUsize::new(0),
            }
        }

        fn check(&self) -> data_loader::Result<()> {
            self.reads.fetch_add(1, Ordering::SeqCst);
            let active = self.active.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_active.fetch_max(active, Ordering::SeqCst);
            std::thread::sleep(self.delay);
            self.active.fetch_sub(1, Ordering::SeqCst);

            let scheduled_failure = self
                .fail_next
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
                .is_ok();
            if scheduled_failure || self.down.load(Ordering::SeqCst) {
                Err(DataLoadError::Unavailable("database offline".to_string()))
            } else {
                Ok(())
            }
        }
    }

    impl CatalogStore for FlakyStore {
        fn movies(&self) -> data_loader::Result<Vec<Movie>> {
            self.check()?;
            self.inner.movies()
        }
        fn genre_links(&self) -> data_loader::Result<Vec<MovieLink>> {
            self.inner.genre_links()
        }
        fn actor_links(&self) -> data_loader::Result<Vec<MovieLink>> {
            self.inner.actor_links()
        }
        fn director_links(&self) -> data_loader::Result<Vec<MovieLink>> {
            self.inner.director_links()
        }
        fn interactions(&self) -> data_loader::Result<Vec<InteractionRecord>> {
            self.inner.interactions()
        }
        fn watched_movies(&self, user_id: UserId) -> data_loader::Result<Vec<MovieId>> {
            self.inner.watched_movies(user_id)
        }
        fn watchlist_movies(&self, watchlist_id: WatchlistId) -> data_loader::Result<Vec<MovieId>> {
            self.inner.watchlist_movies(watchlist_id)
        }
    }

    #[tokio::test]
    async fn test_refresh_publishes_increasing_versions() {
        let store = Arc::new(FlakyStore::new(Duration::ZERO));
        let refresher = CorpusRefresher::new(store, SnapshotHolder::new(), StopWords::English);

        assert_eq!(refresher.refresh().await.unwrap(), RefreshOutcome::Published(1));
        assert_eq!(refresher.refresh().await.unwrap(), RefreshOutcome::Published(2));
        assert_eq!(refresher.holder().current().len(), 2);
    }

    #[tokio::test]
    async fn test_failed_refresh_keeps_previous_snapshot() {
        let store = Arc::new(FlakyStore::new(Duration::ZERO));
        let refresher = CorpusRefresher::new(store.clone(), SnapshotHolder::new(), StopWords::English);
        refresher.refresh().await.unwrap();

        store.down.store(true, Ordering::SeqCst);
        let err = refresher.refresh().await.unwrap_err();
        assert!(matches!(err, CorpusError::TransientStore(DataLoadError::Unavailable(_))));
        assert_eq!(refresher.holder().current().version(), 1);

        // Next attempt proceeds normally
        store.down.store(false, Ordering::SeqCst);
        assert_eq!(refresher.refresh().await.unwrap(), RefreshOutcome::Published(2));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_overlapping_refresh_is_skipped() {
        let store = Arc::new(FlakyStore::new(Duration::from_millis(200)));
        let refresher = CorpusRefresher::new(store, SnapshotHolder::new(), StopWords::English);

        let (first, second) = tokio::join!(refresher.refresh(), refresher.refresh());

        assert_eq!(first.unwrap(), RefreshOutcome::Published(1));
        assert_eq!(second.unwrap(), RefreshOutcome::Skipped);
    }

    #[tokio::test]
    async fn test_spawn_refreshes_eagerly() {
        let store = Arc::new(FlakyStore::new(Duration::ZERO));
        let holder = SnapshotHolder::new();
        let mut rx = holder.subscribe();
        let refresher = Arc::new(CorpusRefresher::new(store, holder, StopWords::English));

        let handle = refresher.spawn(Duration::from_secs(3600));
        rx.changed().await.unwrap();
        assert_eq!(rx.borrow().version(), 1);
        handle.abort();
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_abandoned_refresh_still_blocks_next_build() {
        let store = Arc::new(FlakyStore::new(Duration::from_millis(300)));
        let holder = SnapshotHolder::new();
        let mut rx = holder.subscribe();
        let refresher = CorpusRefresher::new(store.clone(), holder, StopWords::English);

        // Caller gives up while the build is still reading the store
        let abandoned = tokio::time::timeout(Duration::from_millis(50), refresher.refresh()).await;
        assert!(abandoned.is_err());

        assert_eq!(refresher.refresh().await.unwrap(), RefreshOutcome::Skipped);

        // The abandoned build still finishes and publishes
        rx.changed().await.unwrap();
        assert_eq!(rx.borrow().version(), 1);
        assert_eq!(store.max_active.load(Ordering::SeqCst), 1);
        assert_eq!(store.reads.load(Ordering::SeqCst), 1);

        // Guard is released once the build is done
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(refresher.refresh().await.unwrap(), RefreshOutcome::Published(2));
    }

    #[tokio::test(start_paused = true)]
    async fn test_spawn_refreshes_every_interval_and_retries_after_failure() {
        let interval = Duration::from_secs(600);
        let store = Arc::new(FlakyStore::new(Duration::ZERO));
        let holder = SnapshotHolder::new();
        let mut rx = holder.subscribe();
        let refresher = Arc::new(CorpusRefresher::new(store.clone(), holder, StopWords::English));

        let start = tokio::time::Instant::now();
        let handle = refresher.spawn(interval);

        rx.changed().await.unwrap();
        assert_eq!(rx.borrow_and_update().version(), 1);
        assert!(start.elapsed() < interval);

        // Second publication waits for the next tick
        rx.changed().await.unwrap();
        assert_eq!(rx.borrow_and_update().version(), 2);
        assert!(start.elapsed() >= interval);

        // The third tick fails; the fourth publishes again
        store.fail_next.store(1, Ordering::SeqCst);
        rx.changed().await.unwrap();
        assert_eq!(rx.borrow_and_update().version(), 3);
        assert!(start.elapsed() >= interval * 3);
        assert_eq!(store.reads.load(Ordering::SeqCst), 4);

        handle.abort();
    }
}
