//! Integration tests for the recommendation gateway.
//!
//! These tests run the whole engine (store -> corpus refresh -> gateway) on
//! small hand-built catalogs.

use corpus::{CorpusRefresher, CorpusSnapshot, RefreshOutcome, SnapshotHolder, StopWords};
use data_loader::{
    CatalogStore, DataIndex, DataLoadError, InteractionRecord, Movie, MovieId, MovieLink, UserId,
    WatchlistId,
};
use server::{RecommendMode, RecommendationGateway, RecommenderConfig};
use sources::{AlsParams, CollaborativeRecommender, ContentSimilarity, SimilarityQuery};
use std::collections::HashSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

const DESCRIPTIONS: [&str; 10] = [
    "A daring rescue mission",
    "A daring escape from prison",
    "A family reunion in the countryside",
    "A wedding goes wrong",
    "A haunted cabin in the woods",
    "A detective hunts a killer",
    "A robot learns to love",
    "A spy crosses the border",
    "A family road trip",
    "A prison riot",
];

fn small_params() -> AlsParams {
    AlsParams {
        factors: 4,
        iterations: 8,
        ..AlsParams::default()
    }
}

/// Ten movies, a few users and watchlists
///
/// - user 7 watched {1, 2, 3}
/// - users 1..=4 watched overlapping sets of all ten movies
/// - user 8 only has an unwatched row
/// - watchlist 1 = {4, 5}, watchlist 2 is never created
fn create_catalog() -> DataIndex {
    let mut index = DataIndex::new();
    for (i, description) in DESCRIPTIONS.iter().enumerate() {
        let id = i as MovieId + 1;
        let mut movie = Movie::new(id, format!("Movie {}", id), *description);
        movie.image_url = Some(format!("http://img/{}.jpg", id));
        index.insert_movie(movie);
    }

    for id in [1, 2] {
        index.insert_genre(id, "Action");
        index.insert_genre(id, "Adventure");
        index.insert_director(id, "DirectorX");
        index.insert_actor(id, "Actor1");
        index.insert_actor(id, "Actor2");
    }
    index.insert_genre(3, "Drama");
    index.insert_genre(9, "Drama");
    index.insert_genre(5, "Horror");
    index.insert_genre(6, "Thriller");

    for user in 1..=4 {
        for movie in 1..=10 {
            if (movie + user) % 3 != 0 {
                index.insert_interaction(InteractionRecord::watched(user, movie));
            }
        }
    }
    for movie in [1, 2, 3] {
        index.insert_interaction(InteractionRecord::watched(7, movie));
    }
    index.insert_interaction(InteractionRecord {
        has_watched: false,
        ..InteractionRecord::watched(8, 6)
    });

    index.insert_watchlist_entry(1, 4);
    index.insert_watchlist_entry(1, 5);
    index
}

async fn create_gateway(index: DataIndex) -> RecommendationGateway {
    let store: Arc<dyn CatalogStore> = Arc::new(index);
    let holder = SnapshotHolder::new();
    let refresher = CorpusRefresher::new(Arc::clone(&store), holder.clone(), StopWords::English);
    refresher.refresh().await.unwrap();
    RecommendationGateway::new(store, holder, CollaborativeRecommender::new(small_params()))
}

fn ids(result: &[server::RecommendedMovie]) -> Vec<MovieId> {
    result.iter().map(|m| m.movie_id).collect()
}

// ============================================================================
// Scenarios
// ============================================================================

#[tokio::test]
async fn test_shared_metadata_ranks_first() {
    let mut index = DataIndex::new();
    index.insert_movie(Movie::new(1, "A", ""));
    index.insert_movie(Movie::new(2, "B", ""));
    index.insert_movie(Movie::new(3, "C", "A quiet drama about grief"));
    index.insert_movie(Movie::new(4, "D", "A comedy about a wedding"));
    index.insert_movie(Movie::new(5, "E", "A horror night"));
    for id in [1, 2] {
        index.insert_genre(id, "Action");
        index.insert_genre(id, "Adventure");
        index.insert_director(id, "DirectorX");
        index.insert_actor(id, "Actor1");
        index.insert_actor(id, "Actor2");
    }
    index.insert_genre(5, "Action");

    let gateway = create_gateway(index).await;
    let result = gateway.recommend(1, RecommendMode::MovieSimilar, 4).await;

    assert_eq!(result.len(), 4);
    assert_eq!(result[0].movie_id, 2);
    assert_eq!(result[0].title, "B");
}

#[tokio::test]
async fn test_history_of_three_returns_five_unwatched() {
    let gateway = create_gateway(create_catalog()).await;

    for mode in [RecommendMode::UserHistory, RecommendMode::UserCollaborative] {
        let result = gateway.recommend(7, mode, 5).await;
        assert_eq!(result.len(), 5, "mode {}", mode);
        for id in ids(&result) {
            assert!(![1, 2, 3].contains(&id), "mode {} returned watched movie {}", mode, id);
        }
    }
}

#[tokio::test]
async fn test_default_config_collaborative_is_stable() {
    let store: Arc<dyn CatalogStore> = Arc::new(create_catalog());
    let holder = SnapshotHolder::new();
    let refresher = CorpusRefresher::new(Arc::clone(&store), holder.clone(), StopWords::English);
    refresher.refresh().await.unwrap();

    // 64 factors, 15 iterations, regularization 0.1, alpha 80
    let config = RecommenderConfig::default();
    let gateway = RecommendationGateway::from_config(store, holder, &config);

    let first = gateway.recommend(7, RecommendMode::UserCollaborative, 5).await;
    assert_eq!(first.len(), 5);
    for id in ids(&first) {
        assert!(![1, 2, 3].contains(&id));
    }
    assert_eq!(gateway.recommend(7, RecommendMode::UserCollaborative, 5).await, first);
}

#[tokio::test]
async fn test_user_without_watches_gets_nothing() {
    let gateway = create_gateway(create_catalog()).await;

    // Known user with no watched rows, and a user with no rows at all
    assert!(gateway.recommend(8, RecommendMode::UserCollaborative, 5).await.is_empty());
    assert!(gateway.recommend(99, RecommendMode::UserCollaborative, 5).await.is_empty());
    assert!(gateway.recommend(99, RecommendMode::UserHistory, 5).await.is_empty());
}

#[tokio::test]
async fn test_empty_watchlist_gets_nothing() {
    let gateway = create_gateway(create_catalog()).await;
    assert!(gateway.recommend(2, RecommendMode::WatchlistSimilar, 5).await.is_empty());

    let result = gateway.recommend(1, RecommendMode::WatchlistSimilar, 5).await;
    assert_eq!(result.len(), 5);
    assert!(!ids(&result).contains(&4));
    assert!(!ids(&result).contains(&5));
}

#[tokio::test]
async fn test_non_positive_top_n_is_empty() {
    let gateway = create_gateway(create_catalog()).await;
    for mode in RecommendMode::ALL {
        assert!(gateway.recommend(1, mode, 0).await.is_empty());
        assert!(gateway.recommend(1, mode, -3).await.is_empty());
    }
}

#[tokio::test]
async fn test_unknown_and_out_of_range_seeds() {
    let gateway = create_gateway(create_catalog()).await;
    assert!(gateway.recommend(42, RecommendMode::MovieSimilar, 5).await.is_empty());
    assert!(gateway.recommend(-1, RecommendMode::MovieSimilar, 5).await.is_empty());
    assert!(gateway.recommend(i64::MAX, RecommendMode::UserHistory, 5).await.is_empty());
}

// ============================================================================
// Properties
// ============================================================================

#[tokio::test]
async fn test_results_bounded_deduplicated_and_in_snapshot() {
    let gateway = create_gateway(create_catalog()).await;
    let snapshot = gateway.holder().current();

    for mode in RecommendMode::ALL {
        for seed in 1..=8 {
            for top_n in [1, 3, 20] {
                let result = gateway.recommend(seed, mode, top_n).await;
                assert!(result.len() <= top_n as usize);

                let unique: HashSet<MovieId> = ids(&result).into_iter().collect();
                assert_eq!(unique.len(), result.len());
                for movie in &result {
                    assert!(snapshot.contains(movie.movie_id));
                    assert_eq!(
                        movie.image_url.as_deref(),
                        Some(format!("http://img/{}.jpg", movie.movie_id).as_str())
                    );
                }
                if mode == RecommendMode::MovieSimilar {
                    assert!(!ids(&result).contains(&(seed as MovieId)));
                }
            }
        }
    }
}

#[tokio::test]
async fn test_repeated_calls_are_identical() {
    let gateway = create_gateway(create_catalog()).await;

    for mode in RecommendMode::ALL {
        let first = gateway.recommend(1, mode, 6).await;
        let second = gateway.recommend(1, mode, 6).await;
        assert_eq!(first, second, "mode {}", mode);
    }
}

#[tokio::test]
async fn test_model_cache_gives_same_results() {
    let index = Arc::new(create_catalog());
    let holder = SnapshotHolder::new();
    holder.publish(CorpusSnapshot::from_store(1, index.as_ref(), StopWords::English).unwrap());

    let fresh = RecommendationGateway::new(
        index.clone(),
        holder.clone(),
        CollaborativeRecommender::new(small_params()),
    );
    let cached = RecommendationGateway::new(
        index,
        holder,
        CollaborativeRecommender::new(small_params()).with_model_cache(true),
    );

    let expected = fresh.recommend(7, RecommendMode::UserCollaborative, 5).await;
    assert_eq!(cached.recommend(7, RecommendMode::UserCollaborative, 5).await, expected);
    assert_eq!(cached.recommend(7, RecommendMode::UserCollaborative, 5).await, expected);
}

#[tokio::test]
async fn test_seeds_missing_from_snapshot_are_pruned() {
    let mut index = create_catalog();
    let holder = SnapshotHolder::new();
    holder.publish(CorpusSnapshot::from_store(1, &index, StopWords::English).unwrap());

    // Movie 11 arrives after the snapshot was built
    index.insert_movie(Movie::new(11, "Late Arrival", "A daring rescue"));
    index.insert_interaction(InteractionRecord::watched(7, 11));
    index.insert_interaction(InteractionRecord::watched(20, 11));
    index.insert_watchlist_entry(3, 11);

    let gateway = RecommendationGateway::new(
        Arc::new(index),
        holder,
        CollaborativeRecommender::new(small_params()),
    );

    // History still works from the seeds the snapshot knows
    let history = gateway.recommend(7, RecommendMode::UserHistory, 5).await;
    assert_eq!(history.len(), 5);
    assert!(!ids(&history).contains(&11));

    // A watchlist made only of unknown movies has no usable seed
    assert!(gateway.recommend(3, RecommendMode::WatchlistSimilar, 5).await.is_empty());

    // Collaborative picks the snapshot cannot describe are dropped
    let collaborative = gateway.recommend(1, RecommendMode::UserCollaborative, 20).await;
    assert!(!ids(&collaborative).contains(&11));
}

// ============================================================================
// Refresh behavior
// ============================================================================

/// DataIndex wrapper that can be switched into an outage
struct FlakyStore {
    inner: DataIndex,
    down: AtomicBool,
}

impl FlakyStore {
    fn guard(&self) -> data_loader::Result<()> {
        if self.down.load(Ordering::SeqCst) {
            Err(DataLoadError::Unavailable("connection refused".to_string()))
        } else {
            Ok(())
        }
    }
}

impl CatalogStore for FlakyStore {
    fn movies(&self) -> data_loader::Result<Vec<Movie>> {
        self.guard()?;
        self.inner.movies()
    }
    fn genre_links(&self) -> data_loader::Result<Vec<MovieLink>> {
        self.guard()?;
        self.inner.genre_links()
    }
    fn actor_links(&self) -> data_loader::Result<Vec<MovieLink>> {
        self.guard()?;
        self.inner.actor_links()
    }
    fn director_links(&self) -> data_loader::Result<Vec<MovieLink>> {
        self.guard()?;
        self.inner.director_links()
    }
    fn interactions(&self) -> data_loader::Result<Vec<InteractionRecord>> {
        self.guard()?;
        self.inner.interactions()
    }
    fn watched_movies(&self, user_id: UserId) -> data_loader::Result<Vec<MovieId>> {
        self.guard()?;
        self.inner.watched_movies(user_id)
    }
    fn watchlist_movies(&self, watchlist_id: WatchlistId) -> data_loader::Result<Vec<MovieId>> {
        self.guard()?;
        self.inner.watchlist_movies(watchlist_id)
    }
}

#[tokio::test]
async fn test_failed_refresh_keeps_serving_previous_snapshot() {
    let store = Arc::new(FlakyStore {
        inner: create_catalog(),
        down: AtomicBool::new(false),
    });
    let holder = SnapshotHolder::new();
    let refresher = CorpusRefresher::new(store.clone(), holder.clone(), StopWords::English);
    let gateway = RecommendationGateway::new(
        store.clone(),
        holder.clone(),
        CollaborativeRecommender::new(small_params()),
    );

    assert_eq!(refresher.refresh().await.unwrap(), RefreshOutcome::Published(1));
    let before = gateway.recommend(1, RecommendMode::MovieSimilar, 5).await;
    assert_eq!(before.len(), 5);

    store.down.store(true, Ordering::SeqCst);
    assert!(refresher.refresh().await.is_err());
    assert_eq!(holder.current().version(), 1);

    // Movie mode only needs the snapshot, so it is unaffected
    assert_eq!(gateway.recommend(1, RecommendMode::MovieSimilar, 5).await, before);
    // Modes that read the store degrade to empty instead of failing
    assert!(gateway.recommend(7, RecommendMode::UserHistory, 5).await.is_empty());

    store.down.store(false, Ordering::SeqCst);
    assert_eq!(refresher.refresh().await.unwrap(), RefreshOutcome::Published(2));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_reader_sees_consistent_snapshot_during_refreshes() {
    let store: Arc<dyn CatalogStore> = Arc::new(create_catalog());
    let holder = SnapshotHolder::new();
    let refresher = Arc::new(CorpusRefresher::new(
        Arc::clone(&store),
        holder.clone(),
        StopWords::English,
    ));
    refresher.refresh().await.unwrap();

    let held = holder.current();
    let engine = ContentSimilarity::new();
    let query = SimilarityQuery::new([1, 3], 8);
    let baseline = engine.similar(&query, &held).unwrap();

    // Publish new snapshots while the reader keeps computing on its own copy
    let writer = {
        let refresher = Arc::clone(&refresher);
        tokio::spawn(async move {
            for _ in 0..20 {
                let _ = refresher.refresh().await;
            }
        })
    };

    let reader = tokio::task::spawn_blocking(move || {
        for _ in 0..50 {
            assert_eq!(held.version(), 1);
            assert_eq!(held.len(), DESCRIPTIONS.len());
            assert_eq!(engine.similar(&query, &held).unwrap(), baseline);
        }
    });

    writer.await.unwrap();
    reader.await.unwrap();
    assert!(holder.current().version() > 1);
}
