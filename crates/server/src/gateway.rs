//! # Recommendation Gateway
//!
//! The single entry point of the engine:
//! 1. Validate the request (non-positive `top_n` or out-of-range id = empty)
//! 2. Take the current corpus snapshot once
//! 3. Resolve the seed set for the mode
//! 4. Run content similarity or the collaborative recommender
//! 5. Enrich ids with title and poster from the same snapshot
//!
//! Engine errors never leave this module: they are logged and the caller
//! gets an empty list.
//!
//! ## Learning Goals
//!
//! - Using spawn_blocking for CPU-bound work
//! - Converting every failure into a value at an API boundary
//! - `FromStr`/`Display` for request enums

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Instant;

use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, instrument, warn};

use corpus::{CorpusSnapshot, SnapshotHolder};
use data_loader::{CatalogStore, MovieId};
use sources::error::Result;
use sources::{CollaborativeRecommender, ContentSimilarity, RecommendError, ScoredMovie, SimilarityQuery};

use crate::config::RecommenderConfig;

/// How the seed id of a request is interpreted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RecommendMode {
    /// Seed is a movie id
    MovieSimilar,
    /// Seed is a user id; their watched movies are the seeds
    UserHistory,
    /// Seed is a watchlist id; its movies are the seeds
    WatchlistSimilar,
    /// Seed is a user id; routed to the collaborative recommender
    UserCollaborative,
}

impl RecommendMode {
    pub const ALL: [RecommendMode; 4] = [
        RecommendMode::MovieSimilar,
        RecommendMode::UserHistory,
        RecommendMode::WatchlistSimilar,
        RecommendMode::UserCollaborative,
    ];
}

impl FromStr for RecommendMode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "0" | "movie" | "moviesimilar" => Ok(RecommendMode::MovieSimilar),
            "1" | "history" | "userhistory" => Ok(RecommendMode::UserHistory),
            "2" | "watchlist" | "watchlistsimilar" => Ok(RecommendMode::WatchlistSimilar),
            "3" | "collaborative" | "usercollaborative" => Ok(RecommendMode::UserCollaborative),
            other => Err(format!(
                "unknown mode '{}' (expected movie, history, watchlist or collaborative)",
                other
            )),
        }
    }
}

impl fmt::Display for RecommendMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RecommendMode::MovieSimilar => "movie",
            RecommendMode::UserHistory => "history",
            RecommendMode::WatchlistSimilar => "watchlist",
            RecommendMode::UserCollaborative => "collaborative",
        };
        f.write_str(name)
    }
}

/// One entry of a recommendation result
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecommendedMovie {
    pub movie_id: MovieId,
    pub title: String,
    pub image_url: Option<String>,
}

/// Ordered, duplicate-free, at most `top_n` long
pub type RecommendationResult = Vec<RecommendedMovie>;

/// Dispatches requests to the engines
#[derive(Clone)]
pub struct RecommendationGateway {
    store: Arc<dyn CatalogStore>,
    holder: SnapshotHolder,
    content: ContentSimilarity,
    collaborative: Arc<CollaborativeRecommender>,
}

impl RecommendationGateway {
    pub fn new(
        store: Arc<dyn CatalogStore>,
        holder: SnapshotHolder,
        collaborative: CollaborativeRecommender,
    ) -> Self {
        Self {
            store,
            holder,
            content: ContentSimilarity::new(),
            collaborative: Arc::new(collaborative),
        }
    }

    /// Build a gateway with the ALS settings from `config`
    pub fn from_config(
        store: Arc<dyn CatalogStore>,
        holder: SnapshotHolder,
        config: &RecommenderConfig,
    ) -> Self {
        let collaborative = CollaborativeRecommender::new(config.als_params())
            .with_model_cache(config.als_cache_models);
        Self::new(store, holder, collaborative)
    }

    pub fn holder(&self) -> &SnapshotHolder {
        &self.holder
    }

    /// Recommend up to `top_n` movies. Never fails; an empty list means
    /// "nothing available right now".
    #[instrument(skip(self))]
    pub async fn recommend(&self, seed_id: i64, mode: RecommendMode, top_n: i64) -> RecommendationResult {
        if top_n <= 0 {
            return Vec::new();
        }
        let Ok(id) = u32::try_from(seed_id) else {
            debug!("Seed id {} is outside the id range", seed_id);
            return Vec::new();
        };
        let top_n = usize::try_from(top_n).unwrap_or(usize::MAX);

        let start_time = Instant::now();
        let gateway = self.clone();
        let outcome = tokio::task::spawn_blocking(move || gateway.try_recommend(id, mode, top_n)).await;

        match outcome {
            Ok(Ok(movies)) => {
                info!(
                    "Returned {} recommendations for {} seed {} in {:.2?}",
                    movies.len(),
                    mode,
                    seed_id,
                    start_time.elapsed()
                );
                movies
            }
            Ok(Err(e)) => {
                warn!(
                    mode = %mode,
                    seed_id,
                    kind = e.kind(),
                    error = %e,
                    "Recommendation degraded to empty result"
                );
                Vec::new()
            }
            Err(e) => {
                error!(mode = %mode, seed_id, error = %e, "Recommendation task failed");
                Vec::new()
            }
        }
    }

    /// Blocking form of [`recommend`](Self::recommend) that reports why a
    /// request produced nothing.
    pub fn try_recommend(&self, id: u32, mode: RecommendMode, top_n: usize) -> Result<RecommendationResult> {
        if top_n == 0 {
            return Ok(Vec::new());
        }
        // One snapshot for the whole request
        let snapshot = self.holder.current();

        let scored = match mode {
            RecommendMode::MovieSimilar => self
                .content
                .similar(&SimilarityQuery::new([id], top_n), &snapshot)?,
            RecommendMode::UserHistory => {
                let seeds = self.store.watched_movies(id)?;
                self.similar_to_set(seeds, top_n, &snapshot)?
            }
            RecommendMode::WatchlistSimilar => {
                let seeds = self.store.watchlist_movies(id)?;
                self.similar_to_set(seeds, top_n, &snapshot)?
            }
            RecommendMode::UserCollaborative => {
                let interactions = self.store.interactions()?;
                // Rank everything; ids unknown to the snapshot are dropped before truncating
                self.collaborative.recommend(id, usize::MAX, &interactions)?
            }
        };

        Ok(enrich(scored, &snapshot, top_n))
    }

    /// Content similarity for a seed set read from the store
    fn similar_to_set(
        &self,
        seeds: Vec<MovieId>,
        top_n: usize,
        snapshot: &CorpusSnapshot,
    ) -> Result<Vec<ScoredMovie>> {
        let Some(&first) = seeds.first() else {
            return Ok(Vec::new());
        };

        // Movies deleted since the last refresh are not in the snapshot
        let known: Vec<MovieId> = seeds.iter().copied().filter(|&id| snapshot.contains(id)).collect();
        if known.is_empty() {
            return Err(RecommendError::SeedNotFound(first));
        }
        if known.len() < seeds.len() {
            debug!(
                "Pruned {} seeds missing from snapshot {}",
                seeds.len() - known.len(),
                snapshot.version()
            );
        }

        let query = SimilarityQuery::new(known, top_n).with_excluded(seeds);
        self.content.similar(&query, snapshot)
    }
}

/// Attach display data; ids the snapshot does not know are dropped
fn enrich(scored: Vec<ScoredMovie>, snapshot: &CorpusSnapshot, top_n: usize) -> RecommendationResult {
    scored
        .into_iter()
        .filter_map(|m| {
            let doc = snapshot.document(m.movie_id)?;
            Some(RecommendedMovie {
                movie_id: m.movie_id,
                title: doc.title.clone(),
                image_url: snapshot.image_url(m.movie_id).map(str::to_string),
            })
        })
        .take(top_n)
        .collect()
}
