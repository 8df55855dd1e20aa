//! Collaborative Recommender - "Viewers like you also watched"
//!
//! Builds the binary watch matrix from the interaction table, factors it with
//! implicit ALS and scores every movie the user has not watched yet.
//!
//! ## Algorithm
//! 1. Build the user x movie matrix (indices from sorted ids)
//! 2. Reject users outside the matrix (unknown) or with no watched cells (cold start)
//! 3. Train (or reuse a cached model when caching is enabled)
//! 4. Score all movies with the user's latent vector
//! 5. Drop watched movies and keep the top N
//!
//! ## Learning Goals
//! - Builder-style configuration (`with_model_cache`)
//! - `Mutex<Option<T>>` as a single-slot cache shared across threads
//! - Sharing trained data with `Arc` instead of cloning it

use crate::als::{self, AlsParams, FactorModel};
use crate::error::{RecommendError, Result};
use crate::interactions::InteractionMatrix;
use crate::ranking::{self, ScoredMovie};
use data_loader::{InteractionRecord, UserId};
use std::collections::hash_map::DefaultHasher;
use std::collections::HashSet;
use std::hash::{Hash, Hasher};
use std::sync::{Arc, Mutex};
use tracing::{debug, info, instrument};

/// A trained model and the data it was trained on
#[derive(Debug, Clone)]
struct CachedModel {
    fingerprint: u64,
    matrix: Arc<InteractionMatrix>,
    model: Arc<FactorModel>,
}

/// Implicit-feedback collaborative filtering over the interaction table.
///
/// By default every call trains a fresh model. With the model cache enabled,
/// the last model is reused until the watched pairs or hyperparameters
/// change; training is deterministic, so results are the same either way.
#[derive(Debug)]
pub struct CollaborativeRecommender {
    params: AlsParams,
    cache: Option<Mutex<Option<CachedModel>>>,
}

impl CollaborativeRecommender {
    pub fn new(params: AlsParams) -> Self {
        Self { params, cache: None }
    }

    /// Keep the last trained model between calls (default: off)
    pub fn with_model_cache(mut self, enabled: bool) -> Self {
        self.cache = enabled.then(|| Mutex::new(None));
        self
    }

    /// Recommend up to `top_n` unwatched movies for `user_id`
    #[instrument(skip(self, interactions), fields(records = interactions.len()))]
    pub fn recommend(
        &self,
        user_id: UserId,
        top_n: usize,
        interactions: &[InteractionRecord],
    ) -> Result<Vec<ScoredMovie>> {
        let matrix = InteractionMatrix::from_records(interactions);

        let user = matrix
            .user_index(user_id)
            .ok_or(RecommendError::UnknownUser(user_id))?;
        if matrix.user_items(user).is_empty() {
            return Err(RecommendError::ColdStart(user_id));
        }
        if top_n == 0 {
            return Ok(Vec::new());
        }

        let (matrix, model) = self.model_for(matrix)?;
        let user = matrix
            .user_index(user_id)
            .ok_or(RecommendError::UnknownUser(user_id))?;
        let scores = model
            .score_all(user)
            .ok_or_else(|| RecommendError::Fit(format!("no factors for user index {}", user)))?;

        let watched: HashSet<usize> = matrix.user_items(user).iter().copied().collect();
        let candidates: Vec<ScoredMovie> = scores
            .into_iter()
            .enumerate()
            .filter(|(idx, _)| !watched.contains(idx))
            .filter_map(|(idx, score)| {
                matrix
                    .movie_id(idx)
                    .map(|movie_id| ScoredMovie { movie_id, score })
            })
            .collect();

        debug!(
            "Scored {} unwatched movies for user {}",
            candidates.len(),
            user_id
        );
        Ok(ranking::top_n(candidates, top_n))
    }

    /// Train, or hand back the cached model if it was fit on identical data
    fn model_for(&self, matrix: InteractionMatrix) -> Result<(Arc<InteractionMatrix>, Arc<FactorModel>)> {
        let Some(cache) = &self.cache else {
            let model = als::fit(&matrix, &self.params)?;
            return Ok((Arc::new(matrix), Arc::new(model)));
        };

        let fingerprint = self.fingerprint(&matrix);
        {
            let slot = cache.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
            if let Some(cached) = slot.as_ref()
                && cached.fingerprint == fingerprint
            {
                debug!("Reusing cached collaborative model");
                return Ok((Arc::clone(&cached.matrix), Arc::clone(&cached.model)));
            }
        }

        // Train outside the lock so other requests are not serialized behind it
        let model = Arc::new(als::fit(&matrix, &self.params)?);
        let matrix = Arc::new(matrix);
        info!(
            users = matrix.n_users(),
            movies = matrix.n_movies(),
            watched = matrix.nnz(),
            "Trained collaborative model"
        );

        let mut slot = cache.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        *slot = Some(CachedModel {
            fingerprint,
            matrix: Arc::clone(&matrix),
            model: Arc::clone(&model),
        });
        Ok((matrix, model))
    }

    fn fingerprint(&self, matrix: &InteractionMatrix) -> u64 {
        let mut hasher = DefaultHasher::new();
        matrix.fingerprint().hash(&mut hasher);
        self.params.factors.hash(&mut hasher);
        self.params.iterations.hash(&mut hasher);
        self.params.seed.hash(&mut hasher);
        self.params.regularization.to_bits().hash(&mut hasher);
        self.params.alpha.to_bits().hash(&mut hasher);
        hasher.finish()
    }
}
