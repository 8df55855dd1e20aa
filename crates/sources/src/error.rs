//! Error taxonomy of the recommendation engines.
//!
//! None of these reach the caller of the gateway; they are logged and turned
//! into an empty result there.

use data_loader::{DataLoadError, MovieId, UserId};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RecommendError {
    /// A seed movie is not in the corpus snapshot
    #[error("Seed movie {0} not found in corpus")]
    SeedNotFound(MovieId),

    /// The user appears in the interaction table but has watched nothing
    #[error("User {0} has no watched movies")]
    ColdStart(UserId),

    /// The user does not appear in the interaction table at all
    #[error("User {0} not found in interactions")]
    UnknownUser(UserId),

    /// Factorization hit a degenerate system
    #[error("Model fit failed: {0}")]
    Fit(String),

    /// Interactions or seed sets could not be read
    #[error("Store error: {0}")]
    Store(#[from] DataLoadError),
}

impl RecommendError {
    /// Short label used in logs
    pub fn kind(&self) -> &'static str {
        match self {
            RecommendError::SeedNotFound(_) => "seed_not_found",
            RecommendError::ColdStart(_) => "cold_start",
            RecommendError::UnknownUser(_) => "unknown_user",
            RecommendError::Fit(_) => "fit",
            RecommendError::Store(_) => "store",
        }
    }
}

pub type Result<T> = std::result::Result<T, RecommendError>;
