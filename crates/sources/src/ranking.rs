//! Top-N selection shared by both engines.

use data_loader::MovieId;
use serde::Serialize;
use std::cmp::Ordering;

/// Score given to excluded movies; lower than any cosine similarity
pub const EXCLUDED_SCORE: f64 = -1.0;

/// A movie with the score an engine gave it
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ScoredMovie {
    pub movie_id: MovieId,
    pub score: f64,
}

/// Highest score first; equal scores go to the lower movie id
fn by_score_then_id(a: &ScoredMovie, b: &ScoredMovie) -> Ordering {
    b.score
        .total_cmp(&a.score)
        .then_with(|| a.movie_id.cmp(&b.movie_id))
}

/// Keep the `top_n` best-scored movies in rank order
pub fn top_n(mut scored: Vec<ScoredMovie>, top_n: usize) -> Vec<ScoredMovie> {
    if top_n == 0 {
        return Vec::new();
    }
    if scored.len() > top_n {
        // Partition first so only the head needs a full sort
        scored.select_nth_unstable_by(top_n - 1, by_score_then_id);
        scored.truncate(top_n);
    }
    scored.sort_unstable_by(by_score_then_id);
    scored
}
