//! Content Similarity - "More like this"
//!
//! Ranks movies by TF-IDF cosine similarity to one or more seed movies.
//!
//! ## Algorithm
//! 1. Look up each seed's row in the snapshot (missing seed = error)
//! 2. Cosine similarity of each seed row against every document
//! 3. Several seeds: average the similarity rows element-wise
//! 4. Seeds and excluded movies get a score below any real similarity
//! 5. Sort by score, ties to the lower movie id, keep the top N
//!
//! The same engine serves a single movie, a user's watch history and a
//! watchlist; only the seed set differs.
//!
//! ## Learning Goals
//! - Borrowing one snapshot for the whole computation
//! - BTreeSet for ordered, deduplicated id sets
//! - Reusing a shared ranking helper

use crate::error::{RecommendError, Result};
use crate::ranking::{self, EXCLUDED_SCORE, ScoredMovie};
use corpus::CorpusSnapshot;
use data_loader::MovieId;
use std::collections::BTreeSet;
use tracing::{debug, instrument};

/// Seeds, exclusions and size of one similarity request
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SimilarityQuery {
    pub seed_ids: BTreeSet<MovieId>,
    /// Never returned; the seeds are always excluded as well
    pub excluded_ids: BTreeSet<MovieId>,
    pub top_n: usize,
}

impl SimilarityQuery {
    pub fn new(seed_ids: impl IntoIterator<Item = MovieId>, top_n: usize) -> Self {
        Self {
            seed_ids: seed_ids.into_iter().collect(),
            excluded_ids: BTreeSet::new(),
            top_n,
        }
    }

    /// Add ids that must not be recommended
    pub fn with_excluded(mut self, excluded: impl IntoIterator<Item = MovieId>) -> Self {
        self.excluded_ids.extend(excluded);
        self
    }
}

/// TF-IDF content similarity over a corpus snapshot.
///
/// Stateless: the vocabulary and vectors live in the snapshot, so one engine
/// can serve every snapshot version.
#[derive(Debug, Clone, Copy, Default)]
pub struct ContentSimilarity;

impl ContentSimilarity {
    pub fn new() -> Self {
        Self
    }

    /// Rank movies in `snapshot` by similarity to the query's seeds
    #[instrument(
        skip(self, query, snapshot),
        fields(seeds = query.seed_ids.len(), version = snapshot.version())
    )]
    pub fn similar(&self, query: &SimilarityQuery, snapshot: &CorpusSnapshot) -> Result<Vec<ScoredMovie>> {
        if query.seed_ids.is_empty() || query.top_n == 0 {
            return Ok(Vec::new());
        }

        // Resolve every seed before doing any work
        let seed_rows = query
            .seed_ids
            .iter()
            .map(|&id| snapshot.row_of(id).ok_or(RecommendError::SeedNotFound(id)))
            .collect::<Result<Vec<usize>>>()?;

        let matrix = snapshot.matrix();
        let mut scores = vec![0.0; snapshot.len()];
        for &row in &seed_rows {
            let sims = matrix
                .similarity_row(row)
                .ok_or_else(|| RecommendError::Fit(format!("corpus row {} out of range", row)))?;
            for (total, sim) in scores.iter_mut().zip(sims) {
                *total += sim;
            }
        }
        let k = seed_rows.len() as f64;
        scores.iter_mut().for_each(|s| *s /= k);

        for &id in query.seed_ids.iter().chain(&query.excluded_ids) {
            if let Some(row) = snapshot.row_of(id) {
                scores[row] = EXCLUDED_SCORE;
            }
        }

        let candidates: Vec<ScoredMovie> = snapshot
            .documents()
            .iter()
            .zip(&scores)
            .filter(|&(_, &score)| score > EXCLUDED_SCORE)
            .map(|(doc, &score)| ScoredMovie {
                movie_id: doc.movie_id,
                score,
            })
            .collect();

        debug!("Scored {} candidate movies", candidates.len());
        Ok(ranking::top_n(candidates, query.top_n))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use corpus::StopWords;
    use data_loader::{CatalogStore, DataIndex, Movie};

    /// Five movies; 2 shares every genre/director/actor with 1
    fn create_test_snapshot() -> CorpusSnapshot {
        let mut index = DataIndex::new();
        index.insert_movie(Movie::new(1, "Seed", "A daring rescue"));
        index.insert_movie(Movie::new(2, "Twin", "A quiet afternoon"));
        index.insert_movie(Movie::new(3, "Drama", "A family reunion"));
        index.insert_movie(Movie::new(4, "Comedy", "A wedding disaster"));
        index.insert_movie(Movie::new(5, "Horror", "A haunted cabin"));

        for id in [1, 2] {
            index.insert_genre(id, "Action");
            index.insert_genre(id, "Adventure");
            index.insert_director(id, "DirectorX");
            index.insert_actor(id, "Actor1");
            index.insert_actor(id, "Actor2");
        }
        index.insert_genre(3, "Drama");
        index.insert_genre(4, "Comedy");
        index.insert_genre(5, "Horror");
        index.insert_genre(5, "Adventure");

        CorpusSnapshot::from_store(1, &index as &dyn CatalogStore, StopWords::English).unwrap()
    }

    fn ids(scored: &[ScoredMovie]) -> Vec<MovieId> {
        scored.iter().map(|m| m.movie_id).collect()
    }

    #[test]
    fn test_shared_metadata_ranks_first() {
        let snapshot = create_test_snapshot();
        let result = ContentSimilarity::new()
            .similar(&SimilarityQuery::new([1], 4), &snapshot)
            .unwrap();

        assert_eq!(result.len(), 4);
        assert_eq!(result[0].movie_id, 2);
        assert!(!ids(&result).contains(&1));
    }

    #[test]
    fn test_missing_seed() {
        let snapshot = create_test_snapshot();
        let err = ContentSimilarity::new()
            .similar(&SimilarityQuery::new([1, 42], 3), &snapshot)
            .unwrap_err();
        assert!(matches!(err, RecommendError::SeedNotFound(42)));
    }

    #[test]
    fn test_empty_seeds_or_zero_top_n() {
        let snapshot = create_test_snapshot();
        let engine = ContentSimilarity::new();

        assert!(engine.similar(&SimilarityQuery::new([], 3), &snapshot).unwrap().is_empty());
        assert!(engine.similar(&SimilarityQuery::new([1], 0), &snapshot).unwrap().is_empty());
    }

    #[test]
    fn test_excluded_and_short_result() {
        let snapshot = create_test_snapshot();
        let query = SimilarityQuery::new([1, 3], 10).with_excluded([2]);
        let result = ContentSimilarity::new().similar(&query, &snapshot).unwrap();

        // Only 4 and 5 remain eligible
        let mut got = ids(&result);
        got.sort();
        assert_eq!(got, vec![4, 5]);
    }

    #[test]
    fn test_deterministic_with_ties() {
        let snapshot = create_test_snapshot();
        let engine = ContentSimilarity::new();
        let query = SimilarityQuery::new([3], 4);

        let first = engine.similar(&query, &snapshot).unwrap();
        let second = engine.similar(&query, &snapshot).unwrap();
        assert_eq!(first, second);

        // Nothing shares a term with 3, so the zero scores sort by id
        let zero_ids: Vec<MovieId> = first
            .iter()
            .filter(|m| m.score == 0.0)
            .map(|m| m.movie_id)
            .collect();
        let mut sorted = zero_ids.clone();
        sorted.sort();
        assert_eq!(zero_ids, sorted);
    }
}
