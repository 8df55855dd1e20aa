//! Binary user x movie matrix built from the interaction table.
//!
//! Rust concepts you'll learn:
//! - Sorted `Vec`s with `binary_search` as compact id -> index maps
//! - Adjacency lists in both directions for a sparse matrix
//! - `Hash` for fingerprinting a data set

use data_loader::{InteractionRecord, MovieId, UserId};
use std::collections::BTreeSet;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

/// Which users watched which movies.
///
/// Users and movies are indexed by ascending id, so index <-> id decoding is
/// the same for every matrix built from the same records. The universe is
/// every user and movie that appears in any record, watched or not.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InteractionMatrix {
    user_ids: Vec<UserId>,
    movie_ids: Vec<MovieId>,
    /// Watched movie indices per user, ascending
    user_items: Vec<Vec<usize>>,
    /// Users who watched each movie, ascending
    item_users: Vec<Vec<usize>>,
}

impl InteractionMatrix {
    pub fn from_records(records: &[InteractionRecord]) -> Self {
        let user_ids: Vec<UserId> = records
            .iter()
            .map(|r| r.user_id)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        let movie_ids: Vec<MovieId> = records
            .iter()
            .map(|r| r.movie_id)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        let mut user_items: Vec<BTreeSet<usize>> = vec![BTreeSet::new(); user_ids.len()];
        let mut item_users: Vec<BTreeSet<usize>> = vec![BTreeSet::new(); movie_ids.len()];

        // Ratings and watch counts are not weights; only has_watched counts
        for record in records.iter().filter(|r| r.has_watched) {
            if let (Ok(u), Ok(m)) = (
                user_ids.binary_search(&record.user_id),
                movie_ids.binary_search(&record.movie_id),
            ) {
                user_items[u].insert(m);
                item_users[m].insert(u);
            }
        }

        Self {
            user_ids,
            movie_ids,
            user_items: user_items.into_iter().map(|s| s.into_iter().collect()).collect(),
            item_users: item_users.into_iter().map(|s| s.into_iter().collect()).collect(),
        }
    }

    pub fn n_users(&self) -> usize {
        self.user_ids.len()
    }

    pub fn n_movies(&self) -> usize {
        self.movie_ids.len()
    }

    /// Number of watched cells
    pub fn nnz(&self) -> usize {
        self.user_items.iter().map(Vec::len).sum()
    }

    pub fn user_index(&self, user_id: UserId) -> Option<usize> {
        self.user_ids.binary_search(&user_id).ok()
    }

    pub fn movie_id(&self, index: usize) -> Option<MovieId> {
        self.movie_ids.get(index).copied()
    }

    pub fn movie_ids(&self) -> &[MovieId] {
        &self.movie_ids
    }

    /// Watched movie indices of a user
    pub fn user_items(&self, user: usize) -> &[usize] {
        self.user_items.get(user).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Indices of users who watched a movie
    pub fn item_users(&self, movie: usize) -> &[usize] {
        self.item_users.get(movie).map(Vec::as_slice).unwrap_or(&[])
    }

    pub(crate) fn user_rows(&self) -> &[Vec<usize>] {
        &self.user_items
    }

    pub(crate) fn item_rows(&self) -> &[Vec<usize>] {
        &self.item_users
    }

    /// Hash of the universe and every watched (user, movie) pair
    pub fn fingerprint(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        self.user_ids.hash(&mut hasher);
        self.movie_ids.hash(&mut hasher);
        self.user_items.hash(&mut hasher);
        hasher.finish()
    }
}
