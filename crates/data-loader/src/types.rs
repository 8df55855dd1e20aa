//! Core domain types for the movie catalog and viewer interactions.
//!
//! This module defines the records handed to the recommendation engine by the
//! persistence layer. Key Rust concepts demonstrated here:
//! - Type aliases for domain clarity (UserId, MovieId, WatchlistId)
//! - Fixed-field record structs instead of loosely typed rows
//! - HashMap and BTreeMap for efficient lookups

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};

// =============================================================================
// Type Aliases
// =============================================================================
// These make the domain clearer and prevent mixing up user IDs with movie IDs

/// Unique identifier for a viewer
pub type UserId = u32;

/// Unique identifier for a catalog movie
pub type MovieId = u32;

/// Unique identifier for a curated watchlist
pub type WatchlistId = u32;

// =============================================================================
// Catalog Types
// =============================================================================

/// Represents a movie in the catalog.
///
/// `rating` is the catalog score (0-10), not a viewer rating.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Movie {
    pub id: MovieId,
    pub title: String,
    pub description: String,
    pub rating: f32,
    /// Poster location, if the catalog has one
    pub image_url: Option<String>,
}

impl Movie {
    /// Create a movie with no catalog rating or poster
    pub fn new(id: MovieId, title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            id,
            title: title.into(),
            description: description.into(),
            rating: 0.0,
            image_url: None,
        }
    }
}

/// A single name attached to a movie (genre, actor or director).
///
/// Rust concept: one small struct serves all three join tables; the table it
/// came from decides what the name means.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MovieLink {
    pub movie_id: MovieId,
    pub name: String,
}

// =============================================================================
// Interaction Types
// =============================================================================

/// One row of the viewer/movie interaction table, keyed by (user_id, movie_id).
///
/// The engine only uses `has_watched` as its implicit-feedback signal; the
/// other fields are carried because the table has them.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct InteractionRecord {
    pub user_id: UserId,
    pub movie_id: MovieId,
    pub has_watched: bool,
    pub times_watched: u32,
    /// Viewer rating from 0.0 to 10.0
    pub rating: f32,
    pub is_favorite: bool,
}

impl InteractionRecord {
    /// Shorthand for a watched movie with no other signals set.
    pub fn watched(user_id: UserId, movie_id: MovieId) -> Self {
        Self {
            user_id,
            movie_id,
            has_watched: true,
            times_watched: 1,
            rating: 0.0,
            is_favorite: false,
        }
    }
}

/// Membership of a movie in a watchlist
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct WatchlistMembership {
    pub watchlist_id: WatchlistId,
    pub movie_id: MovieId,
}

// =============================================================================
// DataIndex - The In-Memory Catalog Store
// =============================================================================

/// Holds the catalog and interaction tables in memory.
///
/// This is the heart of the data-loader crate. It provides O(1) lookups
/// for movies and the per-user / per-watchlist secondary indices the engine
/// needs to resolve seed sets.
///
/// Rust concepts demonstrated:
/// - HashMap<K, V> for O(1) lookups
/// - BTreeMap/BTreeSet where ordered iteration keeps results deterministic
/// - Borrowing: getters return `&T` (references) not `T` (owned values)
#[derive(Debug, Clone)]
pub struct DataIndex {
    // Primary data stores
    pub(crate) movies: BTreeMap<MovieId, Movie>,

    // Join tables, kept in insertion order per movie
    pub(crate) genres: Vec<MovieLink>,
    pub(crate) actors: Vec<MovieLink>,
    /// One director per movie; a later insert replaces an earlier one
    pub(crate) directors: BTreeMap<MovieId, String>,

    /// Interaction rows keyed by (user_id, movie_id)
    pub(crate) interactions: BTreeMap<(UserId, MovieId), InteractionRecord>,
    pub(crate) watchlists: BTreeSet<WatchlistMembership>,

    // Secondary indices
    /// Movies each user has `has_watched = true` on
    pub(crate) watched_index: HashMap<UserId, BTreeSet<MovieId>>,
    /// Movies in each watchlist
    pub(crate) watchlist_index: HashMap<WatchlistId, BTreeSet<MovieId>>,
}

impl DataIndex {
    /// Creates a new, empty DataIndex
    pub fn new() -> Self {
        Self {
            movies: BTreeMap::new(),
            genres: Vec::new(),
            actors: Vec::new(),
            directors: BTreeMap::new(),
            interactions: BTreeMap::new(),
            watchlists: BTreeSet::new(),
            watched_index: HashMap::new(),
            watchlist_index: HashMap::new(),
        }
    }

    // Getters

    /// Get a movie by ID
    pub fn get_movie(&self, id: MovieId) -> Option<&Movie> {
        self.movies.get(&id)
    }

    /// All movie ids in ascending order
    pub fn get_all_movie_ids(&self) -> Vec<MovieId> {
        self.movies.keys().copied().collect()
    }

    /// Iterate over movies in ascending id order
    pub fn iter_movies(&self) -> impl Iterator<Item = &Movie> {
        self.movies.values()
    }

    /// Movies the user has watched, ascending
    pub fn get_watched(&self, user_id: UserId) -> Vec<MovieId> {
        self.watched_index
            .get(&user_id)
            .map(|set| set.iter().copied().collect())
            .unwrap_or_default()
    }

    /// Movies in a watchlist, ascending
    pub fn get_watchlist(&self, watchlist_id: WatchlistId) -> Vec<MovieId> {
        self.watchlist_index
            .get(&watchlist_id)
            .map(|set| set.iter().copied().collect())
            .unwrap_or_default()
    }

    /// Ids of every non-empty watchlist, ascending
    pub fn get_all_watchlist_ids(&self) -> Vec<WatchlistId> {
        let mut ids: Vec<WatchlistId> = self.watchlists.iter().map(|entry| entry.watchlist_id).collect();
        ids.dedup();
        ids
    }

    // Mutators - used during loading and by tests building fixtures

    /// Insert a movie into the index
    pub fn insert_movie(&mut self, movie: Movie) {
        self.movies.insert(movie.id, movie);
    }

    /// Attach a genre name to a movie
    pub fn insert_genre(&mut self, movie_id: MovieId, name: impl Into<String>) {
        self.genres.push(MovieLink { movie_id, name: name.into() });
    }

    /// Attach an actor name to a movie
    pub fn insert_actor(&mut self, movie_id: MovieId, name: impl Into<String>) {
        self.actors.push(MovieLink { movie_id, name: name.into() });
    }

    /// Set the director of a movie
    pub fn insert_director(&mut self, movie_id: MovieId, name: impl Into<String>) {
        self.directors.insert(movie_id, name.into());
    }

    /// Insert (or replace) an interaction row and update the watched index
    pub fn insert_interaction(&mut self, record: InteractionRecord) {
        let key = (record.user_id, record.movie_id);
        let watched = self.watched_index.entry(record.user_id).or_default();
        if record.has_watched {
            watched.insert(record.movie_id);
        } else {
            watched.remove(&record.movie_id);
        }
        self.interactions.insert(key, record);
    }

    /// Add a movie to a watchlist
    pub fn insert_watchlist_entry(&mut self, watchlist_id: WatchlistId, movie_id: MovieId) {
        self.watchlists.insert(WatchlistMembership { watchlist_id, movie_id });
        self.watchlist_index
            .entry(watchlist_id)
            .or_default()
            .insert(movie_id);
    }

    /// Get counts for debugging/validation: (movies, interactions, watchlist entries)
    pub fn counts(&self) -> (usize, usize, usize) {
        (self.movies.len(), self.interactions.len(), self.watchlists.len())
    }
}

// Implement Default trait for convenience
impl Default for DataIndex {
    fn default() -> Self {
        Self::new()
    }
}
