//! The read-only view of the persistence layer used by the engine.
//!
//! Rust concepts you'll learn:
//! - Traits as seams between crates (the engine never sees how data is stored)
//! - `Send + Sync` bounds so a store can be shared across threads behind an `Arc`
//! - Blanket implementations for smart pointers

use crate::error::Result;
use crate::types::*;
use std::sync::Arc;

/// Catalog and interaction tables, as handed to the recommendation engine.
///
/// Every call is a fresh read; an implementation backed by a remote database
/// reports outages as `DataLoadError::Unavailable`.
pub trait CatalogStore: Send + Sync {
    /// All catalog movies, ascending by id
    fn movies(&self) -> Result<Vec<Movie>>;

    /// Genre names per movie, in catalog order
    fn genre_links(&self) -> Result<Vec<MovieLink>>;

    /// Actor names per movie, in catalog order
    fn actor_links(&self) -> Result<Vec<MovieLink>>;

    /// At most one director per movie
    fn director_links(&self) -> Result<Vec<MovieLink>>;

    /// The whole interaction table
    fn interactions(&self) -> Result<Vec<InteractionRecord>>;

    /// Movies the user has `has_watched = true` on, ascending
    fn watched_movies(&self, user_id: UserId) -> Result<Vec<MovieId>>;

    /// Members of a watchlist, ascending
    fn watchlist_movies(&self, watchlist_id: WatchlistId) -> Result<Vec<MovieId>>;
}

impl CatalogStore for DataIndex {
    fn movies(&self) -> Result<Vec<Movie>> {
        Ok(self.iter_movies().cloned().collect())
    }

    fn genre_links(&self) -> Result<Vec<MovieLink>> {
        Ok(self.genres.clone())
    }

    fn actor_links(&self) -> Result<Vec<MovieLink>> {
        Ok(self.actors.clone())
    }

    fn director_links(&self) -> Result<Vec<MovieLink>> {
        Ok(self
            .directors
            .iter()
            .map(|(&movie_id, name)| MovieLink {
                movie_id,
                name: name.clone(),
            })
            .collect())
    }

    fn interactions(&self) -> Result<Vec<InteractionRecord>> {
        Ok(self.interactions.values().copied().collect())
    }

    fn watched_movies(&self, user_id: UserId) -> Result<Vec<MovieId>> {
        Ok(self.get_watched(user_id))
    }

    fn watchlist_movies(&self, watchlist_id: WatchlistId) -> Result<Vec<MovieId>> {
        Ok(self.get_watchlist(watchlist_id))
    }
}

/// Lets callers hand an `Arc<DataIndex>` (or any shared store) where a store is expected
impl<S: CatalogStore + ?Sized> CatalogStore for Arc<S> {
    fn movies(&self) -> Result<Vec<Movie>> {
        (**self).movies()
    }

    fn genre_links(&self) -> Result<Vec<MovieLink>> {
        (**self).genre_links()
    }

    fn actor_links(&self) -> Result<Vec<MovieLink>> {
        (**self).actor_links()
    }

    fn director_links(&self) -> Result<Vec<MovieLink>> {
        (**self).director_links()
    }

    fn interactions(&self) -> Result<Vec<InteractionRecord>> {
        (**self).interactions()
    }

    fn watched_movies(&self, user_id: UserId) -> Result<Vec<MovieId>> {
        (**self).watched_movies(user_id)
    }

    fn watchlist_movies(&self, watchlist_id: WatchlistId) -> Result<Vec<MovieId>> {
        (**self).watchlist_movies(watchlist_id)
    }
}
