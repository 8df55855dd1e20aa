//! DataIndex building and indexing logic.
//!
//! This module builds the DataIndex from parsed data files:
//! - Parse the catalog and interaction tables in parallel
//! - Build the secondary indices (watched movies per user, watchlist members)
//! - Validate referential integrity
//!
//! Rust concepts you'll learn:
//! - Using Rayon's `join` for parallel I/O-bound parsing
//! - Iterator methods (filter, any, etc.)
//! - Early returns with `?`

use crate::error::{DataLoadError, Result};
use crate::parser;
use crate::types::*;
use rayon::prelude::*;
use std::path::Path;
use tracing::info;

impl DataIndex {
    /// Load a catalog directory.
    ///
    /// This is the main entry point for loading data from disk.
    ///
    /// Steps:
    /// 1. Parse all files in parallel (only movies.dat is required)
    /// 2. Insert rows, which also maintains the secondary indices
    /// 3. Validate data integrity
    pub fn load_from_files(data_dir: &Path) -> Result<Self> {
        info!("Loading catalog from {:?}", data_dir);

        let movies_path = data_dir.join("movies.dat");
        let genres_path = data_dir.join("genres.dat");
        let actors_path = data_dir.join("actors.dat");
        let directors_path = data_dir.join("directors.dat");
        let interactions_path = data_dir.join("interactions.dat");
        let watchlists_path = data_dir.join("watchlists.dat");

        // Nested joins give us parallelism across the six files
        let ((movies, (genres, actors)), (directors, (interactions, watchlists))) = rayon::join(
            || {
                rayon::join(
                    || parser::parse_movies(&movies_path),
                    || {
                        rayon::join(
                            || parser::optional(parser::parse_links(&genres_path)),
                            || parser::optional(parser::parse_links(&actors_path)),
                        )
                    },
                )
            },
            || {
                rayon::join(
                    || parser::optional(parser::parse_links(&directors_path)),
                    || {
                        rayon::join(
                            || parser::optional(parser::parse_interactions(&interactions_path)),
                            || parser::optional(parser::parse_watchlists(&watchlists_path)),
                        )
                    },
                )
            },
        );

        let movies = movies?;
        let genres = genres?;
        let actors = actors?;
        let directors = directors?;
        let interactions = interactions?;
        let watchlists = watchlists?;

        info!(
            "Parsed {} movies, {} genre links, {} actor links, {} directors, {} interactions, {} watchlist entries",
            movies.len(),
            genres.len(),
            actors.len(),
            directors.len(),
            interactions.len(),
            watchlists.len()
        );

        let mut index = DataIndex::new();
        for movie in movies {
            index.insert_movie(movie);
        }
        for link in genres {
            index.insert_genre(link.movie_id, link.name);
        }
        for link in actors {
            index.insert_actor(link.movie_id, link.name);
        }
        for link in directors {
            index.insert_director(link.movie_id, link.name);
        }
        for record in interactions {
            index.insert_interaction(record);
        }
        for entry in watchlists {
            index.insert_watchlist_entry(entry.watchlist_id, entry.movie_id);
        }

        index.validate()?;

        info!("DataIndex successfully built and validated");
        Ok(index)
    }

    /// Validate data integrity
    ///
    /// Check that:
    /// - Every genre/actor/director link references a known movie
    /// - Every interaction and watchlist entry references a known movie
    /// - Catalog and viewer ratings are in the valid range (0.0 - 10.0)
    pub fn validate(&self) -> Result<()> {
        for movie in self.movies.values() {
            if !(0.0..=10.0).contains(&movie.rating) {
                return Err(DataLoadError::InvalidValue {
                    field: "movie.rating".to_string(),
                    value: movie.rating.to_string(),
                });
            }
        }

        let link_targets = self
            .genres
            .iter()
            .chain(self.actors.iter())
            .map(|link| link.movie_id)
            .chain(self.directors.keys().copied());
        for movie_id in link_targets {
            self.require_movie(movie_id)?;
        }

        // Interaction checks are independent per row, so run them in parallel
        self.interactions
            .par_iter()
            .try_for_each(|(_, record)| {
                self.require_movie(record.movie_id)?;
                if !(0.0..=10.0).contains(&record.rating) {
                    return Err(DataLoadError::InvalidValue {
                        field: "interaction.rating".to_string(),
                        value: record.rating.to_string(),
                    });
                }
                Ok(())
            })?;

        for entry in &self.watchlists {
            self.require_movie(entry.movie_id)?;
        }
        Ok(())
    }

    fn require_movie(&self, movie_id: MovieId) -> Result<()> {
        if self.movies.contains_key(&movie_id) {
            Ok(())
        } else {
            Err(DataLoadError::MissingReference {
                entity: "Movie".to_string(),
                id: movie_id,
            })
        }
    }
}
