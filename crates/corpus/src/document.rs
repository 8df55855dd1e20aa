//! Per-movie text documents.
//!
//! Rust concept: grouping join-table rows with `HashMap::entry` before a
//! single pass over the movies.

use data_loader::{Movie, MovieId, MovieLink};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// The text a movie is vectorized from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MovieDocument {
    pub movie_id: MovieId,
    pub title: String,
    /// description, genres, director and actors separated by single spaces
    pub content: String,
}

fn group_names(links: &[MovieLink]) -> HashMap<MovieId, Vec<&str>> {
    let mut grouped: HashMap<MovieId, Vec<&str>> = HashMap::new();
    for link in links {
        grouped.entry(link.movie_id).or_default().push(link.name.as_str());
    }
    grouped
}

/// Build one document per movie, ordered by ascending movie id.
///
/// Genres and actors are comma-joined in catalog order; any missing part
/// becomes an empty string so every document has the same four slots.
pub fn build_documents(
    movies: &[Movie],
    genres: &[MovieLink],
    directors: &[MovieLink],
    actors: &[MovieLink],
) -> Vec<MovieDocument> {
    let genre_map = group_names(genres);
    let actor_map = group_names(actors);
    // Last director wins
    let director_map: HashMap<MovieId, &str> = directors
        .iter()
        .map(|link| (link.movie_id, link.name.as_str()))
        .collect();

    let mut documents: Vec<MovieDocument> = movies
        .iter()
        .map(|movie| {
            let genres = genre_map
                .get(&movie.id)
                .map(|names| names.join(", "))
                .unwrap_or_default();
            let actors = actor_map
                .get(&movie.id)
                .map(|names| names.join(", "))
                .unwrap_or_default();
            let director = director_map.get(&movie.id).copied().unwrap_or("");

            MovieDocument {
                movie_id: movie.id,
                title: movie.title.clone(),
                content: format!("{} {} {} {}", movie.description, genres, director, actors),
            }
        })
        .collect();

    documents.sort_by_key(|doc| doc.movie_id);
    documents
}
