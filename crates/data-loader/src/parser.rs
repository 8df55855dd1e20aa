//! Parser for catalog data files.
//!
//! Every file uses `::` as the field separator, one record per line:
//! - movies.dat: movieId::title::description::rating::imageUrl
//! - genres.dat / actors.dat / directors.dat: movieId::name
//! - interactions.dat: userId::movieId::hasWatched::timesWatched::rating::isFavorite
//! - watchlists.dat: watchlistId::movieId
//!
//! Rust concepts you'll learn here:
//! - String parsing and splitting
//! - Error handling with `?` operator
//! - Generic parsing through the `FromStr` trait

use crate::error::{DataLoadError, Result};
use crate::types::*;
use std::fmt::Display;
use std::path::Path;
use std::str::{FromStr, Split};

/// Read a file into owned lines.
///
/// A missing file is reported as `FileNotFound` so callers can decide whether
/// the file is optional.
fn read_lines(path: &Path) -> Result<Vec<String>> {
    if !path.exists() {
        return Err(DataLoadError::FileNotFound {
            path: path.display().to_string(),
        });
    }
    let content = std::fs::read_to_string(path)?;
    Ok(content.lines().map(|s| s.to_string()).collect())
}

/// Name used in error messages ("movies.dat" rather than the full path)
fn file_label(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Pull the next `::`-separated field or report which one is missing
fn next_field<'a>(
    parts: &mut Split<'a, &'static str>,
    file: &str,
    line: usize,
    name: &str,
) -> Result<&'a str> {
    parts.next().ok_or_else(|| DataLoadError::ParseError {
        file: file.to_string(),
        line,
        reason: format!("Missing {}", name),
    })
}

/// Parse a field with `FromStr`, attaching file/line context on failure
fn parse_field<T>(value: &str, file: &str, line: usize, name: &str) -> Result<T>
where
    T: FromStr,
    T::Err: Display,
{
    value.trim().parse().map_err(|e| DataLoadError::ParseError {
        file: file.to_string(),
        line,
        reason: format!("Invalid {}: {}", name, e),
    })
}

/// Parse a boolean flag written as 0/1 or true/false
fn parse_flag(value: &str, field: &str) -> Result<bool> {
    match value.trim() {
        "1" | "true" | "TRUE" | "True" => Ok(true),
        "0" | "false" | "FALSE" | "False" => Ok(false),
        other => Err(DataLoadError::InvalidValue {
            field: field.to_string(),
            value: other.to_string(),
        }),
    }
}

/// Non-empty, trimmed lines paired with their 1-based line numbers
fn records(lines: &[String]) -> impl Iterator<Item = (usize, &str)> {
    lines
        .iter()
        .enumerate()
        .map(|(idx, line)| (idx + 1, line.trim()))
        .filter(|(_, line)| !line.is_empty())
}

/// Parse the movies.dat file
///
/// Format: movieId::title::description::rating::imageUrl
///
/// The image URL may be empty. The description is everything between the
/// title and the rating, so it may itself contain the separator.
pub fn parse_movies(path: &Path) -> Result<Vec<Movie>> {
    let file = file_label(path);
    let lines = read_lines(path)?;
    let mut movies = Vec::new();

    for (line_no, line) in records(&lines) {
        let mut parts = line.split("::");

        let movie_id = next_field(&mut parts, &file, line_no, "movieId")?;
        let title = next_field(&mut parts, &file, line_no, "title")?;

        // Remaining fields: description may span several pieces
        let rest: Vec<&str> = parts.collect();
        if rest.len() < 3 {
            return Err(DataLoadError::ParseError {
                file: file.clone(),
                line: line_no,
                reason: "Expected description, rating and imageUrl".to_string(),
            });
        }
        let image_url = rest[rest.len() - 1].trim();
        let rating = rest[rest.len() - 2];
        let description = rest[..rest.len() - 2].join("::");

        let movie = Movie {
            id: parse_field(movie_id, &file, line_no, "movieId")?,
            title: title.trim().to_string(),
            description: description.trim().to_string(),
            rating: parse_field(rating, &file, line_no, "rating")?,
            image_url: if image_url.is_empty() {
                None
            } else {
                Some(image_url.to_string())
            },
        };

        movies.push(movie);
    }
    Ok(movies)
}

/// Parse a join-table file (genres.dat, actors.dat, directors.dat)
///
/// Format: movieId::name
pub fn parse_links(path: &Path) -> Result<Vec<MovieLink>> {
    let file = file_label(path);
    let lines = read_lines(path)?;
    let mut links = Vec::new();

    for (line_no, line) in records(&lines) {
        let mut parts = line.split("::");
        let movie_id = next_field(&mut parts, &file, line_no, "movieId")?;
        let name = next_field(&mut parts, &file, line_no, "name")?;

        links.push(MovieLink {
            movie_id: parse_field(movie_id, &file, line_no, "movieId")?,
            name: name.trim().to_string(),
        });
    }
    Ok(links)
}

/// Parse the interactions.dat file
///
/// Format: userId::movieId::hasWatched::timesWatched::rating::isFavorite
pub fn parse_interactions(path: &Path) -> Result<Vec<InteractionRecord>> {
    let file = file_label(path);
    let lines = read_lines(path)?;
    let mut interactions = Vec::new();

    for (line_no, line) in records(&lines) {
        let mut parts = line.split("::");

        let user_id = next_field(&mut parts, &file, line_no, "userId")?;
        let movie_id = next_field(&mut parts, &file, line_no, "movieId")?;
        let has_watched = next_field(&mut parts, &file, line_no, "hasWatched")?;
        let times_watched = next_field(&mut parts, &file, line_no, "timesWatched")?;
        let rating = next_field(&mut parts, &file, line_no, "rating")?;
        let is_favorite = next_field(&mut parts, &file, line_no, "isFavorite")?;

        interactions.push(InteractionRecord {
            user_id: parse_field(user_id, &file, line_no, "userId")?,
            movie_id: parse_field(movie_id, &file, line_no, "movieId")?,
            has_watched: parse_flag(has_watched, "hasWatched")?,
            times_watched: parse_field(times_watched, &file, line_no, "timesWatched")?,
            rating: parse_field(rating, &file, line_no, "rating")?,
            is_favorite: parse_flag(is_favorite, "isFavorite")?,
        });
    }
    Ok(interactions)
}

/// Parse the watchlists.dat file
///
/// Format: watchlistId::movieId
pub fn parse_watchlists(path: &Path) -> Result<Vec<WatchlistMembership>> {
    let file = file_label(path);
    let lines = read_lines(path)?;
    let mut memberships = Vec::new();

    for (line_no, line) in records(&lines) {
        let mut parts = line.split("::");
        let watchlist_id = next_field(&mut parts, &file, line_no, "watchlistId")?;
        let movie_id = next_field(&mut parts, &file, line_no, "movieId")?;

        memberships.push(WatchlistMembership {
            watchlist_id: parse_field(watchlist_id, &file, line_no, "watchlistId")?,
            movie_id: parse_field(movie_id, &file, line_no, "movieId")?,
        });
    }
    Ok(memberships)
}

/// Treat a missing optional file as an empty table
pub fn optional<T>(result: Result<Vec<T>>) -> Result<Vec<T>> {
    match result {
        Err(DataLoadError::FileNotFound { .. }) => Ok(Vec::new()),
        other => other,
    }
}
