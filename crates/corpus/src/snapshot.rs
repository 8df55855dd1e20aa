//! Immutable corpus snapshots and the holder that publishes them.
//!
//! Rust concepts you'll learn:
//! - `Arc` for sharing immutable data between threads without copying
//! - `tokio::sync::watch` as a single-slot, always-latest channel
//! - Why an immutable value needs no lock to read

use crate::document::{MovieDocument, build_documents};
use crate::tfidf::{StopWords, TfidfMatrix, TfidfVectorizer};
use data_loader::{CatalogStore, DataLoadError, Movie, MovieId, MovieLink};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::SystemTime;
use tokio::sync::watch;

/// Documents and their TF-IDF rows at one point in time.
///
/// Row `i` of the matrix belongs to `documents[i]`; documents are in ascending
/// movie id order. Nothing mutates a snapshot after it is built.
#[derive(Debug)]
pub struct CorpusSnapshot {
    version: u64,
    built_at: SystemTime,
    documents: Vec<MovieDocument>,
    image_urls: Vec<Option<String>>,
    rows_by_id: HashMap<MovieId, usize>,
    matrix: TfidfMatrix,
}

impl CorpusSnapshot {
    /// The version-0 snapshot served before the first refresh
    pub fn empty() -> Self {
        Self {
            version: 0,
            built_at: SystemTime::now(),
            documents: Vec::new(),
            image_urls: Vec::new(),
            rows_by_id: HashMap::new(),
            matrix: TfidfMatrix::default(),
        }
    }

    /// Build a snapshot from already-fetched catalog rows
    pub fn build(
        version: u64,
        movies: &[Movie],
        genres: &[MovieLink],
        directors: &[MovieLink],
        actors: &[MovieLink],
        stop_words: StopWords,
    ) -> Self {
        let documents = build_documents(movies, genres, directors, actors);

        let images: HashMap<MovieId, &Option<String>> =
            movies.iter().map(|m| (m.id, &m.image_url)).collect();
        let image_urls = documents
            .iter()
            .map(|doc| images.get(&doc.movie_id).and_then(|url| (*url).clone()))
            .collect();
        let rows_by_id = documents
            .iter()
            .enumerate()
            .map(|(row, doc)| (doc.movie_id, row))
            .collect();

        let contents: Vec<&str> = documents.iter().map(|doc| doc.content.as_str()).collect();
        let matrix = TfidfVectorizer::new(stop_words).fit_transform(&contents);

        Self {
            version,
            built_at: SystemTime::now(),
            documents,
            image_urls,
            rows_by_id,
            matrix,
        }
    }

    /// Read every catalog table from the store and build a snapshot
    pub fn from_store(
        version: u64,
        store: &dyn CatalogStore,
        stop_words: StopWords,
    ) -> Result<Self, DataLoadError> {
        let movies = store.movies()?;
        let genres = store.genre_links()?;
        let directors = store.director_links()?;
        let actors = store.actor_links()?;
        Ok(Self::build(version, &movies, &genres, &directors, &actors, stop_words))
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn built_at(&self) -> SystemTime {
        self.built_at
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    pub fn documents(&self) -> &[MovieDocument] {
        &self.documents
    }

    pub fn matrix(&self) -> &TfidfMatrix {
        &self.matrix
    }

    pub fn contains(&self, movie_id: MovieId) -> bool {
        self.rows_by_id.contains_key(&movie_id)
    }

    /// Matrix row of a movie
    pub fn row_of(&self, movie_id: MovieId) -> Option<usize> {
        self.rows_by_id.get(&movie_id).copied()
    }

    pub fn document(&self, movie_id: MovieId) -> Option<&MovieDocument> {
        self.row_of(movie_id).map(|row| &self.documents[row])
    }

    pub fn image_url(&self, movie_id: MovieId) -> Option<&str> {
        self.row_of(movie_id)
            .and_then(|row| self.image_urls[row].as_deref())
    }
}

/// The single shared snapshot slot.
///
/// Rust concept: `watch::Sender::send_replace` swaps the whole `Arc` in one
/// step, so a reader sees either the old or the new snapshot. Readers keep
/// their own `Arc` clone for as long as a computation runs; the old snapshot
/// is dropped once the last clone goes away.
#[derive(Debug, Clone)]
pub struct SnapshotHolder {
    tx: Arc<watch::Sender<Arc<CorpusSnapshot>>>,
}

impl SnapshotHolder {
    /// A holder serving the empty version-0 snapshot
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(Arc::new(CorpusSnapshot::empty()));
        Self { tx: Arc::new(tx) }
    }

    /// The snapshot to use for one whole computation
    pub fn current(&self) -> Arc<CorpusSnapshot> {
        self.tx.borrow().clone()
    }

    /// Replace the served snapshot
    pub fn publish(&self, snapshot: CorpusSnapshot) {
        self.tx.send_replace(Arc::new(snapshot));
    }

    /// Receiver that is notified on every publication
    pub fn subscribe(&self) -> watch::Receiver<Arc<CorpusSnapshot>> {
        self.tx.subscribe()
    }
}

impl Default for SnapshotHolder {
    fn default() -> Self {
        Self::new()
    }
}
