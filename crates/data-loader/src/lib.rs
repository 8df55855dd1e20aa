//! # Data Loader Crate
//!
//! This crate holds the catalog and interaction records the recommendation
//! engine reads, and the `CatalogStore` trait through which it reads them.
//!
//! ## Main Components
//!
//! - **types**: Core domain types (Movie, MovieLink, InteractionRecord, DataIndex)
//! - **store**: The read-only `CatalogStore` trait, implemented by DataIndex
//! - **parser**: Parse `::`-separated .dat files into Rust structs
//! - **index**: Load a data directory and validate it
//! - **error**: Error types for data loading
//!
//! ## Example Usage
//!
//! ```ignore
//! use data_loader::{CatalogStore, DataIndex};
//! use std::path::Path;
//!
//! // Load the entire catalog
//! let index = DataIndex::load_from_files(Path::new("data/reel"))?;
//!
//! // Query data through the store trait
//! let watched = index.watched_movies(7)?;
//! let movie = index.get_movie(1).unwrap();
//!
//! println!("User 7 watched {} movies, e.g. {}", watched.len(), movie.title);
//! ```
//!
//! ## Learning Goals
//!
//! 1. **Ownership and Borrowing**: DataIndex owns the data, getters return references
//! 2. **Error Handling**: Using Result<T> and custom error types
//! 3. **Type Safety**: Type aliases (UserId, MovieId) prevent mixing up IDs
//! 4. **Traits**: `CatalogStore` decouples the engine from storage
//! 5. **Parallel Processing**: Using Rayon for parsing and validation

// Public modules
pub mod error;
pub mod types;
pub mod parser;
pub mod index;
pub mod store;

// Re-export commonly used types for convenience
pub use error::{DataLoadError, Result};
pub use store::CatalogStore;
pub use types::{
    // Type aliases
    UserId,
    MovieId,
    WatchlistId,
    // Core types
    Movie,
    MovieLink,
    InteractionRecord,
    WatchlistMembership,
    DataIndex,
};
