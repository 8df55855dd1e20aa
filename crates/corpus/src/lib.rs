//! # Corpus Crate
//!
//! Builds the text corpus behind content similarity and keeps it fresh.
//!
//! ## Main Components
//!
//! - **document**: One `MovieDocument` per catalog movie
//! - **tfidf**: Tokenizer, stop words and the TF-IDF vectorizer
//! - **snapshot**: Immutable `CorpusSnapshot` and the `SnapshotHolder` that swaps it
//! - **refresh**: `CorpusRefresher`, the non-reentrant background rebuild
//!
//! ## Example Usage
//!
//! ```ignore
//! let holder = SnapshotHolder::new();
//! let refresher = Arc::new(CorpusRefresher::new(store, holder.clone(), StopWords::English));
//! let _task = refresher.spawn(Duration::from_secs(600));
//!
//! let snapshot = holder.current(); // hold this for the whole request
//! ```

pub mod document;
pub mod error;
pub mod refresh;
pub mod snapshot;
pub mod stopwords;
pub mod tfidf;

pub use document::{MovieDocument, build_documents};
pub use error::CorpusError;
pub use refresh::{CorpusRefresher, RefreshOutcome};
pub use snapshot::{CorpusSnapshot, SnapshotHolder};
pub use tfidf::{SparseRow, StopWords, TfidfMatrix, TfidfVectorizer};
