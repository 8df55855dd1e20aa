//! Error types for corpus refreshes.

use data_loader::DataLoadError;
use thiserror::Error;

/// Why a refresh did not publish a new snapshot.
///
/// These never reach request callers: the refresher logs them and keeps
/// serving the previous snapshot.
#[derive(Error, Debug)]
pub enum CorpusError {
    /// The catalog store could not be read
    #[error("Transient store error: {0}")]
    TransientStore(#[from] DataLoadError),

    /// Building the snapshot failed (e.g. the blocking task panicked)
    #[error("Corpus build failed: {0}")]
    Build(String),
}

pub type Result<T> = std::result::Result<T, CorpusError>;
