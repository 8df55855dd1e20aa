//! # Sources Crate
//!
//! The two recommendation engines.
//!
//! ## Components
//!
//! ### Content Similarity
//! TF-IDF cosine similarity over a corpus snapshot:
//! - "More like this" for a single movie
//! - "Because you watched..." with a user's history as seeds
//! - "Fits this list" with a watchlist as seeds
//!
//! ### Collaborative Recommender
//! Implicit-feedback ALS over the watch matrix:
//! - "Viewers like you also watched..."
//!
//! ## Example Usage
//!
//! ```ignore
//! use sources::{AlsParams, CollaborativeRecommender, ContentSimilarity, SimilarityQuery};
//!
//! let snapshot = holder.current();
//! let similar = ContentSimilarity::new().similar(&SimilarityQuery::new([1193], 10), &snapshot)?;
//!
//! let collaborative = CollaborativeRecommender::new(AlsParams::default());
//! let picks = collaborative.recommend(42, 10, &store.interactions()?)?;
//! ```
//!
//! ## Learning Goals
//!
//! 1. **Algorithm Implementation**: TF-IDF ranking and ALS in plain Rust
//! 2. **Numerics without panics**: degenerate systems become errors
//! 3. **Rayon**: row-parallel scoring and solving
//! 4. **Instrumentation**: Using tracing for observability

// Public modules
pub mod als;
pub mod collaborative;
pub mod content;
pub mod error;
pub mod interactions;
pub mod ranking;

// Re-export commonly used types
pub use als::{AlsParams, FactorModel};
pub use collaborative::CollaborativeRecommender;
pub use content::{ContentSimilarity, SimilarityQuery};
pub use error::RecommendError;
pub use interactions::InteractionMatrix;
pub use ranking::{EXCLUDED_SCORE, ScoredMovie};
