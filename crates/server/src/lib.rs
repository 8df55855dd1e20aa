//! Server crate for the ReelRecs recommendation engine.
//!
//! This crate wires the engine together: configuration, the corpus
//! refresher and the gateway that serves requests.

pub mod config;
pub mod gateway;

pub use config::{ConfigError, RecommenderConfig};
pub use gateway::{RecommendMode, RecommendationGateway, RecommendationResult, RecommendedMovie};
