//! Engine configuration loaded from the environment.
//!
//! Every option can be set with a `REEL_`-prefixed variable (for example
//! `REEL_ALS_FACTORS=32`), optionally through a `.env` file.

use corpus::StopWords;
use serde::Deserialize;
use sources::AlsParams;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

const ENV_PREFIX: &str = "REEL_";

#[derive(Error, Debug)]
pub enum ConfigError {
    /// A variable could not be parsed into its field type
    #[error("Failed to load config: {0}")]
    Env(#[from] envy::Error),

    /// A value parsed but is out of range
    #[error("Invalid value for {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// Recommender settings
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct RecommenderConfig {
    /// Seconds between corpus refreshes
    #[serde(default = "default_refresh_interval_seconds")]
    pub refresh_interval_seconds: u64,

    /// `english` or `none`
    #[serde(default = "default_tfidf_stop_words")]
    pub tfidf_stop_words: String,

    #[serde(default = "default_als_factors")]
    pub als_factors: usize,

    #[serde(default = "default_als_regularization")]
    pub als_regularization: f64,

    #[serde(default = "default_als_iterations")]
    pub als_iterations: usize,

    /// Confidence given to a watched cell
    #[serde(default = "default_als_alpha")]
    pub als_alpha: f64,

    /// Reuse the trained model until the watch data changes
    #[serde(default)]
    pub als_cache_models: bool,

    #[serde(default = "default_als_seed")]
    pub als_seed: u64,

    /// Directory with the `.dat` catalog files
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
}

fn default_refresh_interval_seconds() -> u64 {
    600
}

fn default_tfidf_stop_words() -> String {
    "english".to_string()
}

fn default_als_factors() -> usize {
    64
}

fn default_als_regularization() -> f64 {
    0.1
}

fn default_als_iterations() -> usize {
    15
}

fn default_als_alpha() -> f64 {
    80.0
}

fn default_als_seed() -> u64 {
    42
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("data/reel")
}

impl Default for RecommenderConfig {
    fn default() -> Self {
        Self {
            refresh_interval_seconds: default_refresh_interval_seconds(),
            tfidf_stop_words: default_tfidf_stop_words(),
            als_factors: default_als_factors(),
            als_regularization: default_als_regularization(),
            als_iterations: default_als_iterations(),
            als_alpha: default_als_alpha(),
            als_cache_models: false,
            als_seed: default_als_seed(),
            data_dir: default_data_dir(),
        }
    }
}

impl RecommenderConfig {
    /// Load configuration from `.env` and the process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_vars(std::env::vars())
    }

    /// Load configuration from explicit `(name, value)` pairs
    pub fn from_vars<I>(vars: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let config: Self = envy::prefixed(ENV_PREFIX).from_iter(vars)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.refresh_interval_seconds == 0 {
            return Err(invalid("refresh_interval_seconds", "must be at least 1"));
        }
        if self.als_factors == 0 {
            return Err(invalid("als_factors", "must be at least 1"));
        }
        if self.als_iterations == 0 {
            return Err(invalid("als_iterations", "must be at least 1"));
        }
        if !(self.als_regularization >= 0.0) {
            return Err(invalid("als_regularization", "must be zero or positive"));
        }
        if !(self.als_alpha > 0.0) {
            return Err(invalid("als_alpha", "must be positive"));
        }
        self.tfidf_stop_words
            .parse::<StopWords>()
            .map_err(|reason| ConfigError::Invalid {
                field: "tfidf_stop_words",
                reason,
            })?;
        Ok(())
    }

    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh_interval_seconds)
    }

    /// Stop-word setting; falls back to English if the value does not parse
    pub fn stop_words(&self) -> StopWords {
        self.tfidf_stop_words.parse().unwrap_or_default()
    }

    pub fn als_params(&self) -> AlsParams {
        AlsParams {
            factors: self.als_factors,
            regularization: self.als_regularization,
            iterations: self.als_iterations,
            alpha: self.als_alpha,
            seed: self.als_seed,
        }
    }
}

fn invalid(field: &'static str, reason: &str) -> ConfigError {
    ConfigError::Invalid {
        field,
        reason: reason.to_string(),
    }
}
