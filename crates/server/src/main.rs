//! Simple test harness for the recommendation gateway.
//!
//! Loads the catalog from `REEL_DATA_DIR`, starts the corpus refresher and
//! requests recommendations in every mode for a sample seed.

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::info;
use tracing_subscriber::EnvFilter;

use corpus::{CorpusRefresher, SnapshotHolder};
use data_loader::{CatalogStore, DataIndex};
use server::{RecommendMode, RecommendationGateway, RecommenderConfig};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    info!("Starting ReelRecs server test harness");

    let config = RecommenderConfig::from_env().context("Failed to load configuration")?;
    info!("Loading catalog from {:?}", config.data_dir);
    let store: Arc<dyn CatalogStore> = Arc::new(
        DataIndex::load_from_files(&config.data_dir).context("Failed to load catalog")?,
    );

    let holder = SnapshotHolder::new();
    let mut published = holder.subscribe();
    let refresher = Arc::new(CorpusRefresher::new(
        Arc::clone(&store),
        holder.clone(),
        config.stop_words(),
    ));
    let refresh_task = refresher.spawn(config.refresh_interval());

    // The first refresh runs immediately; wait for it before serving
    published.changed().await.context("Refresher stopped before publishing")?;
    info!("Corpus snapshot {} ready", holder.current().version());

    let gateway = RecommendationGateway::from_config(store, holder, &config);

    let seed_id = 1;
    let limit = 10;
    for mode in RecommendMode::ALL {
        let recommendations = gateway.recommend(seed_id, mode, limit).await;
        info!("{} seed {}: {} recommendations", mode, seed_id, recommendations.len());
        for (i, rec) in recommendations.iter().enumerate() {
            info!(
                "{}. {} [{}]{}",
                i + 1,
                rec.title,
                rec.movie_id,
                rec.image_url.as_deref().map(|url| format!(" {}", url)).unwrap_or_default()
            );
        }
    }

    refresh_task.abort();
    Ok(())
}
