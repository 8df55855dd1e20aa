//! Example: Recommendations for one user
//!
//! Run with: cargo run --package sources --example recommend_for_user -- data/reel 1
//!
//! This example shows how to:
//! 1. Load a catalog directory
//! 2. Build a corpus snapshot
//! 3. Rank movies similar to the user's watch history
//! 4. Train the collaborative model and rank unwatched movies

use corpus::{CorpusSnapshot, StopWords};
use data_loader::{CatalogStore, DataIndex};
use sources::{AlsParams, CollaborativeRecommender, ContentSimilarity, SimilarityQuery};
use std::path::PathBuf;
use std::time::Instant;

fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter("info")
        .init();

    let mut args = std::env::args().skip(1);
    let data_dir = args.next().map(PathBuf::from).unwrap_or_else(|| PathBuf::from("data/reel"));
    let user_id: u32 = args.next().map(|s| s.parse()).transpose()?.unwrap_or(1);

    println!("=== ReelRecs Engine Example ===\n");

    let start = Instant::now();
    let index = DataIndex::load_from_files(&data_dir)?;
    let snapshot = CorpusSnapshot::from_store(1, &index, StopWords::English)?;
    println!(
        "Loaded {} movies ({} terms) in {:?}\n",
        snapshot.len(),
        snapshot.matrix().vocabulary_size(),
        start.elapsed()
    );

    let watched = index.watched_movies(user_id)?;
    println!("User {} watched {} movies\n", user_id, watched.len());

    let start = Instant::now();
    let query = SimilarityQuery::new(watched.iter().copied().filter(|&id| snapshot.contains(id)), 10);
    let similar = ContentSimilarity::new().similar(&query, &snapshot)?;
    println!("Because you watched ({:?}):", start.elapsed());
    for (rank, scored) in similar.iter().enumerate() {
        let title = snapshot.document(scored.movie_id).map(|d| d.title.as_str()).unwrap_or("?");
        println!("  {:2}. {} (score: {:.3})", rank + 1, title, scored.score);
    }

    let start = Instant::now();
    let collaborative = CollaborativeRecommender::new(AlsParams::default());
    match collaborative.recommend(user_id, 10, &index.interactions()?) {
        Ok(picks) => {
            println!("\nViewers like you also watched ({:?}):", start.elapsed());
            for (rank, scored) in picks.iter().enumerate() {
                let title = snapshot.document(scored.movie_id).map(|d| d.title.as_str()).unwrap_or("?");
                println!("  {:2}. {} (score: {:.3})", rank + 1, title, scored.score);
            }
        }
        Err(e) => println!("\nNo collaborative picks: {}", e),
    }

    Ok(())
}
