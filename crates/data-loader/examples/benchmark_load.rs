use data_loader::{CatalogStore, DataIndex};
use std::path::PathBuf;
use std::time::Instant;

fn main() -> anyhow::Result<()> {
    let data_dir = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("data/reel"));

    println!("Loading catalog from {:?}...\n", data_dir);

    let start = Instant::now();
    let index = DataIndex::load_from_files(&data_dir)?;
    let elapsed = start.elapsed();

    let (movies, interactions, watchlist_entries) = index.counts();
    let watched = index
        .interactions()?
        .iter()
        .filter(|record| record.has_watched)
        .count();

    println!("\n=== Load Complete ===");
    println!("Time taken: {:?}", elapsed);
    println!("Movies: {}", movies);
    println!("Interactions: {} ({} watched)", interactions, watched);
    println!("Watchlist entries: {}", watchlist_entries);
    println!("\nPerformance: {:.0} rows/second",
             (movies + interactions + watchlist_entries) as f64 / elapsed.as_secs_f64());
    Ok(())
}
