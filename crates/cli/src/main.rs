use anyhow::{Context, Result, anyhow};
use clap::{Parser, Subcommand};
use colored::Colorize;
use corpus::{CorpusRefresher, SnapshotHolder};
use data_loader::{CatalogStore, DataIndex};
use server::{RecommendMode, RecommendationGateway, RecommendedMovie, RecommenderConfig};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Semaphore;

/// ReelRecs - Movie Recommendation Engine
#[derive(Parser)]
#[command(name = "reel-recs")]
#[command(about = "Content-based and collaborative movie recommendations", long_about = None)]
struct Cli {
    /// Catalog directory (overrides REEL_DATA_DIR)
    #[arg(short, long)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Get movie recommendations for a seed
    Recommend {
        /// Movie, user or watchlist id, depending on the mode
        #[arg(long, allow_negative_numbers = true)]
        seed_id: i64,

        /// movie, history, watchlist or collaborative
        #[arg(long, default_value = "movie")]
        mode: RecommendMode,

        /// Number of recommendations to return
        #[arg(long, default_value = "20", allow_negative_numbers = true)]
        top_n: i64,

        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },

    /// Search for movies by title
    Search {
        /// Movie title to search for (case-insensitive substring match)
        #[arg(long)]
        title: String,
    },

    /// Build one corpus snapshot and describe it
    Corpus,

    /// Run benchmark to test performance
    Benchmark {
        /// Number of requests to make
        #[arg(long, default_value = "100")]
        requests: usize,

        /// Number of concurrent requests
        #[arg(long, default_value = "10")]
        concurrent: usize,

        /// Mode to benchmark
        #[arg(long, default_value = "movie")]
        mode: RecommendMode,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    let mut config = RecommenderConfig::from_env().context("Failed to load configuration")?;
    if let Some(data_dir) = cli.data_dir {
        config.data_dir = data_dir;
    }

    // Load the catalog (this may take a moment)
    println!("Loading catalog from {}...", config.data_dir.display());
    let start = Instant::now();
    let index = Arc::new(
        DataIndex::load_from_files(&config.data_dir).context("Failed to load catalog")?,
    );
    println!("{} Loaded catalog in {:?}", "✓".green(), start.elapsed());

    // Dispatch to appropriate command handler
    match cli.command {
        Commands::Recommend {
            seed_id,
            mode,
            top_n,
            json,
        } => handle_recommend(index, &config, seed_id, mode, top_n, json).await?,
        Commands::Search { title } => handle_search(&index, &title)?,
        Commands::Corpus => handle_corpus(index, &config).await?,
        Commands::Benchmark {
            requests,
            concurrent,
            mode,
        } => handle_benchmark(index, &config, requests, concurrent, mode).await?,
    }

    Ok(())
}

/// Build the first snapshot and a gateway over it
async fn build_gateway(index: Arc<DataIndex>, config: &RecommenderConfig) -> Result<RecommendationGateway> {
    let store: Arc<dyn CatalogStore> = index;
    let holder = SnapshotHolder::new();
    let refresher = CorpusRefresher::new(Arc::clone(&store), holder.clone(), config.stop_words());
    refresher.refresh().await.context("Failed to build corpus snapshot")?;
    Ok(RecommendationGateway::from_config(store, holder, config))
}

/// Handle the 'recommend' command
async fn handle_recommend(
    index: Arc<DataIndex>,
    config: &RecommenderConfig,
    seed_id: i64,
    mode: RecommendMode,
    top_n: i64,
    json: bool,
) -> Result<()> {
    let gateway = build_gateway(index, config).await?;

    let start = Instant::now();
    let recommendations = gateway.recommend(seed_id, mode, top_n).await;
    let elapsed = start.elapsed();

    if json {
        println!("{}", serde_json::to_string_pretty(&recommendations)?);
    } else {
        print_recommendations(&recommendations, mode, seed_id);
        println!("{}", format!("({:?})", elapsed).dimmed());
    }
    Ok(())
}

/// Handle the 'search' command
fn handle_search(index: &DataIndex, title: &str) -> Result<()> {
    let title_lower = title.to_lowercase();

    // (rank, movie): exact matches first, then substring matches
    let mut matches: Vec<(u8, &data_loader::Movie)> = index
        .iter_movies()
        .filter_map(|movie| {
            let movie_title_lower = movie.title.to_lowercase();
            if movie_title_lower == title_lower {
                Some((0, movie))
            } else if movie_title_lower.contains(&title_lower) {
                Some((1, movie))
            } else {
                None
            }
        })
        .collect();

    // Sort by relevance, then catalog rating
    matches.sort_by(|a, b| {
        a.0.cmp(&b.0)
            .then_with(|| b.1.rating.total_cmp(&a.1.rating))
            .then_with(|| a.1.id.cmp(&b.1.id))
    });

    if matches.is_empty() {
        return Err(anyhow!("No movie title contains '{}'", title));
    }

    println!("{}", format!("Search results for '{}':", title).bold().blue());
    for (_, movie) in matches.iter().take(20) {
        println!("{}: {} (rating {:.1})", movie.id, movie.title, movie.rating);
    }
    Ok(())
}

/// Handle the 'corpus' command
async fn handle_corpus(index: Arc<DataIndex>, config: &RecommenderConfig) -> Result<()> {
    let holder = SnapshotHolder::new();
    let refresher = CorpusRefresher::new(index, holder.clone(), config.stop_words());

    let start = Instant::now();
    refresher.refresh().await.context("Failed to build corpus snapshot")?;
    let snapshot = holder.current();

    println!("{}", "Corpus snapshot:".bold().blue());
    println!("{}Version: {}", "• ".green(), snapshot.version());
    println!("{}Documents: {}", "• ".green(), snapshot.len());
    println!("{}Vocabulary: {} terms", "• ".green(), snapshot.matrix().vocabulary_size());
    println!("{}Stop words: {}", "• ".green(), config.stop_words());
    println!("{}Built in: {:?}", "• ".cyan(), start.elapsed());
    Ok(())
}

/// Handle the 'benchmark' command
async fn handle_benchmark(
    index: Arc<DataIndex>,
    config: &RecommenderConfig,
    requests: usize,
    concurrent: usize,
    mode: RecommendMode,
) -> Result<()> {
    if requests == 0 {
        return Err(anyhow!("--requests must be at least 1"));
    }

    // Seeds come from the ids the mode actually uses
    let seed_pool: Vec<i64> = match mode {
        RecommendMode::MovieSimilar => index.get_all_movie_ids().into_iter().map(i64::from).collect(),
        RecommendMode::UserHistory | RecommendMode::UserCollaborative => {
            let mut users: Vec<i64> = index
                .interactions()?
                .iter()
                .map(|r| i64::from(r.user_id))
                .collect();
            users.sort_unstable();
            users.dedup();
            users
        }
        RecommendMode::WatchlistSimilar => index
            .get_all_watchlist_ids()
            .into_iter()
            .map(i64::from)
            .collect(),
    };
    if seed_pool.is_empty() {
        return Err(anyhow!("No seeds available for mode {}", mode));
    }

    let gateway = build_gateway(index, config).await?;
    let limiter = Arc::new(Semaphore::new(concurrent.max(1)));

    // Use tokio::spawn to make concurrent requests
    let wall_clock = Instant::now();
    let mut handles = Vec::with_capacity(requests);
    for _ in 0..requests {
        let seed = seed_pool[rand::random_range(0..seed_pool.len())];
        let gateway = gateway.clone();
        let limiter = Arc::clone(&limiter);
        handles.push(tokio::spawn(async move {
            let _permit = limiter.acquire_owned().await?;
            let start = Instant::now();
            let result = gateway.recommend(seed, mode, 20).await;
            Ok::<_, anyhow::Error>((start.elapsed(), result.is_empty()))
        }));
    }

    // Wait for all tasks to complete and collect timings
    let mut timings: Vec<Duration> = Vec::with_capacity(requests);
    let mut empty = 0;
    for handle in handles {
        let (elapsed, was_empty) = handle.await??;
        timings.push(elapsed);
        empty += usize::from(was_empty);
    }
    let total_time = wall_clock.elapsed();

    let latency_sum: Duration = timings.iter().sum();
    let avg_latency = latency_sum / timings.len() as u32;
    timings.sort();
    let percentile = |p: f64| timings[((timings.len() as f64 * p) as usize).min(timings.len() - 1)];
    let throughput = requests as f64 / total_time.as_secs_f64();

    println!("{}", format!("Benchmark results ({} mode):", mode).bold().blue());
    println!("Total time: {:?}", total_time);
    println!("Average latency: {:?}", avg_latency);
    println!("P50 latency: {:?}", percentile(0.50));
    println!("P95 latency: {:?}", percentile(0.95));
    println!("P99 latency: {:?}", percentile(0.99));
    println!("Throughput: {:.2} requests/second", throughput);
    println!("Empty results: {}/{}", empty, requests);

    Ok(())
}

/// Helper function to format and print recommendations
fn print_recommendations(recommendations: &[RecommendedMovie], mode: RecommendMode, seed_id: i64) {
    println!(
        "{}",
        format!("Recommendations ({} seed {}):", mode, seed_id).bold().blue()
    );
    if recommendations.is_empty() {
        println!("{}", "No recommendations available right now".yellow());
        return;
    }
    for (i, movie) in recommendations.iter().enumerate() {
        println!(
            "{}. {} [{}]",
            (i + 1).to_string().green(),
            movie.title,
            movie.movie_id
        );
        if let Some(url) = &movie.image_url {
            println!("   {}", url.dimmed());
        }
    }
}
