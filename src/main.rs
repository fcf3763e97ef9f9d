//! Command-line entry point.
//!
//! Main components: Cli parser, Commands enum, and the async runtime
//! wiring that builds a [`SearchEngine`] and hands it to a serving
//! transport or a one-shot command.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use mieszko::config::Settings;
use mieszko::mcp::ListingSearchServer;
use mieszko::search::{SearchEngine, SearchStatus};
use mieszko::store::{ListingStore, MemoryListingStore};
use mieszko::types::{Listing, ListingId};
use mieszko::vector::{EmbeddingGenerator, FastEmbedGenerator, VectorDimension, VectorIndex};

#[derive(Parser)]
#[command(
    name = "mieszko",
    version,
    about = "Hybrid structured + semantic search for Polish real-estate listings",
    after_help = "Examples:\n  \
        mieszko serve --data listings.json\n  \
        mieszko serve --data listings.json --http --bind 0.0.0.0:8080\n  \
        mieszko search --data listings.json \"2-pokojowe w Warszawie do 800 tys\"\n  \
        mieszko stats --data listings.json"
)]
struct Cli {
    /// Path to a config file (defaults to ./mieszko.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the MCP server (stdio by default)
    #[command(
        after_help = "Modes:\n  Default: stdio transport\n  --http: HTTP REST + MCP over SSE (requires the http-server build)"
    )]
    Serve {
        /// JSON file with listings to load at startup
        #[arg(long)]
        data: Option<PathBuf>,

        /// Run as HTTP server instead of stdio transport
        #[arg(long)]
        http: bool,

        /// Bind address for the HTTP server
        #[arg(long)]
        bind: Option<String>,
    },

    /// Run one search from the command line
    Search {
        /// Natural-language query, Polish or English
        query: String,

        /// JSON file with listings to load first
        #[arg(long)]
        data: Option<PathBuf>,

        /// Maximum number of results
        #[arg(long)]
        limit: Option<usize>,
    },

    /// Show listing counts
    Stats {
        /// JSON file with listings to load first
        #[arg(long)]
        data: Option<PathBuf>,
    },

    /// Print the effective configuration
    Config,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let settings = match &cli.config {
        Some(path) => Settings::load_from(path),
        None => Settings::load(),
    }
    .context("failed to load configuration")?;
    let settings = Arc::new(settings);

    init_tracing(&settings);

    match cli.command {
        Commands::Serve { data, http, bind } => {
            let engine = build_engine(Arc::clone(&settings))?;
            load_data(&engine, data.as_deref())?;

            if http {
                let bind = bind.unwrap_or_else(|| settings.server.bind.clone());
                mieszko::mcp::http_server::serve_http(engine, bind).await?;
            } else {
                serve_stdio(engine).await?;
            }
        }
        Commands::Search { query, data, limit } => {
            let engine = build_engine(Arc::clone(&settings))?;
            load_data(&engine, data.as_deref())?;
            run_search(&engine, &query, limit).await?;
        }
        Commands::Stats { data } => {
            let engine = build_engine(Arc::clone(&settings))?;
            load_data(&engine, data.as_deref())?;
            let stats = engine.stats()?;
            println!("Total listings: {}", stats.total_listings);
            println!("For rent:       {}", stats.rent_listings);
            println!("For sale:       {}", stats.sale_listings);
        }
        Commands::Config => {
            let rendered =
                toml::to_string_pretty(settings.as_ref()).context("failed to render config")?;
            print!("{rendered}");
        }
    }

    Ok(())
}

fn init_tracing(settings: &Settings) {
    // MCP stdio owns stdout; diagnostics go to stderr.
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(settings.server.log_filter.clone()));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn build_engine(settings: Arc<Settings>) -> anyhow::Result<SearchEngine> {
    let dimension = VectorDimension::new(settings.semantic_search.dimension)
        .context("invalid embedding dimension in configuration")?;
    let embedder: Arc<dyn EmbeddingGenerator> = Arc::new(
        FastEmbedGenerator::new().context("failed to initialize the embedding model")?,
    );
    let store: Arc<dyn ListingStore> = Arc::new(MemoryListingStore::new());
    let index = Arc::new(VectorIndex::new(dimension));
    Ok(SearchEngine::new(store, index, embedder, settings))
}

/// Loads a listings JSON file into the engine. Records without an `id`
/// get one derived from their link, matching the scraper's output.
fn load_data(engine: &SearchEngine, data: Option<&Path>) -> anyhow::Result<()> {
    let Some(path) = data else {
        tracing::warn!("no --data file given, starting with an empty listing store");
        return Ok(());
    };

    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let records: Vec<serde_json::Value> =
        serde_json::from_str(&raw).context("listings file must be a JSON array")?;

    let mut listings = Vec::with_capacity(records.len());
    for mut record in records {
        if record.get("id").is_none() {
            let link = record
                .get("link")
                .and_then(|l| l.as_str())
                .unwrap_or_default();
            let id = ListingId::from_link(link);
            record["id"] = serde_json::json!(id.get());
        }
        let listing: Listing =
            serde_json::from_value(record).context("malformed listing record")?;
        listings.push(listing);
    }

    let total = listings.len();
    let embedded = engine.ingest_batch(listings)?;
    tracing::info!(total, embedded, "loaded listings from {}", path.display());
    Ok(())
}

async fn serve_stdio(engine: SearchEngine) -> anyhow::Result<()> {
    use rmcp::{ServiceExt, transport::stdio};

    tracing::info!("starting MCP server on stdio transport");
    let service = ListingSearchServer::new(engine)
        .serve(stdio())
        .await
        .context("failed to start MCP server")?;
    service.waiting().await?;
    Ok(())
}

async fn run_search(
    engine: &SearchEngine,
    query: &str,
    limit: Option<usize>,
) -> anyhow::Result<()> {
    let outcome = engine.search(query, limit).await?;

    match outcome.status {
        SearchStatus::EmptyQuery => println!("Empty query, nothing to search for."),
        SearchStatus::NoResults => println!("No listings matched '{query}'."),
        SearchStatus::Ok | SearchStatus::Degraded => {
            if outcome.is_degraded() {
                println!("(semantic ranking unavailable, showing filter matches, cheapest first)");
            }
            for (i, ranked) in outcome.results.iter().enumerate() {
                let l = &ranked.listing;
                let price = l
                    .price
                    .map(|p| format!("{p:.0} PLN"))
                    .unwrap_or_else(|| "price unknown".to_string());
                println!(
                    "{:2}. [{:.3}] {} ({}, {})",
                    i + 1,
                    ranked.score,
                    l.title,
                    l.city,
                    price
                );
                if !l.link.is_empty() {
                    println!("      {}", l.link);
                }
            }
        }
    }
    Ok(())
}
