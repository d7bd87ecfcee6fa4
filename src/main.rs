//! # tilebase CLI
//!
//! The `tilebase` binary is the operational surface for the categorization
//! and retrieval engine. It provides commands for database initialization,
//! feed ingestion, batch categorization, search, cross-sell lookup, and
//! catalog statistics.
//!
//! ## Usage
//!
//! ```bash
//! tilebase --config ./config/tilebase.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `tilebase init` | Create the SQLite database and run schema migrations |
//! | `tilebase ingest` | Scan the product feed directory and upsert products |
//! | `tilebase categorize` | Classify products against the keyword taxonomy |
//! | `tilebase search "<query>"` | Ranked retrieval over the categorized catalog |
//! | `tilebase related <sku>` | Cross-sell suggestions for one product |
//! | `tilebase get <sku>` | Full product row and assignment |
//! | `tilebase stats` | Catalog totals and per-category breakdown |

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use tilebase::{categorize, config, feed, get, migrate, query, related, stats};

/// tilebase — product categorization and retrieval engine for tile retail
/// catalogs.
///
/// All commands accept a `--config` flag pointing to a TOML configuration
/// file. See `config/tilebase.example.toml` for a full example.
#[derive(Parser)]
#[command(
    name = "tilebase",
    about = "tilebase — product categorization and retrieval for tile retail catalogs",
    version,
    long_about = "tilebase classifies product records against a weighted keyword taxonomy \
    (category, subcategory, installation complexity, RAG keywords) and serves ranked, \
    filterable retrieval queries plus cross-sell suggestions over the categorized catalog."
)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true, default_value = "./config/tilebase.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

/// Top-level CLI commands.
#[derive(Subcommand)]
enum Commands {
    /// Initialize the database schema.
    ///
    /// Creates the SQLite database file, the products table, and the FTS5
    /// index. Idempotent — running it multiple times is safe.
    Init,

    /// Ingest product records from the feed directory.
    ///
    /// Scans `[feed].root` for JSON files, upserts products by SKU, and
    /// flags changed products for recategorization.
    Ingest {
        /// Show record counts without writing to the database.
        #[arg(long)]
        dry_run: bool,

        /// Maximum number of records to process.
        #[arg(long)]
        limit: Option<usize>,
    },

    /// Categorize products against the keyword taxonomy.
    ///
    /// Scores each pending product's text fields against every taxonomy
    /// entry and stores the winning assignment. Products that match nothing
    /// are assigned `unknown` and listed for taxonomy review. Writes are
    /// batched — one transaction per `categorize.batch_size` products.
    Categorize {
        /// Recategorize every product, not just pending ones.
        #[arg(long)]
        full: bool,

        /// Show pending counts without writing to the database.
        #[arg(long)]
        dry_run: bool,

        /// Maximum number of products to categorize.
        #[arg(long)]
        limit: Option<usize>,
    },

    /// Search the categorized catalog.
    ///
    /// Tokenizes the query, matches tokens against curated RAG keywords and
    /// raw product text, and prints results ranked by weighted score. An
    /// empty query lists everything in filter scope by recency.
    Search {
        /// The search query string.
        query: String,

        /// Restrict to one category (e.g. `tiles`, `installation_materials`).
        #[arg(long)]
        category: Option<String>,

        /// Restrict to one subcategory (e.g. `porcelain_tiles`).
        #[arg(long)]
        subcategory: Option<String>,

        /// Restrict to one installation complexity: `basic`, `intermediate`,
        /// or `advanced`.
        #[arg(long)]
        complexity: Option<String>,
    },

    /// Print cross-sell suggestions for a product.
    ///
    /// Looks up the product's subcategory in the compatibility table and
    /// prints the complementary subcategories in order.
    Related {
        /// Product SKU.
        sku: String,
    },

    /// Retrieve a product by SKU.
    ///
    /// Prints the product's raw fields and its category assignment.
    Get {
        /// Product SKU.
        sku: String,
    },

    /// Show catalog statistics.
    ///
    /// Totals, categorization coverage, and a per-category breakdown.
    Stats,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let cfg = config::load_config(&cli.config)?;

    match cli.command {
        Commands::Init => {
            migrate::run_migrations(&cfg).await?;
            println!("Database initialized successfully.");
        }
        Commands::Ingest { dry_run, limit } => {
            feed::run_ingest(&cfg, dry_run, limit).await?;
        }
        Commands::Categorize {
            full,
            dry_run,
            limit,
        } => {
            categorize::run_categorize(&cfg, limit, full, dry_run).await?;
        }
        Commands::Search {
            query,
            category,
            subcategory,
            complexity,
        } => {
            let filters = query::Filters {
                category,
                subcategory,
                complexity,
            };
            query::run_search(&cfg, &query, &filters).await?;
        }
        Commands::Related { sku } => {
            related::run_related(&cfg, &sku).await?;
        }
        Commands::Get { sku } => {
            get::run_get(&cfg, &sku).await?;
        }
        Commands::Stats => {
            stats::run_stats(&cfg).await?;
        }
    }

    Ok(())
}
