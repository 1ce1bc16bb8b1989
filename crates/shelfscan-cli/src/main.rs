mod discover;
mod extract;
mod harvest;
mod output;

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "shelfscan")]
#[command(about = "Harvest product listings from incrementally loaded category pages")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Harvest this run's shard of stores and write a shard summary
    Harvest(HarvestArgs),
    /// Scrape a store-locator page into a locations file
    Discover {
        /// Store-locator page to read
        #[arg(long)]
        url: String,
        /// Where to write the locations JSON (defaults to the configured locations path)
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Re-run extraction on a saved HTML snapshot, without a browser
    Extract {
        /// Saved page, e.g. a `debug-*.html` capture
        #[arg(long)]
        html: PathBuf,
        /// Store name stamped on every record
        #[arg(long, default_value = "offline")]
        store: String,
        /// Write data files under this directory instead of printing JSON
        #[arg(long)]
        output: Option<PathBuf>,
    },
}

/// Shard parameters and path overrides. Anything left unset falls back to
/// the environment.
#[derive(Debug, Args)]
struct HarvestArgs {
    /// 1-based shard index
    #[arg(long)]
    shard_index: Option<usize>,
    #[arg(long)]
    total_shards: Option<usize>,
    /// Stores per shard; 0 splits evenly
    #[arg(long)]
    shard_size: Option<usize>,
    /// Maximum stores harvested at once
    #[arg(long)]
    concurrency: Option<usize>,
    /// Save a screenshot and DOM snapshot for failed stores
    #[arg(long)]
    debug: bool,
    #[arg(long)]
    locations: Option<PathBuf>,
    #[arg(long)]
    target: Option<PathBuf>,
    #[arg(long)]
    output_root: Option<PathBuf>,
    /// Harvest this listing instead of the target file's `category_url`
    #[arg(long)]
    category_url: Option<String>,
}

impl HarvestArgs {
    fn apply(self, config: &mut shelfscan_core::AppConfig) {
        if let Some(index) = self.shard_index {
            config.shard_index = index;
        }
        if let Some(total) = self.total_shards {
            config.total_shards = total;
        }
        if let Some(size) = self.shard_size {
            config.shard_size = size;
        }
        if let Some(concurrency) = self.concurrency {
            config.concurrency = concurrency;
        }
        if self.debug {
            config.debug_capture = true;
        }
        if let Some(path) = self.locations {
            config.locations_path = path;
        }
        if let Some(path) = self.target {
            config.target_path = path;
        }
        if let Some(path) = self.output_root {
            config.output_root = path;
        }
        if let Some(url) = self.category_url {
            config.category_url = Some(url);
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let mut config = shelfscan_core::load_app_config()?;

    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    match cli.command {
        Commands::Harvest(args) => {
            args.apply(&mut config);
            harvest::run_harvest(&config).await
        }
        Commands::Discover { url, output } => {
            let output = output.unwrap_or_else(|| config.locations_path.clone());
            discover::run_discover(&config, &url, &output).await
        }
        Commands::Extract {
            html,
            store,
            output,
        } => extract::run_extract(&config, &html, &store, output.as_deref()).await,
    }
}
