mod cart;
mod context;
mod snapshot;
mod watch;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use cart::CartCommands;
use context::AppContext;

#[derive(Debug, Parser)]
#[command(name = "cartmirror")]
#[command(about = "Floating cart mirror for storefront pages")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Extract the cart from a saved page and print the snapshot as JSON
    Snapshot {
        /// Saved storefront HTML
        #[arg(long)]
        html: PathBuf,
        /// JSON file holding the page's analytics data layer
        #[arg(long)]
        analytics: Option<PathBuf>,
    },
    /// Parse a price label in any supported digit script
    Price {
        /// Label text, e.g. "٦٣ ر.س"
        text: String,
    },
    /// Mirror a page file, printing every render as a JSON line
    Watch {
        /// Storefront HTML file to poll
        #[arg(long)]
        html: PathBuf,
        /// Poll interval in milliseconds
        #[arg(long, default_value = "500")]
        poll_ms: u64,
    },
    /// Inspect or change the cart through the mutation gateway
    Cart {
        #[command(subcommand)]
        command: CartCommands,
    },
    /// Show time left until the daily countdown reset
    Countdown,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Must precede config loading; `--help` cannot depend on the environment.
    let cli = Cli::parse();
    dotenvy::dotenv().ok();

    let config = cartmirror_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    let Some(command) = cli.command else {
        println!("cartmirror ready; run with --help for commands");
        return Ok(());
    };

    match command {
        Commands::Price { text } => snapshot::run_price(&text)?,
        Commands::Snapshot { html, analytics } => {
            let ctx = AppContext::load(config)?;
            snapshot::run_snapshot(&ctx, &html, analytics.as_deref()).await?;
        }
        Commands::Watch { html, poll_ms } => {
            let ctx = AppContext::load(config)?;
            watch::run_watch(&ctx, &html, poll_ms).await?;
        }
        Commands::Cart { command } => cart::run_cart(&AppContext::load(config)?, command).await?,
        Commands::Countdown => cart::run_countdown(&AppContext::load(config)?)?,
    }

    Ok(())
}
