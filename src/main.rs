//! pesas - a Slack slash-command bot that logs meals and nutrition
//! categories into an Airtable base and answers through delayed replies.

mod command;
mod config;
mod dispatch;
mod errors;
mod ledger;
mod report;
mod server;
mod slack;
mod store;

use clap::{Parser, Subcommand};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

pub(crate) const VERSION: &str = "0.1.0";

#[derive(Parser)]
#[command(name = "pesas", about = "pesas - Slack meal-logging bot", version = VERSION)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a default configuration file to ~/.pesas/config.json.
    Init,
    /// Start the Slack webhook server.
    Serve {
        /// Listen port (overrides the configured one).
        #[arg(short, long)]
        port: Option<u16>,
        /// Verbose logging.
        #[arg(short, long)]
        verbose: bool,
    },
}

fn init_tracing(verbose: bool) {
    // Always clamp noisy HTTP crates regardless of RUST_LOG.
    let noisy_crate_filters = ",hyper=warn,reqwest=warn";
    let env_filter = match tracing_subscriber::EnvFilter::try_from_default_env() {
        Ok(_) => {
            let combined = format!(
                "{}{}",
                std::env::var("RUST_LOG").unwrap_or_default(),
                noisy_crate_filters
            );
            tracing_subscriber::EnvFilter::new(combined)
        }
        Err(_) => {
            let level = if verbose { "debug" } else { "info" };
            tracing_subscriber::EnvFilter::new(format!("{level}{noisy_crate_filters}"))
        }
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .try_init()
        .ok();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Init => {
            let path = config::get_config_path();
            if path.exists() {
                println!("Config already exists at {}", path.display());
            } else {
                config::save_config(&config::Config::default(), None);
                println!("Wrote default config to {}", path.display());
            }
            Ok(())
        }
        Commands::Serve { port, verbose } => {
            init_tracing(verbose);
            let config = config::load_config(None);
            let port = port.unwrap_or(config.server.port);
            server::serve(config, port).await
        }
    }
}
