use clap::{Parser, Subcommand};

use hachijo_sources::{default_refresh_keys, refresh_all, run_source, SourceContext, SourceKey};
use hachijo_store::{ReportStore, StoreConfig};

#[derive(Debug, Parser)]
#[command(name = "hachijo-cli")]
#[command(about = "Hachijojima status report tool")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Run one source adapter and print its envelope.
    Fetch {
        /// Source key (tokaikisen, umisora, ana, wave, wind, typhoon,
        /// business-hours).
        source: String,
    },
    /// Refresh the configured sources and persist the envelopes.
    Refresh,
    /// Read stored reports by key.
    Read {
        /// One or more report keys.
        #[arg(required = true)]
        keys: Vec<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = hachijo_core::load_app_config()?;
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .or_else(|_| tracing_subscriber::EnvFilter::try_new(config.log_level.clone()))?,
        )
        .init();

    let ctx = SourceContext::from_app_config(&config)?;

    let cli = Cli::parse();
    match cli.command {
        Commands::Fetch { source } => {
            let Some(key) = SourceKey::parse(&source) else {
                anyhow::bail!("unknown source: {source}");
            };
            let envelope = run_source(&ctx, key).await;
            println!("{}", serde_json::to_string_pretty(&envelope)?);
        }
        Commands::Refresh => {
            let store = ReportStore::new(StoreConfig::from_app_config(&config))?;
            let keys = default_refresh_keys(&ctx);
            tracing::info!(?keys, "refreshing sources");
            let results = refresh_all(&ctx, &store, &keys).await;
            println!("{}", serde_json::to_string_pretty(&results)?);
        }
        Commands::Read { keys } => {
            let store = ReportStore::new(StoreConfig::from_app_config(&config))?;
            let records = store.read_many(&keys).await?;
            println!("{}", serde_json::to_string_pretty(&records)?);
        }
    }

    Ok(())
}
