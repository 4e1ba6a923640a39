use clap::Parser;
use dotenvy::dotenv;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;
use zarzify::{cli::Cli, config, errors::Result};

/// `RUST_LOG` if set, otherwise `default`.
fn env_filter(default: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default))
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // 1. Load .env before reading any settings
    dotenv().ok();

    // 2. Load the application configuration under a bootstrap subscriber,
    //    since the configured level is not known yet
    let bootstrap = tracing_subscriber::fmt()
        .with_env_filter(env_filter("info"))
        .finish();
    let app_config = tracing::subscriber::with_default(bootstrap, || {
        config::load_app_configuration(cli.config.clone())
    })?;

    // 3. Initialize tracing, RUST_LOG wins over the configured level
    tracing_subscriber::fmt()
        .with_env_filter(env_filter(&app_config.logging.level))
        .init();
    info!("Configuration loaded.");

    // 4. Run the requested command
    zarzify::cli::run(cli.command, &app_config)
        .await
        .inspect_err(|e| error!("Command failed: {}", e))
}
