//! Command-line interface: argument definitions and command dispatch.

use crate::{
    api::{self, ApiState},
    config::{
        AppConfig,
        database::{connect_documents, connect_relational, create_relational_tables},
    },
    core::{
        DocumentStore,
        backfill::{BackfillOptions, format_backfill_summary, run_backfill},
        inspect::{self, DEFAULT_ROW_LIMIT},
        migrate::{format_migration_summary, migrate_documents},
    },
    errors::Result,
};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::{error, info};

#[derive(Debug, Parser)]
#[command(author, version, about = "Zarzify backend: API server and maintenance tools")]
pub struct Cli {
    /// Path to zarzify.toml (defaults to ZARZIFY_CONFIG or ./zarzify.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run the HTTP API.
    Serve,
    /// Give sample line items to sales that have none.
    Backfill {
        /// Report what would change without writing.
        #[arg(long)]
        dry_run: bool,
    },
    /// Copy the document store into the relational store.
    Migrate,
    /// Read-only views of the relational store.
    Inspect {
        #[command(subcommand)]
        target: InspectTarget,
    },
}

#[derive(Debug, Subcommand)]
pub enum InspectTarget {
    /// Tables and their columns.
    Schema,
    /// Users → businesses → child row counts.
    Counts,
    /// Raw rows of one table as JSON.
    Rows {
        table: String,
        #[arg(long, default_value_t = DEFAULT_ROW_LIMIT)]
        limit: u64,
    },
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
    }
    info!("Shutdown signal received.");
}

async fn serve(config: &AppConfig) -> Result<()> {
    let documents = DocumentStore::new(connect_documents(config).await?);
    let state = ApiState {
        documents,
        expose_error_details: config.server.expose_error_details,
    };

    let address = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&address)
        .await
        .inspect_err(|e| error!("Failed to bind {}: {}", address, e))?;
    info!("Listening on {}", address);

    axum::serve(listener, api::router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn run_inspect(config: &AppConfig, target: InspectTarget) -> Result<()> {
    let db = connect_relational(config).await?;
    let output = match target {
        InspectTarget::Schema => inspect::format_schema(&inspect::describe_schema(&db).await?),
        InspectTarget::Counts => inspect::format_counts(&inspect::hierarchy_counts(&db).await?),
        InspectTarget::Rows { table, limit } => {
            let rows = inspect::dump_rows(&db, &table, limit).await?;
            serde_json::to_string_pretty(&rows)?
        }
    };
    println!("{output}");
    Ok(())
}

/// Runs one command against the configured stores.
///
/// # Errors
/// Returns any connection, I/O or operation error the command hits.
pub async fn run(command: Command, config: &AppConfig) -> Result<()> {
    match command {
        Command::Serve => serve(config).await,
        Command::Backfill { dry_run } => {
            let store = DocumentStore::new(connect_documents(config).await?);
            let report = run_backfill(&store, BackfillOptions { dry_run }).await?;
            println!("{}", format_backfill_summary(&report));
            Ok(())
        }
        Command::Migrate => {
            let store = DocumentStore::new(connect_documents(config).await?);
            let db = connect_relational(config).await?;
            create_relational_tables(&db).await?;
            let report = migrate_documents(&store, &db).await?;
            println!("{}", format_migration_summary(&report));
            Ok(())
        }
        Command::Inspect { target } => run_inspect(config, target).await,
    }
}
