//! `surreal-link` command-line client.
//!
//! Runs one client operation against a database and prints the answer as
//! pretty JSON. Ctrl-C cancels the operation in flight.

use clap::{Parser, Subcommand};
use serde_json::Value;
use std::path::PathBuf;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use surreal_link::config::loader::{apply_env_overrides, load_config};
use surreal_link::observability::{init_logging, init_metrics};
use surreal_link::{ClientConfig, OpContext, SurrealClient};

#[derive(Parser)]
#[command(name = "surreal-link")]
#[command(about = "Cancellation-aware SurrealDB client", long_about = None)]
struct Cli {
    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[arg(short, long)]
    address: Option<String>,

    #[arg(short, long)]
    user: Option<String>,

    #[arg(short, long)]
    password: Option<String>,

    #[arg(long)]
    namespace: Option<String>,

    #[arg(long)]
    database: Option<String>,

    /// Operation timeout in seconds (defaults to timeouts.operation_secs)
    #[arg(short, long)]
    timeout: Option<u64>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check that the database answers
    Ping,
    /// Read a record or a whole table
    Get { reference: String },
    /// Create a record from a JSON object
    Create { reference: String, data: String },
    /// Replace a record's content with a JSON object
    Update { reference: String, data: String },
    /// Delete a record or a whole table
    Delete { reference: String },
    /// Link two records with a relation
    Relate {
        from: String,
        relation: String,
        to: String,
    },
    /// Run a free-form query
    Query { sql: String },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = build_config(&cli)?;

    init_logging(&config.observability);
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "surreal-link starting");

    if config.observability.metrics_enabled {
        if let Ok(addr) = config.observability.metrics_address.parse() {
            init_metrics(addr);
        } else {
            tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            );
        }
    }

    let timeout = Duration::from_secs(cli.timeout.unwrap_or(config.timeouts.operation_secs));
    let client = SurrealClient::connect(config).await?;

    let shutdown = CancellationToken::new();
    let interrupt = shutdown.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupted, cancelling operation");
            interrupt.cancel();
        }
    });
    let ctx = OpContext::with_token(shutdown).deadline_in(timeout);

    let output = match cli.command {
        Commands::Ping => {
            client.ping().await?;
            serde_json::json!({ "status": "ok", "selection": client.selection().to_string() })
        }
        Commands::Get { reference } => client.read_raw(&ctx, &reference).await?.into_value(),
        Commands::Create { reference, data } => {
            let payload: Value = serde_json::from_str(&data)?;
            client.create(&ctx, &reference, &payload).await?.into_value()
        }
        Commands::Update { reference, data } => {
            let payload: Value = serde_json::from_str(&data)?;
            client.update(&ctx, &reference, &payload).await?.into_value()
        }
        Commands::Delete { reference } => {
            client.delete(&ctx, &reference).await?;
            serde_json::json!({ "deleted": reference })
        }
        Commands::Relate { from, relation, to } => {
            client.relate(&ctx, &from, &to, &relation).await?.into_value()
        }
        Commands::Query { sql } => serde_json::to_value(client.query_all(&ctx, &sql).await?)?,
    };

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

/// File (or defaults), then `SURREAL_*` variables, then flags.
fn build_config(cli: &Cli) -> Result<ClientConfig, Box<dyn std::error::Error>> {
    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => {
            let mut config = ClientConfig::default();
            apply_env_overrides(&mut config);
            config
        }
    };

    let overrides = [
        (&cli.address, &mut config.address),
        (&cli.user, &mut config.user),
        (&cli.password, &mut config.password),
        (&cli.namespace, &mut config.namespace),
        (&cli.database, &mut config.database),
    ];
    for (flag, field) in overrides {
        if let Some(value) = flag {
            *field = value.clone();
        }
    }

    if config.address.is_empty() {
        config.address = "http://127.0.0.1:8000".to_string();
    }
    Ok(config)
}
