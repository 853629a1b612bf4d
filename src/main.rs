//! Graph QA - server and batch tools
//!
//! `serve` answers questions over HTTP, `ingest` loads the CSV data set,
//! `ping` checks the Neo4j connection.

use anyhow::Result;
use clap::{Parser, Subcommand};
use graph_qa::ingest::IngestionPipeline;
use graph_qa::neo4j::NodeWriteMode;
use graph_qa::Config;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "graph-qa")]
#[command(about = "Natural-language questions over a Neo4j issue-tracking graph")]
struct Cli {
    /// Path to a YAML config file (default: ./config.yaml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP server
    Serve {
        /// Port to listen on (overrides SERVER_PORT / config.yaml)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Load the CSV files of a directory into the graph
    Ingest {
        /// Directory holding users.csv, projects.csv, ...
        #[arg(short, long)]
        data_dir: Option<PathBuf>,

        /// Node write mode: merge (idempotent) or append
        #[arg(short, long)]
        mode: Option<NodeWriteMode>,
    },

    /// Check connectivity to Neo4j
    Ping,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,graph_qa=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    let mut config = Config::from_yaml_and_env(cli.config.as_deref())?;

    match cli.command {
        Commands::Serve { port } => {
            if let Some(port) = port {
                config.server_port = port;
            }
            graph_qa::start_server(config).await
        }
        Commands::Ingest { data_dir, mode } => {
            if let Some(dir) = data_dir {
                config.data_dir = dir;
            }
            if let Some(mode) = mode {
                config.ingest_node_mode = mode;
            }
            run_ingest(config).await
        }
        Commands::Ping => run_ping(config).await,
    }
}

async fn run_ingest(config: Config) -> Result<()> {
    let store = graph_qa::connect_store(&config).await?;
    let pipeline = IngestionPipeline::new(store, config.ingest_node_mode);

    let report = pipeline.run(&config.data_dir).await;
    println!("{}", serde_json::to_string_pretty(&report)?);

    if report.has_failures() {
        tracing::warn!("Ingestion finished with failures; see report");
    }
    Ok(())
}

async fn run_ping(config: Config) -> Result<()> {
    let store = graph_qa::connect_store(&config).await?;
    let records = store.run_read_query("RETURN 1 AS test", 1).await?;
    println!("{}", serde_json::to_string(&records)?);
    Ok(())
}
