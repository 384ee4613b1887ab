//! Codemesh CLI entry point.

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

#[derive(Parser)]
#[command(name = "codemesh")]
#[command(about = "Semantic code-indexing engine for heterogeneous enterprise codebases", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose (debug) logging.
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations and exit.
    Migrate,
    /// Start the REST/GraphQL/MCP server.
    Serve,
    /// Index one project's source tree and exit.
    Index {
        /// Project slug to index.
        #[arg(long)]
        project: String,
        /// Source name within the project; defaults to the project's only source.
        #[arg(long)]
        source: Option<String>,
        /// Local path to index (used to create a filesystem source on first run).
        #[arg(long)]
        path: Option<std::path::PathBuf>,
    },
    /// Long-poll the ingestion queue and execute jobs as they arrive.
    Worker {
        /// Consumer group name (for horizontal scale-out against a real queue).
        #[arg(long, default_value = "workers")]
        group: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(format!("codemesh={log_level}")))
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("codemesh v{}", env!("CARGO_PKG_VERSION"));

    match cli.command {
        Commands::Migrate => commands::migrate().await,
        Commands::Serve => commands::serve().await,
        Commands::Index { project, source, path } => commands::index(project, source, path).await,
        Commands::Worker { group } => commands::worker(group).await,
    }
}
