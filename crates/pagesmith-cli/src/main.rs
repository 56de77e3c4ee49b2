mod cmd;
mod output;
mod root;

use clap::{Parser, Subcommand};
use cmd::{config::ConfigSubcommand, secrets::SecretsSubcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "pagesmith",
    about = "Validate task requests, build a static app, and publish it to GitHub Pages",
    version,
    propagate_version = true
)]
struct Cli {
    /// Service root (default: auto-detect from .pagesmith/)
    #[arg(long, global = true, env = "PAGESMITH_ROOT")]
    root: Option<PathBuf>,

    /// Output as JSON
    #[arg(long, global = true, short = 'j')]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP server
    Serve {
        /// Port to listen on (default: server.port from config)
        #[arg(long)]
        port: Option<u16>,
    },

    /// Manage per-email secrets
    Secrets {
        #[command(subcommand)]
        subcommand: SecretsSubcommand,
    },

    /// Build the app for a task request and write it to a directory
    Generate {
        /// Path to a task request JSON file
        request: PathBuf,

        /// Output directory
        #[arg(long)]
        out: PathBuf,
    },

    /// Inspect and validate the configuration
    Config {
        #[command(subcommand)]
        subcommand: ConfigSubcommand,
    },
}

fn main() {
    let cli = Cli::parse();

    let default_level = match &cli.command {
        Commands::Serve { .. } => tracing::Level::INFO,
        _ => tracing::Level::WARN,
    };

    let rust_log = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    tracing_subscriber::fmt()
        .with_env_filter(log_filter(rust_log.as_deref(), default_level))
        .with_target(false)
        .init();

    let root = root::resolve_root(cli.root.as_deref());

    let result = match cli.command {
        Commands::Serve { port } => cmd::serve::run(&root, port),
        Commands::Secrets { subcommand } => cmd::secrets::run(&root, subcommand, cli.json),
        Commands::Generate { request, out } => cmd::generate::run(&request, &out, cli.json),
        Commands::Config { subcommand } => cmd::config::run(&root, subcommand, cli.json),
    };

    if let Err(e) = result {
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}

/// `RUST_LOG` directives replace the default level; the default only applies
/// when none are given.
fn log_filter(rust_log: Option<&str>, default_level: tracing::Level) -> EnvFilter {
    EnvFilter::builder()
        .with_default_directive(default_level.into())
        .parse_lossy(rust_log.unwrap_or_default())
}
