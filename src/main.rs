//! # docvec CLI
//!
//! ## Usage
//!
//! ```bash
//! docvec --config ./config/docvec.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `docvec init` | Create the store schema |
//! | `docvec ingest` | Ingest the document root |
//! | `docvec query "<text>"` | Print the nearest chunks |
//! | `docvec stats` | Print unique files and total chunks |
//! | `docvec serve` | Start the HTTP query service |
//!
//! Without `--config`, `./config/docvec.toml` is used if present, otherwise
//! built-in defaults. Environment overrides apply either way.

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

use docvec::backend::open_store;
use docvec::config::{self, Config};
use docvec::progress::ProgressMode;
use docvec::{ingest, query, server, stats};

const DEFAULT_CONFIG_PATH: &str = "./config/docvec.toml";

/// Exit status after Ctrl-C, as a shell reports SIGINT.
const EXIT_INTERRUPTED: u8 = 130;

#[derive(Parser)]
#[command(
    name = "docvec",
    about = "Deterministic document ingestion and vector retrieval",
    version
)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace).
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the store schema. Safe to run repeatedly.
    Init,

    /// Ingest every supported file under the document root.
    ///
    /// Files are committed one at a time; an interrupted run keeps every
    /// file committed so far, and re-running skips them.
    Ingest {
        /// Document root; overrides `[ingest].root` and `DOC_PATH`.
        #[arg(long)]
        doc_path: Option<PathBuf>,

        /// Progress on stderr. Defaults to `human` on a TTY, else `off`.
        #[arg(long, value_enum)]
        progress: Option<ProgressMode>,
    },

    /// Print the chunks nearest to a query string.
    Query {
        text: String,

        /// Number of results; defaults to `[retrieval].default_limit`.
        #[arg(long)]
        limit: Option<usize>,

        /// Print results as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Print unique files and total chunks.
    Stats {
        #[arg(long)]
        json: bool,
    },

    /// Start the HTTP query service on `[server].bind`.
    Serve,
}

fn init_tracing(verbose: u8) {
    let filter = if let Ok(env) = std::env::var("DOCVEC_LOG") {
        EnvFilter::new(env)
    } else {
        match verbose {
            0 => EnvFilter::new("warn"),
            1 => EnvFilter::new("info"),
            2 => EnvFilter::new("debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .without_time()
        .init();
}

fn resolve_config(path: Option<&Path>) -> anyhow::Result<Config> {
    match path {
        Some(path) => config::load_config(path),
        None if Path::new(DEFAULT_CONFIG_PATH).exists() => {
            config::load_config(Path::new(DEFAULT_CONFIG_PATH))
        }
        None => {
            let mut cfg = Config::minimal();
            config::apply_env_overrides(&mut cfg)?;
            cfg.validate()?;
            Ok(cfg)
        }
    }
}

async fn run(command: Commands, cfg: &Config) -> anyhow::Result<()> {
    match command {
        Commands::Init => {
            let store = open_store(cfg).await?;
            println!("{} store initialized.", store.backend());
            store.close().await;
        }
        Commands::Ingest { doc_path, progress } => {
            let mode = progress.unwrap_or_else(ProgressMode::default_for_tty);
            ingest::run_ingest(cfg, doc_path, mode).await?;
        }
        Commands::Query { text, limit, json } => {
            query::run_query(cfg, &text, limit, json).await?;
        }
        Commands::Stats { json } => {
            stats::run_stats(cfg, json).await?;
        }
        Commands::Serve => {
            server::run_server(cfg).await?;
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let cfg = match resolve_config(cli.config.as_deref()) {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            return ExitCode::FAILURE;
        }
    };

    // The server installs its own Ctrl-C handler for graceful shutdown.
    let handle_interrupt = !matches!(cli.command, Commands::Serve);

    tokio::select! {
        result = run(cli.command, &cfg) => match result {
            Ok(()) => ExitCode::SUCCESS,
            Err(e) => {
                eprintln!("Error: {:#}", e);
                ExitCode::FAILURE
            }
        },
        _ = tokio::signal::ctrl_c(), if handle_interrupt => {
            eprintln!("Interrupted. Files committed so far are kept.");
            ExitCode::from(EXIT_INTERRUPTED)
        }
    }
}
