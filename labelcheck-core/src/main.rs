//! labelcheck - supplement label checking service and tools
//!
//! Subcommands:
//! - `serve`: HTTP API over the label, form and UL stages
//! - `structure`: OCR tokens (JSON) to a label draft
//! - `scan`: image to label draft through the OCR service
//! - `canonicalize`: form text to canonical and explicit tokens
//! - `diagnose`: root-cause report for zero form-coverage products

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use labelcheck_common::config::{load_config, require_database_path, TomlConfig};
use labelcheck_core::diagnostics::{run_diagnostics, write_report};
use labelcheck_core::forms::{canonicalize_form_tokens, collect_explicit_form_tokens};
use labelcheck_core::label::structure_label;
use labelcheck_core::models::Token;
use labelcheck_core::services::{
    open_read_only, scan_label, ImageSource, ProductSource, SqliteReferenceStore, VisionOcrClient,
};
use labelcheck_core::ul::UlCalculator;
use labelcheck_core::AppState;
use serde::Deserialize;
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, reload, util::SubscriberInitExt, EnvFilter};

#[derive(Parser, Debug)]
#[command(name = "labelcheck")]
#[command(about = "Supplement label structuring, form matching and diagnostics")]
#[command(version)]
struct Args {
    /// Configuration file (TOML)
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the HTTP API
    Serve {
        /// Reference database (overrides [database] path)
        #[arg(long, value_name = "FILE")]
        db: Option<PathBuf>,

        /// Bind address (overrides [server] bind)
        #[arg(long)]
        bind: Option<String>,
    },

    /// Structure OCR tokens read from a JSON file
    Structure {
        /// JSON array of tokens, or an object with a `tokens` array
        #[arg(long, value_name = "FILE")]
        tokens: PathBuf,
    },

    /// Recognize a label image and structure it
    Scan {
        /// Image file path or http(s) URL
        #[arg(long)]
        image: String,
    },

    /// Canonicalize ingredient form text
    Canonicalize {
        #[arg(required = true)]
        text: Vec<String>,
    },

    /// Explain zero form-coverage products
    Diagnose {
        /// Products and reference database (overrides [database] path)
        #[arg(long, value_name = "FILE")]
        db: Option<PathBuf>,

        /// Report file; stdout when omitted
        #[arg(long, value_name = "FILE")]
        out: Option<PathBuf>,

        /// Products to sample (overrides [diagnostics] sample_size)
        #[arg(long)]
        sample: Option<usize>,

        /// Sampling seed (overrides [diagnostics] seed)
        #[arg(long)]
        seed: Option<u64>,
    },
}

/// Token file layout accepted by `structure`
#[derive(Deserialize)]
#[serde(untagged)]
enum TokenFile {
    Bare(Vec<Token>),
    Wrapped { tokens: Vec<Token> },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Tracing first so config loading is logged; the configured level is
    // applied afterwards unless RUST_LOG is set
    let env_filter = EnvFilter::try_from_default_env().ok();
    let from_env = env_filter.is_some();
    let (filter, filter_handle) =
        reload::Layer::new(env_filter.unwrap_or_else(|| EnvFilter::new("info")));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = load_config(args.config.as_deref()).context("Failed to load configuration")?;
    if !from_env {
        filter_handle
            .reload(EnvFilter::new(&config.logging.level))
            .context("Failed to apply configured log level")?;
    }

    match args.command {
        Command::Serve { db, bind } => serve(&config, db.as_deref(), bind).await,
        Command::Structure { tokens } => structure(&tokens),
        Command::Scan { image } => scan(&config, &image).await,
        Command::Canonicalize { text } => {
            print_json(&serde_json::json!({
                "canonical": canonicalize_form_tokens(&text),
                "explicit": collect_explicit_form_tokens(&text),
            }))
        }
        Command::Diagnose {
            db,
            out,
            sample,
            seed,
        } => diagnose(&config, db.as_deref(), out.as_deref(), sample, seed).await,
    }
}

async fn serve(config: &TomlConfig, db: Option<&Path>, bind: Option<String>) -> Result<()> {
    // Fail fast on configuration before binding
    let ul = UlCalculator::from_config(&config.ul)?;
    let db_path = require_database_path(&config.database, db)?;
    let reference = SqliteReferenceStore::open(&db_path, &config.reference)
        .await
        .context("Failed to open reference database")?;

    let app = labelcheck_core::build_router(AppState::new(Arc::new(reference), ul));

    let bind = bind.unwrap_or_else(|| config.server.bind.clone());
    let listener = tokio::net::TcpListener::bind(&bind)
        .await
        .with_context(|| format!("Failed to bind to {}", bind))?;

    info!("Starting labelcheck v{}", env!("CARGO_PKG_VERSION"));
    info!("Listening on http://{}", bind);
    info!("Health check: http://{}/health", bind);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutdown complete");
    Ok(())
}

fn structure(tokens_path: &Path) -> Result<()> {
    let raw = std::fs::read_to_string(tokens_path)
        .with_context(|| format!("Failed to read {}", tokens_path.display()))?;
    let tokens = match serde_json::from_str::<TokenFile>(&raw).context("Invalid token file")? {
        TokenFile::Bare(tokens) | TokenFile::Wrapped { tokens } => tokens,
    };

    print_json(&structure_label(&tokens))
}

async fn scan(config: &TomlConfig, image: &str) -> Result<()> {
    let client = VisionOcrClient::from_config(&config.ocr)?;
    let source = ImageSource::from_arg(image)
        .await
        .with_context(|| format!("Failed to read image {}", image))?;

    let draft = scan_label(&client, &source).await?;
    print_json(&draft)
}

async fn diagnose(
    config: &TomlConfig,
    db: Option<&Path>,
    out: Option<&Path>,
    sample: Option<usize>,
    seed: Option<u64>,
) -> Result<()> {
    let db_path = require_database_path(&config.database, db)?;
    let pool = open_read_only(&db_path)
        .await
        .context("Failed to open database")?;

    let mut settings = config.diagnostics.clone();
    if let Some(sample) = sample {
        settings.sample_size = sample;
    }
    if let Some(seed) = seed {
        settings.seed = seed;
    }

    let products = ProductSource::new(pool.clone(), &config.reference);
    let reference = SqliteReferenceStore::new(pool, &config.reference);
    let report = run_diagnostics(&products, &reference, &settings).await?;

    write_report(&report, out)?;
    Ok(())
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C"),
        _ = terminate => info!("Received SIGTERM"),
    }
}
