//! Compare two plain-text documents and print a JSON report.
//!
//! ```bash
//! docalign old.txt new.txt --analyses semantic,lexical --pretty
//! RUST_LOG=docalign=debug docalign a.txt b.txt --window 256
//! ```

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use docalign::{read_document, Analysis, Analyzer, Comparator, CompareConfig, Error};

/// Compare two documents through literal, lexical, semantic, and structural lenses.
#[derive(Debug, Parser)]
#[command(name = "docalign", version, about)]
struct Args {
    /// First document (plain text; pages separated by form feeds).
    doc_a: PathBuf,

    /// Second document.
    doc_b: PathBuf,

    /// TOML configuration file.
    #[arg(long, env = "DOCALIGN_CONFIG")]
    config: Option<PathBuf>,

    /// Chunk width in words.
    #[arg(long)]
    window: Option<usize>,

    /// Similarity a chunk pair must exceed to be reported.
    #[arg(long)]
    pair_threshold: Option<f32>,

    /// Best-match similarity below which a chunk is unique.
    #[arg(long)]
    unique_threshold: Option<f32>,

    /// Number of chunk pairs reported.
    #[arg(long)]
    top_n: Option<usize>,

    /// Embedding model, e.g. `hashing` or `fastembed:all-minilm-l6-v2`.
    #[arg(long)]
    model: Option<String>,

    /// Embedding deadline in seconds.
    #[arg(long)]
    timeout: Option<u64>,

    /// Analyses to run.
    #[arg(long, value_delimiter = ',', default_value = "basic,lexical,semantic,structural")]
    analyses: Vec<Analysis>,

    /// Pretty-print the JSON report.
    #[arg(long)]
    pretty: bool,
}

fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();
    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "comparison failed");
            eprintln!("Error: {e}");
            if e.is_client_error() {
                ExitCode::from(2)
            } else {
                ExitCode::FAILURE
            }
        }
    }
}

fn run(args: &Args) -> Result<(), Error> {
    let config = build_config(args)?;

    let text_a = read_document(&args.doc_a)?;
    let text_b = read_document(&args.doc_b)?;

    let comparator = if args.analyses.contains(&Analysis::Semantic) {
        tracing::info!(model = %config.embedding_model, "loading embedding provider");
        Some(Comparator::from_config(config)?)
    } else {
        None
    };

    let analyzer = Analyzer::new(comparator, args.analyses.iter().copied())?;
    let report = analyzer.run(&text_a, &text_b)?;

    let json = if args.pretty {
        serde_json::to_string_pretty(&report)
    } else {
        serde_json::to_string(&report)
    }
    .map_err(|e| Error::Output(e.to_string()))?;
    println!("{json}");
    Ok(())
}

/// File, then environment, then flags; later sources win.
fn build_config(args: &Args) -> Result<CompareConfig, Error> {
    let mut config = match &args.config {
        Some(path) => CompareConfig::load(path)?,
        None => CompareConfig::default(),
    }
    .apply_env()?;

    if let Some(window) = args.window {
        config = config.with_window_size(window);
    }
    if let Some(threshold) = args.pair_threshold {
        config = config.with_pair_threshold(threshold);
    }
    if let Some(threshold) = args.unique_threshold {
        config = config.with_uniqueness_threshold(threshold);
    }
    if let Some(top_n) = args.top_n {
        config = config.with_top_n_pairs(top_n);
    }
    if let Some(model) = &args.model {
        config = config.with_embedding_model(model.clone());
    }
    if let Some(secs) = args.timeout {
        config = config.with_embedding_timeout(Some(Duration::from_secs(secs)));
    }

    config.validate()?;
    Ok(config)
}
