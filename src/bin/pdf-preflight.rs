//! PDF Preflight CLI tool
//!
//! A command-line tool for checking PDFs before they go to print.

use anyhow::Context;
use clap::{Parser, Subcommand};
use glob::glob;
use std::path::{Path, PathBuf};
use std::process;
use std::time::Duration;

use pdf_preflight::config::LOW_DPI_THRESHOLD;
use pdf_preflight::pdf::extract_metadata;
use pdf_preflight::{analyze_path, AnalysisOptions, Error};

/// PDF Preflight - Check color mode, fonts, layers and images for print
#[derive(Parser)]
#[command(name = "pdf-preflight")]
#[command(author, version, about, long_about = None)]
#[command(after_help = "EXAMPLES:
    # Analyze one file and pretty-print the report
    pdf-preflight analyze --pretty poster.pdf

    # Analyze every PDF in a folder
    pdf-preflight analyze \"jobs/*.pdf\"

    # Stricter resolution check, no worker threads
    pdf-preflight analyze --low-dpi 300 --sequential labels.pdf

    # Show basic document information
    pdf-preflight info poster.pdf")]
struct Cli {
    /// Log progress to stderr (RUST_LOG overrides)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze PDFs and print one JSON report per file
    Analyze {
        /// Input PDF files. Supports glob patterns like "*.pdf"
        #[arg(required = true)]
        inputs: Vec<String>,

        /// DPI below which an image is reported as low resolution
        #[arg(long, default_value_t = LOW_DPI_THRESHOLD)]
        low_dpi: f64,

        /// Scan pages one at a time instead of in parallel
        #[arg(long)]
        sequential: bool,

        /// Time budget for reading one image's data, in milliseconds (0 = unbounded)
        #[arg(long, default_value_t = 5000)]
        image_timeout_ms: u64,

        /// Time budget for parsing XMP metadata, in milliseconds (0 = unbounded)
        #[arg(long, default_value_t = 2000)]
        metadata_timeout_ms: u64,

        /// Pretty-print the JSON output
        #[arg(long)]
        pretty: bool,
    },

    /// Show information about a PDF file
    Info {
        /// PDF file to inspect
        input: PathBuf,
    },
}

fn main() {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();

    let result = match cli.command {
        Commands::Analyze {
            inputs,
            low_dpi,
            sequential,
            image_timeout_ms,
            metadata_timeout_ms,
            pretty,
        } => {
            let options = AnalysisOptions {
                low_dpi_threshold: low_dpi,
                parallel_pages: !sequential,
                image_decode_timeout: millis(image_timeout_ms),
                metadata_timeout: millis(metadata_timeout_ms),
                ..Default::default()
            };
            cmd_analyze(inputs, &options, pretty)
        }
        Commands::Info { input } => cmd_info(&input),
    };

    if let Err(e) = result {
        eprintln!("Error: {:#}", e);
        process::exit(1);
    }
}

fn millis(ms: u64) -> Option<Duration> {
    (ms > 0).then(|| Duration::from_millis(ms))
}

/// Expand glob patterns in input paths
fn expand_globs(patterns: Vec<String>) -> pdf_preflight::Result<Vec<PathBuf>> {
    let mut paths = Vec::new();

    for pattern in patterns {
        // Check if pattern contains glob characters
        if pattern.contains('*') || pattern.contains('?') || pattern.contains('[') {
            let entries = glob(&pattern).map_err(|e| Error::InvalidGlob(format!("{pattern}: {e}")))?;
            let mut matched = false;
            for entry in entries {
                match entry {
                    Ok(path) => {
                        paths.push(path);
                        matched = true;
                    }
                    Err(e) => log::warn!("glob error for {}: {}", pattern, e),
                }
            }
            if !matched {
                return Err(Error::NoFilesMatched(pattern));
            }
        } else {
            paths.push(PathBuf::from(pattern));
        }
    }

    // Sort paths for consistent ordering
    paths.sort();

    Ok(paths)
}

/// Analyze each file; a file that cannot be opened gets an error-only object
fn cmd_analyze(inputs: Vec<String>, options: &AnalysisOptions, pretty: bool) -> anyhow::Result<()> {
    let paths = expand_globs(inputs)?;
    let mut failed = 0;

    for path in &paths {
        log::debug!("analyzing {}", path.display());
        let line = match analyze_path(path, options) {
            Ok(report) => report
                .to_json(pretty)
                .with_context(|| format!("serializing report for {}", path.display()))?,
            Err(e) => {
                failed += 1;
                error_json(path, &e, pretty)?
            }
        };
        println!("{line}");
    }

    if failed > 0 {
        anyhow::bail!("{failed} of {} file(s) could not be analyzed", paths.len());
    }
    Ok(())
}

fn error_json(path: &Path, error: &Error, pretty: bool) -> anyhow::Result<String> {
    let value = serde_json::json!({
        "file": path.display().to_string(),
        "error": error.to_string(),
    });
    let text = if pretty {
        serde_json::to_string_pretty(&value)?
    } else {
        serde_json::to_string(&value)?
    };
    Ok(text)
}

fn cmd_info(input: &Path) -> anyhow::Result<()> {
    let meta = extract_metadata(input)
        .with_context(|| format!("reading {}", input.display()))?;

    println!("File: {}", input.display());
    println!("Pages: {}", meta.page_count);
    if let Some(title) = &meta.title {
        println!("Title: {}", title);
    }
    if let Some(author) = &meta.author {
        println!("Author: {}", author);
    }
    if let Some(producer) = &meta.producer {
        println!("Producer: {}", producer);
    }
    if let Some(condition) = &meta.output_condition {
        println!("Output intent: {}", condition);
    }
    println!("Layers: {}", if meta.has_layers { "yes" } else { "no" });

    Ok(())
}
