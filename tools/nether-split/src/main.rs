//! nether-split - glTF buffer splitter
//!
//! Splits a glTF asset's binary buffers (.bin, .glbin, .glbuf) into chunks
//! under a size limit. Existing buffers are not rearranged, only split.
//!
//! CAUTION: the document and its binaries are modified in place.

use anyhow::{Context, Result};
use clap::Parser;
use nether_split::{split_file, Outcome, SplitOptions};
use std::path::PathBuf;
use std::time::Instant;

#[derive(Parser)]
#[command(name = "nether-split")]
#[command(about = "Split glTF binary buffers into size-limited chunks (modifies files in place)")]
#[command(version)]
struct Cli {
    /// Path to the .gltf asset
    #[arg(short, long)]
    path: PathBuf,

    /// Size limit in bytes for each binary chunk; 0 splits by each view.
    /// Must be at least as large as the largest bufferView.
    #[arg(short, long, default_value_t = 0)]
    limit: u64,

    /// Pretty-print the resulting glTF
    #[arg(short, long)]
    format: bool,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()),
        )
        .init();

    let start = Instant::now();
    let options = SplitOptions {
        size_limit: cli.limit,
        pretty: cli.format,
    };

    let report = split_file(&cli.path, &options)
        .with_context(|| format!("Failed to split {:?}", cli.path))?;

    for buffer in &report.buffers {
        match buffer.outcome {
            Outcome::Untouched => {
                tracing::info!("  buffer {}: fits the limit, unchanged", buffer.buffer)
            }
            Outcome::Compacted => {
                tracing::info!("  buffer {}: fits the limit, compacted", buffer.buffer)
            }
            Outcome::Split(count) => tracing::info!(
                "  buffer {}: {} chunks (buffers {}..{})",
                buffer.buffer,
                count,
                buffer.first_chunk,
                buffer.first_chunk + count
            ),
        }
    }
    tracing::info!(
        "Done! {} buffers -> {} buffers ({} split)",
        report.buffers.len(),
        report.total_chunks(),
        report.split_count()
    );
    tracing::info!("Total time: {:.5} seconds", start.elapsed().as_secs_f64());

    Ok(())
}
