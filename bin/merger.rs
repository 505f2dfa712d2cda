use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::Parser;
use cuttle::index::{list_partial_files, merge_partial_files};
use cuttle::IndexConfig;
use tracing::info;

#[derive(Parser)]
#[command(name = "merger")]
#[command(about = "K-way merge intermediate posting files into the final block-compressed index", long_about = None)]
struct Args {
    /// Directory holding the intermediate *.txt files
    intermediate_dir: PathBuf,

    /// Directory for index.bin, lexicon.txt and blockMetaData.txt
    final_index_dir: PathBuf,

    /// Postings per block in the final index
    #[arg(long, env = "CUTTLE_POSTINGS_PER_BLOCK")]
    postings_per_block: Option<usize>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let args = Args::parse();

    if !args.intermediate_dir.is_dir() {
        bail!(
            "intermediate directory does not exist or is not a directory: {}",
            args.intermediate_dir.display()
        );
    }
    ensure_output_dir(&args.final_index_dir)?;

    let mut config = IndexConfig::default();
    if let Some(postings_per_block) = args.postings_per_block {
        config.postings_per_block = postings_per_block;
    }

    let files = list_partial_files(&args.intermediate_dir)?;
    if files.is_empty() {
        bail!(
            "no intermediate .txt files found in {}",
            args.intermediate_dir.display()
        );
    }
    info!("found {} intermediate files", files.len());

    let stats = merge_partial_files(&files, &args.final_index_dir, &config)
        .context("merge failed")?;
    info!(
        "merger completed: {} terms, {} postings, {} index bytes in {}",
        stats.terms,
        stats.postings,
        stats.index_bytes,
        args.final_index_dir.display()
    );
    Ok(())
}

fn ensure_output_dir(dir: &Path) -> Result<()> {
    if dir.exists() {
        if !dir.is_dir() {
            bail!("output path exists and is not a directory: {}", dir.display());
        }
    } else {
        fs::create_dir_all(dir)
            .with_context(|| format!("failed to create output directory {}", dir.display()))?;
        info!("created final index directory: {}", dir.display());
    }
    Ok(())
}
