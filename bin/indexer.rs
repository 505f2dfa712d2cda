use std::fs;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::Parser;
use cuttle::index::IndexBuilder;
use cuttle::IndexConfig;
use tracing::info;

#[derive(Parser)]
#[command(name = "indexer")]
#[command(about = "Parse a docID\\tpassage collection into sorted intermediate posting files", long_about = None)]
struct Args {
    /// Collection file (docID TAB passage per line)
    collection: PathBuf,

    /// Directory for intermediate files and the page table sidecar
    output_dir: PathBuf,

    /// In-memory budget in bytes before a partial index spills
    #[arg(long, env = "CUTTLE_MAX_IN_MEMORY_BYTES")]
    max_in_memory_bytes: Option<usize>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let args = Args::parse();
    ensure_output_dir(&args.output_dir)?;

    let mut config = IndexConfig::default();
    if let Some(max_bytes) = args.max_in_memory_bytes {
        config.max_in_memory_bytes = max_bytes;
    }

    info!(
        "indexing {} into {}",
        args.collection.display(),
        args.output_dir.display()
    );

    let file = fs::File::open(&args.collection)
        .with_context(|| format!("failed to open collection file {}", args.collection.display()))?;
    let files = IndexBuilder::new(&args.output_dir, &config)
        .index_collection(BufReader::new(file))
        .context("indexing failed")?;

    info!("indexing completed: {} intermediate files", files.len());
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
        info!("created output directory: {}", dir.display());
    }
    Ok(())
}
