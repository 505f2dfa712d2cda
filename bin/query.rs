use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use cuttle::index::PageTable;
use cuttle::query::{sort_lists_by_length, IndexAccessor, PostingList};
use cuttle::CuttleError;
use tracing::{info, warn};

#[derive(Parser)]
#[command(name = "query")]
#[command(about = "Open posting lists from a final index and walk them with nextGEQ", long_about = None)]
struct Args {
    /// Directory holding index.bin, lexicon.txt and blockMetaData.txt
    index_dir: PathBuf,

    /// Terms to look up
    #[arg(required = true)]
    terms: Vec<String>,

    /// Page table sidecar (docID TAB lengthInTokens)
    #[arg(long)]
    page_table: Option<PathBuf>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let args = Args::parse();

    let mut accessor = IndexAccessor::open(&args.index_dir)
        .with_context(|| format!("failed to open index in {}", args.index_dir.display()))?;
    info!("search engine is ready: {} terms", accessor.term_count());

    if let Some(path) = &args.page_table {
        let page_table = PageTable::load(path)
            .with_context(|| format!("failed to load page table {}", path.display()))?;
        info!(
            "page table loaded: {} documents, average length {:.1} tokens",
            page_table.len(),
            page_table.avg_doc_length()
        );
    }

    let mut lists: Vec<PostingList> = Vec::new();
    for term in &args.terms {
        match accessor.open_list(term) {
            Ok(list) => lists.push(list),
            Err(CuttleError::TermNotFound(term)) => warn!("term not found: {term}"),
            Err(err) => return Err(err.into()),
        }
    }

    // Shortest lists first, as an intersection would consume them.
    sort_lists_by_length(&mut lists);

    for list in &mut lists {
        print!("{}", list.term());
        let mut target = 0;
        while let Some(posting) = list.next_geq(target)? {
            print!(" {}:{}", posting.doc_id, posting.term_freq);
            match posting.doc_id.checked_add(1) {
                Some(next) => target = next,
                None => break,
            }
        }
        println!();
    }

    Ok(())
}
