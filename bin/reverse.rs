use std::fs::File;
use std::io::{BufWriter, Read, Seek, SeekFrom, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use cuttle::index::{decode_list, Lexicon};
use tracing::info;

#[derive(Parser)]
#[command(name = "reverse")]
#[command(about = "Diagnostic dump: decode a final index back into ASCII posting lines", long_about = None)]
struct Args {
    /// Final index file (index.bin)
    index: PathBuf,

    /// Lexicon file (lexicon.txt)
    lexicon: PathBuf,

    /// ASCII output file
    output: PathBuf,

    /// Postings per block the index was written with
    #[arg(long, env = "CUTTLE_POSTINGS_PER_BLOCK", default_value_t = 64)]
    postings_per_block: usize,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let args = Args::parse();

    let lexicon = Lexicon::load(&args.lexicon)
        .with_context(|| format!("failed to load lexicon {}", args.lexicon.display()))?;
    info!("total terms in lexicon: {}", lexicon.len());

    let mut index = File::open(&args.index)
        .with_context(|| format!("failed to open index file {}", args.index.display()))?;
    let mut out = BufWriter::new(
        File::create(&args.output)
            .with_context(|| format!("failed to create output file {}", args.output.display()))?,
    );

    let mut buffer = Vec::new();
    for (term, entry) in lexicon.iter() {
        index.seek(SeekFrom::Start(entry.offset))?;
        buffer.resize(entry.length as usize, 0);
        index.read_exact(&mut buffer)?;

        let postings = decode_list(&buffer, entry.doc_freq, args.postings_per_block)
            .with_context(|| format!("failed to decode postings of term {term:?}"))?;

        write!(out, "{term}")?;
        for posting in &postings {
            write!(out, " {}:{}", posting.doc_id, posting.term_freq)?;
        }
        out.write_all(b"\n")?;
    }
    out.flush()?;

    info!(
        "index decoded to ASCII successfully: {}",
        args.output.display()
    );
    Ok(())
}
