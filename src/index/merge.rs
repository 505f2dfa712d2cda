//! K-way merge of intermediate posting files into the final index
//!
//! A min-heap keyed by `(term, reader index)` drains all readers in global
//! term order; the reader index breaks ties so the output is deterministic
//! even when two partials are byte-identical. Postings for one term are
//! gathered from every reader holding it, sorted by docID, coalesced by
//! summing frequencies, and handed to the block encoder. The three output
//! files are streamed as terms are emitted.

use std::cmp::Reverse;
use std::collections::BinaryHeap;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use tracing::info;

use crate::config::IndexConfig;
use crate::error::Result;

use super::lexicon::{BlockMetaWriter, LexiconWriter};
use super::partial::PartialFileReader;
use super::postings::PostingsWriter;
use super::types::{LexiconEntry, Posting};

/// Final index file names within the output directory
pub const INDEX_FILE: &str = "index.bin";
pub const LEXICON_FILE: &str = "lexicon.txt";
pub const BLOCK_META_FILE: &str = "blockMetaData.txt";

/// Counters reported after a merge
#[derive(Clone, Copy, Debug, Default)]
pub struct MergeStats {
    pub terms: u64,
    pub postings: u64,
    pub blocks: u64,
    pub index_bytes: u64,
}

/// List the intermediate `*.txt` files in a directory, sorted by path.
pub fn list_partial_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_file() && path.extension().map_or(false, |ext| ext == "txt") {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// Merge sorted partial files into `index.bin`, `lexicon.txt` and
/// `blockMetaData.txt` under `out_dir`.
pub fn merge_partial_files(
    files: &[PathBuf],
    out_dir: &Path,
    config: &IndexConfig,
) -> Result<MergeStats> {
    let mut readers = Vec::with_capacity(files.len());
    for path in files {
        readers.push(PartialFileReader::open(path)?);
    }

    let mut heap = BinaryHeap::new();
    for (idx, reader) in readers.iter().enumerate() {
        if !reader.exhausted() {
            heap.push(Reverse((reader.term().to_string(), idx)));
        }
    }

    let mut index_out = BufWriter::new(File::create(out_dir.join(INDEX_FILE))?);
    let mut lexicon_out = LexiconWriter::create(out_dir.join(LEXICON_FILE))?;
    let mut block_meta_out = BlockMetaWriter::create(out_dir.join(BLOCK_META_FILE))?;

    let mut writer = PostingsWriter::new(config.postings_per_block);
    let mut offset = 0u64;
    let mut stats = MergeStats::default();
    let mut merged: Vec<Posting> = Vec::new();

    while let Some(Reverse((term, idx))) = heap.pop() {
        merged.clear();
        merged.extend_from_slice(readers[idx].postings());
        readers[idx].advance()?;
        if !readers[idx].exhausted() {
            heap.push(Reverse((readers[idx].term().to_string(), idx)));
        }

        // Gather every other reader currently holding the same term.
        while heap
            .peek()
            .map_or(false, |Reverse((next, _))| *next == term)
        {
            if let Some(Reverse((_, other))) = heap.pop() {
                merged.extend_from_slice(readers[other].postings());
                readers[other].advance()?;
                if !readers[other].exhausted() {
                    heap.push(Reverse((readers[other].term().to_string(), other)));
                }
            }
        }

        merged.sort_by_key(|posting| posting.doc_id);

        // Coalesce duplicate docIDs across partials by summing frequencies.
        writer.start_posting_list();
        let mut pending: Option<Posting> = None;
        for &posting in &merged {
            match pending {
                Some(ref mut current) if current.doc_id == posting.doc_id => {
                    current.term_freq += posting.term_freq;
                }
                Some(current) => {
                    writer.add_posting(current)?;
                    pending = Some(posting);
                }
                None => pending = Some(posting),
            }
        }
        if let Some(current) = pending {
            writer.add_posting(current)?;
        }

        let encoded = writer.finish_posting_list();
        index_out.write_all(&encoded.data)?;
        lexicon_out.add(
            &term,
            LexiconEntry {
                offset,
                length: encoded.data.len() as u32,
                doc_freq: encoded.doc_freq,
            },
        )?;
        for block in &encoded.blocks {
            block_meta_out.add(block)?;
        }

        offset += encoded.data.len() as u64;
        stats.terms += 1;
        stats.postings += encoded.doc_freq as u64;
        stats.blocks += encoded.blocks.len() as u64;
    }

    index_out.flush()?;
    lexicon_out.finish()?;
    block_meta_out.finish()?;

    stats.index_bytes = offset;
    info!(
        "merged {} partial files: {} terms, {} postings, {} blocks, {} index bytes",
        files.len(),
        stats.terms,
        stats.postings,
        stats.blocks,
        stats.index_bytes
    );
    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::lexicon::{BlockMetaTable, Lexicon};
    use crate::index::postings::decode_list;
    use tempfile::TempDir;

    fn write_partials(dir: &Path, partials: &[&str]) -> Vec<PathBuf> {
        let mut files = Vec::new();
        for (idx, content) in partials.iter().enumerate() {
            let path = dir.join(format!("intermediate_{idx}.txt"));
            fs::write(&path, content).unwrap();
            files.push(path);
        }
        files
    }

    fn read_term(dir: &Path, lexicon: &Lexicon, term: &str, ppb: usize) -> Vec<Posting> {
        let entry = lexicon.get(term).unwrap();
        let data = fs::read(dir.join(INDEX_FILE)).unwrap();
        let start = entry.offset as usize;
        let end = start + entry.length as usize;
        decode_list(&data[start..end], entry.doc_freq, ppb).unwrap()
    }

    #[test]
    fn test_cross_partial_merge_sums_duplicates() {
        let tmp = TempDir::new().unwrap();
        let files = write_partials(
            tmp.path(),
            &["foo 1:2 3:1\n", "foo 3:4 5:1\n", "bar 2:1\n"],
        );

        let config = IndexConfig::default();
        let stats = merge_partial_files(&files, tmp.path(), &config).unwrap();
        assert_eq!(stats.terms, 2);
        assert_eq!(stats.postings, 4);

        let lexicon = Lexicon::load(&tmp.path().join(LEXICON_FILE)).unwrap();
        let terms: Vec<&str> = lexicon.iter().map(|(term, _)| term).collect();
        assert_eq!(terms, vec!["bar", "foo"]);
        assert_eq!(lexicon.get("bar").unwrap().doc_freq, 1);
        assert_eq!(lexicon.get("foo").unwrap().doc_freq, 3);

        assert_eq!(
            read_term(tmp.path(), &lexicon, "foo", config.postings_per_block),
            vec![Posting::new(1, 2), Posting::new(3, 5), Posting::new(5, 1)]
        );
        assert_eq!(
            read_term(tmp.path(), &lexicon, "bar", config.postings_per_block),
            vec![Posting::new(2, 1)]
        );
    }

    #[test]
    fn test_block_metadata_tiles_index_file() {
        let tmp = TempDir::new().unwrap();
        let files = write_partials(
            tmp.path(),
            &["dense 10:1 11:1 12:1 13:1 20:1 21:1\nsparse 2:1\n"],
        );

        let mut config = IndexConfig::default();
        config.postings_per_block = 4;
        let stats = merge_partial_files(&files, tmp.path(), &config).unwrap();
        assert_eq!(stats.blocks, 3);

        let table = BlockMetaTable::load(&tmp.path().join(BLOCK_META_FILE)).unwrap();
        let index_len = fs::metadata(tmp.path().join(INDEX_FILE)).unwrap().len();
        assert_eq!(table.total_bytes(), index_len);

        let last_ids: Vec<u32> = table.spans().iter().map(|span| span.last_doc_id).collect();
        assert_eq!(last_ids, vec![13, 21, 2]);
    }

    #[test]
    fn test_empty_input_produces_empty_outputs() {
        let tmp = TempDir::new().unwrap();
        let stats = merge_partial_files(&[], tmp.path(), &IndexConfig::default()).unwrap();
        assert_eq!(stats.terms, 0);
        assert_eq!(fs::metadata(tmp.path().join(INDEX_FILE)).unwrap().len(), 0);
    }

    #[test]
    fn test_list_partial_files_filters_and_sorts() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("intermediate_1.txt"), "a 1:1\n").unwrap();
        fs::write(tmp.path().join("intermediate_0.txt"), "a 1:1\n").unwrap();
        fs::write(tmp.path().join("index.bin"), b"x").unwrap();

        let files = list_partial_files(tmp.path()).unwrap();
        assert_eq!(files.len(), 2);
        assert!(files[0].ends_with("intermediate_0.txt"));
        assert!(files[1].ends_with("intermediate_1.txt"));
    }
}
