//! In-memory partial index with byte-budget spilling
//!
//! Documents accumulate into a `term → postings` map until the estimated
//! size crosses the configured budget; the map is then written out as one
//! sorted intermediate file and cleared. The page table sidecar
//! (`docID \t length-in-tokens`) is emitted while the collection streams by.

use std::collections::{BTreeMap, HashMap};
use std::fs::File;
use std::io::{BufRead, BufWriter, Write};
use std::path::{Path, PathBuf};

use tracing::info;

use crate::config::IndexConfig;
use crate::error::{CuttleError, Result};
use crate::tokenizer::Tokenizer;

use super::pagetable::{PageTableWriter, PAGE_TABLE_FILE};
use super::types::{DocId, Posting};

/// Documents between progress log lines
const PROGRESS_INTERVAL: u64 = 100_000;

/// Estimated bytes per posting on top of the term text
const POSTING_OVERHEAD: usize = 8;

/// Streaming indexer producing sorted intermediate posting files
pub struct IndexBuilder {
    out_dir: PathBuf,
    max_in_memory_bytes: usize,
    tokenizer: Tokenizer,
    buffer: BTreeMap<String, Vec<Posting>>,
    buffer_bytes: usize,
    spill_files: Vec<PathBuf>,
    processed_docs: u64,
}

impl IndexBuilder {
    pub fn new(out_dir: impl Into<PathBuf>, config: &IndexConfig) -> Self {
        Self {
            out_dir: out_dir.into(),
            max_in_memory_bytes: config.max_in_memory_bytes,
            tokenizer: Tokenizer::new(&config.tokenizer),
            buffer: BTreeMap::new(),
            buffer_bytes: 0,
            spill_files: Vec::new(),
            processed_docs: 0,
        }
    }

    /// Parse a whole `docID \t passage` collection.
    ///
    /// Lines without a tab are skipped; a tabbed line whose docID is not an
    /// integer fails the build. Returns the intermediate files written, in
    /// creation order; the page table lands next to them.
    pub fn index_collection<R: BufRead>(mut self, input: R) -> Result<Vec<PathBuf>> {
        let mut page_table = PageTableWriter::create(self.out_dir.join(PAGE_TABLE_FILE))?;

        let mut line_no = 0u64;
        for line in input.lines() {
            let line = line?;
            line_no += 1;
            let Some((id_field, passage)) = line.split_once('\t') else {
                continue;
            };
            let doc_id = match id_field.parse::<DocId>() {
                Ok(doc_id) => doc_id,
                Err(_) => {
                    return Err(CuttleError::parse(
                        "collection",
                        line_no,
                        format!("bad docID {id_field:?}"),
                    ))
                }
            };

            let token_count = self.index_document(doc_id, passage)?;
            page_table.add(doc_id, token_count as u32)?;
        }

        page_table.finish()?;
        self.finish()
    }

    /// Tokenize one passage and append its postings to the accumulator.
    /// Returns the passage's token count (for the page table).
    pub fn index_document(&mut self, doc_id: DocId, passage: &str) -> Result<usize> {
        let tokens = self.tokenizer.tokenize(passage);

        let mut tally: HashMap<&str, u32> = HashMap::new();
        for token in &tokens {
            *tally.entry(token.as_str()).or_insert(0) += 1;
        }

        for (term, freq) in tally {
            self.buffer_bytes += term.len() + POSTING_OVERHEAD;
            self.buffer
                .entry(term.to_string())
                .or_default()
                .push(Posting::new(doc_id, freq));
        }

        self.processed_docs += 1;
        if self.processed_docs % PROGRESS_INTERVAL == 0 {
            info!("processed {} documents", self.processed_docs);
        }

        if self.buffer_bytes >= self.max_in_memory_bytes {
            self.spill()?;
        }
        Ok(tokens.len())
    }

    /// Flush any remaining postings and return all spilled files.
    pub fn finish(mut self) -> Result<Vec<PathBuf>> {
        self.spill()?;
        info!(
            "indexing complete: {} documents, {} intermediate files",
            self.processed_docs,
            self.spill_files.len()
        );
        Ok(self.spill_files)
    }

    pub fn processed_docs(&self) -> u64 {
        self.processed_docs
    }

    fn spill(&mut self) -> Result<()> {
        if self.buffer.is_empty() {
            return Ok(());
        }

        let path = self
            .out_dir
            .join(format!("intermediate_{}.txt", self.spill_files.len()));
        write_partial_file(&path, &self.buffer)?;
        info!("written intermediate file: {}", path.display());

        self.spill_files.push(path);
        self.buffer.clear();
        self.buffer_bytes = 0;
        Ok(())
    }
}

/// Write one partial index as `term docID:freq docID:freq ...` lines.
/// The map iterates in lexicographic term order.
fn write_partial_file(path: &Path, index: &BTreeMap<String, Vec<Posting>>) -> Result<()> {
    let mut out = BufWriter::new(File::create(path)?);
    for (term, postings) in index {
        write!(out, "{term}")?;
        for posting in postings {
            write!(out, " {}:{}", posting.doc_id, posting.term_freq)?;
        }
        out.write_all(b"\n")?;
    }
    out.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::io::Cursor;
    use tempfile::TempDir;

    #[test]
    fn test_spill_is_sorted_and_deduplicated_per_doc() {
        let tmp = TempDir::new().unwrap();
        let config = IndexConfig::default();
        let builder = IndexBuilder::new(tmp.path(), &config);

        let collection = "1\tbanana apple banana\n2\tapple cherry\n";
        let files = builder.index_collection(Cursor::new(collection)).unwrap();

        assert_eq!(files.len(), 1);
        let content = fs::read_to_string(&files[0]).unwrap();
        // One posting per (term, docID); terms in lexicographic order.
        assert_eq!(content, "apple 1:1 2:1\nbanana 1:2\ncherry 2:1\n");
    }

    #[test]
    fn test_budget_exhaustion_spills_multiple_files() {
        let tmp = TempDir::new().unwrap();
        let mut config = IndexConfig::default();
        config.max_in_memory_bytes = 1; // spill after every document

        let collection = "1\tapple\n2\tbanana\n3\tcherry\n";
        let files = IndexBuilder::new(tmp.path(), &config)
            .index_collection(Cursor::new(collection))
            .unwrap();

        assert_eq!(files.len(), 3);
        assert!(files[0].ends_with("intermediate_0.txt"));
        assert!(files[2].ends_with("intermediate_2.txt"));
        assert_eq!(fs::read_to_string(&files[1]).unwrap(), "banana 2:1\n");
    }

    #[test]
    fn test_tabless_lines_are_skipped() {
        let tmp = TempDir::new().unwrap();
        let config = IndexConfig::default();

        let collection = "no tab on this line\n7\tapple\n";
        let files = IndexBuilder::new(tmp.path(), &config)
            .index_collection(Cursor::new(collection))
            .unwrap();

        assert_eq!(files.len(), 1);
        assert_eq!(fs::read_to_string(&files[0]).unwrap(), "apple 7:1\n");
    }

    #[test]
    fn test_bad_docid_fails_the_build() {
        let tmp = TempDir::new().unwrap();
        let config = IndexConfig::default();

        // A tab is present, so this line claims to be a document.
        let collection = "7\tapple\nnot_a_number\tbanana\n";
        let err = IndexBuilder::new(tmp.path(), &config)
            .index_collection(Cursor::new(collection))
            .unwrap_err();

        assert!(matches!(err, CuttleError::Parse { .. }));
        assert!(err.to_string().contains("bad docID"));
    }

    #[test]
    fn test_page_table_sidecar() {
        let tmp = TempDir::new().unwrap();
        let config = IndexConfig::default();

        // Stop words do not count toward the document length.
        let collection = "3\tthe quick fox\n5\t\n";
        IndexBuilder::new(tmp.path(), &config)
            .index_collection(Cursor::new(collection))
            .unwrap();

        let content = fs::read_to_string(tmp.path().join(PAGE_TABLE_FILE)).unwrap();
        assert_eq!(content, "3\t2\n5\t0\n");
    }
}
