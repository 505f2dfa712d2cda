//! Page table sidecar: docID to document length in tokens
//!
//! Written while the collection is parsed; consumed by query tooling for
//! length normalization in scoring extensions.

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use crate::error::{CuttleError, Result};

use super::types::DocId;

/// File name of the sidecar within the indexer's output directory
pub const PAGE_TABLE_FILE: &str = "pagetable.tsv";

/// In-memory page table
#[derive(Debug)]
pub struct PageTable {
    lengths: HashMap<DocId, u32>,
    total_length: u64,
}

impl PageTable {
    pub fn load(path: &Path) -> Result<Self> {
        let file = File::open(path)?;
        let mut lengths = HashMap::new();
        let mut total_length = 0u64;

        for (idx, line) in BufReader::new(file).lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }

            let mut fields = line.split_whitespace();
            let parsed = (
                fields.next().and_then(|f| f.parse::<DocId>().ok()),
                fields.next().and_then(|f| f.parse::<u32>().ok()),
                fields.next(),
            );
            let (doc_id, length) = match parsed {
                (Some(doc_id), Some(length), None) => (doc_id, length),
                _ => {
                    return Err(CuttleError::parse(
                        path.display(),
                        idx as u64 + 1,
                        "expected `docID lengthInTokens`",
                    ))
                }
            };

            lengths.insert(doc_id, length);
            total_length += length as u64;
        }

        Ok(Self {
            lengths,
            total_length,
        })
    }

    /// Length in tokens of a document, if known
    pub fn get(&self, doc_id: DocId) -> Option<u32> {
        self.lengths.get(&doc_id).copied()
    }

    pub fn len(&self) -> usize {
        self.lengths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lengths.is_empty()
    }

    /// Average document length across the collection
    pub fn avg_doc_length(&self) -> f64 {
        if self.lengths.is_empty() {
            0.0
        } else {
            self.total_length as f64 / self.lengths.len() as f64
        }
    }
}

/// Streaming writer for the page table sidecar
pub struct PageTableWriter {
    out: BufWriter<File>,
}

impl PageTableWriter {
    pub fn create(path: impl AsRef<Path>) -> Result<Self> {
        Ok(Self {
            out: BufWriter::new(File::create(path)?),
        })
    }

    pub fn add(&mut self, doc_id: DocId, length: u32) -> Result<()> {
        writeln!(self.out, "{doc_id}\t{length}")?;
        Ok(())
    }

    pub fn finish(mut self) -> Result<()> {
        self.out.flush()?;
        Ok(())
    }
}
