//! Core types for the block-structured index

use serde::{Deserialize, Serialize};

/// Document identifier as it appears in the collection file
pub type DocId = u32;

/// A single posting entry within a posting list
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Posting {
    /// Document containing the term
    pub doc_id: DocId,
    /// Term frequency in this document
    pub term_freq: u32,
}

impl Posting {
    pub fn new(doc_id: DocId, term_freq: u32) -> Self {
        Self { doc_id, term_freq }
    }
}

/// Lexicon entry: one term's byte region in the index file
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LexiconEntry {
    /// Starting byte offset of the region
    pub offset: u64,
    /// Region length in bytes
    pub length: u32,
    /// Number of distinct documents containing the term
    pub doc_freq: u32,
}

/// Per-block metadata: byte length and last absolute docID
///
/// A block's absolute offset is implied by the running sum of the lengths
/// before it; blocks tile the index file exactly.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockMeta {
    pub length: u32,
    pub last_doc_id: DocId,
}

/// A block of postings being assembled, capped at the configured block size
#[derive(Clone, Debug)]
pub struct PostingBlock {
    pub doc_ids: Vec<DocId>,
    pub term_freqs: Vec<u32>,
    capacity: usize,
}

impl PostingBlock {
    pub fn new(capacity: usize) -> Self {
        Self {
            doc_ids: Vec::with_capacity(capacity),
            term_freqs: Vec::with_capacity(capacity),
            capacity,
        }
    }

    pub fn push(&mut self, posting: Posting) {
        self.doc_ids.push(posting.doc_id);
        self.term_freqs.push(posting.term_freq);
    }

    pub fn is_full(&self) -> bool {
        self.doc_ids.len() >= self.capacity
    }

    pub fn is_empty(&self) -> bool {
        self.doc_ids.is_empty()
    }

    pub fn len(&self) -> usize {
        self.doc_ids.len()
    }

    pub fn last_doc_id(&self) -> Option<DocId> {
        self.doc_ids.last().copied()
    }

    pub fn clear(&mut self) {
        self.doc_ids.clear();
        self.term_freqs.clear();
    }
}
