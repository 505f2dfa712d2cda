//! Index accessor for query execution
//!
//! Loads the lexicon and block metadata up front and keeps one read handle
//! on the index file. Opening a term reads its exact byte region;
//! `next_geq` then skips whole blocks through the metadata and decodes at
//! most one candidate block per call.

use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::Path;

use crate::error::{CuttleError, Result};
use crate::index::{
    decode_block, BlockMetaTable, DocId, Lexicon, Posting, BLOCK_META_FILE, INDEX_FILE,
    LEXICON_FILE,
};

/// Read-side view of one final index directory
#[derive(Debug)]
pub struct IndexAccessor {
    lexicon: Lexicon,
    block_meta: BlockMetaTable,
    index: File,
}

impl IndexAccessor {
    /// Open `index.bin`, `lexicon.txt` and `blockMetaData.txt` in `dir`,
    /// verifying that both sidecars cover the index file exactly.
    pub fn open(dir: &Path) -> Result<Self> {
        let lexicon = Lexicon::load(&dir.join(LEXICON_FILE))?;
        let block_meta = BlockMetaTable::load(&dir.join(BLOCK_META_FILE))?;
        let index = File::open(dir.join(INDEX_FILE))?;

        let index_len = index.metadata()?.len();
        if block_meta.total_bytes() != index_len {
            return Err(CuttleError::Invariant(format!(
                "block metadata covers {} bytes but the index file holds {}",
                block_meta.total_bytes(),
                index_len
            )));
        }
        if lexicon.total_bytes() != index_len {
            return Err(CuttleError::Invariant(format!(
                "lexicon covers {} bytes but the index file holds {}",
                lexicon.total_bytes(),
                index_len
            )));
        }

        Ok(Self {
            lexicon,
            block_meta,
            index,
        })
    }

    pub fn lexicon(&self) -> &Lexicon {
        &self.lexicon
    }

    pub fn term_count(&self) -> usize {
        self.lexicon.len()
    }

    /// Read a term's byte region and position a cursor on its first block.
    pub fn open_list(&mut self, term: &str) -> Result<PostingList> {
        let entry = *self
            .lexicon
            .get(term)
            .ok_or_else(|| CuttleError::TermNotFound(term.to_string()))?;

        self.index.seek(SeekFrom::Start(entry.offset))?;
        let mut data = vec![0u8; entry.length as usize];
        self.index.read_exact(&mut data)?;

        let first = self.block_meta.block_at_offset(entry.offset).ok_or_else(|| {
            CuttleError::Invariant(format!(
                "no block starts at offset {} for term {term:?}",
                entry.offset
            ))
        })?;

        // Collect the spans tiling exactly this region, with region-relative
        // starting positions.
        let mut blocks = Vec::new();
        let mut covered = 0u64;
        for span in &self.block_meta.spans()[first..] {
            if covered >= entry.length as u64 {
                break;
            }
            blocks.push(TermBlock {
                start: covered as usize,
                length: span.length,
                last_doc_id: span.last_doc_id,
            });
            covered += span.length as u64;
        }
        if covered != entry.length as u64 {
            return Err(CuttleError::Invariant(format!(
                "block metadata does not tile the region of {term:?}"
            )));
        }

        Ok(PostingList {
            term: term.to_string(),
            doc_freq: entry.doc_freq,
            data,
            blocks,
            cursor: 0,
            decoded: None,
            blocks_decoded: 0,
        })
    }
}

/// Stable-sort opened lists by document frequency, shortest first — the
/// standard order for multi-term intersection.
pub fn sort_lists_by_length(lists: &mut [PostingList]) {
    lists.sort_by_key(|list| list.doc_freq());
}

/// One block's metadata within an opened term region
#[derive(Clone, Copy, Debug)]
struct TermBlock {
    start: usize,
    length: u32,
    last_doc_id: DocId,
}

#[derive(Debug)]
struct DecodedBlock {
    index: usize,
    doc_ids: Vec<DocId>,
    term_freqs: Vec<u32>,
}

/// One term's byte region with a forward block cursor
#[derive(Debug)]
pub struct PostingList {
    term: String,
    doc_freq: u32,
    data: Vec<u8>,
    blocks: Vec<TermBlock>,
    cursor: usize,
    decoded: Option<DecodedBlock>,
    blocks_decoded: u64,
}

impl PostingList {
    pub fn term(&self) -> &str {
        &self.term
    }

    pub fn doc_freq(&self) -> u32 {
        self.doc_freq
    }

    /// Blocks decoded so far; skipping via metadata does not count.
    pub fn blocks_decoded(&self) -> u64 {
        self.blocks_decoded
    }

    /// Smallest posting with docID ≥ `target`, or `None` once the target is
    /// past the list's last docID.
    ///
    /// The cursor only moves forward, so with non-decreasing targets each
    /// block is decoded at most once.
    pub fn next_geq(&mut self, target: DocId) -> Result<Option<Posting>> {
        while self.cursor < self.blocks.len() && self.blocks[self.cursor].last_doc_id < target {
            self.cursor += 1;
        }
        if self.cursor >= self.blocks.len() {
            return Ok(None);
        }

        if self
            .decoded
            .as_ref()
            .map_or(true, |decoded| decoded.index != self.cursor)
        {
            self.decode_current_block()?;
        }
        let decoded = match &self.decoded {
            Some(decoded) => decoded,
            None => return Ok(None),
        };

        let pos = decoded.doc_ids.partition_point(|&doc_id| doc_id < target);
        match decoded.doc_ids.get(pos) {
            Some(&doc_id) => Ok(Some(Posting::new(doc_id, decoded.term_freqs[pos]))),
            None => Ok(None),
        }
    }

    fn decode_current_block(&mut self) -> Result<()> {
        let block = self.blocks[self.cursor];
        let prev_last_doc = if self.cursor == 0 {
            0
        } else {
            self.blocks[self.cursor - 1].last_doc_id
        };

        let bytes = &self.data[block.start..block.start + block.length as usize];
        let (doc_ids, term_freqs) = decode_block(bytes, prev_last_doc)?;

        if doc_ids.last().copied() != Some(block.last_doc_id) {
            return Err(CuttleError::Invariant(format!(
                "decoded block of {:?} does not end at docID {}",
                self.term, block.last_doc_id
            )));
        }

        self.blocks_decoded += 1;
        self.decoded = Some(DecodedBlock {
            index: self.cursor,
            doc_ids,
            term_freqs,
        });
        Ok(())
    }
}
