//! Block codec for posting lists
//!
//! A posting list is stored as consecutive blocks of up to
//! `postings_per_block` postings. Each block is two concatenated varbyte
//! runs: all docID deltas first, then all term frequencies. The first delta
//! of a block is relative to the previous block's last absolute docID (0 for
//! the term's first block), so a block can be decoded knowing only that one
//! value. Block boundaries live in the companion metadata stream, not in the
//! index file itself.

use std::mem;

use crate::error::{CuttleError, Result};

use super::types::{BlockMeta, DocId, Posting, PostingBlock};
use super::varbyte;

/// Encoded byte region for one term, with its per-block metadata
#[derive(Clone, Debug)]
pub struct EncodedPostings {
    pub data: Vec<u8>,
    pub blocks: Vec<BlockMeta>,
    pub doc_freq: u32,
}

/// Writer that block-encodes one posting list at a time
///
/// Reusable across terms: `start_posting_list`, `add_posting` in ascending
/// docID order, then `finish_posting_list` to take the encoded region.
pub struct PostingsWriter {
    data: Vec<u8>,
    blocks: Vec<BlockMeta>,
    current: PostingBlock,
    prev_last_doc: DocId,
    last_doc: Option<DocId>,
    doc_freq: u32,
}

impl PostingsWriter {
    pub fn new(postings_per_block: usize) -> Self {
        Self {
            data: Vec::new(),
            blocks: Vec::new(),
            current: PostingBlock::new(postings_per_block),
            prev_last_doc: 0,
            last_doc: None,
            doc_freq: 0,
        }
    }

    /// Start writing a new posting list
    pub fn start_posting_list(&mut self) {
        self.data.clear();
        self.blocks.clear();
        self.current.clear();
        self.prev_last_doc = 0;
        self.last_doc = None;
        self.doc_freq = 0;
    }

    /// Add a posting to the current list; docIDs must be strictly increasing.
    pub fn add_posting(&mut self, posting: Posting) -> Result<()> {
        if let Some(last) = self.last_doc {
            if posting.doc_id <= last {
                return Err(CuttleError::Invariant(format!(
                    "docIDs must be strictly increasing: {} after {}",
                    posting.doc_id, last
                )));
            }
        }
        self.last_doc = Some(posting.doc_id);
        self.doc_freq += 1;
        self.current.push(posting);

        if self.current.is_full() {
            self.flush_block();
        }
        Ok(())
    }

    /// Finish the current posting list and take its encoded region.
    pub fn finish_posting_list(&mut self) -> EncodedPostings {
        if !self.current.is_empty() {
            self.flush_block();
        }

        let encoded = EncodedPostings {
            data: mem::take(&mut self.data),
            blocks: mem::take(&mut self.blocks),
            doc_freq: self.doc_freq,
        };
        self.prev_last_doc = 0;
        self.last_doc = None;
        self.doc_freq = 0;
        encoded
    }

    fn flush_block(&mut self) {
        let last = match self.current.last_doc_id() {
            Some(last) => last,
            None => return,
        };

        let start = self.data.len();

        let mut prev = self.prev_last_doc;
        for &doc_id in &self.current.doc_ids {
            varbyte::encode(doc_id - prev, &mut self.data);
            prev = doc_id;
        }
        for &tf in &self.current.term_freqs {
            varbyte::encode(tf, &mut self.data);
        }

        self.blocks.push(BlockMeta {
            length: (self.data.len() - start) as u32,
            last_doc_id: last,
        });
        self.prev_last_doc = last;
        self.current.clear();
    }
}

/// Decode one block's byte payload into absolute docIDs and frequencies.
///
/// The payload is a single varbyte run whose first half is docID deltas and
/// second half term frequencies; `prev_last_doc` anchors the prefix sum.
pub fn decode_block(data: &[u8], prev_last_doc: DocId) -> Result<(Vec<DocId>, Vec<u32>)> {
    let values = varbyte::decode_all(data)
        .map_err(|e| CuttleError::Invariant(format!("undecodable posting block: {e}")))?;
    if values.len() % 2 != 0 {
        return Err(CuttleError::Invariant(format!(
            "posting block holds {} integers, expected an even count",
            values.len()
        )));
    }

    let count = values.len() / 2;
    let mut doc_ids = Vec::with_capacity(count);
    let mut prev = prev_last_doc;
    for &delta in &values[..count] {
        prev = prev
            .checked_add(delta)
            .ok_or_else(|| CuttleError::Invariant("docID overflows u32".to_string()))?;
        doc_ids.push(prev);
    }
    let term_freqs = values[count..].to_vec();

    Ok((doc_ids, term_freqs))
}

/// Decode a whole term region given its document frequency and the block
/// size it was written with. Used by the reverse dump and invariant checks.
pub fn decode_list(data: &[u8], doc_freq: u32, postings_per_block: usize) -> Result<Vec<Posting>> {
    let mut postings = Vec::with_capacity(doc_freq as usize);
    let mut pos = 0usize;
    let mut prev: DocId = 0;
    let mut remaining = doc_freq as usize;

    while remaining > 0 {
        let count = remaining.min(postings_per_block);

        let mut doc_ids = Vec::with_capacity(count);
        for _ in 0..count {
            let delta = varbyte::decode(data, &mut pos)
                .map_err(|e| CuttleError::Invariant(format!("undecodable posting region: {e}")))?;
            prev = prev
                .checked_add(delta)
                .ok_or_else(|| CuttleError::Invariant("docID overflows u32".to_string()))?;
            doc_ids.push(prev);
        }
        for doc_id in doc_ids {
            let tf = varbyte::decode(data, &mut pos)
                .map_err(|e| CuttleError::Invariant(format!("undecodable posting region: {e}")))?;
            postings.push(Posting::new(doc_id, tf));
        }

        remaining -= count;
    }

    if pos != data.len() {
        return Err(CuttleError::Invariant(format!(
            "posting region has {} trailing bytes",
            data.len() - pos
        )));
    }
    Ok(postings)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encode(postings: &[(DocId, u32)], postings_per_block: usize) -> EncodedPostings {
        let mut writer = PostingsWriter::new(postings_per_block);
        writer.start_posting_list();
        for &(doc_id, tf) in postings {
            writer.add_posting(Posting::new(doc_id, tf)).unwrap();
        }
        writer.finish_posting_list()
    }

    #[test]
    fn test_block_boundary_deltas() {
        let encoded = encode(&[(10, 1), (11, 2), (12, 1), (13, 3), (20, 1), (21, 4)], 4);

        assert_eq!(encoded.doc_freq, 6);
        assert_eq!(encoded.blocks.len(), 2);
        assert_eq!(encoded.blocks[0].last_doc_id, 13);
        assert_eq!(encoded.blocks[1].last_doc_id, 21);

        // First block: deltas 10,1,1,1 then freqs 1,2,1,3 — one byte each.
        assert_eq!(encoded.blocks[0].length, 8);
        let first = &encoded.data[..8];
        assert_eq!(first, &[10, 1, 1, 1, 1, 2, 1, 3]);

        // Second block restarts its delta chain from 13.
        let (doc_ids, freqs) = decode_block(&encoded.data[8..], 13).unwrap();
        assert_eq!(doc_ids, vec![20, 21]);
        assert_eq!(freqs, vec![1, 4]);
    }

    #[test]
    fn test_lexicon_length_is_block_length_sum() {
        let postings: Vec<(DocId, u32)> = (0..200).map(|i| (i * 3 + 1, i % 7 + 1)).collect();
        let encoded = encode(&postings, 64);

        let total: u32 = encoded.blocks.iter().map(|b| b.length).sum();
        assert_eq!(total as usize, encoded.data.len());
        assert_eq!(encoded.blocks.len(), 4); // 64 + 64 + 64 + 8
        assert_eq!(encoded.blocks[3].last_doc_id, 199 * 3 + 1);
    }

    #[test]
    fn test_decode_list_round_trip() {
        let postings: Vec<(DocId, u32)> = (0..150).map(|i| (i * 2, i + 1)).collect();
        let encoded = encode(&postings, 64);

        let decoded = decode_list(&encoded.data, encoded.doc_freq, 64).unwrap();
        assert_eq!(decoded.len(), 150);
        assert_eq!(decoded[0], Posting::new(0, 1));
        assert_eq!(decoded[149], Posting::new(298, 150));
    }

    #[test]
    fn test_non_monotone_docids_rejected() {
        let mut writer = PostingsWriter::new(64);
        writer.start_posting_list();
        writer.add_posting(Posting::new(5, 1)).unwrap();
        assert!(writer.add_posting(Posting::new(5, 1)).is_err());
        assert!(writer.add_posting(Posting::new(3, 1)).is_err());
    }

    #[test]
    fn test_writer_is_reusable() {
        let mut writer = PostingsWriter::new(64);

        writer.start_posting_list();
        writer.add_posting(Posting::new(7, 1)).unwrap();
        let first = writer.finish_posting_list();

        writer.start_posting_list();
        writer.add_posting(Posting::new(7, 2)).unwrap();
        let second = writer.finish_posting_list();

        // Same docID re-encodes to the same delta after the reset.
        assert_eq!(first.blocks[0].last_doc_id, 7);
        assert_eq!(second.blocks[0].last_doc_id, 7);
        let (doc_ids, freqs) = decode_block(&second.data, 0).unwrap();
        assert_eq!(doc_ids, vec![7]);
        assert_eq!(freqs, vec![2]);
    }

    #[test]
    fn test_decode_block_rejects_odd_counts() {
        let mut data = Vec::new();
        for value in [1u32, 2, 3] {
            varbyte::encode(value, &mut data);
        }
        assert!(decode_block(&data, 0).is_err());
    }
}
