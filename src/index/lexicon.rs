//! Lexicon and block-metadata sidecar files
//!
//! Both files are plain ASCII for debuggability, and together they are the
//! only way to recover structure from the headerless `index.bin`:
//! `term offset length docFreq` per lexicon line, `length lastDocID` per
//! block line. A block's absolute offset is the running sum of the block
//! lengths before it, which tile the index file exactly.

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use crate::error::{CuttleError, Result};

use super::types::{BlockMeta, DocId, LexiconEntry};

/// Term directory for the final index
///
/// Keeps file order for ordered dumps alongside a hash lookup; entries are
/// validated to be strictly ascending and to tile contiguously from 0.
#[derive(Debug)]
pub struct Lexicon {
    terms: HashMap<String, usize>,
    entries: Vec<(String, LexiconEntry)>,
}

impl Lexicon {
    pub fn load(path: &Path) -> Result<Self> {
        let file = File::open(path)?;
        let mut terms = HashMap::new();
        let mut entries: Vec<(String, LexiconEntry)> = Vec::new();

        for (idx, line) in BufReader::new(file).lines().enumerate() {
            let line = line?;
            let line_no = idx as u64 + 1;
            if line.trim().is_empty() {
                continue;
            }

            let mut fields = line.split_whitespace();
            let parsed = (
                fields.next(),
                fields.next().and_then(|f| f.parse::<u64>().ok()),
                fields.next().and_then(|f| f.parse::<u32>().ok()),
                fields.next().and_then(|f| f.parse::<u32>().ok()),
                fields.next(),
            );
            let (term, offset, length, doc_freq) = match parsed {
                (Some(term), Some(offset), Some(length), Some(doc_freq), None) => {
                    (term, offset, length, doc_freq)
                }
                _ => {
                    return Err(CuttleError::parse(
                        path.display(),
                        line_no,
                        "expected `term offset length docFreq`",
                    ))
                }
            };

            match entries.last() {
                Some((prev_term, prev)) => {
                    if term <= prev_term.as_str() {
                        return Err(CuttleError::Invariant(format!(
                            "lexicon terms out of order: {term:?} after {prev_term:?}"
                        )));
                    }
                    if offset != prev.offset + prev.length as u64 {
                        return Err(CuttleError::Invariant(format!(
                            "lexicon does not tile: {term:?} starts at {offset}, expected {}",
                            prev.offset + prev.length as u64
                        )));
                    }
                }
                None => {
                    if offset != 0 {
                        return Err(CuttleError::Invariant(format!(
                            "first lexicon entry starts at {offset}, expected 0"
                        )));
                    }
                }
            }

            terms.insert(term.to_string(), entries.len());
            entries.push((
                term.to_string(),
                LexiconEntry {
                    offset,
                    length,
                    doc_freq,
                },
            ));
        }

        Ok(Self { terms, entries })
    }

    pub fn get(&self, term: &str) -> Option<&LexiconEntry> {
        self.terms.get(term).map(|&idx| &self.entries[idx].1)
    }

    pub fn contains(&self, term: &str) -> bool {
        self.terms.contains_key(term)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate entries in file (lexicographic) order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &LexiconEntry)> {
        self.entries.iter().map(|(term, entry)| (term.as_str(), entry))
    }

    /// End of the last region, which must equal the index file size
    pub fn total_bytes(&self) -> u64 {
        self.entries
            .last()
            .map(|(_, entry)| entry.offset + entry.length as u64)
            .unwrap_or(0)
    }
}

/// Streaming writer for `lexicon.txt`
pub struct LexiconWriter {
    out: BufWriter<File>,
}

impl LexiconWriter {
    pub fn create(path: impl AsRef<Path>) -> Result<Self> {
        Ok(Self {
            out: BufWriter::new(File::create(path)?),
        })
    }

    pub fn add(&mut self, term: &str, entry: LexiconEntry) -> Result<()> {
        writeln!(
            self.out,
            "{} {} {} {}",
            term, entry.offset, entry.length, entry.doc_freq
        )?;
        Ok(())
    }

    pub fn finish(mut self) -> Result<()> {
        self.out.flush()?;
        Ok(())
    }
}

/// One block's metadata plus its absolute offset in the index file
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BlockSpan {
    pub offset: u64,
    pub length: u32,
    pub last_doc_id: DocId,
}

/// Block-metadata stream with prefix-summed absolute offsets
#[derive(Debug)]
pub struct BlockMetaTable {
    spans: Vec<BlockSpan>,
}

impl BlockMetaTable {
    pub fn load(path: &Path) -> Result<Self> {
        let file = File::open(path)?;
        let mut spans = Vec::new();
        let mut offset = 0u64;

        for (idx, line) in BufReader::new(file).lines().enumerate() {
            let line = line?;
            let line_no = idx as u64 + 1;
            if line.trim().is_empty() {
                continue;
            }

            let mut fields = line.split_whitespace();
            let parsed = (
                fields.next().and_then(|f| f.parse::<u32>().ok()),
                fields.next().and_then(|f| f.parse::<DocId>().ok()),
                fields.next(),
            );
            let (length, last_doc_id) = match parsed {
                (Some(length), Some(last_doc_id), None) => (length, last_doc_id),
                _ => {
                    return Err(CuttleError::parse(
                        path.display(),
                        line_no,
                        "expected `length lastDocID`",
                    ))
                }
            };

            spans.push(BlockSpan {
                offset,
                length,
                last_doc_id,
            });
            offset += length as u64;
        }

        Ok(Self { spans })
    }

    pub fn spans(&self) -> &[BlockSpan] {
        &self.spans
    }

    pub fn len(&self) -> usize {
        self.spans.len()
    }

    pub fn is_empty(&self) -> bool {
        self.spans.is_empty()
    }

    /// Total bytes covered, which must equal the index file size
    pub fn total_bytes(&self) -> u64 {
        self.spans
            .last()
            .map(|span| span.offset + span.length as u64)
            .unwrap_or(0)
    }

    /// Index of the block starting exactly at `offset`
    pub fn block_at_offset(&self, offset: u64) -> Option<usize> {
        self.spans
            .binary_search_by_key(&offset, |span| span.offset)
            .ok()
    }
}

/// Streaming writer for `blockMetaData.txt`
pub struct BlockMetaWriter {
    out: BufWriter<File>,
}

impl BlockMetaWriter {
    pub fn create(path: impl AsRef<Path>) -> Result<Self> {
        Ok(Self {
            out: BufWriter::new(File::create(path)?),
        })
    }

    pub fn add(&mut self, meta: &BlockMeta) -> Result<()> {
        writeln!(self.out, "{} {}", meta.length, meta.last_doc_id)?;
        Ok(())
    }

    pub fn finish(mut self) -> Result<()> {
        self.out.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write_and_load_lexicon(content: &str) -> Result<Lexicon> {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("lexicon.txt");
        std::fs::write(&path, content).unwrap();
        Lexicon::load(&path)
    }

    #[test]
    fn test_lexicon_round_trip() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("lexicon.txt");

        let mut writer = LexiconWriter::create(&path).unwrap();
        writer
            .add(
                "apple",
                LexiconEntry {
                    offset: 0,
                    length: 10,
                    doc_freq: 3,
                },
            )
            .unwrap();
        writer
            .add(
                "banana",
                LexiconEntry {
                    offset: 10,
                    length: 4,
                    doc_freq: 1,
                },
            )
            .unwrap();
        writer.finish().unwrap();

        let lexicon = Lexicon::load(&path).unwrap();
        assert_eq!(lexicon.len(), 2);
        assert_eq!(lexicon.get("apple").unwrap().doc_freq, 3);
        assert_eq!(lexicon.get("banana").unwrap().offset, 10);
        assert!(!lexicon.contains("cherry"));
        assert_eq!(lexicon.total_bytes(), 14);

        let terms: Vec<&str> = lexicon.iter().map(|(term, _)| term).collect();
        assert_eq!(terms, vec!["apple", "banana"]);
    }

    #[test]
    fn test_lexicon_rejects_unordered_terms() {
        let err = write_and_load_lexicon("b 0 4 1\na 4 4 1\n").unwrap_err();
        assert!(err.to_string().contains("out of order"));
    }

    #[test]
    fn test_lexicon_rejects_gaps() {
        let err = write_and_load_lexicon("a 0 4 1\nb 5 4 1\n").unwrap_err();
        assert!(err.to_string().contains("does not tile"));
    }

    #[test]
    fn test_lexicon_rejects_bad_lines() {
        let err = write_and_load_lexicon("a 0 four 1\n").unwrap_err();
        assert!(matches!(err, CuttleError::Parse { .. }));
    }

    #[test]
    fn test_block_meta_prefix_sum() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("blockMetaData.txt");

        let mut writer = BlockMetaWriter::create(&path).unwrap();
        for meta in [
            BlockMeta {
                length: 8,
                last_doc_id: 13,
            },
            BlockMeta {
                length: 2,
                last_doc_id: 21,
            },
            BlockMeta {
                length: 5,
                last_doc_id: 4,
            },
        ] {
            writer.add(&meta).unwrap();
        }
        writer.finish().unwrap();

        let table = BlockMetaTable::load(&path).unwrap();
        assert_eq!(table.len(), 3);
        assert_eq!(table.total_bytes(), 15);
        assert_eq!(
            table.spans()[1],
            BlockSpan {
                offset: 8,
                length: 2,
                last_doc_id: 21
            }
        );
        assert_eq!(table.block_at_offset(10), Some(2));
        assert_eq!(table.block_at_offset(9), None);
    }
}
