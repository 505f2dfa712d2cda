//! Forward-only cursor over one intermediate posting file

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::PathBuf;

use crate::error::{CuttleError, Result};

use super::types::Posting;

/// Streams `(term, postings)` records from one sorted intermediate file.
///
/// The cursor is positioned on the first record after construction and
/// only moves forward; each file is read exactly once.
#[derive(Debug)]
pub struct PartialFileReader {
    reader: BufReader<File>,
    path: PathBuf,
    line_no: u64,
    term: String,
    postings: Vec<Posting>,
    exhausted: bool,
}

impl PartialFileReader {
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let file = File::open(&path)?;
        let mut reader = Self {
            reader: BufReader::new(file),
            path,
            line_no: 0,
            term: String::new(),
            postings: Vec::new(),
            exhausted: false,
        };
        reader.advance()?;
        Ok(reader)
    }

    pub fn exhausted(&self) -> bool {
        self.exhausted
    }

    /// Term under the cursor; empty once exhausted.
    pub fn term(&self) -> &str {
        &self.term
    }

    /// Postings under the cursor, in the order they were spilled.
    pub fn postings(&self) -> &[Posting] {
        &self.postings
    }

    /// Read the next `term docID:freq ...` line. Blank lines are skipped;
    /// malformed postings fail the build.
    pub fn advance(&mut self) -> Result<()> {
        let mut line = String::new();
        loop {
            line.clear();
            self.line_no += 1;
            if self.reader.read_line(&mut line)? == 0 {
                self.exhausted = true;
                self.term.clear();
                self.postings.clear();
                return Ok(());
            }
            if !line.trim().is_empty() {
                break;
            }
        }

        let mut fields = line.split_whitespace();
        let term = match fields.next() {
            Some(term) => term,
            None => return Err(self.parse_err("missing term")),
        };
        self.term.clear();
        self.term.push_str(term);

        self.postings.clear();
        for pair in fields {
            let (doc, freq) = match pair.split_once(':') {
                Some(split) => split,
                None => return Err(self.parse_err(format!("posting {pair:?} is missing ':'"))),
            };
            let doc_id = match doc.parse() {
                Ok(doc_id) => doc_id,
                Err(_) => return Err(self.parse_err(format!("bad docID {doc:?}"))),
            };
            let term_freq = match freq.parse() {
                Ok(term_freq) => term_freq,
                Err(_) => return Err(self.parse_err(format!("bad frequency {freq:?}"))),
            };
            self.postings.push(Posting::new(doc_id, term_freq));
        }

        if self.postings.is_empty() {
            return Err(self.parse_err("term line has no postings"));
        }
        Ok(())
    }

    fn parse_err(&self, reason: impl Into<String>) -> CuttleError {
        CuttleError::parse(self.path.display(), self.line_no, reason)
    }
}
