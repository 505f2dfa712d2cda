//! Passage tokenizer: alphanumeric runs, lowercased, ASCII-only.
//!
//! Any non-alphanumeric character terminates the current token. A finished
//! token is kept only if it is pure ASCII (so `café` is dropped whole, not
//! truncated to `caf`) and not in the stop-word set.

use std::collections::{HashMap, HashSet};

use crate::config::TokenizerConfig;

/// Default English stop-word list
pub const DEFAULT_STOP_WORDS: &[&str] = &[
    "the", "is", "at", "which", "on", "and", "a", "an", "of", "or", "in", "to", "with", "was",
    "as", "by", "for", "from", "that", "this", "it", "its", "be", "are", "but", "not", "have",
    "has", "had", "were", "been", "their", "they", "them",
];

/// Text tokenizer with stop-word removal
pub struct Tokenizer {
    stop_words: HashSet<String>,
}

impl Tokenizer {
    /// Create a new tokenizer from configuration
    pub fn new(config: &TokenizerConfig) -> Self {
        Self {
            stop_words: config.stop_words.iter().cloned().collect(),
        }
    }

    /// Tokenize a passage into an ordered list of terms
    pub fn tokenize(&self, text: &str) -> Vec<String> {
        let mut tokens = Vec::new();
        let mut token = String::new();

        for ch in text.chars() {
            if ch.is_alphanumeric() {
                token.push(ch.to_ascii_lowercase());
            } else if !token.is_empty() {
                self.emit(&mut token, &mut tokens);
            }
        }
        if !token.is_empty() {
            self.emit(&mut token, &mut tokens);
        }

        tokens
    }

    /// Compute term frequencies for a tokenized passage
    pub fn term_frequencies(&self, text: &str) -> HashMap<String, u32> {
        let mut freq = HashMap::new();
        for token in self.tokenize(text) {
            *freq.entry(token).or_insert(0) += 1;
        }
        freq
    }

    fn emit(&self, token: &mut String, tokens: &mut Vec<String>) {
        if token.is_ascii() && !self.stop_words.contains(token.as_str()) {
            tokens.push(std::mem::take(token));
        } else {
            token.clear();
        }
    }
}

impl Default for Tokenizer {
    fn default() -> Self {
        Self::new(&TokenizerConfig::default())
    }
}
