use serde::{Deserialize, Serialize};

use crate::tokenizer::DEFAULT_STOP_WORDS;

/// Build and query tunables
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct IndexConfig {
    /// In-memory budget (bytes) before the partial index spills to disk
    pub max_in_memory_bytes: usize,
    /// Postings per block in the final index
    pub postings_per_block: usize,
    pub tokenizer: TokenizerConfig,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            // 100 MiB
            max_in_memory_bytes: 100 * 1024 * 1024,
            postings_per_block: 64,
            tokenizer: TokenizerConfig::default(),
        }
    }
}

/// Tokenizer configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TokenizerConfig {
    /// Lowercase stop words to drop during tokenization
    pub stop_words: Vec<String>,
}

impl Default for TokenizerConfig {
    fn default() -> Self {
        Self {
            stop_words: DEFAULT_STOP_WORDS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl TokenizerConfig {
    /// A configuration that keeps every token, stop words included.
    pub fn without_stop_words() -> Self {
        Self {
            stop_words: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_configs() {
        let config = IndexConfig::default();
        assert_eq!(config.max_in_memory_bytes, 100 * 1024 * 1024);
        assert_eq!(config.postings_per_block, 64);
        assert!(config.tokenizer.stop_words.contains(&"the".to_string()));

        let empty = TokenizerConfig::without_stop_words();
        assert!(empty.stop_words.is_empty());
    }
}
