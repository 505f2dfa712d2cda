//! Offline inverted-index builder and block-structured query engine.
//!
//! The build pipeline parses a `docID \t passage` collection into sorted
//! intermediate posting files (spilled whenever an in-memory budget is
//! exhausted), then k-way-merges them into the final index: varbyte-compressed
//! posting blocks in `index.bin`, a plain-text lexicon, and a per-block
//! metadata stream that lets queries skip blocks without decoding them.

pub mod config;
pub mod error;
pub mod index;
pub mod query;
pub mod tokenizer;

pub use config::{IndexConfig, TokenizerConfig};
pub use error::{CuttleError, Result};
pub use tokenizer::Tokenizer;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
