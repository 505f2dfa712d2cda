//! Build-side components of the block-structured inverted index
//!
//! # Architecture
//!
//! - `IndexBuilder`: in-memory partial index, spilled as sorted text files
//! - `PartialFileReader`: forward-only cursor over one spilled file
//! - `merge_partial_files`: k-way merge into `index.bin` + sidecars
//! - `PostingsWriter`: block codec (delta varbyte docIDs, then frequencies)
//! - `Lexicon` / `BlockMetaTable`: plain-text sidecar files

mod lexicon;
mod merge;
mod pagetable;
mod partial;
mod postings;
mod spill;
mod types;
pub mod varbyte;

pub use lexicon::*;
pub use merge::*;
pub use pagetable::*;
pub use partial::*;
pub use postings::*;
pub use spill::*;
pub use types::*;
