//! docqa-text
//!
//! Sparse side of the corpus store: tantivy text analysis, BM25 statistics
//! and the persisted lexical index blob.

pub mod analyzer;
pub mod lexical;
pub mod store;

pub use analyzer::LexicalAnalyzer;
pub use lexical::{Bm25Stats, LexicalIndex};
pub use store::StagedIndex;
