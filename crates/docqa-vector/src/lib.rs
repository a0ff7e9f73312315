//! docqa-vector
//!
//! Dense side of the corpus store, persisted in LanceDB.

pub mod index;
pub mod schema;
pub mod search;
pub mod table;
pub mod writer;

pub use index::LanceDenseIndex;
