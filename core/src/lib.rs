//! Keyword search over a movie corpus: text normalization, an inverted index
//! persisted as a single snapshot, and query matching.

pub mod corpus;
pub mod error;
pub mod index;
pub mod normalizer;
pub mod persist;
pub mod query;

pub use corpus::Document;
pub use error::IndexError;
pub use index::{DocId, InvertedIndex};
pub use normalizer::{Normalizer, Stem, StopWords};
pub use persist::SnapshotPaths;
