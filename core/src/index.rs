use crate::corpus::Document;
use crate::normalizer::Normalizer;
use crate::persist::{self, SnapshotPaths};
use crate::IndexError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

pub type DocId = u32;

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvertedIndex {
    /// token -> ids of the documents containing it, ascending, each id once
    pub index: HashMap<String, Vec<DocId>>,
    /// doc id -> its normalized tokens, in text order
    pub docmap: HashMap<DocId, Vec<String>>,
}

impl InvertedIndex {
    pub fn new() -> Self { Self::default() }

    /// Rebuilds from scratch; whatever was in memory before is dropped.
    pub fn build(&mut self, normalizer: &Normalizer, corpus: &[Document]) {
        let mut index: HashMap<String, Vec<DocId>> = HashMap::new();
        let mut docmap: HashMap<DocId, Vec<String>> = HashMap::new();

        for doc in corpus {
            let tokens = normalizer.normalize(&doc.text());
            for token in &tokens {
                let postings = index.entry(token.clone()).or_default();
                if postings.last() != Some(&doc.id) {
                    postings.push(doc.id);
                }
            }
            docmap.insert(doc.id, tokens);
        }

        // Corpus order need not follow id order.
        for postings in index.values_mut() {
            postings.sort_unstable();
            postings.dedup();
        }

        self.index = index;
        self.docmap = docmap;
        tracing::info!(num_docs = self.num_docs(), num_tokens = self.num_tokens(), "built index");
    }

    pub fn get_documents(&self, token: &str) -> &[DocId] {
        self.index.get(token).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn get_tokens(&self, doc_id: DocId) -> Option<&[String]> {
        self.docmap.get(&doc_id).map(Vec::as_slice)
    }

    pub fn num_docs(&self) -> usize { self.docmap.len() }

    pub fn num_tokens(&self) -> usize { self.index.len() }

    pub fn is_empty(&self) -> bool { self.docmap.is_empty() }

    pub fn save(&self, paths: &SnapshotPaths) -> Result<(), IndexError> {
        persist::save_snapshot(paths, self)
    }

    /// Replaces the in-memory state with the snapshot at `paths`. On error
    /// the current state is kept as is.
    pub fn load(&mut self, paths: &SnapshotPaths) -> Result<(), IndexError> {
        *self = persist::load_snapshot(paths)?;
        Ok(())
    }
}
