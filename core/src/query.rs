use crate::corpus::Document;
use crate::normalizer::Normalizer;
use crate::{DocId, InvertedIndex};

/// True when some query token occurs inside some title token.
fn matches(query_tokens: &[String], title_tokens: &[String]) -> bool {
    query_tokens
        .iter()
        .any(|q| title_tokens.iter().any(|t| t.contains(q.as_str())))
}

/// Scans the corpus directly, matching normalized query tokens against
/// normalized titles by substring. Matches come back in corpus order.
pub fn search_corpus<'a>(normalizer: &Normalizer, corpus: &'a [Document], query: &str) -> Vec<&'a Document> {
    let query_tokens = normalizer.normalize(query);
    if query_tokens.is_empty() {
        return Vec::new();
    }
    let hits: Vec<&Document> = corpus
        .iter()
        .filter(|doc| matches(&query_tokens, &normalizer.normalize(&doc.title)))
        .collect();
    tracing::debug!(query, ?query_tokens, hits = hits.len(), "corpus search");
    hits
}

/// Looks every whitespace-separated query term up in the index on its own.
/// Posting lists are concatenated in term order, without merging, dedup or
/// ranking; capping the result is up to the caller.
pub fn search_index(normalizer: &Normalizer, index: &InvertedIndex, query: &str) -> Vec<DocId> {
    let mut doc_ids = Vec::new();
    for term in query.split_whitespace() {
        for token in normalizer.normalize(term) {
            let postings = index.get_documents(&token);
            tracing::debug!(term, %token, hits = postings.len(), "index lookup");
            doc_ids.extend_from_slice(postings);
        }
    }
    doc_ids
}
