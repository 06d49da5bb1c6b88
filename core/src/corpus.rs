use crate::DocId;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// A movie record as it appears in the corpus file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    pub id: DocId,
    pub title: String,
    pub description: String,
}

impl Document {
    pub fn new(id: DocId, title: impl Into<String>, description: impl Into<String>) -> Self {
        Self { id, title: title.into(), description: description.into() }
    }

    /// Indexed body: title followed by description.
    pub fn text(&self) -> String {
        format!("{} {}", self.title, self.description)
    }
}

#[derive(Deserialize)]
struct MovieFile {
    movies: Vec<Document>,
}

/// Reads a `{"movies": [...]}` JSON file.
pub fn load_movies<P: AsRef<Path>>(path: P) -> Result<Vec<Document>> {
    let path = path.as_ref();
    let f = File::open(path).with_context(|| format!("opening corpus {}", path.display()))?;
    let file: MovieFile = serde_json::from_reader(BufReader::new(f))
        .with_context(|| format!("parsing corpus {}", path.display()))?;
    tracing::debug!(path = %path.display(), num_docs = file.movies.len(), "loaded corpus");
    Ok(file.movies)
}

pub fn titles_by_id(corpus: &[Document]) -> HashMap<DocId, &str> {
    corpus.iter().map(|d| (d.id, d.title.as_str())).collect()
}
