use crate::{InvertedIndex, IndexError};
use lazy_static::lazy_static;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use time::format_description::well_known::Rfc3339;

pub const FORMAT_VERSION: u32 = 1;
pub const DEFAULT_CACHE_DIR: &str = "cache";

lazy_static! {
    // Serializes save against load inside one process. Other processes are not coordinated.
    static ref SNAPSHOT_LOCK: RwLock<()> = RwLock::new(());
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotMeta {
    pub version: u32,
    pub created_at: String,
    pub num_docs: u32,
    pub num_tokens: u32,
}

#[derive(Serialize)]
struct SnapshotRef<'a> {
    meta: SnapshotMeta,
    index: &'a InvertedIndex,
}

#[derive(Deserialize)]
struct Snapshot {
    meta: SnapshotMeta,
    index: InvertedIndex,
}

#[derive(Debug, Clone)]
pub struct SnapshotPaths {
    pub root: PathBuf,
}

impl Default for SnapshotPaths {
    fn default() -> Self { Self::new(DEFAULT_CACHE_DIR) }
}

impl SnapshotPaths {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self { root: root.as_ref().to_path_buf() }
    }
    pub fn snapshot(&self) -> PathBuf { self.root.join("index.bin") }
}

fn io_err(path: &Path) -> impl FnOnce(io::Error) -> IndexError + '_ {
    move |source| IndexError::Io { path: path.to_path_buf(), source }
}

fn header_count(what: &'static str, count: usize) -> Result<u32, IndexError> {
    u32::try_from(count).map_err(|_| IndexError::TooLarge { what, count })
}

/// Writes token map and document map as one record. Each save goes through
/// its own uniquely named temp file in the snapshot directory, which is then
/// renamed over the previous snapshot.
pub fn save_snapshot(paths: &SnapshotPaths, index: &InvertedIndex) -> Result<(), IndexError> {
    let meta = SnapshotMeta {
        version: FORMAT_VERSION,
        created_at: time::OffsetDateTime::now_utc().format(&Rfc3339)?,
        num_docs: header_count("documents", index.num_docs())?,
        num_tokens: header_count("tokens", index.num_tokens())?,
    };
    let bytes = bincode::serialize(&SnapshotRef { meta, index })?;

    let _guard = SNAPSHOT_LOCK.write();
    fs::create_dir_all(&paths.root).map_err(io_err(&paths.root))?;
    // Dropped (and removed) on any early return.
    let mut temp = NamedTempFile::new_in(&paths.root).map_err(io_err(&paths.root))?;
    temp.write_all(&bytes).map_err(io_err(temp.path()))?;
    temp.as_file().sync_all().map_err(io_err(temp.path()))?;
    let target = paths.snapshot();
    temp.persist(&target).map_err(|e| IndexError::Io { path: target.clone(), source: e.error })?;

    tracing::info!(path = %target.display(), bytes = bytes.len(), "saved index snapshot");
    Ok(())
}

/// Reads and validates the snapshot. Nothing is returned unless both maps
/// decode and agree with the header.
pub fn load_snapshot(paths: &SnapshotPaths) -> Result<InvertedIndex, IndexError> {
    let path = paths.snapshot();
    let bytes = {
        let _guard = SNAPSHOT_LOCK.read();
        match fs::read(&path) {
            Ok(b) => b,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(IndexError::MissingSnapshot { path });
            }
            Err(e) => return Err(IndexError::Io { path, source: e }),
        }
    };

    let corrupt = |reason: String| IndexError::CorruptSnapshot { path: path.clone(), reason };
    let snapshot: Snapshot = bincode::deserialize(&bytes).map_err(|e| corrupt(e.to_string()))?;
    validate(&snapshot).map_err(corrupt)?;

    tracing::info!(
        path = %path.display(),
        created_at = %snapshot.meta.created_at,
        num_docs = snapshot.meta.num_docs,
        num_tokens = snapshot.meta.num_tokens,
        "loaded index snapshot"
    );
    Ok(snapshot.index)
}

fn validate(snapshot: &Snapshot) -> Result<(), String> {
    let Snapshot { meta, index } = snapshot;
    if meta.version != FORMAT_VERSION {
        return Err(format!("unsupported format version {}", meta.version));
    }
    if meta.num_docs as usize != index.num_docs() {
        return Err(format!("header lists {} documents, document map has {}", meta.num_docs, index.num_docs()));
    }
    if meta.num_tokens as usize != index.num_tokens() {
        return Err(format!("header lists {} tokens, token map has {}", meta.num_tokens, index.num_tokens()));
    }
    for (token, postings) in &index.index {
        if let Some(id) = postings.iter().find(|id| !index.docmap.contains_key(*id)) {
            return Err(format!("token {token:?} points at unknown document {id}"));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;
    use tempfile::tempdir;

    fn write_raw(paths: &SnapshotPaths, meta: SnapshotMeta, index: &InvertedIndex) {
        fs::create_dir_all(&paths.root).unwrap();
        let bytes = bincode::serialize(&SnapshotRef { meta, index }).unwrap();
        fs::write(paths.snapshot(), bytes).unwrap();
    }

    fn one_doc_index() -> InvertedIndex {
        let mut index = InvertedIndex::new();
        index.index.insert("heat".into(), vec![7]);
        index.docmap.insert(7, vec!["heat".into()]);
        index
    }

    fn meta_for(index: &InvertedIndex) -> SnapshotMeta {
        SnapshotMeta {
            version: FORMAT_VERSION,
            created_at: "2024-01-01T00:00:00Z".into(),
            num_docs: index.num_docs() as u32,
            num_tokens: index.num_tokens() as u32,
        }
    }

    fn corrupt_reason(paths: &SnapshotPaths) -> String {
        match load_snapshot(paths) {
            Err(IndexError::CorruptSnapshot { reason, .. }) => reason,
            other => panic!("expected corrupt snapshot, got {other:?}"),
        }
    }

    #[test]
    fn save_leaves_only_the_snapshot() {
        let dir = tempdir().unwrap();
        let paths = SnapshotPaths::new(dir.path().join("nested/cache"));
        save_snapshot(&paths, &InvertedIndex::new()).unwrap();
        save_snapshot(&paths, &one_doc_index()).unwrap();
        let entries: Vec<PathBuf> = fs::read_dir(&paths.root).unwrap().map(|e| e.unwrap().path()).collect();
        assert_eq!(entries, vec![paths.snapshot()]);
    }

    #[test]
    fn concurrent_saves_leave_a_whole_snapshot() {
        let dir = tempdir().unwrap();
        let paths = SnapshotPaths::new(dir.path());
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let paths = paths.clone();
                thread::spawn(move || {
                    let mut index = InvertedIndex::new();
                    for id in 0..=i {
                        index.index.entry(format!("t{i}")).or_default().push(id);
                        index.docmap.insert(id, vec![format!("t{i}")]);
                    }
                    save_snapshot(&paths, &index).unwrap();
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        let loaded = load_snapshot(&paths).unwrap();
        assert_eq!(loaded.num_tokens(), 1);
        assert_eq!(fs::read_dir(&paths.root).unwrap().count(), 1);
    }

    #[test]
    fn wrong_format_version_is_corrupt() {
        let dir = tempdir().unwrap();
        let paths = SnapshotPaths::new(dir.path());
        let index = one_doc_index();
        let meta = SnapshotMeta { version: FORMAT_VERSION + 1, ..meta_for(&index) };
        write_raw(&paths, meta, &index);
        assert_eq!(corrupt_reason(&paths), format!("unsupported format version {}", FORMAT_VERSION + 1));
    }

    #[test]
    fn header_doc_count_mismatch_is_corrupt() {
        let dir = tempdir().unwrap();
        let paths = SnapshotPaths::new(dir.path());
        let index = one_doc_index();
        let meta = SnapshotMeta { num_docs: 3, ..meta_for(&index) };
        write_raw(&paths, meta, &index);
        assert_eq!(corrupt_reason(&paths), "header lists 3 documents, document map has 1");
    }

    #[test]
    fn header_token_count_mismatch_is_corrupt() {
        let dir = tempdir().unwrap();
        let paths = SnapshotPaths::new(dir.path());
        let index = one_doc_index();
        let meta = SnapshotMeta { num_tokens: 0, ..meta_for(&index) };
        write_raw(&paths, meta, &index);
        assert_eq!(corrupt_reason(&paths), "header lists 0 tokens, token map has 1");
    }

    #[test]
    fn dangling_posting_is_corrupt() {
        let dir = tempdir().unwrap();
        let paths = SnapshotPaths::new(dir.path());
        let mut index = InvertedIndex::new();
        index.index.insert("orphan".into(), vec![42]);
        save_snapshot(&paths, &index).unwrap();
        assert!(corrupt_reason(&paths).contains("42"));
    }

    #[test]
    fn saved_header_has_timestamp_and_counts() {
        let dir = tempdir().unwrap();
        let paths = SnapshotPaths::new(dir.path());
        let index = one_doc_index();
        save_snapshot(&paths, &index).unwrap();
        let bytes = fs::read(paths.snapshot()).unwrap();
        let snapshot: Snapshot = bincode::deserialize(&bytes).unwrap();
        assert_eq!(snapshot.meta.num_docs, 1);
        assert_eq!(snapshot.meta.num_tokens, 1);
        assert!(time::OffsetDateTime::parse(&snapshot.meta.created_at, &Rfc3339).is_ok());
    }

    #[cfg(target_pointer_width = "64")]
    #[test]
    fn oversized_count_is_rejected() {
        let count = u32::MAX as usize + 1;
        match header_count("documents", count) {
            Err(IndexError::TooLarge { what, count: c }) => {
                assert_eq!(what, "documents");
                assert_eq!(c, count);
            }
            other => panic!("expected too large, got {other:?}"),
        }
        assert_eq!(header_count("tokens", 12).unwrap(), 12);
    }

    #[test]
    fn default_location_is_cache_dir() {
        assert_eq!(SnapshotPaths::default().snapshot(), PathBuf::from("cache/index.bin"));
    }
}
