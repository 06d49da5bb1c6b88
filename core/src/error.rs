use std::path::PathBuf;

#[derive(thiserror::Error, Debug)]
pub enum IndexError {
    #[error("missing index snapshot: {} does not exist", .path.display())]
    MissingSnapshot { path: PathBuf },
    #[error("corrupt index snapshot {}: {reason}", .path.display())]
    CorruptSnapshot { path: PathBuf, reason: String },
    #[error("encoding index snapshot: {0}")]
    Encode(#[from] bincode::Error),
    #[error("formatting snapshot timestamp: {0}")]
    Timestamp(#[from] time::error::Format),
    #[error("index too large for a snapshot: {count} {what}")]
    TooLarge { what: &'static str, count: usize },
    #[error("i/o error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
