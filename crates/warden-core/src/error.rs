use std::path::PathBuf;

pub type Result<R, E = Error> = std::result::Result<R, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid config: {0}")]
    Config(String),

    #[error("io error: {0}")]
    IOError(#[from] std::io::Error),

    #[error("process record {path:?}: {source}")]
    Record {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("cannot signal process group {pgid}: {source}")]
    Signal { pgid: i32, source: std::io::Error },

    #[error("another invocation holds {0:?}")]
    Locked(PathBuf),
}
