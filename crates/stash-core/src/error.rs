//! Error types for stash-core

use std::path::PathBuf;
use thiserror::Error;

/// Core error types for the stash library
#[derive(Error, Debug)]
pub enum Error {
    /// I/O operation failed
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Both the archive directory and the compressed file exist at once
    #[error("archive exists as both a directory and a compressed file; refusing to touch either")]
    Inconsistent,

    /// An operation that needs an existing archive found none
    #[error("no archive here (neither a directory nor a compressed file)")]
    NoArchive,

    /// Archive was invoked with an empty file list
    #[error("no files given to archive")]
    MissingFiles,

    /// Global archive was invoked with nothing to migrate and nothing to add
    #[error("nothing to archive globally: no local archive and no files given")]
    MissingSource,

    /// A named file or directory does not exist at the expected location
    #[error("not found: {0}")]
    InputNotFound(PathBuf),

    /// Compress was invoked without an archive directory present
    #[error("no archive directory to compress")]
    NoExpandedArchive,

    /// Extract was invoked without a compressed archive present
    #[error("no compressed archive to extract")]
    NoCompressedArchive,

    /// The tar subprocess exited with an unexpected status
    #[error("tar failed with status {status}: {stderr}")]
    Compression { status: i32, stderr: String },

    /// Configuration-related error
    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<fs_extra::error::Error> for Error {
    fn from(err: fs_extra::error::Error) -> Self {
        let message = err.to_string();
        match err.kind {
            fs_extra::error::ErrorKind::Io(io_err) => Error::Io(io_err),
            _ => Error::Io(std::io::Error::new(std::io::ErrorKind::Other, message)),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
