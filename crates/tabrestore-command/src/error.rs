use std::path::PathBuf;

use tabrestore_pickle::PickleError;

/// Errors that can occur while reading or writing a command log.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    /// The path does not name a readable regular file.
    #[error("command log not found: {0}")]
    NotFound(PathBuf),

    /// The file header carries the wrong signature or version.
    #[error("invalid command log header (signature {signature:#010x}, version {version})")]
    InvalidHeader { signature: u32, version: u32 },

    /// The file ended before a complete header.
    #[error("command log header truncated ({len} of 8 bytes)")]
    TruncatedHeader { len: usize },

    /// A frame's contents do not fit the 16-bit size prefix.
    #[error("command contents too large ({size} bytes, max {max})")]
    FrameTooLarge { size: usize, max: usize },

    /// An I/O error occurred while reading or writing the log.
    #[error("command log I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A pickle could not be built or read.
    #[error("pickle error: {0}")]
    Pickle(#[from] PickleError),
}

pub type Result<T> = std::result::Result<T, FrameError>;
