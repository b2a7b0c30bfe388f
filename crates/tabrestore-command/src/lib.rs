//! Command frames and the command log file that carries them.
//!
//! A command log starts with an 8-byte header (signature, version) followed
//! by frames:
//! - A 2-byte frame size (id plus contents)
//! - A 1-byte command id
//! - `size - 1` bytes of contents, usually a pickle
//!
//! The reader stops cleanly at a truncated trailing frame, which is what an
//! interrupted write leaves behind.

pub mod command;
pub mod config;
pub mod error;
pub mod header;
pub mod ids;
pub mod reader;
pub mod writer;

pub use command::{CommandFrame, ID_SIZE, MAX_CONTENTS_SIZE, SIZE_PREFIX};
pub use config::{LogConfig, DEFAULT_READ_CHUNK_SIZE};
pub use error::{FrameError, Result};
pub use header::{FileHeader, FILE_HEADER_SIZE, FILE_SIGNATURE, FILE_VERSION};
pub use ids::SessionType;
pub use reader::{CommandLog, CommandLogReader, EndReason, Next, ReaderState};
pub use writer::CommandLogWriter;
