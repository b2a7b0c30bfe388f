use std::io::{ErrorKind, Write};

use bytes::BytesMut;

use crate::command::CommandFrame;
use crate::config::LogConfig;
use crate::error::{FrameError, Result};
use crate::header::FileHeader;

const INITIAL_BUFFER_CAPACITY: usize = 1024;

/// Writes a command log to any `Write` sink.
///
/// The file header goes out with the first command, or explicitly through
/// [`CommandLogWriter::write_header`].
pub struct CommandLogWriter<T> {
    inner: T,
    buf: BytesMut,
    config: LogConfig,
    header_written: bool,
}

impl<T: Write> CommandLogWriter<T> {
    /// Create a writer with default configuration.
    pub fn new(inner: T) -> Self {
        Self::with_config(inner, LogConfig::default())
    }

    /// Create a writer with explicit configuration.
    pub fn with_config(inner: T, config: LogConfig) -> Self {
        Self {
            inner,
            buf: BytesMut::with_capacity(INITIAL_BUFFER_CAPACITY),
            config,
            header_written: false,
        }
    }

    /// Write the standard file header.
    pub fn write_header(&mut self) -> Result<()> {
        self.write_custom_header(FileHeader::default())
    }

    /// Write an arbitrary file header.
    pub fn write_custom_header(&mut self, header: FileHeader) -> Result<()> {
        let raw = header.encode(self.config.byte_order);
        self.write_all(&raw)?;
        self.header_written = true;
        Ok(())
    }

    /// Encode and write one command.
    pub fn write_command(&mut self, command: &CommandFrame) -> Result<()> {
        if !self.header_written {
            self.write_header()?;
        }

        self.buf.clear();
        command.encode(self.config.byte_order, &mut self.buf);
        let encoded = self.buf.split().freeze();
        self.write_all(&encoded)
    }

    fn write_all(&mut self, data: &[u8]) -> Result<()> {
        let mut offset = 0usize;
        while offset < data.len() {
            match self.inner.write(&data[offset..]) {
                Ok(0) => return Err(FrameError::Io(ErrorKind::WriteZero.into())),
                Ok(n) => offset += n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(FrameError::Io(err)),
            }
        }
        Ok(())
    }

    /// Flush the underlying sink.
    pub fn flush(&mut self) -> Result<()> {
        loop {
            match self.inner.flush() {
                Ok(()) => return Ok(()),
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(FrameError::Io(err)),
            }
        }
    }

    /// Borrow the underlying sink.
    pub fn get_ref(&self) -> &T {
        &self.inner
    }

    /// Consume the writer and return the inner sink.
    pub fn into_inner(self) -> T {
        self.inner
    }

    /// Current configuration.
    pub fn config(&self) -> &LogConfig {
        &self.config
    }
}
