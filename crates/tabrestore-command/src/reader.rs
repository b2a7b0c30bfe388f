use std::fs::File;
use std::io::{ErrorKind, Read};
use std::path::Path;

use bytes::{Buf, BytesMut};
use tracing::{debug, debug_span, trace, warn};

use crate::command::{CommandFrame, ID_SIZE, SIZE_PREFIX};
use crate::config::LogConfig;
use crate::error::{FrameError, Result};
use crate::header::{FileHeader, FILE_HEADER_SIZE};
use crate::ids::SessionType;

/// Where a reader is in its single top-to-bottom pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReaderState {
    Open,
    ValidatingHeader,
    Streaming,
    Ended,
    Errored,
}

/// Why a reader stopped without an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndReason {
    /// The file ended exactly on a frame boundary.
    Eof,
    /// A single stray byte where a frame size should be.
    TruncatedSize,
    /// A frame declared a size of zero.
    ZeroSizedFrame,
    /// The last frame is shorter than its declared size.
    TruncatedFrame { declared: usize, available: usize },
}

/// Result of asking for the next command.
#[derive(Debug)]
pub enum Next {
    Command(CommandFrame),
    End(EndReason),
}

/// Every command read from a log, plus the error that stopped the pass, if any.
///
/// A truncated tail is not an error: `error` stays `None` and `commands`
/// holds everything before it.
#[derive(Debug)]
pub struct CommandLog {
    pub commands: Vec<CommandFrame>,
    pub error: Option<FrameError>,
}

impl CommandLog {
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }

    pub fn into_result(self) -> Result<Vec<CommandFrame>> {
        match self.error {
            Some(err) => Err(err),
            None => Ok(self.commands),
        }
    }
}

/// Reads commands from a command log.
///
/// Bytes are pulled through a window that starts at
/// [`LogConfig::read_chunk_size`] and grows in chunk steps when a frame does
/// not fit.
pub struct CommandLogReader<T> {
    inner: T,
    window: BytesMut,
    window_size: usize,
    state: ReaderState,
    config: LogConfig,
}

impl CommandLogReader<File> {
    /// Open the command log at `path` with default configuration.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Self::open_with_config(path, LogConfig::default())
    }

    /// Open the command log at `path`.
    ///
    /// The file is closed when the reader is dropped.
    pub fn open_with_config(path: impl AsRef<Path>, config: LogConfig) -> Result<Self> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(FrameError::NotFound(path.to_path_buf()));
        }
        let file = File::open(path)?;
        debug!(path = %path.display(), "opened command log");
        Ok(Self::with_config(file, config))
    }
}

impl<T: Read> CommandLogReader<T> {
    /// Create a reader with default configuration.
    pub fn new(inner: T) -> Self {
        Self::with_config(inner, LogConfig::default())
    }

    /// Create a reader with explicit configuration.
    pub fn with_config(inner: T, config: LogConfig) -> Self {
        let window_size = config.read_chunk_size.max(FILE_HEADER_SIZE);
        Self {
            inner,
            window: BytesMut::with_capacity(window_size),
            window_size,
            state: ReaderState::Open,
            config,
        }
    }

    /// Read the whole log.
    ///
    /// A bad header yields no commands and an error. An I/O failure keeps
    /// every command decoded before it.
    pub fn read(&mut self, session_type: SessionType) -> CommandLog {
        let _span = debug_span!("read_command_log", ?session_type).entered();

        if self.state == ReaderState::Open {
            if let Err(err) = self.read_header() {
                warn!(error = %err, "rejecting command log");
                return CommandLog {
                    commands: Vec::new(),
                    error: Some(err),
                };
            }
        }

        let mut commands = Vec::new();
        loop {
            match self.next_command() {
                Ok(Next::Command(command)) => commands.push(command),
                Ok(Next::End(reason)) => {
                    debug!(?reason, count = commands.len(), "finished command log");
                    return CommandLog {
                        commands,
                        error: None,
                    };
                }
                Err(err) => {
                    warn!(error = %err, count = commands.len(), "command log read failed");
                    return CommandLog {
                        commands,
                        error: Some(err),
                    };
                }
            }
        }
    }

    /// Read and check the file header.
    pub fn read_header(&mut self) -> Result<FileHeader> {
        self.state = ReaderState::ValidatingHeader;

        self.fill_to(FILE_HEADER_SIZE)?;

        let header = FileHeader::decode(&self.window, self.config.byte_order)
            .and_then(FileHeader::validate)
            .inspect_err(|_| self.state = ReaderState::Errored)?;
        self.window.advance(FILE_HEADER_SIZE);
        self.state = ReaderState::Streaming;
        debug!(
            signature = header.signature,
            version = header.version,
            "command log header valid"
        );
        Ok(header)
    }

    /// Read the next command.
    ///
    /// Reads the header first if nobody has yet. Once the reader has ended
    /// or failed it keeps reporting [`EndReason::Eof`].
    pub fn next_command(&mut self) -> Result<Next> {
        match self.state {
            ReaderState::Open | ReaderState::ValidatingHeader => {
                self.read_header()?;
            }
            ReaderState::Streaming => {}
            ReaderState::Ended | ReaderState::Errored => return Ok(Next::End(EndReason::Eof)),
        }

        if self.window.len() < SIZE_PREFIX {
            self.fill_to(SIZE_PREFIX)?;
            if self.window.len() < SIZE_PREFIX {
                let reason = if self.window.is_empty() {
                    EndReason::Eof
                } else {
                    EndReason::TruncatedSize
                };
                return Ok(self.end(reason));
            }
        }

        let frame_size = self.config.byte_order.get_u16(&self.window) as usize;
        if frame_size == 0 {
            return Ok(self.end(EndReason::ZeroSizedFrame));
        }

        let needed = SIZE_PREFIX + frame_size;
        if needed > self.window.len() {
            if needed > self.window_size {
                let chunk = self.config.read_chunk_size.max(1);
                self.window_size = (needed / chunk + 1) * chunk;
                trace!(window = self.window_size, frame_size, "growing read window");
            }
            self.fill_to(needed)?;
            if needed > self.window.len() {
                let available = self.window.len() - SIZE_PREFIX;
                return Ok(self.end(EndReason::TruncatedFrame {
                    declared: frame_size,
                    available,
                }));
            }
        }

        self.window.advance(SIZE_PREFIX);
        let mut body = self.window.split_to(frame_size);
        let id = body[0];
        body.advance(ID_SIZE);
        trace!(id, size = body.len(), "read command");
        Ok(Next::Command(CommandFrame::from_parts(id, body)))
    }

    /// Read more bytes into the free end of the window.
    ///
    /// Returns `false` on a clean end of file.
    fn fill_window(&mut self) -> Result<bool> {
        let start = self.window.len();
        if start >= self.window_size {
            return Ok(false);
        }

        self.window.resize(self.window_size, 0);
        loop {
            match self.inner.read(&mut self.window[start..]) {
                Ok(n) => {
                    self.window.truncate(start + n);
                    return Ok(n > 0);
                }
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => {
                    self.window.truncate(start);
                    self.state = ReaderState::Errored;
                    return Err(FrameError::Io(err));
                }
            }
        }
    }

    /// Fill until the window holds `needed` bytes or the source is exhausted.
    fn fill_to(&mut self, needed: usize) -> Result<()> {
        while self.window.len() < needed {
            if !self.fill_window()? {
                break;
            }
        }
        Ok(())
    }

    fn end(&mut self, reason: EndReason) -> Next {
        match reason {
            EndReason::Eof => {}
            other => warn!(reason = ?other, "command log ends early"),
        }
        self.state = ReaderState::Ended;
        Next::End(reason)
    }

    pub fn state(&self) -> ReaderState {
        self.state
    }

    /// Bytes read from the source but not yet consumed.
    pub fn available(&self) -> usize {
        self.window.len()
    }

    /// Current configuration.
    pub fn config(&self) -> &LogConfig {
        &self.config
    }

    /// Borrow the underlying source.
    pub fn get_ref(&self) -> &T {
        &self.inner
    }

    /// Consume the reader and return the inner source.
    pub fn into_inner(self) -> T {
        self.inner
    }
}

impl<T: Read> Iterator for CommandLogReader<T> {
    type Item = Result<CommandFrame>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.next_command() {
            Ok(Next::Command(command)) => Some(Ok(command)),
            Ok(Next::End(_)) => None,
            Err(err) => {
                self.state = ReaderState::Errored;
                Some(Err(err))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use bytes::BytesMut;
    use tabrestore_pickle::{ByteOrder, Pickle, PickleCursor};

    use super::*;
    use crate::header::FILE_SIGNATURE;

    fn log_bytes(commands: &[CommandFrame]) -> Vec<u8> {
        log_bytes_with(FileHeader::default(), ByteOrder::Little, commands)
    }

    fn log_bytes_with(header: FileHeader, order: ByteOrder, commands: &[CommandFrame]) -> Vec<u8> {
        let mut wire = BytesMut::new();
        wire.extend_from_slice(&header.encode(order));
        for command in commands {
            command.encode(order, &mut wire);
        }
        wire.to_vec()
    }

    fn pickled(id: u8, value: i32, text: &str) -> CommandFrame {
        let mut pickle = Pickle::new();
        pickle.write_i32(value).unwrap();
        pickle.write_string(text).unwrap();
        CommandFrame::from_pickle(id, &pickle).unwrap()
    }

    #[test]
    fn reads_commands_in_file_order() {
        let commands = vec![
            pickled(1, 10, "first"),
            CommandFrame::from_contents(5, &[1]).unwrap(),
            pickled(1, 11, "second"),
        ];
        let mut reader = CommandLogReader::new(Cursor::new(log_bytes(&commands)));

        let log = reader.read(SessionType::TabRestore);
        assert!(log.is_success());
        assert_eq!(log.commands, commands);
        assert_eq!(reader.state(), ReaderState::Ended);

        let view = log.commands[2].as_pickle();
        let mut cursor = PickleCursor::new(&view);
        assert_eq!(cursor.read_i32().unwrap(), 11);
        assert_eq!(cursor.read_string().unwrap(), "second");
    }

    #[test]
    fn empty_log_is_success() {
        let mut reader = CommandLogReader::new(Cursor::new(log_bytes(&[])));
        let log = reader.read(SessionType::TabRestore);
        assert!(log.is_success());
        assert!(log.commands.is_empty());
    }

    #[test]
    fn bad_signature_yields_nothing() {
        let header = FileHeader {
            signature: 0xDEAD_BEEF,
            ..FileHeader::default()
        };
        let bytes = log_bytes_with(header, ByteOrder::Little, &[pickled(1, 1, "x")]);
        let mut reader = CommandLogReader::new(Cursor::new(bytes));

        let log = reader.read(SessionType::TabRestore);
        assert!(!log.is_success());
        assert!(log.commands.is_empty());
        assert!(matches!(log.error, Some(FrameError::InvalidHeader { .. })));
        assert_eq!(reader.state(), ReaderState::Errored);
    }

    #[test]
    fn bad_version_yields_nothing() {
        let header = FileHeader {
            signature: FILE_SIGNATURE,
            version: 2,
        };
        let bytes = log_bytes_with(header, ByteOrder::Little, &[pickled(1, 1, "x")]);
        let log = CommandLogReader::new(Cursor::new(bytes)).read(SessionType::TabRestore);
        assert!(!log.is_success());
        assert!(log.commands.is_empty());
    }

    #[test]
    fn short_header_fails() {
        let log = CommandLogReader::new(Cursor::new(vec![0x53, 0x4E, 0x53]))
            .read(SessionType::TabRestore);
        assert!(matches!(
            log.error,
            Some(FrameError::TruncatedHeader { len: 3 })
        ));
    }

    #[test]
    fn truncated_last_frame_is_dropped() {
        let commands = vec![pickled(1, 1, "kept"), pickled(1, 2, "cut short")];
        let mut bytes = log_bytes(&commands);
        bytes.truncate(bytes.len() - 3);

        let mut reader = CommandLogReader::new(Cursor::new(bytes));
        let log = reader.read(SessionType::TabRestore);
        assert!(log.is_success());
        assert_eq!(log.commands, vec![commands[0].clone()]);
    }

    #[test]
    fn truncated_size_prefix_is_clean_end() {
        let mut bytes = log_bytes(&[pickled(1, 1, "one")]);
        bytes.push(0x07);

        let mut reader = CommandLogReader::new(Cursor::new(bytes));
        assert!(matches!(reader.next_command().unwrap(), Next::Command(_)));
        assert!(matches!(
            reader.next_command().unwrap(),
            Next::End(EndReason::TruncatedSize)
        ));
    }

    #[test]
    fn zero_sized_frame_stops_reading() {
        let mut bytes = log_bytes(&[pickled(1, 1, "one")]);
        bytes.extend_from_slice(&[0, 0]);
        let trailing = log_bytes(&[pickled(1, 2, "hidden")]);
        bytes.extend_from_slice(&trailing[8..]);

        let mut reader = CommandLogReader::new(Cursor::new(bytes));
        assert!(matches!(reader.next_command().unwrap(), Next::Command(_)));
        assert!(matches!(
            reader.next_command().unwrap(),
            Next::End(EndReason::ZeroSizedFrame)
        ));
        assert_eq!(reader.state(), ReaderState::Ended);
        assert!(matches!(
            reader.next_command().unwrap(),
            Next::End(EndReason::Eof)
        ));
    }

    #[test]
    fn id_only_frame_has_empty_contents() {
        let bytes = log_bytes(&[CommandFrame::new(9, 0).unwrap()]);
        let log = CommandLogReader::new(Cursor::new(bytes)).read(SessionType::TabRestore);
        assert_eq!(log.commands.len(), 1);
        assert_eq!(log.commands[0].id(), 9);
        assert_eq!(log.commands[0].size(), 0);
    }

    #[test]
    fn frames_larger_than_window_grow_it() {
        let big = CommandFrame::from_contents(2, &vec![0xAB; 5000]).unwrap();
        let commands = vec![pickled(1, 1, "small"), big, pickled(1, 2, "after")];
        let mut reader = CommandLogReader::new(Cursor::new(log_bytes(&commands)));

        let log = reader.read(SessionType::TabRestore);
        assert!(log.is_success());
        assert_eq!(log.commands, commands);
    }

    #[test]
    fn tiny_chunks_still_frame_correctly() {
        let commands: Vec<_> = (0..20).map(|i| pickled(1, i, "some title")).collect();
        let config = LogConfig {
            read_chunk_size: 3,
            ..LogConfig::default()
        };
        let mut reader = CommandLogReader::with_config(Cursor::new(log_bytes(&commands)), config);

        let log = reader.read(SessionType::TabRestore);
        assert!(log.is_success());
        assert_eq!(log.commands, commands);
    }

    #[test]
    fn big_endian_log() {
        let commands = vec![CommandFrame::from_contents(4, &[1, 2, 3]).unwrap()];
        let bytes = log_bytes_with(FileHeader::default(), ByteOrder::Big, &commands);
        let config = LogConfig {
            byte_order: ByteOrder::Big,
            ..LogConfig::default()
        };

        let log = CommandLogReader::with_config(Cursor::new(bytes.clone()), config)
            .read(SessionType::TabRestore);
        assert_eq!(log.into_result().unwrap(), commands);

        let log = CommandLogReader::new(Cursor::new(bytes)).read(SessionType::TabRestore);
        assert!(!log.is_success());
    }

    #[test]
    fn byte_by_byte_source() {
        let commands = vec![pickled(1, 3, "slow"), pickled(1, 4, "slower")];
        let source = ByteByByteReader {
            bytes: log_bytes(&commands),
            pos: 0,
        };
        let log = CommandLogReader::new(source).read(SessionType::TabRestore);
        assert_eq!(log.into_result().unwrap(), commands);
    }

    #[test]
    fn io_error_keeps_earlier_commands() {
        let commands = vec![pickled(1, 1, "before")];
        let mut bytes = log_bytes(&commands);
        bytes.extend_from_slice(&[200, 0]);
        let fail_at = bytes.len();
        let source = FailAfter {
            bytes,
            pos: 0,
            fail_at: Some(fail_at),
        };

        let mut reader = CommandLogReader::new(source);
        let log = reader.read(SessionType::TabRestore);
        assert!(!log.is_success());
        assert_eq!(log.commands, commands);
        assert!(matches!(log.error, Some(FrameError::Io(_))));
        assert_eq!(reader.state(), ReaderState::Errored);
    }

    #[test]
    fn interrupted_reads_are_retried() {
        let commands = vec![pickled(1, 8, "ok")];
        let source = InterruptedThenData {
            state: 0,
            bytes: log_bytes(&commands),
            pos: 0,
        };
        let log = CommandLogReader::new(source).read(SessionType::TabRestore);
        assert_eq!(log.into_result().unwrap(), commands);
    }

    #[test]
    fn iterator_yields_commands() {
        let commands = vec![pickled(1, 1, "a"), pickled(1, 2, "b")];
        let reader = CommandLogReader::new(Cursor::new(log_bytes(&commands)));
        let collected: Result<Vec<_>> = reader.collect();
        assert_eq!(collected.unwrap(), commands);
    }

    #[test]
    fn open_missing_file_fails() {
        let path = std::env::temp_dir().join(format!(
            "tabrestore-missing-{}-does-not-exist",
            std::process::id()
        ));
        let err = CommandLogReader::open(&path).err().unwrap();
        assert!(matches!(err, FrameError::NotFound(p) if p == path));
    }

    #[test]
    fn open_directory_fails() {
        let err = CommandLogReader::open(std::env::temp_dir()).err().unwrap();
        assert!(matches!(err, FrameError::NotFound(_)));
    }

    #[test]
    fn open_reads_file_from_disk() {
        let dir =
            std::env::temp_dir().join(format!("tabrestore-reader-open-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("Current Tabs");
        let commands = vec![pickled(1, 5, "disk")];
        std::fs::write(&path, log_bytes(&commands)).unwrap();

        let mut reader = CommandLogReader::open(&path).unwrap();
        let log = reader.read(SessionType::TabRestore);
        assert_eq!(log.into_result().unwrap(), commands);
        drop(reader);
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[derive(Debug)]
    struct ByteByByteReader {
        bytes: Vec<u8>,
        pos: usize,
    }

    impl Read for ByteByByteReader {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            if self.pos >= self.bytes.len() || buf.is_empty() {
                return Ok(0);
            }
            buf[0] = self.bytes[self.pos];
            self.pos += 1;
            Ok(1)
        }
    }

    struct FailAfter {
        bytes: Vec<u8>,
        pos: usize,
        fail_at: Option<usize>,
    }

    impl Read for FailAfter {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            if self.fail_at.is_some_and(|at| self.pos >= at) {
                return Err(std::io::Error::other("disk went away"));
            }
            let limit = self.fail_at.unwrap_or(self.bytes.len());
            let n = (limit - self.pos).min(buf.len());
            buf[..n].copy_from_slice(&self.bytes[self.pos..self.pos + n]);
            self.pos += n;
            Ok(n)
        }
    }

    struct InterruptedThenData {
        state: u8,
        bytes: Vec<u8>,
        pos: usize,
    }

    impl Read for InterruptedThenData {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            if self.state == 0 {
                self.state = 1;
                return Err(std::io::Error::from(ErrorKind::Interrupted));
            }
            let n = (self.bytes.len() - self.pos).min(buf.len());
            buf[..n].copy_from_slice(&self.bytes[self.pos..self.pos + n]);
            self.pos += n;
            Ok(n)
        }
    }
}
