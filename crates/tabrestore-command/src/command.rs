use bytes::{BufMut, BytesMut};
use tabrestore_pickle::{ByteOrder, Pickle};

use crate::error::{FrameError, Result};

/// Size of the frame size prefix.
pub const SIZE_PREFIX: usize = 2;

/// Size of the command id that leads every frame.
pub const ID_SIZE: usize = 1;

/// Largest contents that still fit the 16-bit frame size (which counts the id).
pub const MAX_CONTENTS_SIZE: usize = u16::MAX as usize - ID_SIZE;

/// One command read from, or destined for, a command log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandFrame {
    id: u8,
    contents: BytesMut,
}

impl CommandFrame {
    /// Create a command with `size` zeroed bytes to be filled via [`CommandFrame::contents_mut`].
    pub fn new(id: u8, size: usize) -> Result<Self> {
        check_size(size)?;
        let mut contents = BytesMut::with_capacity(size);
        contents.resize(size, 0);
        Ok(Self { id, contents })
    }

    /// Create a command whose contents are the encoded bytes of `pickle`.
    pub fn from_pickle(id: u8, pickle: &Pickle<'_>) -> Result<Self> {
        Self::from_contents(id, pickle.data())
    }

    /// Create a command by copying raw contents.
    pub fn from_contents(id: u8, contents: &[u8]) -> Result<Self> {
        check_size(contents.len())?;
        Ok(Self {
            id,
            contents: BytesMut::from(contents),
        })
    }

    /// Take ownership of contents split off a read window.
    pub(crate) fn from_parts(id: u8, contents: BytesMut) -> Self {
        debug_assert!(contents.len() <= MAX_CONTENTS_SIZE);
        Self { id, contents }
    }

    pub fn id(&self) -> u8 {
        self.id
    }

    pub fn contents(&self) -> &[u8] {
        &self.contents
    }

    pub fn contents_mut(&mut self) -> &mut [u8] {
        &mut self.contents
    }

    /// Size of the contents, excluding the id.
    pub fn size(&self) -> usize {
        self.contents.len()
    }

    /// Size on disk: size prefix, id and contents.
    pub fn wire_size(&self) -> usize {
        SIZE_PREFIX + ID_SIZE + self.contents.len()
    }

    /// View the contents as a little-endian pickle without copying.
    pub fn as_pickle(&self) -> Pickle<'_> {
        self.as_pickle_with_order(ByteOrder::default())
    }

    /// View the contents as a pickle without copying.
    pub fn as_pickle_with_order(&self, order: ByteOrder) -> Pickle<'_> {
        Pickle::from_bytes_with_order(&self.contents, order)
    }

    /// Append the frame in wire format.
    ///
    /// ```text
    /// ┌──────────────────┬──────────┬──────────────────────┐
    /// │ size (2B)        │ id (1B)  │ contents (size - 1)  │
    /// └──────────────────┴──────────┴──────────────────────┘
    /// ```
    pub fn encode(&self, order: ByteOrder, dst: &mut BytesMut) {
        let mut size = [0u8; SIZE_PREFIX];
        order.put_u16(&mut size, (ID_SIZE + self.contents.len()) as u16);
        dst.reserve(self.wire_size());
        dst.put_slice(&size);
        dst.put_u8(self.id);
        dst.put_slice(&self.contents);
    }
}

fn check_size(size: usize) -> Result<()> {
    if size > MAX_CONTENTS_SIZE {
        return Err(FrameError::FrameTooLarge {
            size,
            max: MAX_CONTENTS_SIZE,
        });
    }
    Ok(())
}
