use tabrestore_pickle::ByteOrder;

use crate::error::{FrameError, Result};

/// Size of the file header: signature (4) + version (4).
pub const FILE_HEADER_SIZE: usize = 8;

/// Signature of a command log ("SNSS").
pub const FILE_SIGNATURE: u32 = 0x5353_4E53;

/// The only command log version this crate reads.
pub const FILE_VERSION: u32 = 1;

/// The first bytes of a command log.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileHeader {
    pub signature: u32,
    pub version: u32,
}

impl Default for FileHeader {
    fn default() -> Self {
        Self {
            signature: FILE_SIGNATURE,
            version: FILE_VERSION,
        }
    }
}

impl FileHeader {
    /// Decode a header from the first [`FILE_HEADER_SIZE`] bytes of `src`.
    pub fn decode(src: &[u8], order: ByteOrder) -> Result<Self> {
        if src.len() < FILE_HEADER_SIZE {
            return Err(FrameError::TruncatedHeader { len: src.len() });
        }
        Ok(Self {
            signature: order.get_u32(&src[0..4]),
            version: order.get_u32(&src[4..8]),
        })
    }

    pub fn encode(&self, order: ByteOrder) -> [u8; FILE_HEADER_SIZE] {
        let mut raw = [0u8; FILE_HEADER_SIZE];
        order.put_u32(&mut raw[0..4], self.signature);
        order.put_u32(&mut raw[4..8], self.version);
        raw
    }

    /// Reject anything but the supported signature and version.
    pub fn validate(self) -> Result<Self> {
        if self.signature != FILE_SIGNATURE || self.version != FILE_VERSION {
            return Err(FrameError::InvalidHeader {
                signature: self.signature,
                version: self.version,
            });
        }
        Ok(self)
    }
}
