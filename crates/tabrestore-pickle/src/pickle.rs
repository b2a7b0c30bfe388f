use bytes::{Bytes, BytesMut};
use tracing::trace;

use crate::error::{PickleError, Result};
use crate::order::ByteOrder;

/// Size of the mandatory header field holding the payload size.
pub const HEADER_SIZE: usize = 4;

/// Width of the signed count that prefixes strings and blobs.
pub const LENGTH_PREFIX: usize = 4;

/// Allocation granularity of owned pickles, and the largest allowed header.
pub const PAYLOAD_UNIT: usize = 64;

/// Capacity reported by a pickle that borrows its bytes.
pub const CAPACITY_READ_ONLY: usize = usize::MAX;

const MAX_PAYLOAD: usize = u32::MAX as usize;

/// Round `n` up to the next multiple of 4.
#[inline]
pub fn align4(n: usize) -> usize {
    n.next_multiple_of(4)
}

#[derive(Debug, Clone)]
enum Storage<'a> {
    /// Growable buffer; `len()` is the capacity and every byte is initialized.
    Owned(BytesMut),
    /// Caller-owned bytes, never mutated.
    Borrowed(&'a [u8]),
}

/// A binary buffer of aligned, length-prefixed values.
///
/// Layout:
/// ```text
/// ┌────────────────────┬──────────────────┬──────────────────────────────┐
/// │ payload_size (4B)  │ extra header     │ payload (4-byte aligned      │
/// │                    │ (header_size-4)  │ values, zero padded)         │
/// └────────────────────┴──────────────────┴──────────────────────────────┘
/// ```
///
/// An owned pickle grows as values are written. A borrowed pickle is a
/// read-only view; every mutating method returns [`PickleError::ReadOnly`].
#[derive(Debug, Clone)]
pub struct Pickle<'a> {
    storage: Storage<'a>,
    /// Zero marks a borrowed pickle whose bytes were not a consistent encoding.
    header_size: usize,
    byte_order: ByteOrder,
    variable_buffer_offset: Option<usize>,
}

impl Pickle<'static> {
    /// Create an empty pickle with the default 4-byte header.
    pub fn new() -> Self {
        Self::with_byte_order(ByteOrder::default())
    }

    /// Create an empty pickle writing values in `byte_order`.
    pub fn with_byte_order(byte_order: ByteOrder) -> Self {
        Self::owned(HEADER_SIZE, byte_order)
    }

    /// Create an empty pickle with extra header space.
    ///
    /// `header_size` is rounded up to a multiple of 4 and must stay within
    /// `HEADER_SIZE..=PAYLOAD_UNIT`.
    pub fn with_header_size(header_size: usize, byte_order: ByteOrder) -> Result<Self> {
        let aligned = header_size
            .checked_next_multiple_of(4)
            .filter(|size| (HEADER_SIZE..=PAYLOAD_UNIT).contains(size))
            .ok_or(PickleError::InvalidHeaderSize {
                size: header_size,
                min: HEADER_SIZE,
                max: PAYLOAD_UNIT,
            })?;
        Ok(Self::owned(aligned, byte_order))
    }

    fn owned(header_size: usize, byte_order: ByteOrder) -> Self {
        let mut buf = BytesMut::with_capacity(PAYLOAD_UNIT);
        buf.resize(PAYLOAD_UNIT, 0);
        Self {
            storage: Storage::Owned(buf),
            header_size,
            byte_order,
            variable_buffer_offset: None,
        }
    }
}

impl Default for Pickle<'static> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a> Pickle<'a> {
    /// Wrap encoded bytes without copying, assuming little-endian values.
    pub fn from_bytes(data: &'a [u8]) -> Self {
        Self::from_bytes_with_order(data, ByteOrder::default())
    }

    /// Wrap encoded bytes without copying.
    ///
    /// The header size is deduced as `data.len() - payload_size`. When that is
    /// negative, unaligned or smaller than the size field, the pickle is
    /// invalid: it reports zero size and an empty payload.
    pub fn from_bytes_with_order(data: &'a [u8], byte_order: ByteOrder) -> Self {
        let header_size = if data.len() >= HEADER_SIZE {
            let payload_size = byte_order.get_u32(data) as usize;
            data.len()
                .checked_sub(payload_size)
                .filter(|size| *size >= HEADER_SIZE && *size % 4 == 0)
                .unwrap_or(0)
        } else {
            0
        };

        if header_size == 0 {
            trace!(len = data.len(), "bytes are not a consistent pickle");
        }

        Self {
            storage: Storage::Borrowed(data),
            header_size,
            byte_order,
            variable_buffer_offset: None,
        }
    }

    /// Whether the pickle holds a usable header.
    pub fn is_valid(&self) -> bool {
        self.header_size != 0
    }

    /// Whether the pickle borrows its bytes.
    pub fn is_read_only(&self) -> bool {
        matches!(self.storage, Storage::Borrowed(_))
    }

    pub fn byte_order(&self) -> ByteOrder {
        self.byte_order
    }

    pub fn header_size(&self) -> usize {
        self.header_size
    }

    /// Payload size as recorded in the header.
    pub fn payload_size(&self) -> usize {
        if !self.is_valid() {
            return 0;
        }
        self.byte_order.get_u32(self.raw()) as usize
    }

    /// Header plus payload, in bytes.
    pub fn size(&self) -> usize {
        if !self.is_valid() {
            return 0;
        }
        self.header_size + self.payload_size()
    }

    pub fn capacity(&self) -> usize {
        match &self.storage {
            Storage::Owned(buf) => buf.len(),
            Storage::Borrowed(_) => CAPACITY_READ_ONLY,
        }
    }

    /// The encoded pickle (header followed by payload).
    pub fn data(&self) -> &[u8] {
        &self.raw()[..self.size()]
    }

    /// The payload that follows the header.
    pub fn payload(&self) -> &[u8] {
        &self.raw()[self.header_size..self.size()]
    }

    /// Extra header space after the payload size field.
    pub fn header(&self) -> &[u8] {
        if !self.is_valid() {
            return &[];
        }
        &self.raw()[HEADER_SIZE..self.header_size]
    }

    /// Mutable extra header space, for pickles created with a custom header size.
    pub fn header_mut(&mut self) -> Result<&mut [u8]> {
        let header_size = self.header_size;
        let buf = self.owned_mut()?;
        Ok(&mut buf[HEADER_SIZE..header_size])
    }

    /// Consume the pickle and return its encoded bytes.
    pub fn into_bytes(self) -> Bytes {
        let size = self.size();
        match self.storage {
            Storage::Owned(mut buf) => {
                buf.truncate(size);
                buf.freeze()
            }
            Storage::Borrowed(data) => Bytes::copy_from_slice(&data[..size]),
        }
    }

    /// Reserve `length` bytes at the next aligned payload offset.
    ///
    /// Returns the offset from the start of the pickle where the caller may
    /// place `length` bytes. The stored payload size already includes the
    /// padding up to the next 4-byte boundary.
    pub fn begin_write(&mut self, length: usize) -> Result<usize> {
        if self.is_read_only() {
            return Err(PickleError::ReadOnly);
        }

        let offset = align4(self.payload_size());
        let too_large = PickleError::TooLarge {
            size: length,
            max: MAX_PAYLOAD,
        };
        let new_size = offset
            .checked_add(length)
            .and_then(|end| end.checked_next_multiple_of(4))
            .filter(|end| *end <= MAX_PAYLOAD)
            .ok_or(too_large)?;
        let needed = self
            .header_size
            .checked_add(new_size)
            .ok_or(PickleError::TooLarge {
                size: length,
                max: MAX_PAYLOAD,
            })?;

        let capacity = self.capacity();
        if needed > capacity {
            self.resize(capacity.saturating_mul(2).max(needed))?;
        }

        self.set_payload_size(new_size)?;
        Ok(self.header_size + offset)
    }

    /// Zero the padding between `offset + length` and the next 4-byte boundary.
    pub fn end_write(&mut self, offset: usize, length: usize) -> Result<()> {
        let buf = self.owned_mut()?;
        let capacity = buf.len();
        let padding = offset
            .checked_add(length)
            .and_then(|end| Some(end..end.checked_next_multiple_of(4)?))
            .and_then(|range| buf.get_mut(range))
            .ok_or(PickleError::TooLarge {
                size: offset.saturating_add(length),
                max: capacity,
            })?;
        padding.fill(0);
        Ok(())
    }

    /// Append raw bytes with no length prefix.
    pub fn write_bytes(&mut self, data: &[u8]) -> Result<()> {
        let offset = self.begin_write(data.len())?;
        let buf = self.owned_mut()?;
        buf[offset..offset + data.len()].copy_from_slice(data);
        self.end_write(offset, data.len())
    }

    /// Booleans are stored as a full 32-bit integer.
    pub fn write_bool(&mut self, value: bool) -> Result<()> {
        self.write_i32(i32::from(value))
    }

    pub fn write_i32(&mut self, value: i32) -> Result<()> {
        let mut raw = [0u8; 4];
        self.byte_order.put_i32(&mut raw, value);
        self.write_bytes(&raw)
    }

    pub fn write_i64(&mut self, value: i64) -> Result<()> {
        let mut raw = [0u8; 8];
        self.byte_order.put_i64(&mut raw, value);
        self.write_bytes(&raw)
    }

    pub fn write_u16(&mut self, value: u16) -> Result<()> {
        let mut raw = [0u8; 2];
        self.byte_order.put_u16(&mut raw, value);
        self.write_bytes(&raw)
    }

    pub fn write_u32(&mut self, value: u32) -> Result<()> {
        let mut raw = [0u8; 4];
        self.byte_order.put_u32(&mut raw, value);
        self.write_bytes(&raw)
    }

    pub fn write_u64(&mut self, value: u64) -> Result<()> {
        let mut raw = [0u8; 8];
        self.byte_order.put_u64(&mut raw, value);
        self.write_bytes(&raw)
    }

    /// UTF-8 string, prefixed with its byte count.
    pub fn write_string(&mut self, value: &str) -> Result<()> {
        self.write_prefixed(value.len(), value.as_bytes())
    }

    /// UTF-16 string, prefixed with its code unit count.
    pub fn write_string16(&mut self, value: &str) -> Result<()> {
        let units: Vec<u16> = value.encode_utf16().collect();
        let mut raw = vec![0u8; units.len() * 2];
        for (chunk, unit) in raw.chunks_exact_mut(2).zip(&units) {
            self.byte_order.put_u16(chunk, *unit);
        }
        self.write_prefixed(units.len(), &raw)
    }

    /// UTF-32 ("wide") string, prefixed with its code point count.
    pub fn write_wstring(&mut self, value: &str) -> Result<()> {
        let count = value.chars().count();
        let mut raw = vec![0u8; count * 4];
        for (chunk, ch) in raw.chunks_exact_mut(4).zip(value.chars()) {
            self.byte_order.put_u32(chunk, u32::from(ch));
        }
        self.write_prefixed(count, &raw)
    }

    /// Opaque blob, prefixed with its byte count.
    pub fn write_data(&mut self, data: &[u8]) -> Result<()> {
        self.write_prefixed(data.len(), data)
    }

    /// Reserve a length-prefixed blob of `length` bytes and return it for filling.
    ///
    /// Only one such region may exist per pickle. It should be the last value
    /// written so that [`Pickle::trim_write_data`] can shrink it in place.
    pub fn begin_write_data(&mut self, length: usize) -> Result<&mut [u8]> {
        if self.is_read_only() {
            return Err(PickleError::ReadOnly);
        }
        if self.variable_buffer_offset.is_some() {
            return Err(PickleError::VariableBufferInUse);
        }

        let offset = self.atomically(|pickle| {
            pickle.write_length(length)?;
            let offset = pickle.begin_write(length)?;
            pickle.end_write(offset, length)?;
            Ok(offset)
        })?;
        self.variable_buffer_offset = Some(offset - LENGTH_PREFIX);

        let buf = self.owned_mut()?;
        Ok(&mut buf[offset..offset + length])
    }

    /// Shrink the region reserved by [`Pickle::begin_write_data`].
    ///
    /// Does nothing when no region was reserved. Fails with
    /// [`PickleError::InvalidTrim`] when asked to grow the region or when
    /// other values were written after it.
    pub fn trim_write_data(&mut self, new_length: usize) -> Result<()> {
        let Some(length_offset) = self.variable_buffer_offset else {
            return Ok(());
        };

        let order = self.byte_order;
        let current = order.get_i32(&self.raw()[length_offset..]) as usize;
        let data_offset = length_offset + LENGTH_PREFIX;
        let region_end = data_offset - self.header_size + align4(current);
        if new_length > current || self.payload_size() != region_end {
            return Err(PickleError::InvalidTrim {
                current,
                requested: new_length,
            });
        }

        let new_payload = data_offset - self.header_size + align4(new_length);
        self.set_payload_size(new_payload)?;

        let buf = self.owned_mut()?;
        order.put_i32(&mut buf[length_offset..], new_length as i32);
        self.end_write(data_offset, new_length)
    }

    /// Find the end of the pickle that starts at the beginning of `range`.
    ///
    /// Returns the offset just past its payload, or `None` when the declared
    /// payload does not fit inside `range`.
    pub fn find_next(
        header_size: usize,
        range: &[u8],
        byte_order: ByteOrder,
    ) -> Result<Option<usize>> {
        if header_size % 4 != 0 || !(HEADER_SIZE..=PAYLOAD_UNIT).contains(&header_size) {
            return Err(PickleError::InvalidHeaderSize {
                size: header_size,
                min: HEADER_SIZE,
                max: PAYLOAD_UNIT,
            });
        }
        if range.len() < HEADER_SIZE {
            return Ok(None);
        }

        let payload_size = byte_order.get_u32(range) as usize;
        Ok(header_size
            .checked_add(payload_size)
            .filter(|end| *end <= range.len()))
    }

    fn raw(&self) -> &[u8] {
        match &self.storage {
            Storage::Owned(buf) => &buf[..],
            Storage::Borrowed(data) => data,
        }
    }

    fn owned_mut(&mut self) -> Result<&mut BytesMut> {
        match &mut self.storage {
            Storage::Owned(buf) => Ok(buf),
            Storage::Borrowed(_) => Err(PickleError::ReadOnly),
        }
    }

    fn set_payload_size(&mut self, size: usize) -> Result<()> {
        let order = self.byte_order;
        let buf = self.owned_mut()?;
        order.put_u32(&mut buf[..HEADER_SIZE], size as u32);
        Ok(())
    }

    fn resize(&mut self, new_capacity: usize) -> Result<()> {
        let new_capacity = new_capacity
            .checked_next_multiple_of(PAYLOAD_UNIT)
            .ok_or(PickleError::TooLarge {
                size: new_capacity,
                max: MAX_PAYLOAD,
            })?;
        let buf = self.owned_mut()?;
        trace!(from = buf.len(), to = new_capacity, "growing pickle");
        buf.resize(new_capacity, 0);
        Ok(())
    }

    /// Write a count prefix and its body, leaving the payload untouched on failure.
    fn write_prefixed(&mut self, count: usize, body: &[u8]) -> Result<()> {
        self.atomically(|pickle| {
            pickle.write_length(count)?;
            pickle.write_bytes(body)
        })
    }

    /// Run `write`, restoring the payload size if it fails.
    fn atomically<T>(&mut self, write: impl FnOnce(&mut Self) -> Result<T>) -> Result<T> {
        let saved = self.payload_size();
        let result = write(self);
        if result.is_err() && !self.is_read_only() {
            self.set_payload_size(saved)?;
        }
        result
    }

    fn write_length(&mut self, length: usize) -> Result<()> {
        let length = i32::try_from(length).map_err(|_| PickleError::TooLarge {
            size: length,
            max: i32::MAX as usize,
        })?;
        self.write_i32(length)
    }
}
