use crate::error::{PickleError, Result};
use crate::order::ByteOrder;
use crate::pickle::{align4, Pickle};

/// Sequential reader over a pickle's payload.
///
/// Reads must follow the order in which values were written. A read that
/// fails leaves the cursor where it was, so callers can probe for optional
/// trailing values.
#[derive(Debug, Clone)]
pub struct PickleCursor<'p> {
    bytes: &'p [u8],
    position: usize,
    end: usize,
    byte_order: ByteOrder,
}

impl<'p> PickleCursor<'p> {
    /// Start reading at the beginning of `pickle`'s payload.
    pub fn new(pickle: &'p Pickle<'_>) -> Self {
        Self::from_payload(pickle.payload(), pickle.byte_order())
    }

    /// Read a bare payload slice.
    pub fn from_payload(payload: &'p [u8], byte_order: ByteOrder) -> Self {
        Self {
            bytes: payload,
            position: 0,
            end: payload.len(),
            byte_order,
        }
    }

    pub fn position(&self) -> usize {
        self.position
    }

    pub fn remaining(&self) -> usize {
        self.end - self.position
    }

    pub fn is_at_end(&self) -> bool {
        self.position == self.end
    }

    pub fn byte_order(&self) -> ByteOrder {
        self.byte_order
    }

    /// Claim `num_bytes` and move past them plus their alignment padding.
    ///
    /// The padding is clamped to the payload end so a value that ends an
    /// unpadded payload can still be read.
    fn advance(&mut self, num_bytes: usize) -> Result<&'p [u8]> {
        let remaining = self.remaining();
        if num_bytes > remaining {
            return Err(PickleError::Truncated {
                needed: num_bytes,
                remaining,
            });
        }

        let start = self.position;
        self.position += align4(num_bytes).min(remaining);
        Ok(&self.bytes[start..start + num_bytes])
    }

    /// Run `read`, rewinding to the current position if it fails.
    fn atomically<T>(&mut self, read: impl FnOnce(&mut Self) -> Result<T>) -> Result<T> {
        let saved = self.position;
        let result = read(self);
        if result.is_err() {
            self.position = saved;
        }
        result
    }

    /// Skip `num_bytes` of payload (plus padding).
    pub fn skip_bytes(&mut self, num_bytes: usize) -> Result<()> {
        self.advance(num_bytes).map(|_| ())
    }

    pub fn read_bool(&mut self) -> Result<bool> {
        self.read_i32().map(|value| value != 0)
    }

    pub fn read_i32(&mut self) -> Result<i32> {
        let order = self.byte_order;
        self.advance(4).map(|raw| order.get_i32(raw))
    }

    pub fn read_i64(&mut self) -> Result<i64> {
        let order = self.byte_order;
        self.advance(8).map(|raw| order.get_i64(raw))
    }

    /// Reads two bytes but consumes a full 4-byte slot.
    pub fn read_u16(&mut self) -> Result<u16> {
        let order = self.byte_order;
        self.advance(2).map(|raw| order.get_u16(raw))
    }

    pub fn read_u32(&mut self) -> Result<u32> {
        let order = self.byte_order;
        self.advance(4).map(|raw| order.get_u32(raw))
    }

    pub fn read_u64(&mut self) -> Result<u64> {
        let order = self.byte_order;
        self.advance(8).map(|raw| order.get_u64(raw))
    }

    /// Like [`PickleCursor::read_i32`], but rejects negative values.
    ///
    /// Use it for anything that sizes a later read.
    pub fn read_length(&mut self) -> Result<usize> {
        self.atomically(|cursor| {
            let value = cursor.read_i32()?;
            usize::try_from(value).map_err(|_| PickleError::NegativeLength(value))
        })
    }

    /// Raw bytes whose length the caller already knows.
    pub fn read_bytes(&mut self, length: usize) -> Result<&'p [u8]> {
        if length == 0 {
            return Ok(&[]);
        }
        self.advance(length)
    }

    /// Length-prefixed opaque blob.
    pub fn read_data(&mut self) -> Result<&'p [u8]> {
        self.atomically(|cursor| {
            let length = cursor.read_length()?;
            cursor.read_bytes(length)
        })
    }

    /// UTF-8 string prefixed with its byte count.
    pub fn read_string(&mut self) -> Result<String> {
        self.atomically(|cursor| {
            let raw = cursor.read_data()?;
            String::from_utf8(raw.to_vec())
                .map_err(|_| PickleError::InvalidString { encoding: "UTF-8" })
        })
    }

    /// UTF-16 string prefixed with its code unit count.
    pub fn read_string16(&mut self) -> Result<String> {
        self.atomically(|cursor| {
            let raw = cursor.read_units(2)?;
            let order = cursor.byte_order;
            let units: Vec<u16> = raw.chunks_exact(2).map(|c| order.get_u16(c)).collect();
            String::from_utf16(&units)
                .map_err(|_| PickleError::InvalidString { encoding: "UTF-16" })
        })
    }

    /// UTF-32 ("wide") string prefixed with its code point count.
    pub fn read_wstring(&mut self) -> Result<String> {
        self.atomically(|cursor| {
            let raw = cursor.read_units(4)?;
            let order = cursor.byte_order;
            raw.chunks_exact(4)
                .map(|c| char::from_u32(order.get_u32(c)))
                .collect::<Option<String>>()
                .ok_or(PickleError::InvalidString { encoding: "UTF-32" })
        })
    }

    /// Count-prefixed run of `width`-byte code units.
    fn read_units(&mut self, width: usize) -> Result<&'p [u8]> {
        let count = self.read_length()?;
        let remaining = self.remaining();
        let length = count.checked_mul(width).ok_or(PickleError::Truncated {
            needed: usize::MAX,
            remaining,
        })?;
        self.read_bytes(length)
    }
}
