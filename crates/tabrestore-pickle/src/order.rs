//! Byte order of multi-byte values inside pickles and command logs.
//!
//! Chrome writes host byte order. Every reader and writer takes the order
//! explicitly so files from a big-endian host decode the same way everywhere.

/// Byte order used for every integer and code unit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum ByteOrder {
    #[default]
    Little,
    Big,
}

macro_rules! order_codec {
    ($get:ident, $put:ident, $ty:ty, $n:expr) => {
        /// Decode from the first bytes of `src`, which must hold at least the value's width.
        #[inline]
        pub fn $get(self, src: &[u8]) -> $ty {
            let mut raw = [0u8; $n];
            raw.copy_from_slice(&src[..$n]);
            match self {
                ByteOrder::Little => <$ty>::from_le_bytes(raw),
                ByteOrder::Big => <$ty>::from_be_bytes(raw),
            }
        }

        /// Encode into the first bytes of `dst`.
        #[inline]
        pub fn $put(self, dst: &mut [u8], value: $ty) {
            let raw = match self {
                ByteOrder::Little => value.to_le_bytes(),
                ByteOrder::Big => value.to_be_bytes(),
            };
            dst[..$n].copy_from_slice(&raw);
        }
    };
}

impl ByteOrder {
    order_codec!(get_u16, put_u16, u16, 2);
    order_codec!(get_u32, put_u32, u32, 4);
    order_codec!(get_i32, put_i32, i32, 4);
    order_codec!(get_u64, put_u64, u64, 8);
    order_codec!(get_i64, put_i64, i64, 8);

    /// The byte order of the machine running this code.
    pub fn native() -> Self {
        if cfg!(target_endian = "big") {
            ByteOrder::Big
        } else {
            ByteOrder::Little
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn little_and_big_disagree_on_layout() {
        let mut le = [0u8; 4];
        let mut be = [0u8; 4];
        ByteOrder::Little.put_u32(&mut le, 0x5353_4E53);
        ByteOrder::Big.put_u32(&mut be, 0x5353_4E53);

        assert_eq!(le, [0x53, 0x4E, 0x53, 0x53]);
        assert_eq!(be, [0x53, 0x53, 0x4E, 0x53]);
        assert_eq!(ByteOrder::Little.get_u32(&le), 0x5353_4E53);
        assert_eq!(ByteOrder::Big.get_u32(&be), 0x5353_4E53);
    }

    #[test]
    fn signed_values_keep_sign() {
        let mut buf = [0u8; 8];
        ByteOrder::Big.put_i64(&mut buf, -2);
        assert_eq!(ByteOrder::Big.get_i64(&buf), -2);

        ByteOrder::Little.put_i32(&mut buf, i32::MIN);
        assert_eq!(ByteOrder::Little.get_i32(&buf), i32::MIN);
    }

    #[test]
    fn default_is_little_endian() {
        assert_eq!(ByteOrder::default(), ByteOrder::Little);
    }
}
