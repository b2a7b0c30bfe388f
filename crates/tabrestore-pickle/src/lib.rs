//! Aligned binary pickle buffers.
//!
//! A pickle is a small header whose first four bytes hold the payload size,
//! followed by a payload of values that each start on a 4-byte boundary:
//! - Scalars occupy their natural width rounded up to 4 bytes
//! - Strings and blobs carry a signed 32-bit count prefix
//! - Padding bytes are always zero
//!
//! [`Pickle`] is the buffer (owned for writing, borrowed for zero-copy
//! reading) and [`PickleCursor`] walks its payload.

pub mod cursor;
pub mod error;
pub mod order;
pub mod pickle;

pub use cursor::PickleCursor;
pub use error::{PickleError, Result};
pub use order::ByteOrder;
pub use pickle::{align4, Pickle, CAPACITY_READ_ONLY, HEADER_SIZE, PAYLOAD_UNIT};
