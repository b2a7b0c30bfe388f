use tabrestore_pickle::ByteOrder;

/// Initial read window, and the step by which it grows for large frames.
pub const DEFAULT_READ_CHUNK_SIZE: usize = 1024;

/// Configuration shared by command log readers and writers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LogConfig {
    /// Byte order of the header, the frame sizes and every nested pickle.
    pub byte_order: ByteOrder,
    /// Size of the read window. Default: 1 KiB.
    pub read_chunk_size: usize,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            byte_order: ByteOrder::default(),
            read_chunk_size: DEFAULT_READ_CHUNK_SIZE,
        }
    }
}
