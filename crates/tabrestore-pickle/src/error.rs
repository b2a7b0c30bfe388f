/// Errors raised while writing to or reading from a pickle.
#[derive(Debug, thiserror::Error)]
pub enum PickleError {
    /// A mutation was attempted on a pickle that borrows its bytes.
    #[error("pickle is read-only")]
    ReadOnly,

    /// The requested header size is not usable.
    #[error("invalid pickle header size {size} (must be 4-byte aligned, between {min} and {max})")]
    InvalidHeaderSize { size: usize, min: usize, max: usize },

    /// The write would push the payload past what the header can describe.
    #[error("pickle write too large ({size} bytes, max {max})")]
    TooLarge { size: usize, max: usize },

    /// Fewer bytes remain in the payload than the read requires.
    #[error("pickle truncated (needed {needed} bytes, {remaining} remaining)")]
    Truncated { needed: usize, remaining: usize },

    /// A length prefix decoded to a negative value.
    #[error("negative length prefix ({0})")]
    NegativeLength(i32),

    /// String bytes are not valid in their declared encoding.
    #[error("invalid {encoding} string data")]
    InvalidString { encoding: &'static str },

    /// `begin_write_data` was called on a pickle that already has a variable buffer.
    #[error("pickle already holds a variable-length buffer")]
    VariableBufferInUse,

    /// `trim_write_data` was asked to grow the variable buffer, or values follow it.
    #[error("cannot trim variable buffer from {current} to {requested} bytes")]
    InvalidTrim { current: usize, requested: usize },
}

impl PickleError {
    /// Whether the error only means the stream ran out of data.
    pub fn is_truncation(&self) -> bool {
        matches!(self, PickleError::Truncated { .. })
    }
}

pub type Result<T> = std::result::Result<T, PickleError>;
