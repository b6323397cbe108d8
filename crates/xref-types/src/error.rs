use thiserror::Error;

/// Errors produced by type operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("truncated input: need {needed} bytes, {available} available")]
    Truncated { needed: usize, available: usize },

    #[error("buffer overflow: need {needed} bytes, {available} available")]
    BufferOverflow { needed: usize, available: usize },

    #[error("value {value:#x} does not fit in {width} bytes")]
    ValueTooWide { value: u64, width: usize },

    #[error("invalid integer width: {0}")]
    InvalidWidth(usize),

    #[error("invalid reference kind tag: {0}")]
    InvalidKind(u8),

    #[error("invalid object token size: {0}")]
    InvalidTokenSize(usize),

    #[error("invalid selection: {0}")]
    InvalidSelection(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}
