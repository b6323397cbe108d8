use xref_types::{HeapId, TypeError};

/// Errors from heap, blob, and container operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The requested heap entry does not exist (never written or removed).
    #[error("heap entry not found: {0}")]
    HeapEntryNotFound(HeapId),

    /// A nil heap id was dereferenced.
    #[error("nil heap id cannot be dereferenced")]
    NilHeapId,

    /// The destination buffer cannot hold the stored payload.
    #[error("buffer too small: need {needed} bytes, {available} available")]
    BufferTooSmall { needed: usize, available: usize },

    /// A payload exceeds what the backend can address.
    #[error("payload of {size} bytes exceeds backend limit of {max}")]
    PayloadTooLarge { size: usize, max: usize },

    /// The heap has run out of addressable space.
    #[error("heap address space exhausted")]
    AddressSpaceExhausted,

    /// A blob locator is malformed.
    #[error("malformed blob locator: {0}")]
    BadLocator(String),

    /// Container configuration is invalid.
    #[error("invalid container configuration: {0}")]
    InvalidConfig(String),

    /// Fixed-width field encoding or decoding failed.
    #[error("encoding error: {0}")]
    Type(#[from] TypeError),

    /// Backend-specific failure.
    #[error("backend error: {0}")]
    Backend(String),

    /// I/O error while loading configuration.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
