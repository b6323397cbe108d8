use xref_store::StoreError;
use xref_types::{RefKind, TypeError};

/// Errors from reference encoding and decoding.
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    /// Fixed-width field or selection encoding failed.
    #[error("encoding error: {0}")]
    Type(#[from] TypeError),

    /// The kind tag names a reference the generic codec does not handle.
    #[error("unsupported reference kind: {0}")]
    UnsupportedKind(RefKind),

    /// The flags byte carries bits this codec does not understand.
    #[error("invalid reference flags: {0:#04x}")]
    InvalidFlags(u8),

    /// A container or attribute name does not fit its u16 length prefix.
    #[error("{what} name of {len} bytes exceeds {max}")]
    NameTooLong {
        what: &'static str,
        len: usize,
        max: usize,
    },

    /// The token width disagrees with the container's token width.
    #[error("token width {actual} does not match container token width {expected}")]
    TokenSize { expected: usize, actual: usize },

    /// The destination buffer is not exactly the encoded size.
    #[error("buffer size mismatch: need {needed} bytes, {available} provided")]
    BufferSize { needed: usize, available: usize },

    /// Bytes could not be parsed as a reference.
    #[error("cannot decode reference: {0}")]
    CantDecode(String),

    /// A heap or blob backend operation failed.
    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

/// Result alias for codec operations.
pub type CodecResult<T> = Result<T, CodecError>;
