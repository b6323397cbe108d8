use xref_codec::CodecError;
use xref_store::StoreError;
use xref_types::RefKind;

use crate::location::Location;

/// Errors from location transitions and reference conversion.
#[derive(Debug, thiserror::Error)]
pub enum ConvError {
    /// Out-of-range location, or a container that does not fit the location.
    #[error("invalid location: {0}")]
    InvalidLocation(String),

    /// A record header carries a malformed kind or flags byte.
    #[error("bad reference value: {0}")]
    BadValue(String),

    /// Measuring the encoded size of a handle failed.
    #[error("cannot determine encoded size: {0}")]
    EncodeSize(#[source] CodecError),

    /// Encoding a handle failed.
    #[error("cannot encode reference: {0}")]
    Encode(#[source] CodecError),

    /// A legacy or generic payload could not be parsed.
    #[error("cannot decode reference: {0}")]
    CantDecode(String),

    /// A retrieved or supplied length disagrees with the destination.
    #[error("size mismatch: expected {expected} bytes, got {actual}")]
    SizeMismatch { expected: usize, actual: usize },

    /// Blob retrieval failed.
    #[error("cannot get blob: {0}")]
    CantGet(#[source] StoreError),

    /// Blob storage failed.
    #[error("cannot store blob: {0}")]
    CantSet(#[source] StoreError),

    /// Blob deletion failed.
    #[error("cannot remove blob: {0}")]
    CantRemove(#[source] StoreError),

    /// The source carries a kind this converter cannot materialize.
    #[error("unsupported reference kind: {0}")]
    UnsupportedReferenceKind(RefKind),

    /// Container widths needed to size a generic record are unavailable.
    #[error("cannot get container info: {0}")]
    CantGetContainerInfo(#[source] StoreError),

    /// The descriptor has no function bound for the requested operation.
    #[error("no {op} bound for {location} references")]
    NotBound { op: &'static str, location: Location },

    /// The source shape does not match what the converter reads.
    #[error("source mismatch: {0}")]
    SourceMismatch(&'static str),

    /// A handle or operation needs a container and none is available.
    #[error("no container: {0}")]
    NoContainer(&'static str),
}

/// Result alias for conversion operations.
pub type ConvResult<T> = Result<T, ConvError>;
