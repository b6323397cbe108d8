//! Reference handles and their codecs.
//!
//! A [`ReferenceHandle`] is the in-memory form of a reference to an object,
//! a region of an object, or an attribute. This crate moves handles to and
//! from bytes:
//!
//! - [`wire`] — the generic, self-describing encoding (`[kind][flags]`
//!   header plus variable payload) used by all current reference kinds
//! - [`legacy`] — the frozen fixed-width object and region records, read
//!   for backward compatibility
//!
//! The codecs never decide where bytes end up. Fitting an encoding into a
//! fixed-width record (and parking the variable part in a blob store) is the
//! conversion layer's job.

pub mod error;
pub mod handle;
pub mod legacy;
pub mod wire;

pub use error::{CodecError, CodecResult};
pub use handle::{RefTarget, ReferenceHandle};
pub use legacy::{
    decode_addr_region, decode_object_addr, encode_addr_region, encode_object_addr, region_heap_id,
};
pub use wire::{decode, encode, encoded_size, ENCODE_HEADER_SIZE, FLAG_EXTERNAL};
