//! Location-dependent conversion of container references.
//!
//! A reference-bearing type lives in one of three places: in memory as
//! [`ReferenceHandle`](xref_codec::ReferenceHandle) slots, on disk as
//! fixed-width records inside a container, or nowhere yet. A
//! [`RefTypeDescriptor`] tracks which, and binds the matching converters:
//!
//! - [`MemoryCodec`] — handles to and from the generic wire encoding
//! - [`DiskConverter`] — generic encodings to and from fixed-width records,
//!   with the variable payload parked in the container's blob store
//! - [`LegacyObjectCodec`] / [`LegacyRegionCodec`] — read-only access to the
//!   frozen pre-versioned record layouts
//!
//! [`convert_element`] drives one element through a source descriptor's
//! size query and reader into a destination descriptor's writer.
//!
//! # Ownership
//!
//! A generic disk record owns the blob its locator names. Callers that
//! overwrite a record pass the old bytes as `previous` so the writer can
//! delete the old blob before storing a new one.

pub mod binding;
pub mod convert;
pub mod disk;
pub mod error;
pub mod legacy;
pub mod location;
pub mod memory;

#[cfg(test)]
mod testutil;

pub use binding::{
    Binding, DiskBinding, EncodedSize, LegacyReader, LegacyValue, MemoryBinding, Reader, RefReader,
    RefSlot, RefSource, RefWriter, SizeQuery, WriteSource,
};
pub use convert::convert_element;
pub use disk::DiskConverter;
pub use error::{ConvError, ConvResult};
pub use legacy::{LegacyObjectCodec, LegacyRegionCodec};
pub use location::{
    Location, RefSubKind, RefTypeDescriptor, DSETREG_REF_MEM_SIZE, OBJ_REF_MEM_SIZE, REF_MEM_SIZE,
};
pub use memory::MemoryCodec;
