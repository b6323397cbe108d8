//! Foundation types for container references.
//!
//! This crate provides the primitive, storage-agnostic types shared by the
//! heap, codec, and conversion layers. Every other `xref` crate depends on
//! `xref-types`.
//!
//! # Key Types
//!
//! - [`Address`] — Fixed-width container file address (0 is nil)
//! - [`ByteOrder`] — Per-container integer byte order
//! - [`HeapId`] — `{address, index}` locator of an append-only heap entry
//! - [`ObjectToken`] — Opaque container-local object identifier
//! - [`RefKind`] — Reference kind tag as stored on the wire
//! - [`Selection`] — Region selection over a dataspace extent
//! - [`ByteReader`] / [`ByteWriter`] — Bounds-checked byte cursors

pub mod address;
pub mod cursor;
pub mod error;
pub mod kind;
pub mod selection;
pub mod token;

pub use address::{Address, ByteOrder, HeapId};
pub use cursor::{ByteReader, ByteWriter};
pub use error::TypeError;
pub use kind::RefKind;
pub use selection::{Block, Selection, SelectionKind};
pub use token::{ObjectToken, MAX_TOKEN_SIZE};
