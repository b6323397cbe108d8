//! Storage backends for container references.
//!
//! This crate holds everything a reference record ultimately lands in: the
//! append-only global heap, the pluggable blob store that parks variable
//! length payloads behind fixed-size locators, and the container handle that
//! ties a heap, a blob backend, and the container's addressing parameters
//! together.
//!
//! # Storage Backends
//!
//! - [`GlobalHeap`] / [`InMemoryHeap`] — append-only heap of opaque byte
//!   entries addressed by [`HeapId`](xref_types::HeapId)
//! - [`BlobStore`] / [`HeapBlobStore`] — put/get/specific/optional over
//!   blobs; the default backend maps onto the global heap
//!
//! # Design Rules
//!
//! 1. The heap never reuses a removed entry's index; space is reclaimed
//!    only through an explicit remove.
//! 2. A blob belongs to exactly one record. Overwriting a record must delete
//!    its old blob first.
//! 3. A nil locator (address 0) denotes "no stored data"; get and delete on
//!    it are no-ops.
//! 4. All backend errors are propagated, never silently ignored.

pub mod blob;
pub mod config;
pub mod container;
pub mod error;
pub mod heap;
pub mod traits;

pub use blob::{BlobLocator, BlobReply, BlobRequest, HeapBlobStore, BLOB_LEN_SIZE};
pub use config::{ContainerConfig, HeapConfig};
pub use container::{Container, ContainerInfo, ContainerParams, ContainerRegistry};
pub use error::{StoreError, StoreResult};
pub use heap::InMemoryHeap;
pub use traits::{BlobStore, GlobalHeap};
