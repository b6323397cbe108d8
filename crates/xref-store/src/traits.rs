use std::fmt;

use xref_types::HeapId;

use crate::blob::{BlobLocator, BlobReply, BlobRequest};
use crate::container::{Container, ContainerParams};
use crate::error::{StoreError, StoreResult};

/// Append-only global heap of variable-length byte entries.
///
/// All implementations must satisfy these invariants:
/// - `insert` either stores the whole payload and returns a non-nil id, or
///   fails and stores nothing.
/// - Ids are never reused. A removed entry's id stays dangling forever.
/// - There is no garbage collector: an entry lives until `remove` is called.
pub trait GlobalHeap: Send + Sync + fmt::Debug {
    /// Store `payload` and return its locator.
    fn insert(&self, payload: &[u8]) -> StoreResult<HeapId>;

    /// Read a copy of the entry at `id`.
    ///
    /// Returns `Err(HeapEntryNotFound)` if no such entry exists.
    fn read(&self, id: &HeapId) -> StoreResult<Vec<u8>>;

    /// Remove the entry at `id`, reclaiming its space.
    fn remove(&self, id: &HeapId) -> StoreResult<()>;

    /// Number of live entries.
    fn entry_count(&self) -> usize;

    /// Read the entry at `id` into `out`, returning the entry length.
    ///
    /// Default implementation goes through `read()`. Fails with
    /// `BufferTooSmall` rather than truncating.
    fn read_into(&self, id: &HeapId, out: &mut [u8]) -> StoreResult<usize> {
        let data = self.read(id)?;
        if data.len() > out.len() {
            return Err(StoreError::BufferTooSmall {
                needed: data.len(),
                available: out.len(),
            });
        }
        out[..data.len()].copy_from_slice(&data);
        Ok(data.len())
    }
}

/// Pluggable backend that parks variable-length payloads behind fixed-size
/// locators.
///
/// A locator is `[u32 payload length][backend token]`, encoded in the
/// container's byte order. Its width is fixed per container and reported by
/// [`BlobStore::locator_size`]. A locator whose embedded address is 0 is
/// nil: it denotes "no stored data".
pub trait BlobStore: Send + Sync + fmt::Debug {
    /// Width in bytes of a locator for a container with these parameters.
    fn locator_size(&self, params: &ContainerParams) -> usize;

    /// Store `payload` and return its locator.
    ///
    /// Atomic with respect to the caller: on error nothing is stored.
    fn put(&self, container: &Container, payload: &[u8]) -> StoreResult<BlobLocator>;

    /// Copy the blob behind `locator` into `out`, returning its length.
    ///
    /// A nil locator is a no-op returning 0; `out` is left untouched.
    fn get(&self, container: &Container, locator: &[u8], out: &mut [u8]) -> StoreResult<usize>;

    /// Locator-level operations: size, nil test, nil write, delete.
    fn specific(&self, container: &Container, request: BlobRequest<'_>) -> StoreResult<BlobReply>;

    /// Backend-defined extension point. No behavior by default.
    fn optional(&self, _container: &Container, _locator: &[u8]) -> StoreResult<()> {
        Ok(())
    }
}
