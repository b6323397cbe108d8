//! Blob locators and the default heap-backed blob store.
//!
//! Locator layout written by [`HeapBlobStore`] (container byte order):
//!
//! ```text
//! [4 bytes: payload length (u32)]
//! [address_size bytes: heap collection address]
//! [4 bytes: heap entry index (u32)]
//! ```

use std::fmt;

use tracing::debug;
use xref_types::{ByteReader, ByteWriter, HeapId};

use crate::container::{Container, ContainerParams};
use crate::error::{StoreError, StoreResult};
use crate::traits::BlobStore;

/// Width of the payload-length prefix that opens every locator.
pub const BLOB_LEN_SIZE: usize = 4;

/// Encoded, fixed-width locator returned by [`BlobStore::put`].
#[derive(Clone, PartialEq, Eq)]
pub struct BlobLocator(Vec<u8>);

impl BlobLocator {
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.0
    }
}

impl fmt::Debug for BlobLocator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BlobLocator({:02x?})", self.0)
    }
}

/// Locator-level request dispatched through [`BlobStore::specific`].
#[derive(Debug)]
pub enum BlobRequest<'a> {
    /// Decode the embedded payload length without touching the backend.
    GetSize(&'a [u8]),
    /// Test whether the locator is nil.
    IsNull(&'a [u8]),
    /// Overwrite the locator with a nil one (length 0, address 0).
    SetNull(&'a mut [u8]),
    /// Reclaim the blob behind the locator. No-op for a nil locator.
    Delete(&'a [u8]),
}

impl BlobRequest<'_> {
    pub fn name(&self) -> &'static str {
        match self {
            Self::GetSize(_) => "get-size",
            Self::IsNull(_) => "is-null",
            Self::SetNull(_) => "set-null",
            Self::Delete(_) => "delete",
        }
    }
}

/// Result of a [`BlobRequest`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BlobReply {
    Size(usize),
    IsNull(bool),
    Done,
}

impl BlobReply {
    pub fn size(self) -> Option<usize> {
        match self {
            Self::Size(n) => Some(n),
            _ => None,
        }
    }

    pub fn is_null(self) -> Option<bool> {
        match self {
            Self::IsNull(b) => Some(b),
            _ => None,
        }
    }
}

/// Default blob backend: every blob is one global heap entry.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct HeapBlobStore;

impl HeapBlobStore {
    fn decode(container: &Container, locator: &[u8]) -> StoreResult<(u32, HeapId)> {
        let params = container.params();
        let mut r = ByteReader::new(locator, params.byte_order);
        let len = r
            .read_u32()
            .map_err(|e| StoreError::BadLocator(e.to_string()))?;
        let id = HeapId::decode(&mut r, params.address_size)
            .map_err(|e| StoreError::BadLocator(e.to_string()))?;
        Ok((len, id))
    }

    fn encode(container: &Container, len: u32, id: HeapId, out: &mut [u8]) -> StoreResult<()> {
        let params = container.params();
        let mut w = ByteWriter::new(out, params.byte_order);
        w.write_u32(len)?;
        id.encode(&mut w, params.address_size)?;
        Ok(())
    }
}

impl BlobStore for HeapBlobStore {
    fn locator_size(&self, params: &ContainerParams) -> usize {
        BLOB_LEN_SIZE + HeapId::encoded_size(params.address_size)
    }

    fn put(&self, container: &Container, payload: &[u8]) -> StoreResult<BlobLocator> {
        let len = u32::try_from(payload.len()).map_err(|_| StoreError::PayloadTooLarge {
            size: payload.len(),
            max: u32::MAX as usize,
        })?;
        // Empty payloads are represented by a nil locator and never reach
        // the heap, so there is nothing to delete later.
        let id = if payload.is_empty() {
            HeapId::NIL
        } else {
            container.heap().insert(payload)?
        };
        let mut bytes = vec![0u8; self.locator_size(&container.params())];
        Self::encode(container, len, id, &mut bytes)?;
        debug!(container = container.name(), id = %id, len, "blob put");
        Ok(BlobLocator(bytes))
    }

    fn get(&self, container: &Container, locator: &[u8], out: &mut [u8]) -> StoreResult<usize> {
        let (_, id) = Self::decode(container, locator)?;
        if id.is_nil() {
            return Ok(0);
        }
        container.heap().read_into(&id, out)
    }

    fn specific(&self, container: &Container, request: BlobRequest<'_>) -> StoreResult<BlobReply> {
        match request {
            BlobRequest::GetSize(locator) => {
                let mut r = ByteReader::new(locator, container.byte_order());
                let len = r
                    .read_u32()
                    .map_err(|e| StoreError::BadLocator(e.to_string()))?;
                Ok(BlobReply::Size(len as usize))
            }
            BlobRequest::IsNull(locator) => {
                let (_, id) = Self::decode(container, locator)?;
                Ok(BlobReply::IsNull(id.is_nil()))
            }
            BlobRequest::SetNull(locator) => {
                Self::encode(container, 0, HeapId::NIL, locator)?;
                Ok(BlobReply::Done)
            }
            BlobRequest::Delete(locator) => {
                let (len, id) = Self::decode(container, locator)?;
                if !id.is_nil() {
                    container.heap().remove(&id)?;
                    debug!(container = container.name(), id = %id, len, "blob deleted");
                }
                Ok(BlobReply::Done)
            }
        }
    }
}
