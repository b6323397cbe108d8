//! Shared fixtures for converter tests.

use std::sync::{Arc, Mutex};

use xref_store::{
    BlobLocator, BlobReply, BlobRequest, BlobStore, Container, ContainerConfig, ContainerParams,
    HeapBlobStore, InMemoryHeap, StoreError, StoreResult,
};
use xref_types::{Address, ByteOrder, ObjectToken};

/// Blob store that records every call before delegating to the heap
/// backend, and can be told to fail one operation.
#[derive(Debug, Default)]
pub struct RecordingBlobs {
    inner: HeapBlobStore,
    ops: Mutex<Vec<&'static str>>,
    fail: Mutex<Option<&'static str>>,
}

impl RecordingBlobs {
    pub fn ops(&self) -> Vec<&'static str> {
        self.ops.lock().expect("lock poisoned").clone()
    }

    pub fn clear(&self) {
        self.ops.lock().expect("lock poisoned").clear();
    }

    pub fn fail_on(&self, op: &'static str) {
        *self.fail.lock().expect("lock poisoned") = Some(op);
    }

    fn record(&self, op: &'static str) -> StoreResult<()> {
        self.ops.lock().expect("lock poisoned").push(op);
        if *self.fail.lock().expect("lock poisoned") == Some(op) {
            return Err(StoreError::Backend(format!("injected {op} failure")));
        }
        Ok(())
    }
}

impl BlobStore for RecordingBlobs {
    fn locator_size(&self, params: &ContainerParams) -> usize {
        self.inner.locator_size(params)
    }

    fn put(&self, container: &Container, payload: &[u8]) -> StoreResult<BlobLocator> {
        self.record("put")?;
        self.inner.put(container, payload)
    }

    fn get(&self, container: &Container, locator: &[u8], out: &mut [u8]) -> StoreResult<usize> {
        self.record("get")?;
        self.inner.get(container, locator, out)
    }

    fn specific(&self, container: &Container, request: BlobRequest<'_>) -> StoreResult<BlobReply> {
        self.record(request.name())?;
        self.inner.specific(container, request)
    }
}

pub fn container(name: &str) -> Container {
    Container::create(&ContainerConfig::named(name)).unwrap()
}

pub fn recording_container(name: &str) -> (Container, Arc<RecordingBlobs>) {
    let config = ContainerConfig::named(name);
    let blobs = Arc::new(RecordingBlobs::default());
    let heap = Arc::new(InMemoryHeap::new(config.heap.clone()));
    let container = Container::with_backends(&config, heap, blobs.clone()).unwrap();
    (container, blobs)
}

pub fn token(addr: u64) -> ObjectToken {
    ObjectToken::from_address(Address::new(addr), 8, ByteOrder::Little).unwrap()
}
