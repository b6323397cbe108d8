use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, RwLock, Weak};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use xref_types::{ByteOrder, HeapId};

use crate::blob::{HeapBlobStore, BLOB_LEN_SIZE};
use crate::config::ContainerConfig;
use crate::error::{StoreError, StoreResult};
use crate::heap::InMemoryHeap;
use crate::traits::{BlobStore, GlobalHeap};

/// Addressing parameters of a container.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContainerParams {
    pub address_size: usize,
    pub token_size: usize,
    pub byte_order: ByteOrder,
}

impl ContainerParams {
    /// Width of an encoded [`HeapId`] in this container.
    pub fn heap_id_size(&self) -> usize {
        HeapId::encoded_size(self.address_size)
    }
}

/// Sizes queried by the disk-side converter when computing record widths.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ContainerInfo {
    pub token_size: usize,
    pub blob_id_size: usize,
}

struct ContainerInner {
    name: String,
    params: ContainerParams,
    heap: Arc<dyn GlobalHeap>,
    blobs: Arc<dyn BlobStore>,
}

/// Shared handle to an open container.
///
/// Cloning the handle acquires another capability on the same container;
/// dropping it releases one. Two handles are equal only if they refer to the
/// same open container.
#[derive(Clone)]
pub struct Container {
    inner: Arc<ContainerInner>,
}

impl Container {
    /// Open a container with the default in-memory heap and blob backend.
    pub fn create(config: &ContainerConfig) -> StoreResult<Self> {
        config.validate()?;
        let heap = InMemoryHeap::with_address_limit(config.heap.clone(), config.max_address());
        Self::with_backends(config, Arc::new(heap), Arc::new(HeapBlobStore))
    }

    /// Open a container over caller-supplied backends.
    pub fn with_backends(
        config: &ContainerConfig,
        heap: Arc<dyn GlobalHeap>,
        blobs: Arc<dyn BlobStore>,
    ) -> StoreResult<Self> {
        config.validate()?;
        let params = config.params();
        debug!(
            name = %config.name,
            address_size = params.address_size,
            token_size = params.token_size,
            "container opened"
        );
        Ok(Self {
            inner: Arc::new(ContainerInner {
                name: config.name.clone(),
                params,
                heap,
                blobs,
            }),
        })
    }

    pub fn name(&self) -> &str {
        &self.inner.name
    }

    pub fn params(&self) -> ContainerParams {
        self.inner.params
    }

    pub fn address_size(&self) -> usize {
        self.inner.params.address_size
    }

    pub fn token_size(&self) -> usize {
        self.inner.params.token_size
    }

    pub fn byte_order(&self) -> ByteOrder {
        self.inner.params.byte_order
    }

    pub fn heap(&self) -> &dyn GlobalHeap {
        self.inner.heap.as_ref()
    }

    pub fn blob_store(&self) -> &dyn BlobStore {
        self.inner.blobs.as_ref()
    }

    /// Number of live global heap entries.
    pub fn heap_entries(&self) -> usize {
        self.inner.heap.entry_count()
    }

    /// Width of a blob locator in this container.
    pub fn blob_id_size(&self) -> usize {
        self.inner.blobs.locator_size(&self.inner.params)
    }

    /// Token and blob locator widths.
    ///
    /// Fails if the blob backend reports a locator too narrow to carry
    /// anything past the length prefix.
    pub fn info(&self) -> StoreResult<ContainerInfo> {
        let blob_id_size = self.blob_id_size();
        if blob_id_size <= BLOB_LEN_SIZE {
            warn!(name = self.name(), blob_id_size, "blob backend reported unusable locator size");
            return Err(StoreError::Backend(format!(
                "blob locator size {blob_id_size} leaves no room for a backend token"
            )));
        }
        Ok(ContainerInfo {
            token_size: self.token_size(),
            blob_id_size,
        })
    }

    /// Returns `true` if both handles refer to the same open container.
    pub fn same_as(&self, other: &Container) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// Number of live handles (capabilities) on this container.
    pub fn open_handles(&self) -> usize {
        Arc::strong_count(&self.inner)
    }
}

impl PartialEq for Container {
    fn eq(&self, other: &Self) -> bool {
        self.same_as(other)
    }
}

impl Eq for Container {}

impl fmt::Debug for Container {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Container")
            .field("name", &self.inner.name)
            .field("params", &self.inner.params)
            .finish()
    }
}

/// Name-indexed table of open containers.
///
/// Holds weak entries only: registering a container does not keep it open.
/// Used to resolve the container name carried by an external reference.
#[derive(Clone, Default)]
pub struct ContainerRegistry {
    entries: Arc<RwLock<HashMap<String, Weak<ContainerInner>>>>,
}

impl ContainerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `container` under its name, replacing any previous entry.
    /// Entries of containers that have since closed are dropped.
    pub fn register(&self, container: &Container) {
        let mut entries = self.entries.write().expect("lock poisoned");
        entries.retain(|_, w| w.strong_count() > 0);
        entries.insert(container.name().to_string(), Arc::downgrade(&container.inner));
        debug!(name = container.name(), "container registered");
    }

    /// Resolve `name` to a new handle on the container, if it is still open.
    pub fn resolve(&self, name: &str) -> Option<Container> {
        let entries = self.entries.read().expect("lock poisoned");
        entries
            .get(name)
            .and_then(Weak::upgrade)
            .map(|inner| Container { inner })
    }

    /// Forget `name`. Returns `true` if an entry was present.
    pub fn remove(&self, name: &str) -> bool {
        let mut entries = self.entries.write().expect("lock poisoned");
        entries.remove(name).is_some()
    }

    /// Number of entries whose container is still open.
    pub fn len(&self) -> usize {
        let entries = self.entries.read().expect("lock poisoned");
        entries.values().filter(|w| w.strong_count() > 0).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl PartialEq for ContainerRegistry {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.entries, &other.entries)
    }
}

impl Eq for ContainerRegistry {}

impl fmt::Debug for ContainerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContainerRegistry")
            .field("open", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blob::{BlobLocator, BlobReply, BlobRequest};

    fn config(name: &str) -> ContainerConfig {
        ContainerConfig::named(name)
    }

    #[test]
    fn create_reports_params() {
        let mut cfg = config("A");
        cfg.address_size = 4;
        cfg.token_size = Some(12);
        let c = Container::create(&cfg).unwrap();
        assert_eq!(c.name(), "A");
        assert_eq!(c.address_size(), 4);
        assert_eq!(c.token_size(), 12);
        assert_eq!(c.byte_order(), ByteOrder::Little);
        assert_eq!(c.params().heap_id_size(), 8);
    }

    #[test]
    fn create_rejects_invalid_config() {
        let mut cfg = config("bad");
        cfg.address_size = 0;
        assert!(matches!(
            Container::create(&cfg),
            Err(StoreError::InvalidConfig(_))
        ));
    }

    #[test]
    fn info_reports_blob_id_size() {
        let c = Container::create(&config("A")).unwrap();
        let info = c.info().unwrap();
        assert_eq!(info.token_size, 8);
        assert_eq!(info.blob_id_size, 4 + 8 + 4);
    }

    #[derive(Debug)]
    struct NarrowBlobs;

    impl BlobStore for NarrowBlobs {
        fn locator_size(&self, _params: &ContainerParams) -> usize {
            BLOB_LEN_SIZE
        }
        fn put(&self, _c: &Container, _payload: &[u8]) -> StoreResult<BlobLocator> {
            Err(StoreError::Backend("unsupported".into()))
        }
        fn get(&self, _c: &Container, _l: &[u8], _out: &mut [u8]) -> StoreResult<usize> {
            Err(StoreError::Backend("unsupported".into()))
        }
        fn specific(&self, _c: &Container, _r: BlobRequest<'_>) -> StoreResult<BlobReply> {
            Err(StoreError::Backend("unsupported".into()))
        }
    }

    #[test]
    fn info_fails_for_unusable_backend() {
        let cfg = config("narrow");
        let heap = Arc::new(InMemoryHeap::new(cfg.heap.clone()));
        let c = Container::with_backends(&cfg, heap, Arc::new(NarrowBlobs)).unwrap();
        assert!(matches!(c.info(), Err(StoreError::Backend(_))));
    }

    #[test]
    fn identity_and_handle_counting() {
        let a = Container::create(&config("A")).unwrap();
        let b = Container::create(&config("A")).unwrap();
        assert_ne!(a, b);
        assert_eq!(a.open_handles(), 1);

        let a2 = a.clone();
        assert_eq!(a, a2);
        assert_eq!(a.open_handles(), 2);
        drop(a2);
        assert_eq!(a.open_handles(), 1);
    }

    #[test]
    fn registry_resolves_open_containers() {
        let registry = ContainerRegistry::new();
        let a = Container::create(&config("A")).unwrap();
        registry.register(&a);
        assert_eq!(registry.len(), 1);

        let resolved = registry.resolve("A").unwrap();
        assert!(resolved.same_as(&a));
        assert_eq!(a.open_handles(), 2);
        drop(resolved);

        assert!(registry.resolve("B").is_none());
    }

    #[test]
    fn registry_does_not_keep_containers_open() {
        let registry = ContainerRegistry::new();
        let a = Container::create(&config("A")).unwrap();
        registry.register(&a);
        assert_eq!(a.open_handles(), 1);
        drop(a);
        assert!(registry.resolve("A").is_none());
        assert!(registry.is_empty());
    }

    #[test]
    fn register_prunes_closed_containers() {
        let registry = ContainerRegistry::new();
        for i in 0..5 {
            let c = Container::create(&config(&format!("tmp-{i}"))).unwrap();
            registry.register(&c);
        }
        let keep = Container::create(&config("keep")).unwrap();
        registry.register(&keep);

        let entries = registry.entries.read().unwrap();
        assert_eq!(entries.len(), 1);
        assert!(entries.contains_key("keep"));
    }

    #[test]
    fn registry_remove() {
        let registry = ContainerRegistry::new();
        let a = Container::create(&config("A")).unwrap();
        registry.register(&a);
        assert!(registry.remove("A"));
        assert!(!registry.remove("A"));
        assert!(registry.resolve("A").is_none());
    }

    #[test]
    fn heap_entries_tracks_backend() {
        let c = Container::create(&config("A")).unwrap();
        assert_eq!(c.heap_entries(), 0);
        c.heap().insert(b"x").unwrap();
        assert_eq!(c.heap_entries(), 1);
    }
}
