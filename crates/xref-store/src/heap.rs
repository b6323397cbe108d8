use std::collections::BTreeMap;
use std::sync::RwLock;

use tracing::debug;
use xref_types::{Address, HeapId};

use crate::config::HeapConfig;
use crate::error::{StoreError, StoreResult};
use crate::traits::GlobalHeap;

/// Bookkeeping bytes charged per entry against a collection's capacity.
const ENTRY_OVERHEAD: usize = 16;

/// One heap collection: a fixed-capacity run of entries at one address.
#[derive(Debug)]
struct Collection {
    capacity: usize,
    used: usize,
    next_index: u32,
    entries: BTreeMap<u32, Vec<u8>>,
}

impl Collection {
    fn new(capacity: usize) -> Self {
        Self {
            capacity,
            used: 0,
            // Index 0 is never handed out.
            next_index: 1,
            entries: BTreeMap::new(),
        }
    }

    fn fits(&self, need: usize) -> bool {
        self.capacity - self.used >= need && self.next_index < u32::MAX
    }
}

#[derive(Debug)]
struct HeapState {
    collections: BTreeMap<Address, Collection>,
    current: Option<Address>,
    next_addr: u64,
}

/// In-memory, append-only global heap.
///
/// Entries are packed into collections of `collection_size` bytes. A removed
/// entry's index is never handed out again, and a collection's address
/// space is not reused once the collection empties.
#[derive(Debug)]
pub struct InMemoryHeap {
    config: HeapConfig,
    max_address: u64,
    state: RwLock<HeapState>,
}

impl InMemoryHeap {
    /// Create an empty heap with an unbounded (64-bit) address space.
    pub fn new(config: HeapConfig) -> Self {
        Self::with_address_limit(config, u64::MAX)
    }

    /// Create an empty heap whose collections must end at or below
    /// `max_address`.
    pub fn with_address_limit(config: HeapConfig, max_address: u64) -> Self {
        let next_addr = config.base_address;
        Self {
            config,
            max_address,
            state: RwLock::new(HeapState {
                collections: BTreeMap::new(),
                current: None,
                next_addr,
            }),
        }
    }

    /// Number of live entries.
    pub fn len(&self) -> usize {
        let state = self.state.read().expect("lock poisoned");
        state.collections.values().map(|c| c.entries.len()).sum()
    }

    /// Returns `true` if no entries are live.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Total payload bytes across live entries.
    pub fn total_bytes(&self) -> usize {
        let state = self.state.read().expect("lock poisoned");
        state
            .collections
            .values()
            .flat_map(|c| c.entries.values())
            .map(Vec::len)
            .sum()
    }

    /// Number of collections currently allocated.
    pub fn collection_count(&self) -> usize {
        self.state.read().expect("lock poisoned").collections.len()
    }

    /// Returns `true` if `id` names a live entry.
    pub fn contains(&self, id: &HeapId) -> bool {
        let state = self.state.read().expect("lock poisoned");
        state
            .collections
            .get(&id.addr)
            .is_some_and(|c| c.entries.contains_key(&id.index))
    }

    fn allocate_collection(&self, state: &mut HeapState, capacity: usize) -> StoreResult<Address> {
        let addr = state.next_addr;
        let end = addr
            .checked_add(capacity as u64)
            .filter(|end| end - 1 <= self.max_address)
            .ok_or(StoreError::AddressSpaceExhausted)?;
        state.next_addr = end;
        let addr = Address::new(addr);
        state.collections.insert(addr, Collection::new(capacity));
        debug!(addr = %addr, capacity, "heap collection allocated");
        Ok(addr)
    }
}

impl GlobalHeap for InMemoryHeap {
    fn insert(&self, payload: &[u8]) -> StoreResult<HeapId> {
        if payload.len() > u32::MAX as usize {
            return Err(StoreError::PayloadTooLarge {
                size: payload.len(),
                max: u32::MAX as usize,
            });
        }
        let need = payload.len() + ENTRY_OVERHEAD;
        let mut state = self.state.write().expect("lock poisoned");

        let reuse = state
            .current
            .filter(|addr| state.collections.get(addr).is_some_and(|c| c.fits(need)));
        let addr = match reuse {
            Some(addr) => addr,
            None if need > self.config.collection_size => {
                // Oversized payloads get a dedicated collection and leave the
                // current one open for small entries.
                self.allocate_collection(&mut state, need)?
            }
            None => {
                let addr = self.allocate_collection(&mut state, self.config.collection_size)?;
                state.current = Some(addr);
                addr
            }
        };

        let collection = state
            .collections
            .get_mut(&addr)
            .ok_or_else(|| StoreError::Backend("collection vanished during insert".into()))?;
        let index = collection.next_index;
        collection.next_index += 1;
        collection.used += need;
        collection.entries.insert(index, payload.to_vec());

        let id = HeapId::new(addr, index);
        debug!(id = %id, len = payload.len(), "heap insert");
        Ok(id)
    }

    fn read(&self, id: &HeapId) -> StoreResult<Vec<u8>> {
        if id.is_nil() {
            return Err(StoreError::NilHeapId);
        }
        let state = self.state.read().expect("lock poisoned");
        state
            .collections
            .get(&id.addr)
            .and_then(|c| c.entries.get(&id.index))
            .cloned()
            .ok_or(StoreError::HeapEntryNotFound(*id))
    }

    fn remove(&self, id: &HeapId) -> StoreResult<()> {
        if id.is_nil() {
            return Err(StoreError::NilHeapId);
        }
        let mut state = self.state.write().expect("lock poisoned");
        let collection = state
            .collections
            .get_mut(&id.addr)
            .ok_or(StoreError::HeapEntryNotFound(*id))?;
        let data = collection
            .entries
            .remove(&id.index)
            .ok_or(StoreError::HeapEntryNotFound(*id))?;
        collection.used -= data.len() + ENTRY_OVERHEAD;

        if collection.entries.is_empty() && state.current != Some(id.addr) {
            state.collections.remove(&id.addr);
            debug!(addr = %id.addr, "heap collection released");
        }
        debug!(id = %id, len = data.len(), "heap remove");
        Ok(())
    }

    fn entry_count(&self) -> usize {
        self.len()
    }
}
