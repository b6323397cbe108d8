//! Legacy fixed-width reference records.
//!
//! A legacy object record is the target's address, `address_size` bytes in
//! container byte order. A legacy region record is a heap id
//! `[address][u32 index]` whose heap entry holds `[object address][selection]`.
//! Both layouts are frozen: they are decoded for backward compatibility and
//! only ever produced to build fixtures.

use tracing::warn;
use xref_store::Container;
use xref_types::{Address, ByteOrder, ByteReader, ByteWriter, HeapId, Selection};

use crate::error::{CodecError, CodecResult};

/// Decode a legacy object record into the referenced address.
pub fn decode_object_addr(bytes: &[u8], address_size: usize, order: ByteOrder) -> CodecResult<Address> {
    let mut r = ByteReader::new(bytes, order);
    Ok(Address::new(r.read_uint(address_size)?))
}

/// Encode `addr` as a legacy object record.
pub fn encode_object_addr(addr: Address, address_size: usize, order: ByteOrder) -> CodecResult<Vec<u8>> {
    let mut out = vec![0u8; address_size];
    ByteWriter::new(&mut out, order).write_uint(addr.get(), address_size)?;
    Ok(out)
}

/// Decode the heap id at the front of a legacy region record.
pub fn region_heap_id(container: &Container, bytes: &[u8]) -> CodecResult<HeapId> {
    let mut r = ByteReader::new(bytes, container.byte_order());
    Ok(HeapId::decode(&mut r, container.address_size())?)
}

/// Decode a legacy region record by looking up its heap entry.
pub fn decode_addr_region(container: &Container, bytes: &[u8]) -> CodecResult<(Address, Selection)> {
    let id = region_heap_id(container, bytes)?;
    if id.is_nil() {
        return Err(CodecError::CantDecode("nil region reference".into()));
    }
    let entry = container.heap().read(&id)?;

    let mut r = ByteReader::new(&entry, container.byte_order());
    let addr = r
        .read_uint(container.address_size())
        .map(Address::new)
        .map_err(|e| CodecError::CantDecode(format!("region heap entry {id}: {e}")))?;
    let selection = Selection::decode(r.rest()).map_err(|e| {
        warn!(id = %id, error = %e, "region heap entry holds an invalid selection");
        CodecError::CantDecode(format!("region heap entry {id}: {e}"))
    })?;
    Ok((addr, selection))
}

/// Store `[addr][selection]` in the container's heap and return the legacy
/// region record pointing at it.
pub fn encode_addr_region(
    container: &Container,
    addr: Address,
    selection: &Selection,
) -> CodecResult<Vec<u8>> {
    let address_size = container.address_size();
    let order = container.byte_order();
    let sel = selection.encode()?;

    let mut entry = vec![0u8; address_size + sel.len()];
    let mut w = ByteWriter::new(&mut entry, order);
    w.write_uint(addr.get(), address_size)?;
    w.write_bytes(&sel)?;
    let id = container.heap().insert(&entry)?;

    let mut out = vec![0u8; HeapId::encoded_size(address_size)];
    id.encode(&mut ByteWriter::new(&mut out, order), address_size)?;
    Ok(out)
}
