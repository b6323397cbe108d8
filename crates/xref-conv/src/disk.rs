//! Converter between generic encodings and fixed-width on-disk records.
//!
//! Record layout (length and locator in container byte order):
//!
//! ```text
//! [u8 kind][u8 flags][u32 payload length][blob locator][zero padding]
//! ```
//!
//! The payload is the encoding minus its 2-byte header and lives in the
//! container's blob store. A local object reference is the exception: its
//! encoding always fits the record width, so it is stored inline, padded
//! with zeros, and owns no blob.
//!
//! Encodings read from another container are re-encoded on write so that
//! their external flag is relative to this one.

use std::borrow::Cow;

use tracing::{debug, warn};
use xref_codec::wire::{decode, decode_header, encode_to_vec, encoded_size};
use xref_codec::{ReferenceHandle, ENCODE_HEADER_SIZE, FLAG_EXTERNAL};
use xref_store::{BlobRequest, Container, StoreError, BLOB_LEN_SIZE};
use xref_types::{ByteReader, ByteWriter, RefKind};

use crate::binding::{
    EncodedSize, LegacyValue, RefReader, RefSlot, RefSource, RefWriter, SizeQuery, WriteSource,
};
use crate::error::{ConvError, ConvResult};

/// Offset of the blob locator within a record.
const LOCATOR_OFFSET: usize = ENCODE_HEADER_SIZE + BLOB_LEN_SIZE;

/// Returns `true` if the record header marks an inline local object.
fn is_inline(record: &[u8]) -> bool {
    record.len() >= ENCODE_HEADER_SIZE
        && record[0] == RefKind::Object.tag()
        && record[1] & FLAG_EXTERNAL == 0
}

fn header(bytes: &[u8]) -> ConvResult<(RefKind, u8)> {
    decode_header(bytes).map_err(|e| {
        warn!(error = %e, "rejected reference record header");
        ConvError::BadValue(e.to_string())
    })
}

/// Disk-side converter bound to one container.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DiskConverter {
    container: Container,
    record_size: usize,
}

impl DiskConverter {
    /// Bind to `container`, computing the generic record width from its
    /// token and blob locator widths.
    pub fn new(container: Container) -> ConvResult<Self> {
        let record_size = Self::record_size_for(&container)?;
        Ok(Self {
            container,
            record_size,
        })
    }

    /// Generic record width for `container`: room for header, length and
    /// blob locator, and never less than the smallest possible encoding.
    pub fn record_size_for(container: &Container) -> ConvResult<usize> {
        let info = container.info().map_err(ConvError::CantGetContainerInfo)?;
        let probe = ReferenceHandle::zeroed_object(info.token_size).map_err(ConvError::EncodeSize)?;
        let min_encode = encoded_size(&probe, None).map_err(ConvError::EncodeSize)?;
        Ok((LOCATOR_OFFSET + info.blob_id_size).max(min_encode))
    }

    pub fn container(&self) -> &Container {
        &self.container
    }

    pub fn record_size(&self) -> usize {
        self.record_size
    }

    fn locator<'a>(&self, record: &'a [u8]) -> ConvResult<&'a [u8]> {
        record.get(LOCATOR_OFFSET..).ok_or_else(|| {
            ConvError::BadValue(format!(
                "record of {} bytes has no blob locator",
                record.len()
            ))
        })
    }

    fn check_slot(&self, out: &[u8]) -> ConvResult<()> {
        if out.len() != self.record_size {
            return Err(ConvError::SizeMismatch {
                expected: self.record_size,
                actual: out.len(),
            });
        }
        Ok(())
    }

    /// Re-encode `bytes` for this container when they were read from a
    /// different one, so a reference local to its source becomes external
    /// here and one naming this container becomes local.
    fn rescope<'a>(
        &self,
        bytes: &'a [u8],
        source_container: Option<&Container>,
    ) -> ConvResult<Cow<'a, [u8]>> {
        let Some(src) = source_container.filter(|c| !c.same_as(&self.container)) else {
            return Ok(Cow::Borrowed(bytes));
        };
        let (handle, _) = decode(bytes).map_err(|e| ConvError::CantDecode(e.to_string()))?;
        let handle = match handle.container_name() {
            Some(_) => handle,
            None => handle.with_container_name(src.name()),
        };
        let encoded = encode_to_vec(&handle, Some(&self.container)).map_err(ConvError::Encode)?;
        debug!(
            from = src.name(),
            to = self.container.name(),
            external = handle.is_external_to(Some(&self.container)),
            "reference rescoped between containers"
        );
        Ok(Cow::Owned(encoded))
    }

    /// Reclaim the blob owned by a record about to be overwritten.
    fn delete_previous(&self, previous: Option<&[u8]>) -> ConvResult<()> {
        let Some(previous) = previous else {
            return Ok(());
        };
        if is_inline(previous) {
            return Ok(());
        }
        let locator = self.locator(previous)?;
        self.container
            .blob_store()
            .specific(&self.container, BlobRequest::Delete(locator))
            .map_err(ConvError::CantRemove)?;
        Ok(())
    }
}

impl SizeQuery for DiskConverter {
    fn size(&self, source: RefSource<'_>, _destination: Option<&Container>) -> ConvResult<EncodedSize> {
        let record = source.record()?;
        let (kind, flags) = header(record)?;
        if kind == RefKind::Object && flags & FLAG_EXTERNAL == 0 {
            return Ok(EncodedSize::direct(record.len()));
        }
        let mut r = ByteReader::new(record, self.container.byte_order());
        r.skip(ENCODE_HEADER_SIZE)
            .and_then(|_| r.read_u32())
            .map(|len| EncodedSize::measured(len as usize + ENCODE_HEADER_SIZE))
            .map_err(|e| ConvError::BadValue(e.to_string()))
    }

    fn is_null(&self, source: RefSource<'_>) -> ConvResult<bool> {
        let record = source.record()?;
        if is_inline(record) {
            return Ok(false);
        }
        let reply = self
            .container
            .blob_store()
            .specific(&self.container, BlobRequest::IsNull(self.locator(record)?))
            .map_err(ConvError::CantGet)?;
        reply
            .is_null()
            .ok_or_else(|| ConvError::CantGet(StoreError::Backend(format!("unexpected reply {reply:?}"))))
    }
}

impl RefReader for DiskConverter {
    fn read(&self, source: RefSource<'_>, _destination: Option<&Container>, out: &mut [u8]) -> ConvResult<()> {
        let record = source.record()?;
        header(record)?;

        if is_inline(record) {
            if out.len() != record.len() {
                return Err(ConvError::SizeMismatch {
                    expected: record.len(),
                    actual: out.len(),
                });
            }
            out.copy_from_slice(record);
            return Ok(());
        }

        let Some(expected) = out.len().checked_sub(ENCODE_HEADER_SIZE) else {
            return Err(ConvError::SizeMismatch {
                expected: ENCODE_HEADER_SIZE,
                actual: out.len(),
            });
        };
        let locator = self.locator(record)?;
        let (head, payload) = out.split_at_mut(ENCODE_HEADER_SIZE);
        head.copy_from_slice(&record[..ENCODE_HEADER_SIZE]);

        let got = self
            .container
            .blob_store()
            .get(&self.container, locator, payload)
            .map_err(|e| match e {
                StoreError::BufferTooSmall { needed, .. } => ConvError::SizeMismatch {
                    expected,
                    actual: needed,
                },
                other => ConvError::CantGet(other),
            })?;
        if got != expected {
            return Err(ConvError::SizeMismatch {
                expected,
                actual: got,
            });
        }
        Ok(())
    }
}

impl RefWriter for DiskConverter {
    fn write(
        &self,
        source: WriteSource<'_>,
        source_container: Option<&Container>,
        slot: RefSlot<'_>,
        previous: Option<&[u8]>,
    ) -> ConvResult<()> {
        let bytes = match source {
            WriteSource::Encoded(bytes) => bytes,
            WriteSource::Legacy(value) => {
                let kind = match value {
                    LegacyValue::Object(_) => RefKind::LegacyObject,
                    LegacyValue::Region { .. } => RefKind::LegacyRegion,
                };
                return Err(ConvError::UnsupportedReferenceKind(kind));
            }
        };
        let RefSlot::Record(out) = slot else {
            return Err(ConvError::SourceMismatch("expected an on-disk record slot"));
        };
        self.check_slot(out)?;
        let (kind, _) = header(bytes)?;
        if kind.is_legacy() {
            return Err(ConvError::UnsupportedReferenceKind(kind));
        }
        let bytes = self.rescope(bytes, source_container)?;
        let bytes: &[u8] = &bytes;

        if is_inline(bytes) {
            // A copied inline record arrives with its source's padding.
            let (_, used) = decode(bytes).map_err(|e| ConvError::CantDecode(e.to_string()))?;
            if used > out.len() {
                return Err(ConvError::SizeMismatch {
                    expected: out.len(),
                    actual: used,
                });
            }
            self.delete_previous(previous)?;
            out.fill(0);
            out[..used].copy_from_slice(&bytes[..used]);
            debug!(container = self.container.name(), len = used, "inline reference written");
            return Ok(());
        }

        self.delete_previous(previous)?;

        let payload = &bytes[ENCODE_HEADER_SIZE..];
        let len = u32::try_from(payload.len()).map_err(|_| {
            ConvError::CantSet(StoreError::PayloadTooLarge {
                size: payload.len(),
                max: u32::MAX as usize,
            })
        })?;
        let blobs = self.container.blob_store();
        let locator = blobs
            .put(&self.container, payload)
            .map_err(ConvError::CantSet)?;
        if locator.len() > out.len() - LOCATOR_OFFSET {
            blobs
                .specific(&self.container, BlobRequest::Delete(locator.as_bytes()))
                .map_err(ConvError::CantRemove)?;
            return Err(ConvError::CantSet(StoreError::BadLocator(format!(
                "locator of {} bytes does not fit record",
                locator.len()
            ))));
        }

        out.fill(0);
        out[..ENCODE_HEADER_SIZE].copy_from_slice(&bytes[..ENCODE_HEADER_SIZE]);
        ByteWriter::new(&mut out[ENCODE_HEADER_SIZE..LOCATOR_OFFSET], self.container.byte_order())
            .write_u32(len)
            .map_err(|e| ConvError::CantSet(e.into()))?;
        out[LOCATOR_OFFSET..LOCATOR_OFFSET + locator.len()].copy_from_slice(locator.as_bytes());
        debug!(
            container = self.container.name(),
            kind = %kind,
            len,
            "reference payload stored as blob"
        );
        Ok(())
    }

    fn set_null(&self, slot: RefSlot<'_>, previous: Option<&[u8]>) -> ConvResult<()> {
        let RefSlot::Record(out) = slot else {
            return Err(ConvError::SourceMismatch("expected an on-disk record slot"));
        };
        self.check_slot(out)?;
        self.delete_previous(previous)?;
        out.fill(0);
        self.container
            .blob_store()
            .specific(&self.container, BlobRequest::SetNull(&mut out[LOCATOR_OFFSET..]))
            .map_err(ConvError::CantSet)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{container, recording_container, token};
    use xref_codec::wire::{decode, encode_to_vec};
    use xref_store::ContainerConfig;
    use xref_types::{Address, Selection};

    fn region_encoding(c: &Container, addr: u64) -> Vec<u8> {
        let h = ReferenceHandle::region(c.clone(), token(addr), Selection::all(vec![8, 8])).unwrap();
        encode_to_vec(&h, Some(c)).unwrap()
    }

    fn write(conv: &DiskConverter, bytes: &[u8], previous: Option<&[u8]>) -> Vec<u8> {
        let mut out = vec![0u8; conv.record_size()];
        conv.write(WriteSource::Encoded(bytes), None, RefSlot::Record(&mut out), previous)
            .unwrap();
        out
    }

    fn read_back(conv: &DiskConverter, record: &[u8]) -> Vec<u8> {
        let size = conv.size(RefSource::Record(record), None).unwrap();
        let mut out = vec![0u8; size.len];
        conv.read(RefSource::Record(record), None, &mut out).unwrap();
        out
    }

    // -----------------------------------------------------------------------
    // Record width
    // -----------------------------------------------------------------------

    #[test]
    fn record_width_default_container() {
        let conv = DiskConverter::new(container("A")).unwrap();
        // header 2 + length 4 + locator (4 + 8 + 4)
        assert_eq!(conv.record_size(), 22);
    }

    #[test]
    fn record_width_floor_is_minimum_encoding() {
        let mut cfg = ContainerConfig::named("narrow");
        cfg.address_size = 1;
        cfg.token_size = Some(16);
        cfg.heap.base_address = 0x10;
        let c = Container::create(&cfg).unwrap();
        // 6 + (4 + 1 + 4) = 15, but a zeroed object encodes to 2 + 1 + 16.
        assert_eq!(DiskConverter::new(c).unwrap().record_size(), 19);
    }

    // -----------------------------------------------------------------------
    // Blob-backed records
    // -----------------------------------------------------------------------

    #[test]
    fn region_record_round_trip() {
        let c = container("A");
        let conv = DiskConverter::new(c.clone()).unwrap();
        let encoding = region_encoding(&c, 0x2000);
        let record = write(&conv, &encoding, None);

        assert_eq!(&record[..2], &encoding[..2]);
        let len = u32::from_le_bytes(record[2..6].try_into().unwrap()) as usize;
        assert_eq!(len, encoding.len() - 2);
        assert_eq!(c.heap_entries(), 1);

        let size = conv.size(RefSource::Record(&record), None).unwrap();
        assert_eq!(size, EncodedSize::measured(encoding.len()));
        assert_eq!(read_back(&conv, &record), encoding);
    }

    #[test]
    fn big_endian_length_field() {
        let mut cfg = ContainerConfig::named("be");
        cfg.byte_order = xref_types::ByteOrder::Big;
        let c = Container::create(&cfg).unwrap();
        let conv = DiskConverter::new(c.clone()).unwrap();
        let h = ReferenceHandle::attribute(
            c.clone(),
            xref_types::ObjectToken::from_address(Address::new(5), 8, xref_types::ByteOrder::Big)
                .unwrap(),
            "x",
        )
        .unwrap();
        let encoding = encode_to_vec(&h, Some(&c)).unwrap();
        let record = write(&conv, &encoding, None);
        assert_eq!(&record[2..6], &(encoding.len() as u32 - 2).to_be_bytes());
        assert_eq!(read_back(&conv, &record), encoding);
    }

    #[test]
    fn external_object_goes_through_blob() {
        let a = container("A");
        let (b, blobs) = recording_container("B");
        let conv = DiskConverter::new(b.clone()).unwrap();
        let h = ReferenceHandle::object(a, token(1)).unwrap();
        let encoding = encode_to_vec(&h, Some(&b)).unwrap();

        let record = write(&conv, &encoding, None);
        assert_eq!(blobs.ops(), vec!["put"]);
        assert_eq!(record[1], FLAG_EXTERNAL);
        let size = conv.size(RefSource::Record(&record), None).unwrap();
        assert!(!size.direct_copy);
        assert_eq!(read_back(&conv, &record), encoding);
    }

    // -----------------------------------------------------------------------
    // Inline local objects
    // -----------------------------------------------------------------------

    #[test]
    fn local_object_is_inline() {
        let (c, blobs) = recording_container("A");
        let conv = DiskConverter::new(c.clone()).unwrap();
        let h = ReferenceHandle::object(c.clone(), token(0x1000)).unwrap();
        let encoding = encode_to_vec(&h, Some(&c)).unwrap();

        let record = write(&conv, &encoding, None);
        assert!(blobs.ops().is_empty());
        assert_eq!(&record[..encoding.len()], &encoding[..]);
        assert!(record[encoding.len()..].iter().all(|&b| b == 0));

        let size = conv.size(RefSource::Record(&record), None).unwrap();
        assert_eq!(size, EncodedSize::direct(record.len()));
        let copied = read_back(&conv, &record);
        assert_eq!(copied, record);
        let (decoded, consumed) = decode(&copied).unwrap();
        assert_eq!(consumed, encoding.len());
        assert_eq!(decoded.token(), &token(0x1000));
        assert!(!conv.is_null(RefSource::Record(&record)).unwrap());
    }

    fn narrow_container(name: &str) -> Container {
        let mut cfg = ContainerConfig::named(name);
        cfg.address_size = 4;
        cfg.token_size = Some(8);
        Container::create(&cfg).unwrap()
    }

    #[test]
    fn padded_inline_record_fits_narrower_record() {
        let a = container("A");
        let wide = DiskConverter::new(a.clone()).unwrap();
        let h = ReferenceHandle::object(a.clone(), token(0x1000)).unwrap();
        let encoding = encode_to_vec(&h, Some(&a)).unwrap();
        let record = write(&wide, &encoding, None);
        assert_eq!(record.len(), 22);

        let narrow = DiskConverter::new(narrow_container("A2")).unwrap();
        assert_eq!(narrow.record_size(), 18);
        let copied = write(&narrow, &record, None);
        assert_eq!(&copied[..encoding.len()], &encoding[..]);
        assert!(copied[encoding.len()..].iter().all(|&b| b == 0));
    }

    // -----------------------------------------------------------------------
    // Records from another container
    // -----------------------------------------------------------------------

    #[test]
    fn local_record_from_other_container_becomes_external() {
        let a = container("A");
        let (b, blobs) = recording_container("B");
        let from = DiskConverter::new(a.clone()).unwrap();
        let to = DiskConverter::new(b.clone()).unwrap();
        let h = ReferenceHandle::object(a.clone(), token(0x1000)).unwrap();
        let record = write(&from, &encode_to_vec(&h, Some(&a)).unwrap(), None);
        assert_eq!(record[1], 0);

        let mut out = vec![0u8; to.record_size()];
        to.write(WriteSource::Encoded(&record), Some(&a), RefSlot::Record(&mut out), None)
            .unwrap();
        assert_eq!(out[1], FLAG_EXTERNAL);
        assert_eq!(blobs.ops(), vec!["put"]);

        let (decoded, _) = decode(&read_back(&to, &out)).unwrap();
        assert_eq!(decoded.container_name(), Some("A"));
        assert_eq!(decoded.token(), &token(0x1000));
    }

    #[test]
    fn external_record_naming_destination_becomes_local() {
        let a = container("A");
        let (b, blobs) = recording_container("B");
        let from = DiskConverter::new(a.clone()).unwrap();
        let to = DiskConverter::new(b.clone()).unwrap();
        let h = ReferenceHandle::object(b.clone(), token(5)).unwrap();
        let record = write(&from, &encode_to_vec(&h, Some(&a)).unwrap(), None);
        assert_eq!(record[1], FLAG_EXTERNAL);

        let mut out = vec![0u8; to.record_size()];
        let encoding = read_back(&from, &record);
        to.write(WriteSource::Encoded(&encoding), Some(&a), RefSlot::Record(&mut out), None)
            .unwrap();
        assert_eq!(out[1], 0);
        assert!(blobs.ops().is_empty());
        assert_eq!(&out[..11], &encode_to_vec(&h, Some(&b)).unwrap()[..]);
    }

    #[test]
    fn same_container_source_is_copied_unchanged() {
        let (a, blobs) = recording_container("A");
        let conv = DiskConverter::new(a.clone()).unwrap();
        let h = ReferenceHandle::object(a.clone(), token(9)).unwrap();
        let record = write(&conv, &encode_to_vec(&h, Some(&a)).unwrap(), None);

        let mut out = vec![0u8; conv.record_size()];
        conv.write(WriteSource::Encoded(&record), Some(&a), RefSlot::Record(&mut out), None)
            .unwrap();
        assert_eq!(out, record);
        assert!(blobs.ops().is_empty());
    }

    // -----------------------------------------------------------------------
    // Overwrite
    // -----------------------------------------------------------------------

    #[test]
    fn overwrite_deletes_old_blob_before_put() {
        let (c, blobs) = recording_container("A");
        let conv = DiskConverter::new(c.clone()).unwrap();
        let first = write(&conv, &region_encoding(&c, 0x10), None);
        blobs.clear();

        let second = write(&conv, &region_encoding(&c, 0x20), Some(&first));
        assert_eq!(blobs.ops(), vec!["delete", "put"]);
        assert_eq!(c.heap_entries(), 1);
        assert_eq!(read_back(&conv, &second), region_encoding(&c, 0x20));
    }

    #[test]
    fn overwrite_of_inline_record_deletes_nothing() {
        let (c, blobs) = recording_container("A");
        let conv = DiskConverter::new(c.clone()).unwrap();
        let h = ReferenceHandle::object(c.clone(), token(1)).unwrap();
        let inline = write(&conv, &encode_to_vec(&h, Some(&c)).unwrap(), None);

        write(&conv, &region_encoding(&c, 0x10), Some(&inline));
        assert_eq!(blobs.ops(), vec!["put"]);
    }

    #[test]
    fn failed_delete_is_cant_remove_and_skips_put() {
        let (c, blobs) = recording_container("A");
        let conv = DiskConverter::new(c.clone()).unwrap();
        let first = write(&conv, &region_encoding(&c, 0x10), None);
        blobs.clear();
        blobs.fail_on("delete");

        let mut out = vec![0u8; conv.record_size()];
        let err = conv
            .write(
                WriteSource::Encoded(&region_encoding(&c, 0x20)),
                None,
                RefSlot::Record(&mut out),
                Some(&first),
            )
            .unwrap_err();
        assert!(matches!(err, ConvError::CantRemove(_)));
        assert_eq!(blobs.ops(), vec!["delete"]);
    }

    #[test]
    fn failed_put_is_cant_set() {
        let (c, blobs) = recording_container("A");
        blobs.fail_on("put");
        let conv = DiskConverter::new(c.clone()).unwrap();
        let mut out = vec![0xaau8; conv.record_size()];
        let err = conv
            .write(
                WriteSource::Encoded(&region_encoding(&c, 0x10)),
                None,
                RefSlot::Record(&mut out),
                None,
            )
            .unwrap_err();
        assert!(matches!(err, ConvError::CantSet(_)));
        assert!(out.iter().all(|&b| b == 0xaa));
        assert_eq!(c.heap_entries(), 0);
    }

    // -----------------------------------------------------------------------
    // Failure modes
    // -----------------------------------------------------------------------

    #[test]
    fn read_with_wrong_capacity_is_size_mismatch() {
        let c = container("A");
        let conv = DiskConverter::new(c.clone()).unwrap();
        let encoding = region_encoding(&c, 0x10);
        let record = write(&conv, &encoding, None);

        let mut short = vec![0u8; encoding.len() - 1];
        assert!(matches!(
            conv.read(RefSource::Record(&record), None, &mut short),
            Err(ConvError::SizeMismatch { .. })
        ));
        let mut long = vec![0u8; encoding.len() + 1];
        assert!(matches!(
            conv.read(RefSource::Record(&record), None, &mut long),
            Err(ConvError::SizeMismatch { expected, actual })
                if expected == encoding.len() - 1 && actual == encoding.len() - 2
        ));
    }

    #[test]
    fn read_of_reclaimed_blob_is_cant_get() {
        let c = container("A");
        let conv = DiskConverter::new(c.clone()).unwrap();
        let encoding = region_encoding(&c, 0x10);
        let record = write(&conv, &encoding, None);
        c.blob_store()
            .specific(&c, BlobRequest::Delete(&record[LOCATOR_OFFSET..]))
            .unwrap();

        let mut out = vec![0u8; encoding.len()];
        assert!(matches!(
            conv.read(RefSource::Record(&record), None, &mut out),
            Err(ConvError::CantGet(_))
        ));
    }

    #[test]
    fn bad_kind_is_bad_value() {
        let conv = DiskConverter::new(container("A")).unwrap();
        let mut record = vec![0u8; 22];
        record[0] = 9;
        assert!(matches!(
            conv.size(RefSource::Record(&record), None),
            Err(ConvError::BadValue(_))
        ));
        assert!(matches!(
            conv.size(RefSource::Record(&[2]), None),
            Err(ConvError::BadValue(_))
        ));
    }

    #[test]
    fn legacy_sources_cannot_be_written() {
        let c = container("A");
        let conv = DiskConverter::new(c).unwrap();
        let mut out = vec![0u8; conv.record_size()];
        let err = conv
            .write(
                WriteSource::Legacy(LegacyValue::Object(Address::new(1))),
                None,
                RefSlot::Record(&mut out),
                None,
            )
            .unwrap_err();
        assert!(matches!(
            err,
            ConvError::UnsupportedReferenceKind(RefKind::LegacyObject)
        ));
        let err = conv
            .write(WriteSource::Encoded(&[0, 0]), None, RefSlot::Record(&mut out), None)
            .unwrap_err();
        assert!(matches!(
            err,
            ConvError::UnsupportedReferenceKind(RefKind::LegacyObject)
        ));
    }

    #[test]
    fn wrong_record_width_is_rejected() {
        let c = container("A");
        let conv = DiskConverter::new(c.clone()).unwrap();
        let mut out = vec![0u8; 10];
        assert!(matches!(
            conv.write(
                WriteSource::Encoded(&region_encoding(&c, 1)),
                None,
                RefSlot::Record(&mut out),
                None
            ),
            Err(ConvError::SizeMismatch { expected: 22, actual: 10 })
        ));
    }

    // -----------------------------------------------------------------------
    // Nil records
    // -----------------------------------------------------------------------

    #[test]
    fn set_null_reclaims_previous_and_reads_as_null() {
        let (c, blobs) = recording_container("A");
        let conv = DiskConverter::new(c.clone()).unwrap();
        let previous = write(&conv, &region_encoding(&c, 0x10), None);
        assert!(!conv.is_null(RefSource::Record(&previous)).unwrap());
        blobs.clear();

        let mut out = vec![0xffu8; conv.record_size()];
        conv.set_null(RefSlot::Record(&mut out), Some(&previous)).unwrap();
        assert_eq!(blobs.ops(), vec!["delete", "set-null"]);
        assert_eq!(c.heap_entries(), 0);
        assert!(out.iter().all(|&b| b == 0));
        assert!(conv.is_null(RefSource::Record(&out)).unwrap());
    }
}
