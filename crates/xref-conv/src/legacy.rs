use tracing::warn;
use xref_codec::{decode_addr_region, decode_object_addr, region_heap_id, CodecError};
use xref_store::Container;
use xref_types::{Address, ByteOrder, HeapId};

use crate::binding::{EncodedSize, LegacyReader, LegacyValue, RefSource, SizeQuery};
use crate::error::{ConvError, ConvResult};

/// Reader for legacy object records: the raw target address.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LegacyObjectCodec {
    address_size: usize,
    byte_order: ByteOrder,
}

impl LegacyObjectCodec {
    pub fn new(container: &Container) -> Self {
        Self {
            address_size: container.address_size(),
            byte_order: container.byte_order(),
        }
    }

    fn decode(&self, source: RefSource<'_>) -> ConvResult<Address> {
        decode_object_addr(source.record()?, self.address_size, self.byte_order)
            .map_err(|e| ConvError::CantDecode(e.to_string()))
    }
}

impl SizeQuery for LegacyObjectCodec {
    fn size(&self, _source: RefSource<'_>, _destination: Option<&Container>) -> ConvResult<EncodedSize> {
        Ok(EncodedSize::measured(self.address_size))
    }

    fn is_null(&self, source: RefSource<'_>) -> ConvResult<bool> {
        Ok(self.decode(source)?.is_nil())
    }
}

impl LegacyReader for LegacyObjectCodec {
    fn read_legacy(&self, source: RefSource<'_>) -> ConvResult<LegacyValue> {
        Ok(LegacyValue::Object(self.decode(source)?))
    }
}

/// Reader for legacy region records: a heap id whose entry holds the
/// object address and selection.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LegacyRegionCodec {
    container: Container,
}

impl LegacyRegionCodec {
    pub fn new(container: Container) -> Self {
        Self { container }
    }
}

impl SizeQuery for LegacyRegionCodec {
    fn size(&self, _source: RefSource<'_>, _destination: Option<&Container>) -> ConvResult<EncodedSize> {
        Ok(EncodedSize::measured(HeapId::encoded_size(
            self.container.address_size(),
        )))
    }

    fn is_null(&self, source: RefSource<'_>) -> ConvResult<bool> {
        let id = region_heap_id(&self.container, source.record()?)
            .map_err(|e| ConvError::CantDecode(e.to_string()))?;
        Ok(id.is_nil())
    }
}

impl LegacyReader for LegacyRegionCodec {
    fn read_legacy(&self, source: RefSource<'_>) -> ConvResult<LegacyValue> {
        match decode_addr_region(&self.container, source.record()?) {
            Ok((addr, selection)) => Ok(LegacyValue::Region { addr, selection }),
            Err(CodecError::Store(e)) => Err(ConvError::CantGet(e)),
            Err(e) => {
                warn!(container = self.container.name(), error = %e, "legacy region record rejected");
                Err(ConvError::CantDecode(e.to_string()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use xref_codec::{encode_addr_region, encode_object_addr};
    use xref_store::ContainerConfig;
    use xref_types::{ByteWriter, Selection};

    fn container() -> Container {
        Container::create(&ContainerConfig::named("legacy")).unwrap()
    }

    #[test]
    fn object_size_and_read() {
        let c = container();
        let codec = LegacyObjectCodec::new(&c);
        let record = encode_object_addr(Address::new(0x1000), 8, ByteOrder::Little).unwrap();
        let src = RefSource::Record(&record);
        assert_eq!(codec.size(src, None).unwrap(), EncodedSize::measured(8));
        assert!(!codec.is_null(src).unwrap());
        assert_eq!(
            codec.read_legacy(src).unwrap(),
            LegacyValue::Object(Address::new(0x1000))
        );
        assert!(codec.is_null(RefSource::Record(&[0u8; 8])).unwrap());
    }

    #[test]
    fn object_rejects_handle_source() {
        let codec = LegacyObjectCodec::new(&container());
        assert!(matches!(
            codec.read_legacy(RefSource::Handle(None)),
            Err(ConvError::SourceMismatch(_))
        ));
    }

    #[test]
    fn region_size_and_read() {
        let c = container();
        let codec = LegacyRegionCodec::new(c.clone());
        let sel = Selection::all(vec![5, 5]);
        let record = encode_addr_region(&c, Address::new(0x3000), &sel).unwrap();
        let src = RefSource::Record(&record);
        assert_eq!(codec.size(src, None).unwrap().len, 12);
        assert!(!codec.is_null(src).unwrap());
        assert_eq!(
            codec.read_legacy(src).unwrap(),
            LegacyValue::Region {
                addr: Address::new(0x3000),
                selection: sel
            }
        );
        assert!(codec.is_null(RefSource::Record(&[0u8; 12])).unwrap());
    }

    #[test]
    fn region_with_corrupt_entry_is_cant_decode() {
        let c = container();
        let id = c.heap().insert(&[0xffu8; 20]).unwrap();
        let mut record = vec![0u8; 12];
        id.encode(&mut ByteWriter::new(&mut record, ByteOrder::Little), 8)
            .unwrap();
        let codec = LegacyRegionCodec::new(c);
        assert!(matches!(
            codec.read_legacy(RefSource::Record(&record)),
            Err(ConvError::CantDecode(_))
        ));
    }
}
