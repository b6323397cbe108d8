use tracing::debug;
use xref_codec::wire::{decode, decode_header, encode, encoded_size};
use xref_codec::{RefTarget, ReferenceHandle};
use xref_store::{Container, ContainerRegistry};
use xref_types::{Address, ObjectToken, RefKind};

use crate::binding::{
    EncodedSize, LegacyValue, RefReader, RefSlot, RefSource, RefWriter, SizeQuery, WriteSource,
};
use crate::error::{ConvError, ConvResult};

/// Converter for generic references held as in-memory handles.
///
/// Reading encodes a handle into the wire format; writing decodes a wire
/// encoding (or a legacy value) into a handle and attaches a live
/// container to it.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MemoryCodec {
    registry: Option<ContainerRegistry>,
}

impl MemoryCodec {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve external container names through `registry` on write.
    pub fn with_registry(registry: ContainerRegistry) -> Self {
        Self {
            registry: Some(registry),
        }
    }

    fn source_handle<'a>(source: RefSource<'a>) -> ConvResult<&'a ReferenceHandle> {
        let handle = source
            .handle()?
            .ok_or_else(|| ConvError::BadValue("nil reference cannot be encoded".into()))?;
        if handle.container().is_none() && handle.container_name().is_none() {
            return Err(ConvError::NoContainer("handle is not scoped to any container"));
        }
        Ok(handle)
    }

    fn materialize(
        source: WriteSource<'_>,
        source_container: Option<&Container>,
    ) -> ConvResult<ReferenceHandle> {
        match source {
            WriteSource::Legacy(LegacyValue::Object(addr)) => {
                let container = source_container
                    .ok_or(ConvError::NoContainer("legacy object needs its source container"))?;
                let token = legacy_token(container, addr)?;
                Ok(ReferenceHandle::detached(RefTarget::Object, token))
            }
            WriteSource::Legacy(LegacyValue::Region { addr, selection }) => {
                let container = source_container
                    .ok_or(ConvError::NoContainer("legacy region needs its source container"))?;
                let token = legacy_token(container, addr)?;
                // The selection moves into the handle; the caller's copy is gone.
                Ok(ReferenceHandle::detached(RefTarget::Region(selection), token))
            }
            WriteSource::Encoded(bytes) => {
                let (kind, _) = decode_header(bytes).map_err(|e| ConvError::BadValue(e.to_string()))?;
                if kind.is_legacy() {
                    return Err(ConvError::UnsupportedReferenceKind(kind));
                }
                let (handle, _) = decode(bytes).map_err(|e| ConvError::CantDecode(e.to_string()))?;
                Ok(handle)
            }
        }
    }

    /// Attach a live container: the source container for implicitly scoped
    /// handles, or the named container when the registry can resolve it.
    fn attach(
        &self,
        handle: &mut ReferenceHandle,
        source_container: Option<&Container>,
    ) -> ConvResult<()> {
        let container = match handle.container_name() {
            None => Some(
                source_container
                    .ok_or(ConvError::NoContainer("local reference needs its source container"))?
                    .clone(),
            ),
            Some(name) => self.registry.as_ref().and_then(|r| r.resolve(name)),
        };
        let Some(container) = container else {
            debug!(name = handle.container_name(), "external container not open; keeping name only");
            return Ok(());
        };
        debug!(
            container = container.name(),
            open_handles = container.open_handles(),
            "attaching container to decoded reference"
        );
        // On failure the capability is dropped with `container`.
        handle
            .attach(container)
            .map_err(|e| ConvError::CantDecode(e.to_string()))
    }
}

fn legacy_token(container: &Container, addr: Address) -> ConvResult<ObjectToken> {
    ObjectToken::from_address(addr, container.token_size(), container.byte_order())
        .map_err(|e| ConvError::CantDecode(e.to_string()))
}

impl SizeQuery for MemoryCodec {
    fn size(&self, source: RefSource<'_>, destination: Option<&Container>) -> ConvResult<EncodedSize> {
        let handle = Self::source_handle(source)?;
        let cached = handle.cached_encode_size();
        if cached != 0 && !handle.is_external_to(destination) {
            return Ok(if handle.kind() == RefKind::Object {
                EncodedSize::direct(cached)
            } else {
                EncodedSize::measured(cached)
            });
        }
        encoded_size(handle, destination)
            .map(EncodedSize::measured)
            .map_err(ConvError::EncodeSize)
    }

    fn is_null(&self, source: RefSource<'_>) -> ConvResult<bool> {
        Ok(source.handle()?.is_none())
    }
}

impl RefReader for MemoryCodec {
    fn read(&self, source: RefSource<'_>, destination: Option<&Container>, out: &mut [u8]) -> ConvResult<()> {
        let handle = Self::source_handle(source)?;
        encode(handle, destination, out).map_err(ConvError::Encode)
    }
}

impl RefWriter for MemoryCodec {
    fn write(
        &self,
        source: WriteSource<'_>,
        source_container: Option<&Container>,
        slot: RefSlot<'_>,
        _previous: Option<&[u8]>,
    ) -> ConvResult<()> {
        let RefSlot::Handle(slot) = slot else {
            return Err(ConvError::SourceMismatch("expected an in-memory handle slot"));
        };
        let mut handle = Self::materialize(source, source_container)?;
        self.attach(&mut handle, source_container)?;
        *slot = Some(handle);
        Ok(())
    }

    fn set_null(&self, slot: RefSlot<'_>, _previous: Option<&[u8]>) -> ConvResult<()> {
        let RefSlot::Handle(slot) = slot else {
            return Err(ConvError::SourceMismatch("expected an in-memory handle slot"));
        };
        *slot = None;
        Ok(())
    }
}
