use xref_codec::ReferenceHandle;
use xref_store::Container;
use xref_types::{Address, Selection};

use crate::disk::DiskConverter;
use crate::error::{ConvError, ConvResult};
use crate::legacy::{LegacyObjectCodec, LegacyRegionCodec};
use crate::memory::MemoryCodec;

/// One reference element as seen by a size query or reader.
#[derive(Clone, Copy, Debug)]
pub enum RefSource<'a> {
    /// In-memory handle slot. `None` is the nil reference.
    Handle(Option<&'a ReferenceHandle>),
    /// Fixed-width on-disk record.
    Record(&'a [u8]),
}

impl<'a> RefSource<'a> {
    pub(crate) fn handle(self) -> ConvResult<Option<&'a ReferenceHandle>> {
        match self {
            Self::Handle(h) => Ok(h),
            Self::Record(_) => Err(ConvError::SourceMismatch("expected an in-memory handle")),
        }
    }

    pub(crate) fn record(self) -> ConvResult<&'a [u8]> {
        match self {
            Self::Record(bytes) => Ok(bytes),
            Self::Handle(_) => Err(ConvError::SourceMismatch("expected an on-disk record")),
        }
    }
}

/// Destination of a write.
#[derive(Debug)]
pub enum RefSlot<'a> {
    Handle(&'a mut Option<ReferenceHandle>),
    Record(&'a mut [u8]),
}

/// A decoded legacy reference, handed from a legacy reader to a writer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LegacyValue {
    Object(Address),
    Region { addr: Address, selection: Selection },
}

/// What a writer materializes from.
#[derive(Debug)]
pub enum WriteSource<'a> {
    /// A legacy value; ownership of any selection moves into the writer.
    Legacy(LegacyValue),
    /// A generic encoding, header first.
    Encoded(&'a [u8]),
}

/// Result of a size query.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EncodedSize {
    pub len: usize,
    /// The source bytes are already in their final form and need no
    /// re-encoding or blob lookup.
    pub direct_copy: bool,
}

impl EncodedSize {
    pub fn measured(len: usize) -> Self {
        Self {
            len,
            direct_copy: false,
        }
    }

    pub fn direct(len: usize) -> Self {
        Self {
            len,
            direct_copy: true,
        }
    }
}

/// Size query half of a bound converter.
pub trait SizeQuery {
    /// Bytes the reader will produce for `source` when the result is bound
    /// for `destination`.
    fn size(&self, source: RefSource<'_>, destination: Option<&Container>) -> ConvResult<EncodedSize>;

    /// Returns `true` if `source` is the nil reference.
    fn is_null(&self, _source: RefSource<'_>) -> ConvResult<bool> {
        Ok(false)
    }
}

/// Reader producing the generic encoding of a source element.
pub trait RefReader {
    /// Write exactly `out.len()` bytes of encoding for `source`.
    fn read(&self, source: RefSource<'_>, destination: Option<&Container>, out: &mut [u8]) -> ConvResult<()>;
}

/// Reader for frozen legacy records.
pub trait LegacyReader {
    fn read_legacy(&self, source: RefSource<'_>) -> ConvResult<LegacyValue>;
}

/// Writer materializing a destination element.
pub trait RefWriter {
    /// Materialize `source` into `slot`.
    ///
    /// `previous` is the record being overwritten, if any. A writer that
    /// parks payloads in a blob store must reclaim the previous blob before
    /// storing the new one.
    fn write(
        &self,
        source: WriteSource<'_>,
        source_container: Option<&Container>,
        slot: RefSlot<'_>,
        previous: Option<&[u8]>,
    ) -> ConvResult<()>;

    /// Write the nil reference into `slot`, reclaiming `previous` first.
    fn set_null(&self, slot: RefSlot<'_>, previous: Option<&[u8]>) -> ConvResult<()>;
}

/// The bound reader, by shape.
#[derive(Clone, Copy)]
pub enum Reader<'a> {
    Encoded(&'a dyn RefReader),
    Legacy(&'a dyn LegacyReader),
}

/// Converters bound while references live in memory.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MemoryBinding {
    /// Generic handles: full size/read/write triple.
    Opaque(MemoryCodec),
    /// Raw legacy object addresses; never re-serialized from memory.
    LegacyObject,
    /// Raw legacy region records; never re-serialized from memory.
    LegacyRegion,
}

/// Converters bound while references live in a container.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DiskBinding {
    LegacyObject(LegacyObjectCodec),
    LegacyRegion(LegacyRegionCodec),
    Generic(DiskConverter),
}

/// The active converter set of a descriptor.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum Binding {
    #[default]
    Unbound,
    Memory(MemoryBinding),
    Disk(DiskBinding),
}

impl Binding {
    pub fn size_query(&self) -> Option<&dyn SizeQuery> {
        match self {
            Self::Unbound => None,
            Self::Memory(MemoryBinding::Opaque(c)) => Some(c),
            Self::Memory(_) => None,
            Self::Disk(DiskBinding::LegacyObject(c)) => Some(c),
            Self::Disk(DiskBinding::LegacyRegion(c)) => Some(c),
            Self::Disk(DiskBinding::Generic(c)) => Some(c),
        }
    }

    pub fn reader(&self) -> Option<Reader<'_>> {
        match self {
            Self::Unbound => None,
            Self::Memory(MemoryBinding::Opaque(c)) => Some(Reader::Encoded(c)),
            Self::Memory(_) => None,
            Self::Disk(DiskBinding::LegacyObject(c)) => Some(Reader::Legacy(c)),
            Self::Disk(DiskBinding::LegacyRegion(c)) => Some(Reader::Legacy(c)),
            Self::Disk(DiskBinding::Generic(c)) => Some(Reader::Encoded(c)),
        }
    }

    pub fn writer(&self) -> Option<&dyn RefWriter> {
        match self {
            Self::Memory(MemoryBinding::Opaque(c)) => Some(c),
            Self::Disk(DiskBinding::Generic(c)) => Some(c),
            _ => None,
        }
    }
}
