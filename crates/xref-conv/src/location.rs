//! Per-type location state and converter binding.
//!
//! A [`RefTypeDescriptor`] records where the references of one
//! reference-bearing type currently live. Moving it between memory, disk
//! and undetermined picks the field width and binds the converter set that
//! the conversion pipeline calls through.

use std::fmt;

use tracing::debug;
use xref_store::{Container, ContainerRegistry};
use xref_types::{HeapId, RefKind};

use crate::binding::{Binding, DiskBinding, MemoryBinding, Reader, RefWriter, SizeQuery};
use crate::disk::DiskConverter;
use crate::error::{ConvError, ConvResult};
use crate::legacy::{LegacyObjectCodec, LegacyRegionCodec};
use crate::memory::MemoryCodec;

/// In-memory width of a generic reference handle slot.
pub const REF_MEM_SIZE: usize = 64;
/// In-memory width of a legacy object reference.
pub const OBJ_REF_MEM_SIZE: usize = 8;
/// In-memory width of a legacy region reference.
pub const DSETREG_REF_MEM_SIZE: usize = 12;

/// Where the references of a type currently live.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Location {
    #[default]
    Undetermined,
    Memory,
    Disk,
}

impl Location {
    pub fn name(self) -> &'static str {
        match self {
            Self::Undetermined => "undetermined",
            Self::Memory => "memory",
            Self::Disk => "disk",
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl TryFrom<i32> for Location {
    type Error = ConvError;

    fn try_from(raw: i32) -> ConvResult<Self> {
        match raw {
            0 => Ok(Self::Undetermined),
            1 => Ok(Self::Memory),
            2 => Ok(Self::Disk),
            other => Err(ConvError::InvalidLocation(format!(
                "location value {other} out of range"
            ))),
        }
    }
}

/// Shape of the references a type carries.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RefSubKind {
    /// Generic handles (object, region, attribute).
    Opaque,
    LegacyObject,
    LegacyRegion,
}

impl RefSubKind {
    pub fn from_kind(kind: RefKind) -> Self {
        match kind {
            RefKind::LegacyObject => Self::LegacyObject,
            RefKind::LegacyRegion => Self::LegacyRegion,
            RefKind::Object | RefKind::Region | RefKind::Attribute => Self::Opaque,
        }
    }

    /// Fixed in-memory width of one element.
    pub fn memory_size(self) -> usize {
        match self {
            Self::Opaque => REF_MEM_SIZE,
            Self::LegacyObject => OBJ_REF_MEM_SIZE,
            Self::LegacyRegion => DSETREG_REF_MEM_SIZE,
        }
    }
}

/// Location state of one reference-bearing type.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RefTypeDescriptor {
    sub_kind: RefSubKind,
    location: Location,
    container: Option<Container>,
    size: usize,
    binding: Binding,
    registry: Option<ContainerRegistry>,
}

impl RefTypeDescriptor {
    /// A descriptor in the undetermined location.
    pub fn new(sub_kind: RefSubKind) -> Self {
        Self {
            sub_kind,
            location: Location::Undetermined,
            container: None,
            size: 0,
            binding: Binding::Unbound,
            registry: None,
        }
    }

    /// Like [`new`](Self::new), with a registry the memory-side writer uses
    /// to resolve external container names.
    pub fn with_registry(sub_kind: RefSubKind, registry: ContainerRegistry) -> Self {
        Self {
            registry: Some(registry),
            ..Self::new(sub_kind)
        }
    }

    pub fn sub_kind(&self) -> RefSubKind {
        self.sub_kind
    }

    pub fn location(&self) -> Location {
        self.location
    }

    pub fn container(&self) -> Option<&Container> {
        self.container.as_ref()
    }

    /// Width of one element at the current location; 0 when undetermined.
    pub fn size(&self) -> usize {
        self.size
    }

    pub fn memory_size(&self) -> usize {
        self.sub_kind.memory_size()
    }

    pub fn binding(&self) -> &Binding {
        &self.binding
    }

    pub fn size_query(&self) -> Option<&dyn SizeQuery> {
        self.binding.size_query()
    }

    pub fn reader(&self) -> Option<Reader<'_>> {
        self.binding.reader()
    }

    pub fn writer(&self) -> Option<&dyn RefWriter> {
        self.binding.writer()
    }

    fn matches(&self, container: Option<&Container>, location: Location) -> bool {
        let same_container = match (&self.container, container) {
            (None, None) => true,
            (Some(a), Some(b)) => a.same_as(b),
            _ => false,
        };
        self.location == location && same_container
    }

    /// Move the descriptor to `location`, rebinding its converters.
    ///
    /// Returns `Ok(false)` when the descriptor is already there. Memory
    /// takes no container; disk requires one.
    pub fn set_location(
        &mut self,
        container: Option<&Container>,
        location: Location,
    ) -> ConvResult<bool> {
        if self.matches(container, location) {
            return Ok(false);
        }

        let (container, size, binding) = match (location, container) {
            (Location::Undetermined, _) => (None, 0, Binding::Unbound),
            (Location::Memory, Some(c)) => {
                return Err(ConvError::InvalidLocation(format!(
                    "memory location takes no container, got {:?}",
                    c.name()
                )));
            }
            (Location::Memory, None) => (None, self.sub_kind.memory_size(), self.memory_binding()),
            (Location::Disk, None) => {
                return Err(ConvError::InvalidLocation(
                    "disk location requires a container".into(),
                ));
            }
            (Location::Disk, Some(c)) => {
                let (size, binding) = self.disk_binding(c)?;
                (Some(c.clone()), size, binding)
            }
        };

        debug!(
            sub_kind = ?self.sub_kind,
            from = %self.location,
            to = %location,
            container = container.as_ref().map(Container::name),
            size,
            "reference location changed"
        );
        self.location = location;
        self.container = container;
        self.size = size;
        self.binding = binding;
        Ok(true)
    }

    /// [`set_location`](Self::set_location) with a raw location value:
    /// 0 undetermined, 1 memory, 2 disk.
    pub fn set_location_raw(
        &mut self,
        container: Option<&Container>,
        raw: i32,
    ) -> ConvResult<bool> {
        self.set_location(container, Location::try_from(raw)?)
    }

    fn memory_binding(&self) -> Binding {
        let binding = match self.sub_kind {
            RefSubKind::Opaque => MemoryBinding::Opaque(match &self.registry {
                Some(registry) => MemoryCodec::with_registry(registry.clone()),
                None => MemoryCodec::new(),
            }),
            RefSubKind::LegacyObject => MemoryBinding::LegacyObject,
            RefSubKind::LegacyRegion => MemoryBinding::LegacyRegion,
        };
        Binding::Memory(binding)
    }

    fn disk_binding(&self, container: &Container) -> ConvResult<(usize, Binding)> {
        let (size, binding) = match self.sub_kind {
            RefSubKind::LegacyObject => (
                container.address_size(),
                DiskBinding::LegacyObject(LegacyObjectCodec::new(container)),
            ),
            RefSubKind::LegacyRegion => (
                HeapId::encoded_size(container.address_size()),
                DiskBinding::LegacyRegion(LegacyRegionCodec::new(container.clone())),
            ),
            RefSubKind::Opaque => {
                let conv = DiskConverter::new(container.clone())?;
                (conv.record_size(), DiskBinding::Generic(conv))
            }
        };
        Ok((size, Binding::Disk(binding)))
    }
}
