use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// Reference kind as tagged in the first byte of an encoded reference.
///
/// The two legacy kinds predate the versioned wire format and are only ever
/// read back from old containers. The remaining kinds use the generic
/// length-prefixed encoding.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[repr(u8)]
pub enum RefKind {
    /// Legacy object reference: a raw container address.
    LegacyObject = 0,
    /// Legacy region reference: a heap id pointing at `{address, selection}`.
    LegacyRegion = 1,
    /// Object reference.
    Object = 2,
    /// Region (object + selection) reference.
    Region = 3,
    /// Attribute (object + attribute name) reference.
    Attribute = 4,
}

impl RefKind {
    /// One past the largest valid tag.
    pub const MAX_TAG: u8 = 5;

    /// Wire tag for this kind.
    pub const fn tag(self) -> u8 {
        self as u8
    }

    /// Parse a wire tag, rejecting anything outside the valid range.
    pub fn from_tag(tag: u8) -> Result<Self, TypeError> {
        match tag {
            0 => Ok(Self::LegacyObject),
            1 => Ok(Self::LegacyRegion),
            2 => Ok(Self::Object),
            3 => Ok(Self::Region),
            4 => Ok(Self::Attribute),
            other => Err(TypeError::InvalidKind(other)),
        }
    }

    /// Returns `true` for the two pre-versioned kinds.
    pub const fn is_legacy(self) -> bool {
        matches!(self, Self::LegacyObject | Self::LegacyRegion)
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::LegacyObject => "legacy-object",
            Self::LegacyRegion => "legacy-region",
            Self::Object => "object",
            Self::Region => "region",
            Self::Attribute => "attribute",
        }
    }
}

impl fmt::Display for RefKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl TryFrom<u8> for RefKind {
    type Error = TypeError;

    fn try_from(tag: u8) -> Result<Self, Self::Error> {
        Self::from_tag(tag)
    }
}
