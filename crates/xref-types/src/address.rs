use std::fmt;

use serde::{Deserialize, Serialize};

use crate::cursor::{ByteReader, ByteWriter};
use crate::error::TypeError;

/// Byte order of multi-byte integers stored inside a container.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ByteOrder {
    #[default]
    Little,
    Big,
}

impl ByteOrder {
    /// Encode the low `out.len()` bytes of `value` into `out`.
    ///
    /// Fails if `out` is wider than 8 bytes or `value` does not fit.
    pub fn encode_uint(self, value: u64, out: &mut [u8]) -> Result<(), TypeError> {
        let width = out.len();
        if width == 0 || width > 8 {
            return Err(TypeError::InvalidWidth(width));
        }
        if width < 8 && value >> (width * 8) != 0 {
            return Err(TypeError::ValueTooWide { value, width });
        }
        match self {
            Self::Little => out.copy_from_slice(&value.to_le_bytes()[..width]),
            Self::Big => out.copy_from_slice(&value.to_be_bytes()[8 - width..]),
        }
        Ok(())
    }

    /// Decode an unsigned integer from 1..=8 bytes.
    pub fn decode_uint(self, bytes: &[u8]) -> Result<u64, TypeError> {
        let width = bytes.len();
        if width == 0 || width > 8 {
            return Err(TypeError::InvalidWidth(width));
        }
        let mut buf = [0u8; 8];
        let value = match self {
            Self::Little => {
                buf[..width].copy_from_slice(bytes);
                u64::from_le_bytes(buf)
            }
            Self::Big => {
                buf[8 - width..].copy_from_slice(bytes);
                u64::from_be_bytes(buf)
            }
        };
        Ok(value)
    }
}

/// A file address inside a container.
///
/// Addresses are serialized with the container's fixed address width.
/// Address `0` is reserved and means "absent".
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Address(u64);

impl Address {
    /// The nil address.
    pub const NIL: Self = Self(0);

    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// The raw address value.
    pub const fn get(self) -> u64 {
        self.0
    }

    /// Returns `true` if this is the reserved nil address.
    pub const fn is_nil(self) -> bool {
        self.0 == 0
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({:#x})", self.0)
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}

impl From<u64> for Address {
    fn from(raw: u64) -> Self {
        Self(raw)
    }
}

/// Locator of one entry in the append-only global heap.
///
/// On disk a heap id is `[address][u32 index]`, so its width is the
/// container's address width plus four.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct HeapId {
    /// Address of the heap collection holding the entry.
    pub addr: Address,
    /// Index of the entry within its collection.
    pub index: u32,
}

impl HeapId {
    /// The nil heap id (address 0).
    pub const NIL: Self = Self {
        addr: Address::NIL,
        index: 0,
    };

    pub const fn new(addr: Address, index: u32) -> Self {
        Self { addr, index }
    }

    /// Serialized width for a container with `address_size`-byte addresses.
    pub const fn encoded_size(address_size: usize) -> usize {
        address_size + 4
    }

    /// Returns `true` if the collection address is nil.
    pub const fn is_nil(&self) -> bool {
        self.addr.is_nil()
    }

    pub fn encode(&self, w: &mut ByteWriter<'_>, address_size: usize) -> Result<(), TypeError> {
        w.write_uint(self.addr.get(), address_size)?;
        w.write_u32(self.index)
    }

    pub fn decode(r: &mut ByteReader<'_>, address_size: usize) -> Result<Self, TypeError> {
        let addr = Address::new(r.read_uint(address_size)?);
        let index = r.read_u32()?;
        Ok(Self { addr, index })
    }
}

impl fmt::Debug for HeapId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "HeapId({:#x}:{})", self.addr.get(), self.index)
    }
}

impl fmt::Display for HeapId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}:{}", self.addr.get(), self.index)
    }
}
