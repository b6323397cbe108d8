use std::fmt;

use serde::{Deserialize, Serialize};

use crate::address::{Address, ByteOrder};
use crate::error::TypeError;

/// Largest object token any container may use.
pub const MAX_TOKEN_SIZE: usize = 16;

/// Opaque, container-local identifier of an object.
///
/// The token width is fixed per container. The native layout stores an
/// object's header address in the low bytes, in container byte order.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "Vec<u8>", into = "Vec<u8>")]
pub struct ObjectToken {
    len: u8,
    bytes: [u8; MAX_TOKEN_SIZE],
}

impl ObjectToken {
    /// Build a token from raw bytes (1..=16 bytes).
    pub fn new(raw: &[u8]) -> Result<Self, TypeError> {
        if raw.is_empty() || raw.len() > MAX_TOKEN_SIZE {
            return Err(TypeError::InvalidTokenSize(raw.len()));
        }
        let mut bytes = [0u8; MAX_TOKEN_SIZE];
        bytes[..raw.len()].copy_from_slice(raw);
        Ok(Self {
            len: raw.len() as u8,
            bytes,
        })
    }

    /// An all-zero token of the given width.
    pub fn zeroed(size: usize) -> Result<Self, TypeError> {
        if size == 0 || size > MAX_TOKEN_SIZE {
            return Err(TypeError::InvalidTokenSize(size));
        }
        Ok(Self {
            len: size as u8,
            bytes: [0u8; MAX_TOKEN_SIZE],
        })
    }

    /// Token whose low bytes hold `addr` in the given byte order.
    pub fn from_address(addr: Address, size: usize, order: ByteOrder) -> Result<Self, TypeError> {
        if size == 0 || size > MAX_TOKEN_SIZE {
            return Err(TypeError::InvalidTokenSize(size));
        }
        let mut bytes = [0u8; MAX_TOKEN_SIZE];
        let width = size.min(8);
        match order {
            ByteOrder::Little => order.encode_uint(addr.get(), &mut bytes[..width])?,
            ByteOrder::Big => order.encode_uint(addr.get(), &mut bytes[size - width..size])?,
        }
        Ok(Self {
            len: size as u8,
            bytes,
        })
    }

    /// Recover the address stored by [`ObjectToken::from_address`].
    pub fn to_address(&self, order: ByteOrder) -> Result<Address, TypeError> {
        let size = self.len();
        let width = size.min(8);
        let raw = match order {
            ByteOrder::Little => order.decode_uint(&self.bytes[..width])?,
            ByteOrder::Big => order.decode_uint(&self.bytes[size - width..size])?,
        };
        Ok(Address::new(raw))
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes[..self.len()]
    }

    pub fn len(&self) -> usize {
        self.len as usize
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Hex-encoded token bytes.
    pub fn to_hex(&self) -> String {
        hex::encode(self.as_bytes())
    }
}

impl TryFrom<Vec<u8>> for ObjectToken {
    type Error = TypeError;

    fn try_from(raw: Vec<u8>) -> Result<Self, TypeError> {
        Self::new(&raw)
    }
}

impl From<ObjectToken> for Vec<u8> {
    fn from(token: ObjectToken) -> Self {
        token.as_bytes().to_vec()
    }
}

impl fmt::Debug for ObjectToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ObjectToken({})", self.to_hex())
    }
}
