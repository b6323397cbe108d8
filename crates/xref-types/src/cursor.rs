//! Bounds-checked byte cursors.
//!
//! Every fixed-width field in a reference record is read and written through
//! these cursors. A short buffer is reported as an error, never a panic.

use crate::address::ByteOrder;
use crate::error::TypeError;

/// Sequential reader over a borrowed byte slice.
#[derive(Clone, Debug)]
pub struct ByteReader<'a> {
    buf: &'a [u8],
    pos: usize,
    order: ByteOrder,
}

impl<'a> ByteReader<'a> {
    pub fn new(buf: &'a [u8], order: ByteOrder) -> Self {
        Self { buf, pos: 0, order }
    }

    /// Bytes consumed so far.
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Bytes left to read.
    pub fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    /// The unread tail of the buffer.
    pub fn rest(&self) -> &'a [u8] {
        &self.buf[self.pos..]
    }

    pub fn read_bytes(&mut self, len: usize) -> Result<&'a [u8], TypeError> {
        if self.remaining() < len {
            return Err(TypeError::Truncated {
                needed: len,
                available: self.remaining(),
            });
        }
        let bytes = &self.buf[self.pos..self.pos + len];
        self.pos += len;
        Ok(bytes)
    }

    pub fn skip(&mut self, len: usize) -> Result<(), TypeError> {
        self.read_bytes(len).map(|_| ())
    }

    pub fn read_u8(&mut self) -> Result<u8, TypeError> {
        Ok(self.read_bytes(1)?[0])
    }

    pub fn read_u16(&mut self) -> Result<u16, TypeError> {
        Ok(self.read_uint(2)? as u16)
    }

    pub fn read_u32(&mut self) -> Result<u32, TypeError> {
        Ok(self.read_uint(4)? as u32)
    }

    /// Read an unsigned integer of `width` bytes in the cursor's byte order.
    pub fn read_uint(&mut self, width: usize) -> Result<u64, TypeError> {
        let bytes = self.read_bytes(width)?;
        self.order.decode_uint(bytes)
    }
}

/// Sequential writer into a borrowed, fixed-capacity byte slice.
#[derive(Debug)]
pub struct ByteWriter<'a> {
    buf: &'a mut [u8],
    pos: usize,
    order: ByteOrder,
}

impl<'a> ByteWriter<'a> {
    pub fn new(buf: &'a mut [u8], order: ByteOrder) -> Self {
        Self { buf, pos: 0, order }
    }

    /// Bytes written so far.
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Capacity left.
    pub fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    /// Reserve the next `len` bytes and return them for in-place filling.
    pub fn reserve(&mut self, len: usize) -> Result<&mut [u8], TypeError> {
        if self.remaining() < len {
            return Err(TypeError::BufferOverflow {
                needed: len,
                available: self.remaining(),
            });
        }
        let start = self.pos;
        self.pos += len;
        Ok(&mut self.buf[start..start + len])
    }

    pub fn write_bytes(&mut self, bytes: &[u8]) -> Result<(), TypeError> {
        self.reserve(bytes.len())?.copy_from_slice(bytes);
        Ok(())
    }

    pub fn write_u8(&mut self, value: u8) -> Result<(), TypeError> {
        self.write_bytes(&[value])
    }

    pub fn write_u16(&mut self, value: u16) -> Result<(), TypeError> {
        self.write_uint(u64::from(value), 2)
    }

    pub fn write_u32(&mut self, value: u32) -> Result<(), TypeError> {
        self.write_uint(u64::from(value), 4)
    }

    /// Write the low `width` bytes of `value` in the cursor's byte order.
    pub fn write_uint(&mut self, value: u64, width: usize) -> Result<(), TypeError> {
        let order = self.order;
        let slot = self.reserve(width)?;
        order.encode_uint(value, slot)
    }
}
