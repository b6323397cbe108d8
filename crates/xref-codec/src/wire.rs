//! Generic reference wire format.
//!
//! ```text
//! [1 byte: kind tag][1 byte: flags]
//! if flags & EXTERNAL: [u16: name length][container name]
//! [u8: token length][token]
//! Region:    [u32: selection length][selection bytes]
//! Attribute: [u16: name length][attribute name]
//! ```
//!
//! All length prefixes are little-endian, independent of the byte order of
//! any container the encoding ends up stored in.

use tracing::warn;
use xref_store::Container;
use xref_types::{ByteOrder, ByteReader, ByteWriter, ObjectToken, RefKind, Selection};

use crate::error::{CodecError, CodecResult};
use crate::handle::{RefTarget, ReferenceHandle};

/// Size of the `[kind][flags]` header.
pub const ENCODE_HEADER_SIZE: usize = 2;

/// Flag bit: the encoding carries the target container's name.
pub const FLAG_EXTERNAL: u8 = 0x01;

const WIRE_ORDER: ByteOrder = ByteOrder::Little;
const MAX_NAME_LEN: usize = u16::MAX as usize;

enum Tail<'a> {
    None,
    Selection(Vec<u8>),
    Attribute(&'a [u8]),
}

/// A handle laid out for encoding. Built once, then measured or written.
struct Layout<'a> {
    kind: RefKind,
    flags: u8,
    name: Option<&'a [u8]>,
    token: &'a ObjectToken,
    tail: Tail<'a>,
}

impl<'a> Layout<'a> {
    fn prepare(handle: &'a ReferenceHandle, external_name: Option<&'a str>) -> CodecResult<Self> {
        let name = external_name.map(str::as_bytes);
        if let Some(name) = name {
            check_name("container", name)?;
        }
        let tail = match handle.target() {
            RefTarget::Object => Tail::None,
            // Selection encodings are capped well below u32::MAX.
            RefTarget::Region(selection) => Tail::Selection(selection.encode()?),
            RefTarget::Attribute(attr) => {
                check_name("attribute", attr.as_bytes())?;
                Tail::Attribute(attr.as_bytes())
            }
        };
        Ok(Self {
            kind: handle.kind(),
            flags: if name.is_some() { FLAG_EXTERNAL } else { 0 },
            name,
            token: handle.token(),
            tail,
        })
    }

    fn size(&self) -> usize {
        let mut size = ENCODE_HEADER_SIZE + 1 + self.token.len();
        if let Some(name) = self.name {
            size += 2 + name.len();
        }
        size += match &self.tail {
            Tail::None => 0,
            Tail::Selection(bytes) => 4 + bytes.len(),
            Tail::Attribute(name) => 2 + name.len(),
        };
        size
    }

    fn write(&self, w: &mut ByteWriter<'_>) -> CodecResult<()> {
        w.write_u8(self.kind.tag())?;
        w.write_u8(self.flags)?;
        if let Some(name) = self.name {
            w.write_u16(name.len() as u16)?;
            w.write_bytes(name)?;
        }
        w.write_u8(self.token.len() as u8)?;
        w.write_bytes(self.token.as_bytes())?;
        match &self.tail {
            Tail::None => {}
            Tail::Selection(bytes) => {
                w.write_u32(bytes.len() as u32)?;
                w.write_bytes(bytes)?;
            }
            Tail::Attribute(name) => {
                w.write_u16(name.len() as u16)?;
                w.write_bytes(name)?;
            }
        }
        Ok(())
    }
}

fn check_name(what: &'static str, name: &[u8]) -> CodecResult<()> {
    if name.len() > MAX_NAME_LEN {
        return Err(CodecError::NameTooLong {
            what,
            len: name.len(),
            max: MAX_NAME_LEN,
        });
    }
    Ok(())
}

/// Exact number of bytes [`encode`] will write for `handle` when encoded
/// for `destination`.
///
/// Caches the size on the handle when the encoding is not external.
pub fn encoded_size(handle: &ReferenceHandle, destination: Option<&Container>) -> CodecResult<usize> {
    let external = handle.external_name(destination);
    let size = Layout::prepare(handle, external)?.size();
    if external.is_none() {
        handle.cache_encode_size(size);
    }
    Ok(size)
}

/// Encode `handle` for `destination` into `out`.
///
/// `out` must be exactly [`encoded_size`] bytes long; anything else is an
/// error rather than a truncation or a partial fill.
pub fn encode(
    handle: &ReferenceHandle,
    destination: Option<&Container>,
    out: &mut [u8],
) -> CodecResult<()> {
    let external = handle.external_name(destination);
    let layout = Layout::prepare(handle, external)?;
    let needed = layout.size();
    if out.len() != needed {
        return Err(CodecError::BufferSize {
            needed,
            available: out.len(),
        });
    }
    let mut w = ByteWriter::new(out, WIRE_ORDER);
    layout.write(&mut w)?;
    if external.is_none() {
        handle.cache_encode_size(needed);
    }
    Ok(())
}

/// Encode into a freshly allocated buffer.
pub fn encode_to_vec(
    handle: &ReferenceHandle,
    destination: Option<&Container>,
) -> CodecResult<Vec<u8>> {
    let mut out = vec![0u8; encoded_size(handle, destination)?];
    encode(handle, destination, &mut out)?;
    Ok(out)
}

/// Read the `[kind][flags]` header.
///
/// Rejects out-of-range kind tags and unknown flag bits.
pub fn decode_header(bytes: &[u8]) -> CodecResult<(RefKind, u8)> {
    let mut r = ByteReader::new(bytes, WIRE_ORDER);
    let tag = r.read_u8()?;
    let kind = RefKind::from_tag(tag).inspect_err(|_| {
        warn!(tag, "reference header carries out-of-range kind");
    })?;
    let flags = r.read_u8()?;
    if flags & !FLAG_EXTERNAL != 0 {
        warn!(flags, "reference header carries unknown flags");
        return Err(CodecError::InvalidFlags(flags));
    }
    Ok((kind, flags))
}

/// Decode one generic reference from the front of `bytes`.
///
/// Returns the detached handle and the number of bytes consumed. External
/// references carry their container name; local ones carry none and have
/// their encoded size cached.
pub fn decode(bytes: &[u8]) -> CodecResult<(ReferenceHandle, usize)> {
    let (kind, flags) = decode_header(bytes)?;
    if kind.is_legacy() {
        return Err(CodecError::UnsupportedKind(kind));
    }
    let mut r = ByteReader::new(bytes, WIRE_ORDER);
    r.skip(ENCODE_HEADER_SIZE)?;

    let container_name = if flags & FLAG_EXTERNAL != 0 {
        let len = r.read_u16()? as usize;
        Some(utf8(r.read_bytes(len)?, "container name")?)
    } else {
        None
    };

    let token_len = r.read_u8()? as usize;
    let token = ObjectToken::new(r.read_bytes(token_len)?)?;

    let target = match kind {
        RefKind::Object => RefTarget::Object,
        RefKind::Region => {
            let len = r.read_u32()? as usize;
            let selection = Selection::decode(r.read_bytes(len)?)
                .map_err(|e| CodecError::CantDecode(format!("region selection: {e}")))?;
            RefTarget::Region(selection)
        }
        RefKind::Attribute => {
            let len = r.read_u16()? as usize;
            RefTarget::Attribute(utf8(r.read_bytes(len)?, "attribute name")?)
        }
        RefKind::LegacyObject | RefKind::LegacyRegion => {
            return Err(CodecError::UnsupportedKind(kind));
        }
    };

    let consumed = r.position();
    let handle = ReferenceHandle::detached(target, token);
    let handle = match container_name {
        Some(name) => handle.with_container_name(name),
        None => {
            handle.cache_encode_size(consumed);
            handle
        }
    };
    Ok((handle, consumed))
}

fn utf8(bytes: &[u8], what: &str) -> CodecResult<String> {
    String::from_utf8(bytes.to_vec())
        .map_err(|_| CodecError::CantDecode(format!("{what} is not valid UTF-8")))
}
