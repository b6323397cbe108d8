//! Element conversion between two bound descriptors.

use tracing::debug;

use crate::binding::{Reader, RefSlot, RefSource, WriteSource};
use crate::error::{ConvError, ConvResult};
use crate::location::RefTypeDescriptor;

/// Convert one reference element from `src` to `dst`.
///
/// `previous` is the destination record being overwritten, if any; a disk
/// destination reclaims its blob before storing the new one. A nil source
/// produces a nil destination.
pub fn convert_element(
    src: &RefTypeDescriptor,
    source: RefSource<'_>,
    dst: &RefTypeDescriptor,
    slot: RefSlot<'_>,
    previous: Option<&[u8]>,
) -> ConvResult<()> {
    let writer = dst.writer().ok_or(ConvError::NotBound {
        op: "writer",
        location: dst.location(),
    })?;
    let query = src.size_query().ok_or(ConvError::NotBound {
        op: "size query",
        location: src.location(),
    })?;
    let reader = src.reader().ok_or(ConvError::NotBound {
        op: "reader",
        location: src.location(),
    })?;

    if query.is_null(source)? {
        return writer.set_null(slot, previous);
    }

    match reader {
        Reader::Legacy(reader) => {
            let value = reader.read_legacy(source)?;
            writer.write(WriteSource::Legacy(value), src.container(), slot, previous)
        }
        Reader::Encoded(reader) => {
            let size = query.size(source, dst.container())?;
            debug!(
                from = %src.location(),
                to = %dst.location(),
                len = size.len,
                direct_copy = size.direct_copy,
                "converting reference"
            );
            let mut buf = vec![0u8; size.len];
            reader.read(source, dst.container(), &mut buf)?;
            writer.write(WriteSource::Encoded(&buf), src.container(), slot, previous)
        }
    }
}
