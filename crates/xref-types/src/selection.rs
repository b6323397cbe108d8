//! Region selections over a dataspace extent.
//!
//! A region reference carries a [`Selection`] naming the elements of the
//! target object it refers to. Selections serialize to a compact,
//! self-describing byte form via bincode.

use bincode::Options;
use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// Maximum rank of a dataspace extent.
pub const MAX_RANK: usize = 32;

/// Upper bound on a serialized selection.
const MAX_ENCODED_SELECTION: u64 = 1 << 24;

fn codec() -> impl Options {
    bincode::DefaultOptions::new()
        .with_fixint_encoding()
        .with_limit(MAX_ENCODED_SELECTION)
}

/// A contiguous block: `count[d]` elements starting at `start[d]`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Block {
    pub start: Vec<u64>,
    pub count: Vec<u64>,
}

impl Block {
    pub fn new(start: Vec<u64>, count: Vec<u64>) -> Self {
        Self { start, count }
    }

    fn npoints(&self) -> u64 {
        self.count.iter().fold(1, |n, &c| n.saturating_mul(c))
    }
}

/// How elements of the extent are selected.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SelectionKind {
    None,
    All,
    /// Individual element coordinates.
    Points(Vec<Vec<u64>>),
    /// Union of rectangular blocks.
    Blocks(Vec<Block>),
}

/// A selection of elements within an extent.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Selection {
    extent: Vec<u64>,
    kind: SelectionKind,
}

impl Selection {
    /// Build a selection without validating it.
    ///
    /// Validation happens on encode; use [`Selection::validate`] to check
    /// earlier.
    pub fn new(extent: Vec<u64>, kind: SelectionKind) -> Self {
        Self { extent, kind }
    }

    pub fn all(extent: Vec<u64>) -> Self {
        Self::new(extent, SelectionKind::All)
    }

    pub fn none(extent: Vec<u64>) -> Self {
        Self::new(extent, SelectionKind::None)
    }

    pub fn points(extent: Vec<u64>, coords: Vec<Vec<u64>>) -> Self {
        Self::new(extent, SelectionKind::Points(coords))
    }

    pub fn blocks(extent: Vec<u64>, blocks: Vec<Block>) -> Self {
        Self::new(extent, SelectionKind::Blocks(blocks))
    }

    pub fn extent(&self) -> &[u64] {
        &self.extent
    }

    pub fn kind(&self) -> &SelectionKind {
        &self.kind
    }

    pub fn rank(&self) -> usize {
        self.extent.len()
    }

    /// Number of selected elements (overlapping blocks count twice),
    /// saturating at `u64::MAX`.
    pub fn npoints(&self) -> u64 {
        match &self.kind {
            SelectionKind::None => 0,
            SelectionKind::All => self.extent.iter().fold(1, |n, &d| n.saturating_mul(d)),
            SelectionKind::Points(coords) => coords.len() as u64,
            SelectionKind::Blocks(blocks) => blocks
                .iter()
                .fold(0, |n, b| n.saturating_add(b.npoints())),
        }
    }

    /// Check that every coordinate and block lies within the extent.
    pub fn validate(&self) -> Result<(), TypeError> {
        let rank = self.rank();
        if rank > MAX_RANK {
            return Err(TypeError::InvalidSelection(format!(
                "rank {rank} exceeds {MAX_RANK}"
            )));
        }
        match &self.kind {
            SelectionKind::None | SelectionKind::All => Ok(()),
            SelectionKind::Points(coords) => {
                for (i, point) in coords.iter().enumerate() {
                    if point.len() != rank {
                        return Err(TypeError::InvalidSelection(format!(
                            "point {i} has rank {}, extent has rank {rank}",
                            point.len()
                        )));
                    }
                    if let Some(d) = (0..rank).find(|&d| point[d] >= self.extent[d]) {
                        return Err(TypeError::InvalidSelection(format!(
                            "point {i} out of bounds in dimension {d}"
                        )));
                    }
                }
                Ok(())
            }
            SelectionKind::Blocks(blocks) => {
                for (i, block) in blocks.iter().enumerate() {
                    if block.start.len() != rank || block.count.len() != rank {
                        return Err(TypeError::InvalidSelection(format!(
                            "block {i} rank does not match extent rank {rank}"
                        )));
                    }
                    for d in 0..rank {
                        let end = block.start[d].checked_add(block.count[d]);
                        if block.count[d] == 0 || end.map_or(true, |e| e > self.extent[d]) {
                            return Err(TypeError::InvalidSelection(format!(
                                "block {i} out of bounds in dimension {d}"
                            )));
                        }
                    }
                }
                Ok(())
            }
        }
    }

    /// Serialize after validating.
    pub fn encode(&self) -> Result<Vec<u8>, TypeError> {
        self.validate()?;
        codec()
            .serialize(self)
            .map_err(|e| TypeError::Serialization(e.to_string()))
    }

    /// Parse and validate a serialized selection.
    pub fn decode(bytes: &[u8]) -> Result<Self, TypeError> {
        let selection: Self = codec()
            .deserialize(bytes)
            .map_err(|e| TypeError::Serialization(e.to_string()))?;
        selection.validate()?;
        Ok(selection)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn npoints_by_kind() {
        assert_eq!(Selection::all(vec![4, 5]).npoints(), 20);
        assert_eq!(Selection::none(vec![4, 5]).npoints(), 0);
        assert_eq!(
            Selection::points(vec![10], vec![vec![1], vec![3]]).npoints(),
            2
        );
        let blocks = vec![Block::new(vec![0, 0], vec![2, 3]), Block::new(vec![5, 5], vec![1, 1])];
        assert_eq!(Selection::blocks(vec![10, 10], blocks).npoints(), 7);
    }

    #[test]
    fn npoints_saturates_on_huge_extents() {
        let all = Selection::all(vec![u64::MAX, 2]);
        assert!(all.validate().is_ok());
        assert_eq!(all.npoints(), u64::MAX);

        let blocks = vec![
            Block::new(vec![0], vec![u64::MAX]),
            Block::new(vec![0], vec![u64::MAX]),
        ];
        assert_eq!(Selection::blocks(vec![u64::MAX], blocks).npoints(), u64::MAX);
    }

    #[test]
    fn out_of_bounds_point_rejected() {
        let sel = Selection::points(vec![4, 4], vec![vec![1, 4]]);
        assert!(matches!(sel.validate(), Err(TypeError::InvalidSelection(_))));
        assert!(sel.encode().is_err());
    }

    #[test]
    fn rank_mismatch_rejected() {
        let sel = Selection::points(vec![4, 4], vec![vec![1]]);
        assert!(sel.validate().is_err());
        let sel = Selection::blocks(vec![4], vec![Block::new(vec![0, 0], vec![1, 1])]);
        assert!(sel.validate().is_err());
    }

    #[test]
    fn empty_or_overflowing_block_rejected() {
        let empty = Selection::blocks(vec![8], vec![Block::new(vec![2], vec![0])]);
        assert!(empty.validate().is_err());
        let overflow = Selection::blocks(vec![u64::MAX], vec![Block::new(vec![u64::MAX], vec![2])]);
        assert!(overflow.validate().is_err());
    }

    #[test]
    fn encode_decode() {
        let sel = Selection::blocks(vec![100, 50], vec![Block::new(vec![10, 0], vec![5, 50])]);
        let bytes = sel.encode().unwrap();
        assert_eq!(Selection::decode(&bytes).unwrap(), sel);
    }

    #[test]
    fn decode_garbage_fails() {
        assert!(Selection::decode(&[0xff; 3]).is_err());
        assert!(Selection::decode(&[]).is_err());
    }

    #[test]
    fn decode_rejects_trailing_bytes() {
        let mut bytes = Selection::all(vec![3]).encode().unwrap();
        bytes.push(0);
        assert!(Selection::decode(&bytes).is_err());
    }

    proptest! {
        #[test]
        fn valid_point_selections_survive_encoding(
            extent in proptest::collection::vec(1u64..64, 1..4),
            picks in proptest::collection::vec(any::<u64>(), 0..16),
        ) {
            let rank = extent.len();
            let coords: Vec<Vec<u64>> = picks
                .chunks(rank)
                .filter(|c| c.len() == rank)
                .map(|c| c.iter().zip(&extent).map(|(v, e)| v % e).collect())
                .collect();
            let sel = Selection::points(extent, coords);
            let bytes = sel.encode().unwrap();
            prop_assert_eq!(Selection::decode(&bytes).unwrap(), sel);
        }
    }
}
