//! # Instance Index
//!
//! Dense per-block-type lists of visible voxel positions.
//!
//! Each block type owns one contiguous list; a voxel that is visible holds its slot number in
//! that list. Removal uses swap-remove so the lists never contain holes: the last entry moves
//! into the vacated slot and the caller re-points the moved voxel at its new slot.
//!
//! A bit per block type records which lists changed since the renderer last looked.

use bitvec::prelude::BitVec;
use cgmath::Point3;

use crate::engine_state::voxels::block::block_type::BlockType;
use crate::engine_state::voxels::block::BlockTypeSize;

/// Outcome of a swap-remove.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SwapRemoval {
    /// Position that was removed.
    pub removed: Point3<i32>,
    /// Position that now occupies the vacated slot, if the slot was not the last one.
    pub moved: Option<Point3<i32>>,
}

/// The visible-instance lists of one chunk.
#[derive(Debug, Clone)]
pub struct InstanceIndex {
    lists: Vec<Vec<Point3<i32>>>,
    dirty: BitVec,
}

impl Default for InstanceIndex {
    fn default() -> Self {
        Self::new()
    }
}

impl InstanceIndex {
    pub fn new() -> Self {
        InstanceIndex {
            lists: vec![Vec::new(); BlockType::COUNT],
            dirty: BitVec::repeat(false, BlockType::COUNT),
        }
    }

    /// Appends a position to the list of `block_type` and returns its slot.
    ///
    /// Returns `None` for ids outside the block catalog.
    pub fn push(&mut self, block_type: BlockTypeSize, position: Point3<i32>) -> Option<u32> {
        let list = self.lists.get_mut(block_type as usize)?;
        list.push(position);
        self.dirty.set(block_type as usize, true);
        Some((list.len() - 1) as u32)
    }

    /// Removes `slot` from the list of `block_type` by moving the last entry into it.
    ///
    /// Returns `None` if the slot does not exist.
    pub fn swap_remove(&mut self, block_type: BlockTypeSize, slot: u32) -> Option<SwapRemoval> {
        let list = self.lists.get_mut(block_type as usize)?;
        let slot = slot as usize;
        if slot >= list.len() {
            return None;
        }
        let removed = list.swap_remove(slot);
        let moved = list.get(slot).copied();
        self.dirty.set(block_type as usize, true);
        Some(SwapRemoval { removed, moved })
    }

    /// The dense list of positions for a block type.
    pub fn positions(&self, block_type: BlockTypeSize) -> &[Point3<i32>] {
        self.lists
            .get(block_type as usize)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Iterates `(block type, positions)` for every non-empty list.
    pub fn iter(&self) -> impl Iterator<Item = (BlockTypeSize, &[Point3<i32>])> {
        self.lists
            .iter()
            .enumerate()
            .filter(|(_, list)| !list.is_empty())
            .map(|(id, list)| (id as BlockTypeSize, list.as_slice()))
    }

    /// Total number of instances across all block types.
    pub fn len(&self) -> usize {
        self.lists.iter().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.lists.iter().all(Vec::is_empty)
    }

    /// Drops all instances, marking the affected lists dirty.
    pub fn clear(&mut self) {
        for (id, list) in self.lists.iter_mut().enumerate() {
            if !list.is_empty() {
                list.clear();
                self.dirty.set(id, true);
            }
        }
    }

    /// Returns the block types whose lists changed since the last call, and resets the flags.
    pub fn take_dirty(&mut self) -> Vec<BlockTypeSize> {
        let changed = self
            .dirty
            .iter_ones()
            .map(|id| id as BlockTypeSize)
            .collect();
        self.dirty.fill(false);
        changed
    }

    pub fn has_changes(&self) -> bool {
        self.dirty.any()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn swap_remove_moves_the_last_entry() {
        let mut index = InstanceIndex::new();
        let a = Point3::new(0, 0, 0);
        let b = Point3::new(1, 0, 0);
        let c = Point3::new(2, 0, 0);
        assert_eq!(index.push(3, a), Some(0));
        assert_eq!(index.push(3, b), Some(1));
        assert_eq!(index.push(3, c), Some(2));

        let removal = index.swap_remove(3, 0).unwrap();
        assert_eq!(removal.removed, a);
        assert_eq!(removal.moved, Some(c));
        assert_eq!(index.positions(3), &[c, b]);

        let removal = index.swap_remove(3, 1).unwrap();
        assert_eq!(removal.moved, None);
        assert_eq!(index.positions(3), &[c]);
        assert!(index.swap_remove(3, 4).is_none());
    }

    #[test]
    fn dirty_flags_track_changed_lists() {
        let mut index = InstanceIndex::new();
        index.push(1, Point3::new(0, 0, 0));
        index.push(7, Point3::new(0, 1, 0));
        assert_eq!(index.take_dirty(), vec![1, 7]);
        assert!(!index.has_changes());

        index.swap_remove(7, 0);
        assert_eq!(index.take_dirty(), vec![7]);
        assert_eq!(index.len(), 1);
    }
}
