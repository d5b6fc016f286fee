//! Block descriptors and the pure offset arithmetic behind splitting and
//! coalescing.
//!
//! Nothing in here touches a list; the pool decides where the resulting
//! descriptors are linked.

use core::ops::Range;

use crate::align::align_up;

/// A contiguous byte range of a pool, addressed by offset from the pool base.
///
/// For free blocks `requested_size` is zero. For allocated blocks it equals
/// `size`, since alignment padding is always split off into its own free
/// block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, derive_more::Display)]
#[display("{offset:#x}+{size:#x}")]
pub struct Block {
    offset: usize,
    size: usize,
    requested_size: usize,
}

/// Result of carving an allocation out of a free block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Carve {
    /// Free space in front of the aligned start.
    pub(crate) padding: Option<Block>,
    pub(crate) allocated: Block,
    /// Free space left behind the allocation.
    pub(crate) residual: Option<Block>,
}

impl Block {
    pub(crate) const fn free(offset: usize, size: usize) -> Self {
        Self {
            offset,
            size,
            requested_size: 0,
        }
    }

    pub(crate) const fn allocated(offset: usize, size: usize) -> Self {
        Self {
            offset,
            size,
            requested_size: size,
        }
    }

    #[must_use]
    pub const fn offset(&self) -> usize {
        self.offset
    }

    #[must_use]
    pub const fn size(&self) -> usize {
        self.size
    }

    #[must_use]
    pub const fn requested_size(&self) -> usize {
        self.requested_size
    }

    /// One past the last offset covered by the block.
    #[must_use]
    pub const fn end(&self) -> usize {
        self.offset + self.size
    }

    #[must_use]
    pub const fn range(&self) -> Range<usize> {
        self.offset..self.end()
    }

    /// Returns `true` if `next` starts exactly where `self` ends.
    #[must_use]
    pub const fn is_adjacent_to(&self, next: &Self) -> bool {
        self.end() == next.offset
    }

    /// Turns an allocated block back into a free one.
    pub(crate) const fn into_free(self) -> Self {
        Self::free(self.offset, self.size)
    }

    /// Tries to place `size` bytes aligned to `align` inside this block.
    ///
    /// The block fits iff `align_up(offset, align) + size <= end`. On success
    /// the block is split into optional leading padding, the allocation and
    /// an optional residual; all three together cover exactly this block.
    pub(crate) fn carve(&self, size: usize, align: usize) -> Option<Carve> {
        assert!(size > 0, "Size must be greater than zero");

        let aligned_start = align_up(self.offset, align)?;
        let alloc_end = aligned_start.checked_add(size)?;
        if alloc_end > self.end() {
            return None;
        }

        let padding = (aligned_start > self.offset)
            .then(|| Self::free(self.offset, aligned_start - self.offset));
        let residual =
            (alloc_end < self.end()).then(|| Self::free(alloc_end, self.end() - alloc_end));
        Some(Carve {
            padding,
            allocated: Self::allocated(aligned_start, size),
            residual,
        })
    }

    /// Merges two free blocks if `upper` starts where `lower` ends.
    pub(crate) fn merge(lower: &Self, upper: &Self) -> Option<Self> {
        lower
            .is_adjacent_to(upper)
            .then(|| Self::free(lower.offset, lower.size + upper.size))
    }
}
