use alloc::vec::Vec;
use core::ptr::NonNull;

use dll::{DoublyLinkedList, NodeId};
use log::{debug, trace, warn};
use snafu::{ResultExt as _, ensure};

use crate::{
    align::align_for,
    block::Block,
    buffer::Buffer,
    error::{
        AdjacentFreeBlocksSnafu, ConsistencyError, DestroyError, DestroySnafu, EmptyBlockSnafu,
        GapSnafu, InvalidAddressSnafu, InvalidSizeSnafu, NoFitSnafu, NodeStorageSnafu,
        OverlapSnafu, PaddedAllocationSnafu, PoolError, UnsortedFreeListSnafu,
    },
};

/// Usage summary of a [`MemoryPool`].
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PoolStats {
    pub total_size: usize,
    pub free_bytes: usize,
    pub allocated_bytes: usize,
    pub largest_free_block: usize,
    pub free_blocks: usize,
    pub allocations: usize,
}

/// A sub-allocator serving requests from one fixed buffer.
///
/// Free space is tracked in a list of free blocks sorted by offset, in which
/// no two blocks are adjacent. Live allocations are tracked in a second,
/// unordered list. Together the two lists always partition the buffer.
///
/// # Algorithm
///
/// - **Allocation**: first fit in offset order. The first free block that can
///   hold the request at its required alignment is split into leading
///   padding (kept free), the allocation, and a residual (kept free).
/// - **Deallocation**: the block moves back into the free list at its sorted
///   position and is merged with the free blocks directly before and after
///   it.
///
/// # Thread Safety
///
/// The pool is `Send` but not `Sync`. Shared use needs an external lock
/// around every call.
#[derive(Debug)]
pub struct MemoryPool {
    buffer: Buffer,
    free_list: DoublyLinkedList<Block>,
    alloc_list: DoublyLinkedList<Block>,
}

impl MemoryPool {
    /// Creates a pool over a newly reserved buffer of `total_size` bytes.
    ///
    /// The buffer starts out as a single free block.
    pub fn create(total_size: usize) -> Result<Self, PoolError> {
        ensure!(total_size > 0, InvalidSizeSnafu { size: total_size });

        let buffer = Buffer::reserve(total_size)?;
        let mut free_list = DoublyLinkedList::new();
        // `buffer` is released by its destructor if this fails
        free_list
            .push_back(Block::free(0, total_size))
            .context(NodeStorageSnafu)?;

        debug!(
            "created pool of {total_size} bytes at {:p}",
            buffer.base()
        );
        Ok(Self {
            buffer,
            free_list,
            alloc_list: DoublyLinkedList::new(),
        })
    }

    /// Destroys the pool, releasing its buffer.
    ///
    /// # Errors
    ///
    /// Fails if any allocation is still live. The error owns the pool, which
    /// can be recovered with [`DestroyError::into_pool`].
    pub fn destroy(self) -> Result<(), DestroyError> {
        let live = self.alloc_list.len();
        if live > 0 {
            warn!(
                "refusing to destroy pool at {:p} with {live} live allocation(s)",
                self.buffer.base()
            );
            return DestroySnafu { pool: self, live }.fail();
        }

        debug!("destroyed pool at {:p}", self.buffer.base());
        Ok(())
    }

    /// Allocates `size` bytes aligned to [`align_for(size)`](align_for).
    ///
    /// The lowest-offset free block that fits is used. On failure the pool is
    /// left unchanged.
    pub fn alloc(&mut self, size: usize) -> Result<NonNull<u8>, PoolError> {
        ensure!(size > 0, InvalidSizeSnafu { size });

        let align = align_for(size);
        let Some((node, carve)) = self
            .free_list
            .iter()
            .find_map(|(node, block)| block.carve(size, align).map(|carve| (node, carve)))
        else {
            trace!("no free block fits {size} bytes aligned to {align}");
            return NoFitSnafu { size, align }.fail();
        };

        // a split adds at most one free node and one allocated node
        self.free_list.try_reserve(1).context(NodeStorageSnafu)?;
        self.alloc_list.try_reserve(1).context(NodeStorageSnafu)?;

        if let Some(padding) = carve.padding {
            trace!("split off padding {padding}");
            self.free_list
                .insert_before(Some(node), padding)
                .context(NodeStorageSnafu)?;
        }
        match carve.residual {
            Some(residual) => {
                self.free_list
                    .replace(node, residual)
                    .context(NodeStorageSnafu)?;
            }
            None => {
                self.free_list.remove(node).context(NodeStorageSnafu)?;
            }
        }
        self.alloc_list
            .push_back(carve.allocated)
            .context(NodeStorageSnafu)?;

        trace!("allocated {}", carve.allocated);
        Ok(self.buffer.at(carve.allocated.offset()))
    }

    /// Returns an allocation to the pool.
    ///
    /// # Errors
    ///
    /// Fails with [`PoolError::InvalidAddress`] if `ptr` is not the start of a
    /// live allocation of this pool, including when it was already freed. The
    /// pool is left unchanged in that case.
    pub fn free(&mut self, ptr: *mut u8) -> Result<(), PoolError> {
        let addr = ptr.addr();
        let Some(node) = self.find_allocation(addr) else {
            warn!("rejected free of {addr:#x}");
            return InvalidAddressSnafu { addr }.fail();
        };

        self.free_list.try_reserve(1).context(NodeStorageSnafu)?;
        let block = self
            .alloc_list
            .remove(node)
            .context(NodeStorageSnafu)?
            .into_free();

        let node = match self.free_list.find(|free| free.offset() > block.offset()) {
            Some(successor) => self.free_list.insert_before(Some(successor), block),
            None => self.free_list.push_back(block),
        }
        .context(NodeStorageSnafu)?;
        trace!("freed {block}");

        self.coalesce(node)
    }

    /// Merges the free block at `node` with its free neighbors.
    fn coalesce(&mut self, node: NodeId) -> Result<(), PoolError> {
        let backward = self.free_list.prev(node).and_then(|prev| {
            let merged = Block::merge(self.free_list.get(prev)?, self.free_list.get(node)?)?;
            Some((prev, merged))
        });
        if let Some((prev, merged)) = backward {
            trace!("coalesced backward into {merged}");
            self.free_list
                .replace(node, merged)
                .context(NodeStorageSnafu)?;
            self.free_list.remove(prev).context(NodeStorageSnafu)?;
        }

        let forward = self.free_list.next(node).and_then(|next| {
            let merged = Block::merge(self.free_list.get(node)?, self.free_list.get(next)?)?;
            Some((next, merged))
        });
        if let Some((next, merged)) = forward {
            trace!("coalesced forward into {merged}");
            self.free_list
                .replace(node, merged)
                .context(NodeStorageSnafu)?;
            self.free_list.remove(next).context(NodeStorageSnafu)?;
        }

        Ok(())
    }

    fn find_allocation(&self, addr: usize) -> Option<NodeId> {
        let offset = self.buffer.offset_of(addr)?;
        self.alloc_list.find(|block| block.offset() == offset)
    }

    /// Start of the pool buffer.
    #[must_use]
    pub const fn base(&self) -> NonNull<u8> {
        self.buffer.base()
    }

    /// Total size of the pool buffer in bytes.
    #[must_use]
    pub const fn size(&self) -> usize {
        self.buffer.len()
    }

    /// Returns `true` if `ptr` points into the pool buffer.
    #[must_use]
    pub fn contains(&self, ptr: *const u8) -> bool {
        self.buffer.offset_of(ptr.addr()).is_some()
    }

    /// Returns the requested size of the live allocation starting at `ptr`.
    #[must_use]
    pub fn allocation_size(&self, ptr: *const u8) -> Option<usize> {
        let node = self.find_allocation(ptr.addr())?;
        self.alloc_list.get(node).map(Block::requested_size)
    }

    /// Free blocks in ascending offset order.
    pub fn free_blocks(&self) -> impl DoubleEndedIterator<Item = &Block> {
        self.free_list.iter().map(|(_, block)| block)
    }

    /// Live allocations in allocation order.
    pub fn allocations(&self) -> impl DoubleEndedIterator<Item = &Block> {
        self.alloc_list.iter().map(|(_, block)| block)
    }

    #[must_use]
    pub fn stats(&self) -> PoolStats {
        let mut stats = PoolStats {
            total_size: self.size(),
            free_blocks: self.free_list.len(),
            allocations: self.alloc_list.len(),
            ..PoolStats::default()
        };
        for block in self.free_blocks() {
            stats.free_bytes += block.size();
            stats.largest_free_block = stats.largest_free_block.max(block.size());
        }
        stats.allocated_bytes = self.allocations().map(Block::size).sum();
        stats
    }

    /// Verifies the structural invariants of the pool.
    ///
    /// - Every block is non-empty, and allocated blocks carry no padding.
    /// - The free list is strictly sorted by offset and holds no two adjacent
    ///   blocks.
    /// - Free and allocated blocks together cover the buffer exactly once.
    pub fn check_consistency(&self) -> Result<(), ConsistencyError> {
        for block in self.free_blocks().chain(self.allocations()) {
            ensure!(block.size() > 0, EmptyBlockSnafu { block: *block });
        }
        for block in self.allocations() {
            ensure!(
                block.size() == block.requested_size(),
                PaddedAllocationSnafu { block: *block }
            );
        }

        let mut free = self.free_blocks().copied();
        if let Some(mut prev) = free.next() {
            for next in free {
                ensure!(
                    prev.offset() < next.offset(),
                    UnsortedFreeListSnafu { prev, next }
                );
                ensure!(
                    !prev.is_adjacent_to(&next),
                    AdjacentFreeBlocksSnafu { prev, next }
                );
                prev = next;
            }
        }

        let mut blocks: Vec<Block> = self.free_blocks().chain(self.allocations()).copied().collect();
        blocks.sort_unstable_by_key(Block::offset);
        let mut covered = 0;
        for block in blocks {
            ensure!(
                block.offset() >= covered,
                OverlapSnafu { block, covered }
            );
            ensure!(
                block.offset() == covered,
                GapSnafu {
                    start: covered,
                    end: block.offset(),
                }
            );
            covered = block.end();
        }
        ensure!(
            covered == self.size(),
            GapSnafu {
                start: covered,
                end: self.size(),
            }
        );

        Ok(())
    }
}

impl Drop for MemoryPool {
    fn drop(&mut self) {
        if !self.alloc_list.is_empty() {
            warn!(
                "dropping pool at {:p} with {} live allocation(s)",
                self.buffer.base(),
                self.alloc_list.len()
            );
        }
    }
}
