//! A pool-based sub-allocator over one pre-reserved buffer.
//!
//! [`MemoryPool`] reserves a single contiguous buffer up front and serves
//! variable-sized allocations out of it without going back to the system
//! allocator for the memory itself. It targets code that needs arena-style
//! allocation inside a fixed reservation, such as embedded contexts and
//! allocator testbeds.
//!
//! # Bookkeeping
//!
//! The pool keeps two [`dll::DoublyLinkedList`]s of [`Block`] descriptors:
//!
//! - the **free list**, sorted by offset and fully coalesced, and
//! - the **alloc list**, holding the live allocations in no particular order.
//!
//! Between them the two lists cover every byte of the buffer exactly once.
//! Descriptors live outside the buffer, so the whole buffer is usable.
//!
//! ```text
//!   offset  0        8       16                40                    100
//!           ┌────────┬───────┬─────────────────┬─────────────────────┐
//!   buffer  │ alloc  │ free  │      alloc      │        free         │
//!           └────────┴───────┴─────────────────┴─────────────────────┘
//!   free list:  [8..16] ⇄ [40..100]
//!   alloc list: [0..8], [16..40]
//! ```
//!
//! # Alignment
//!
//! The alignment of a request is derived from its size alone, see
//! [`align_for`]. Space skipped to reach an aligned start is split off as a
//! separate free block, so allocated blocks never carry padding.
//!
//! # Usage Example
//!
//! ```rust
//! use poolalloc::MemoryPool;
//!
//! let mut pool = MemoryPool::create(100).unwrap();
//!
//! let a = pool.alloc(40).unwrap();
//! let b = pool.alloc(40).unwrap();
//! assert!(pool.alloc(40).is_err());
//!
//! pool.free(a.as_ptr()).unwrap();
//! pool.free(b.as_ptr()).unwrap();
//! assert_eq!(pool.free_blocks().count(), 1);
//!
//! pool.destroy().unwrap();
//! ```
//!
//! # Performance Characteristics
//!
//! - **Allocation**: O(n) where n is the number of free blocks
//! - **Deallocation**: O(n + m) where m is the number of live allocations
//! - **Memory Overhead**: one list node per block, kept outside the buffer
//!
//! # Thread Safety
//!
//! [`MemoryPool`] is `Send` but not `Sync`. Concurrent use requires an
//! external lock serializing every call.

#![cfg_attr(not(test), no_std)]
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

extern crate alloc;

pub use self::{
    align::{MAX_ALIGN, align_for, align_up},
    block::Block,
    error::{ConsistencyError, DestroyError, ErrorKind, PoolError},
    pool::{MemoryPool, PoolStats},
};

pub mod align;
mod block;
mod buffer;
mod error;
mod pool;
