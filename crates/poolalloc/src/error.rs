use dll::ListError;
use snafu::Snafu;
use snafu_utils::{Located, Location};

use crate::{block::Block, pool::MemoryPool};

/// Coarse classification of pool failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, derive_more::IsVariant)]
pub enum ErrorKind {
    /// The pool buffer or a block list node could not be reserved.
    AllocationFailure,
    /// No free block satisfies the size and alignment of a request.
    NoFitFound,
    /// The address passed to `free` is not a live allocation of the pool.
    InvalidAddress,
    /// `destroy` was called while allocations were still live.
    PreconditionViolation,
    /// A zero size was passed to `create` or `alloc`.
    InvalidArgument,
}

/// Errors that can occur while creating a pool or serving requests from it.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum PoolError {
    #[snafu(display("failed to reserve a {size} byte pool buffer"))]
    ReserveBuffer {
        size: usize,
        #[snafu(implicit)]
        location: Location,
    },
    #[snafu(display("failed to update block list"))]
    NodeStorage {
        #[snafu(source)]
        source: ListError,
        #[snafu(implicit)]
        location: Location,
    },
    #[snafu(display("no free block fits {size} bytes aligned to {align}"))]
    NoFit {
        size: usize,
        align: usize,
        #[snafu(implicit)]
        location: Location,
    },
    #[snafu(display("address {addr:#x} is not a live allocation of this pool"))]
    InvalidAddress {
        addr: usize,
        #[snafu(implicit)]
        location: Location,
    },
    #[snafu(display("invalid size {size}, sizes must be at least one byte"))]
    InvalidSize {
        size: usize,
        #[snafu(implicit)]
        location: Location,
    },
}

impl PoolError {
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::ReserveBuffer { .. } | Self::NodeStorage { .. } => ErrorKind::AllocationFailure,
            Self::NoFit { .. } => ErrorKind::NoFitFound,
            Self::InvalidAddress { .. } => ErrorKind::InvalidAddress,
            Self::InvalidSize { .. } => ErrorKind::InvalidArgument,
        }
    }
}

impl Located for PoolError {
    fn location(&self) -> Location {
        match self {
            Self::ReserveBuffer { location, .. }
            | Self::NodeStorage { location, .. }
            | Self::NoFit { location, .. }
            | Self::InvalidAddress { location, .. }
            | Self::InvalidSize { location, .. } => *location,
        }
    }
}

/// Returned by [`MemoryPool::destroy`] when allocations are still live.
///
/// The pool is handed back untouched so the remaining allocations can be
/// freed before trying again.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
#[snafu(display("cannot destroy pool with {live} live allocation(s)"))]
pub struct DestroyError {
    pool: MemoryPool,
    live: usize,
    #[snafu(implicit)]
    location: Location,
}

impl DestroyError {
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        ErrorKind::PreconditionViolation
    }

    /// Number of allocations that were live when `destroy` was called.
    #[must_use]
    pub const fn live(&self) -> usize {
        self.live
    }

    #[must_use]
    pub fn into_pool(self) -> MemoryPool {
        self.pool
    }
}

impl Located for DestroyError {
    fn location(&self) -> Location {
        self.location
    }
}

/// A violated pool invariant, found by [`MemoryPool::check_consistency`].
#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum ConsistencyError {
    #[snafu(display("empty block {block} in a block list"))]
    EmptyBlock {
        block: Block,
        #[snafu(implicit)]
        location: Location,
    },
    #[snafu(display("free blocks {prev} and {next} are out of order"))]
    UnsortedFreeList {
        prev: Block,
        next: Block,
        #[snafu(implicit)]
        location: Location,
    },
    #[snafu(display("free blocks {prev} and {next} were not coalesced"))]
    AdjacentFreeBlocks {
        prev: Block,
        next: Block,
        #[snafu(implicit)]
        location: Location,
    },
    #[snafu(display("allocated block {block} reserves more than was requested"))]
    PaddedAllocation {
        block: Block,
        #[snafu(implicit)]
        location: Location,
    },
    #[snafu(display("bytes {start:#x}..{end:#x} are not covered by any block"))]
    Gap {
        start: usize,
        end: usize,
        #[snafu(implicit)]
        location: Location,
    },
    #[snafu(display("block {block} overlaps bytes before {covered:#x}"))]
    Overlap {
        block: Block,
        covered: usize,
        #[snafu(implicit)]
        location: Location,
    },
}

impl Located for ConsistencyError {
    fn location(&self) -> Location {
        match self {
            Self::EmptyBlock { location, .. }
            | Self::UnsortedFreeList { location, .. }
            | Self::AdjacentFreeBlocks { location, .. }
            | Self::PaddedAllocation { location, .. }
            | Self::Gap { location, .. }
            | Self::Overlap { location, .. } => *location,
        }
    }
}
