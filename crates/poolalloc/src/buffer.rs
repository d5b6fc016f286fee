use core::{alloc::Layout, ptr::NonNull};

use snafu::OptionExt as _;

use crate::{align::MAX_ALIGN, error::ReserveBufferSnafu};

/// The backing memory of a pool, reserved once from the global allocator and
/// released exactly once on drop.
#[derive(Debug)]
pub(crate) struct Buffer {
    ptr: NonNull<u8>,
    layout: Layout,
}

// The buffer is exclusively owned; nothing else holds its pointer.
unsafe impl Send for Buffer {}

impl Buffer {
    pub(crate) fn reserve(size: usize) -> Result<Self, crate::PoolError> {
        assert!(size > 0, "Buffer size must be greater than zero");

        let layout = Layout::from_size_align(size, MAX_ALIGN)
            .ok()
            .context(ReserveBufferSnafu { size })?;
        let ptr = unsafe { alloc::alloc::alloc(layout) };
        let ptr = NonNull::new(ptr).context(ReserveBufferSnafu { size })?;
        Ok(Self { ptr, layout })
    }

    pub(crate) const fn base(&self) -> NonNull<u8> {
        self.ptr
    }

    pub(crate) const fn len(&self) -> usize {
        self.layout.size()
    }

    /// Converts an address into an offset if it lies inside the buffer.
    pub(crate) fn offset_of(&self, addr: usize) -> Option<usize> {
        addr.checked_sub(self.ptr.addr().get())
            .filter(|offset| *offset < self.len())
    }

    /// Returns the address of `offset`.
    ///
    /// # Panics
    ///
    /// Panics if `offset` is outside the buffer.
    pub(crate) fn at(&self, offset: usize) -> NonNull<u8> {
        assert!(offset < self.len(), "Offset must lie inside the buffer");
        unsafe { self.ptr.add(offset) }
    }
}

impl Drop for Buffer {
    fn drop(&mut self) {
        unsafe { alloc::alloc::dealloc(self.ptr.as_ptr(), self.layout) }
    }
}
