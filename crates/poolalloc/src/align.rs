//! Size-driven alignment policy.

/// Largest alignment [`align_for`] ever returns.
///
/// Pool buffers are reserved with this alignment so that an aligned offset is
/// also an aligned address.
pub const MAX_ALIGN: usize = 16;

/// Returns the alignment an allocation of `size` bytes receives.
///
/// | size      | alignment |
/// |-----------|-----------|
/// | 1         | 1         |
/// | 2         | 2         |
/// | 3..=4     | 4         |
/// | 5..=8     | 8         |
/// | otherwise | 16        |
///
/// A size of zero is never allocated; it maps to 1.
///
/// ```
/// use poolalloc::align_for;
///
/// assert_eq!(align_for(3), 4);
/// assert_eq!(align_for(40), 16);
/// ```
#[must_use]
pub const fn align_for(size: usize) -> usize {
    match size {
        0..=1 => 1,
        2 => 2,
        3..=4 => 4,
        5..=8 => 8,
        _ => MAX_ALIGN,
    }
}

/// Rounds `value` up to the next multiple of `align`.
///
/// Returns `None` on overflow or if `align` is zero.
#[must_use]
pub const fn align_up(value: usize, align: usize) -> Option<usize> {
    value.checked_next_multiple_of(align)
}
