use std::mem;

/// Stores `val` into `dst` and returns the value `dst` held immediately before.
///
/// This is the ownership hand-off used by every operation of [`ExclusivePtr`][crate::ExclusivePtr]
/// that changes who owns a resource: the source location is overwritten in the same step that its
/// previous value is taken, so there is never a moment where both the old and the new owner hold
/// the same handle.
///
/// # Example
///
/// ```
/// use exclusive_ptr::exchange;
///
/// let mut slot = Some(5_u32);
/// let previous = exchange(&mut slot, None);
///
/// assert_eq!(previous, Some(5));
/// assert_eq!(slot, None);
/// ```
#[must_use]
#[inline]
pub fn exchange<T, U>(dst: &mut T, val: U) -> T
where
    U: Into<T>,
{
    mem::replace(dst, val.into())
}
