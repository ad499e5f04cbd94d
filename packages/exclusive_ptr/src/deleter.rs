use std::ptr::NonNull;

/// A stateless release policy for resources of type `T`.
///
/// An [`ExclusivePtr<T, D>`][crate::ExclusivePtr] calls `D::delete` exactly once for every
/// non-empty handle it stops owning without handing it back to the caller. The policy is a type,
/// never a value: it holds no state, takes no space inside the pointer and is resolved at compile
/// time, so releasing a resource is a direct function call.
///
/// The policy has to mirror the allocation discipline that produced the handle. A handle
/// obtained from [`Box::into_raw`] needs [`DefaultDeleter`], a boxed slice needs [`ArrayDeleter`]
/// and a stream from `fopen` needs [`FileCloser`][crate::FileCloser].
///
/// # Example
///
/// ```
/// use std::ptr::NonNull;
///
/// use exclusive_ptr::{Deleter, ExclusivePtr};
///
/// /// Releases nothing; used for handles to `'static` data.
/// struct Forget;
///
/// impl<T: ?Sized> Deleter<T> for Forget {
///     unsafe fn delete(_ptr: NonNull<T>) {}
/// }
///
/// static VALUE: u32 = 5;
///
/// // SAFETY: Forget never touches the handle, so any valid pointer is acceptable.
/// let ptr: ExclusivePtr<u32, Forget> =
///     unsafe { ExclusivePtr::from_raw(NonNull::from(&VALUE)) };
///
/// assert_eq!(*ptr, 5);
/// ```
pub trait Deleter<T: ?Sized> {
    /// Releases the resource behind `ptr`.
    ///
    /// Implementations must not panic: this runs from `Drop`.
    ///
    /// # Safety
    ///
    /// The caller must ensure that:
    ///
    /// 1. `ptr` was obtained through the allocation discipline this policy releases.
    /// 2. The resource has not been released yet and nothing else will release it.
    /// 3. `ptr` is not used again after this call.
    unsafe fn delete(ptr: NonNull<T>);
}

/// Releases a single heap object that was allocated as a [`Box<T>`].
///
/// Works for unsized targets too, so trait objects produced by [`upcast!`][crate::upcast] are
/// released through the concrete type's drop logic.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
#[expect(
    clippy::exhaustive_structs,
    reason = "stateless tag type; it will never have fields"
)]
pub struct DefaultDeleter;

impl<T: ?Sized> Deleter<T> for DefaultDeleter {
    #[inline]
    unsafe fn delete(ptr: NonNull<T>) {
        // SAFETY: Forwarding the caller's guarantee that `ptr` came from `Box::into_raw`
        // (or an equivalent Global allocation with the layout of `T`) and is released only here.
        drop(unsafe { Box::from_raw(ptr.as_ptr()) });
    }
}

/// Releases a heap array that was allocated as a [`Box<[T]>`].
///
/// The handle is a slice pointer, so the element count is part of the handle and every element
/// is dropped before the whole block is freed. This policy is only defined for slices, which
/// keeps an array from ever being released as a single object.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
#[expect(
    clippy::exhaustive_structs,
    reason = "stateless tag type; it will never have fields"
)]
pub struct ArrayDeleter;

impl<T> Deleter<[T]> for ArrayDeleter {
    #[inline]
    unsafe fn delete(ptr: NonNull<[T]>) {
        // SAFETY: Forwarding the caller's guarantee that `ptr` came from a boxed slice of
        // exactly this length and is released only here.
        drop(unsafe { Box::from_raw(ptr.as_ptr()) });
    }
}
