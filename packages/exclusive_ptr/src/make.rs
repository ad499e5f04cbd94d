//! Helpers that allocate a resource and place it under exclusive ownership in one step,
//! so the raw handle is never observable outside an [`ExclusivePtr`].

use std::alloc::{self, Layout};
use std::mem::MaybeUninit;
use std::ptr::NonNull;

use crate::{Error, ExclusiveArray, ExclusivePtr, Result};

/// Moves `value` to the heap and returns its exclusive owner.
///
/// # Example
///
/// ```
/// use exclusive_ptr::make;
///
/// let owner = make(String::from("heap"));
///
/// assert!(owner.ptr().is_some());
/// assert_eq!(*owner, "heap");
/// ```
#[must_use]
#[inline]
pub fn make<T>(value: T) -> ExclusivePtr<T> {
    ExclusivePtr::from(Box::new(value))
}

/// Constructs a value with `construct` and moves it to the heap under exclusive ownership.
///
/// Construction happens before anything is allocated, so if `construct` fails, its error is
/// returned unchanged and nothing is allocated or leaked.
///
/// # Example
///
/// ```
/// use exclusive_ptr::try_make_with;
///
/// let parsed = try_make_with(|| "42".parse::<u32>()).unwrap();
/// assert_eq!(*parsed, 42);
///
/// let failed = try_make_with(|| "forty-two".parse::<u32>());
/// assert!(failed.is_err());
/// ```
#[inline]
pub fn try_make_with<T, E, F>(construct: F) -> std::result::Result<ExclusivePtr<T>, E>
where
    F: FnOnce() -> std::result::Result<T, E>,
{
    construct().map(make)
}

/// Allocates storage for a `T` without initializing it.
///
/// The storage can be filled with [`init()`](ExclusivePtr::init), or initialized in place
/// followed by [`assume_init()`](ExclusivePtr::assume_init). Releasing the storage before it is
/// initialized frees the memory without dropping anything.
///
/// # Panics
///
/// Aborts through [`alloc::handle_alloc_error`] if memory cannot be allocated.
/// Use [`try_make_uninit()`] to handle that case.
///
/// # Example
///
/// ```
/// use exclusive_ptr::make_uninit;
///
/// let mut storage = make_uninit::<u64>();
/// storage.write(7);
///
/// // SAFETY: We initialized the value above.
/// let value = unsafe { storage.assume_init() };
/// assert_eq!(*value, 7);
/// ```
#[must_use]
#[inline]
pub fn make_uninit<T>() -> ExclusivePtr<MaybeUninit<T>> {
    ExclusivePtr::from(Box::new(MaybeUninit::uninit()))
}

/// Allocates storage for a `T` without initializing it, reporting allocation failure
/// as [`Error::AllocationFailed`] instead of aborting.
///
/// Zero-sized types never touch the allocator.
///
/// # Example
///
/// ```
/// use exclusive_ptr::try_make_uninit;
///
/// let storage = try_make_uninit::<[u32; 16]>().unwrap();
/// let values = storage.init([3; 16]);
///
/// assert_eq!(values.iter().sum::<u32>(), 48);
/// ```
pub fn try_make_uninit<T>() -> Result<ExclusivePtr<MaybeUninit<T>>> {
    let layout = Layout::new::<MaybeUninit<T>>();

    if layout.size() == 0 {
        // Box represents zero-sized allocations with a dangling, well-aligned pointer.
        return Ok(make_uninit());
    }

    // SAFETY: The layout has a non-zero size.
    let raw = unsafe { alloc::alloc(layout) };

    let ptr = NonNull::new(raw.cast::<MaybeUninit<T>>())
        .ok_or(Error::AllocationFailed { layout })?;

    // SAFETY: The memory was allocated by the global allocator with the layout of
    // MaybeUninit<T>, which makes it a valid Box<MaybeUninit<T>> allocation for DefaultDeleter,
    // and nothing else has seen the pointer.
    Ok(unsafe { ExclusivePtr::from_raw(ptr) })
}

/// Allocates an array of `len` elements, each set to `T::default()`.
///
/// # Example
///
/// ```
/// use exclusive_ptr::make_array;
///
/// let zeros = make_array::<u16>(3);
///
/// assert_eq!(*zeros, [0, 0, 0]);
/// ```
#[must_use]
pub fn make_array<T: Default>(len: usize) -> ExclusiveArray<T> {
    make_array_from((0..len).map(|_| T::default()))
}

/// Collects `values` into a heap array under exclusive ownership.
///
/// # Example
///
/// ```
/// use exclusive_ptr::make_array_from;
///
/// let words = make_array_from(["a", "b", "c"].map(String::from));
///
/// assert_eq!(words.len(), 3);
/// assert_eq!(words[1], "b");
/// ```
#[must_use]
pub fn make_array_from<T, I>(values: I) -> ExclusiveArray<T>
where
    I: IntoIterator<Item = T>,
{
    ExclusiveArray::from(values.into_iter().collect::<Box<[T]>>())
}

/// Allocates an array of `len` elements without initializing them.
///
/// Use [`init_with()`](ExclusivePtr::init_with) to fill the array, or initialize it in place
/// followed by [`assume_init()`](ExclusivePtr::assume_init).
///
/// # Example
///
/// ```
/// use exclusive_ptr::make_array_uninit;
///
/// let mut storage = make_array_uninit::<u8>(2);
/// storage[0].write(1);
/// storage[1].write(2);
///
/// // SAFETY: Every element was initialized above.
/// let values = unsafe { storage.assume_init() };
/// assert_eq!(*values, [1, 2]);
/// ```
#[must_use]
pub fn make_array_uninit<T>(len: usize) -> ExclusiveArray<MaybeUninit<T>> {
    make_array_from((0..len).map(|_| MaybeUninit::uninit()))
}
