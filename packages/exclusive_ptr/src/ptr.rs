use std::any::type_name;
use std::fmt;
use std::marker::PhantomData;
use std::mem::MaybeUninit;
use std::ops::{Deref, DerefMut};
use std::ptr::{self, NonNull};

use crate::{ArrayDeleter, DefaultDeleter, Deleter, exchange};

/// An array under exclusive ownership, released as a whole by [`ArrayDeleter`].
///
/// The handle is a slice pointer, so the element count is always known to the release policy.
pub type ExclusiveArray<T> = ExclusivePtr<[T], ArrayDeleter>;

/// Exclusive owner of a single resource, released through the policy `D`.
///
/// The pointer is either empty or owns exactly one handle. While it owns a handle, no other
/// [`ExclusivePtr`] owns the same resource; every operation that hands ownership over leaves the
/// source empty. When a non-empty pointer is dropped, `D::delete` runs exactly once.
///
/// # Ownership transfer
///
/// Ownership moves with ordinary Rust moves. To move out of a borrowed location, use
/// [`take()`](Self::take), which leaves the location empty. Assigning a new pointer over an
/// existing one (with `=` or [`assign()`](Self::assign)) releases the previous resource first.
///
/// The type implements neither [`Clone`] nor [`Copy`], so ownership cannot be duplicated.
///
/// # Access
///
/// [`Deref`] and [`DerefMut`] give direct access to the resource and panic if the pointer is
/// empty. Use [`get()`](Self::get) or [`get_mut()`](Self::get_mut) for checked access, or
/// [`ptr()`](Self::ptr) for the raw handle.
///
/// # Thread safety
///
/// Like [`Box<T>`], the pointer is [`Send`] if `T` is [`Send`] and [`Sync`] if `T` is [`Sync`].
/// The release policy never affects either.
///
/// # Example
///
/// ```
/// use exclusive_ptr::{ExclusivePtr, make};
///
/// let mut owner = make(vec![1, 2, 3]);
/// owner.push(4);
///
/// let mut next_owner: ExclusivePtr<Vec<i32>> = ExclusivePtr::null();
/// next_owner.assign(owner.take());
///
/// assert!(owner.is_null());
/// assert_eq!(*next_owner, [1, 2, 3, 4]);
/// ```
pub struct ExclusivePtr<T: ?Sized, D: Deleter<T> = DefaultDeleter> {
    ptr: Option<NonNull<T>>,

    // We own a T and may drop it.
    _owns: PhantomData<T>,

    // The policy is never instantiated and must not influence auto traits.
    _deleter: PhantomData<fn() -> D>,
}

impl<T: ?Sized, D: Deleter<T>> ExclusivePtr<T, D> {
    /// Creates a pointer that owns nothing.
    ///
    /// # Example
    ///
    /// ```
    /// use exclusive_ptr::ExclusivePtr;
    ///
    /// let ptr = ExclusivePtr::<String>::null();
    ///
    /// assert!(ptr.is_null());
    /// assert!(ptr.get().is_none());
    /// ```
    #[must_use]
    #[inline]
    pub const fn null() -> Self {
        Self {
            ptr: None,
            _owns: PhantomData,
            _deleter: PhantomData,
        }
    }

    /// Takes ownership of a raw handle.
    ///
    /// # Safety
    ///
    /// The caller must ensure that:
    ///
    /// 1. `ptr` points to a valid `T` that can be released by `D`.
    /// 2. No other owner exists for the resource and the caller will not release it,
    ///    or access it other than through this pointer, from now on.
    #[must_use]
    #[inline]
    pub const unsafe fn from_raw(ptr: NonNull<T>) -> Self {
        Self {
            ptr: Some(ptr),
            _owns: PhantomData,
            _deleter: PhantomData,
        }
    }

    /// Returns the raw handle without affecting ownership, or `None` if the pointer is empty.
    #[must_use]
    #[inline]
    pub fn ptr(&self) -> Option<NonNull<T>> {
        self.ptr
    }

    /// Whether the pointer owns nothing.
    #[must_use]
    #[inline]
    pub fn is_null(&self) -> bool {
        self.ptr.is_none()
    }

    /// Returns a shared reference to the owned resource, or `None` if the pointer is empty.
    #[must_use]
    #[inline]
    pub fn get(&self) -> Option<&T> {
        self.ptr.map(|ptr| {
            // SAFETY: We own the resource, so it is valid for as long as we are borrowed.
            unsafe { ptr.as_ref() }
        })
    }

    /// Returns an exclusive reference to the owned resource, or `None` if the pointer is empty.
    #[must_use]
    #[inline]
    pub fn get_mut(&mut self) -> Option<&mut T> {
        self.ptr.map(|mut ptr| {
            // SAFETY: We own the resource exclusively and are borrowed exclusively,
            // so no other reference to it can exist.
            unsafe { ptr.as_mut() }
        })
    }

    /// Gives up ownership of the handle without releasing it.
    ///
    /// The pointer is left empty and the policy is not invoked. Releasing the returned handle
    /// becomes the caller's responsibility.
    ///
    /// # Example
    ///
    /// ```
    /// use exclusive_ptr::{DefaultDeleter, Deleter, make};
    ///
    /// let mut owner = make(String::from("manual"));
    /// let raw = owner.release().unwrap();
    ///
    /// assert!(owner.is_null());
    ///
    /// // SAFETY: The handle came from `make()` and nothing else owns it anymore.
    /// unsafe { DefaultDeleter::delete(raw) };
    /// ```
    #[must_use = "the released handle is no longer owned by anything and will leak if ignored"]
    #[inline]
    pub fn release(&mut self) -> Option<NonNull<T>> {
        self.ptr.take()
    }

    /// Consumes the pointer and returns the handle without releasing it.
    ///
    /// Equivalent to [`release()`](Self::release) followed by dropping the now empty pointer.
    #[must_use = "the returned handle is no longer owned by anything and will leak if ignored"]
    #[inline]
    pub fn into_raw(mut self) -> Option<NonNull<T>> {
        self.release()
    }

    /// Releases the owned resource, if any, and leaves the pointer empty.
    ///
    /// # Example
    ///
    /// ```
    /// use exclusive_ptr::make;
    ///
    /// let mut owner = make(5_u8);
    /// owner.reset();
    ///
    /// assert!(owner.is_null());
    ///
    /// // Resetting an empty pointer does nothing.
    /// owner.reset();
    /// ```
    #[inline]
    pub fn reset(&mut self) {
        release_handle::<T, D>(self.ptr.take());
    }

    /// Releases the owned resource, if any, and takes ownership of `ptr` instead.
    ///
    /// # Safety
    ///
    /// Same as [`from_raw()`](Self::from_raw). In particular, `ptr` must not be the handle this
    /// pointer currently owns.
    #[inline]
    pub unsafe fn reset_to(&mut self, ptr: NonNull<T>) {
        let previous = exchange(&mut self.ptr, ptr);
        release_handle::<T, D>(previous);
    }

    /// Moves ownership out of this pointer into a new one, leaving this pointer empty.
    ///
    /// This is the move for places that cannot be moved out of directly, such as
    /// struct fields behind `&mut`.
    #[must_use]
    #[inline]
    pub fn take(&mut self) -> Self {
        Self {
            ptr: self.ptr.take(),
            _owns: PhantomData,
            _deleter: PhantomData,
        }
    }

    /// Releases the owned resource, if any, and takes over the resource owned by `source`.
    ///
    /// `source` is consumed. Because `self` is borrowed exclusively, `source` can never be the
    /// same instance, so assigning a pointer to itself cannot be expressed.
    #[inline]
    pub fn assign(&mut self, source: Self) {
        let incoming = source.into_raw();
        let previous = exchange(&mut self.ptr, incoming);
        release_handle::<T, D>(previous);
    }

    /// Converts the pointer into a pointer to a more general type, using `cast_fn` to convert
    /// the raw handle.
    ///
    /// The source is consumed. An empty source produces an empty result without calling
    /// `cast_fn`. Prefer the [`upcast!`][crate::upcast] macro, which supplies a conversion
    /// function that always satisfies the safety requirements.
    ///
    /// # Safety
    ///
    /// The caller must ensure that the pointer returned by `cast_fn` addresses the same
    /// resource as its input, such that releasing it through `D` as a `U` is equivalent to
    /// releasing the original through `D` as a `T`. An unsizing coercion meets this requirement.
    #[must_use]
    #[inline]
    pub unsafe fn cast_with<U: ?Sized, F>(mut self, cast_fn: F) -> ExclusivePtr<U, D>
    where
        D: Deleter<U>,
        F: FnOnce(*mut T) -> *mut U,
    {
        let Some(ptr) = self.ptr else {
            return ExclusivePtr::null();
        };

        // If this panics, we still own the original and release it normally.
        let cast = cast_fn(ptr.as_ptr());

        debug_assert!(
            ptr::addr_eq(ptr.as_ptr(), cast),
            "cast function must not change the address of the resource"
        );

        let Some(cast) = NonNull::new(cast) else {
            panic!("cast function must not turn a valid handle into a null pointer");
        };

        // We have the converted form, so give up the original without releasing it.
        let _original = self.release();

        // SAFETY: The caller guarantees that the converted handle addresses the same resource,
        // which we owned exclusively until the line above and which D can release as a U.
        unsafe { ExclusivePtr::from_raw(cast) }
    }
}

/// Invokes the release policy on `handle` if there is one.
#[inline]
fn release_handle<T: ?Sized, D: Deleter<T>>(handle: Option<NonNull<T>>) {
    if let Some(ptr) = handle {
        // SAFETY: Only called with handles that an ExclusivePtr<T, D> owned until the caller
        // removed them from it, so the policy matches and the handle is released only here.
        unsafe { D::delete(ptr) };
    }
}

impl<T: ?Sized> ExclusivePtr<T, DefaultDeleter> {
    /// Converts the pointer into a [`Box`], or returns `None` if the pointer is empty.
    #[must_use]
    #[inline]
    pub fn into_box(self) -> Option<Box<T>> {
        self.into_raw().map(|ptr| {
            // SAFETY: Everything released by DefaultDeleter was allocated as a Box<T>,
            // and into_raw() gave up our ownership of it.
            unsafe { Box::from_raw(ptr.as_ptr()) }
        })
    }
}

impl<T> ExclusivePtr<MaybeUninit<T>, DefaultDeleter> {
    /// Initializes the owned storage with `value`.
    ///
    /// # Panics
    ///
    /// Panics if the pointer is empty.
    ///
    /// # Example
    ///
    /// ```
    /// use exclusive_ptr::make_uninit;
    ///
    /// let storage = make_uninit::<[u8; 4]>();
    /// let value = storage.init([1, 2, 3, 4]);
    ///
    /// assert_eq!(*value, [1, 2, 3, 4]);
    /// ```
    #[must_use]
    #[track_caller]
    pub fn init(mut self, value: T) -> ExclusivePtr<T, DefaultDeleter> {
        let Some(slot) = self.get_mut() else {
            panic!("cannot initialize the storage of an empty ExclusivePtr");
        };

        slot.write(value);

        // SAFETY: We just initialized the storage.
        unsafe { self.assume_init() }
    }

    /// Converts storage that has been initialized in place into a pointer to the value.
    ///
    /// An empty pointer converts to an empty pointer.
    ///
    /// # Safety
    ///
    /// The caller must ensure that the storage holds a fully initialized `T`.
    #[must_use]
    #[inline]
    pub unsafe fn assume_init(self) -> ExclusivePtr<T, DefaultDeleter> {
        self.into_raw().map_or_else(ExclusivePtr::null, |ptr| {
            // SAFETY: MaybeUninit<T> has the layout of T, so the allocation is also a valid
            // Box<T> allocation, and the caller guarantees the value is initialized.
            unsafe { ExclusivePtr::from_raw(ptr.cast::<T>()) }
        })
    }
}

impl<T> ExclusivePtr<[T], ArrayDeleter> {
    /// Converts the array into a boxed slice, or returns `None` if the pointer is empty.
    #[must_use]
    #[inline]
    pub fn into_boxed_slice(self) -> Option<Box<[T]>> {
        self.into_raw().map(|ptr| {
            // SAFETY: Everything released by ArrayDeleter was allocated as a Box<[T]>,
            // and into_raw() gave up our ownership of it.
            unsafe { Box::from_raw(ptr.as_ptr()) }
        })
    }
}

impl<T> ExclusivePtr<[MaybeUninit<T>], ArrayDeleter> {
    /// Initializes every element with the value returned by `init_fn` for its index.
    ///
    /// If `init_fn` panics, the elements initialized so far are leaked, never dropped.
    /// An empty pointer converts to an empty pointer.
    ///
    /// # Example
    ///
    /// ```
    /// use exclusive_ptr::make_array_uninit;
    ///
    /// let squares = make_array_uninit::<usize>(4).init_with(|index| index * index);
    ///
    /// assert_eq!(*squares, [0, 1, 4, 9]);
    /// ```
    #[must_use]
    pub fn init_with<F>(mut self, mut init_fn: F) -> ExclusiveArray<T>
    where
        F: FnMut(usize) -> T,
    {
        if let Some(slots) = self.get_mut() {
            for (index, slot) in slots.iter_mut().enumerate() {
                slot.write(init_fn(index));
            }
        }

        // SAFETY: Every element was initialized above.
        unsafe { self.assume_init() }
    }

    /// Converts an array whose elements have been initialized in place into an array of values.
    ///
    /// An empty pointer converts to an empty pointer.
    ///
    /// # Safety
    ///
    /// The caller must ensure that every element is fully initialized.
    #[must_use]
    #[inline]
    pub unsafe fn assume_init(self) -> ExclusiveArray<T> {
        self.into_raw().map_or_else(ExclusivePtr::null, |ptr| {
            let values = NonNull::slice_from_raw_parts(ptr.cast::<T>(), ptr.len());

            // SAFETY: [MaybeUninit<T>] has the layout of [T] for the same length, so the
            // allocation is also a valid Box<[T]> allocation, and the caller guarantees that
            // every element is initialized.
            unsafe { ExclusivePtr::from_raw(values) }
        })
    }
}

impl<T: ?Sized, D: Deleter<T>> Drop for ExclusivePtr<T, D> {
    #[inline]
    fn drop(&mut self) {
        self.reset();
    }
}

impl<T: ?Sized, D: Deleter<T>> Default for ExclusivePtr<T, D> {
    #[inline]
    fn default() -> Self {
        Self::null()
    }
}

impl<T: ?Sized, D: Deleter<T>> Deref for ExclusivePtr<T, D> {
    type Target = T;

    /// Provides direct access to the owned resource.
    ///
    /// # Panics
    ///
    /// Panics if the pointer is empty.
    #[inline]
    #[track_caller]
    fn deref(&self) -> &Self::Target {
        let Some(value) = self.get() else {
            panic!("dereferenced an empty ExclusivePtr<{}>", type_name::<T>());
        };

        value
    }
}

impl<T: ?Sized, D: Deleter<T>> DerefMut for ExclusivePtr<T, D> {
    /// Provides direct mutable access to the owned resource.
    ///
    /// # Panics
    ///
    /// Panics if the pointer is empty.
    #[inline]
    #[track_caller]
    fn deref_mut(&mut self) -> &mut Self::Target {
        let Some(value) = self.get_mut() else {
            panic!("dereferenced an empty ExclusivePtr<{}>", type_name::<T>());
        };

        value
    }
}

impl<T: ?Sized> From<Box<T>> for ExclusivePtr<T, DefaultDeleter> {
    #[inline]
    fn from(value: Box<T>) -> Self {
        let ptr = NonNull::from(Box::leak(value));

        // SAFETY: The handle came from a Box, which is what DefaultDeleter releases,
        // and leaking the Box made us its only owner.
        unsafe { Self::from_raw(ptr) }
    }
}

impl<T> From<Box<[T]>> for ExclusivePtr<[T], ArrayDeleter> {
    #[inline]
    fn from(value: Box<[T]>) -> Self {
        let ptr = NonNull::from(Box::leak(value));

        // SAFETY: The handle came from a boxed slice, which is what ArrayDeleter releases,
        // and leaking the Box made us its only owner.
        unsafe { Self::from_raw(ptr) }
    }
}

impl<T> From<Vec<T>> for ExclusivePtr<[T], ArrayDeleter> {
    #[inline]
    fn from(value: Vec<T>) -> Self {
        Self::from(value.into_boxed_slice())
    }
}

// SAFETY: We own the T exclusively, so moving the pointer to another thread moves the T,
// which is fine if T is Send. The policy is stateless and runs wherever the pointer is dropped.
unsafe impl<T: ?Sized + Send, D: Deleter<T>> Send for ExclusivePtr<T, D> {}

// SAFETY: A shared reference to the pointer only gives out shared references to the T,
// which is fine if T is Sync.
unsafe impl<T: ?Sized + Sync, D: Deleter<T>> Sync for ExclusivePtr<T, D> {}

impl<T: ?Sized, D: Deleter<T>> fmt::Debug for ExclusivePtr<T, D> {
    #[cfg_attr(test, mutants::skip)] // Debug output is not part of the API contract.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExclusivePtr")
            .field("type_name", &type_name::<T>())
            .field("deleter", &type_name::<D>())
            .field("ptr", &self.ptr)
            .finish()
    }
}

impl<T: ?Sized, D: Deleter<T>> fmt::Pointer for ExclusivePtr<T, D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.ptr {
            Some(ptr) => fmt::Pointer::fmt(&ptr, f),
            None => fmt::Pointer::fmt(&ptr::null::<()>(), f),
        }
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use std::any::Any;
    use std::cell::{Cell, RefCell};
    use std::fmt::Display;
    use std::mem;
    use std::panic::{AssertUnwindSafe, catch_unwind};
    use std::rc::Rc;

    use static_assertions::{assert_eq_size, assert_impl_all, assert_not_impl_any};

    use super::*;
    use crate::{make, upcast};

    assert_eq_size!(ExclusivePtr<u64>, *mut u64);
    assert_eq_size!(ExclusivePtr<[u8], ArrayDeleter>, *mut [u8]);
    assert_eq_size!(ExclusivePtr<dyn Display>, *mut dyn Display);

    assert_impl_all!(ExclusivePtr<u32>: Send, Sync);
    assert_impl_all!(ExclusivePtr<String>: Send, Sync);
    assert_impl_all!(ExclusiveArray<Vec<u8>>: Send, Sync);
    assert_impl_all!(ExclusivePtr<Cell<u32>>: Send);
    assert_not_impl_any!(ExclusivePtr<Cell<u32>>: Sync);
    assert_not_impl_any!(ExclusivePtr<Rc<u32>>: Send, Sync);
    assert_not_impl_any!(ExclusivePtr<u32>: Clone, Copy);
    assert_not_impl_any!(ExclusiveArray<u32>: Clone, Copy);

    thread_local! {
        static RELEASED: RefCell<Vec<usize>> = const { RefCell::new(Vec::new()) };
    }

    /// Releases boxed values like `DefaultDeleter` and records the address of every release
    /// in a thread-local list.
    struct Recording;

    impl<T: ?Sized> Deleter<T> for Recording {
        unsafe fn delete(ptr: NonNull<T>) {
            RELEASED.with_borrow_mut(|released| released.push(address_of(ptr)));

            // SAFETY: Forwarding the caller's guarantees.
            unsafe { DefaultDeleter::delete(ptr) };
        }
    }

    fn address_of<T: ?Sized>(ptr: NonNull<T>) -> usize {
        ptr.as_ptr().cast::<()>().addr()
    }

    fn released() -> Vec<usize> {
        RELEASED.with_borrow(Clone::clone)
    }

    fn recorded<T>(value: T) -> ExclusivePtr<T, Recording> {
        let ptr = NonNull::from(Box::leak(Box::new(value)));

        // SAFETY: Recording releases boxed values and the Box was leaked to us.
        unsafe { ExclusivePtr::from_raw(ptr) }
    }

    #[test]
    fn empty_owns_nothing() {
        let ptr = ExclusivePtr::<u32, Recording>::null();

        assert!(ptr.is_null());
        assert!(ptr.ptr().is_none());
        assert!(ptr.get().is_none());

        drop(ptr);
        assert!(released().is_empty());
    }

    #[test]
    fn default_is_empty() {
        let ptr: ExclusivePtr<String> = ExclusivePtr::default();

        assert!(ptr.is_null());
    }

    #[test]
    fn drop_releases_exactly_once() {
        let ptr = recorded(42_u32);
        let address = address_of(ptr.ptr().expect("just created"));

        drop(ptr);

        assert_eq!(released(), vec![address]);
    }

    #[test]
    fn get_does_not_affect_ownership() {
        let mut ptr = recorded(String::from("value"));

        assert_eq!(ptr.get().map(String::as_str), Some("value"));
        ptr.get_mut().expect("owns a value").push('s');
        assert_eq!(ptr.get().map(String::as_str), Some("values"));

        assert!(!ptr.is_null());
        assert!(released().is_empty());
    }

    #[test]
    fn release_does_not_invoke_policy() {
        let mut ptr = recorded(7_u8);
        let original = ptr.ptr();

        let raw = ptr.release();

        assert_eq!(raw, original);
        assert!(ptr.is_null());

        drop(ptr);
        assert!(released().is_empty());

        // SAFETY: The handle came from an ExclusivePtr<_, Recording> and we now own it.
        unsafe { Recording::delete(raw.expect("was not empty")) };
        assert_eq!(released().len(), 1);
    }

    #[test]
    fn release_of_empty_returns_none() {
        let mut ptr = ExclusivePtr::<u8, Recording>::null();

        assert!(ptr.release().is_none());
        assert!(ptr.into_raw().is_none());
        assert!(released().is_empty());
    }

    #[test]
    fn reset_releases_and_empties() {
        let mut ptr = recorded(1_u16);
        let address = address_of(ptr.ptr().expect("just created"));

        ptr.reset();
        assert!(ptr.is_null());
        assert_eq!(released(), vec![address]);

        ptr.reset();
        drop(ptr);
        assert_eq!(released(), vec![address]);
    }

    #[test]
    fn reset_to_releases_old_and_adopts_new() {
        let mut ptr = recorded(1_u16);
        let old_address = address_of(ptr.ptr().expect("just created"));

        let new_handle = NonNull::from(Box::leak(Box::new(2_u16)));

        // SAFETY: The new handle is a leaked Box, which Recording can release.
        unsafe { ptr.reset_to(new_handle) };

        assert_eq!(released(), vec![old_address]);
        assert_eq!(ptr.ptr(), Some(new_handle));
        assert_eq!(*ptr, 2);

        drop(ptr);
        assert_eq!(released(), vec![old_address, address_of(new_handle)]);
    }

    #[test]
    fn take_leaves_source_empty() {
        let mut source = recorded(String::from("moved"));
        let original = source.ptr();

        let destination = source.take();

        assert!(source.is_null());
        assert_eq!(destination.ptr(), original);
        assert_eq!(*destination, "moved");
        assert!(released().is_empty());
    }

    #[test]
    fn native_move_transfers_handle() {
        let source = recorded(3_i32);
        let original = source.ptr();

        let destination = source;

        assert_eq!(destination.ptr(), original);
        assert!(released().is_empty());
    }

    #[test]
    fn assign_releases_previous_resource() {
        let mut target = recorded(1_u32);
        let target_address = address_of(target.ptr().expect("just created"));
        let mut source = recorded(2_u32);
        let source_handle = source.ptr();

        target.assign(source.take());

        assert_eq!(released(), vec![target_address]);
        assert!(source.is_null());
        assert_eq!(target.ptr(), source_handle);
        assert_eq!(*target, 2);
    }

    #[test]
    fn assign_into_empty_releases_nothing() {
        let mut target = ExclusivePtr::<u32, Recording>::null();

        target.assign(recorded(9));

        assert!(released().is_empty());
        assert_eq!(*target, 9);
    }

    #[test]
    fn reassigning_own_handle_keeps_it() {
        let mut ptr = recorded(5_u64);
        let original = ptr.ptr();

        let moved_out = ptr.take();
        ptr.assign(moved_out);

        assert_eq!(ptr.ptr(), original);
        assert!(released().is_empty());
    }

    #[test]
    fn assignment_operator_releases_previous_resource() {
        let mut target = recorded(1_u32);
        let target_address = address_of(target.ptr().expect("just created"));

        target = recorded(2_u32);

        assert_eq!(released(), vec![target_address]);
        assert_eq!(*target, 2);
    }

    #[test]
    fn deref_gives_access() {
        let mut ptr = make(vec![1, 2]);

        ptr.push(3);

        assert_eq!(ptr.len(), 3);
        assert_eq!(*ptr, [1, 2, 3]);
    }

    #[test]
    fn deref_of_empty_panics() {
        let ptr = ExclusivePtr::<u32>::null();

        let result = catch_unwind(AssertUnwindSafe(|| *ptr));

        assert!(result.is_err());
    }

    #[test]
    fn deref_mut_of_empty_panics() {
        let mut ptr = ExclusivePtr::<u32>::null();

        let result = catch_unwind(AssertUnwindSafe(|| {
            *ptr = 5;
        }));

        assert!(result.is_err());
    }

    trait Shape {
        fn area(&self) -> u32;
    }

    struct Square {
        side: u32,
    }

    impl Shape for Square {
        fn area(&self) -> u32 {
            self.side.wrapping_mul(self.side)
        }
    }

    #[test]
    fn upcast_preserves_identity() {
        let mut concrete = recorded(Square { side: 3 });
        let address = address_of(concrete.ptr().expect("just created"));

        let general: ExclusivePtr<dyn Shape, Recording> = upcast!(concrete.take() => dyn Shape);

        assert!(concrete.is_null());
        assert_eq!(address_of(general.ptr().expect("not empty")), address);
        assert_eq!(general.area(), 9);

        drop(general);
        assert_eq!(released(), vec![address]);
    }

    #[test]
    fn upcast_of_empty_is_empty() {
        let concrete = ExclusivePtr::<Square>::null();

        let general: ExclusivePtr<dyn Shape> = upcast!(concrete => dyn Shape);

        assert!(general.is_null());
    }

    #[test]
    fn upcast_array_to_slice() {
        let fixed = make([1_u8, 2, 3]);

        let slice: ExclusivePtr<[u8]> = upcast!(fixed => [u8]);

        assert_eq!(slice.len(), 3);
        assert_eq!(*slice, [1, 2, 3]);
    }

    #[test]
    fn upcast_drops_concrete_type() {
        struct Tracked(Rc<Cell<bool>>);

        impl Drop for Tracked {
            fn drop(&mut self) {
                self.0.set(true);
            }
        }

        let dropped = Rc::new(Cell::new(false));
        let erased: ExclusivePtr<dyn Any> = upcast!(make(Tracked(Rc::clone(&dropped))) => dyn Any);

        assert!(erased.is::<Tracked>());
        assert!(!dropped.get());

        drop(erased);
        assert!(dropped.get());
    }

    #[test]
    fn cast_panic_keeps_original_owned() {
        let ptr = recorded(11_u32);
        let address = address_of(ptr.ptr().expect("just created"));

        let result = catch_unwind(AssertUnwindSafe(|| {
            // SAFETY: The conversion function never returns.
            let _cast: ExclusivePtr<dyn Display, Recording> =
                unsafe { ptr.cast_with(|_| -> *mut dyn Display { panic!("conversion failed") }) };
        }));

        assert!(result.is_err());
        assert_eq!(released(), vec![address]);
    }

    #[test]
    fn box_round_trip() {
        let ptr = ExclusivePtr::from(Box::new(String::from("boxed")));

        let boxed = ptr.into_box().expect("not empty");

        assert_eq!(*boxed, "boxed");
        assert!(ExclusivePtr::<u8>::null().into_box().is_none());
    }

    #[test]
    fn vec_converts_to_array() {
        let array = ExclusiveArray::from(vec![1, 2, 3]);

        assert_eq!(array.len(), 3);
        assert_eq!(array.into_boxed_slice().as_deref(), Some(&[1, 2, 3][..]));
    }

    #[test]
    fn init_fills_storage() {
        let storage = ExclusivePtr::from(Box::new(MaybeUninit::<String>::uninit()));

        let value = storage.init(String::from("ready"));

        assert_eq!(*value, "ready");
    }

    #[test]
    fn init_of_empty_panics() {
        let storage = ExclusivePtr::<MaybeUninit<u32>>::null();

        let result = catch_unwind(AssertUnwindSafe(|| storage.init(1)));

        assert!(result.is_err());
    }

    #[test]
    fn assume_init_of_empty_is_empty() {
        let storage = ExclusivePtr::<MaybeUninit<u32>>::null();

        // SAFETY: There is no storage to be uninitialized.
        let value = unsafe { storage.assume_init() };

        assert!(value.is_null());
    }

    #[test]
    fn init_with_fills_every_element() {
        let storage: ExclusiveArray<MaybeUninit<String>> =
            ExclusiveArray::from(vec![MaybeUninit::uninit(), MaybeUninit::uninit()]);

        let values = storage.init_with(|index| index.to_string());

        assert_eq!(*values, ["0".to_string(), "1".to_string()]);
    }

    #[test]
    fn debug_output_names_type() {
        let ptr = make(1_u8);

        let output = format!("{ptr:?}");

        assert!(output.contains("ExclusivePtr"));
        assert!(output.contains("u8"));
    }

    #[test]
    fn pointer_format_matches_handle() {
        let ptr = make(1_u8);
        let handle = ptr.ptr().expect("just created");

        assert_eq!(format!("{ptr:p}"), format!("{handle:p}"));
        assert_eq!(
            format!("{:p}", ExclusivePtr::<u8>::null()),
            format!("{:p}", ptr::null::<()>())
        );
    }

    #[test]
    fn size_matches_raw_pointer() {
        assert_eq!(mem::size_of::<ExclusivePtr<u8>>(), mem::size_of::<*mut u8>());
        assert_eq!(
            mem::size_of::<ExclusivePtr<u8, Recording>>(),
            mem::size_of::<*mut u8>()
        );
    }
}
