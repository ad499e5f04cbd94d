#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

//! An exclusive-ownership pointer whose release behavior is chosen at compile time.
//!
//! [`ExclusivePtr<T, D>`] holds at most one raw handle to a resource and guarantees that the
//! resource is released exactly once, through the [`Deleter`] policy `D`, when the pointer goes
//! out of scope. Ownership moves only through explicit moves and can never be duplicated:
//! the type implements neither [`Clone`] nor [`Copy`].
//!
//! # Release policies
//!
//! A [`Deleter`] is a stateless type that knows how to destroy one shape of resource:
//!
//! * [`DefaultDeleter`] - a single heap object (or trait object) allocated as a [`Box`].
//! * [`ArrayDeleter`] - a whole heap array, addressed by a slice pointer that carries its length.
//! * [`FileCloser`] - a C stdio stream, closed with `fclose` instead of freed.
//!
//! The policy is a type parameter, so selecting it has no runtime cost and adds no storage:
//! an [`ExclusivePtr`] is exactly the size of the raw pointer it wraps.
//!
//! # Example
//!
//! ```
//! use exclusive_ptr::{ExclusivePtr, make};
//!
//! let mut first = make(42_u32);
//! assert_eq!(*first, 42);
//!
//! // Moving out of a borrowed location leaves the source empty.
//! let second = first.take();
//! assert!(first.is_null());
//! assert_eq!(*second, 42);
//!
//! // `release()` hands the raw handle back without destroying the value.
//! let mut third = second;
//! let raw = third.release().unwrap();
//! assert!(third.is_null());
//!
//! // SAFETY: The handle came from an ExclusivePtr with the same policy and nothing else owns it.
//! let restored: ExclusivePtr<u32> = unsafe { ExclusivePtr::from_raw(raw) };
//! assert_eq!(*restored, 42);
//! ```
//!
//! Up-conversion to a more general type goes through [`upcast!`]:
//!
//! ```
//! use std::fmt::Display;
//!
//! use exclusive_ptr::{ExclusivePtr, make, upcast};
//!
//! let concrete = make(7_i64);
//! let general: ExclusivePtr<dyn Display> = upcast!(concrete => dyn Display);
//!
//! assert_eq!(general.to_string(), "7");
//! ```
//!
//! Duplicating ownership is rejected at compile time:
//!
//! ```compile_fail
//! use exclusive_ptr::{ExclusivePtr, make};
//!
//! let original = make(1_u8);
//! let duplicate = ExclusivePtr::clone(&original);
//! ```

mod deleter;
mod error;
mod exchange;
mod file;
mod make;
mod ptr;

pub use deleter::*;
pub use error::*;
pub use exchange::*;
pub use file::*;
pub use make::*;
pub use ptr::*;

/// Converts an [`ExclusivePtr`] into an [`ExclusivePtr`] to a more general type.
///
/// The conversion is an unsizing coercion of the owned handle: a concrete type to a trait object
/// it implements, an array to a slice, or a trait object to one of its supertraits. The source
/// pointer is consumed and the resource keeps its address and lifetime, so it is still released
/// exactly once, now through the policy of the target type.
///
/// Conversions that would change the addressed allocation (such as `Deref`-based ones) are not
/// accepted by this macro and fail to compile.
///
/// # Example
///
/// ```
/// use std::any::Any;
///
/// use exclusive_ptr::{ExclusivePtr, make, upcast};
///
/// let specific = make(String::from("hello"));
/// let erased: ExclusivePtr<dyn Any> = upcast!(specific => dyn Any);
///
/// assert_eq!(erased.downcast_ref::<String>().map(String::as_str), Some("hello"));
/// ```
#[macro_export]
macro_rules! upcast {
    ($ptr:expr => $target:ty) => {{
        let source = $ptr;

        // SAFETY: The conversion function is an unsizing coercion of the raw pointer, which keeps
        // the address and the underlying allocation of the resource.
        unsafe { $crate::ExclusivePtr::cast_with(source, |raw| -> *mut $target { raw }) }
    }};
}
