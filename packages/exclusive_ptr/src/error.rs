use std::alloc::Layout;
use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur when acquiring a resource to place under exclusive ownership.
///
/// Operations on an existing [`ExclusivePtr`][crate::ExclusivePtr] never fail; only the
/// construction helpers that allocate memory or open a handle can.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// The global allocator could not provide memory for the requested layout.
    #[error("failed to allocate {} bytes aligned to {}", .layout.size(), .layout.align())]
    AllocationFailed {
        /// The layout of the allocation that was attempted.
        layout: Layout,
    },

    /// The path cannot be passed to the C runtime because it is not valid UTF-8
    /// or contains an interior NUL byte.
    #[error("path '{}' cannot be passed to the C runtime", .path.display())]
    InvalidPath {
        /// The path that was rejected.
        path: PathBuf,
    },

    /// The mode string cannot be passed to the C runtime because it contains a NUL byte.
    #[error("invalid file mode '{mode}'")]
    InvalidMode {
        /// The mode that was rejected.
        mode: String,
    },

    /// The C runtime refused to open the file.
    #[error("failed to open '{}' with mode '{mode}'", .path.display())]
    Open {
        /// The path that could not be opened.
        path: PathBuf,

        /// The mode the file was opened with.
        mode: String,

        /// The operating system error reported by the C runtime.
        #[source]
        source: io::Error,
    },
}

/// A specialized `Result` type for resource acquisition, returning the crate's
/// [`Error`] type as the error value.
pub type Result<T> = std::result::Result<T, Error>;
