use std::error;
use std::ffi::CString;
use std::fmt;
use std::io;
use std::marker::{PhantomData, PhantomPinned};
use std::path::Path;
use std::ptr::{self, NonNull};

use crate::{Deleter, Error, ExclusivePtr, Result};

/// An open C stdio stream under exclusive ownership, closed with `fclose` when dropped.
///
/// Byte I/O goes through [`io()`](ExclusivePtr::io), and the stream can be passed to C code
/// through [`as_raw_stream()`](ExclusivePtr::as_raw_stream).
pub type ExclusiveFile = ExclusivePtr<CStream, FileCloser>;

/// The opaque C `FILE` object behind a stdio stream.
///
/// This type is never constructed in Rust; it only exists behind pointers. A stream must only
/// ever be owned as an [`ExclusiveFile`], whose [`FileCloser`] policy closes it with `fclose`.
/// Any other policy, including the default one, would try to free the stream as a heap
/// allocation, so [`ExclusivePtr::from_raw`] must never be used to create an
/// `ExclusivePtr<CStream>`. Use [`open_file()`] instead.
///
/// # Example
///
/// ```
/// use exclusive_ptr::{ExclusiveFile, open_file};
///
/// let dir = tempfile::tempdir().unwrap();
///
/// let file: ExclusiveFile = open_file(dir.path().join("owned.txt"), "w").unwrap();
/// assert!(!file.as_raw_stream().is_null());
/// ```
#[repr(C)]
pub struct CStream {
    _opaque: [u8; 0],
    _pinned: PhantomData<PhantomPinned>,
}

impl fmt::Debug for CStream {
    #[cfg_attr(test, mutants::skip)] // Debug output is not part of the API contract.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CStream").finish_non_exhaustive()
    }
}

/// Releases a C stdio stream by closing it with `fclose`, instead of freeing memory.
///
/// A destructor cannot report errors, so if closing fails (for example because buffered data
/// could not be flushed), the failure is logged as a warning and the stream is gone either way.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
#[expect(
    clippy::exhaustive_structs,
    reason = "stateless tag type; it will never have fields"
)]
pub struct FileCloser;

impl Deleter<CStream> for FileCloser {
    unsafe fn delete(ptr: NonNull<CStream>) {
        let stream = ptr.as_ptr().cast::<libc::FILE>();

        // SAFETY: Forwarding the caller's guarantee that the stream came from fopen()
        // and is closed only here.
        let status = unsafe { libc::fclose(stream) };

        if status == 0 {
            log::trace!("closed C stream {stream:p}");
        } else {
            log::warn!(
                "closing C stream {stream:p} failed: {}",
                io::Error::last_os_error()
            );
        }
    }
}

/// Opens `path` with the C `fopen` mode string `mode` and returns the stream under
/// exclusive ownership.
///
/// The stream is wrapped as soon as `fopen` returns it, so there is no point at which an open
/// stream exists without an owner that closes it.
///
/// # Errors
///
/// * [`Error::InvalidPath`] if the path contains a NUL byte or, on targets other than Unix,
///   is not valid UTF-8.
/// * [`Error::InvalidMode`] if the mode contains a NUL byte.
/// * [`Error::Open`] if the C runtime fails to open the file.
///
/// # Example
///
/// ```
/// use std::io::{Read, Write};
///
/// use exclusive_ptr::open_file;
///
/// let dir = tempfile::tempdir().unwrap();
/// let path = dir.path().join("greeting.txt");
///
/// let mut file = open_file(&path, "w").unwrap();
/// file.io().write_all(b"hello").unwrap();
/// drop(file);
///
/// let mut file = open_file(&path, "r").unwrap();
/// let mut contents = String::new();
/// file.io().read_to_string(&mut contents).unwrap();
///
/// assert_eq!(contents, "hello");
/// ```
pub fn open_file(path: impl AsRef<Path>, mode: &str) -> Result<ExclusiveFile> {
    let path = path.as_ref();

    let Some(c_path) = path_to_c_string(path) else {
        return Err(Error::InvalidPath {
            path: path.to_path_buf(),
        });
    };

    let Ok(c_mode) = CString::new(mode) else {
        return Err(Error::InvalidMode {
            mode: mode.to_owned(),
        });
    };

    // SAFETY: Both arguments are valid NUL-terminated strings that outlive the call.
    let stream = unsafe { libc::fopen(c_path.as_ptr(), c_mode.as_ptr()) };

    let Some(stream) = NonNull::new(stream.cast::<CStream>()) else {
        return Err(Error::Open {
            path: path.to_path_buf(),
            mode: mode.to_owned(),
            source: io::Error::last_os_error(),
        });
    };

    log::trace!("opened C stream {stream:p} for '{}' with mode '{mode}'", path.display());

    // SAFETY: The stream was just returned by fopen(), which is what FileCloser closes,
    // and nothing else has seen it.
    Ok(unsafe { ExclusivePtr::from_raw(stream) })
}

#[cfg(unix)]
fn path_to_c_string(path: &Path) -> Option<CString> {
    use std::os::unix::ffi::OsStrExt;

    CString::new(path.as_os_str().as_bytes()).ok()
}

#[cfg(not(unix))]
fn path_to_c_string(path: &Path) -> Option<CString> {
    path.to_str().and_then(|path| CString::new(path).ok())
}

impl ExclusivePtr<CStream, FileCloser> {
    /// Returns the C `FILE` pointer for passing to C code, or a null pointer if nothing is owned.
    ///
    /// Ownership is not affected; the C code must not close the stream.
    #[must_use]
    #[inline]
    pub fn as_raw_stream(&self) -> *mut libc::FILE {
        self.ptr()
            .map_or(ptr::null_mut(), |stream| stream.as_ptr().cast::<libc::FILE>())
    }

    /// Borrows the stream for byte I/O through [`io::Read`], [`io::Write`] and [`io::Seek`].
    ///
    /// I/O on an empty file fails with [`io::ErrorKind::NotConnected`].
    #[must_use]
    #[inline]
    pub fn io(&mut self) -> FileIo<'_> {
        FileIo {
            file: self,
            direction: Direction::Idle,
        }
    }

    fn open_stream(&self) -> io::Result<*mut libc::FILE> {
        if self.is_null() {
            return Err(io::Error::new(
                io::ErrorKind::NotConnected,
                "the ExclusiveFile does not own a stream",
            ));
        }

        Ok(self.as_raw_stream())
    }
}

/// The direction of the last transfer on a stream opened for update.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum Direction {
    Idle,
    Reading,
    Writing,
}

/// Byte I/O on an [`ExclusiveFile`], obtained from [`io()`](ExclusivePtr::io).
///
/// The C runtime does not allow output to be followed directly by input (or input by output)
/// on a stream opened for update. `FileIo` remembers the direction of the last transfer and
/// flushes or repositions the stream before switching. When it is dropped, the stream is left
/// in the same neutral state, with pending output flushed.
///
/// # Example
///
/// ```
/// use std::io::{Read, Seek, SeekFrom, Write};
///
/// use exclusive_ptr::open_file;
///
/// let dir = tempfile::tempdir().unwrap();
/// let mut file = open_file(dir.path().join("scratch.txt"), "w+").unwrap();
///
/// let mut io = file.io();
/// io.write_all(b"round trip").unwrap();
/// io.seek(SeekFrom::Start(0)).unwrap();
///
/// let mut contents = String::new();
/// io.read_to_string(&mut contents).unwrap();
/// assert_eq!(contents, "round trip");
/// ```
#[derive(Debug)]
pub struct FileIo<'a> {
    file: &'a mut ExclusiveFile,
    direction: Direction,
}

impl FileIo<'_> {
    /// Returns the stream, ready for a transfer in the `next` direction.
    fn stream_for(&self, next: Direction) -> io::Result<*mut libc::FILE> {
        let stream = self.file.open_stream()?;

        match (self.direction, next) {
            (Direction::Writing, Direction::Reading) => flush_stream(stream)?,
            (Direction::Reading, Direction::Writing) => reposition(stream, 0, libc::SEEK_CUR)?,
            _ => {}
        }

        Ok(stream)
    }
}

impl io::Read for FileIo<'_> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let stream = self.stream_for(Direction::Reading)?;

        // SAFETY: The stream is open because we own it, and `buf` is valid for
        // writes of `buf.len()` bytes.
        let read = unsafe { libc::fread(buf.as_mut_ptr().cast(), 1, buf.len(), stream) };

        if read > 0 {
            self.direction = Direction::Reading;
            return Ok(read);
        }

        // A short read is either end of file or an error. Bytes already transferred are always
        // returned first, so only an empty read can report the error.

        // SAFETY: The stream is open because we own it.
        let failed = unsafe { libc::ferror(stream) } != 0;

        if failed && !buf.is_empty() {
            return Err(take_stream_error(stream));
        }

        Ok(0)
    }
}

impl io::Write for FileIo<'_> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let stream = self.stream_for(Direction::Writing)?;

        // SAFETY: The stream is open because we own it, and `buf` is valid for
        // reads of `buf.len()` bytes.
        let written = unsafe { libc::fwrite(buf.as_ptr().cast(), 1, buf.len(), stream) };

        if written == 0 && !buf.is_empty() {
            return Err(take_stream_error(stream));
        }

        if written > 0 {
            self.direction = Direction::Writing;
        }

        Ok(written)
    }

    fn flush(&mut self) -> io::Result<()> {
        let stream = self.file.open_stream()?;

        // Flushing an input stream is undefined, and only our own output can be pending.
        if self.direction == Direction::Writing {
            flush_stream(stream)?;
            self.direction = Direction::Idle;
        }

        Ok(())
    }
}

impl io::Seek for FileIo<'_> {
    fn seek(&mut self, pos: io::SeekFrom) -> io::Result<u64> {
        let stream = self.file.open_stream()?;

        let (offset, whence) = match pos {
            io::SeekFrom::Start(offset) => (
                libc::c_long::try_from(offset).map_err(invalid_offset)?,
                libc::SEEK_SET,
            ),
            io::SeekFrom::Current(offset) => (
                libc::c_long::try_from(offset).map_err(invalid_offset)?,
                libc::SEEK_CUR,
            ),
            io::SeekFrom::End(offset) => (
                libc::c_long::try_from(offset).map_err(invalid_offset)?,
                libc::SEEK_END,
            ),
        };

        reposition(stream, offset, whence)?;
        self.direction = Direction::Idle;

        // SAFETY: The stream is open because we own it.
        let position = unsafe { libc::ftell(stream) };

        u64::try_from(position).map_err(|_negative| io::Error::last_os_error())
    }
}

impl Drop for FileIo<'_> {
    fn drop(&mut self) {
        let Ok(stream) = self.file.open_stream() else {
            return;
        };

        let result = match self.direction {
            Direction::Idle => Ok(()),
            Direction::Reading => reposition(stream, 0, libc::SEEK_CUR),
            Direction::Writing => flush_stream(stream),
        };

        if let Err(error) = result {
            log::trace!("C stream {stream:p} was not returned to a neutral state: {error}");
        }
    }
}

fn flush_stream(stream: *mut libc::FILE) -> io::Result<()> {
    // SAFETY: Only called with streams owned by a live ExclusiveFile.
    let status = unsafe { libc::fflush(stream) };

    if status == 0 {
        Ok(())
    } else {
        Err(take_stream_error(stream))
    }
}

fn reposition(
    stream: *mut libc::FILE,
    offset: libc::c_long,
    whence: libc::c_int,
) -> io::Result<()> {
    // SAFETY: Only called with streams owned by a live ExclusiveFile.
    let status = unsafe { libc::fseek(stream, offset, whence) };

    if status == 0 {
        Ok(())
    } else {
        Err(take_stream_error(stream))
    }
}

/// Captures the OS error of a failed stream operation and clears the stream's error indicator,
/// so that later transfers are not reported as failed because of this one.
fn take_stream_error(stream: *mut libc::FILE) -> io::Error {
    let error = io::Error::last_os_error();

    // SAFETY: Only called with streams owned by a live ExclusiveFile.
    unsafe { libc::clearerr(stream) };

    error
}

fn invalid_offset<E>(error: E) -> io::Error
where
    E: Into<Box<dyn error::Error + Send + Sync>>,
{
    io::Error::new(io::ErrorKind::InvalidInput, error)
}
