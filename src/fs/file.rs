use crate::buf::{IoBuf, IoBufMut};
use crate::BufResult;

use std::fs;
use std::io;
use std::panic;
use std::os::unix::io::{AsRawFd, RawFd};
use std::path::Path;
use std::sync::Arc;

/// A reference to an open file on the filesystem, supporting vectored
/// positional I/O through pinned [`Iovec`](crate::iovec::Iovec)s.
///
/// Buffers are passed by ownership and returned once the call completes,
/// whether it succeeded or not.
///
/// # Examples
///
/// ```no_run
/// use ptr_guard::fs::File;
///
/// fn main() -> std::io::Result<()> {
///     let file = File::create("hello.txt")?;
///     let (res, _bufs) = file.writev_at(vec![b"hello ".to_vec(), b"world".to_vec()], 0);
///     assert_eq!(res?, 11);
///     file.sync_all()
/// }
/// ```
#[derive(Clone)]
pub struct File {
    /// Shared with the blocking pool while an async call is in flight.
    inner: Arc<fs::File>,
}

impl File {
    /// Attempts to open a file in read-only mode.
    pub fn open(path: impl AsRef<Path>) -> io::Result<File> {
        fs::File::open(path).map(File::from_std)
    }

    /// Opens a file in write-only mode, creating or truncating it.
    pub fn create(path: impl AsRef<Path>) -> io::Result<File> {
        fs::File::create(path).map(File::from_std)
    }

    /// Wrap an already open standard library file.
    pub fn from_std(file: fs::File) -> File {
        File {
            inner: Arc::new(file),
        }
    }

    /// Read into the spare capacity of `bufs`, in order, starting at `pos`.
    ///
    /// Each buffer's initialized length is advanced by the number of bytes
    /// read into it. Buffers without spare capacity are skipped.
    pub fn readv_at<T: IoBufMut>(&self, bufs: Vec<T>, pos: u64) -> BufResult<usize, Vec<T>> {
        crate::io::readv_at(self.as_raw_fd(), bufs, pos)
    }

    /// Write the initialized bytes of `bufs`, in order, starting at `pos`.
    pub fn writev_at<T: IoBuf>(&self, bufs: Vec<T>, pos: u64) -> BufResult<usize, Vec<T>> {
        crate::io::writev_at(self.as_raw_fd(), bufs, pos)
    }

    /// Like [`File::readv_at`], run on Tokio's blocking pool.
    ///
    /// Must be called from within a Tokio runtime.
    pub async fn readv_at_async<T: IoBufMut>(&self, bufs: Vec<T>, pos: u64) -> BufResult<usize, Vec<T>> {
        let file = self.clone();
        match tokio::task::spawn_blocking(move || file.readv_at(bufs, pos)).await {
            Ok(res) => res,
            Err(e) => panic::resume_unwind(e.into_panic()),
        }
    }

    /// Like [`File::writev_at`], run on Tokio's blocking pool.
    ///
    /// Must be called from within a Tokio runtime.
    pub async fn writev_at_async<T: IoBuf>(&self, bufs: Vec<T>, pos: u64) -> BufResult<usize, Vec<T>> {
        let file = self.clone();
        match tokio::task::spawn_blocking(move || file.writev_at(bufs, pos)).await {
            Ok(res) => res,
            Err(e) => panic::resume_unwind(e.into_panic()),
        }
    }

    /// Attempts to sync all OS-internal metadata to disk.
    pub fn sync_all(&self) -> io::Result<()> {
        self.inner.sync_all()
    }
}

impl AsRawFd for File {
    fn as_raw_fd(&self) -> RawFd {
        self.inner.as_raw_fd()
    }
}

impl std::fmt::Debug for File {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("File").field("fd", &self.as_raw_fd()).finish()
    }
}
