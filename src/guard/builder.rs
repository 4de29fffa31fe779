use super::PtrGuard;
use crate::buf::{IoBuf, IoBufMut};
use crate::iovec::Iovec;
use crate::Result;

/// How a guard keeps its buffer alive while the address sits in foreign
/// memory.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub enum Pinning {
    /// Move the buffer onto a dedicated thread that stays parked, owning it,
    /// until the guard is released. Writing and clearing the slot both happen
    /// on that thread and are confirmed to the owner synchronously.
    #[default]
    Thread,

    /// Keep the buffer inside the guard and write the slot directly.
    ///
    /// Same API and ordering guarantees as [`Pinning::Thread`], without the
    /// thread spawn.
    Direct,
}

/// Configure and create [`PtrGuard`]s and [`Iovec`]s.
///
/// # Examples
///
/// ```
/// use ptr_guard::guard::{Builder, Pinning};
///
/// let mut iov = Builder::new()
///     .pinning(Pinning::Thread)
///     .thread_name("iov-pin")
///     .iovec(2)
///     .unwrap();
///
/// iov.set(0, b"hello ".to_vec()).unwrap();
/// iov.set(1, b"world".to_vec()).unwrap();
/// assert_eq!(iov.iovecs()[1].iov_len, 5);
/// iov.release();
/// ```
#[derive(Debug, Clone)]
pub struct Builder {
    pub(super) pinning: Pinning,
    pub(super) thread_name: Option<String>,
    pub(super) stack_size: usize,
}

impl Builder {
    /// Create a new builder with default settings: thread pinning, unnamed
    /// threads with a 64 KiB stack.
    pub fn new() -> Builder {
        Builder {
            pinning: Pinning::Thread,
            thread_name: None,
            // The pinning thread only ever blocks on a channel.
            stack_size: 64 * 1024,
        }
    }

    /// Select the pinning strategy. Defaults to [`Pinning::Thread`].
    pub fn pinning(mut self, pinning: Pinning) -> Builder {
        self.pinning = pinning;
        self
    }

    /// Name given to every pinning thread, useful when inspecting a process
    /// with many outstanding pins.
    ///
    /// A name containing a NUL byte makes guard creation fail with
    /// [`Error::InvalidArgument`](crate::Error::InvalidArgument).
    pub fn thread_name(mut self, name: impl Into<String>) -> Builder {
        self.thread_name = Some(name.into());
        self
    }

    /// Stack size of the pinning threads. The platform may round it up to its
    /// minimum.
    pub fn stack_size(mut self, stack_size: usize) -> Builder {
        self.stack_size = stack_size;
        self
    }

    /// Pin `buf` into `slot` using this configuration.
    ///
    /// # Safety
    ///
    /// See [`PtrGuard::new`].
    pub unsafe fn guard<T: IoBuf>(&self, slot: *mut *mut libc::c_void, buf: T) -> Result<PtrGuard<T>> {
        let addr = buf.stable_ptr() as *mut libc::c_void;
        PtrGuard::pin(self, slot, addr, buf)
    }

    /// Pin the spare capacity of `buf` into `slot` using this configuration.
    ///
    /// # Safety
    ///
    /// See [`PtrGuard::new_mut`].
    pub unsafe fn guard_mut<T: IoBufMut>(
        &self,
        slot: *mut *mut libc::c_void,
        mut buf: T,
    ) -> Result<PtrGuard<T>> {
        let init = buf.bytes_init();
        let addr = buf.stable_mut_ptr().wrapping_add(init) as *mut libc::c_void;
        PtrGuard::pin(self, slot, addr, buf)
    }

    /// Allocate an [`Iovec`] of `capacity` entries whose guards use this
    /// configuration.
    pub fn iovec<T: IoBuf>(&self, capacity: usize) -> Result<Iovec<T>> {
        Iovec::with_builder(self.clone(), capacity)
    }
}

impl Default for Builder {
    fn default() -> Builder {
        Builder::new()
    }
}
