use std::fmt;

// A raw pointer that may be moved to the pinning thread.
//
// Every dereference happens on exactly one side of a handshake step, so the
// two threads never touch the pointee concurrently.
pub(crate) struct SendPtr<T>(*mut T);

unsafe impl<T> Send for SendPtr<T> {}

impl<T> SendPtr<T> {
    pub(crate) fn new(ptr: *mut T) -> SendPtr<T> {
        SendPtr(ptr)
    }

    pub(crate) fn get(&self) -> *mut T {
        self.0
    }
}

impl<T> Clone for SendPtr<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for SendPtr<T> {}

impl<T> fmt::Debug for SendPtr<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Pointer::fmt(&self.0, f)
    }
}

/// A foreign pointer-sized cell a guard writes into.
pub(crate) type Slot = SendPtr<*mut libc::c_void>;

impl Slot {
    // Safety: the slot must be valid for writes and not written by anyone
    // else while the guard is live.
    pub(crate) unsafe fn store(self, addr: *mut libc::c_void) {
        self.0.write(addr);
    }

    pub(crate) unsafe fn clear(self) {
        self.0.write(std::ptr::null_mut());
    }
}
