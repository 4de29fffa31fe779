use super::send_ptr::{SendPtr, Slot};

use log::trace;

// Pinning without a helper thread.
//
// Rust ownership already keeps the buffer at a fixed address while the guard
// holds it, so the slot is written and cleared on the calling thread.
pub(super) struct DirectPin<T> {
    slot: Slot,
    buf: Option<T>,
    pinned: bool,
}

impl<T> DirectPin<T> {
    // Safety: see `PtrGuard::new`.
    pub(super) unsafe fn new(slot: Slot, addr: SendPtr<libc::c_void>, buf: T) -> DirectPin<T> {
        slot.store(addr.get());
        trace!("pinned {:?} into slot {:?} (direct)", addr, slot);
        DirectPin {
            slot,
            buf: Some(buf),
            pinned: true,
        }
    }

    pub(super) fn release(&mut self) {
        if std::mem::take(&mut self.pinned) {
            // Safety: the slot stays valid until the guard is released.
            unsafe { self.slot.clear() };
        }
    }

    pub(super) fn take_buf(&mut self) -> Option<T> {
        self.buf.take()
    }
}
