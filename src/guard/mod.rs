//! Pin a buffer's address into a foreign memory slot.
//!
//! Foreign code cannot see Rust ownership. Once a buffer's address has been
//! written into memory owned by a C library, something has to keep the
//! buffer alive, and at the same address, until the library is done with it.
//! A [`PtrGuard`] takes ownership of the buffer, writes its address into the
//! slot, and guarantees that:
//!
//! * the slot holds the address before the constructor returns;
//! * the slot holds `NULL` before [`PtrGuard::release`] returns;
//! * the buffer is not dropped, or handed back, until the slot is `NULL`.
//!
//! With the default [`Pinning::Thread`] strategy the buffer is owned by a
//! dedicated, parked thread for the whole pin, and both steps are confirmed to
//! the caller through a rendezvous handshake.

mod builder;
pub use builder::{Builder, Pinning};

mod direct;
use direct::DirectPin;

mod pin_thread;
pub use pin_thread::live_pins;
use pin_thread::PinThread;

mod send_ptr;
use send_ptr::{SendPtr, Slot};

use crate::buf::{IoBuf, IoBufMut};
use crate::{Error, Result};

use log::debug;
use std::fmt;

/// A buffer whose address is stored in foreign memory.
///
/// The guard owns the buffer until it is released. Dropping the guard
/// releases it; [`PtrGuard::into_inner`] releases it and returns the buffer.
///
/// # Examples
///
/// ```
/// use ptr_guard::guard::PtrGuard;
/// use std::ptr;
///
/// let mut slot: *mut libc::c_void = ptr::null_mut();
/// let buf = b"pinned".to_vec();
/// let addr = buf.as_ptr();
///
/// let mut guard = unsafe { PtrGuard::new(&mut slot, buf) }.unwrap();
/// assert_eq!(unsafe { ptr::read_volatile(&slot) } as *const u8, addr);
///
/// guard.release();
/// assert!(unsafe { ptr::read_volatile(&slot) }.is_null());
/// ```
pub struct PtrGuard<T: IoBuf> {
    slot: Slot,
    addr: SendPtr<libc::c_void>,
    pin: Pin<T>,
    released: bool,
}

enum Pin<T> {
    Thread(PinThread<T>),
    Direct(DirectPin<T>),
}

impl<T: IoBuf> PtrGuard<T> {
    /// Write the address of `buf` into `slot` and keep it there until the
    /// guard is released.
    ///
    /// Blocks until the address has been written.
    ///
    /// # Errors
    ///
    /// Fails with [`Error::InvalidArgument`] if `slot` is null, and with
    /// [`Error::Allocation`] if the pinning thread cannot be started.
    ///
    /// # Safety
    ///
    /// `slot` must be valid for pointer-sized writes until the guard is
    /// released, and nothing else may write to it in the meantime.
    pub unsafe fn new(slot: *mut *mut libc::c_void, buf: T) -> Result<PtrGuard<T>> {
        Builder::new().guard(slot, buf)
    }

    /// Like [`PtrGuard::new`], but stores the address of the buffer's spare
    /// capacity (`stable_mut_ptr() + bytes_init()`), so that foreign code may
    /// write into it.
    ///
    /// # Safety
    ///
    /// Same as [`PtrGuard::new`].
    pub unsafe fn new_mut(slot: *mut *mut libc::c_void, buf: T) -> Result<PtrGuard<T>>
    where
        T: IoBufMut,
    {
        Builder::new().guard_mut(slot, buf)
    }

    pub(super) unsafe fn pin(
        builder: &Builder,
        slot: *mut *mut libc::c_void,
        addr: *mut libc::c_void,
        buf: T,
    ) -> Result<PtrGuard<T>> {
        if slot.is_null() {
            return Err(Error::invalid_arg("slot", "null foreign slot"));
        }

        let slot = Slot::new(slot);
        let addr = SendPtr::new(addr);
        let pin = match builder.pinning {
            Pinning::Thread => Pin::Thread(PinThread::spawn(builder, slot, addr, buf)?),
            Pinning::Direct => Pin::Direct(DirectPin::new(slot, addr, buf)),
        };

        Ok(PtrGuard {
            slot,
            addr,
            pin,
            released: false,
        })
    }

    /// Clear the slot back to `NULL`.
    ///
    /// Blocks until the slot has been cleared. Calling it again has no effect.
    pub fn release(&mut self) {
        if self.released {
            return;
        }
        self.released = true;

        match &mut self.pin {
            Pin::Thread(pin) => pin.release(),
            Pin::Direct(pin) => pin.release(),
        }
    }

    /// Returns `true` once the guard has been released.
    pub fn is_released(&self) -> bool {
        self.released
    }

    /// The address written into the slot.
    pub fn addr(&self) -> *const u8 {
        self.addr.get() as *const u8
    }

    /// The foreign slot the address was written into.
    pub fn slot(&self) -> *mut *mut libc::c_void {
        self.slot.get()
    }

    /// Release the guard and take the buffer back.
    ///
    /// # Errors
    ///
    /// Returns [`Error::PinLost`] if the pinning thread died without handing
    /// the buffer back.
    pub fn into_inner(mut self) -> Result<T> {
        self.release();
        let buf = match &mut self.pin {
            Pin::Thread(pin) => pin.take_buf(),
            Pin::Direct(pin) => pin.take_buf(),
        };
        buf.ok_or(Error::PinLost)
    }
}

impl<T: IoBuf> Drop for PtrGuard<T> {
    fn drop(&mut self) {
        if !self.released {
            debug!("releasing guard for slot {:?} on drop", self.slot);
            self.release();
        }
    }
}

impl<T: IoBuf> fmt::Debug for PtrGuard<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PtrGuard")
            .field("slot", &self.slot)
            .field("addr", &self.addr)
            .field("released", &self.released)
            .finish()
    }
}
