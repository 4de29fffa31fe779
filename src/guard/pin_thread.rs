use super::send_ptr::{SendPtr, Slot};
use super::Builder;
use crate::buf::IoBuf;
use crate::{Error, Result};

use log::{error, trace};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc::{sync_channel, Receiver, SyncSender};
use std::thread::{self, JoinHandle};

static LIVE: AtomicUsize = AtomicUsize::new(0);

/// Number of pinning threads currently alive in this process.
pub fn live_pins() -> usize {
    LIVE.load(Ordering::Acquire)
}

// Counts the pinning thread as live for as long as its closure runs,
// unwinding included.
struct Live;

impl Live {
    fn enter() -> Live {
        LIVE.fetch_add(1, Ordering::AcqRel);
        Live
    }
}

impl Drop for Live {
    fn drop(&mut self) {
        LIVE.fetch_sub(1, Ordering::AcqRel);
    }
}

// A dedicated thread that owns the buffer while its address sits in foreign
// memory.
//
// Both channels have zero capacity, so every message is a rendezvous:
//
//   owner                         pinning thread
//   spawn ───────────────────────▶ *slot = addr
//   stored.recv() ◀──────────────  stored.send()
//                                  release.recv()   (parked, owns buffer)
//   release.send() ──────────────▶
//   stored.recv() ◀──────────────  *slot = NULL; stored.send()
//   join() ◀─────────────────────  return buffer
pub(super) struct PinThread<T> {
    release: SyncSender<()>,
    stored: Receiver<()>,
    handle: Option<JoinHandle<T>>,
    // Handed back by the thread once released.
    buf: Option<T>,
}

impl<T: IoBuf> PinThread<T> {
    pub(super) fn spawn(
        builder: &Builder,
        slot: Slot,
        addr: SendPtr<libc::c_void>,
        buf: T,
    ) -> Result<PinThread<T>> {
        // std panics on these instead of returning an error from `spawn`.
        if let Some(name) = &builder.thread_name {
            if name.contains('\0') {
                return Err(Error::invalid_arg(
                    "thread_name",
                    "thread name may not contain NUL bytes",
                ));
            }
        }

        let (stored_tx, stored_rx) = sync_channel::<()>(0);
        let (release_tx, release_rx) = sync_channel::<()>(0);

        let mut thread = thread::Builder::new().stack_size(builder.stack_size);
        if let Some(name) = &builder.thread_name {
            thread = thread.name(name.clone());
        }

        let handle = thread
            .spawn(move || {
                let _live = Live::enter();
                // The buffer lives on this stack until the slot is cleared.
                let buf = buf;

                unsafe { slot.store(addr.get()) };
                if stored_tx.send(()).is_ok() {
                    // A disconnected sender also means release: the owner is
                    // gone and nobody can observe the slot through it anymore.
                    let _ = release_rx.recv();
                }
                unsafe { slot.clear() };
                let _ = stored_tx.send(());
                buf
            })
            .map_err(Error::spawn)?;

        // Block until the thread confirms the slot holds the address.
        if stored_rx.recv().is_err() {
            if let Err(panic) = handle.join() {
                error!("pinning thread panicked before storing: {:?}", panic);
            }
            return Err(Error::PinLost);
        }

        trace!("pinned {:?} into slot {:?}", addr, slot);
        Ok(PinThread {
            release: release_tx,
            stored: stored_rx,
            handle: Some(handle),
            buf: None,
        })
    }

    pub(super) fn release(&mut self) {
        let Some(handle) = self.handle.take() else {
            return;
        };

        // Unpark the thread, then wait for it to confirm the slot is NULL.
        let _ = self.release.send(());
        let _ = self.stored.recv();

        match handle.join() {
            Ok(buf) => self.buf = Some(buf),
            Err(panic) => error!("pinning thread panicked during release: {:?}", panic),
        }
    }

    pub(super) fn take_buf(&mut self) -> Option<T> {
        self.buf.take()
    }
}
