// Kept in its own test binary: `live_pins` counts every pinning thread in the
// process, so nothing else in this binary may pin through a thread.

use ptr_guard::guard::{live_pins, Builder, Pinning, PtrGuard};
use ptr_guard::Iovec;

use std::ptr;

#[test]
fn sequential_guards_do_not_leak() {
    let mut slot: *mut libc::c_void = ptr::null_mut();
    let baseline = live_pins();

    for i in 0..10_000usize {
        let buf = i.to_le_bytes().to_vec();
        let addr = buf.as_ptr();

        let mut guard = unsafe { PtrGuard::new(&mut slot, buf) }.unwrap();
        assert_eq!(live_pins(), baseline + 1);
        assert_eq!(unsafe { ptr::read_volatile(&slot) } as *const u8, addr);

        guard.release();
        assert_eq!(live_pins(), baseline);
        assert!(unsafe { ptr::read_volatile(&slot) }.is_null());

        let buf = guard.into_inner().unwrap();
        assert_eq!(buf, i.to_le_bytes());
    }

    // Direct pinning never starts a thread.
    let builder = Builder::new().pinning(Pinning::Direct);
    let mut iov = builder.iovec(64).unwrap();
    for i in 0..64 {
        iov.set(i, vec![i as u8; 8]).unwrap();
    }
    assert_eq!(live_pins(), baseline);
    drop(iov);

    // Every populated record owns exactly one thread, until released.
    let mut iov = Iovec::new(16).unwrap();
    for i in 0..16 {
        iov.set(i, vec![0u8; i + 1]).unwrap();
    }
    assert_eq!(live_pins(), baseline + 16);
    iov.set(3, vec![1u8; 3]).unwrap();
    assert_eq!(live_pins(), baseline + 16);
    iov.release();
    assert_eq!(live_pins(), baseline);

    // A rejected empty buffer never gets a thread.
    let mut iov = Iovec::new(1).unwrap();
    assert!(iov.set(0, Vec::<u8>::new()).is_err());
    assert_eq!(live_pins(), baseline);
    assert_eq!(iov.guards().count(), 0);
    assert!(Iovec::from_bufs(vec![vec![1u8], Vec::new()]).is_err());
    assert_eq!(live_pins(), baseline);
}
