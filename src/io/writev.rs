use crate::buf::IoBuf;
use crate::iovec::Iovec;
use crate::BufResult;

use log::trace;
use std::io;
use std::os::unix::io::RawFd;

use super::{check_args, merge_slots};

// Gather-write `bufs` at `offset` with pwritev(2).
//
// Empty buffers are left out of the iovec; their records stay zeroed, which
// the kernel treats as zero-length entries.
pub(crate) fn writev_at<T: IoBuf>(fd: RawFd, bufs: Vec<T>, offset: u64) -> BufResult<usize, Vec<T>> {
    let (iovcnt, offset) = match check_args(bufs.len(), offset) {
        Ok(args) => args,
        Err(e) => return (Err(e), bufs),
    };

    let mut iov = match Iovec::new(bufs.len()) {
        Ok(iov) => iov,
        Err(e) => return (Err(e.into()), bufs),
    };

    let mut skipped = Vec::new();
    let mut res: crate::Result<()> = Ok(());
    for (i, buf) in bufs.into_iter().enumerate() {
        if buf.bytes_init() == 0 || res.is_err() {
            skipped.push((i, buf));
            continue;
        }
        res = iov.set(i, buf);
    }

    let res = match res {
        // Safety: `iov` holds `iovcnt` records, each pointing into a pinned
        // buffer or zeroed.
        Ok(()) => match unsafe { libc::pwritev(fd, iov.as_ptr(), iovcnt, offset) } {
            -1 => Err(io::Error::last_os_error()),
            n => Ok(n as usize),
        },
        Err(e) => Err(e.into()),
    };
    trace!("pwritev(fd={}, iovcnt={}) = {:?}", fd, iovcnt, res);

    (res, merge_slots(iov.into_slots(), skipped))
}
