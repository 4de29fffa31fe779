use crate::buf::IoBufMut;
use crate::iovec::Iovec;
use crate::BufResult;

use log::trace;
use std::io;
use std::os::unix::io::RawFd;

use super::{check_args, merge_slots};

// Scatter-read into the spare capacity of `bufs` at `offset` with preadv(2).
pub(crate) fn readv_at<T: IoBufMut>(
    fd: RawFd,
    bufs: Vec<T>,
    offset: u64,
) -> BufResult<usize, Vec<T>> {
    let (iovcnt, offset) = match check_args(bufs.len(), offset) {
        Ok(args) => args,
        Err(e) => return (Err(e), bufs),
    };

    let mut iov = match Iovec::new(bufs.len()) {
        Ok(iov) => iov,
        Err(e) => return (Err(e.into()), bufs),
    };

    // Full buffers have nowhere to read into and keep a zeroed record.
    let mut skipped = Vec::new();
    let mut res: crate::Result<()> = Ok(());
    for (i, buf) in bufs.into_iter().enumerate() {
        if buf.bytes_total() == buf.bytes_init() || res.is_err() {
            skipped.push((i, buf));
            continue;
        }
        res = iov.set_mut(i, buf);
    }

    let res = match res {
        // Safety: `iov` holds `iovcnt` records, each pointing into the spare
        // capacity of a pinned buffer or zeroed.
        Ok(()) => match unsafe { libc::preadv(fd, iov.as_ptr(), iovcnt, offset) } {
            -1 => Err(io::Error::last_os_error()),
            n => Ok(n as usize),
        },
        Err(e) => Err(e.into()),
    };
    trace!("preadv(fd={}, iovcnt={}) = {:?}", fd, iovcnt, res);

    // The guards must be released before the buffers are touched again.
    let mut bufs = merge_slots(iov.into_slots(), skipped);

    // If the operation was successful, advance the initialized cursor.
    if let Ok(n) = res {
        let mut count = n;
        for b in bufs.iter_mut() {
            let sz = std::cmp::min(count, b.bytes_total() - b.bytes_init());
            let pos = b.bytes_init() + sz;
            // Safety: the kernel returns bytes read, and the buffers were
            // filled in order.
            unsafe { b.set_init(pos) };
            count -= sz;
            if count == 0 {
                break;
            }
        }
        debug_assert_eq!(count, 0);
    }

    (res, bufs)
}
