//! Vectored positional I/O through an [`Iovec`](crate::iovec::Iovec).

mod readv;
pub(crate) use readv::readv_at;

mod writev;
pub(crate) use writev::writev_at;

use std::io;

// Converts the arguments shared by preadv(2) and pwritev(2).
fn check_args(count: usize, offset: u64) -> io::Result<(libc::c_int, libc::off_t)> {
    let iovcnt = libc::c_int::try_from(count)
        .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "too many buffers"))?;
    let offset = libc::off_t::try_from(offset)
        .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "offset out of range"))?;
    Ok((iovcnt, offset))
}

// Puts the buffers that were left out of the iovec back at their positions.
//
// Records whose buffer was lost while pinning are dropped from the result.
fn merge_slots<T>(slots: Vec<Option<T>>, skipped: Vec<(usize, T)>) -> Vec<T> {
    let mut slots = slots;
    for (i, buf) in skipped {
        slots[i] = Some(buf);
    }
    slots.into_iter().flatten().collect()
}
