use crate::buf::{IoBuf, IoBufMut};
use crate::guard::{Builder, PtrGuard};
use crate::{Error, Result};

use libc::iovec;
use log::debug;
use std::fmt;
use std::mem;
use std::ptr;
use std::slice;

/// An array of `struct iovec` records in foreign (`malloc`ed) memory, each
/// populated entry pointing into a buffer pinned by a [`PtrGuard`].
///
/// The array is what scatter/gather calls such as `preadv(2)` and
/// `pwritev(2)` take. Entries that were never populated stay zeroed.
///
/// Releasing the iovec first releases every guard, which clears the
/// `iov_base` fields, and only then frees the array.
///
/// # Examples
///
/// ```
/// use ptr_guard::iovec::Iovec;
///
/// let mut iov = Iovec::new(3).unwrap();
/// iov.set(0, vec![0u8; 10]).unwrap();
/// iov.set(1, vec![0u8; 64]).unwrap();
/// iov.set(2, vec![0u8; 15]).unwrap();
///
/// let lens: Vec<usize> = iov.iovecs().iter().map(|v| v.iov_len).collect();
/// assert_eq!(lens, [10, 64, 15]);
///
/// let bufs = iov.into_bufs();
/// assert_eq!(bufs.len(), 3);
/// ```
pub struct Iovec<T: IoBuf> {
    // Array of `length` records; `None` when empty or freed.
    cvec: Option<ptr::NonNull<iovec>>,
    length: usize,
    // One entry per record. Indices correspond to the indices in `cvec`.
    guards: Vec<Option<PtrGuard<T>>>,
    builder: Builder,
    released: bool,
}

// Safety: the array is exclusively owned by the Iovec, and every other field
// is Send.
unsafe impl<T: IoBuf> Send for Iovec<T> {}

impl<T: IoBuf> Iovec<T> {
    /// Allocate a zeroed array of `capacity` records.
    ///
    /// # Errors
    ///
    /// [`Error::Allocation`] if the array cannot be allocated. A zero
    /// capacity allocates nothing and [`Iovec::as_ptr`] returns null.
    pub fn new(capacity: usize) -> Result<Iovec<T>> {
        Iovec::with_builder(Builder::new(), capacity)
    }

    pub(crate) fn with_builder(builder: Builder, capacity: usize) -> Result<Iovec<T>> {
        let mut guards = Vec::new();
        guards
            .try_reserve_exact(capacity)
            .map_err(|_| Error::allocation("iovec guard table"))?;
        guards.resize_with(capacity, || None);

        let cvec = if capacity == 0 {
            None
        } else {
            let size = capacity
                .checked_mul(mem::size_of::<iovec>())
                .ok_or_else(|| Error::allocation("iovec array"))?;
            // Safety: calloc checks the multiplication itself.
            let raw = unsafe { libc::calloc(capacity, mem::size_of::<iovec>()) };
            let cvec = ptr::NonNull::new(raw as *mut iovec)
                .ok_or_else(|| Error::allocation("iovec array"))?;
            debug!("allocated iovec array {:p} ({} bytes)", cvec, size);
            Some(cvec)
        };

        Ok(Iovec {
            cvec,
            length: capacity,
            guards,
            builder,
            released: false,
        })
    }

    /// Build an iovec mapping every buffer, in order.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidArgument`] if any buffer is empty. Buffers pinned
    /// before the failing one are released and dropped.
    pub fn from_bufs(bufs: Vec<T>) -> Result<Iovec<T>> {
        let mut iov = Iovec::new(bufs.len())?;
        for (i, buf) in bufs.into_iter().enumerate() {
            iov.set(i, buf)?;
        }
        Ok(iov)
    }

    /// Map the initialized bytes of `buf` into the record at `index`.
    ///
    /// The record's `iov_base` is pinned by a new guard, `iov_len` is set to
    /// `buf.bytes_init()`. A buffer already mapped at `index` is released and
    /// dropped first.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidArgument`] if `index` is out of range, the buffer is
    /// empty, or the iovec has been released; no guard is created in that
    /// case. Otherwise whatever [`PtrGuard::new`] fails with.
    pub fn set(&mut self, index: usize, buf: T) -> Result<()> {
        let len = buf.bytes_init();
        let entry = self.entry(index, len)?;

        // Safety: `entry` points into the array, which outlives the guard:
        // `release` releases guards before freeing it.
        let guard = unsafe { self.builder.guard(ptr::addr_of_mut!((*entry).iov_base), buf)? };
        self.install(entry, index, len, guard);
        Ok(())
    }

    /// Map the spare capacity of `buf` into the record at `index`, for
    /// foreign code to write into.
    ///
    /// `iov_base` is `stable_mut_ptr() + bytes_init()`, `iov_len` is
    /// `bytes_total() - bytes_init()`.
    ///
    /// # Errors
    ///
    /// Same as [`Iovec::set`], an empty spare capacity counting as an empty
    /// buffer.
    pub fn set_mut(&mut self, index: usize, buf: T) -> Result<()>
    where
        T: IoBufMut,
    {
        let len = buf.bytes_total() - buf.bytes_init();
        let entry = self.entry(index, len)?;

        // Safety: as in `set`.
        let guard = unsafe {
            self.builder
                .guard_mut(ptr::addr_of_mut!((*entry).iov_base), buf)?
        };
        self.install(entry, index, len, guard);
        Ok(())
    }

    // Validates a population request and clears the previous mapping.
    fn entry(&mut self, index: usize, len: usize) -> Result<*mut iovec> {
        if self.released {
            return Err(Error::invalid_arg("iovec", "already released"));
        }
        if index >= self.length {
            return Err(Error::invalid_arg(
                "index",
                format!("{} out of range for iovec of length {}", index, self.length),
            ));
        }
        if len == 0 {
            return Err(Error::invalid_arg("buf", "cannot map an empty buffer"));
        }
        let cvec = self
            .cvec
            .ok_or_else(|| Error::invalid_arg("iovec", "no backing array"))?;

        if let Some(mut old) = self.guards[index].take() {
            old.release();
        }

        // Safety: index < length, the number of records in the array.
        let entry = unsafe { cvec.as_ptr().add(index) };
        unsafe { (*entry).iov_len = 0 };
        Ok(entry)
    }

    fn install(&mut self, entry: *mut iovec, index: usize, len: usize, guard: PtrGuard<T>) {
        // Safety: `entry` was validated by `entry()` and the array is live.
        unsafe { (*entry).iov_len = len };
        self.guards[index] = Some(guard);
    }

    /// Pointer to the first record, to pass to a foreign call.
    ///
    /// Valid until the iovec is released. Null when the capacity is zero or
    /// the iovec has been released.
    pub fn as_ptr(&self) -> *const iovec {
        self.as_mut_ptr() as *const iovec
    }

    /// Mutable pointer to the first record, for foreign APIs taking
    /// `struct iovec *`.
    pub fn as_mut_ptr(&self) -> *mut iovec {
        self.cvec.map_or(ptr::null_mut(), ptr::NonNull::as_ptr)
    }

    /// The records, as seen by foreign code. Empty once released.
    pub fn iovecs(&self) -> &[iovec] {
        match self.cvec {
            // Safety: the array holds `length` initialized records for as
            // long as `cvec` is set.
            Some(cvec) => unsafe { slice::from_raw_parts(cvec.as_ptr(), self.length) },
            None => &[],
        }
    }

    /// Number of records (the capacity the iovec was created with).
    pub fn len(&self) -> usize {
        self.length
    }

    pub fn is_empty(&self) -> bool {
        self.length == 0
    }

    /// Number of records currently mapped to a buffer.
    pub fn populated(&self) -> usize {
        self.guards.iter().filter(|g| g.is_some()).count()
    }

    /// The guards of the mapped records, in record order.
    pub fn guards(&self) -> impl Iterator<Item = &PtrGuard<T>> {
        self.guards.iter().flatten()
    }

    pub fn is_released(&self) -> bool {
        self.released
    }

    /// Release every guard, then free the array.
    ///
    /// Calling it again has no effect. Buffers stay owned by the iovec until
    /// it is dropped or [`Iovec::into_bufs`] is called.
    pub fn release(&mut self) {
        if self.released {
            return;
        }
        self.released = true;

        // Guards are independent of one another; any order works.
        for guard in self.guards.iter_mut().flatten() {
            guard.release();
        }

        if let Some(cvec) = self.cvec.take() {
            // Safety: allocated with calloc in `with_builder`, no guard refers
            // to it anymore.
            unsafe { libc::free(cvec.as_ptr() as *mut libc::c_void) };
            debug!("freed iovec array {:p}", cvec);
        }
        self.length = 0;
    }

    /// Release the iovec and return one entry per record: the buffer mapped
    /// there, or `None`.
    pub fn into_slots(mut self) -> Vec<Option<T>> {
        self.release();
        mem::take(&mut self.guards)
            .into_iter()
            .map(|guard| guard.and_then(|guard| guard.into_inner().ok()))
            .collect()
    }

    /// Release the iovec and return the mapped buffers in record order.
    pub fn into_bufs(self) -> Vec<T> {
        self.into_slots().into_iter().flatten().collect()
    }
}

impl<T: IoBuf> Drop for Iovec<T> {
    fn drop(&mut self) {
        self.release();
    }
}

impl<T: IoBuf> fmt::Debug for Iovec<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Iovec")
            .field("cvec", &self.as_ptr())
            .field("length", &self.length)
            .field("populated", &self.populated())
            .field("released", &self.released)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::guard::Pinning;

    #[test]
    fn zeroed_on_creation() {
        let iov: Iovec<Vec<u8>> = Iovec::new(4).unwrap();
        assert_eq!(iov.len(), 4);
        assert_eq!(iov.populated(), 0);
        for v in iov.iovecs() {
            assert!(v.iov_base.is_null());
            assert_eq!(v.iov_len, 0);
        }
    }

    #[test]
    fn zero_capacity() {
        let mut iov: Iovec<Vec<u8>> = Iovec::new(0).unwrap();
        assert!(iov.is_empty());
        assert!(iov.as_ptr().is_null());
        assert!(iov.iovecs().is_empty());
        assert!(matches!(
            iov.set(0, vec![1]),
            Err(Error::InvalidArgument { name: "index", .. })
        ));
        iov.release();
        assert!(iov.is_released());
    }

    #[test]
    fn empty_buffer_rejected() {
        let mut iov = Iovec::new(1).unwrap();
        let err = iov.set(0, Vec::<u8>::new()).unwrap_err();
        assert!(matches!(err, Error::InvalidArgument { name: "buf", .. }));
        assert_eq!(iov.populated(), 0);
        assert!(iov.iovecs()[0].iov_base.is_null());
    }

    #[test]
    fn out_of_range_rejected() {
        let mut iov = Iovec::new(2).unwrap();
        let err = iov.set(2, vec![1u8]).unwrap_err();
        assert!(matches!(err, Error::InvalidArgument { name: "index", .. }));
        assert_eq!(iov.populated(), 0);
    }

    #[test]
    fn set_after_release_rejected() {
        let mut iov = Iovec::new(1).unwrap();
        iov.release();
        let err = iov.set(0, vec![1u8]).unwrap_err();
        assert!(matches!(err, Error::InvalidArgument { name: "iovec", .. }));
        assert!(iov.as_ptr().is_null());
        assert_eq!(iov.len(), 0);
    }

    #[test]
    fn repopulating_a_slot_replaces_its_guard() {
        let mut iov = Iovec::new(1).unwrap();
        iov.set(0, vec![1u8; 4]).unwrap();
        let second = vec![2u8; 6];
        let addr = second.as_ptr();
        iov.set(0, second).unwrap();

        assert_eq!(iov.populated(), 1);
        assert_eq!(iov.iovecs()[0].iov_base as *const u8, addr);
        assert_eq!(iov.iovecs()[0].iov_len, 6);
        assert_eq!(iov.into_bufs(), vec![vec![2u8; 6]]);
    }

    #[test]
    fn set_mut_maps_spare_capacity() {
        let mut buf = Vec::with_capacity(32);
        buf.extend_from_slice(b"head");
        let base = buf.as_ptr();

        let mut iov = Iovec::new(1).unwrap();
        iov.set_mut(0, buf).unwrap();
        assert_eq!(iov.iovecs()[0].iov_base as *const u8, base.wrapping_add(4));
        assert_eq!(iov.iovecs()[0].iov_len, 28);

        let full = vec![0u8; 4];
        assert_eq!(full.capacity(), 4);
        assert!(iov.set_mut(0, full).is_err());
    }

    #[test]
    fn into_slots_keeps_positions() {
        let mut iov = Iovec::new(3).unwrap();
        iov.set(2, b"tail".to_vec()).unwrap();
        let slots = iov.into_slots();
        assert_eq!(slots, vec![None, None, Some(b"tail".to_vec())]);
    }

    #[test]
    fn direct_pinning_iovec() {
        let builder = Builder::new().pinning(Pinning::Direct);
        let mut iov = builder.iovec(2).unwrap();
        iov.set(0, &b"ab"[..]).unwrap();
        iov.set(1, &b"cde"[..]).unwrap();
        assert_eq!(iov.iovecs()[1].iov_len, 3);

        iov.release();
        assert!(iov.guards().all(PtrGuard::is_released));
    }
}
