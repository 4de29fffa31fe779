use crate::buf::IoBuf;

/// A buffer foreign code may write into.
///
/// Foreign writes land in the spare capacity past
/// [`bytes_init`](IoBuf::bytes_init). Buffers that are always full, such as
/// `Box<[u8]>`, have none and only implement [`IoBuf`].
///
/// # Safety
///
/// Same contract as [`IoBuf`], for the mutable pointer as well.
pub unsafe trait IoBufMut: IoBuf {
    /// Returns a pointer to the memory that does not change if the value is
    /// moved.
    fn stable_mut_ptr(&mut self) -> *mut u8;

    /// Updates the number of initialized bytes.
    ///
    /// The initialized length never shrinks.
    ///
    /// # Safety
    ///
    /// The caller must ensure that all bytes up to `pos` have been written.
    unsafe fn set_init(&mut self, pos: usize);
}

unsafe impl IoBufMut for Vec<u8> {
    fn stable_mut_ptr(&mut self) -> *mut u8 {
        self.as_mut_ptr()
    }

    unsafe fn set_init(&mut self, init_len: usize) {
        if self.len() < init_len {
            self.set_len(init_len);
        }
    }
}

#[cfg(feature = "bytes")]
unsafe impl IoBufMut for bytes::BytesMut {
    fn stable_mut_ptr(&mut self) -> *mut u8 {
        self.as_mut_ptr()
    }

    unsafe fn set_init(&mut self, init_len: usize) {
        if self.len() < init_len {
            self.set_len(init_len);
        }
    }
}
