//! Pin buffers into foreign memory for the duration of a foreign call.
//!
//! C libraries frequently take pointers to caller buffers stored *inside*
//! other C memory: the `iov_base` fields of a `struct iovec` array, a field of
//! a request struct, and so on. Nothing on the Rust side sees those pointers,
//! so the buffers they point into must be kept alive, and in place, by other
//! means until the call returns.
//!
//! This crate provides two building blocks:
//!
//! * [`PtrGuard`] writes a buffer's address into one foreign slot, owns the
//!   buffer while the address is visible, and clears the slot on release;
//! * [`Iovec`] allocates a `struct iovec` array in C memory and maps one
//!   buffer into each record through a guard.
//!
//! [`fs::File`] uses both to provide `preadv(2)`/`pwritev(2)` over owned
//! buffers.
//!
//! # Examples
//!
//! ```
//! use ptr_guard::iovec::Iovec;
//!
//! let bufs = vec![b"scatter ".to_vec(), b"gather".to_vec()];
//! let iov = Iovec::from_bufs(bufs).unwrap();
//!
//! // Pass `iov.as_ptr()` and `iov.len()` to the foreign call here.
//! assert_eq!(iov.len(), 2);
//!
//! // Releasing clears every `iov_base`, frees the array and returns the
//! // buffers.
//! let bufs = iov.into_bufs();
//! assert_eq!(bufs[1], b"gather");
//! ```

#![warn(missing_debug_implementations, rust_2018_idioms)]

pub mod buf;

mod error;
pub use error::{Error, Result};

pub mod fs;

pub mod guard;
pub use guard::PtrGuard;

mod io;

pub mod iovec;
pub use iovec::Iovec;

/// A specialized `Result` type for vectored I/O with owned buffers.
///
/// The buffers are handed back alongside the outcome of the call, whether it
/// succeeded or not.
pub type BufResult<T, B> = (std::io::Result<T>, B);
