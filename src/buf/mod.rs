//! Utilities for working with buffers.
//!
//! Buffers are passed by ownership: pinning one into foreign memory moves it
//! onto the pinning thread, and releasing the pin hands it back.

mod io_buf;
pub use io_buf::IoBuf;

mod io_buf_mut;
pub use io_buf_mut::IoBufMut;
