//! Filesystem operations that consume pinned iovecs.

mod file;
pub use file::File;
