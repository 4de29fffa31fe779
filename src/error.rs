use std::io;
use thiserror::Error;

/// A specialized `Result` type for guard and iovec operations.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Errors produced while pinning buffers into foreign memory.
#[derive(Debug, Error)]
pub enum Error {
    /// Foreign memory, or the pinning thread backing a guard, could not be
    /// allocated.
    #[error("allocation failed: {what}")]
    Allocation {
        what: &'static str,
        #[source]
        source: Option<io::Error>,
    },

    /// The caller passed an argument the operation cannot accept, such as an
    /// empty buffer or an index past the end of an iovec.
    #[error("invalid argument {name}: {message}")]
    InvalidArgument { name: &'static str, message: String },

    /// The pinning thread went away before confirming a handshake step.
    #[error("pinning thread exited before confirming the handshake")]
    PinLost,

    #[error(transparent)]
    Io(#[from] io::Error),
}

impl Error {
    pub(crate) fn allocation(what: &'static str) -> Error {
        Error::Allocation { what, source: None }
    }

    pub(crate) fn spawn(source: io::Error) -> Error {
        Error::Allocation {
            what: "pinning thread",
            source: Some(source),
        }
    }

    pub(crate) fn invalid_arg(name: &'static str, message: impl Into<String>) -> Error {
        Error::InvalidArgument {
            name,
            message: message.into(),
        }
    }
}

impl From<Error> for io::Error {
    fn from(err: Error) -> io::Error {
        match err {
            Error::Io(err) => err,
            Error::Allocation { .. } => io::Error::new(io::ErrorKind::OutOfMemory, err),
            Error::InvalidArgument { .. } => io::Error::new(io::ErrorKind::InvalidInput, err),
            Error::PinLost => io::Error::new(io::ErrorKind::Other, err),
        }
    }
}
