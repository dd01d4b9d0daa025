//! Error types
//!
//! Errors here never escape the public broadcaster operations. They describe
//! why a write task dropped its connection and end up in tracing output.

use std::io;

use crate::broadcast::ConnectionId;

/// Result alias for fallible internal operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for connection writes
#[derive(Debug)]
pub enum Error {
    /// Writing the buffer to a connection failed
    Write {
        /// Connection the write was addressed to
        id: ConnectionId,
        /// Underlying transport error
        source: io::Error,
    },
    /// Connection was closed before or during the write
    Closed(ConnectionId),
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::Write { id, source } => {
                write!(f, "Write to connection {} failed: {}", id, source)
            }
            Error::Closed(id) => write!(f, "Connection {} already closed", id),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Write { source, .. } => Some(source),
            Error::Closed(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::error::Error as _;

    use super::*;

    #[test]
    fn test_display() {
        let err = Error::Write {
            id: ConnectionId(7),
            source: io::Error::new(io::ErrorKind::BrokenPipe, "pipe closed"),
        };
        assert_eq!(err.to_string(), "Write to connection #7 failed: pipe closed");

        let err = Error::Closed(ConnectionId(3));
        assert_eq!(err.to_string(), "Connection #3 already closed");
    }

    #[test]
    fn test_source() {
        let err = Error::Write {
            id: ConnectionId(1),
            source: io::Error::from(io::ErrorKind::ConnectionReset),
        };
        assert!(err.source().is_some());

        assert!(Error::Closed(ConnectionId(1)).source().is_none());
    }
}
