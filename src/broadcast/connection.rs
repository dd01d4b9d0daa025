//! Connection capability and per-connection state
//!
//! A [`Connection`] is anything the broadcaster can write bytes to and close.
//! Every Tokio `AsyncWrite` stream qualifies through a blanket implementation.

use std::future::Future;
use std::io;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::sync::{Mutex, Notify};

use crate::error::{Error, Result};

/// Identity of a registered connection
///
/// Assigned by the broadcaster on registration and unique for its lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConnectionId(pub(crate) u64);

impl ConnectionId {
    /// Raw numeric value
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A byte stream the broadcaster can deliver buffers to
pub trait Connection: Send + 'static {
    /// Write the whole buffer, returning the number of bytes written
    fn write(&mut self, buf: &[u8]) -> impl Future<Output = io::Result<usize>> + Send;

    /// Close the connection
    fn close(&mut self) -> impl Future<Output = io::Result<()>> + Send;
}

impl<T> Connection for T
where
    T: AsyncWrite + Unpin + Send + 'static,
{
    async fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.write_all(buf).await?;
        self.flush().await?;
        Ok(buf.len())
    }

    async fn close(&mut self) -> io::Result<()> {
        self.shutdown().await
    }
}

/// Broadcaster-side slot for one registered connection
///
/// The stream sits behind an async mutex so writes from different broadcasts
/// never interleave on the wire. `None` means the connection has been closed.
///
/// The close signal lives outside the mutex: closing a peer interrupts a
/// write that is stuck on the transport, the way closing a socket makes a
/// blocked write return.
pub(crate) struct Peer<C> {
    id: ConnectionId,
    stream: Mutex<Option<C>>,
    closing: AtomicBool,
    closed: Notify,
}

impl<C: Connection> Peer<C> {
    pub(crate) fn new(id: ConnectionId, conn: C) -> Self {
        Self {
            id,
            stream: Mutex::new(Some(conn)),
            closing: AtomicBool::new(false),
            closed: Notify::new(),
        }
    }

    pub(crate) fn id(&self) -> ConnectionId {
        self.id
    }

    /// Write `buf` to the connection
    ///
    /// Fails with [`Error::Closed`] if the peer is closed before or while
    /// the write runs.
    pub(crate) async fn write(&self, buf: &[u8]) -> Result<usize> {
        let mut stream = self.stream.lock().await;
        let conn = stream.as_mut().ok_or(Error::Closed(self.id))?;

        let closed = self.closed.notified();
        tokio::pin!(closed);
        closed.as_mut().enable();

        if self.closing.load(Ordering::Acquire) {
            return Err(Error::Closed(self.id));
        }

        tokio::select! {
            result = conn.write(buf) => {
                result.map_err(|source| Error::Write { id: self.id, source })
            }
            _ = closed => Err(Error::Closed(self.id)),
        }
    }

    /// Close the connection if still open
    ///
    /// Signals any in-flight write to stop, then closes the stream. Returns
    /// `true` if this call closed it. Close errors are logged and otherwise
    /// ignored.
    pub(crate) async fn close(&self) -> bool {
        self.closing.store(true, Ordering::Release);
        self.closed.notify_waiters();

        let taken = self.stream.lock().await.take();

        match taken {
            Some(mut conn) => {
                if let Err(e) = conn.close().await {
                    tracing::trace!(connection_id = %self.id, error = %e, "Close failed");
                }
                true
            }
            None => false,
        }
    }
}
