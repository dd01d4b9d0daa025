//! Broadcaster implementation
//!
//! Holds the connection set and fans each buffer out to every member with one
//! spawned write task per connection.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;

use bytes::Bytes;
use tokio::net::TcpStream;
use tokio::sync::RwLock;
use tokio::task::JoinSet;

use super::barrier::WriteBarrier;
use super::config::BroadcasterConfig;
use super::connection::{Connection, ConnectionId, Peer};
use crate::error::Error;
use crate::stats::{BroadcasterStats, Counters};

/// Concurrent fan-out broadcaster
///
/// Cheap to clone; clones share the same connection set.
///
/// Membership changes and broadcasts are serialized by one `RwLock`:
/// `broadcast` holds the read side while it spawns write tasks, so a
/// connection added concurrently misses that broadcast and receives the next.
pub struct Broadcaster<C = TcpStream> {
    shared: Arc<Shared<C>>,
}

struct Shared<C> {
    /// Registered connections
    connections: RwLock<HashMap<ConnectionId, Arc<Peer<C>>>>,

    /// Next id handed out by `add_connection`
    next_id: AtomicU64,

    /// Writes started but not yet returned (diagnostics only)
    outstanding_writes: AtomicUsize,

    /// Tracks spawned write tasks for `shutdown`
    barrier: WriteBarrier,

    counters: Counters,

    config: BroadcasterConfig,
}

impl<C: Connection> Broadcaster<C> {
    /// Create a new broadcaster with default configuration
    pub fn new() -> Self {
        Self::with_config(BroadcasterConfig::default())
    }

    /// Create a new broadcaster with custom configuration
    pub fn with_config(config: BroadcasterConfig) -> Self {
        Self {
            shared: Arc::new(Shared {
                connections: RwLock::new(HashMap::new()),
                next_id: AtomicU64::new(1),
                outstanding_writes: AtomicUsize::new(0),
                barrier: WriteBarrier::new(),
                counters: Counters::default(),
                config,
            }),
        }
    }

    /// Get the broadcaster configuration
    pub fn config(&self) -> &BroadcasterConfig {
        &self.shared.config
    }

    /// Register a connection as a broadcast target
    ///
    /// The broadcaster takes ownership and is responsible for closing it,
    /// either after a failed write or on [`shutdown`](Self::shutdown).
    pub async fn add_connection(&self, conn: C) -> ConnectionId {
        let id = ConnectionId(self.shared.next_id.fetch_add(1, Ordering::Relaxed));
        let mut connections = self.shared.connections.write().await;

        if connections.capacity() == 0 {
            connections.reserve(self.shared.config.initial_capacity);
        }
        connections.insert(id, Arc::new(Peer::new(id, conn)));
        self.shared.counters.record_added();

        tracing::info!(
            broadcaster = %self.shared.config.name,
            connection_id = %id,
            connections = connections.len(),
            "Connection added"
        );

        id
    }

    /// Number of registered connections
    pub async fn connection_count(&self) -> usize {
        self.shared.connections.read().await.len()
    }

    /// Send a buffer to every registered connection
    ///
    /// Spawns one write task per connection and returns without waiting for
    /// them. A connection whose write fails is closed and removed; nothing is
    /// reported to the caller.
    pub async fn broadcast(&self, buf: impl Into<Bytes>) {
        let buf = buf.into();
        let connections = self.shared.connections.read().await;

        self.shared.counters.record_broadcast();

        tracing::trace!(
            broadcaster = %self.shared.config.name,
            targets = connections.len(),
            bytes = buf.len(),
            "Broadcasting"
        );

        for peer in connections.values() {
            let guard = self.shared.barrier.enter();
            let shared = Arc::clone(&self.shared);
            let peer = Arc::clone(peer);
            let buf = buf.clone();

            tokio::spawn(async move {
                let _guard = guard;
                shared.write_to(&peer, &buf).await;
            });
        }
    }

    /// Close every connection and wait for in-flight writes to finish
    ///
    /// Every connection is closed right away, which also interrupts a write
    /// stuck on it. Then this waits for all spawned write tasks to finish,
    /// with no timeout. Leaves the broadcaster empty but usable. Concurrent
    /// callers each return once the shared write barrier has drained.
    pub async fn shutdown(&self) {
        let drained: Vec<Arc<Peer<C>>> = {
            let mut connections = self.shared.connections.write().await;
            std::mem::take(&mut *connections).into_values().collect()
        };

        tracing::info!(
            broadcaster = %self.shared.config.name,
            connections = drained.len(),
            in_flight = self.shared.barrier.in_flight(),
            "Shutting down broadcaster"
        );

        self.shared.counters.record_removed(drained.len());

        // Close concurrently so one slow `Connection::close` doesn't hold up the rest
        let mut closing = JoinSet::new();
        for peer in drained {
            closing.spawn(async move { peer.close().await });
        }
        while closing.join_next().await.is_some() {}

        self.shared.barrier.wait().await;

        tracing::info!(broadcaster = %self.shared.config.name, "Broadcaster shut down");
    }

    /// Number of writes currently in progress
    ///
    /// For diagnostics only; the value may be stale by the time it is read.
    pub fn outstanding_writes(&self) -> usize {
        self.shared.outstanding_writes.load(Ordering::Relaxed)
    }

    /// Get broadcaster statistics
    pub async fn stats(&self) -> BroadcasterStats {
        let connections = self.connection_count().await;

        self.shared.counters.snapshot(
            connections,
            self.outstanding_writes(),
            self.shared.barrier.in_flight(),
        )
    }
}

impl<C: Connection> Shared<C> {
    /// Body of one write task
    async fn write_to(&self, peer: &Peer<C>, buf: &[u8]) {
        self.outstanding_writes.fetch_add(1, Ordering::Relaxed);
        let result = peer.write(buf).await;
        self.outstanding_writes.fetch_sub(1, Ordering::Relaxed);

        match result {
            Ok(n) => self.counters.record_write(n),
            Err(e) => {
                self.counters.record_failure();

                match e {
                    Error::Closed(_) => tracing::trace!(
                        broadcaster = %self.config.name,
                        connection_id = %peer.id(),
                        "Skipping write to closed connection"
                    ),
                    Error::Write { .. } => tracing::debug!(
                        broadcaster = %self.config.name,
                        connection_id = %peer.id(),
                        error = %e,
                        "Write failed, dropping connection"
                    ),
                }

                peer.close().await;

                let removed = self.connections.write().await.remove(&peer.id());
                if removed.is_some() {
                    self.counters.record_removed(1);
                    tracing::debug!(
                        broadcaster = %self.config.name,
                        connection_id = %peer.id(),
                        "Connection removed"
                    );
                }
            }
        }
    }
}

impl<C> Clone for Broadcaster<C> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<C: Connection> Default for Broadcaster<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C> std::fmt::Debug for Broadcaster<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Broadcaster")
            .field("name", &self.shared.config.name)
            .field("in_flight", &self.shared.barrier.in_flight())
            .finish()
    }
}
