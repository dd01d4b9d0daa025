//! Fan-out broadcaster
//!
//! The broadcaster owns a set of registered connections and writes each
//! broadcast buffer to all of them concurrently, one spawned task per
//! connection.
//!
//! # Architecture
//!
//! ```text
//!                       Broadcaster (Arc<Shared>)
//!               ┌──────────────────────────────────────┐
//!               │ connections: RwLock<HashMap<         │
//!               │   ConnectionId,                      │
//!               │   Arc<Peer { Mutex<Option<C>> }>,    │
//!               │ >>                                   │
//!               │ barrier: WriteBarrier                │
//!               └──────────────────┬───────────────────┘
//!                                  │ broadcast(buf)
//!          ┌───────────────────────┼───────────────────────┐
//!          ▼                       ▼                       ▼
//!    tokio::spawn            tokio::spawn            tokio::spawn
//!    peer.write(buf)         peer.write(buf)         peer.write(buf)
//!          │                       │                       │
//!          └────────── on error: close + remove ───────────┘
//! ```
//!
//! # Zero-Copy Design
//!
//! The buffer is a `bytes::Bytes`, so every write task shares the same
//! allocation. Cloning it per connection only bumps a reference count.

pub(crate) mod barrier;
pub mod broadcaster;
pub mod config;
pub mod connection;

pub use broadcaster::Broadcaster;
pub use config::BroadcasterConfig;
pub use connection::{Connection, ConnectionId};
