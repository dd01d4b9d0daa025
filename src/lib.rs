//! Concurrent fan-out of byte buffers to stream connections
//!
//! A [`Broadcaster`] holds a dynamic set of live connections. Each call to
//! [`Broadcaster::broadcast`] spawns one write task per registered connection,
//! drops connections whose write fails, and [`Broadcaster::shutdown`] closes
//! everything and waits for in-flight writes to drain.
//!
//! Payloads are opaque: framing, encoding and connection acceptance belong to
//! the caller.
//!
//! ```no_run
//! use fanout_rs::Broadcaster;
//! use tokio::net::TcpListener;
//!
//! # async fn run() -> std::io::Result<()> {
//! let broadcaster = Broadcaster::new();
//! let listener = TcpListener::bind("127.0.0.1:9000").await?;
//!
//! let (socket, _) = listener.accept().await?;
//! broadcaster.add_connection(socket).await;
//!
//! broadcaster.broadcast(&b"hello"[..]).await;
//! broadcaster.shutdown().await;
//! # Ok(())
//! # }
//! ```

pub mod broadcast;
pub mod error;
pub mod stats;

pub use broadcast::{Broadcaster, BroadcasterConfig, Connection, ConnectionId};
pub use error::{Error, Result};
pub use stats::BroadcasterStats;
