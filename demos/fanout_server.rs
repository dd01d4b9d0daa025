//! TCP fan-out example
//!
//! Accepts TCP clients and broadcasts a numbered line to all of them every
//! 500ms. Clients whose socket breaks are dropped automatically.
//!
//! Run with: cargo run --example fanout_server [BIND_ADDR]
//!
//! Examples:
//!   cargo run --example fanout_server                  # binds to 127.0.0.1:9000
//!   cargo run --example fanout_server 0.0.0.0:9100     # binds to 0.0.0.0:9100
//!
//! Then connect a few clients:
//!   nc localhost 9000

use std::net::SocketAddr;
use std::time::Duration;

use fanout_rs::{Broadcaster, BroadcasterConfig};
use tokio::net::{TcpListener, TcpStream};

/// Accept clients forever, registering each one
async fn accept_loop(listener: TcpListener, broadcaster: Broadcaster<TcpStream>) {
    loop {
        match listener.accept().await {
            Ok((socket, peer_addr)) => {
                if let Err(e) = socket.set_nodelay(true) {
                    tracing::warn!(peer = %peer_addr, error = %e, "Failed to set TCP_NODELAY");
                }
                let id = broadcaster.add_connection(socket).await;
                tracing::info!(peer = %peer_addr, connection_id = %id, "Client joined");
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to accept connection");
            }
        }
    }
}

/// Broadcast a line on every tick
async fn produce(broadcaster: Broadcaster<TcpStream>) {
    let mut ticker = tokio::time::interval(Duration::from_millis(500));
    let mut seq: u64 = 0;

    loop {
        ticker.tick().await;
        seq += 1;

        broadcaster.broadcast(format!("tick {}\n", seq)).await;

        if seq % 10 == 0 {
            let stats = broadcaster.stats().await;
            tracing::info!(
                clients = stats.connections,
                bytes_sent = stats.bytes_sent,
                failed = stats.writes_failed,
                failure_ratio = stats.failure_ratio(),
                "Broadcast stats"
            );
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let bind_addr: SocketAddr = match std::env::args().nth(1) {
        Some(addr) => addr.parse()?,
        None => "127.0.0.1:9000".parse()?,
    };

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("fanout_rs=debug".parse()?)
                .add_directive("fanout_server=debug".parse()?),
        )
        .init();

    let broadcaster = Broadcaster::with_config(BroadcasterConfig::with_name("ticker"));
    let listener = TcpListener::bind(bind_addr).await?;
    println!(
        "Broadcasting on {} (connect with: nc {} {})",
        bind_addr,
        bind_addr.ip(),
        bind_addr.port()
    );

    tokio::select! {
        _ = accept_loop(listener, broadcaster.clone()) => {}
        _ = produce(broadcaster.clone()) => {}
        _ = tokio::signal::ctrl_c() => {
            println!("\nShutting down...");
        }
    }

    broadcaster.shutdown().await;

    Ok(())
}
