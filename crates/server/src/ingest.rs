//! TCP ingestion path
//!
//! `IngestServer` accepts producer connections and spawns one handler
//! task per connection. A handler reads a single handshake token; a
//! `"logger"` token starts the entry-decode loop, anything else (or a
//! read failure) just closes the connection. Decoded entries are
//! forwarded to the hub with a blocking send, so a fast producer is
//! paced by the core's processing rate, never the other way around.
//!
//! Accept errors are logged and do not stop the accept loop. All
//! transport and decode failures stay local to their connection task.

use std::net::SocketAddr;

use tokio::io::BufReader;
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use loghub_protocol::{read_entry, read_token};

use crate::error::Result;
use crate::hub::HubHandle;

/// Handshake token identifying an entry-producing connection
pub const HANDSHAKE_LOGGER: &str = "logger";

/// Default listen port
const DEFAULT_PORT: u16 = 9601;

/// Ingest server configuration
#[derive(Debug, Clone)]
pub struct IngestConfig {
    /// Bind address (e.g. "0.0.0.0")
    pub address: String,

    /// Listen port (0 picks an ephemeral port)
    pub port: u16,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            address: "0.0.0.0".into(),
            port: DEFAULT_PORT,
        }
    }
}

/// TCP listener feeding the hub's entry endpoint
pub struct IngestServer {
    listener: TcpListener,
    hub: HubHandle,
}

impl IngestServer {
    /// Bind the listen socket
    pub async fn bind(config: &IngestConfig, hub: HubHandle) -> Result<Self> {
        let addr = format!("{}:{}", config.address, config.port);
        let listener = TcpListener::bind(&addr).await?;
        Ok(Self { listener, hub })
    }

    /// The bound local address
    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Accept connections until cancelled
    pub async fn run(self, cancel: CancellationToken) {
        match self.listener.local_addr() {
            Ok(addr) => info!(%addr, "ingest listening"),
            Err(_) => info!("ingest listening"),
        }

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    info!("ingest shutting down");
                    break;
                }
                accepted = self.listener.accept() => match accepted {
                    Ok((stream, addr)) => {
                        debug!(%addr, "connected");
                        let hub = self.hub.clone();
                        tokio::spawn(handle_connection(stream, hub, cancel.clone()));
                    }
                    Err(e) => {
                        error!(error = %e, "failed to accept connection");
                    }
                },
            }
        }
    }

    /// Run the accept loop in a background task
    pub fn spawn(self, cancel: CancellationToken) -> JoinHandle<()> {
        tokio::spawn(self.run(cancel))
    }
}

/// Handle one producer connection: handshake, then dispatch by token
///
/// Cancellation drops the connection mid-read, so handler tasks (and
/// their hub handles) go away on shutdown instead of lingering until
/// the peer hangs up.
async fn handle_connection(stream: TcpStream, hub: HubHandle, cancel: CancellationToken) {
    let mut reader = BufReader::new(stream);

    let token = tokio::select! {
        _ = cancel.cancelled() => return,
        token = read_token(&mut reader) => match token {
            Ok(token) => token,
            Err(e) => {
                debug!(error = %e, "handshake failed");
                return;
            }
        },
    };

    match token.as_str() {
        HANDSHAKE_LOGGER => handle_logger(reader, hub, cancel).await,
        other => {
            // Unrecognized connection types are closed without fuss.
            debug!(token = other, "unrecognized connection type");
        }
    }
}

/// Decode framed entries until shutdown, a stream error, or hub close
async fn handle_logger(mut reader: BufReader<TcpStream>, hub: HubHandle, cancel: CancellationToken) {
    loop {
        let entry = tokio::select! {
            _ = cancel.cancelled() => {
                debug!("shutting down, dropping logger connection");
                break;
            }
            entry = read_entry(&mut reader) => match entry {
                Ok(entry) => entry,
                Err(e) => {
                    debug!(error = %e, "logger stream ended");
                    break;
                }
            },
        };
        // Blocking send: producer backpressure, never core stall.
        if hub.send_entry(entry).await.is_err() {
            debug!("hub closed, dropping logger connection");
            break;
        }
    }
}

#[cfg(test)]
#[path = "ingest_test.rs"]
mod tests;
