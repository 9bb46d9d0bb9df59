//! TCP Server
//!
//! Accepts connections and hands each one to its own worker thread.

use std::collections::HashMap;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, Shutdown, SocketAddr, TcpListener, TcpStream};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;

use crossbeam::sync::WaitGroup;
use parking_lot::Mutex;

use crate::config::Config;
use crate::engine::Engine;
use crate::error::{EmberError, Result};
use crate::protocol::Decoder;

use super::Connection;

/// Live connections, keyed by id, so shutdown can close their sockets
type ConnectionRegistry = Arc<Mutex<HashMap<u64, TcpStream>>>;

/// TCP server for EmberKV
///
/// Owns the listening socket and the engine. Every accepted connection runs
/// on a dedicated thread for as long as the client stays connected.
pub struct Server {
    config: Config,
    engine: Arc<Engine>,
    listener: TcpListener,
    shutdown: Arc<AtomicBool>,
    connections: ConnectionRegistry,
    next_connection_id: AtomicU64,
}

impl Server {
    /// Validate the config and bind the listening socket
    pub fn bind(config: Config, engine: Arc<Engine>) -> Result<Self> {
        if config.max_connections == 0 {
            return Err(EmberError::Config(
                "max_connections must be at least 1".to_string(),
            ));
        }
        if config.max_nesting_depth == 0 {
            return Err(EmberError::Config(
                "max_nesting_depth must be at least 1".to_string(),
            ));
        }

        let listener = TcpListener::bind(&config.listen_addr).map_err(|e| {
            EmberError::Network(format!("failed to bind {}: {}", config.listen_addr, e))
        })?;

        Ok(Self {
            config,
            engine,
            listener,
            shutdown: Arc::new(AtomicBool::new(false)),
            connections: Arc::new(Mutex::new(HashMap::new())),
            next_connection_id: AtomicU64::new(1),
        })
    }

    /// Address the listener is actually bound to
    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Handle that stops `run` from another thread
    pub fn shutdown_handle(&self) -> Result<ShutdownHandle> {
        Ok(ShutdownHandle {
            flag: Arc::clone(&self.shutdown),
            wake_addr: wake_addr(self.local_addr()?),
        })
    }

    /// Number of connections currently being served
    pub fn connection_count(&self) -> usize {
        self.connections.lock().len()
    }

    /// Start the server (blocking)
    ///
    /// Returns after shutdown is requested and every connection worker has
    /// exited.
    pub fn run(&self) -> Result<()> {
        let workers = WaitGroup::new();
        tracing::info!("Listening on {}", self.local_addr()?);

        for stream in self.listener.incoming() {
            if self.shutdown.load(Ordering::SeqCst) {
                break;
            }

            let stream = match stream {
                Ok(stream) => stream,
                Err(e) => {
                    tracing::error!("Failed to accept connection: {}", e);
                    continue;
                }
            };

            if self.connection_count() >= self.config.max_connections {
                tracing::warn!(
                    "Connection limit ({}) reached, rejecting {:?}",
                    self.config.max_connections,
                    stream.peer_addr().ok()
                );
                continue;
            }

            self.spawn_worker(stream, workers.clone());
        }

        // Closing the sockets makes every blocked worker read EOF and exit.
        let live = {
            let connections = self.connections.lock();
            for stream in connections.values() {
                let _ = stream.shutdown(Shutdown::Both);
            }
            connections.len()
        };
        tracing::info!("Shutting down, waiting for {} connection(s)", live);

        workers.wait();
        tracing::info!("Server stopped");
        Ok(())
    }

    fn spawn_worker(&self, stream: TcpStream, workers: WaitGroup) {
        let id = self.next_connection_id.fetch_add(1, Ordering::Relaxed);

        match stream.try_clone() {
            Ok(handle) => {
                self.connections.lock().insert(id, handle);
            }
            Err(e) => {
                tracing::warn!("Dropping connection {}: {}", id, e);
                return;
            }
        }

        let engine = Arc::clone(&self.engine);
        let connections = Arc::clone(&self.connections);
        let decoder = Decoder::new(self.config.max_nesting_depth);
        let (read_ms, write_ms) = (self.config.read_timeout_ms, self.config.write_timeout_ms);

        let spawned = thread::Builder::new()
            .name(format!("conn-{}", id))
            .spawn(move || {
                let _worker = workers;

                let result = Connection::new(stream, engine).and_then(|connection| {
                    let mut connection = connection.with_decoder(decoder);
                    connection.set_timeouts(read_ms, write_ms)?;
                    connection.handle()
                });
                if let Err(e) = result {
                    tracing::debug!("Connection {} closed with error: {}", id, e);
                }

                connections.lock().remove(&id);
            });

        if let Err(e) = spawned {
            tracing::error!("Failed to spawn worker for connection {}: {}", id, e);
            self.connections.lock().remove(&id);
        }
    }
}

/// Stops a running `Server`
#[derive(Debug, Clone)]
pub struct ShutdownHandle {
    flag: Arc<AtomicBool>,
    wake_addr: SocketAddr,
}

impl ShutdownHandle {
    /// Signal the server to shutdown gracefully
    ///
    /// Sets the flag and connects once to the listener so the blocked
    /// `accept` returns and observes it.
    pub fn shutdown(&self) {
        if self.flag.swap(true, Ordering::SeqCst) {
            return;
        }
        if let Err(e) = TcpStream::connect(self.wake_addr) {
            tracing::warn!("Failed to wake accept loop at {}: {}", self.wake_addr, e);
        }
    }

    pub fn is_shutdown(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}

/// A wildcard listen address is not connectable everywhere; use loopback.
fn wake_addr(addr: SocketAddr) -> SocketAddr {
    match addr.ip() {
        IpAddr::V4(ip) if ip.is_unspecified() => {
            SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), addr.port())
        }
        IpAddr::V6(ip) if ip.is_unspecified() => {
            SocketAddr::new(IpAddr::V6(Ipv6Addr::LOCALHOST), addr.port())
        }
        _ => addr,
    }
}
