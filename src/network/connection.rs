//! Connection Handler
//!
//! Handles individual client connections.

use std::io::{BufReader, BufWriter, ErrorKind};
use std::net::TcpStream;
use std::sync::Arc;
use std::time::Duration;

use crate::engine::Engine;
use crate::error::{EmberError, Result};
use crate::protocol::{write_response, Command, Decoder};

/// Handles a single client connection
pub struct Connection {
    /// TCP stream reader (buffered for efficiency)
    ///
    /// Lives as long as the connection so bytes buffered past one request
    /// are still there for the next decode.
    reader: BufReader<TcpStream>,

    /// TCP stream writer (buffered for efficiency)
    writer: BufWriter<TcpStream>,

    /// Reference to the command engine
    engine: Arc<Engine>,

    /// Request frame decoder
    decoder: Decoder,

    /// Peer address for logging
    peer_addr: String,
}

impl Connection {
    /// Create a new connection handler
    ///
    /// Sets up buffered I/O
    pub fn new(stream: TcpStream, engine: Arc<Engine>) -> Result<Self> {
        // Get peer address for logging before we split the stream
        let peer_addr = stream
            .peer_addr()
            .map(|a| a.to_string())
            .unwrap_or_else(|_| "unknown".to_string());

        // Disable Nagle's algorithm for low latency
        stream.set_nodelay(true)?;

        // Clone stream for separate read/write handles
        let read_stream = stream.try_clone()?;
        let write_stream = stream;

        Ok(Self {
            reader: BufReader::new(read_stream),
            writer: BufWriter::new(write_stream),
            engine,
            decoder: Decoder::default(),
            peer_addr,
        })
    }

    /// Use a decoder with a different nesting limit
    pub fn with_decoder(mut self, decoder: Decoder) -> Self {
        self.decoder = decoder;
        self
    }

    /// Configure connection timeouts (0 leaves the stream blocking forever)
    pub fn set_timeouts(&mut self, read_ms: u64, write_ms: u64) -> Result<()> {
        let read_stream = self.reader.get_ref();
        let write_stream = self.writer.get_ref();

        if read_ms > 0 {
            read_stream.set_read_timeout(Some(Duration::from_millis(read_ms)))?;
        }
        if write_ms > 0 {
            write_stream.set_write_timeout(Some(Duration::from_millis(write_ms)))?;
        }

        Ok(())
    }

    /// Handle the connection (blocking until closed)
    ///
    /// Decodes one request at a time, executes it, and writes the reply
    /// before reading the next one. Returns `Ok` when the client
    /// disconnects; malformed frames and malformed commands are logged and
    /// close the connection without a reply.
    pub fn handle(&mut self) -> Result<()> {
        tracing::debug!("Connection established from {}", self.peer_addr);

        loop {
            // Read next request frame
            let value = match self.decoder.read_value(&mut self.reader) {
                Ok(value) => value,
                Err(EmberError::EndOfStream) => {
                    tracing::debug!("Client {} disconnected", self.peer_addr);
                    return Ok(());
                }
                Err(e) if e.root_cause().is_disconnect() => {
                    tracing::debug!("Connection to {} dropped: {}", self.peer_addr, e);
                    return Ok(());
                }
                Err(e) if is_timeout(e.root_cause()) => {
                    tracing::debug!("Read timeout for client {}", self.peer_addr);
                    return Ok(());
                }
                Err(e) => {
                    tracing::warn!("Error decoding request from {}: {}", self.peer_addr, e);
                    return Err(e);
                }
            };

            tracing::trace!("Received frame from {}: {:?}", self.peer_addr, value);

            let command = match Command::from_value(value) {
                Ok(command) => command,
                Err(e) => {
                    tracing::warn!("Rejecting request from {}: {}", self.peer_addr, e);
                    return Err(e);
                }
            };

            let response = self.engine.execute(command);

            if let Err(e) = write_response(&mut self.writer, &response) {
                if e.is_disconnect() {
                    tracing::debug!(
                        "Client {} disconnected before response could be sent: {}",
                        self.peer_addr,
                        e
                    );
                    return Ok(());
                }
                tracing::warn!("Error writing to {}: {}", self.peer_addr, e);
                return Err(e);
            }
        }
    }

    /// Get the peer address string
    pub fn peer_addr(&self) -> &str {
        &self.peer_addr
    }
}

fn is_timeout(error: &EmberError) -> bool {
    match error {
        // Windows reports TimedOut where Unix reports WouldBlock
        EmberError::Io(e) => matches!(e.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut),
        _ => false,
    }
}
