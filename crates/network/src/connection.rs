//! # Server Connection Management
//!
//! This module owns the TCP connection to the game server.
//!
//! # Architecture
//!
//! A connection runs one dedicated reader thread that:
//! - blocks on the socket
//! - cuts the byte stream into frames and decodes them
//! - pushes the results onto the dispatch queue without ever blocking on it
//!
//! Writes happen on the caller's thread through [`Connection::send`].
//!
//! # Lifecycle
//!
//! ```text
//! open → reading ──remote close / error──▶ Closed(Remote | Error) enqueued
//!           │
//!           └──disconnect()──▶ socket shut down, reader exits silently
//! ```
//!
//! Exactly one side claims the `closed` flag. If the caller disconnects first,
//! the reader sees its read fail, finds the flag already set and exits
//! without a notification; the caller reports the local disconnect itself.
//! If the server or the socket goes first, the reader claims the flag and
//! enqueues a single [`Inbound::Closed`].

use crate::config::NetworkConfig;
use crate::error::{ConnectError, DisconnectCause};
use crate::queue::{Inbound, InboundSender};
use parking_lot::Mutex;
use shard_core::{ClientError, Result};
use shard_protocol::{FrameDecoder, Packet};
use socket2::{Domain, Protocol, SockAddr, Socket, Type};
use std::io::{self, ErrorKind, Read, Write};
use std::net::{IpAddr, Shutdown, SocketAddr, TcpStream, ToSocketAddrs};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Instant;

/// Traffic counters for one connection
#[derive(Debug, Clone, Copy)]
pub struct ConnectionStats {
    /// When the connection was established
    pub connected_at: Instant,

    /// Raw bytes read from the socket
    pub bytes_received: u64,

    /// Raw bytes written to the socket
    pub bytes_sent: u64,

    /// Frames handed to the dispatch queue
    pub frames_received: u64,

    /// Packets written
    pub packets_sent: u64,
}

impl ConnectionStats {
    fn new() -> Self {
        Self {
            connected_at: Instant::now(),
            bytes_received: 0,
            bytes_sent: 0,
            frames_received: 0,
            packets_sent: 0,
        }
    }
}

/// Connection to the game server
///
/// # Purpose
/// Owns the socket exclusively. Created by [`Connection::open`]; dropped or
/// explicitly [`disconnect`](Connection::disconnect)ed by the session.
pub struct Connection {
    /// Remote address
    peer_addr: SocketAddr,

    /// Write half, serialized so concurrent sends never interleave frames
    writer: Mutex<TcpStream>,

    /// Set by whichever side ends the connection first
    closed: Arc<AtomicBool>,

    /// Reader thread, joined on disconnect
    reader: Mutex<Option<JoinHandle<()>>>,

    /// Traffic counters shared with the reader thread
    stats: Arc<Mutex<ConnectionStats>>,
}

impl Connection {
    /// Connect to `host` and start the reader thread
    ///
    /// # Arguments
    /// * `host` - `address[:port]`; the configured default port fills in a missing one
    /// * `config` - Timeouts and socket options
    /// * `inbound` - Where the reader thread delivers frames
    ///
    /// # Errors
    /// A classified [`ConnectError`]; nothing is retried.
    pub fn open(host: &str, config: &NetworkConfig, inbound: InboundSender) -> std::result::Result<Self, ConnectError> {
        let addr = resolve(host, config.default_port)?;
        tracing::info!("Connecting to {} ({})", host, addr);

        let socket = Socket::new(Domain::for_address(addr), Type::STREAM, Some(Protocol::TCP))?;
        socket.connect_timeout(&SockAddr::from(addr), config.connect_timeout)?;
        socket.set_nodelay(config.nodelay)?;
        let stream: TcpStream = socket.into();

        let reader_stream = stream.try_clone()?;
        let closed = Arc::new(AtomicBool::new(false));
        let stats = Arc::new(Mutex::new(ConnectionStats::new()));

        let reader = {
            let closed = Arc::clone(&closed);
            let stats = Arc::clone(&stats);
            let chunk_size = config.effective_read_buffer();
            thread::Builder::new()
                .name("shard-net-reader".into())
                .spawn(move || read_loop(reader_stream, closed, inbound, stats, chunk_size))?
        };

        tracing::info!("Connected to {}", addr);
        Ok(Self {
            peer_addr: addr,
            writer: Mutex::new(stream),
            closed,
            reader: Mutex::new(Some(reader)),
            stats,
        })
    }

    /// Encode and write one packet
    ///
    /// # Errors
    /// `ClientError::Network` once the connection is closed, `ClientError::Io`
    /// if the write fails.
    pub fn send(&self, packet: &Packet) -> Result<()> {
        if self.is_closed() {
            return Err(ClientError::Network(format!(
                "Cannot send {:?}: connection closed",
                packet.id()
            )));
        }

        let bytes = packet.encode();
        self.writer.lock().write_all(&bytes)?;

        let mut stats = self.stats.lock();
        stats.bytes_sent += bytes.len() as u64;
        stats.packets_sent += 1;
        tracing::trace!("Sent {:?} ({} bytes)", packet.id(), bytes.len());
        Ok(())
    }

    /// Close the connection and wait for the reader thread
    ///
    /// Safe to call any number of times.
    ///
    /// # Returns
    /// `true` if this call performed the local close, `false` if the
    /// connection was already closed locally or by the remote side.
    pub fn disconnect(&self) -> bool {
        let first = !self.closed.swap(true, Ordering::SeqCst);
        if first {
            tracing::info!("Disconnecting from {}", self.peer_addr);
            if let Err(e) = self.writer.lock().shutdown(Shutdown::Both) {
                // Already torn down underneath us; the reader is exiting anyway
                tracing::debug!("Socket shutdown failed: {}", e);
            }
        }

        if let Some(handle) = self.reader.lock().take() {
            if handle.join().is_err() {
                tracing::error!("Network reader thread panicked");
            }
        }
        first
    }

    /// Whether either side has closed the connection
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// Remote address
    pub fn peer_addr(&self) -> SocketAddr {
        self.peer_addr
    }

    /// Snapshot of the traffic counters
    pub fn stats(&self) -> ConnectionStats {
        *self.stats.lock()
    }
}

impl Drop for Connection {
    fn drop(&mut self) {
        self.disconnect();
    }
}

/// Turn `address[:port]` into a socket address
///
/// # Errors
/// - `InvalidHost` for an empty address
/// - `InvalidPort` for a port that is not a non-zero `u16`
/// - `UnresolvedHost` when name resolution yields nothing
pub fn resolve(host: &str, default_port: u16) -> std::result::Result<SocketAddr, ConnectError> {
    let host = host.trim();
    if host.is_empty() {
        return Err(ConnectError::InvalidHost);
    }

    // Bare IPv6 literals contain colons, so try the unambiguous forms first
    if let Ok(ip) = host.parse::<IpAddr>() {
        return Ok(SocketAddr::new(ip, default_port));
    }
    if let Ok(addr) = host.parse::<SocketAddr>() {
        if addr.port() == 0 {
            return Err(ConnectError::InvalidPort("0".into()));
        }
        return Ok(addr);
    }

    let (name, port) = match host.rsplit_once(':') {
        Some((name, port)) => {
            let port = port
                .parse::<u16>()
                .ok()
                .filter(|&p| p != 0)
                .ok_or_else(|| ConnectError::InvalidPort(port.to_string()))?;
            (name, port)
        }
        None => (host, default_port),
    };
    if name.is_empty() {
        return Err(ConnectError::InvalidHost);
    }

    (name, port)
        .to_socket_addrs()
        .map_err(|e| {
            tracing::debug!("Resolving {} failed: {}", name, e);
            ConnectError::UnresolvedHost(name.to_string())
        })?
        .next()
        .ok_or_else(|| ConnectError::UnresolvedHost(name.to_string()))
}

fn read_loop(
    mut stream: TcpStream,
    closed: Arc<AtomicBool>,
    inbound: InboundSender,
    stats: Arc<Mutex<ConnectionStats>>,
    chunk_size: usize,
) {
    let mut decoder = FrameDecoder::new();
    let mut chunk = vec![0u8; chunk_size];

    let cause = loop {
        match stream.read(&mut chunk) {
            Ok(0) => break DisconnectCause::Remote,
            Ok(n) => {
                decoder.extend(&chunk[..n]);
                let mut frames = 0u64;
                for frame in decoder.by_ref() {
                    frames += 1;
                    if !inbound.enqueue(frame.into()) {
                        tracing::debug!("Dispatch queue dropped, stopping reader");
                        return;
                    }
                }
                let mut stats = stats.lock();
                stats.bytes_received += n as u64;
                stats.frames_received += frames;
            }
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => break DisconnectCause::Error(describe(&e)),
        }
    };

    if closed.swap(true, Ordering::SeqCst) {
        tracing::debug!("Reader exiting after local disconnect");
        return;
    }

    match &cause {
        DisconnectCause::Remote => tracing::info!("Connection closed by server"),
        other => tracing::warn!("Connection lost: {:?}", other),
    }
    let _ = stream.shutdown(Shutdown::Both);
    if !inbound.enqueue(Inbound::Closed(cause)) {
        tracing::debug!("Dispatch queue dropped before close notification");
    }
}

fn describe(error: &io::Error) -> String {
    match error.kind() {
        ErrorKind::ConnectionReset => "Connection reset by server".to_string(),
        ErrorKind::ConnectionAborted => "Connection aborted".to_string(),
        _ => error.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queue::DispatchQueue;
    use shard_core::Serial;
    use std::net::TcpListener;
    use std::time::Duration;

    fn wait_for_pending(queue: &DispatchQueue, count: usize) {
        let deadline = Instant::now() + Duration::from_secs(5);
        while queue.pending() < count && Instant::now() < deadline {
            thread::sleep(Duration::from_millis(5));
        }
    }

    #[test]
    fn test_resolve_default_port() {
        let addr = resolve("127.0.0.1", 2590).unwrap();
        assert_eq!(addr, "127.0.0.1:2590".parse().unwrap());
    }

    #[test]
    fn test_resolve_explicit_port() {
        let addr = resolve("127.0.0.1:7775", 2590).unwrap();
        assert_eq!(addr.port(), 7775);
    }

    #[test]
    fn test_resolve_ipv6_literal() {
        let addr = resolve("::1", 2590).unwrap();
        assert_eq!(addr.port(), 2590);
    }

    #[test]
    fn test_resolve_errors() {
        assert!(matches!(resolve("", 2590), Err(ConnectError::InvalidHost)));
        assert!(matches!(resolve(":2590", 2590), Err(ConnectError::InvalidHost)));
        assert!(matches!(
            resolve("localhost:notaport", 2590),
            Err(ConnectError::InvalidPort(p)) if p == "notaport"
        ));
        assert!(matches!(
            resolve("localhost:70000", 2590),
            Err(ConnectError::InvalidPort(_))
        ));
        assert!(matches!(
            resolve("no-such-host.invalid", 2590),
            Err(ConnectError::UnresolvedHost(_))
        ));
    }

    #[test]
    fn test_connect_error_messages() {
        assert_eq!(ConnectError::InvalidPort("x".into()).to_string(), "Invalid port: x");
        assert_eq!(
            ConnectError::UnresolvedHost("nowhere".into()).to_string(),
            "Unknown host: nowhere"
        );
    }

    #[test]
    fn test_refused_connection_reports_io_error() {
        // Bind then drop to get a port nobody listens on
        let port = TcpListener::bind("127.0.0.1:0").unwrap().local_addr().unwrap().port();
        let queue = DispatchQueue::new();
        let result = Connection::open(
            &format!("127.0.0.1:{}", port),
            &NetworkConfig::default(),
            queue.sender(),
        );
        assert!(matches!(result, Err(ConnectError::Io(_))));
    }

    #[test]
    fn test_frames_reach_queue_and_remote_close_is_reported() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        let queue = DispatchQueue::new();

        let connection = Connection::open(
            &format!("127.0.0.1:{}", port),
            &NetworkConfig::default(),
            queue.sender(),
        )
        .unwrap();
        let (mut server, _) = listener.accept().unwrap();

        // Split a frame across two writes
        server.write_all(&[0x1B, 0x00, 0x00]).unwrap();
        server.flush().unwrap();
        thread::sleep(Duration::from_millis(20));
        server.write_all(&[0x00, 0x2A, 0x22, 0x00]).unwrap();
        drop(server);

        wait_for_pending(&queue, 3);
        let items: Vec<Inbound> = std::iter::from_fn(|| queue.pop()).collect();
        assert_eq!(
            items,
            vec![
                Inbound::Packet(Packet::InitPlayer { serial: Serial::new(0x2A) }),
                Inbound::Packet(Packet::AllowMove { sequence: 0 }),
                Inbound::Closed(DisconnectCause::Remote),
            ]
        );

        assert!(connection.is_closed());
        // Remote side already claimed the close
        assert!(!connection.disconnect());
        assert_eq!(connection.stats().bytes_received, 7);
    }

    #[test]
    fn test_local_disconnect_is_silent_and_idempotent() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        let queue = DispatchQueue::new();

        let connection = Connection::open(
            &format!("127.0.0.1:{}", port),
            &NetworkConfig::default(),
            queue.sender(),
        )
        .unwrap();
        let (mut server, _) = listener.accept().unwrap();

        connection.send(&Packet::SingleClick { serial: Serial::new(7) }).unwrap();
        let mut received = [0u8; 5];
        server.read_exact(&mut received).unwrap();
        assert_eq!(received, [0x09, 0x00, 0x00, 0x00, 0x07]);

        assert!(connection.disconnect());
        assert!(!connection.disconnect());
        assert_eq!(queue.pending(), 0);

        assert!(matches!(
            connection.send(&Packet::SingleClick { serial: Serial::new(7) }),
            Err(ClientError::Network(_))
        ));
        assert_eq!(connection.stats().packets_sent, 1);
    }
}
