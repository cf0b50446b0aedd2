//! # Network Configuration
//!
//! Configuration options for the client networking layer.
//!
//! # Example
//!
//! ```rust
//! use shard_network::NetworkConfig;
//! use std::time::Duration;
//!
//! let config = NetworkConfig {
//!     default_port: 2590,
//!     connect_timeout: Duration::from_secs(3),
//!     ..Default::default()
//! };
//! ```

use std::time::Duration;

/// Network configuration options
///
/// # Default Values
///
/// - Port 2590 when the host string carries none
/// - 5-second connect timeout
/// - 4KB read chunks
/// - Nagle's algorithm disabled (movement requests are tiny and latency bound)
#[derive(Debug, Clone)]
pub struct NetworkConfig {
    /// Port used when the host string has no `:port` suffix
    ///
    /// # Default
    /// `2590`
    pub default_port: u16,

    /// Upper bound for establishing the TCP connection
    ///
    /// # Purpose
    /// `connect` runs on the caller's thread; an unreachable server must not
    /// stall the game loop forever.
    ///
    /// # Default
    /// 5 seconds
    pub connect_timeout: Duration,

    /// Size of each blocking read on the network thread
    ///
    /// # Default
    /// 4096 bytes
    ///
    /// # Notes
    /// - Frames larger than this are assembled across reads
    /// - Values below 64 are raised to 64
    pub read_buffer_size: usize,

    /// Set `TCP_NODELAY` on the socket
    ///
    /// # Default
    /// `true`
    pub nodelay: bool,
}

impl NetworkConfig {
    /// Read chunk size with the lower bound applied
    pub fn effective_read_buffer(&self) -> usize {
        self.read_buffer_size.max(64)
    }
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            default_port: 2590,
            connect_timeout: Duration::from_secs(5),
            read_buffer_size: 4096,
            nodelay: true,
        }
    }
}
