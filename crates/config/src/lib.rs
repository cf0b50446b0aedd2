//! Shard Client Configuration Management
//!
//! Loads client settings from a `key = value` options file.

use shard_core::{ClientError, Result};
use shard_network::NetworkConfig;
use std::fs;
use std::path::Path;
use std::time::Duration;

/// Location of the options file used by [`ClientConfig::load_default`]
pub const DEFAULT_CONFIG_PATH: &str = "config/client.txt";

/// Complete client configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    // ========== Server ==========
    /// Server host name or address (from "host" option)
    pub host: String,
    /// Server port, used when `host` carries none (from "port" option, default: 2590)
    pub port: u16,

    // ========== Account ==========
    /// Character name to log in with (from "username" option)
    pub username: String,
    /// Password (from "password" option)
    pub password: String,

    // ========== World ==========
    /// Visibility range in tiles (from "update_range" option, default: 15)
    pub update_range: u32,

    // ========== Network ==========
    /// Connect timeout in milliseconds (from "connect_timeout_ms" option)
    pub connect_timeout_ms: u64,
    /// Socket read buffer size (from "read_buffer_size" option)
    pub read_buffer_size: usize,

    // ========== Runtime ==========
    /// Milliseconds between logic ticks (from "tick_ms" option)
    pub tick_ms: u64,
    /// Log filter used when RUST_LOG is unset (from "log_level" option)
    pub log_level: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".into(),
            port: 2590,
            username: String::new(),
            password: String::new(),
            update_range: 15,
            connect_timeout_ms: 5000,
            read_buffer_size: 4096,
            tick_ms: 50,
            log_level: "info".into(),
        }
    }
}

impl ClientConfig {
    /// Load configuration from an options file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .map_err(|e| ClientError::Config(format!("Cannot read {}: {}", path.display(), e)))?;
        Self::parse(&content)
    }

    /// Load configuration from [`DEFAULT_CONFIG_PATH`]
    pub fn load_default() -> Result<Self> {
        Self::load_from_file(DEFAULT_CONFIG_PATH)
    }

    /// Parse options file content
    ///
    /// Blank lines and `#` comments are skipped. Unknown keys are ignored and
    /// unparsable values fall back to their defaults.
    pub fn parse(content: &str) -> Result<Self> {
        let mut config = Self::default();

        for (number, line) in content.lines().enumerate() {
            let line = line.trim();

            // Skip comments and empty lines
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            match line.split_once('=') {
                Some((key, value)) => config.parse_option(key.trim(), value.trim()),
                None => tracing::debug!("Ignoring config line {}: {}", number + 1, line),
            }
        }

        if config.host.is_empty() {
            return Err(ClientError::Config("host must not be empty".into()));
        }
        Ok(config)
    }

    fn parse_option(&mut self, key: &str, value: &str) {
        match key {
            "host" => self.host = value.into(),
            "port" => {
                self.port = value.parse().ok().filter(|&port| port != 0).unwrap_or(2590);
            }
            "username" => self.username = value.into(),
            "password" => self.password = value.into(),
            "update_range" => {
                self.update_range = value.parse().unwrap_or(15);
            }
            "connect_timeout_ms" => {
                self.connect_timeout_ms = value.parse().unwrap_or(5000);
            }
            "read_buffer_size" => {
                self.read_buffer_size = value.parse().unwrap_or(4096);
            }
            "tick_ms" => {
                self.tick_ms = value.parse().ok().filter(|&ms| ms > 0).unwrap_or(50);
            }
            "log_level" => self.log_level = value.to_lowercase(),
            _ => {
                tracing::debug!("Unknown config option: {} = {}", key, value);
            }
        }
    }

    /// Settings for the network layer
    pub fn network_config(&self) -> NetworkConfig {
        NetworkConfig {
            default_port: self.port,
            connect_timeout: Duration::from_millis(self.connect_timeout_ms),
            read_buffer_size: self.read_buffer_size,
            ..Default::default()
        }
    }

    /// Time between logic ticks
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_ms)
    }

    /// Display configuration summary
    pub fn display(&self) {
        tracing::info!("Client Configuration:");
        tracing::info!("    Server: {} (default port {})", self.host, self.port);
        if self.username.is_empty() {
            tracing::info!("    Account: (none)");
        } else {
            tracing::info!("    Account: {}", self.username);
        }
        tracing::info!("    Update Range: {} tiles", self.update_range);
        tracing::info!("    Connect Timeout: {} ms", self.connect_timeout_ms);
        tracing::info!("    Read Buffer: {} bytes", self.read_buffer_size);
        tracing::info!("    Tick: {} ms", self.tick_ms);
    }
}
