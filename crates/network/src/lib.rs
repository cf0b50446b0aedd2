//! # Shard Networking Layer
//!
//! This crate moves packets between the socket and the game-logic thread.
//!
//! ## Modules
//!
//! - [`config`] - Connection configuration options
//! - [`connection`] - Socket ownership and the blocking reader thread
//! - [`queue`] - Cross-thread hand-off of decoded frames
//! - [`handlers`] - Packet handler registry
//! - [`error`] - Connect, disconnect and dispatch outcomes

pub mod config;
pub mod connection;
pub mod error;
pub mod handlers;
pub mod queue;

// Re-export commonly used items
pub use config::NetworkConfig;
pub use connection::{resolve, Connection, ConnectionStats};
pub use error::{ConnectError, DisconnectCause, DispatchError};
pub use handlers::HandlerRegistry;
pub use queue::{DispatchContext, DispatchQueue, DispatchReport, Inbound, InboundSender};
