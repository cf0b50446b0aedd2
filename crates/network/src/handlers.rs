//! # Packet Handler System
//!
//! This module provides type-safe packet routing and handling.
//!
//! # Architecture
//!
//! ## Handler Registry
//!
//! The handler registry maintains a mapping from packet identifiers to handler
//! functions. Each handler receives mutable access to a context value owned by
//! the thread that drains the dispatch queue, so handlers never run
//! concurrently with each other and need no locking of their own.
//!
//! # Performance
//!
//! - O(1) packet dispatch via direct HashMap lookup
//! - Handler functions are boxed once at registration
//!
//! # Failure Isolation
//!
//! A handler that returns an error or panics affects only its own packet.
//! [`HandlerRegistry::dispatch`] reports the failure and the caller moves on
//! to the next queued packet.
//!
//! # Example
//!
//! ```
//! use shard_network::HandlerRegistry;
//! use shard_protocol::{Packet, PacketId};
//!
//! let mut registry: HandlerRegistry<Vec<u8>> = HandlerRegistry::new();
//!
//! registry.register_function(PacketId::AllowMove, |acks, packet| {
//!     if let Packet::AllowMove { sequence } = packet {
//!         acks.push(*sequence);
//!     }
//!     Ok(())
//! });
//!
//! let mut acks = Vec::new();
//! registry.dispatch(&mut acks, &Packet::AllowMove { sequence: 7 }).unwrap();
//! assert_eq!(acks, vec![7]);
//! ```

use crate::error::DispatchError;
use shard_protocol::{Packet, PacketId};
use std::any::Any;
use std::collections::HashMap;
use std::panic::{self, AssertUnwindSafe};

/// Type for packet handler functions
///
/// # Purpose
/// Synchronous function that applies a packet to the context and returns a Result.
pub type HandlerFunction<C> = Box<dyn Fn(&mut C, &Packet) -> shard_core::Result<()> + Send + Sync>;

/// Registry of packet handlers
///
/// # Purpose
/// Maintains a mapping from packet identifiers to handler functions.
/// Provides O(1) lookup and dispatch.
///
/// # Type Parameters
/// - `C` - The state handlers operate on
pub struct HandlerRegistry<C> {
    /// Map from packet identifier to handler function
    handlers: HashMap<PacketId, HandlerFunction<C>>,
}

impl<C> HandlerRegistry<C> {
    /// Create a new handler registry
    ///
    /// # Returns
    /// An empty registry ready for handler registration
    #[inline]
    pub fn new() -> Self {
        Self {
            handlers: HashMap::new(),
        }
    }

    /// Register a function-based handler
    ///
    /// # Arguments
    /// * `packet_id` - The packet identifier to handle
    /// * `handler` - Function to call for packets with this identifier
    ///
    /// Registering a second handler for the same identifier replaces the first.
    pub fn register_function<F>(&mut self, packet_id: PacketId, handler: F)
    where
        F: Fn(&mut C, &Packet) -> shard_core::Result<()> + Send + Sync + 'static,
    {
        tracing::debug!("Registered handler for packet type: {:?}", packet_id);
        if self.handlers.insert(packet_id, Box::new(handler)).is_some() {
            tracing::debug!("Replaced previous handler for {:?}", packet_id);
        }
    }

    /// Dispatch a packet to its registered handler
    ///
    /// # Arguments
    /// * `context` - State the handler applies the packet to
    /// * `packet` - The packet to dispatch
    ///
    /// # Returns
    /// - `Ok(())` - Packet handled successfully
    /// - `Err(e)` - Handler error, handler panic, or no handler registered
    ///
    /// # Errors
    /// Returns an error if:
    /// - No handler is registered for this packet identifier
    /// - The handler itself returns an error
    /// - The handler panics; the panic is caught and does not unwind further
    pub fn dispatch(&self, context: &mut C, packet: &Packet) -> Result<(), DispatchError> {
        let id = packet.id();
        let handler = self.handlers.get(&id).ok_or(DispatchError::NoHandler(id))?;

        match panic::catch_unwind(AssertUnwindSafe(|| handler(context, packet))) {
            Ok(Ok(())) => Ok(()),
            Ok(Err(source)) => Err(DispatchError::Handler { id, source }),
            Err(payload) => Err(DispatchError::Panicked {
                id,
                message: panic_message(payload.as_ref()),
            }),
        }
    }

    /// Check if a handler is registered for a packet identifier
    ///
    /// # Arguments
    /// * `packet_id` - The packet identifier to check
    ///
    /// # Returns
    /// `true` if a handler is registered, `false` otherwise
    pub fn has_handler(&self, packet_id: PacketId) -> bool {
        self.handlers.contains_key(&packet_id)
    }

    /// Get the number of registered handlers
    pub fn handler_count(&self) -> usize {
        self.handlers.len()
    }
}

impl<C> Default for HandlerRegistry<C> {
    fn default() -> Self {
        Self::new()
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shard_core::{ClientError, Serial};

    #[test]
    fn test_registry_register() {
        let mut registry: HandlerRegistry<u32> = HandlerRegistry::new();

        registry.register_function(PacketId::AllowMove, |_, _| Ok(()));

        assert!(registry.has_handler(PacketId::AllowMove));
        assert!(!registry.has_handler(PacketId::DenyMove));
        assert_eq!(registry.handler_count(), 1);
    }

    #[test]
    fn test_registry_dispatch() {
        let mut registry: HandlerRegistry<u32> = HandlerRegistry::new();

        registry.register_function(PacketId::AllowMove, |count, _| {
            *count += 1;
            Ok(())
        });

        let mut count = 0;
        let packet = Packet::AllowMove { sequence: 1 };
        assert!(registry.dispatch(&mut count, &packet).is_ok());
        assert!(registry.dispatch(&mut count, &packet).is_ok());
        assert_eq!(count, 2);
    }

    #[test]
    fn test_registry_no_handler() {
        let registry: HandlerRegistry<()> = HandlerRegistry::new();

        let packet = Packet::InitPlayer { serial: Serial::new(1) };
        let result = registry.dispatch(&mut (), &packet);
        assert!(matches!(result, Err(DispatchError::NoHandler(PacketId::InitPlayer))));
    }

    #[test]
    fn test_registry_handler_error() {
        let mut registry: HandlerRegistry<()> = HandlerRegistry::new();
        registry.register_function(PacketId::RemoveObject, |_, _| {
            Err(ClientError::NotFound("object".into()))
        });

        let packet = Packet::RemoveObject { serial: Serial::new(9) };
        match registry.dispatch(&mut (), &packet) {
            Err(DispatchError::Handler { id, source }) => {
                assert_eq!(id, PacketId::RemoveObject);
                assert!(matches!(source, ClientError::NotFound(_)));
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_registry_handler_panic_is_contained() {
        let mut registry: HandlerRegistry<u32> = HandlerRegistry::new();
        registry.register_function(PacketId::Sound, |_, _| panic!("bad sound"));
        registry.register_function(PacketId::AllowMove, |count, _| {
            *count += 1;
            Ok(())
        });

        let mut count = 0;
        let sound = Packet::Sound {
            sound: 1,
            location: Default::default(),
        };
        match registry.dispatch(&mut count, &sound) {
            Err(DispatchError::Panicked { id, message }) => {
                assert_eq!(id, PacketId::Sound);
                assert_eq!(message, "bad sound");
            }
            other => panic!("unexpected result: {:?}", other),
        }

        // Registry stays usable afterwards
        assert!(registry.dispatch(&mut count, &Packet::AllowMove { sequence: 0 }).is_ok());
        assert_eq!(count, 1);
    }
}
