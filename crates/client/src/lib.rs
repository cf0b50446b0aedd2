//! # Shard Client Session
//!
//! [`Session`] ties the layers together for the thread that runs the game
//! loop:
//!
//! ```text
//! Connection ──reader thread──▶ DispatchQueue ──tick()──▶ HandlerRegistry ──▶ GameState
//!     ▲                                                                        │
//!     └──────────────────────────── flush() ◀── outbox ◀──────────────────────┘
//! ```
//!
//! Every method runs on the calling thread. The only other thread is the
//! connection's reader, which never touches the game state.

use shard_config::ClientConfig;
use shard_core::{Direction, Result, Serial};
use shard_game::{
    default_registry, ClientEvents, ConnectionState, GameState, MoveOutcome, MoveRejection, WorldData,
};
use shard_network::{
    Connection, ConnectError, ConnectionStats, DisconnectCause, DispatchQueue, DispatchReport, HandlerRegistry,
    NetworkConfig,
};

/// A client session: one connection at a time and the world it describes
pub struct Session {
    network: NetworkConfig,
    queue: DispatchQueue,
    handlers: HandlerRegistry<GameState>,
    game: GameState,
    connection: Option<Connection>,
}

impl Session {
    pub fn new(network: NetworkConfig, world: Box<dyn WorldData>, events: Box<dyn ClientEvents>) -> Self {
        Self {
            network,
            queue: DispatchQueue::new(),
            handlers: default_registry(),
            game: GameState::new(world, events),
            connection: None,
        }
    }

    /// Session using the network settings and update range from `config`
    pub fn from_config(config: &ClientConfig, world: Box<dyn WorldData>, events: Box<dyn ClientEvents>) -> Self {
        let mut session = Self::new(config.network_config(), world, events);
        session.game.set_update_range(config.update_range);
        session
    }

    /// Open a connection to `host` (`name[:port]`)
    ///
    /// An existing connection is closed first. On failure the events sink
    /// hears about it once and the error is returned.
    pub fn connect(&mut self, host: &str) -> std::result::Result<(), ConnectError> {
        if self.connection.is_some() {
            tracing::debug!("Replacing existing connection");
            self.disconnect();
        }

        match Connection::open(host, &self.network, self.queue.sender()) {
            Ok(connection) => {
                self.connection = Some(connection);
                self.game.on_connect();
                Ok(())
            }
            Err(e) => {
                self.game.on_connect_failed(&e);
                Err(e)
            }
        }
    }

    /// Close the connection
    ///
    /// Anything still queued from the old connection is dropped unprocessed.
    /// If the server or the socket had already closed it, the queued close
    /// notification is reported instead of a local close, so a network error
    /// still reaches the events sink.
    ///
    /// # Returns
    /// `false` if there was nothing to disconnect.
    pub fn disconnect(&mut self) -> bool {
        let Some(connection) = self.connection.take() else {
            return false;
        };
        let cause = if connection.disconnect() {
            let dropped = self.queue.clear();
            if dropped > 0 {
                tracing::debug!("Dropped {} queued items on disconnect", dropped);
            }
            DisconnectCause::Local
        } else {
            self.queue.take_closed().unwrap_or(DisconnectCause::Remote)
        };
        self.game.on_disconnect(cause);
        true
    }

    /// Dispatch everything received since the last tick and send the replies
    pub fn tick(&mut self) -> DispatchReport {
        let report = self.queue.drain_and_dispatch(&self.handlers, &mut self.game);

        if self.game.state() == ConnectionState::Disconnected {
            if let Some(connection) = self.connection.take() {
                // Closed by the server or the socket; reap the reader thread
                connection.disconnect();
            }
        }

        self.flush();
        report
    }

    /// Write the game state's outgoing packets to the connection
    pub fn flush(&mut self) {
        let packets = self.game.take_outbound();
        if packets.is_empty() {
            return;
        }
        let Some(connection) = &self.connection else {
            tracing::debug!("Dropping {} outbound packets: not connected", packets.len());
            return;
        };

        let failure = packets.iter().find_map(|packet| connection.send(packet).err());
        if let Some(e) = failure {
            tracing::warn!("Send failed: {}", e);
            self.fail(e.to_string());
        }
    }

    fn fail(&mut self, reason: String) {
        if let Some(connection) = self.connection.take() {
            connection.disconnect();
        }
        self.queue.clear();
        self.game.on_disconnect(DisconnectCause::Error(reason));
    }

    //=== Outbound operations ===//

    pub fn login(&mut self, name: &str, password: &str) -> Result<()> {
        self.game.login(name, password)?;
        self.flush();
        Ok(())
    }

    pub fn request_move(&mut self, direction: Direction) -> std::result::Result<MoveOutcome, MoveRejection> {
        let outcome = self.game.request_move(direction);
        self.flush();
        outcome
    }

    pub fn send_text(&mut self, text: &str) -> Result<()> {
        self.game.send_text(text)?;
        self.flush();
        Ok(())
    }

    pub fn query_single_click(&mut self, serial: Serial) -> Result<()> {
        self.game.query_single_click(serial)?;
        self.flush();
        Ok(())
    }

    pub fn double_click(&mut self, serial: Serial) -> Result<()> {
        self.game.double_click(serial)?;
        self.flush();
        Ok(())
    }

    pub fn toggle_war_mode(&mut self) -> Result<bool> {
        let enabled = self.game.toggle_war_mode()?;
        self.flush();
        Ok(enabled)
    }

    //=== Accessors ===//

    pub fn state(&self) -> ConnectionState {
        self.game.state()
    }

    pub fn game(&self) -> &GameState {
        &self.game
    }

    pub fn game_mut(&mut self) -> &mut GameState {
        &mut self.game
    }

    /// Number of inbound items waiting for the next tick
    pub fn pending(&self) -> usize {
        self.queue.pending()
    }

    /// Traffic counters of the current connection
    pub fn stats(&self) -> Option<ConnectionStats> {
        self.connection.as_ref().map(Connection::stats)
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        if let Some(connection) = self.connection.take() {
            connection.disconnect();
        }
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("game", &self.game)
            .field("pending", &self.pending())
            .field("peer", &self.connection.as_ref().map(Connection::peer_addr))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shard_game::{FlatWorld, NoEvents};
    use std::cell::RefCell;
    use std::net::TcpListener;
    use std::rc::Rc;

    fn session() -> Session {
        Session::new(NetworkConfig::default(), Box::new(FlatWorld::default()), Box::new(NoEvents))
    }

    #[test]
    fn test_operations_require_connection() {
        let mut session = session();
        assert!(session.login("guest", "pw").is_err());
        assert!(session.send_text("hello").is_err());
        assert_eq!(session.request_move(Direction::North), Err(MoveRejection::NotLoggedIn));
        assert!(!session.disconnect());
    }

    #[test]
    fn test_connect_failure_reported_once() {
        struct Failures(Rc<RefCell<usize>>);
        impl ClientEvents for Failures {
            fn on_connect_failed(&mut self, _: &ConnectError) {
                *self.0.borrow_mut() += 1;
            }
        }

        let count = Rc::new(RefCell::new(0));
        let mut session = Session::new(
            NetworkConfig::default(),
            Box::new(FlatWorld::default()),
            Box::new(Failures(Rc::clone(&count))),
        );
        let port = TcpListener::bind("127.0.0.1:0").unwrap().local_addr().unwrap().port();

        assert!(session.connect(&format!("127.0.0.1:{}", port)).is_err());
        assert!(matches!(session.connect("127.0.0.1:0"), Err(ConnectError::InvalidPort(_))));
        assert_eq!(*count.borrow(), 2);
        assert_eq!(session.state(), ConnectionState::Disconnected);
    }

    #[test]
    fn test_from_config_applies_update_range() {
        let config = ClientConfig {
            update_range: 20,
            ..Default::default()
        };
        let session = Session::from_config(&config, Box::new(FlatWorld::default()), Box::new(NoEvents));
        assert_eq!(session.game().update_range(), 20);
    }
}
