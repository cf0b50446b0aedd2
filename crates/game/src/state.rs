//! # Connection State Machine
//!
//! ```text
//!                 connect            first location
//! Disconnected ───────────▶ Connected ───────────────▶ LoggedIn
//!      ▲                        │                         │
//!      └────────────────────────┴──── disconnect ─────────┘
//! ```
//!
//! Listeners are called synchronously, in registration order, on the thread
//! that performs the transition.

use std::fmt;

/// Session lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ConnectionState {
    #[default]
    Disconnected,
    Connected,
    LoggedIn,
}

impl ConnectionState {
    /// Whether moving from `self` to `to` is a legal transition
    pub fn can_transition_to(self, to: ConnectionState) -> bool {
        use ConnectionState::*;
        matches!(
            (self, to),
            (Disconnected, Connected) | (Connected, LoggedIn) | (Connected, Disconnected) | (LoggedIn, Disconnected)
        )
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConnectionState::Disconnected => write!(f, "disconnected"),
            ConnectionState::Connected => write!(f, "connected"),
            ConnectionState::LoggedIn => write!(f, "logged in"),
        }
    }
}

/// Handle returned by [`StateMachine::add_listener`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

/// Called with `(previous, current)` after every transition
pub type StateListener = Box<dyn FnMut(ConnectionState, ConnectionState)>;

/// Current connection state plus its observers
pub struct StateMachine {
    state: ConnectionState,
    listeners: Vec<(ListenerId, StateListener)>,
    next_listener: u64,
}

impl StateMachine {
    pub fn new() -> Self {
        Self {
            state: ConnectionState::Disconnected,
            listeners: Vec::new(),
            next_listener: 0,
        }
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn add_listener(&mut self, listener: impl FnMut(ConnectionState, ConnectionState) + 'static) -> ListenerId {
        let id = ListenerId(self.next_listener);
        self.next_listener += 1;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    /// # Returns
    /// `false` if no listener had this id
    pub fn remove_listener(&mut self, id: ListenerId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(listener_id, _)| *listener_id != id);
        self.listeners.len() != before
    }

    /// Move to `to` and notify listeners
    ///
    /// # Returns
    /// `true` if the state changed. Re-entering the current state and illegal
    /// transitions change nothing and notify nobody.
    pub fn transition(&mut self, to: ConnectionState) -> bool {
        let from = self.state;
        if from == to {
            return false;
        }
        if !from.can_transition_to(to) {
            tracing::debug!("Refusing state transition {} -> {}", from, to);
            return false;
        }

        self.state = to;
        tracing::info!("Connection state: {} -> {}", from, to);
        for (_, listener) in self.listeners.iter_mut() {
            listener(from, to);
        }
        true
    }
}

impl Default for StateMachine {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for StateMachine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StateMachine")
            .field("state", &self.state)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}
