//! # Movement Sequencing
//!
//! Every turn or step the client sends carries an 8-bit sequence number. The
//! server answers each with an allow (carrying the sequence it accepted) or a
//! deny (carrying the authoritative position). The client applies moves
//! optimistically and throttles itself two ways:
//!
//! - at most [`MAX_UNACKED_MOVES`] requests may be in flight
//! - consecutive requests are at least [`MOVE_DELAY`] apart
//!
//! Counters wrap from 255 to 0; the in-flight count is the wrapping
//! difference between the next sequence and the last acknowledged one.

use std::time::{Duration, Instant};

/// Size of the acknowledgement window
pub const MAX_UNACKED_MOVES: u8 = 3;

/// Minimum time between two move or turn requests
pub const MOVE_DELAY: Duration = Duration::from_millis(150);

/// Why a move request was not sent
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveRejection {
    #[error("Moving too fast")]
    RateLimited,

    #[error("Waiting for move acknowledgements")]
    AwaitingAcks,

    #[error("Destination is blocked")]
    Blocked,

    #[error("Not logged in")]
    NotLoggedIn,
}

/// Sequence counters for move requests
#[derive(Debug, Clone, Default)]
pub struct MovementSequencer {
    next: u8,
    last_acked: u8,
    last_move: Option<Instant>,
}

impl MovementSequencer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sequence number the next request will carry
    pub fn next_sequence(&self) -> u8 {
        self.next
    }

    pub fn last_acked(&self) -> u8 {
        self.last_acked
    }

    /// Requests sent but not yet acknowledged
    pub fn in_flight(&self) -> u8 {
        self.next.wrapping_sub(self.last_acked)
    }

    /// Whether a request may be issued at `now`
    pub fn check(&self, now: Instant) -> Result<(), MoveRejection> {
        if let Some(last) = self.last_move {
            if now.saturating_duration_since(last) < MOVE_DELAY {
                return Err(MoveRejection::RateLimited);
            }
        }
        if self.in_flight() >= MAX_UNACKED_MOVES {
            tracing::trace!(
                "Disallowing move due to missing acks, want seq {}, last ack {}",
                self.next,
                self.last_acked
            );
            return Err(MoveRejection::AwaitingAcks);
        }
        Ok(())
    }

    /// Consume a sequence number for a request sent at `now`
    ///
    /// Callers check first; this does not.
    pub fn issue(&mut self, now: Instant) -> u8 {
        let sequence = self.next;
        self.next = self.next.wrapping_add(1);
        self.last_move = Some(now);
        sequence
    }

    /// The server accepted `sequence`
    pub fn on_allow(&mut self, sequence: u8) {
        self.last_acked = sequence;
    }

    /// The server refused a request; start over from zero
    pub fn on_deny(&mut self) {
        self.next = 0;
        self.last_acked = 0;
    }
}
