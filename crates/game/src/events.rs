//! Notifications from the game core to the presentation layer

use shard_core::{Point3, Serial};
use shard_network::ConnectError;
use shard_protocol::LoginErrorReason;
use std::fmt;

/// Why the server refused a login
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginFailure {
    BadPassword,
    CharacterNotFound,
    Unknown(u8),
}

impl From<LoginErrorReason> for LoginFailure {
    fn from(reason: LoginErrorReason) -> Self {
        match reason {
            LoginErrorReason::BadPassword => LoginFailure::BadPassword,
            LoginErrorReason::CharacterNotFound => LoginFailure::CharacterNotFound,
            LoginErrorReason::Other(code) => LoginFailure::Unknown(code),
        }
    }
}

impl fmt::Display for LoginFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoginFailure::BadPassword => write!(f, "Invalid Password"),
            LoginFailure::CharacterNotFound => write!(f, "Character not found"),
            LoginFailure::Unknown(_) => write!(f, "Unknown reason"),
        }
    }
}

/// Callbacks into the presentation layer
///
/// All methods run on the thread that drives the session and default to
/// doing nothing, so implementors only override what they display.
/// Connection state changes are delivered through state listeners instead.
#[allow(unused_variables)]
pub trait ClientEvents {
    fn on_connected(&mut self) {}

    fn on_connect_failed(&mut self, error: &ConnectError) {}

    fn on_login_failed(&mut self, failure: LoginFailure) {}

    /// Spoken text from a mobile or item
    fn on_speech(&mut self, speaker: Serial, name: &str, text: &str, color: u32) {}

    /// Emote-style text describing what a speaker does
    fn on_see(&mut self, speaker: Serial, name: &str, text: &str, color: u32) {}

    fn on_system_message(&mut self, text: &str, color: u32) {}

    fn on_sound(&mut self, sound: u16, location: Point3) {}

    fn on_gump(&mut self, serial: Serial, gump: u16) {}

    /// The connection failed after it was established
    fn on_network_error(&mut self, reason: &str) {}
}

/// Events sink that ignores everything
#[derive(Debug, Default, Clone, Copy)]
pub struct NoEvents;

impl ClientEvents for NoEvents {}
