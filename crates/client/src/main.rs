//! shardclient - headless shard client
//!
//! Connects, logs in with the configured account and keeps the world view in
//! sync until the server closes the connection.
//!
//! Usage: `shardclient [host[:port]]`

use shard_client::Session;
use shard_config::ClientConfig;
use shard_core::{Point3, Serial};
use shard_game::{ClientEvents, ConnectionState, FlatWorld, LoginFailure};
use shard_network::ConnectError;
use std::thread;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Writes every game event to the log
struct LogEvents;

impl ClientEvents for LogEvents {
    fn on_connected(&mut self) {
        info!("Connected");
    }

    fn on_connect_failed(&mut self, error: &ConnectError) {
        warn!("Could not connect: {}", error);
    }

    fn on_login_failed(&mut self, failure: LoginFailure) {
        warn!("Login failed: {}", failure);
    }

    fn on_speech(&mut self, speaker: Serial, name: &str, text: &str, _color: u32) {
        info!("{} ({}): {}", name, speaker, text);
    }

    fn on_see(&mut self, _speaker: Serial, name: &str, text: &str, _color: u32) {
        info!("*{} {}*", name, text);
    }

    fn on_system_message(&mut self, text: &str, _color: u32) {
        info!("[system] {}", text);
    }

    fn on_sound(&mut self, sound: u16, location: Point3) {
        tracing::debug!("Sound 0x{:04X} at {}", sound, location);
    }

    fn on_gump(&mut self, serial: Serial, gump: u16) {
        info!("Gump 0x{:04X} opened for {}", gump, serial);
    }

    fn on_network_error(&mut self, reason: &str) {
        warn!("Network error: {}", reason);
    }
}

fn main() -> anyhow::Result<()> {
    let (config, config_error) = match ClientConfig::load_default() {
        Ok(config) => (config, None),
        Err(e) => (ClientConfig::default(), Some(e)),
    };

    // Initialize tracing
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    if let Some(e) = config_error {
        warn!("Failed to load {}: {}", shard_config::DEFAULT_CONFIG_PATH, e);
        warn!("   Using default configuration");
    }
    config.display();

    let host = std::env::args().nth(1).unwrap_or_else(|| config.host.clone());
    let mut session = Session::from_config(&config, Box::new(FlatWorld::default()), Box::new(LogEvents));
    session
        .game_mut()
        .add_state_listener(|from, to| info!("State: {} -> {}", from, to));

    session.connect(&host)?;
    if config.username.is_empty() {
        warn!("No username configured; staying connected without logging in");
    } else {
        session.login(&config.username, &config.password)?;
    }

    let interval = config.tick_interval();
    while session.state() != ConnectionState::Disconnected {
        session.tick();
        thread::sleep(interval);
    }

    info!("Session ended");
    Ok(())
}
