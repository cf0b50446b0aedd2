//! # Game State
//!
//! The single owner of everything the client believes about the world.
//!
//! `GameState` lives on the game-logic thread. Packet handlers and the
//! session's outbound operations are its only callers, so none of its parts
//! need locking. Packets it wants sent are collected in an outbox that the
//! session flushes to the connection.
//!
//! # Player
//!
//! Once logged in, the player's mobile is an ordinary entry in the object
//! registry; [`Player`] only remembers which serial it is and the war-mode
//! flag.

use crate::events::{ClientEvents, LoginFailure};
use crate::movement::{MoveRejection, MovementSequencer};
use crate::object::{Placement, WorldObject};
use crate::registry::ObjectRegistry;
use crate::state::{ConnectionState, ListenerId, StateMachine};
use crate::world::{MapObject, StaticObject, WorldData};
use shard_core::{ClientError, Direction, Layer, Point2, Point3, Result, Serial};
use shard_network::{ConnectError, DispatchContext, DisconnectCause};
use shard_protocol::{ContainerItem, LoginErrorReason, Packet, SpeechMode, LOGIN_BY_NAME};
use std::time::Instant;

/// Default visibility range in tiles
pub const DEFAULT_UPDATE_RANGE: u32 = 15;

/// Color used for the player's own speech
const SPEECH_COLOR: u32 = 0x0000FF;

/// The logged-in character
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Player {
    pub serial: Serial,
    pub war_mode: bool,
}

/// Result of an accepted move request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveOutcome {
    /// Facing changed, position did not
    Turned(Direction),

    /// Position changed (optimistically, until the server answers)
    Moved(Point3),
}

#[derive(Debug, Clone)]
struct Credentials {
    name: String,
    password: String,
}

/// Client-side world model and its reconciliation logic
pub struct GameState {
    machine: StateMachine,
    registry: ObjectRegistry,
    movement: MovementSequencer,
    player: Option<Player>,

    /// Serial announced by init-player, waiting for the first location packet
    pending_player: Option<Serial>,
    credentials: Option<Credentials>,
    update_range: u32,
    outbox: Vec<Packet>,
    world: Box<dyn WorldData>,
    events: Box<dyn ClientEvents>,
}

impl GameState {
    pub fn new(world: Box<dyn WorldData>, events: Box<dyn ClientEvents>) -> Self {
        tracing::debug!("Game state initialized");
        Self {
            machine: StateMachine::new(),
            registry: ObjectRegistry::new(),
            movement: MovementSequencer::new(),
            player: None,
            pending_player: None,
            credentials: None,
            update_range: DEFAULT_UPDATE_RANGE,
            outbox: Vec::new(),
            world,
            events,
        }
    }

    //=== Lifecycle ===//

    pub fn state(&self) -> ConnectionState {
        self.machine.state()
    }

    pub fn add_state_listener(
        &mut self,
        listener: impl FnMut(ConnectionState, ConnectionState) + 'static,
    ) -> ListenerId {
        self.machine.add_listener(listener)
    }

    pub fn remove_state_listener(&mut self, id: ListenerId) -> bool {
        self.machine.remove_listener(id)
    }

    /// The connection is up
    pub fn on_connect(&mut self) {
        if self.machine.transition(ConnectionState::Connected) {
            self.events.on_connected();
        }
    }

    /// Opening the connection failed
    pub fn on_connect_failed(&mut self, error: &ConnectError) {
        tracing::warn!("Connect failed: {}", error);
        self.events.on_connect_failed(error);
    }

    /// The connection is gone
    ///
    /// Forgets the player and every tracked object. Calling this again while
    /// already disconnected does nothing.
    ///
    /// # Returns
    /// `true` if this call performed the transition.
    pub fn on_disconnect(&mut self, cause: DisconnectCause) -> bool {
        if self.state() == ConnectionState::Disconnected {
            return false;
        }

        if let DisconnectCause::Error(reason) = &cause {
            self.events.on_network_error(reason);
        }
        tracing::info!("Disconnected: {:?}", cause);

        self.player = None;
        self.pending_player = None;
        self.registry.clear();
        self.outbox.clear();
        self.machine.transition(ConnectionState::Disconnected)
    }

    /// Send a login request with `name` and `password`
    ///
    /// # Errors
    /// `InvalidState` unless connected and not yet logged in.
    pub fn login(&mut self, name: &str, password: &str) -> Result<()> {
        if self.state() != ConnectionState::Connected {
            return Err(ClientError::InvalidState(format!("Cannot log in while {}", self.state())));
        }
        self.credentials = Some(Credentials {
            name: name.to_string(),
            password: password.to_string(),
        });
        self.try_login();
        Ok(())
    }

    fn try_login(&mut self) {
        let Some(credentials) = &self.credentials else {
            return;
        };
        tracing::info!("Logging in as {}", credentials.name);
        self.outbox.push(Packet::LoginRequest {
            seed: LOGIN_BY_NAME,
            serial: LOGIN_BY_NAME,
            name: credentials.name.clone(),
            password: credentials.password.clone(),
        });
    }

    /// The server refused the login
    pub fn on_login_error(&mut self, reason: LoginErrorReason) {
        let failure = LoginFailure::from(reason);
        tracing::warn!("Login failed: {}", failure);
        self.events.on_login_failed(failure);
    }

    /// The server announced the player's serial
    pub fn on_init_player(&mut self, serial: Serial) {
        tracing::debug!("Player serial is {}", serial);
        self.pending_player = Some(serial);
    }

    /// Player appearance and position
    ///
    /// The first one after connecting completes the login. Later ones must
    /// name the player's serial; others are ignored.
    pub fn on_location(&mut self, serial: Serial, graphic: u16, location: Point3, facing: Direction, hue: u16) {
        match self.player {
            None => {
                let serial = self.pending_player.take().unwrap_or_else(|| {
                    tracing::debug!("Location packet before init-player, using serial {}", serial);
                    serial
                });
                let mut object = WorldObject::mobile(serial, graphic)
                    .with_location(location)
                    .with_hue(hue);
                if let Some(mobile) = object.as_mobile_mut() {
                    mobile.facing = facing;
                }
                self.registry.upsert(object);
                self.player = Some(Player {
                    serial,
                    war_mode: false,
                });
                tracing::info!("Logged in as {} at {}", serial, location);
                self.machine.transition(ConnectionState::LoggedIn);
                self.remove_out_of_range();
            }
            Some(player) if player.serial != serial => {
                tracing::debug!("Location packet for non-player object {}", serial);
            }
            Some(player) => {
                self.registry.update(player.serial, |object| {
                    object.graphic = graphic;
                    object.hue = hue;
                    object.location = location;
                    if let Some(mobile) = object.as_mobile_mut() {
                        mobile.facing = facing;
                    }
                });
                self.remove_out_of_range();
            }
        }
    }

    //=== Movement ===//

    /// Ask to turn towards or step in `direction`
    pub fn request_move(&mut self, direction: Direction) -> std::result::Result<MoveOutcome, MoveRejection> {
        self.request_move_at(direction, Instant::now())
    }

    /// [`request_move`](Self::request_move) with an explicit clock
    ///
    /// Facing a different way than `direction` turns in place. Otherwise the
    /// destination comes from the world data; the player is moved there
    /// straight away and corrected later if the server denies the step.
    pub fn request_move_at(
        &mut self,
        direction: Direction,
        now: Instant,
    ) -> std::result::Result<MoveOutcome, MoveRejection> {
        let (serial, origin, facing) = self.player_pose().ok_or(MoveRejection::NotLoggedIn)?;
        self.movement.check(now)?;

        if facing != direction {
            let sequence = self.movement.issue(now);
            self.outbox.push(Packet::MoveRequest {
                direction,
                running: false,
                sequence,
            });
            self.registry.update(serial, |object| {
                if let Some(mobile) = object.as_mobile_mut() {
                    mobile.facing = direction;
                }
            });
            return Ok(MoveOutcome::Turned(direction));
        }

        let destination = {
            let registry = &self.registry;
            let world = &self.world;
            let probe = |point: Point2| obstacles_at(registry, world.as_ref(), point);
            world.elevated_destination(origin, direction, &probe)
        };
        let Some(destination) = destination else {
            tracing::trace!("Move {:?} from {} blocked", direction, origin);
            return Err(MoveRejection::Blocked);
        };

        let sequence = self.movement.issue(now);
        self.outbox.push(Packet::MoveRequest {
            direction,
            running: false,
            sequence,
        });
        self.registry.update(serial, |object| object.location = destination);
        self.remove_out_of_range();
        Ok(MoveOutcome::Moved(destination))
    }

    /// The server accepted move `sequence`
    pub fn on_allow_move(&mut self, sequence: u8) {
        self.movement.on_allow(sequence);
    }

    /// The server refused a move; snap back to its position
    pub fn on_deny_move(&mut self, sequence: u8, location: Point3, facing: Direction) {
        tracing::debug!("Move {} denied, resetting to {}", sequence, location);
        self.movement.on_deny();
        if let Some(player) = self.player {
            self.registry.update(player.serial, |object| {
                object.location = location;
                if let Some(mobile) = object.as_mobile_mut() {
                    mobile.facing = facing;
                }
            });
            self.remove_out_of_range();
        }
    }

    fn player_pose(&self) -> Option<(Serial, Point3, Direction)> {
        let object = self.player_object()?;
        let facing = object.as_mobile().map(|m| m.facing).unwrap_or_default();
        Some((object.serial, object.location, facing))
    }

    //=== Objects ===//

    /// Create or refresh an object seen on the ground
    ///
    /// `facing` applies to mobiles and `amount` to items.
    pub fn update_or_init_object(
        &mut self,
        serial: Serial,
        graphic: u16,
        location: Point3,
        hue: u16,
        facing: Direction,
        amount: u16,
    ) {
        let mut object = self
            .registry
            .get(serial)
            .cloned()
            .unwrap_or_else(|| WorldObject::new(serial, graphic));

        object.graphic = graphic;
        object.location = location;
        object.hue = hue;
        if let Some(item) = object.as_item_mut() {
            item.amount = amount;
            item.layer = None;
            item.placement = Placement::Ground;
        } else if let Some(mobile) = object.as_mobile_mut() {
            mobile.facing = facing;
        }

        self.registry.upsert(object);
        self.remove_out_of_range();
    }

    /// Forget an object and everything it carries
    ///
    /// The player's own mobile is kept.
    pub fn remove_object(&mut self, serial: Serial) {
        if self.player.map(|p| p.serial) == Some(serial) {
            tracing::debug!("Ignoring removal of the player object");
            return;
        }
        if self.registry.remove(serial).is_none() {
            tracing::trace!("Remove for unknown object {}", serial);
        }
    }

    /// Put an item on a mobile
    ///
    /// A serial from the mobile range is not an item and is ignored.
    pub fn equip_item(&mut self, item: Serial, graphic: u16, layer: Layer, mobile: Serial, hue: u16) {
        if !item.is_item() {
            tracing::debug!("Ignoring equip of non-item serial {}", item);
            return;
        }
        let object = WorldObject::item(item, graphic).with_hue(hue);
        if !self.registry.equip(object, mobile, layer) {
            tracing::debug!("Equip received for unknown mobile {}", mobile);
        }
    }

    /// Put one item into a container
    ///
    /// # Errors
    /// `NotFound` if the container is unknown or is not an item.
    pub fn add_item_to_container(&mut self, container: Serial, item: &ContainerItem) -> Result<()> {
        self.require_container(container)?;
        self.insert_into(container, item);
        Ok(())
    }

    /// Replace the known contents of a container
    ///
    /// # Errors
    /// `NotFound` if the container is unknown or is not an item.
    pub fn set_container_contents(&mut self, container: Serial, items: &[ContainerItem]) -> Result<()> {
        self.require_container(container)?;
        for item in items {
            self.insert_into(container, item);
        }
        Ok(())
    }

    fn require_container(&self, container: Serial) -> Result<()> {
        match self.registry.get(container) {
            Some(object) if object.is_item() => Ok(()),
            _ => Err(ClientError::NotFound(format!("Unknown container {}", container))),
        }
    }

    fn insert_into(&mut self, container: Serial, info: &ContainerItem) {
        if !info.serial.is_item() {
            tracing::debug!("Ignoring non-item serial {} in container {}", info.serial, container);
            return;
        }
        let mut object = WorldObject::item(info.serial, info.graphic)
            .with_hue(info.hue)
            .with_location(Point3::new(info.x, info.y, 0));
        if let Some(item) = object.as_item_mut() {
            item.amount = info.amount;
        }
        if !self.registry.put_in_container(object, container) {
            tracing::debug!("Cannot place {} inside {}", info.serial, container);
        }
    }

    /// Change the visibility range and drop what falls outside it
    pub fn set_update_range(&mut self, range: u32) {
        self.update_range = range;
        self.remove_out_of_range();
    }

    pub fn update_range(&self) -> u32 {
        self.update_range
    }

    fn remove_out_of_range(&mut self) {
        let Some(origin) = self.player_object().map(|o| o.location.to_2d()) else {
            return;
        };
        self.registry.remove_farther(origin, self.update_range);
    }

    /// Everything on a tile: tracked objects followed by static decorations
    pub fn objects_at(&self, point: Point2) -> Vec<MapObject<'_>> {
        self.registry
            .objects_at(point)
            .into_iter()
            .map(MapObject::Dynamic)
            .chain(self.world.statics_at(point).into_iter().map(MapObject::Static))
            .collect()
    }

    //=== Interaction ===//

    /// Say something
    pub fn send_text(&mut self, text: &str) -> Result<()> {
        self.require_logged_in()?;
        self.outbox.push(Packet::SpeechRequest {
            color: SPEECH_COLOR,
            mode: SpeechMode::Bark,
            text: text.to_string(),
        });
        Ok(())
    }

    /// Ask for an object's name
    pub fn query_single_click(&mut self, serial: Serial) -> Result<()> {
        self.require_logged_in()?;
        self.outbox.push(Packet::SingleClick { serial });
        Ok(())
    }

    /// Use an object
    pub fn double_click(&mut self, serial: Serial) -> Result<()> {
        self.require_logged_in()?;
        self.outbox.push(Packet::DoubleClick { serial });
        Ok(())
    }

    /// Flip war mode and tell the server
    ///
    /// # Returns
    /// The new war-mode flag.
    pub fn toggle_war_mode(&mut self) -> Result<bool> {
        self.require_logged_in()?;
        let player = self
            .player
            .as_mut()
            .ok_or_else(|| ClientError::InvalidState("No player".into()))?;
        player.war_mode = !player.war_mode;
        let enabled = player.war_mode;
        self.outbox.push(Packet::WarMode { enabled });
        Ok(enabled)
    }

    /// Text from the server
    pub fn on_text(&mut self, mode: SpeechMode, speaker: Serial, name: &str, text: &str, color: u32) {
        match mode {
            SpeechMode::Say => self.events.on_speech(speaker, name, text, color),
            SpeechMode::See => self.events.on_see(speaker, name, text, color),
            SpeechMode::System => self.events.on_system_message(text, color),
            other => tracing::warn!("Unknown text mode {:?}: {}", other, text),
        }
    }

    pub fn on_sound(&mut self, sound: u16, location: Point3) {
        self.events.on_sound(sound, location);
    }

    pub fn on_gump(&mut self, serial: Serial, gump: u16) {
        self.events.on_gump(serial, gump);
    }

    //=== Accessors ===//

    pub fn player(&self) -> Option<&Player> {
        self.player.as_ref()
    }

    /// The player's mobile in the registry
    pub fn player_object(&self) -> Option<&WorldObject> {
        self.player.and_then(|p| self.registry.get(p.serial))
    }

    pub fn registry(&self) -> &ObjectRegistry {
        &self.registry
    }

    pub fn movement(&self) -> &MovementSequencer {
        &self.movement
    }

    /// Packets waiting to be sent, oldest first
    pub fn take_outbound(&mut self) -> Vec<Packet> {
        std::mem::take(&mut self.outbox)
    }

    /// # Errors
    /// `InvalidState` unless logged in.
    pub fn require_logged_in(&self) -> Result<()> {
        if self.state() != ConnectionState::LoggedIn {
            return Err(ClientError::InvalidState(format!("Not logged in ({})", self.state())));
        }
        Ok(())
    }

    /// # Errors
    /// `InvalidState` while disconnected.
    pub fn require_connected(&self) -> Result<()> {
        if self.state() == ConnectionState::Disconnected {
            return Err(ClientError::InvalidState("Not connected".into()));
        }
        Ok(())
    }
}

impl DispatchContext for GameState {
    fn on_connection_closed(&mut self, cause: DisconnectCause) {
        self.on_disconnect(cause);
    }
}

impl std::fmt::Debug for GameState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GameState")
            .field("state", &self.state())
            .field("player", &self.player)
            .field("objects", &self.registry.len())
            .field("update_range", &self.update_range)
            .field("outbox", &self.outbox.len())
            .finish()
    }
}

/// Obstacles on a tile: dynamic items plus the world's statics
fn obstacles_at(registry: &ObjectRegistry, world: &dyn WorldData, point: Point2) -> Vec<StaticObject> {
    registry
        .objects_at(point)
        .into_iter()
        .filter(|object| object.is_item())
        .map(StaticObject::from_object)
        .chain(world.statics_at(point))
        .collect()
}
