//! # Shard Client Game Logic Layer
//!
//! Everything the client believes about the world, and the rules that keep
//! it in step with the server.
//!
//! ## Modules
//!
//! - `state` - Connection state machine and its listeners
//! - `object` - Items and mobiles as the client sees them
//! - `registry` - Serial-keyed object store with a spatial index
//! - `movement` - Move sequencing and throttling
//! - `world` - Static world data seam
//! - `events` - Callbacks into the presentation layer
//! - `game_state` - The orchestrator tying the above together
//! - `handlers` - Packet handlers for game logic

pub mod events;
pub mod game_state;
pub mod handlers;
pub mod movement;
pub mod object;
pub mod registry;
pub mod state;
pub mod world;

// Re-export commonly used types
pub use events::{ClientEvents, LoginFailure, NoEvents};
pub use game_state::{GameState, MoveOutcome, Player, DEFAULT_UPDATE_RANGE};
pub use handlers::{default_registry, register_handlers};
pub use movement::{MoveRejection, MovementSequencer, MAX_UNACKED_MOVES, MOVE_DELAY};
pub use object::{ItemData, MobileData, ObjectKind, Placement, WorldObject};
pub use registry::ObjectRegistry;
pub use state::{ConnectionState, ListenerId, StateListener, StateMachine};
pub use world::{FlatWorld, MapObject, StaticObject, WorldData};
