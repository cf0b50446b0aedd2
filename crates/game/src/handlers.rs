//! # Packet Handlers
//!
//! Binds each server-to-client packet to the [`GameState`] operation that
//! applies it.
//!
//! Login-phase packets (login error, init-player, location, text) are
//! accepted as soon as the connection is up. Everything else describes the
//! world around the player and is refused with `InvalidState` until login
//! has completed.

use crate::game_state::GameState;
use shard_core::{ClientError, Result};
use shard_network::HandlerRegistry;
use shard_protocol::{Packet, PacketId};

/// Registry with every game handler installed
pub fn default_registry() -> HandlerRegistry<GameState> {
    let mut registry = HandlerRegistry::new();
    register_handlers(&mut registry);
    registry
}

/// Install the game handlers into `registry`
pub fn register_handlers(registry: &mut HandlerRegistry<GameState>) {
    registry.register_function(PacketId::LoginError, handle_login_error);
    registry.register_function(PacketId::InitPlayer, handle_init_player);
    registry.register_function(PacketId::Location, handle_location);
    registry.register_function(PacketId::SendText, handle_send_text);
    registry.register_function(PacketId::SendObject, handle_send_object);
    registry.register_function(PacketId::RemoveObject, handle_remove_object);
    registry.register_function(PacketId::AllowMove, handle_allow_move);
    registry.register_function(PacketId::DenyMove, handle_deny_move);
    registry.register_function(PacketId::Equip, handle_equip);
    registry.register_function(PacketId::ItemInContainer, handle_item_in_container);
    registry.register_function(PacketId::ContainerContents, handle_container_contents);
    registry.register_function(PacketId::OpenGump, handle_open_gump);
    registry.register_function(PacketId::Sound, handle_sound);

    tracing::debug!("Registered {} game packet handlers", registry.handler_count());
}

fn unexpected(expected: PacketId, packet: &Packet) -> ClientError {
    ClientError::Protocol(format!("Handler for {:?} received {:?}", expected, packet.id()))
}

fn handle_login_error(game: &mut GameState, packet: &Packet) -> Result<()> {
    let Packet::LoginError { reason } = packet else {
        return Err(unexpected(PacketId::LoginError, packet));
    };
    game.require_connected()?;
    game.on_login_error(*reason);
    Ok(())
}

fn handle_init_player(game: &mut GameState, packet: &Packet) -> Result<()> {
    let Packet::InitPlayer { serial } = packet else {
        return Err(unexpected(PacketId::InitPlayer, packet));
    };
    game.require_connected()?;
    game.on_init_player(*serial);
    Ok(())
}

fn handle_location(game: &mut GameState, packet: &Packet) -> Result<()> {
    let Packet::Location {
        serial,
        graphic,
        location,
        facing,
        hue,
    } = packet
    else {
        return Err(unexpected(PacketId::Location, packet));
    };
    game.require_connected()?;
    game.on_location(*serial, *graphic, *location, *facing, *hue);
    Ok(())
}

fn handle_send_text(game: &mut GameState, packet: &Packet) -> Result<()> {
    let Packet::SendText {
        speaker,
        mode,
        color,
        name,
        text,
        ..
    } = packet
    else {
        return Err(unexpected(PacketId::SendText, packet));
    };
    game.require_connected()?;
    game.on_text(*mode, *speaker, name, text, *color);
    Ok(())
}

fn handle_send_object(game: &mut GameState, packet: &Packet) -> Result<()> {
    let Packet::SendObject {
        serial,
        graphic,
        location,
        hue,
        facing,
        amount,
    } = packet
    else {
        return Err(unexpected(PacketId::SendObject, packet));
    };
    game.require_logged_in()?;
    game.update_or_init_object(*serial, *graphic, *location, *hue, *facing, *amount);
    Ok(())
}

fn handle_remove_object(game: &mut GameState, packet: &Packet) -> Result<()> {
    let Packet::RemoveObject { serial } = packet else {
        return Err(unexpected(PacketId::RemoveObject, packet));
    };
    game.require_logged_in()?;
    game.remove_object(*serial);
    Ok(())
}

fn handle_allow_move(game: &mut GameState, packet: &Packet) -> Result<()> {
    let Packet::AllowMove { sequence } = packet else {
        return Err(unexpected(PacketId::AllowMove, packet));
    };
    game.require_logged_in()?;
    game.on_allow_move(*sequence);
    Ok(())
}

fn handle_deny_move(game: &mut GameState, packet: &Packet) -> Result<()> {
    let Packet::DenyMove {
        sequence,
        location,
        facing,
    } = packet
    else {
        return Err(unexpected(PacketId::DenyMove, packet));
    };
    game.require_logged_in()?;
    game.on_deny_move(*sequence, *location, *facing);
    Ok(())
}

fn handle_equip(game: &mut GameState, packet: &Packet) -> Result<()> {
    let Packet::Equip {
        item,
        graphic,
        layer,
        mobile,
        hue,
    } = packet
    else {
        return Err(unexpected(PacketId::Equip, packet));
    };
    game.require_logged_in()?;
    game.equip_item(*item, *graphic, *layer, *mobile, *hue);
    Ok(())
}

fn handle_item_in_container(game: &mut GameState, packet: &Packet) -> Result<()> {
    let Packet::ItemInContainer { container, item } = packet else {
        return Err(unexpected(PacketId::ItemInContainer, packet));
    };
    game.require_logged_in()?;
    if let Err(e) = game.add_item_to_container(*container, item) {
        tracing::warn!("Dropping item {}: {}", item.serial, e);
    }
    Ok(())
}

fn handle_container_contents(game: &mut GameState, packet: &Packet) -> Result<()> {
    let Packet::ContainerContents { container, items } = packet else {
        return Err(unexpected(PacketId::ContainerContents, packet));
    };
    game.require_logged_in()?;
    if let Err(e) = game.set_container_contents(*container, items) {
        tracing::warn!("Dropping {} contained items: {}", items.len(), e);
    }
    Ok(())
}

fn handle_open_gump(game: &mut GameState, packet: &Packet) -> Result<()> {
    let Packet::OpenGump { serial, gump } = packet else {
        return Err(unexpected(PacketId::OpenGump, packet));
    };
    game.require_logged_in()?;
    game.on_gump(*serial, *gump);
    Ok(())
}

fn handle_sound(game: &mut GameState, packet: &Packet) -> Result<()> {
    let Packet::Sound { sound, location } = packet else {
        return Err(unexpected(PacketId::Sound, packet));
    };
    game.require_logged_in()?;
    game.on_sound(*sound, *location);
    Ok(())
}
