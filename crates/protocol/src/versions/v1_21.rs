//! 1.21 (767)
//!
//! Only the clientbound configuration and play tables grow; everything else
//! is shared with 1.20.5.

use crate::packet_kinds::PacketKind;
use crate::registry::PacketRegistry;
use bridge_core::{ConnectionState, Direction, ProtocolVersion, Result};
use super::v1_20_5::{CONFIGURATION_SERVERBOUND, LOGIN_CLIENTBOUND, LOGIN_SERVERBOUND, PLAY_SERVERBOUND};

pub const CONFIGURATION_CLIENTBOUND: &[PacketKind] = &[
    PacketKind::COOKIE_REQUEST,
    PacketKind::CUSTOM_PAYLOAD,
    PacketKind::DISCONNECT,
    PacketKind::FINISH_CONFIGURATION,
    PacketKind::KEEP_ALIVE,
    PacketKind::PING,
    PacketKind::RESET_CHAT,
    PacketKind::REGISTRY_DATA,
    PacketKind::RESOURCE_PACK_POP,
    PacketKind::RESOURCE_PACK_PUSH,
    PacketKind::STORE_COOKIE,
    PacketKind::TRANSFER,
    PacketKind::UPDATE_ENABLED_FEATURES,
    PacketKind::UPDATE_TAGS,
    PacketKind::SELECT_KNOWN_PACKS,
    PacketKind::CUSTOM_REPORT_DETAILS,
    PacketKind::SERVER_LINKS,
];

pub const PLAY_CLIENTBOUND: &[PacketKind] = &[
    PacketKind::BUNDLE,
    PacketKind::SPAWN_ENTITY,
    PacketKind::SPAWN_EXPERIENCE_ORB,
    PacketKind::ENTITY_ANIMATION,
    PacketKind::STATISTICS,
    PacketKind::BLOCK_CHANGED_ACK,
    PacketKind::BLOCK_BREAK_ANIMATION,
    PacketKind::BLOCK_ENTITY_DATA,
    PacketKind::BLOCK_ACTION,
    PacketKind::BLOCK_CHANGE,
    PacketKind::BOSS_BAR,
    PacketKind::SERVER_DIFFICULTY,
    PacketKind::CHUNK_BATCH_FINISHED,
    PacketKind::CHUNK_BATCH_START,
    PacketKind::CHUNKS_BIOMES,
    PacketKind::CLEAR_TITLES,
    PacketKind::TAB_COMPLETE,
    PacketKind::DECLARE_COMMANDS,
    PacketKind::CLOSE_WINDOW,
    PacketKind::WINDOW_ITEMS,
    PacketKind::WINDOW_PROPERTY,
    PacketKind::SET_SLOT,
    PacketKind::COOKIE_REQUEST,
    PacketKind::COOLDOWN,
    PacketKind::CUSTOM_CHAT_COMPLETIONS,
    PacketKind::PLUGIN_MESSAGE,
    PacketKind::DAMAGE_EVENT,
    PacketKind::DEBUG_SAMPLE,
    PacketKind::DELETE_CHAT_MESSAGE,
    PacketKind::DISCONNECT,
    PacketKind::DISGUISED_CHAT,
    PacketKind::ENTITY_STATUS,
    PacketKind::EXPLOSION,
    PacketKind::UNLOAD_CHUNK,
    PacketKind::GAME_EVENT,
    PacketKind::OPEN_HORSE_WINDOW,
    PacketKind::HIT_ANIMATION,
    PacketKind::WORLD_BORDER_INIT,
    PacketKind::KEEP_ALIVE,
    PacketKind::CHUNK_DATA,
    PacketKind::EFFECT,
    PacketKind::SPAWN_PARTICLE,
    PacketKind::UPDATE_LIGHT,
    PacketKind::JOIN_GAME,
    PacketKind::MAP_DATA,
    PacketKind::TRADE_LIST,
    PacketKind::ENTITY_POSITION,
    PacketKind::ENTITY_POSITION_AND_ROTATION,
    PacketKind::ENTITY_ROTATION,
    PacketKind::VEHICLE_MOVE,
    PacketKind::OPEN_BOOK,
    PacketKind::OPEN_WINDOW,
    PacketKind::OPEN_SIGN_EDITOR,
    PacketKind::PING,
    PacketKind::PONG_RESPONSE,
    PacketKind::CRAFT_RECIPE_RESPONSE,
    PacketKind::PLAYER_ABILITIES,
    PacketKind::PLAYER_CHAT,
    PacketKind::COMBAT_END,
    PacketKind::COMBAT_ENTER,
    PacketKind::COMBAT_KILL,
    PacketKind::PLAYER_INFO_REMOVE,
    PacketKind::PLAYER_INFO_UPDATE,
    PacketKind::FACE_PLAYER,
    PacketKind::PLAYER_POSITION,
    PacketKind::UNLOCK_RECIPES,
    PacketKind::REMOVE_ENTITIES,
    PacketKind::REMOVE_ENTITY_EFFECT,
    PacketKind::RESET_SCORE,
    PacketKind::RESOURCE_PACK_POP,
    PacketKind::RESOURCE_PACK_PUSH,
    PacketKind::RESPAWN,
    PacketKind::ENTITY_HEAD_LOOK,
    PacketKind::MULTI_BLOCK_CHANGE,
    PacketKind::SELECT_ADVANCEMENTS_TAB,
    PacketKind::SERVER_DATA,
    PacketKind::ACTIONBAR,
    PacketKind::WORLD_BORDER_CENTER,
    PacketKind::WORLD_BORDER_LERP_SIZE,
    PacketKind::WORLD_BORDER_SIZE,
    PacketKind::WORLD_BORDER_WARNING_DELAY,
    PacketKind::WORLD_BORDER_WARNING_REACH,
    PacketKind::CAMERA,
    PacketKind::HELD_ITEM_CHANGE,
    PacketKind::UPDATE_VIEW_POSITION,
    PacketKind::UPDATE_VIEW_DISTANCE,
    PacketKind::SPAWN_POSITION,
    PacketKind::DISPLAY_SCOREBOARD,
    PacketKind::ENTITY_METADATA,
    PacketKind::ATTACH_ENTITY,
    PacketKind::ENTITY_VELOCITY,
    PacketKind::ENTITY_EQUIPMENT,
    PacketKind::SET_EXPERIENCE,
    PacketKind::UPDATE_HEALTH,
    PacketKind::SCOREBOARD_OBJECTIVE,
    PacketKind::SET_PASSENGERS,
    PacketKind::TEAMS,
    PacketKind::UPDATE_SCORE,
    PacketKind::SET_SIMULATION_DISTANCE,
    PacketKind::TITLE_SUBTITLE,
    PacketKind::TIME_UPDATE,
    PacketKind::TITLE_TEXT,
    PacketKind::TITLE_TIMES,
    PacketKind::ENTITY_SOUND_EFFECT,
    PacketKind::SOUND,
    PacketKind::STOP_SOUND,
    PacketKind::STORE_COOKIE,
    PacketKind::START_CONFIGURATION,
    PacketKind::SYSTEM_CHAT,
    PacketKind::TAB_LIST,
    PacketKind::NBT_QUERY,
    PacketKind::COLLECT_ITEM,
    PacketKind::ENTITY_TELEPORT,
    PacketKind::TICKING_STATE,
    PacketKind::TICKING_STEP,
    PacketKind::TRANSFER,
    PacketKind::ADVANCEMENTS,
    PacketKind::ENTITY_PROPERTIES,
    PacketKind::ENTITY_EFFECT,
    PacketKind::DECLARE_RECIPES,
    PacketKind::TAGS,
    PacketKind::PROJECTILE_POWER,
    PacketKind::CUSTOM_REPORT_DETAILS,
    PacketKind::SERVER_LINKS,
];

pub fn registry() -> Result<PacketRegistry> {
    super::common(ProtocolVersion::V1_21)
        .table(ConnectionState::Login, Direction::Clientbound, LOGIN_CLIENTBOUND)
        .table(ConnectionState::Login, Direction::Serverbound, LOGIN_SERVERBOUND)
        .table(ConnectionState::Configuration, Direction::Clientbound, CONFIGURATION_CLIENTBOUND)
        .table(ConnectionState::Configuration, Direction::Serverbound, CONFIGURATION_SERVERBOUND)
        .table(ConnectionState::Play, Direction::Clientbound, PLAY_CLIENTBOUND)
        .table(ConnectionState::Play, Direction::Serverbound, PLAY_SERVERBOUND)
        .build()
}
