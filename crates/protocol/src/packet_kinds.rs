//! Packet kinds
//!
//! A kind names what a packet means independently of its numeric id, which
//! moves between versions. Kinds are only meaningful together with a
//! connection state and direction; `keep_alive` exists in both configuration
//! and play, and resolves to a different id in each.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PacketKind(&'static str);

impl PacketKind {
    /// Kind outside the built-in set, for hosts registering extra packets
    pub const fn custom(name: &'static str) -> Self {
        Self(name)
    }

    pub const fn name(self) -> &'static str {
        self.0
    }
}

impl fmt::Display for PacketKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

macro_rules! packet_kinds {
    ($($konst:ident => $name:literal,)*) => {
        impl PacketKind {
            $(pub const $konst: PacketKind = PacketKind($name);)*

            /// Every built-in kind, sorted by name
            pub const BUILTIN: &'static [PacketKind] = &[$(PacketKind::$konst,)*];
        }
    };
}

packet_kinds! {
    ACTIONBAR => "actionbar",
    ADVANCEMENT_TAB => "advancement_tab",
    ADVANCEMENTS => "advancements",
    ANIMATION => "animation",
    ATTACH_ENTITY => "attach_entity",
    BLOCK_ACTION => "block_action",
    BLOCK_BREAK_ANIMATION => "block_break_animation",
    BLOCK_CHANGE => "block_change",
    BLOCK_CHANGED_ACK => "block_changed_ack",
    BLOCK_ENTITY_DATA => "block_entity_data",
    BOSS_BAR => "boss_bar",
    BUNDLE => "bundle",
    CAMERA => "camera",
    CHAT_ACK => "chat_ack",
    CHAT_COMMAND => "chat_command",
    CHAT_MESSAGE => "chat_message",
    CHAT_SESSION_UPDATE => "chat_session_update",
    CHUNK_BATCH_FINISHED => "chunk_batch_finished",
    CHUNK_BATCH_RECEIVED => "chunk_batch_received",
    CHUNK_BATCH_START => "chunk_batch_start",
    CHUNK_DATA => "chunk_data",
    CHUNKS_BIOMES => "chunks_biomes",
    CLEAR_TITLES => "clear_titles",
    CLICK_WINDOW => "click_window",
    CLICK_WINDOW_BUTTON => "click_window_button",
    CLIENT_INFORMATION => "client_information",
    CLIENT_INTENTION => "client_intention",
    CLIENT_SETTINGS => "client_settings",
    CLIENT_STATUS => "client_status",
    CLOSE_WINDOW => "close_window",
    COLLECT_ITEM => "collect_item",
    COMBAT_END => "combat_end",
    COMBAT_ENTER => "combat_enter",
    COMBAT_KILL => "combat_kill",
    CONFIGURATION_ACKNOWLEDGED => "configuration_acknowledged",
    CONTAINER_SLOT_STATE_CHANGED => "container_slot_state_changed",
    COOKIE_REQUEST => "cookie_request",
    COOKIE_RESPONSE => "cookie_response",
    COOLDOWN => "cooldown",
    CRAFT_RECIPE_REQUEST => "craft_recipe_request",
    CRAFT_RECIPE_RESPONSE => "craft_recipe_response",
    CREATIVE_INVENTORY_ACTION => "creative_inventory_action",
    CUSTOM_CHAT_COMPLETIONS => "custom_chat_completions",
    CUSTOM_PAYLOAD => "custom_payload",
    CUSTOM_QUERY => "custom_query",
    CUSTOM_QUERY_ANSWER => "custom_query_answer",
    CUSTOM_REPORT_DETAILS => "custom_report_details",
    DAMAGE_EVENT => "damage_event",
    DEBUG_SAMPLE => "debug_sample",
    DECLARE_COMMANDS => "declare_commands",
    DECLARE_RECIPES => "declare_recipes",
    DELETE_CHAT_MESSAGE => "delete_chat_message",
    DISCONNECT => "disconnect",
    DISGUISED_CHAT => "disguised_chat",
    DISPLAY_SCOREBOARD => "display_scoreboard",
    EDIT_BOOK => "edit_book",
    EFFECT => "effect",
    ENTITY_ACTION => "entity_action",
    ENTITY_ANIMATION => "entity_animation",
    ENTITY_EFFECT => "entity_effect",
    ENTITY_EQUIPMENT => "entity_equipment",
    ENTITY_HEAD_LOOK => "entity_head_look",
    ENTITY_METADATA => "entity_metadata",
    ENTITY_NBT_REQUEST => "entity_nbt_request",
    ENTITY_POSITION => "entity_position",
    ENTITY_POSITION_AND_ROTATION => "entity_position_and_rotation",
    ENTITY_PROPERTIES => "entity_properties",
    ENTITY_ROTATION => "entity_rotation",
    ENTITY_SOUND_EFFECT => "entity_sound_effect",
    ENTITY_STATUS => "entity_status",
    ENTITY_TELEPORT => "entity_teleport",
    ENTITY_VELOCITY => "entity_velocity",
    EXPLOSION => "explosion",
    FACE_PLAYER => "face_player",
    FINISH_CONFIGURATION => "finish_configuration",
    GAME_EVENT => "game_event",
    GAME_PROFILE => "game_profile",
    GENERATE_JIGSAW => "generate_jigsaw",
    HELD_ITEM_CHANGE => "held_item_change",
    HELLO => "hello",
    HIT_ANIMATION => "hit_animation",
    INTERACT_ENTITY => "interact_entity",
    JOIN_GAME => "join_game",
    KEEP_ALIVE => "keep_alive",
    KEY => "key",
    LOCK_DIFFICULTY => "lock_difficulty",
    LOGIN_ACKNOWLEDGED => "login_acknowledged",
    LOGIN_COMPRESSION => "login_compression",
    LOGIN_DISCONNECT => "login_disconnect",
    MAP_DATA => "map_data",
    MULTI_BLOCK_CHANGE => "multi_block_change",
    NBT_QUERY => "nbt_query",
    OPEN_BOOK => "open_book",
    OPEN_HORSE_WINDOW => "open_horse_window",
    OPEN_SIGN_EDITOR => "open_sign_editor",
    OPEN_WINDOW => "open_window",
    PICK_ITEM => "pick_item",
    PING => "ping",
    PING_REQUEST => "ping_request",
    PLAYER_ABILITIES => "player_abilities",
    PLAYER_BLOCK_PLACEMENT => "player_block_placement",
    PLAYER_CHAT => "player_chat",
    PLAYER_DIGGING => "player_digging",
    PLAYER_INFO_REMOVE => "player_info_remove",
    PLAYER_INFO_UPDATE => "player_info_update",
    PLAYER_MOVEMENT => "player_movement",
    PLAYER_POSITION => "player_position",
    PLAYER_POSITION_AND_ROTATION => "player_position_and_rotation",
    PLAYER_ROTATION => "player_rotation",
    PLUGIN_MESSAGE => "plugin_message",
    PONG => "pong",
    PONG_RESPONSE => "pong_response",
    PROJECTILE_POWER => "projectile_power",
    QUERY_BLOCK_NBT => "query_block_nbt",
    RECIPE_BOOK_DATA => "recipe_book_data",
    REGISTRY_DATA => "registry_data",
    REMOVE_ENTITIES => "remove_entities",
    REMOVE_ENTITY_EFFECT => "remove_entity_effect",
    RENAME_ITEM => "rename_item",
    RESET_CHAT => "reset_chat",
    RESET_SCORE => "reset_score",
    RESOURCE_PACK => "resource_pack",
    RESOURCE_PACK_POP => "resource_pack_pop",
    RESOURCE_PACK_PUSH => "resource_pack_push",
    RESOURCE_PACK_STATUS => "resource_pack_status",
    RESPAWN => "respawn",
    SCOREBOARD_OBJECTIVE => "scoreboard_objective",
    SEEN_RECIPE => "seen_recipe",
    SELECT_ADVANCEMENTS_TAB => "select_advancements_tab",
    SELECT_KNOWN_PACKS => "select_known_packs",
    SELECT_TRADE => "select_trade",
    SERVER_DATA => "server_data",
    SERVER_DIFFICULTY => "server_difficulty",
    SERVER_LINKS => "server_links",
    SET_BEACON_EFFECT => "set_beacon_effect",
    SET_DIFFICULTY => "set_difficulty",
    SET_EXPERIENCE => "set_experience",
    SET_PASSENGERS => "set_passengers",
    SET_SIMULATION_DISTANCE => "set_simulation_distance",
    SET_SLOT => "set_slot",
    SOUND => "sound",
    SPAWN_ENTITY => "spawn_entity",
    SPAWN_EXPERIENCE_ORB => "spawn_experience_orb",
    SPAWN_PARTICLE => "spawn_particle",
    SPAWN_POSITION => "spawn_position",
    SPECTATE => "spectate",
    START_CONFIGURATION => "start_configuration",
    STATISTICS => "statistics",
    STATUS_REQUEST => "status_request",
    STATUS_RESPONSE => "status_response",
    STEER_BOAT => "steer_boat",
    STEER_VEHICLE => "steer_vehicle",
    STOP_SOUND => "stop_sound",
    STORE_COOKIE => "store_cookie",
    SYSTEM_CHAT => "system_chat",
    TAB_COMPLETE => "tab_complete",
    TAB_LIST => "tab_list",
    TAGS => "tags",
    TEAMS => "teams",
    TELEPORT_CONFIRM => "teleport_confirm",
    TICKING_STATE => "ticking_state",
    TICKING_STEP => "ticking_step",
    TIME_UPDATE => "time_update",
    TITLE_SUBTITLE => "title_subtitle",
    TITLE_TEXT => "title_text",
    TITLE_TIMES => "title_times",
    TRADE_LIST => "trade_list",
    TRANSFER => "transfer",
    UNLOAD_CHUNK => "unload_chunk",
    UNLOCK_RECIPES => "unlock_recipes",
    UPDATE_COMMAND_BLOCK => "update_command_block",
    UPDATE_COMMAND_BLOCK_MINECART => "update_command_block_minecart",
    UPDATE_ENABLED_FEATURES => "update_enabled_features",
    UPDATE_HEALTH => "update_health",
    UPDATE_JIGSAW_BLOCK => "update_jigsaw_block",
    UPDATE_LIGHT => "update_light",
    UPDATE_SCORE => "update_score",
    UPDATE_SIGN => "update_sign",
    UPDATE_STRUCTURE_BLOCK => "update_structure_block",
    UPDATE_TAGS => "update_tags",
    UPDATE_VIEW_DISTANCE => "update_view_distance",
    UPDATE_VIEW_POSITION => "update_view_position",
    USE_ITEM => "use_item",
    VEHICLE_MOVE => "vehicle_move",
    WINDOW_ITEMS => "window_items",
    WINDOW_PROPERTY => "window_property",
    WORLD_BORDER_CENTER => "world_border_center",
    WORLD_BORDER_INIT => "world_border_init",
    WORLD_BORDER_LERP_SIZE => "world_border_lerp_size",
    WORLD_BORDER_SIZE => "world_border_size",
    WORLD_BORDER_WARNING_DELAY => "world_border_warning_delay",
    WORLD_BORDER_WARNING_REACH => "world_border_warning_reach",
}

impl PacketKind {
    /// Look up a built-in kind by name
    pub fn from_name(name: &str) -> Option<Self> {
        Self::BUILTIN
            .binary_search_by(|kind| kind.0.cmp(name))
            .ok()
            .map(|index| Self::BUILTIN[index])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_sorted_and_unique() {
        for pair in PacketKind::BUILTIN.windows(2) {
            assert!(pair[0].name() < pair[1].name(), "{} / {}", pair[0], pair[1]);
        }
    }

    #[test]
    fn test_from_name() {
        assert_eq!(PacketKind::from_name("keep_alive"), Some(PacketKind::KEEP_ALIVE));
        assert_eq!(PacketKind::from_name("no_such_packet"), None);
    }
}
