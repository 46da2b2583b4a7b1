//! Built-in version steps, driven through the manager like a host would

use bridge_core::{BridgeError, CodecError, ConnectionState, Direction, ProtocolVersion};
use bridge_engine::protocols::v1_20_3_to_v1_20_5::RegistryEntry;
use bridge_engine::{Outcome, Pipeline, ProtocolManager};
use bridge_protocol::codecs::write_varint;
use bridge_protocol::handshake::{INTENT_LOGIN, INTENT_TRANSFER};
use bridge_protocol::{
    Compound, Handshake, JsonComponent, PacketKind, PacketWrapper, Tag, VarInt, WireType,
};
use bytes::{Bytes, BytesMut};
use uuid::Uuid;

const V1_20_2: ProtocolVersion = ProtocolVersion::V1_20_2;
const V1_20_3: ProtocolVersion = ProtocolVersion::V1_20_3;
const V1_20_5: ProtocolVersion = ProtocolVersion::V1_20_5;
const V1_21: ProtocolVersion = ProtocolVersion::V1_21;

const CB: Direction = Direction::Clientbound;
const SB: Direction = Direction::Serverbound;

struct Harness {
    manager: ProtocolManager,
}

impl Harness {
    fn new() -> Self {
        Self {
            manager: ProtocolManager::new().unwrap(),
        }
    }

    fn pipeline(&self, client: ProtocolVersion, server: ProtocolVersion, state: ConnectionState) -> Pipeline {
        let mut pipeline = self.manager.create_pipeline(client, server).unwrap();
        pipeline.session_mut().set_state(state);
        pipeline
    }

    fn id(&self, version: ProtocolVersion, state: ConnectionState, direction: Direction, kind: PacketKind) -> i32 {
        self.manager
            .registry(version)
            .unwrap()
            .id_for(state, direction, kind)
            .unwrap()
    }
}

fn packet(id: i32, body: impl FnOnce(&mut BytesMut)) -> Bytes {
    let mut buf = BytesMut::new();
    write_varint(&mut buf, id);
    body(&mut buf);
    buf.freeze()
}

fn single(outcome: Outcome) -> PacketWrapper {
    match outcome {
        Outcome::Forward(bytes) => PacketWrapper::decode(bytes).unwrap(),
        other => panic!("expected one packet, got {:?}", other),
    }
}

fn text(value: &str) -> Tag {
    let mut compound = Compound::new();
    compound.insert("text", Tag::String(value.into()));
    Tag::Compound(compound)
}

#[test]
fn test_handshake_reaches_server_as_its_version() {
    let harness = Harness::new();
    let mut pipeline = harness.manager.create_pipeline(V1_20_3, V1_20_2).unwrap();
    assert_eq!(pipeline.state(), ConnectionState::Handshake);

    let handshake = Handshake {
        protocol_version: V1_20_3,
        server_address: "localhost".into(),
        server_port: 25565,
        intent: INTENT_LOGIN,
    };
    let outcome = pipeline.process_serverbound(handshake.to_payload()).unwrap();
    let Outcome::Forward(bytes) = outcome else {
        panic!("handshake was not forwarded");
    };
    let forwarded = Handshake::peek(&bytes).unwrap();
    assert_eq!(forwarded.protocol_version, V1_20_2);
    assert_eq!(forwarded.server_address, "localhost");
    assert_eq!(forwarded.server_port, 25565);
    assert_eq!(pipeline.state(), ConnectionState::Login);

    let acknowledged = harness.id(V1_20_3, ConnectionState::Login, SB, PacketKind::LOGIN_ACKNOWLEDGED);
    pipeline.process_serverbound(packet(acknowledged, |_| {})).unwrap();
    assert_eq!(pipeline.state(), ConnectionState::Configuration);

    let finish = harness.id(V1_20_3, ConnectionState::Configuration, SB, PacketKind::FINISH_CONFIGURATION);
    pipeline.process_serverbound(packet(finish, |_| {})).unwrap();
    assert_eq!(pipeline.state(), ConnectionState::Play);
}

#[test]
fn test_transfer_logs_in_on_older_server() {
    let harness = Harness::new();
    let mut pipeline = harness.manager.create_pipeline(V1_20_5, V1_20_3).unwrap();

    let handshake = Handshake {
        protocol_version: V1_20_5,
        server_address: "play.example.net".into(),
        server_port: 25565,
        intent: INTENT_TRANSFER,
    };
    let outcome = pipeline.process_serverbound(handshake.to_payload()).unwrap();
    let Outcome::Forward(bytes) = outcome else {
        panic!("handshake was not forwarded");
    };
    let forwarded = Handshake::peek(&bytes).unwrap();
    assert_eq!(forwarded.protocol_version, V1_20_3);
    assert_eq!(forwarded.intent, INTENT_LOGIN);
    assert_eq!(pipeline.state(), ConnectionState::Login);

    // the older server never asked for cookies
    let cookie = harness.id(V1_20_5, ConnectionState::Login, SB, PacketKind::COOKIE_RESPONSE);
    let outcome = pipeline
        .process_serverbound(packet(cookie, |buf| {
            "minecraft:session".to_string().write(buf);
            None::<Vec<u8>>.write(buf);
        }))
        .unwrap();
    assert_eq!(outcome, Outcome::Cancelled);
}

#[test]
fn test_system_chat_becomes_tag() {
    let harness = Harness::new();
    let mut pipeline = harness.pipeline(V1_20_3, V1_20_2, ConnectionState::Play);

    let id = harness.id(V1_20_2, ConnectionState::Play, CB, PacketKind::SYSTEM_CHAT);
    let raw = packet(id, |buf| {
        JsonComponent(r#"{"text":"hello","bold":true}"#.into()).write(buf);
        false.write(buf);
    });

    let mut out = single(pipeline.process_clientbound(raw).unwrap());
    assert_eq!(out.id(), harness.id(V1_20_3, ConnectionState::Play, CB, PacketKind::SYSTEM_CHAT));

    let tag: Tag = out.read().unwrap();
    let compound = tag.as_compound().unwrap();
    assert_eq!(compound.get("text"), Some(&Tag::String("hello".into())));
    assert_eq!(compound.get("bold"), Some(&Tag::Byte(1)));
    assert!(!out.read::<bool>().unwrap());
}

#[test]
fn test_system_chat_across_every_step() {
    let harness = Harness::new();
    let mut pipeline = harness.pipeline(V1_21, V1_20_2, ConnectionState::Play);
    assert_eq!(pipeline.protocols().len(), 4);

    let id = harness.id(V1_20_2, ConnectionState::Play, CB, PacketKind::SYSTEM_CHAT);
    let raw = packet(id, |buf| {
        JsonComponent(r#"{"text":"hi"}"#.into()).write(buf);
        true.write(buf);
    });

    let mut out = single(pipeline.process_clientbound(raw).unwrap());
    assert_eq!(out.id(), harness.id(V1_21, ConnectionState::Play, CB, PacketKind::SYSTEM_CHAT));
    assert_eq!(out.read::<Tag>().unwrap(), text("hi"));
    assert!(out.read::<bool>().unwrap());
}

#[test]
fn test_system_chat_survives_forward_and_back() {
    let harness = Harness::new();
    let mut forward = harness.pipeline(V1_20_3, V1_20_2, ConnectionState::Play);
    let mut backward = harness.pipeline(V1_20_2, V1_20_3, ConnectionState::Play);

    let id = harness.id(V1_20_2, ConnectionState::Play, CB, PacketKind::SYSTEM_CHAT);
    let raw = packet(id, |buf| {
        JsonComponent(
            r#"{"text":"hi","color":"red","bold":true,"extra":[{"text":"!","italic":false}]}"#.into(),
        )
        .write(buf);
        false.write(buf);
    });

    let Outcome::Forward(converted) = forward.process_clientbound(raw.clone()).unwrap() else {
        panic!("system chat was not forwarded");
    };
    let Outcome::Forward(restored) = backward.process_clientbound(converted).unwrap() else {
        panic!("system chat was not forwarded back");
    };
    assert_eq!(restored, raw);
}

#[test]
fn test_oversized_system_chat_is_rejected() {
    let harness = Harness::new();
    let mut pipeline = harness.pipeline(V1_20_3, V1_20_2, ConnectionState::Play);

    let id = harness.id(V1_20_2, ConnectionState::Play, CB, PacketKind::SYSTEM_CHAT);
    let raw = packet(id, |buf| {
        JsonComponent(format!(r#"{{"text":"{}"}}"#, "a".repeat(70_000))).write(buf);
        false.write(buf);
    });

    let err = pipeline.process_clientbound(raw).unwrap_err();
    assert!(matches!(
        err.root_cause(),
        BridgeError::Codec(CodecError::Malformed { .. })
    ));
}

#[test]
fn test_resource_pack_gains_url_id() {
    let harness = Harness::new();
    let mut pipeline = harness.pipeline(V1_20_3, V1_20_2, ConnectionState::Play);
    let url = "https://example.com/pack.zip";

    let id = harness.id(V1_20_2, ConnectionState::Play, CB, PacketKind::RESOURCE_PACK);
    let raw = packet(id, |buf| {
        url.to_string().write(buf);
        "0123abcd".to_string().write(buf);
        true.write(buf);
        None::<JsonComponent>.write(buf);
    });

    let mut out = single(pipeline.process_clientbound(raw).unwrap());
    assert_eq!(out.id(), harness.id(V1_20_3, ConnectionState::Play, CB, PacketKind::RESOURCE_PACK_PUSH));
    let pack: Uuid = out.read().unwrap();
    assert_eq!(pack, Uuid::new_v3(&Uuid::NAMESPACE_URL, url.as_bytes()));
    assert_eq!(out.read::<String>().unwrap(), url);
    assert_eq!(out.read::<String>().unwrap(), "0123abcd");
    assert!(out.read::<bool>().unwrap());
    assert_eq!(out.read::<Option<Tag>>().unwrap(), None);

    let status = harness.id(V1_20_3, ConnectionState::Play, SB, PacketKind::RESOURCE_PACK_STATUS);
    let answer = |result: i32| {
        packet(status, |buf| {
            pack.write(buf);
            VarInt(result).write(buf);
        })
    };

    // downloaded is news to nobody on 1.20.2
    assert_eq!(pipeline.process_serverbound(answer(4)).unwrap(), Outcome::Cancelled);

    let old_status = harness.id(V1_20_2, ConnectionState::Play, SB, PacketKind::RESOURCE_PACK_STATUS);
    let outcome = pipeline.process_serverbound(answer(6)).unwrap();
    assert_eq!(outcome, Outcome::Forward(packet(old_status, |buf| VarInt(2).write(buf))));
}

#[test]
fn test_resource_pack_ids_return_to_newer_server() {
    let harness = Harness::new();
    let mut pipeline = harness.pipeline(V1_20_2, V1_20_3, ConnectionState::Configuration);
    let pack = Uuid::from_u128(0x1234);

    let push = harness.id(V1_20_3, ConnectionState::Configuration, CB, PacketKind::RESOURCE_PACK_PUSH);
    let raw = packet(push, |buf| {
        pack.write(buf);
        "https://example.com/a.zip".to_string().write(buf);
        String::new().write(buf);
        false.write(buf);
        Some(Tag::String("Please".into())).write(buf);
    });

    let mut out = single(pipeline.process_clientbound(raw).unwrap());
    assert_eq!(out.id(), harness.id(V1_20_2, ConnectionState::Configuration, CB, PacketKind::RESOURCE_PACK));
    assert_eq!(out.read::<String>().unwrap(), "https://example.com/a.zip");
    assert_eq!(out.read::<String>().unwrap(), "");
    assert!(!out.read::<bool>().unwrap());
    assert!(out.read::<Option<JsonComponent>>().unwrap().is_some());

    let status = harness.id(V1_20_2, ConnectionState::Configuration, SB, PacketKind::RESOURCE_PACK);
    let expect = |id: Uuid, result: i32| {
        Outcome::Forward(packet(status, |buf| {
            id.write(buf);
            VarInt(result).write(buf);
        }))
    };

    // accepted, then loaded
    let outcome = pipeline.process_serverbound(packet(status, |buf| VarInt(3).write(buf))).unwrap();
    assert_eq!(outcome, expect(pack, 3));
    let outcome = pipeline.process_serverbound(packet(status, |buf| VarInt(0).write(buf))).unwrap();
    assert_eq!(outcome, expect(pack, 0));
    let outcome = pipeline.process_serverbound(packet(status, |buf| VarInt(0).write(buf))).unwrap();
    assert_eq!(outcome, expect(Uuid::nil(), 0));
}

#[test]
fn test_score_removal_splits_off() {
    let harness = Harness::new();
    let mut pipeline = harness.pipeline(V1_20_3, V1_20_2, ConnectionState::Play);

    let id = harness.id(V1_20_2, ConnectionState::Play, CB, PacketKind::UPDATE_SCORE);
    let raw = packet(id, |buf| {
        "Steve".to_string().write(buf);
        VarInt(1).write(buf);
        String::new().write(buf);
    });

    let reset = harness.id(V1_20_3, ConnectionState::Play, CB, PacketKind::RESET_SCORE);
    let outcome = pipeline.process_clientbound(raw).unwrap();
    assert_eq!(
        outcome,
        Outcome::Forward(packet(reset, |buf| {
            "Steve".to_string().write(buf);
            None::<String>.write(buf);
        }))
    );
}

#[test]
fn test_score_reset_rejoins_update() {
    let harness = Harness::new();
    let mut pipeline = harness.pipeline(V1_20_2, V1_20_3, ConnectionState::Play);

    let id = harness.id(V1_20_3, ConnectionState::Play, CB, PacketKind::RESET_SCORE);
    let raw = packet(id, |buf| {
        "Steve".to_string().write(buf);
        Some("kills".to_string()).write(buf);
    });

    let update = harness.id(V1_20_2, ConnectionState::Play, CB, PacketKind::UPDATE_SCORE);
    let outcome = pipeline.process_clientbound(raw).unwrap();
    assert_eq!(
        outcome,
        Outcome::Forward(packet(update, |buf| {
            "Steve".to_string().write(buf);
            VarInt(1).write(buf);
            "kills".to_string().write(buf);
        }))
    );

    let ticking = harness.id(V1_20_3, ConnectionState::Play, CB, PacketKind::TICKING_STEP);
    let outcome = pipeline
        .process_clientbound(packet(ticking, |buf| VarInt(5).write(buf)))
        .unwrap();
    assert_eq!(outcome, Outcome::Cancelled);
}

#[test]
fn test_login_success_gains_strict_flag() {
    let harness = Harness::new();
    let mut pipeline = harness.pipeline(V1_20_5, V1_20_3, ConnectionState::Login);

    let body = |buf: &mut BytesMut| {
        Uuid::from_u128(7).write(buf);
        "Steve".to_string().write(buf);
        VarInt(0).write(buf); // properties
    };
    let id = harness.id(V1_20_3, ConnectionState::Login, CB, PacketKind::GAME_PROFILE);
    let outcome = pipeline.process_clientbound(packet(id, body)).unwrap();

    let new_id = harness.id(V1_20_5, ConnectionState::Login, CB, PacketKind::GAME_PROFILE);
    assert_eq!(
        outcome,
        Outcome::Forward(packet(new_id, |buf| {
            body(buf);
            true.write(buf);
        }))
    );
}

#[test]
fn test_registry_data_splits_per_registry() {
    let harness = Harness::new();
    let mut pipeline = harness.pipeline(V1_20_5, V1_20_3, ConnectionState::Configuration);

    let entry = |name: &str, id: i32, element: Tag| {
        let mut compound = Compound::new();
        compound.insert("name", Tag::String(name.into()));
        compound.insert("id", Tag::Int(id));
        compound.insert("element", element);
        Tag::Compound(compound)
    };
    let registry = |kind: &str, entries: Vec<Tag>| {
        let mut compound = Compound::new();
        compound.insert("type", Tag::String(kind.into()));
        compound.insert("value", Tag::list(entries));
        Tag::Compound(compound)
    };

    let mut coast = Compound::new();
    coast.insert("asset_id", Tag::String("minecraft:coast".into()));
    coast.insert("template_item", Tag::String("minecraft:coast_armor_trim_smithing_template".into()));
    coast.insert("description", text("Coast"));
    coast.insert("decal", Tag::Byte(0));

    let mut root = Compound::new();
    root.insert(
        "minecraft:trim_pattern",
        registry(
            "minecraft:trim_pattern",
            vec![entry("minecraft:coast", 0, Tag::Compound(coast.clone()))],
        ),
    );
    root.insert(
        "minecraft:damage_type",
        registry(
            "minecraft:damage_type",
            vec![
                entry("minecraft:in_fire", 1, Tag::Int(1)),
                entry("minecraft:arrow", 0, Tag::Int(0)),
            ],
        ),
    );

    let id = harness.id(V1_20_3, ConnectionState::Configuration, CB, PacketKind::REGISTRY_DATA);
    let raw = packet(id, |buf| Tag::Compound(root).write(buf));

    let packets = pipeline.process_clientbound(raw).unwrap().into_packets();
    assert_eq!(packets.len(), 2);

    let new_id = harness.id(V1_20_5, ConnectionState::Configuration, CB, PacketKind::REGISTRY_DATA);
    let mut trims = PacketWrapper::decode(packets[0].clone()).unwrap();
    assert_eq!(trims.id(), new_id);
    assert_eq!(trims.read::<String>().unwrap(), "minecraft:trim_pattern");
    assert_eq!(
        trims.read::<Vec<RegistryEntry>>().unwrap(),
        vec![RegistryEntry {
            id: "minecraft:coast".into(),
            data: Some(Tag::Compound(coast)),
        }]
    );

    let mut damage = PacketWrapper::decode(packets[1].clone()).unwrap();
    assert_eq!(damage.read::<String>().unwrap(), "minecraft:damage_type");
    let ids: Vec<String> = damage
        .read::<Vec<RegistryEntry>>()
        .unwrap()
        .into_iter()
        .map(|entry| entry.id)
        .collect();
    assert_eq!(ids, vec!["minecraft:arrow", "minecraft:in_fire"]);
}

#[test]
fn test_known_packs_never_reach_older_server() {
    let harness = Harness::new();
    let mut pipeline = harness.pipeline(V1_21, V1_20_2, ConnectionState::Configuration);

    let id = harness.id(V1_21, ConnectionState::Configuration, SB, PacketKind::SELECT_KNOWN_PACKS);
    let outcome = pipeline
        .process_serverbound(packet(id, |buf| VarInt(0).write(buf)))
        .unwrap();
    assert_eq!(outcome, Outcome::Cancelled);
}
