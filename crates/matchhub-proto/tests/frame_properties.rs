//! Property-based tests for frame decoding.
//!
//! Inbound frames come from an untrusted peer over an at-least-once channel.
//! Decoding must never panic, and every well-formed message frame must decode
//! to exactly the fields it carried, whatever spelling the server used.

use matchhub_proto::{ClientFrame, MessageKind, ProtocolError, ServerFrame, Timestamp};
use proptest::prelude::*;
use serde_json::{Value, json};

fn arbitrary_kind() -> impl Strategy<Value = MessageKind> {
    prop_oneof![
        Just(MessageKind::Text),
        Just(MessageKind::Image),
        Just(MessageKind::Voice),
        Just(MessageKind::Gift),
        Just(MessageKind::Sticker),
    ]
}

/// Field spellings the server and REST API use for the same message.
#[derive(Debug, Clone, Copy)]
enum Spelling {
    Socket,
    Rest,
    Camel,
}

fn arbitrary_spelling() -> impl Strategy<Value = Spelling> {
    prop_oneof![Just(Spelling::Socket), Just(Spelling::Rest), Just(Spelling::Camel)]
}

fn message_frame(
    spelling: Spelling,
    id: &str,
    sender: &str,
    kind: MessageKind,
    content: &str,
    created_at: &str,
) -> Value {
    match spelling {
        Spelling::Socket => json!({
            "type": "message",
            "message_id": id,
            "sender": sender,
            "message_type": kind.as_str(),
            "content": content,
            "media_url": "",
            "timestamp": created_at,
        }),
        Spelling::Rest => json!({
            "type": "message",
            "message": {
                "id": id,
                "sender": {"anonymous_handle": sender},
                "message_type": kind.as_str(),
                "content": content,
                "seen": false,
                "created_at": created_at,
            }
        }),
        Spelling::Camel => json!({
            "type": "message",
            "id": id,
            "senderHandle": sender,
            "messageType": kind.as_str(),
            "content": content,
            "createdAt": created_at,
        }),
    }
}

proptest! {
    #[test]
    fn decode_never_panics_on_arbitrary_text(text in ".{0,256}") {
        let _ = ServerFrame::decode(&text);
    }

    #[test]
    fn decode_never_panics_on_arbitrary_objects(
        tag in prop::option::of("[a-z_]{0,12}"),
        keys in prop::collection::vec("[a-z_]{1,12}", 0..6),
        values in prop::collection::vec(any::<i64>(), 0..6),
    ) {
        let mut object = serde_json::Map::new();
        if let Some(tag) = tag {
            object.insert("type".to_string(), Value::String(tag));
        }
        for (key, value) in keys.into_iter().zip(values) {
            object.insert(key, json!(value));
        }
        let _ = ServerFrame::decode(&Value::Object(object).to_string());
    }

    #[test]
    fn message_frames_decode_in_every_spelling(
        spelling in arbitrary_spelling(),
        id in "[a-zA-Z0-9-]{1,36}",
        sender in "[a-z]{1,10}-[a-z]{1,10}",
        kind in arbitrary_kind(),
        content in ".{0,64}",
        secs in 0i64..4_000_000_000,
    ) {
        let created_at = chrono::DateTime::from_timestamp(secs, 0)
            .map(|at| at.to_rfc3339())
            .unwrap_or_default();
        let frame = message_frame(spelling, &id, &sender, kind, &content, &created_at);

        match ServerFrame::decode(&frame.to_string()) {
            Ok(ServerFrame::Message(msg)) => {
                prop_assert_eq!(msg.id.as_str(), id.as_str());
                prop_assert_eq!(msg.sender_handle, sender);
                prop_assert_eq!(msg.kind, kind);
                prop_assert_eq!(msg.content, content);
                prop_assert_eq!(msg.media_url, None);
                prop_assert!(!msg.seen);
                prop_assert_eq!(msg.created_at, Timestamp::parse(&created_at));
            },
            other => prop_assert!(false, "expected message frame, got {:?}", other),
        }
    }

    #[test]
    fn unknown_tags_never_fail(tag in "[a-z]{1,16}") {
        prop_assume!(!["message", "typing", "seen", "user_joined", "user_left"].contains(&tag.as_str()));

        let frame = json!({"type": tag, "payload": {"anything": [1, 2, 3]}});
        prop_assert_eq!(
            ServerFrame::decode(&frame.to_string()),
            Ok(ServerFrame::Unknown { tag })
        );
    }

    #[test]
    fn outbound_frames_are_tagged_json(content in ".{0,64}", kind in arbitrary_kind()) {
        let frame = ClientFrame::Message { message_type: kind, content: content.clone(), media_url: None };
        let encoded = frame.encode().unwrap();
        let value: Value = serde_json::from_str(&encoded).unwrap();

        prop_assert_eq!(&value["type"], "message");
        prop_assert_eq!(&value["message_type"], kind.as_str());
        prop_assert_eq!(&value["content"], content.as_str());
        prop_assert!(value.get("media_url").is_none());
    }
}

#[test]
fn frames_without_type_or_error_are_rejected() {
    assert_eq!(ServerFrame::decode(r#"{"message_id":"m1"}"#), Err(ProtocolError::MissingType));
    assert_eq!(ServerFrame::decode(r#"{"error":42}"#), Err(ProtocolError::MissingType));
}
