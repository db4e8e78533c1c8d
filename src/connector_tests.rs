//! Tests for the provider SPI surface.

use super::*;

#[test]
fn test_message_kind_parses_known_kinds() {
    assert_eq!(
        "durable".parse::<MessageKind>().unwrap(),
        MessageKind::Durable
    );
    assert_eq!(
        "non-durable".parse::<MessageKind>().unwrap(),
        MessageKind::NonDurable
    );
}

#[test]
fn test_message_kind_rejects_unknown_kind() {
    let err = "transient".parse::<MessageKind>().unwrap_err();
    assert!(
        matches!(err, QueueError::UnsupportedMessageKind { ref kind } if kind == "transient")
    );
}

#[test]
fn test_message_kind_display_round_trips() {
    for kind in [MessageKind::Durable, MessageKind::NonDurable] {
        assert_eq!(kind.to_string().parse::<MessageKind>().unwrap(), kind);
    }
}

#[test]
fn test_message_kind_durability() {
    assert!(MessageKind::Durable.is_durable());
    assert!(!MessageKind::NonDurable.is_durable());
}

#[test]
fn test_message_kind_serde_naming_matches_display() {
    let json = serde_json::to_string(&MessageKind::NonDurable).unwrap();
    assert_eq!(json, "\"non-durable\"");

    let parsed: MessageKind = serde_json::from_str(&json).unwrap();
    assert_eq!(parsed, MessageKind::NonDurable);
}
