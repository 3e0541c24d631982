// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

fn stage_change() -> Event {
    Event::IssueFieldChanged {
        id: IssueId::from("FEAT-0042"),
        path: PathBuf::from("Issues/Features/open/FEAT-0042-demo.md"),
        field: "stage".to_string(),
        old: serde_json::json!("draft"),
        new: serde_json::json!("doing"),
    }
}

#[test]
fn events_serialize_with_dotted_type_tag() {
    let json = serde_json::to_value(stage_change()).unwrap();
    assert_eq!(json["type"], "issue.field_changed");
    assert_eq!(json["field"], "stage");
    assert_eq!(json["new"], "doing");
}

#[test]
fn event_round_trip() {
    let event = Event::MailboxInboundReady {
        provider: "dingtalk".to_string(),
        session_id: "chat-7".to_string(),
        message_ids: vec![MessageId::new("m1"), MessageId::new("m2")],
        paths: vec![PathBuf::from("a.md"), PathBuf::from("b.md")],
        text: "/deploy now".to_string(),
        mentioned: false,
    };
    let json = serde_json::to_string(&event).unwrap();
    let back: Event = serde_json::from_str(&json).unwrap();
    assert_eq!(back, event);
}

#[test]
fn unknown_type_deserializes_to_custom() {
    let back: Event = serde_json::from_str(r#"{"type": "galaxy.collapsed"}"#).unwrap();
    assert_eq!(back, Event::Custom);
}

#[test]
fn name_matches_serialized_tag() {
    let event = stage_change();
    let json = serde_json::to_value(&event).unwrap();
    assert_eq!(json["type"], event.name());
}

#[test]
fn field_lookup_by_dotted_path() {
    let event = stage_change();
    assert_eq!(event.field("field"), Some(serde_json::json!("stage")));
    assert_eq!(event.field("new"), Some(serde_json::json!("doing")));
    assert_eq!(event.field("missing"), None);
}

#[test]
fn issue_id_accessor_covers_issue_and_session_events() {
    assert_eq!(stage_change().issue_id(), Some(&IssueId::from("FEAT-0042")));

    let session = Event::SessionFailed {
        session_id: SessionId::new("s1"),
        role: Role::Engineer,
        issue_id: Some(IssueId::from("FIX-0001")),
        exit_code: Some(1),
        reason: "exit 1".to_string(),
        log_tail: String::new(),
    };
    assert_eq!(session.issue_id(), Some(&IssueId::from("FIX-0001")));

    let memo = Event::MemoPresent { memos: vec![] };
    assert_eq!(memo.issue_id(), None);
}

#[test]
fn envelope_flattens_event_fields() {
    let envelope = Envelope::new(stage_change(), 1_234);
    let json = serde_json::to_value(&envelope).unwrap();
    assert_eq!(json["type"], "issue.field_changed");
    assert_eq!(json["epoch_ms"], 1_234);
    assert!(json["correlation_id"].is_string());
}

#[test]
fn follow_up_keeps_correlation_id() {
    let envelope = Envelope::new(stage_change(), 1);
    let next = envelope.follow_up(Event::Shutdown, 2);
    assert_eq!(next.correlation_id, envelope.correlation_id);
    assert_eq!(next.epoch_ms, 2);
}

#[test]
fn log_summary_names_the_issue() {
    let summary = stage_change().log_summary();
    assert!(summary.contains("issue.field_changed"));
    assert!(summary.contains("FEAT-0042"));
    assert!(summary.contains("stage"));
}
