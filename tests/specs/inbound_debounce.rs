//! Three messages in one chat thread surface as one debounced event, and
//! the slash-command text routes a Prime session.

use crate::prelude::World;
use monoco_adapters::FakeEngineAdapter;
use monoco_core::{Event, MessageId, Role};
use monoco_ticket::{Direction, MailMessage, MailSession, MailStatus, Participants};

fn message(id: &str, body: &str, second: u32) -> MailMessage {
    MailMessage {
        id: MessageId::new(id),
        provider: "chat".to_string(),
        direction: Direction::Inbound,
        content_type: "text/markdown".to_string(),
        created_at: chrono::NaiveDate::from_ymd_opt(2026, 3, 1)
            .unwrap()
            .and_hms_opt(10, 0, second)
            .unwrap(),
        sent_at: None,
        status: MailStatus::Pending,
        retry_count: 0,
        next_retry_at: None,
        error_message: None,
        session: MailSession {
            id: "chat-7".to_string(),
            thread_key: None,
        },
        participants: Participants::default(),
        artifacts: vec![],
        extras: Default::default(),
        body: body.to_string(),
    }
}

#[tokio::test]
async fn burst_aggregates_and_routes_prime_once() {
    let mut world = World::build(FakeEngineAdapter::succeeding(), |_, _| {}).await;
    let inbound = world.paths.mailbox_inbound("chat");

    for (i, body) in ["/deploy the api", "with canary", "thanks"].iter().enumerate() {
        let msg = message(&format!("m{}", i + 1), body, i as u32);
        msg.save(&inbound.join(msg.file_name())).unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(80)).await;
    }

    let event = world.wait_for("mailbox.inbound.ready").await;
    let Event::MailboxInboundReady {
        message_ids, paths, ..
    } = event
    else {
        unreachable!();
    };
    assert_eq!(message_ids, vec![
        MessageId::new("m1"),
        MessageId::new("m2"),
        MessageId::new("m3"),
    ]);
    // Aggregation does not consume: each file remains on disk
    for path in &paths {
        assert!(path.exists());
    }

    world.wait_for("session.completed").await;
    let calls = world.fake.calls();
    assert_eq!(calls.len(), 1, "one debounce window, one Prime");
    assert_eq!(calls[0].role, Role::Prime);
    assert!(calls[0].prompt.contains("/deploy the api"));
    assert!(calls[0].prompt.contains("thanks"));

    world.teardown().await;
}

#[tokio::test]
async fn plain_chat_without_mention_does_not_route() {
    let mut world = World::build(FakeEngineAdapter::succeeding(), |_, _| {}).await;
    let inbound = world.paths.mailbox_inbound("chat");

    let msg = message("m1", "just people talking", 0);
    msg.save(&inbound.join(msg.file_name())).unwrap();

    world.wait_for("mailbox.inbound.ready").await;
    tokio::time::sleep(std::time::Duration::from_millis(300)).await;
    assert!(world.fake.calls().is_empty());

    world.teardown().await;
}
