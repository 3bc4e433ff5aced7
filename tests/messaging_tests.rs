use serde_json::json;
use uuid::Uuid;
use wiremock::matchers::{any, body_json, body_partial_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use kehilla::messaging::{Audience, MessagingService, ReplyTarget};
use kehilla::Backend;

fn message_row(conversation_id: Uuid, content: &str) -> serde_json::Value {
    json!({
        "id": Uuid::new_v4(),
        "conversation_id": conversation_id,
        "sender_id": Uuid::new_v4(),
        "content": content,
        "parent_message_id": null,
        "reply_snippet": null,
        "is_read_by_user": true,
        "is_read_by_admin": false,
        "created_at": "2026-03-01T10:00:00Z",
        "sender": {
            "id": Uuid::new_v4(),
            "first_name": "Moshe",
            "last_name": null,
            "role": "user",
            "admin_display_name": null
        }
    })
}

#[tokio::test]
async fn opening_a_conversation_clears_only_the_openers_flag() {
    let mock_server = MockServer::start().await;
    let conversation_id = Uuid::new_v4();
    let admin_id = Uuid::new_v4();

    // One blanket update scoped to the conversation, flipping only the
    // admin-side flag.
    Mock::given(method("PATCH"))
        .and(path("/rest/v1/messages"))
        .and(query_param(
            "conversation_id",
            format!("eq.{}", conversation_id),
        ))
        .and(body_json(json!({ "is_read_by_admin": true })))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/messages"))
        .and(query_param(
            "conversation_id",
            format!("eq.{}", conversation_id),
        ))
        .and(query_param("order", "created_at.asc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            message_row(conversation_id, "first"),
            message_row(conversation_id, "second"),
        ])))
        .expect(1)
        .mount(&mock_server)
        .await;

    let backend = Backend::new(&mock_server.uri(), "test-anon-key");
    let service = MessagingService::new(&backend, Audience::Admin, admin_id);

    let transcript = service.open_conversation(conversation_id).await.unwrap();
    assert_eq!(transcript.len(), 2);
    assert_eq!(transcript[0].content.as_deref(), Some("first"));
}

#[tokio::test]
async fn a_reply_carries_the_frozen_snippet() {
    let mock_server = MockServer::start().await;
    let conversation_id = Uuid::new_v4();
    let user_id = Uuid::new_v4();
    let quoted_id = Uuid::new_v4();

    Mock::given(method("POST"))
        .and(path("/rest/v1/messages"))
        .and(body_partial_json(json!({
            "conversation_id": conversation_id,
            "sender_id": user_id,
            "content": "Yes please, still available?",
            "parent_message_id": quoted_id,
            "reply_snippet": "Replying to Sarah (Staff): \"The delivery slot moved to Tue..."
        })))
        .respond_with(ResponseTemplate::new(201))
        .expect(1)
        .mount(&mock_server)
        .await;

    let backend = Backend::new(&mock_server.uri(), "test-anon-key");
    let service = MessagingService::new(&backend, Audience::User, user_id);

    let target = ReplyTarget {
        message_id: quoted_id,
        sender_name: "Sarah (Staff)".to_string(),
        content: "The delivery slot moved to Tuesday morning".to_string(),
    };
    service
        .send_message(conversation_id, "Yes please, still available?", Some(&target))
        .await
        .unwrap();
}

#[tokio::test]
async fn blank_messages_never_reach_the_network() {
    let mock_server = MockServer::start().await;

    Mock::given(any())
        .respond_with(ResponseTemplate::new(500))
        .expect(0)
        .mount(&mock_server)
        .await;

    let backend = Backend::new(&mock_server.uri(), "test-anon-key");
    let service = MessagingService::new(&backend, Audience::User, Uuid::new_v4());

    let result = service.send_message(Uuid::new_v4(), "   ", None).await;
    assert!(matches!(result, Err(kehilla::error::Error::Validation(_))));

    let result = service.start_conversation("").await;
    assert!(matches!(result, Err(kehilla::error::Error::Validation(_))));
}

#[tokio::test]
async fn unread_badge_follows_the_callers_audience() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/rest/v1/rpc/get_my_conversations"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {
                "conversation_id": Uuid::new_v4(),
                "topic": "Chicken order",
                "last_message_content": "Any update?",
                "has_unread_user": false
            },
            {
                "conversation_id": Uuid::new_v4(),
                "topic": "Delivery",
                "last_message_content": "Moved to Tuesday",
                "has_unread_user": true
            }
        ])))
        .mount(&mock_server)
        .await;

    let backend = Backend::new(&mock_server.uri(), "test-anon-key");
    let service = MessagingService::new(&backend, Audience::User, Uuid::new_v4());

    assert!(service.has_unread().await.unwrap());
}

#[tokio::test]
async fn starting_a_conversation_returns_the_created_row() {
    let mock_server = MockServer::start().await;
    let user_id = Uuid::new_v4();
    let conversation_id = Uuid::new_v4();

    Mock::given(method("POST"))
        .and(path("/rest/v1/conversations"))
        .and(body_json(json!({
            "user_id": user_id,
            "topic": "Kitchen table pickup"
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([{
            "id": conversation_id,
            "user_id": user_id,
            "topic": "Kitchen table pickup",
            "created_at": "2026-03-01T10:00:00Z"
        }])))
        .expect(1)
        .mount(&mock_server)
        .await;

    let backend = Backend::new(&mock_server.uri(), "test-anon-key");
    let service = MessagingService::new(&backend, Audience::User, user_id);

    let conversation = service
        .start_conversation("  Kitchen table pickup  ")
        .await
        .unwrap();
    assert_eq!(conversation.id, conversation_id);
    assert_eq!(conversation.topic, "Kitchen table pickup");
}
