mod common;

use odin_tutor::db::{self, ChatStore, DbConfig, NewCodeSubmission};
use odin_tutor::llm::Message;
use odin_tutor::models::transcript_from_messages;
use serde_json::json;
use testcontainers::clients::Cli;
use uuid::Uuid;

// Keeps _docker and _container alive for the duration of the test
macro_rules! setup_test {
    ($docker:ident, $container:ident, $store:ident) => {
        let $docker = Cli::default();
        let $container = $docker.run(common::create_postgres_container());

        // The image restarts PostgreSQL once after its init scripts
        tokio::time::sleep(tokio::time::Duration::from_secs(3)).await;

        let host_port = $container.get_host_port_ipv4(common::POSTGRES_PORT);
        let connection_string = common::build_connection_string("127.0.0.1", host_port);
        let pool = DbConfig::from_connection_string(&connection_string)
            .unwrap()
            .build_pool()
            .unwrap();
        let $store = ChatStore::new(pool);
        $store.migrate().await.expect("Failed to migrate");
    };
}

fn submission(user: &str, slug: &str, code: &str) -> NewCodeSubmission {
    NewCodeSubmission {
        external_user_id: user.to_string(),
        question_slug: slug.to_string(),
        code: code.to_string(),
        language: "rust".to_string(),
        problem_title: Some("Two Sum".to_string()),
        submission_status: "accepted".to_string(),
    }
}

// ============================================================================
// chats
// ============================================================================

#[tokio::test]
async fn test_migrate_is_idempotent() {
    setup_test!(_docker, _container, store);

    store.migrate().await.expect("Second migration failed");
}

#[tokio::test]
async fn test_save_and_get_chat() {
    setup_test!(_docker, _container, store);

    let id = Uuid::new_v4();
    let messages = vec![Message::user("What is a heap?"), Message::assistant("A tree...")];
    let value = serde_json::to_value(&messages).unwrap();

    store
        .save_chat(id, &value, "u-alice", Some("alice@example.com"))
        .await
        .unwrap();

    let record = store.get_chat(id).await.unwrap().expect("chat missing");
    assert_eq!(record.id, id);
    assert_eq!(record.external_user_id, "u-alice");
    assert_eq!(record.user_email.as_deref(), Some("alice@example.com"));

    let stored: Vec<Message> = serde_json::from_value(record.messages).unwrap();
    let transcript = transcript_from_messages(&stored, record.created_at);
    assert_eq!(transcript.len(), 2);
    assert_eq!(transcript[1].id, "msg_2");
}

#[tokio::test]
async fn test_save_chat_upsert_replaces_messages() {
    setup_test!(_docker, _container, store);

    let id = Uuid::new_v4();
    store.save_chat(id, &json!([]), "u-alice", None).await.unwrap();
    let first = store.get_chat(id).await.unwrap().unwrap();

    let updated = serde_json::to_value(vec![Message::user("hi")]).unwrap();
    store
        .save_chat(id, &updated, "u-alice", Some("alice@example.com"))
        .await
        .unwrap();

    let second = store.get_chat(id).await.unwrap().unwrap();
    assert_eq!(second.external_user_id, "u-alice");
    assert_eq!(second.user_email, None);
    assert_eq!(second.created_at, first.created_at);
    assert_eq!(second.messages, updated);
}

#[tokio::test]
async fn test_save_chat_refuses_other_owner() {
    setup_test!(_docker, _container, store);

    let id = Uuid::new_v4();
    let original = serde_json::to_value(vec![Message::user("my notes")]).unwrap();
    store.save_chat(id, &original, "u-alice", None).await.unwrap();

    let hijack = serde_json::to_value(vec![Message::user("overwritten")]).unwrap();
    let result = store
        .save_chat(id, &hijack, "u-mallory", Some("m@example.com"))
        .await;
    assert!(matches!(result, Err(db::Error::NotFoundError(_))));

    let record = store.get_chat(id).await.unwrap().unwrap();
    assert_eq!(record.external_user_id, "u-alice");
    assert_eq!(record.messages, original);
}

#[tokio::test]
async fn test_get_missing_chat() {
    setup_test!(_docker, _container, store);

    assert!(store.get_chat(Uuid::new_v4()).await.unwrap().is_none());
}

#[tokio::test]
async fn test_chats_for_user_newest_first() {
    setup_test!(_docker, _container, store);

    let older = Uuid::new_v4();
    let newer = Uuid::new_v4();
    store.save_chat(older, &json!([]), "u-alice", None).await.unwrap();
    tokio::time::sleep(tokio::time::Duration::from_millis(20)).await;
    store.save_chat(newer, &json!([]), "u-alice", None).await.unwrap();
    store.save_chat(Uuid::new_v4(), &json!([]), "u-bob", None).await.unwrap();

    let chats = store.chats_for_user("u-alice").await.unwrap();
    let ids: Vec<Uuid> = chats.iter().map(|c| c.id).collect();
    assert_eq!(ids, [newer, older]);

    assert!(store.chats_for_user("u-nobody").await.unwrap().is_empty());
}

#[tokio::test]
async fn test_delete_chat() {
    setup_test!(_docker, _container, store);

    let id = Uuid::new_v4();
    store.save_chat(id, &json!([]), "u-alice", None).await.unwrap();

    assert!(store.delete_chat(id).await.unwrap());
    assert!(!store.delete_chat(id).await.unwrap());
    assert!(store.get_chat(id).await.unwrap().is_none());
}

// ============================================================================
// code submissions
// ============================================================================

#[tokio::test]
async fn test_latest_submission() {
    setup_test!(_docker, _container, store);

    store
        .insert_code_submission(&submission("u-alice", "two-sum", "fn first() {}"))
        .await
        .unwrap();
    tokio::time::sleep(tokio::time::Duration::from_millis(20)).await;
    let latest_id = store
        .insert_code_submission(&submission("u-alice", "two-sum", "fn second() {}"))
        .await
        .unwrap();

    let latest = store
        .latest_submission("u-alice", "two-sum")
        .await
        .unwrap()
        .expect("submission missing");
    assert_eq!(latest.id, latest_id);
    assert_eq!(latest.code, "fn second() {}");
    assert_eq!(latest.language, "rust");
    assert_eq!(latest.submission_status, "accepted");

    assert!(store
        .latest_submission("u-bob", "two-sum")
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn test_insert_submission_rejects_blank_slug() {
    setup_test!(_docker, _container, store);

    let err = store
        .insert_code_submission(&submission("u-alice", "  ", "code"))
        .await
        .unwrap_err();
    assert!(matches!(err, db::Error::ValidationError(_)));
}
