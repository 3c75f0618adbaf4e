//! End-to-end chat turns against a mock Ollama server
//!
//! Drives `ChatSession` through a real `OllamaProvider` pointed at wiremock,
//! then reopens the history files to check what was persisted.

use std::sync::Arc;

use mindchat::config::{Config, OllamaConfig};
use mindchat::history::Role;
use mindchat::providers::{create_provider, CompletionProvider};
use mindchat::{ChatSession, MindchatError, ModeRegistry};
use serde_json::json;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

mod common;

fn ollama_reply(content: &str) -> serde_json::Value {
    json!({
        "model": "llama3.2:1b",
        "message": {"role": "assistant", "content": content},
        "done": true
    })
}

fn session_for(server: &MockServer, config: &mut Config) -> ChatSession {
    config.provider.ollama = OllamaConfig {
        host: server.uri(),
        ..OllamaConfig::default()
    };
    let provider: Arc<dyn CompletionProvider> =
        Arc::from(create_provider(&config.provider).expect("provider"));
    ChatSession::from_config(config, provider, None).expect("session")
}

#[tokio::test]
async fn test_counselor_turn_is_persisted() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .and(body_partial_json(json!({"stream": false})))
        .respond_with(ResponseTemplate::new(200).set_body_json(ollama_reply(
            "  That sounds exhausting. What usually keeps you up?  ",
        )))
        .expect(1)
        .mount(&server)
        .await;

    let tmp = tempfile::tempdir().unwrap();
    let mut config = common::config_in(tmp.path());
    let mut session = session_for(&server, &mut config);

    let conversation = session.send("I can't sleep lately").await.unwrap();
    assert_eq!(conversation.messages.len(), 2);
    assert_eq!(
        conversation.messages[1].content,
        "That sounds exhausting. What usually keeps you up?"
    );

    // The counselor instruction rides in front of the first user turn
    let requests = server.received_requests().await.unwrap();
    let body: serde_json::Value = serde_json::from_slice(&requests[0].body).unwrap();
    let messages = body["messages"].as_array().unwrap();
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0]["role"], "user");
    let content = messages[0]["content"].as_str().unwrap();
    assert!(content.starts_with("You are a polite and empathetic counselor."));
    assert!(content.ends_with("\n\nI can't sleep lately"));

    let registry = ModeRegistry::open(&config).unwrap();
    let stored = registry.store("mind_chat").unwrap().list();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].title, "I can't sleep lately");
    assert_eq!(stored[0].messages[1].role, Role::Assistant);
    assert!(registry.store("plain_chat").unwrap().is_empty());
}

#[tokio::test]
async fn test_plain_mode_sends_no_instruction() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .and(body_partial_json(json!({
            "messages": [{"role": "user", "content": "hello"}]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(ollama_reply("hi there")))
        .expect(1)
        .mount(&server)
        .await;

    let tmp = tempfile::tempdir().unwrap();
    let mut config = common::config_in(tmp.path());
    let mut session = session_for(&server, &mut config);
    session.switch_mode("plain_chat").unwrap();

    let conversation = session.send("hello").await.unwrap();
    assert_eq!(conversation.messages[1].content, "hi there");
}

#[tokio::test]
async fn test_server_error_rolls_back_user_message() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .respond_with(ResponseTemplate::new(500).set_body_string("model not loaded"))
        .mount(&server)
        .await;

    let tmp = tempfile::tempdir().unwrap();
    let mut config = common::config_in(tmp.path());
    let mut session = session_for(&server, &mut config);
    let id = session.ensure_active_conversation().unwrap().conversation_id;

    let err = session.send("are you there?").await.unwrap_err();
    assert!(matches!(
        err.downcast_ref::<MindchatError>(),
        Some(MindchatError::Provider(_))
    ));
    assert!(!session.is_busy());

    let registry = ModeRegistry::open(&config).unwrap();
    let stored = registry.store("mind_chat").unwrap().get(&id).unwrap();
    assert!(stored.messages.is_empty());
}

#[tokio::test]
async fn test_follow_up_turns_alternate_after_failure() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .respond_with(ResponseTemplate::new(200).set_body_json(ollama_reply("I'm here.")))
        .mount(&server)
        .await;

    let tmp = tempfile::tempdir().unwrap();
    let mut config = common::config_in(tmp.path());
    let mut session = session_for(&server, &mut config);
    session.switch_mode("plain_chat").unwrap();

    assert!(session.send("first try").await.is_err());
    let conversation = session.send("second try").await.unwrap();

    let roles: Vec<Role> = conversation.messages.iter().map(|m| m.role).collect();
    assert_eq!(roles, vec![Role::User, Role::Assistant]);
    assert_eq!(conversation.messages[0].content, "second try");
}
