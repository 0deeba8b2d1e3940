mod common;

use common::{Behavior, Harness, ScriptedPlugin, weather_registry};
use freya_application::{CRITICAL_ERROR_CONTENT, CommandOutcome, FALLBACK_REPLY, PLUGIN_ERROR_CONTENT};
use freya_core::error::FreyaError;
use freya_core::identity::IdentityContext;
use freya_core::plugin::{PluginRegistry, PluginResult};
use freya_core::session::{MessageType, Sender};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;

#[tokio::test]
async fn test_unmatched_input_gets_fallback_without_loading() {
    let harness = Harness::new(weather_registry());
    let chat = &harness.orchestrator;
    chat.initialize(IdentityContext::Guest).await.unwrap();

    let outcome = chat.send_message("hello").await.unwrap();
    assert!(matches!(outcome, CommandOutcome::Fallback(_)));

    let state = chat.state().await;
    assert_eq!(state.current_messages.len(), 2);
    assert_eq!(state.current_messages[0].sender, Sender::User);
    assert_eq!(state.current_messages[0].content, "hello");
    let reply = &state.current_messages[1];
    assert_eq!(reply.sender, Sender::Assistant);
    assert_eq!(reply.message_type, MessageType::Text);
    assert_eq!(reply.content, FALLBACK_REPLY);
    assert!(!state.is_assistant_processing);
}

#[tokio::test]
async fn test_weather_scenario() {
    let harness = Harness::new(weather_registry());
    let chat = &harness.orchestrator;
    chat.initialize(IdentityContext::Guest).await.unwrap();

    chat.send_message("/weather Paris").await.unwrap();
    chat.send_message("/weather Atlantis").await.unwrap();

    let messages = chat.state().await.current_messages;
    assert_eq!(messages.len(), 4);
    assert!(messages.iter().all(|m| !m.is_loading()));

    let paris = &messages[1];
    assert_eq!(paris.message_type, MessageType::Plugin);
    assert_eq!(paris.content, "Weather in Paris: 18°C, clear sky.");
    assert_eq!(paris.plugin_data, Some(json!({ "city": "Paris", "temp": 18 })));
    assert_eq!(paris.plugin_name.as_deref(), Some("weather"));

    let atlantis = &messages[3];
    assert_eq!(atlantis.message_type, MessageType::Error);
    assert_eq!(atlantis.error_message.as_deref(), Some("city not found"));
    assert_eq!(atlantis.content, "city not found");
}

#[tokio::test]
async fn test_data_without_renderer_is_text() {
    let registry = PluginRegistry::new().with(ScriptedPlugin::without_renderer(
        "calc",
        r"^/calc\s+(.+)",
        Behavior::Return(PluginResult::success("2+2 = 4", json!({ "result": 4 }))),
    ));
    let harness = Harness::new(registry);
    let chat = &harness.orchestrator;
    chat.initialize(IdentityContext::Guest).await.unwrap();

    let outcome = chat.send_message("/calc  2+2  ").await.unwrap();
    let message = outcome.message().unwrap();
    assert_eq!(message.message_type, MessageType::Text);
    assert_eq!(message.content, "2+2 = 4");
    assert_eq!(message.plugin_data, Some(json!({ "result": 4 })));
}

#[tokio::test]
async fn test_empty_failure_uses_generic_content() {
    let registry = PluginRegistry::new().with(ScriptedPlugin::new(
        "quiet",
        r"^/quiet$",
        Behavior::Return(PluginResult::failure("")),
    ));
    let harness = Harness::new(registry);
    let chat = &harness.orchestrator;
    chat.initialize(IdentityContext::Guest).await.unwrap();

    let outcome = chat.send_message("/quiet").await.unwrap();
    assert_eq!(outcome.message().unwrap().content, PLUGIN_ERROR_CONTENT);
}

#[tokio::test]
async fn test_critical_errors_are_distinct_from_reported_failures() {
    let registry = PluginRegistry::new()
        .with(ScriptedPlugin::new(
            "broken",
            r"^/broken$",
            Behavior::Fail("socket closed"),
        ))
        .with(ScriptedPlugin::new(
            "panicky",
            r"^/panic$",
            Behavior::Panic("index out of bounds"),
        ));
    let harness = Harness::new(registry);
    let chat = &harness.orchestrator;
    chat.initialize(IdentityContext::Guest).await.unwrap();

    let broken = chat.send_message("/broken").await.unwrap();
    let broken = broken.message().unwrap();
    assert_eq!(broken.message_type, MessageType::Error);
    assert_eq!(broken.content, CRITICAL_ERROR_CONTENT);
    assert_eq!(broken.error_message.as_deref(), Some("socket closed"));
    assert_eq!(broken.plugin_name.as_deref(), Some("broken"));

    let panicked = chat.send_message("/panic").await.unwrap();
    let panicked = panicked.message().unwrap();
    assert_eq!(panicked.content, CRITICAL_ERROR_CONTENT);
    assert_eq!(
        panicked.error_message.as_deref(),
        Some("Plugin panicked: index out of bounds")
    );
    assert!(!chat.state().await.is_assistant_processing);
}

#[tokio::test]
async fn test_hung_plugin_times_out() {
    let registry = PluginRegistry::new().with(ScriptedPlugin::new("slow", r"^/slow$", Behavior::Hang));
    let harness = Harness::with_timeout(registry, Duration::from_millis(50));
    let chat = &harness.orchestrator;
    chat.initialize(IdentityContext::Guest).await.unwrap();

    let outcome = chat.send_message("/slow").await.unwrap();
    let message = outcome.message().unwrap();
    assert_eq!(message.content, CRITICAL_ERROR_CONTENT);
    assert!(message.error_message.as_deref().unwrap().contains("timed out"));

    let state = chat.state().await;
    assert_eq!(state.current_messages.len(), 2);
    assert!(!state.is_assistant_processing);
}

#[tokio::test]
async fn test_loading_placeholder_is_replaced_in_place() {
    let gate = Arc::new(Notify::new());
    let registry = PluginRegistry::new().with(ScriptedPlugin::new(
        "slow",
        r"^/slow$",
        Behavior::Gated(gate.clone(), PluginResult::text("done")),
    ));
    let harness = Harness::new(registry);
    let chat = harness.orchestrator.clone();
    chat.initialize(IdentityContext::Guest).await.unwrap();

    let task = tokio::spawn({
        let chat = chat.clone();
        async move { chat.send_message("/slow").await }
    });
    while chat.state().await.current_messages.len() < 2 {
        tokio::task::yield_now().await;
    }

    let state = chat.state().await;
    let loading = state.current_messages[1].clone();
    assert!(loading.is_loading());
    assert_eq!(loading.content, "Working...");
    assert!(state.is_assistant_processing);

    let busy = chat.send_message("/slow").await.unwrap_err();
    assert!(matches!(busy, FreyaError::AssistantBusy));

    gate.notify_one();
    task.await.unwrap().unwrap();

    let messages = chat.state().await.current_messages;
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[1].id, loading.id);
    assert_eq!(messages[1].content, "done");
    assert_eq!(messages[1].message_type, MessageType::Text);
}

#[tokio::test]
async fn test_submission_preconditions() {
    let harness = Harness::new(weather_registry());
    let chat = &harness.orchestrator;

    let err = chat.send_message("hello").await.unwrap_err();
    assert!(matches!(err, FreyaError::NoActiveSession));

    chat.initialize(IdentityContext::Guest).await.unwrap();
    let err = chat.send_message("   ").await.unwrap_err();
    assert!(matches!(err, FreyaError::EmptyInput));
    assert!(chat.state().await.current_messages.is_empty());
}

#[tokio::test]
async fn test_identity_change_discards_in_flight_result() {
    let gate = Arc::new(Notify::new());
    let registry = PluginRegistry::new().with(ScriptedPlugin::new(
        "slow",
        r"^/slow$",
        Behavior::Gated(gate.clone(), PluginResult::text("late answer")),
    ));
    let harness = Harness::new(registry);
    let chat = harness.orchestrator.clone();
    chat.initialize(IdentityContext::Guest).await.unwrap();

    let task = tokio::spawn({
        let chat = chat.clone();
        async move { chat.send_message("/slow").await }
    });
    while chat.state().await.current_messages.len() < 2 {
        tokio::task::yield_now().await;
    }

    chat.initialize(IdentityContext::Guest).await.unwrap();
    gate.notify_one();
    let outcome = task.await.unwrap().unwrap();
    assert_eq!(outcome, CommandOutcome::Discarded);

    let state = chat.state().await;
    assert!(state.current_messages.is_empty());
    assert!(!state.is_assistant_processing);
    assert!(state.is_initialized);
}
