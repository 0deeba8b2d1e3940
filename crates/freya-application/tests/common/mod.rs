#![allow(dead_code)]

use async_trait::async_trait;
use freya_application::{ChatOrchestrator, ExecutionPipeline};
use freya_core::identity::{Identity, IdentityContext};
use freya_core::plugin::{Plugin, PluginRegistry, PluginResult, RenderedCard, ResultRenderer};
use freya_core::session::Session;
use freya_infrastructure::{
    GuestChatService, IdentityRoutedChatService, InMemorySessionStore, LocalIdentityProvider,
    MemoryKeyValueStore, RemoteChatService,
};
use regex::Regex;
use serde_json::{Value, json};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;

pub enum Behavior {
    Return(PluginResult),
    Fail(&'static str),
    Panic(&'static str),
    Hang,
    /// Waits for the gate, then returns the result.
    Gated(Arc<Notify>, PluginResult),
}

pub struct ScriptedPlugin {
    name: &'static str,
    trigger: Regex,
    behavior: Behavior,
    with_renderer: bool,
}

fn render(data: &Value) -> RenderedCard {
    RenderedCard::new("card").line(data.to_string())
}

impl ScriptedPlugin {
    pub fn new(name: &'static str, pattern: &str, behavior: Behavior) -> Arc<dyn Plugin> {
        Arc::new(Self {
            name,
            trigger: Regex::new(pattern).unwrap(),
            behavior,
            with_renderer: true,
        })
    }

    pub fn without_renderer(name: &'static str, pattern: &str, behavior: Behavior) -> Arc<dyn Plugin> {
        Arc::new(Self {
            name,
            trigger: Regex::new(pattern).unwrap(),
            behavior,
            with_renderer: false,
        })
    }
}

#[async_trait]
impl Plugin for ScriptedPlugin {
    fn name(&self) -> &str {
        self.name
    }

    fn description(&self) -> &str {
        "scripted"
    }

    fn trigger(&self) -> &Regex {
        &self.trigger
    }

    fn loading_message(&self) -> Option<&str> {
        Some("Working...")
    }

    fn renderer(&self) -> Option<ResultRenderer> {
        self.with_renderer.then_some(render as ResultRenderer)
    }

    async fn execute(&self, _args: &[String]) -> anyhow::Result<PluginResult> {
        match &self.behavior {
            Behavior::Return(result) => Ok(result.clone()),
            Behavior::Fail(message) => Err(anyhow::anyhow!(*message)),
            Behavior::Panic(message) => panic!("{}", message),
            Behavior::Hang => std::future::pending().await,
            Behavior::Gated(gate, result) => {
                gate.notified().await;
                Ok(result.clone())
            }
        }
    }
}

/// Weather stand-in: Paris resolves, anything else is not found.
pub fn weather_registry() -> PluginRegistry {
    PluginRegistry::new()
        .with(ScriptedPlugin::new(
            "weather",
            r"(?i)^/weather\s+paris$",
            Behavior::Return(PluginResult::success(
                "Weather in Paris: 18°C, clear sky.",
                json!({ "city": "Paris", "temp": 18 }),
            )),
        ))
        .with(ScriptedPlugin::new(
            "weather",
            r"(?i)^/weather\s+(.+)",
            Behavior::Return(PluginResult::failure("city not found")),
        ))
}

pub struct Harness {
    pub orchestrator: Arc<ChatOrchestrator>,
    pub sessions: Arc<InMemorySessionStore>,
    pub local: Arc<MemoryKeyValueStore>,
    pub identity: Arc<LocalIdentityProvider>,
}

impl Harness {
    pub fn new(registry: PluginRegistry) -> Self {
        Self::with_timeout(registry, Duration::from_secs(5))
    }

    pub fn with_timeout(registry: PluginRegistry, timeout: Duration) -> Self {
        Self::build(
            registry,
            timeout,
            Arc::new(InMemorySessionStore::new()),
            Arc::new(MemoryKeyValueStore::new()),
            Arc::new(LocalIdentityProvider::new()),
        )
    }

    /// A second window over the same stores, as after a restart.
    pub fn reopen(&self, registry: PluginRegistry) -> Self {
        Self::build(
            registry,
            Duration::from_secs(5),
            self.sessions.clone(),
            self.local.clone(),
            self.identity.clone(),
        )
    }

    fn build(
        registry: PluginRegistry,
        timeout: Duration,
        sessions: Arc<InMemorySessionStore>,
        local: Arc<MemoryKeyValueStore>,
        identity: Arc<LocalIdentityProvider>,
    ) -> Self {
        let service = Arc::new(IdentityRoutedChatService::new(
            Arc::new(GuestChatService::new(local.clone())),
            Arc::new(RemoteChatService::new(sessions.clone(), local.clone())),
        ));
        let orchestrator = Arc::new(ChatOrchestrator::new(
            service,
            identity.clone(),
            ExecutionPipeline::new(registry, timeout),
        ));
        Self {
            orchestrator,
            sessions,
            local,
            identity,
        }
    }
}

pub fn user(id: &str) -> IdentityContext {
    IdentityContext::Authenticated(Identity {
        id: id.to_string(),
        email: Some(format!("{id}@example.com")),
    })
}

pub fn stored_session(id: &str, owner: &str, updated: &str) -> Session {
    Session {
        id: id.to_string(),
        user_id: Some(owner.to_string()),
        name: format!("Chat {id}"),
        messages: Vec::new(),
        created_at: updated.to_string(),
        last_updated_at: updated.to_string(),
    }
}
