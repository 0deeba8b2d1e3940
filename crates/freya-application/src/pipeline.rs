//! Command execution.
//!
//! One submitted line goes `idle → user message → loading → resolved`. The user
//! message and the loading placeholder are appended before the plugin is awaited;
//! the placeholder is then replaced in place by the final message.

use async_trait::async_trait;
use freya_core::error::{FreyaError, Result};
use freya_core::plugin::{Plugin, PluginRegistry, PluginResult, TriggerMatch};
use freya_core::session::Message;
use freya_core::state::ChatAction;
use futures::FutureExt;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, warn};

use crate::store::{ChatStore, CommandTag, Dispatched};

/// Reply to input no plugin recognises.
pub const FALLBACK_REPLY: &str = "I didn't understand that.";

/// Content of the message that replaces a plugin that crashed, hung or panicked.
pub const CRITICAL_ERROR_CONTENT: &str = "Critical Plugin Execution Error";

/// Content of a reported plugin failure that carried no error text.
pub const PLUGIN_ERROR_CONTENT: &str = "Plugin Error";

/// Applies state changes on behalf of a command.
///
/// The orchestrator implements this to schedule a save after every transcript
/// change; a bare [`ChatStore`] applies changes without persisting them.
#[async_trait]
pub trait ChatDispatcher: Send + Sync {
    fn store(&self) -> &ChatStore;

    /// Called after each state change made for a command.
    async fn dispatched(&self, _outcome: &Dispatched) {}
}

#[async_trait]
impl ChatDispatcher for ChatStore {
    fn store(&self) -> &ChatStore {
        self
    }
}

/// What happened to a submitted command.
#[derive(Debug, Clone, PartialEq)]
pub enum CommandOutcome {
    /// No plugin matched; the fallback reply was appended.
    Fallback(Message),
    /// A plugin ran and its final message replaced the loading placeholder.
    Resolved(Message),
    /// The session or identity changed while the plugin ran; the result was dropped.
    Discarded,
}

impl CommandOutcome {
    pub fn message(&self) -> Option<&Message> {
        match self {
            Self::Fallback(message) | Self::Resolved(message) => Some(message),
            Self::Discarded => None,
        }
    }
}

enum Resolution {
    Completed(PluginResult),
    Faulted(String),
    Cancelled,
}

pub struct ExecutionPipeline {
    registry: PluginRegistry,
    plugin_timeout: Duration,
}

impl ExecutionPipeline {
    pub fn new(registry: PluginRegistry, plugin_timeout: Duration) -> Self {
        Self {
            registry,
            plugin_timeout,
        }
    }

    pub fn registry(&self) -> &PluginRegistry {
        &self.registry
    }

    /// Runs one line of user input against the active session.
    ///
    /// # Errors
    ///
    /// Only submission preconditions fail: `EmptyInput`, `NoActiveSession` and
    /// `AssistantBusy`. Plugin failures become transcript messages.
    pub async fn submit(&self, dispatcher: &dyn ChatDispatcher, text: &str) -> Result<CommandOutcome> {
        let text = text.trim();
        if text.is_empty() {
            return Err(FreyaError::EmptyInput);
        }

        let store = dispatcher.store();
        let (tag, admitted) = store.begin_command(Message::user_text(text)).await?;
        dispatcher.dispatched(&admitted).await;
        let cancellation = admitted.context.cancellation().clone();

        let outcome = match self.registry.find_plugin_for_message(text) {
            TriggerMatch::NoMatch => {
                let reply = Message::assistant_text(FALLBACK_REPLY);
                if self.apply(dispatcher, &tag, ChatAction::AddMessage(reply.clone())).await {
                    CommandOutcome::Fallback(reply)
                } else {
                    CommandOutcome::Discarded
                }
            }
            TriggerMatch::PluginMatch { plugin, args } => {
                self.run_command(dispatcher, &tag, &plugin, &args, &cancellation)
                    .await
            }
        };

        if let Some(done) = store
            .dispatch_in_epoch(tag.epoch, ChatAction::SetAssistantProcessing(false))
            .await
        {
            dispatcher.dispatched(&done).await;
        }
        Ok(outcome)
    }

    async fn run_command(
        &self,
        dispatcher: &dyn ChatDispatcher,
        tag: &CommandTag,
        plugin: &Arc<dyn Plugin>,
        args: &[String],
        cancellation: &CancellationToken,
    ) -> CommandOutcome {
        let loading_id = Message::new_id();
        let loading = Message::loading(loading_id.clone(), plugin.name(), plugin.loading_label());
        if !self.apply(dispatcher, tag, ChatAction::AddMessage(loading)).await {
            return CommandOutcome::Discarded;
        }

        let final_message = match self.execute(plugin, args, cancellation).await {
            Resolution::Cancelled => {
                warn!(
                    target: "freya::pipeline",
                    plugin = plugin.name(),
                    session_id = %tag.session_id,
                    "Context changed while the plugin was running; result discarded"
                );
                return CommandOutcome::Discarded;
            }
            Resolution::Faulted(description) => Message::plugin_error(
                loading_id,
                plugin.name(),
                CRITICAL_ERROR_CONTENT,
                description,
            ),
            Resolution::Completed(PluginResult::Failure { error }) => {
                let content = if error.is_empty() {
                    PLUGIN_ERROR_CONTENT.to_string()
                } else {
                    error.clone()
                };
                Message::plugin_error(loading_id, plugin.name(), content, error)
            }
            Resolution::Completed(PluginResult::Success { display_text, data }) => {
                let rendered = data.is_some() && plugin.renderer().is_some();
                Message::plugin_result(
                    loading_id,
                    plugin.name(),
                    display_text.unwrap_or_default(),
                    data,
                    rendered,
                )
            }
        };

        if self
            .apply(dispatcher, tag, ChatAction::ReplaceMessage(final_message.clone()))
            .await
        {
            CommandOutcome::Resolved(final_message)
        } else {
            CommandOutcome::Discarded
        }
    }

    /// Awaits the plugin, classifying errors, panics and timeouts as faults.
    async fn execute(
        &self,
        plugin: &Arc<dyn Plugin>,
        args: &[String],
        cancellation: &CancellationToken,
    ) -> Resolution {
        debug!(target: "freya::pipeline", plugin = plugin.name(), ?args, "Executing plugin");
        let execution = AssertUnwindSafe(plugin.execute(args)).catch_unwind();

        tokio::select! {
            _ = cancellation.cancelled() => Resolution::Cancelled,
            outcome = tokio::time::timeout(self.plugin_timeout, execution) => match outcome {
                Ok(Ok(Ok(result))) => Resolution::Completed(result),
                Ok(Ok(Err(e))) => {
                    error!(target: "freya::pipeline", plugin = plugin.name(), error = %e, "Plugin execution failed");
                    Resolution::Faulted(e.to_string())
                }
                Ok(Err(panic)) => {
                    let description = panic_description(panic.as_ref());
                    error!(target: "freya::pipeline", plugin = plugin.name(), panic = %description, "Plugin panicked");
                    Resolution::Faulted(description)
                }
                Err(_) => {
                    error!(
                        target: "freya::pipeline",
                        plugin = plugin.name(),
                        timeout_secs = self.plugin_timeout.as_secs_f64(),
                        "Plugin timed out"
                    );
                    Resolution::Faulted(format!(
                        "Plugin timed out after {} seconds",
                        self.plugin_timeout.as_secs_f64()
                    ))
                }
            },
        }
    }

    /// Applies a command's action if its session is still current. Returns whether it applied.
    async fn apply(&self, dispatcher: &dyn ChatDispatcher, tag: &CommandTag, action: ChatAction) -> bool {
        let name = action.name();
        match dispatcher.store().dispatch_for(tag, action).await {
            Some(dispatched) => {
                dispatcher.dispatched(&dispatched).await;
                true
            }
            None => {
                warn!(
                    target: "freya::pipeline",
                    action = name,
                    session_id = %tag.session_id,
                    epoch = tag.epoch,
                    "Active session changed; dropping stale command result"
                );
                false
            }
        }
    }
}

fn panic_description(panic: &(dyn Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        format!("Plugin panicked: {}", message)
    } else if let Some(message) = panic.downcast_ref::<String>() {
        format!("Plugin panicked: {}", message)
    } else {
        "Plugin panicked".to_string()
    }
}
