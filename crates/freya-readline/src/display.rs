//! Terminal rendering of transcript messages and session lists.

use colored::Colorize;
use freya_core::plugin::{PluginRegistry, RenderedCard};
use freya_core::session::{Message, MessageType, Sender, Session};
use freya_core::state::ChatState;

/// Formats one message for the terminal.
///
/// `Plugin` messages are drawn by the originating plugin's renderer; when the
/// plugin has none (or is no longer registered) the content is shown as text.
pub fn message_lines(message: &Message, registry: &PluginRegistry) -> Vec<String> {
    if message.sender == Sender::User {
        return vec![format!("> {}", message.content).green().to_string()];
    }

    match message.message_type {
        MessageType::Loading => vec![message.content.yellow().italic().to_string()],
        MessageType::Error => {
            let mut lines = vec![message.content.red().bold().to_string()];
            if let Some(detail) = message
                .error_message
                .as_deref()
                .filter(|detail| !detail.is_empty() && *detail != message.content)
            {
                lines.push(format!("  {}", detail).bright_black().to_string());
            }
            lines
        }
        MessageType::Plugin => match rendered_card(message, registry) {
            Some(card) => card_lines(&card),
            None => text_lines(&message.content),
        },
        MessageType::Text => text_lines(&message.content),
    }
}

fn rendered_card(message: &Message, registry: &PluginRegistry) -> Option<RenderedCard> {
    let renderer = registry
        .find_by_name(message.plugin_name.as_deref()?)?
        .renderer()?;
    message.plugin_data.as_ref().map(renderer)
}

fn text_lines(content: &str) -> Vec<String> {
    content
        .lines()
        .map(|line| line.bright_blue().to_string())
        .collect()
}

fn card_lines(card: &RenderedCard) -> Vec<String> {
    let mut lines = vec![format!("┌ {}", card.title).bright_cyan().bold().to_string()];
    lines.extend(card.lines.iter().map(|line| format!("│ {}", line).cyan().to_string()));
    lines
}

/// Numbered session list, most recently updated first, with the active one marked.
pub fn session_lines(state: &ChatState) -> Vec<String> {
    if state.all_sessions.is_empty() {
        return vec!["No sessions yet.".bright_black().to_string()];
    }
    ordered_sessions(state)
        .iter()
        .enumerate()
        .map(|(index, session)| {
            let active = state.active_session_id.as_deref() == Some(session.id.as_str());
            let marker = if active { "*" } else { " " };
            let line = format!("{} {:>2}. {}", marker, index + 1, session.name);
            if active {
                line.bright_green().to_string()
            } else {
                line
            }
        })
        .collect()
}

/// The order `:sessions` lists and `:switch` counts in.
pub fn ordered_sessions(state: &ChatState) -> Vec<&Session> {
    let mut sessions: Vec<_> = state.all_sessions.iter().collect();
    sessions.sort_by(|a, b| b.cmp_recency(a));
    sessions
}

pub fn help_lines(registry: &PluginRegistry) -> Vec<String> {
    let mut lines = vec!["Plugins:".bright_yellow().to_string()];
    for (name, description) in registry.help_entries() {
        lines.push(format!("  {:<10} {}", name.bright_cyan(), description));
    }
    lines.push("Commands:".bright_yellow().to_string());
    for (usage, description) in [
        (":new", "Start a new chat session"),
        (":sessions", "List sessions"),
        (":switch N", "Switch to session N from :sessions"),
        (":login E P", "Sign in"),
        (":signup E P", "Create an account"),
        (":logout", "Sign out and continue as guest"),
        (":whoami", "Show who is signed in"),
        ("quit", "Exit"),
    ] {
        lines.push(format!("  {:<12} {}", usage.bright_magenta(), description));
    }
    lines
}
