use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context as _, Result};
use clap::Parser;
use colored::Colorize;
use rustyline::Editor;
use rustyline::error::ReadlineError;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use freya_application::{ChatOrchestrator, CommandOutcome, ExecutionPipeline};
use freya_core::config::AppConfig;
use freya_core::identity::{Credentials, IdentityProvider};
use freya_core::session::SessionStore;
use freya_core::storage::KeyValueStore;
use freya_infrastructure::config_loader::load_config_with_env;
use freya_infrastructure::paths::FreyaPaths;
use freya_infrastructure::{
    BackendClient, FileKeyValueStore, GuestChatService, HttpIdentityProvider, HttpSessionStore,
    IdentityRoutedChatService, InMemorySessionStore, LocalIdentityProvider, RemoteChatService,
};
use freya_interaction::default_registry;

mod command;
mod display;
mod helper;

use command::ReplCommand;
use helper::CliHelper;

#[derive(Parser)]
#[command(name = "freya")]
#[command(about = "Freya - plugin-driven chat assistant", long_about = None)]
struct Cli {
    /// Configuration file (defaults to the platform config directory)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Backend base URL; overrides the config file and FREYA_BACKEND_URL
    #[arg(long)]
    backend_url: Option<String>,

    /// Log filter used when FREYA_LOG is unset
    #[arg(long, default_value = "warn")]
    log_level: String,
}

fn init_tracing(default_level: &str) {
    let filter = EnvFilter::try_from_env("FREYA_LOG")
        .unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .init();
}

fn load_config(cli: &Cli) -> Result<AppConfig> {
    let path = match &cli.config {
        Some(path) => path.clone(),
        None => FreyaPaths::config_file()?,
    };
    let mut config = load_config_with_env(&path)
        .with_context(|| format!("Failed to load configuration from {}", path.display()))?;
    if let Some(url) = &cli.backend_url {
        config.backend.base_url = Some(url.clone());
    }
    Ok(config)
}

/// Wires the persistence and identity adapters for the configured mode.
///
/// With a backend URL, accounts and their sessions live on the server. Without one
/// the app runs offline: accounts and their sessions last until the process exits.
fn build_orchestrator(config: &AppConfig) -> Result<ChatOrchestrator> {
    let local_store_path = match &config.storage.local_store_path {
        Some(path) => path.clone(),
        None => FreyaPaths::local_store_file()?,
    };
    let local_store: Arc<dyn KeyValueStore> = Arc::new(FileKeyValueStore::new(local_store_path));

    let (sessions, identity_provider): (Arc<dyn SessionStore>, Arc<dyn IdentityProvider>) =
        match &config.backend.base_url {
            Some(base_url) => {
                info!(target: "freya::cli", base_url = %base_url, "Using remote backend");
                let backend = BackendClient::new(base_url.clone())?;
                (
                    Arc::new(HttpSessionStore::new(backend.clone())),
                    Arc::new(HttpIdentityProvider::new(backend)),
                )
            }
            None => {
                info!(target: "freya::cli", "No backend configured; running offline");
                (
                    Arc::new(InMemorySessionStore::new()),
                    Arc::new(LocalIdentityProvider::new()),
                )
            }
        };

    let service = Arc::new(IdentityRoutedChatService::new(
        Arc::new(GuestChatService::new(Arc::clone(&local_store))),
        Arc::new(RemoteChatService::new(sessions, local_store)),
    ));
    let pipeline = ExecutionPipeline::new(
        default_registry(&config.plugins),
        config.plugins.timeout(),
    );
    Ok(ChatOrchestrator::new(service, identity_provider, pipeline))
}

fn print_lines(lines: Vec<String>) {
    for line in lines {
        println!("{}", line);
    }
}

async fn print_header(chat: &ChatOrchestrator) {
    let identity = chat.identity().await;
    let who = match identity.email() {
        Some(email) => email.to_string(),
        None => identity.label(),
    };
    let state = chat.state().await;
    println!(
        "{}",
        format!("[{}] {}", who, state.active_session_name()).bright_black()
    );
}

async fn print_transcript(chat: &ChatOrchestrator) {
    let state = chat.state().await;
    for message in &state.current_messages {
        print_lines(display::message_lines(message, chat.registry()));
    }
}

/// Runs one REPL command. Returns `false` when the loop should stop.
async fn handle(chat: &ChatOrchestrator, command: ReplCommand) -> bool {
    match command {
        ReplCommand::Quit => return false,
        ReplCommand::Help => print_lines(display::help_lines(chat.registry())),
        ReplCommand::Chat(text) => match chat.send_message(&text).await {
            Ok(CommandOutcome::Discarded) => {
                println!("{}", "The session changed before the reply arrived.".bright_black())
            }
            Ok(outcome) => {
                if let Some(message) = outcome.message() {
                    print_lines(display::message_lines(message, chat.registry()));
                }
            }
            Err(e) if e.is_submission_blocked() => println!("{}", e.to_string().yellow()),
            Err(e) => eprintln!("{}", format!("Error: {}", e).red()),
        },
        ReplCommand::Login { email, password } => {
            match chat.sign_in(&Credentials::new(email, password)).await {
                Ok(_) => {
                    println!("{}", "Signed in.".bright_green());
                    print_header(chat).await;
                    print_transcript(chat).await;
                }
                Err(e) => eprintln!("{}", format!("Sign-in failed: {}", e).red()),
            }
        }
        ReplCommand::SignUp { email, password } => {
            match chat.sign_up(&Credentials::new(email, password)).await {
                Ok(outcome) => {
                    if let Some(message) = &outcome.message {
                        println!("{}", message.bright_green());
                    }
                    if outcome.user.is_some() {
                        print_header(chat).await;
                    }
                }
                Err(e) => eprintln!("{}", format!("Sign-up failed: {}", e).red()),
            }
        }
        ReplCommand::Logout => match chat.sign_out().await {
            Ok(()) => {
                println!("{}", "Signed out.".bright_green());
                print_header(chat).await;
            }
            Err(e) => eprintln!("{}", format!("Sign-out failed: {}", e).red()),
        },
        ReplCommand::NewChat => match chat.new_chat().await {
            Ok(Some(session)) => println!("{}", format!("Started {}", session.name).bright_green()),
            Ok(None) => println!("{}", "Still processing; try again shortly.".yellow()),
            Err(e) => eprintln!("{}", format!("Could not create a session: {}", e).red()),
        },
        ReplCommand::Sessions => print_lines(display::session_lines(&chat.state().await)),
        ReplCommand::Switch(position) => {
            let state = chat.state().await;
            let target = display::ordered_sessions(&state)
                .get(position - 1)
                .map(|session| session.id.clone());
            match target {
                Some(session_id) => match chat.switch_session(&session_id).await {
                    Ok(()) => {
                        print_header(chat).await;
                        print_transcript(chat).await;
                    }
                    Err(e) => eprintln!("{}", format!("Could not switch: {}", e).red()),
                },
                None => println!("{}", format!("No session {}", position).yellow()),
            }
        }
        ReplCommand::WhoAmI => print_header(chat).await,
        ReplCommand::Usage(usage) => println!("{}", format!("Usage: {}", usage).yellow()),
        ReplCommand::Unknown(line) => {
            println!("{}", format!("Unknown command: {} (try :help)", line).bright_black())
        }
    }
    true
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(&cli.log_level);

    let config = load_config(&cli)?;
    let chat = build_orchestrator(&config)?;
    chat.bootstrap().await?;

    let mut rl = Editor::new()?;
    rl.set_helper(Some(CliHelper::new(chat.registry())));

    println!("{}", "=== Freya ===".bright_magenta().bold());
    println!(
        "{}",
        "Try '/weather London' or '/calc 2 * (3 + 4)'. Type ':help' for commands, 'quit' to exit."
            .bright_black()
    );
    print_header(&chat).await;
    print_transcript(&chat).await;
    println!();

    loop {
        match rl.readline(">> ") {
            Ok(line) => {
                let trimmed = line.trim();
                if trimmed.is_empty() {
                    continue;
                }
                if let Err(e) = rl.add_history_entry(trimmed) {
                    warn!(target: "freya::cli", error = %e, "Failed to record history");
                }
                if !handle(&chat, ReplCommand::parse(trimmed)).await {
                    break;
                }
            }
            Err(ReadlineError::Interrupted) => {
                println!("{}", "CTRL-C detected. Type 'quit' to exit.".yellow());
            }
            Err(ReadlineError::Eof) => break,
            Err(err) => {
                eprintln!("{}", format!("Error: {:?}", err).red());
                break;
            }
        }
    }

    chat.flush_saves().await;
    println!("{}", "Goodbye!".bright_green());
    Ok(())
}
