//! Mail Bridge command line.
//!
//! Stands in for the email client: every subcommand maps onto one operation of
//! the assistant facade, so the whole bridge can be driven from a terminal.

mod cli;

use agent_host::{AssistantHost, MessageSource};
use anyhow::{Context, Result};
use async_trait::async_trait;
use clap::Parser;
use cli::{AccountCommand, ChatArgs, Cli, Command, ToolCommand};
use providers::InstallStatus;
use services::{config, ToolServerEntry};
use shared::settings::BridgeSettings;
use shared::{AssistantError, AuthEvent, SelectedMessageContext};
use std::io::Read;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tokio::sync::mpsc::unbounded_channel;
use tracing_subscriber::EnvFilter;

/// Selected email read from a JSON file each time it is requested.
struct EmailFile(PathBuf);

#[async_trait]
impl MessageSource for EmailFile {
    async fn selected_message(&self) -> Option<SelectedMessageContext> {
        let contents = match tokio::fs::read_to_string(&self.0).await {
            Ok(contents) => contents,
            Err(e) => {
                tracing::warn!("cannot read {}: {}", self.0.display(), e);
                return None;
            }
        };
        serde_json::from_str(&contents)
            .map_err(|e| tracing::warn!("ignoring malformed email file {}: {}", self.0.display(), e))
            .ok()
    }
}

fn effective_settings(cli: &Cli) -> BridgeSettings {
    let (mut settings, loaded) = config::load_settings_or_default();
    if !loaded {
        tracing::debug!("no settings file found, using defaults");
    }
    if let Some(bin) = &cli.assistant_bin {
        settings.assistant_binary = bin.clone();
    }
    if let Some(runtime) = &cli.runtime {
        settings.runtime = (!runtime.trim().is_empty()).then(|| runtime.trim().to_string());
    }
    if let Some(model) = &cli.model {
        settings.model = Some(model.clone());
    }
    settings
}

/// Text argument, or all of stdin when it is omitted or `-`.
fn text_or_stdin(text: Option<String>) -> Result<String> {
    match text {
        Some(text) if text != "-" => Ok(text),
        _ => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("reading text from stdin")?;
            Ok(buf)
        }
    }
}

async fn chat(host: AssistantHost, args: ChatArgs) -> Result<String, AssistantError> {
    let host = match args.email {
        Some(path) => host.with_message_source(Arc::new(EmailFile(path))),
        None => host,
    };
    if !args.stream {
        return host.chat(&args.message).await;
    }

    let (tx, mut rx) = unbounded_channel::<shared::ChatUpdate>();
    let printer = tokio::spawn(async move {
        while let Some(update) = rx.recv().await {
            match update.tool_name {
                Some(name) => eprintln!("[{}] {}", update.kind.as_str(), name),
                None if !update.content.is_empty() => {
                    eprintln!("[{}] {}", update.kind.as_str(), update.content)
                }
                None => eprintln!("[{}]", update.kind.as_str()),
            }
        }
    });
    let reply = host.chat_streaming(&args.message, tx).await;
    let _ = printer.await;
    reply
}

async fn login(host: &AssistantHost) -> Result<(), AssistantError> {
    let (tx, mut rx) = unbounded_channel();
    let printer = tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            match event {
                AuthEvent::UrlDiscovered(url) => {
                    eprintln!("Opening {} in your browser. If nothing opens, visit it by hand.", url)
                }
                AuthEvent::Output(line) => tracing::debug!("login: {}", line),
                AuthEvent::StateChanged(state) => tracing::info!(?state, "sign-in state"),
            }
        }
    });
    let result = host.authenticate_with_updates(Some(tx)).await;
    let _ = printer.await;
    result
}

async fn run(cli: Cli) -> Result<ExitCode> {
    let mut settings = effective_settings(&cli);
    if let Command::Chat(args) = &cli.command {
        if !args.allowed_tools.is_empty() {
            settings.allowed_tools = args.allowed_tools.clone();
        }
        settings.auto_approve |= args.yolo;
    }
    let host = AssistantHost::new(settings);

    let reply = match cli.command {
        Command::Chat(args) => chat(host, args).await,
        Command::Translate { to, text } => {
            let text = text_or_stdin(text)?;
            match to {
                Some(target) => host.translate(&text, &target).await,
                None => host.translate_to_system_language(&text).await,
            }
        }
        Command::Summarize { text } => {
            let text = text_or_stdin(text)?;
            host.summarize(&text).await
        }
        Command::Compose {
            instruction,
            context,
        } => host.help_compose(&instruction, context.as_deref()).await,
        Command::Login => login(&host).await.map(|()| "Signed in.".to_string()),
        Command::Status => {
            match providers::check_install(host.settings()) {
                InstallStatus::Available { command_path } => {
                    println!("installed: {}", command_path.display())
                }
                InstallStatus::Unavailable { reason } => println!("not installed: {}", reason),
                InstallStatus::NeedsSetup { instructions } => println!("{}", instructions),
            }
            println!("auth: {:?}", host.auth_state().await);
            return Ok(ExitCode::SUCCESS);
        }
        Command::Account(AccountCommand::Show) => Ok(host
            .load_active_account()
            .await
            .unwrap_or_else(|| "(no active account)".to_string())),
        Command::Account(AccountCommand::Switch { identity }) => host
            .switch_active_account(&identity)
            .await
            .map(|()| format!("Active account: {}", identity.trim())),
        Command::Tool(ToolCommand::Register {
            name,
            command,
            args,
            env,
        }) => {
            let entry = ToolServerEntry {
                command,
                args,
                env: env.into_iter().collect(),
            };
            host.register_tool_server(&name, &entry)
                .await
                .map(|()| format!("Registered tool server '{}'", name))
        }
        Command::Tool(ToolCommand::Show { name }) => match host.tool_server(&name).await {
            Ok(Some(entry)) => Ok(serde_json::to_string_pretty(&entry)?),
            Ok(None) => Ok(format!("No tool server named '{}'", name)),
            Err(e) => Err(e),
        },
        Command::Tool(ToolCommand::Remove { name }) => {
            host.unregister_tool_server(&name).await.map(|removed| {
                if removed {
                    format!("Removed tool server '{}'", name)
                } else {
                    format!("No tool server named '{}'", name)
                }
            })
        }
        Command::Config { save } => {
            println!("{}", serde_json::to_string_pretty(host.settings())?);
            if save {
                config::save_settings(host.settings())?;
                tracing::info!("settings saved");
            }
            let show = |label: &str, path: Option<PathBuf>| match path {
                Some(p) => println!("{}: {}", label, p.display()),
                None => println!("{}: (unavailable)", label),
            };
            show("settings file", config::config_path());
            show("accounts file", config::accounts_path());
            show("tool settings", config::tool_settings_path());
            println!("language: {}", host.language().name);
            return Ok(ExitCode::SUCCESS);
        }
    };

    match reply {
        Ok(text) => {
            println!("{}", text);
            Ok(ExitCode::SUCCESS)
        }
        Err(e) => {
            tracing::debug!("operation failed: {:?}", e);
            eprintln!("{}", e.user_message());
            Ok(ExitCode::FAILURE)
        }
    }
}

fn main() -> Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let runtime = tokio::runtime::Runtime::new().context("starting async runtime")?;
    runtime.block_on(run(cli))
}
