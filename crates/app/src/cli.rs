//! Command line definitions.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "mailbridge",
    version,
    about = "Mail assistant bridge: translate, summarize, compose and chat about email"
)]
pub struct Cli {
    /// Assistant executable to run (overrides settings)
    #[arg(long, global = true)]
    pub assistant_bin: Option<String>,

    /// Runtime used to launch the assistant; pass an empty string to run it directly
    #[arg(long, global = true)]
    pub runtime: Option<String>,

    /// Model name forwarded to the assistant
    #[arg(long, short = 'm', global = true)]
    pub model: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Chat about the selected email
    Chat(ChatArgs),
    /// Translate text (reads stdin when TEXT is omitted)
    Translate {
        /// Target language; defaults to the system language
        #[arg(long)]
        to: Option<String>,
        text: Option<String>,
    },
    /// Summarize an email (reads stdin when TEXT is omitted)
    Summarize { text: Option<String> },
    /// Draft an email from an instruction
    Compose {
        instruction: String,
        /// Email being answered or the current draft
        #[arg(long)]
        context: Option<String>,
    },
    /// Sign in to the assistant, opening the browser when a URL appears
    Login,
    /// Report whether the assistant is installed and signed in
    Status,
    /// Show the active account or switch to another one
    #[command(subcommand)]
    Account(AccountCommand),
    /// Manage tool servers registered with the assistant
    #[command(subcommand)]
    Tool(ToolCommand),
    /// Print the effective settings and file locations
    Config {
        /// Also write the effective settings to the settings file
        #[arg(long)]
        save: bool,
    },
}

#[derive(Args, Debug)]
pub struct ChatArgs {
    pub message: String,

    /// JSON file describing the selected email
    #[arg(long)]
    pub email: Option<PathBuf>,

    /// Print tool and message updates to stderr while the reply is produced
    #[arg(long)]
    pub stream: bool,

    /// Tools the assistant may use without asking (comma separated)
    #[arg(long, value_delimiter = ',')]
    pub allowed_tools: Vec<String>,

    /// Approve every tool call
    #[arg(long)]
    pub yolo: bool,
}

#[derive(Subcommand, Debug)]
pub enum AccountCommand {
    Show,
    Switch { identity: String },
}

#[derive(Subcommand, Debug)]
pub enum ToolCommand {
    /// Register or replace a tool server
    Register {
        name: String,
        command: String,
        args: Vec<String>,
        /// Environment entries as KEY=VALUE
        #[arg(long = "env", value_parser = parse_env_pair)]
        env: Vec<(String, String)>,
    },
    /// Print a registered tool server as JSON
    Show { name: String },
    Remove { name: String },
}

fn parse_env_pair(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => {
            Ok((key.trim().to_string(), value.to_string()))
        }
        _ => Err(format!("expected KEY=VALUE, got '{}'", raw)),
    }
}
