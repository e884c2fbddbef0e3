//! Talking to the external assistant CLI: spawning it, decoding its output,
//! classifying its stderr and driving its sign-in flow.

pub mod auth;
pub mod cli_process;
pub mod install;
pub mod stderr_filter;
pub mod stream_json;

pub use auth::{extract_first_url, AuthFlow, BrowserLauncher, SystemBrowser};
pub use cli_process::{resolve_outcome, CliCommand, Invocation, InvocationOutput, OutputLine, StreamSinks};
pub use install::{check_install, resolve_command, InstallStatus};
pub use stream_json::StreamDecoder;
