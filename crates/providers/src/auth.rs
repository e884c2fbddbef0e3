//! Sign-in flow for the assistant CLI.
//!
//! `auth status` is a stateless poll. `auth login` is interactive: its output is
//! watched line by line so the sign-in URL can be opened the moment it appears,
//! long before the process exits.

use crate::cli_process::{self, CliCommand, OutputLine, StreamSinks};
use crate::stderr_filter;
use regex::Regex;
use shared::{AuthEvent, AuthState};
use std::sync::{Arc, OnceLock};
use tokio::sync::mpsc::{unbounded_channel, UnboundedSender};

static URL_REGEX: OnceLock<Option<Regex>> = OnceLock::new();

const TRAILING_PUNCTUATION: &[char] = &['.', ',', ')', ']', '!', '?', ':', ';'];

const GENERIC_FAILURE: &str = "Sign-in did not complete. Please try again.";

/// First well-formed http(s) URL in `text`, without trailing punctuation.
pub fn extract_first_url(text: &str) -> Option<String> {
    if text.is_empty() {
        return None;
    }
    let re = URL_REGEX
        .get_or_init(|| Regex::new(r#"https?://[^\s<>"'`]+"#).ok())
        .as_ref()?;

    re.find_iter(text)
        .map(|m| m.as_str().trim_end_matches(TRAILING_PUNCTUATION))
        .find(|candidate| {
            url::Url::parse(candidate)
                .map(|u| u.host_str().is_some())
                .unwrap_or(false)
        })
        .map(str::to_string)
}

/// Opens sign-in URLs for the user.
pub trait BrowserLauncher: Send + Sync {
    fn open_url(&self, url: &str) -> std::io::Result<()>;
}

/// Default launcher using the desktop's registered browser.
pub struct SystemBrowser;

impl BrowserLauncher for SystemBrowser {
    fn open_url(&self, url: &str) -> std::io::Result<()> {
        open::that_detached(url)
    }
}

/// Drives `auth status` / `auth login` against one resolved command.
pub struct AuthFlow {
    command: CliCommand,
    browser: Arc<dyn BrowserLauncher>,
}

impl AuthFlow {
    pub fn new(command: CliCommand, browser: Arc<dyn BrowserLauncher>) -> Self {
        Self { command, browser }
    }

    /// Poll sign-in status. Any failure, including spawn errors, is `Unauthenticated`.
    pub async fn check(&self) -> AuthState {
        let invocation = self.command.invocation(
            vec!["auth".into(), "status".into()],
            None,
            false,
        );
        match cli_process::run(invocation, StreamSinks::default()).await {
            Ok(output) if output.success => AuthState::Authenticated,
            Ok(output) => {
                tracing::debug!(exit_code = ?output.exit_code, "auth status reports signed out");
                AuthState::Unauthenticated
            }
            Err(e) => {
                tracing::warn!("auth status could not run: {}", e);
                AuthState::Unauthenticated
            }
        }
    }

    /// Run the interactive login and resolve to `Authenticated` or `Failed`.
    ///
    /// The failure message prefers the discovered URL so the user can finish
    /// signing in by hand, then cleaned stderr, then a generic message.
    pub async fn authenticate(&self, updates: Option<UnboundedSender<AuthEvent>>) -> AuthState {
        let emit = |event: AuthEvent| {
            if let Some(tx) = &updates {
                let _ = tx.send(event);
            }
        };

        emit(AuthEvent::StateChanged(AuthState::Authenticating));
        tracing::info!("starting assistant sign-in");

        let (lines_tx, mut lines_rx) = unbounded_channel();
        let invocation = self
            .command
            .invocation(vec!["auth".into(), "login".into()], None, false);
        let login = cli_process::run(
            invocation,
            StreamSinks {
                events: None,
                lines: Some(lines_tx),
            },
        );

        let watch = async {
            let mut found: Option<String> = None;
            let mut launch = None;
            while let Some(line) = lines_rx.recv().await {
                let text = match line {
                    OutputLine::Stdout(text) | OutputLine::Stderr(text) => text,
                };
                if found.is_none() {
                    if let Some(url) = extract_first_url(&text) {
                        tracing::info!("sign-in URL discovered, opening browser");
                        emit(AuthEvent::UrlDiscovered(url.clone()));
                        // Launchers may block; keep draining the login pipes meanwhile.
                        let browser = self.browser.clone();
                        let target = url.clone();
                        launch = Some(tokio::task::spawn_blocking(move || {
                            browser.open_url(&target)
                        }));
                        found = Some(url);
                    }
                }
                emit(AuthEvent::Output(text));
            }
            if let Some(launch) = launch {
                match launch.await {
                    Ok(Ok(())) => {}
                    Ok(Err(e)) => tracing::warn!("could not open browser for sign-in: {}", e),
                    Err(e) => tracing::warn!("browser launch task failed: {}", e),
                }
            }
            found
        };

        let (result, url) = tokio::join!(login, watch);

        let state = match result {
            Ok(output) if output.success => AuthState::Authenticated,
            Ok(output) => {
                // Some versions print "already authenticated" and exit nonzero.
                if self.check().await.is_authenticated() {
                    AuthState::Authenticated
                } else {
                    let cleaned = stderr_filter::classify(&output.stderr);
                    let message = url
                        .or_else(|| (!cleaned.is_empty()).then_some(cleaned))
                        .unwrap_or_else(|| GENERIC_FAILURE.to_string());
                    AuthState::Failed(message)
                }
            }
            Err(e) => AuthState::Failed(url.unwrap_or_else(|| e.to_string())),
        };

        match &state {
            AuthState::Authenticated => tracing::info!("assistant sign-in succeeded"),
            other => tracing::warn!(state = ?other, "assistant sign-in did not succeed"),
        }
        emit(AuthEvent::StateChanged(state.clone()));
        state
    }
}
