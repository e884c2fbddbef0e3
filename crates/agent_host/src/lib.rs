//! Agent Host - mail assistant facade over the external assistant CLI
//!
//! This crate provides the public operations the email client calls:
//! - Translate, summarize and help compose emails
//! - Chat about the selected email, optionally streaming status updates
//! - Check sign-in status and run the interactive sign-in
//! - Read and switch the active account
//! - Register auxiliary tool servers with the assistant

pub mod context_manager;
pub mod locale;
pub mod prompts;

pub use context_manager::{ContextBuilder, MessageSource, NoSelection};
pub use locale::SystemLanguage;

use providers::{
    check_install, resolve_command, resolve_outcome, AuthFlow, BrowserLauncher, CliCommand,
    StreamSinks, SystemBrowser,
};
use services::{config, tool_settings, AccountStore, ToolServerEntry};
use shared::settings::BridgeSettings;
use shared::{AssistantError, AuthEvent, AuthState, ChatUpdate, ServiceNotice};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::broadcast;
use tokio::sync::mpsc::{unbounded_channel, UnboundedSender};

const NOTICE_CAPACITY: usize = 32;

/// Mail assistant service: one assistant process per call, no shared state
/// between calls beyond the persisted account document.
pub struct AssistantHost {
    settings: BridgeSettings,
    builder: ContextBuilder,
    accounts: AccountStore,
    tool_settings_path: PathBuf,
    messages: Arc<dyn MessageSource>,
    browser: Arc<dyn BrowserLauncher>,
    notices: broadcast::Sender<ServiceNotice>,
}

impl AssistantHost {
    pub fn new(settings: BridgeSettings) -> Self {
        let (notices, _) = broadcast::channel(NOTICE_CAPACITY);
        let accounts_path = config::accounts_path()
            .unwrap_or_else(|| PathBuf::from(".gemini").join("google_accounts.json"));
        let tool_settings_path = config::tool_settings_path()
            .unwrap_or_else(|| PathBuf::from(".gemini").join("settings.json"));
        let builder = ContextBuilder::new(
            SystemLanguage::detect(),
            settings.body_char_limit,
            settings.attachment_char_limit,
        );

        Self {
            accounts: AccountStore::new(accounts_path).with_notifier(notices.clone()),
            builder,
            settings,
            tool_settings_path,
            messages: Arc::new(NoSelection),
            browser: Arc::new(SystemBrowser),
            notices,
        }
    }

    /// Supply the host's accessor for the selected email.
    pub fn with_message_source(mut self, source: Arc<dyn MessageSource>) -> Self {
        self.messages = source;
        self
    }

    pub fn with_browser(mut self, browser: Arc<dyn BrowserLauncher>) -> Self {
        self.browser = browser;
        self
    }

    pub fn with_language(mut self, language: SystemLanguage) -> Self {
        self.builder = ContextBuilder::new(
            language,
            self.settings.body_char_limit,
            self.settings.attachment_char_limit,
        );
        self
    }

    pub fn with_accounts_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.accounts = AccountStore::new(path).with_notifier(self.notices.clone());
        self
    }

    pub fn with_tool_settings_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.tool_settings_path = path.into();
        self
    }

    pub fn settings(&self) -> &BridgeSettings {
        &self.settings
    }

    pub fn language(&self) -> &SystemLanguage {
        self.builder.language()
    }

    /// Receive auth-required, auth-state and account-change notices.
    pub fn subscribe(&self) -> broadcast::Receiver<ServiceNotice> {
        self.notices.subscribe()
    }

    pub fn is_installed(&self) -> bool {
        check_install(&self.settings).is_available()
    }

    fn command(&self) -> Result<CliCommand, AssistantError> {
        resolve_command(&self.settings)
    }

    fn prompt_args(&self, structured: bool) -> Vec<String> {
        let mut args = Vec::new();
        if let Some(model) = &self.settings.model {
            args.push("-m".to_string());
            args.push(model.clone());
        }
        if structured {
            args.push("--output-format".to_string());
            args.push("stream-json".to_string());
            if !self.settings.allowed_tools.is_empty() {
                args.push("--allowed-tools".to_string());
                args.push(self.settings.allowed_tools.join(","));
            }
            if self.settings.auto_approve {
                args.push("--yolo".to_string());
            }
        } else {
            args.push("-p".to_string());
            args.push("-".to_string());
        }
        args
    }

    /// Run one prompt through the assistant and resolve the outcome.
    async fn run_prompt(
        &self,
        prompt: String,
        structured: bool,
        updates: Option<UnboundedSender<ChatUpdate>>,
    ) -> Result<String, AssistantError> {
        let command = self.command()?;
        let invocation = command.invocation(self.prompt_args(structured), Some(prompt), structured);

        let output = match updates {
            Some(updates) => {
                let (events_tx, mut events_rx) = unbounded_channel();
                let run = providers::cli_process::run(
                    invocation,
                    StreamSinks {
                        events: Some(events_tx),
                        lines: None,
                    },
                );
                let forward = async move {
                    while let Some(event) = events_rx.recv().await {
                        let _ = updates.send(ChatUpdate::from(&event));
                    }
                };
                let (output, ()) = tokio::join!(run, forward);
                output?
            }
            None => providers::cli_process::run(invocation, StreamSinks::default()).await?,
        };

        resolve_outcome(&output).inspect_err(|e| {
            if e.is_auth_required() {
                tracing::warn!("assistant reports that sign-in is required");
                let _ = self.notices.send(ServiceNotice::AuthenticationRequired);
            }
        })
    }

    pub async fn translate(&self, text: &str, target_language: &str) -> Result<String, AssistantError> {
        self.run_prompt(prompts::translate_prompt(text, target_language), false, None)
            .await
    }

    /// Translate into the language detected from the system locale.
    pub async fn translate_to_system_language(&self, text: &str) -> Result<String, AssistantError> {
        let target = self.language().name;
        self.translate(text, target).await
    }

    pub async fn summarize(&self, text: &str) -> Result<String, AssistantError> {
        self.run_prompt(prompts::summarize_prompt(text, self.language()), false, None)
            .await
    }

    pub async fn help_compose(
        &self,
        instruction: &str,
        context: Option<&str>,
    ) -> Result<String, AssistantError> {
        let prompt = prompts::compose_prompt(instruction, context, self.language());
        self.run_prompt(prompt, false, None).await
    }

    async fn chat_prompt(&self, message: &str) -> String {
        let active = self.accounts.load().await;
        let selected = self.messages.selected_message().await;
        self.builder
            .build(message, active.as_deref(), selected.as_ref())
    }

    /// Chat about the selected email; returns the assistant's full reply.
    pub async fn chat(&self, message: &str) -> Result<String, AssistantError> {
        // Fail before touching host state when the assistant is missing.
        self.command()?;
        let prompt = self.chat_prompt(message).await;
        self.run_prompt(prompt, true, None).await
    }

    /// Like [`chat`](Self::chat), sending each decoded event to `updates` as it arrives.
    pub async fn chat_streaming(
        &self,
        message: &str,
        updates: UnboundedSender<ChatUpdate>,
    ) -> Result<String, AssistantError> {
        self.command()?;
        let prompt = self.chat_prompt(message).await;
        self.run_prompt(prompt, true, Some(updates)).await
    }

    /// Current sign-in state, recomputed on every call.
    pub async fn auth_state(&self) -> AuthState {
        let state = match self.command() {
            Ok(command) => AuthFlow::new(command, self.browser.clone()).check().await,
            Err(_) => AuthState::NotInstalled,
        };
        let _ = self.notices.send(ServiceNotice::AuthStateChanged(state.clone()));
        state
    }

    pub async fn check_authenticated(&self) -> bool {
        self.auth_state().await.is_authenticated()
    }

    pub async fn authenticate(&self) -> Result<(), AssistantError> {
        self.authenticate_with_updates(None).await
    }

    /// Run the interactive sign-in, reporting progress on `updates`.
    pub async fn authenticate_with_updates(
        &self,
        updates: Option<UnboundedSender<AuthEvent>>,
    ) -> Result<(), AssistantError> {
        let command = self.command()?;
        let _ = self
            .notices
            .send(ServiceNotice::AuthStateChanged(AuthState::Authenticating));

        let state = AuthFlow::new(command, self.browser.clone())
            .authenticate(updates)
            .await;
        let _ = self.notices.send(ServiceNotice::AuthStateChanged(state.clone()));

        match state {
            AuthState::Authenticated => Ok(()),
            AuthState::Failed(message) => Err(AssistantError::AuthFailed { message }),
            other => Err(AssistantError::AuthFailed {
                message: format!("unexpected sign-in state {:?}", other),
            }),
        }
    }

    pub async fn load_active_account(&self) -> Option<String> {
        self.accounts.load().await
    }

    pub async fn switch_active_account(&self, identity: &str) -> Result<(), AssistantError> {
        self.accounts
            .switch(identity)
            .await
            .map_err(|e| AssistantError::Storage(format!("{:#}", e)))
    }

    /// Register a tool server in the assistant's settings, keeping unrelated keys.
    pub async fn register_tool_server(
        &self,
        name: &str,
        entry: &ToolServerEntry,
    ) -> Result<(), AssistantError> {
        tool_settings::register_tool_server(&self.tool_settings_path, name, entry)
            .await
            .map_err(|e| AssistantError::Storage(format!("{:#}", e)))
    }

    /// Registered entry for `name`, if any.
    pub async fn tool_server(&self, name: &str) -> Result<Option<ToolServerEntry>, AssistantError> {
        tool_settings::read_tool_server(&self.tool_settings_path, name)
            .await
            .map_err(|e| AssistantError::Storage(format!("{:#}", e)))
    }

    pub async fn unregister_tool_server(&self, name: &str) -> Result<bool, AssistantError> {
        tool_settings::remove_tool_server(&self.tool_settings_path, name)
            .await
            .map_err(|e| AssistantError::Storage(format!("{:#}", e)))
    }
}
