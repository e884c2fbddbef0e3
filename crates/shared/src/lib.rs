pub mod error;
pub mod events;
pub mod message;
pub mod text;

pub use error::AssistantError;
pub use events::{AuthEvent, AuthState, ChatUpdate, ChatUpdateKind, ServiceNotice, StreamEvent};
pub use message::{AttachmentContent, AttachmentDescriptor, SelectedMessageContext};

pub mod settings {
    use serde::{Deserialize, Serialize};

    fn default_runtime() -> Option<String> {
        Some("node".into())
    }

    fn default_binary() -> String {
        "gemini".into()
    }

    fn default_body_limit() -> usize {
        8000
    }

    fn default_attachment_limit() -> usize {
        3000
    }

    fn default_quiet_env() -> Vec<(String, String)> {
        vec![("NODE_NO_WARNINGS".into(), "1".into())]
    }

    /// How to reach the assistant executable and shape its prompts.
    #[derive(Debug, Clone, Serialize, Deserialize)]
    pub struct BridgeSettings {
        /// Program hosting the assistant script; `None` runs the binary directly
        #[serde(default = "default_runtime")]
        pub runtime: Option<String>,
        /// Assistant binary, either a path or a name looked up on PATH
        #[serde(default = "default_binary")]
        pub assistant_binary: String,
        #[serde(default)]
        pub model: Option<String>,
        /// Auxiliary tools the assistant may call in structured mode
        #[serde(default)]
        pub allowed_tools: Vec<String>,
        /// Approve tool calls without prompting (structured mode only)
        #[serde(default)]
        pub auto_approve: bool,
        #[serde(default = "default_body_limit")]
        pub body_char_limit: usize,
        #[serde(default = "default_attachment_limit")]
        pub attachment_char_limit: usize,
        /// Extra environment for the child process only, e.g. warning suppression
        #[serde(default = "default_quiet_env")]
        pub quiet_env: Vec<(String, String)>,
    }

    impl Default for BridgeSettings {
        fn default() -> Self {
            Self {
                runtime: default_runtime(),
                assistant_binary: default_binary(),
                model: None,
                allowed_tools: vec![],
                auto_approve: false,
                body_char_limit: default_body_limit(),
                attachment_char_limit: default_attachment_limit(),
                quiet_env: default_quiet_env(),
            }
        }
    }
}

pub mod accounts {
    use serde::{Deserialize, Serialize};

    /// Persisted active-account document.
    #[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
    pub struct AccountRecord {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pub active: Option<String>,
        /// Previously active identities, oldest first
        #[serde(default, rename = "old")]
        pub history: Vec<String>,
        /// Keys written by the assistant that this crate does not interpret
        #[serde(flatten)]
        pub extra: serde_json::Map<String, serde_json::Value>,
    }

    impl AccountRecord {
        /// Make `identity` active, moving the previous one into history.
        pub fn switch_to(&mut self, identity: &str) {
            if let Some(previous) = self.active.take() {
                if previous != identity && !self.history.contains(&previous) {
                    self.history.push(previous);
                }
            }
            self.history.retain(|old| old != identity);
            self.active = Some(identity.to_string());
        }
    }
}
