use thiserror::Error;

/// Failures surfaced by the assistant bridge.
///
/// A nonzero exit that only produced known-benign diagnostics is not represented
/// here: it is recovered locally and the call succeeds.
#[derive(Debug, Error)]
pub enum AssistantError {
    #[error("The assistant is not installed: {hint}")]
    NotInstalled { hint: String },

    #[error("Authentication required: {message}")]
    AuthenticationRequired { message: String },

    #[error("{message}")]
    ProcessFailure { message: String },

    #[error("Sign-in failed: {message}")]
    AuthFailed { message: String },

    #[error("Failed to start the assistant: {0}")]
    Spawn(#[source] std::io::Error),

    #[error("I/O error while talking to the assistant: {0}")]
    Io(#[from] std::io::Error),

    #[error("Could not update saved state: {0}")]
    Storage(String),
}

impl AssistantError {
    pub fn is_auth_required(&self) -> bool {
        matches!(self, AssistantError::AuthenticationRequired { .. })
    }

    /// Text suitable for an inline error bubble in a conversation.
    pub fn user_message(&self) -> String {
        match self {
            AssistantError::NotInstalled { hint } => format!(
                "The AI assistant is not installed on this computer.\n\n{}",
                hint
            ),
            AssistantError::AuthenticationRequired { .. } => {
                "Please sign in to the AI assistant first, then try again.".to_string()
            }
            AssistantError::AuthFailed { message } => {
                format!("Sign-in did not complete:\n\n{}", message)
            }
            other => format!("Sorry, the assistant ran into a problem:\n\n{}", other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_installed_message_carries_hint() {
        let err = AssistantError::NotInstalled {
            hint: "Install it with npm".into(),
        };
        assert!(err.user_message().contains("Install it with npm"));
        assert!(!err.is_auth_required());
    }

    #[test]
    fn test_process_failure_displays_raw_message() {
        let err = AssistantError::ProcessFailure {
            message: "Error: quota exceeded".into(),
        };
        assert_eq!(err.to_string(), "Error: quota exceeded");
        assert!(err.user_message().contains("quota exceeded"));
    }
}
