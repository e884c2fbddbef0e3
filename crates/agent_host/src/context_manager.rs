//! Prompt assembly for chat turns.
//!
//! The host application exposes the currently selected email through
//! [`MessageSource`]; the builder turns it into a bounded text block placed
//! between the system instructions and the user's message.

use crate::locale::SystemLanguage;
use crate::prompts;
use async_trait::async_trait;
use shared::text::truncate;
use shared::{AttachmentContent, SelectedMessageContext};
use std::path::Path;

/// Read-only accessor the host supplies for the selected email.
#[async_trait]
pub trait MessageSource: Send + Sync {
    /// Snapshot of the selected email, or `None` when nothing is selected.
    async fn selected_message(&self) -> Option<SelectedMessageContext>;
}

/// A source that never has a selection.
pub struct NoSelection;

#[async_trait]
impl MessageSource for NoSelection {
    async fn selected_message(&self) -> Option<SelectedMessageContext> {
        None
    }
}

/// Builds the full prompt text for one chat call.
#[derive(Debug, Clone)]
pub struct ContextBuilder {
    language: SystemLanguage,
    body_limit: usize,
    attachment_limit: usize,
}

impl ContextBuilder {
    pub fn new(language: SystemLanguage, body_limit: usize, attachment_limit: usize) -> Self {
        Self {
            language,
            body_limit,
            attachment_limit,
        }
    }

    pub fn language(&self) -> &SystemLanguage {
        &self.language
    }

    /// Instructions, optional email context, then the user's message.
    pub fn build(
        &self,
        user_message: &str,
        active_account: Option<&str>,
        selected: Option<&SelectedMessageContext>,
    ) -> String {
        let mut prompt = prompts::system_instructions(&self.language, active_account);

        if let Some(message) = selected {
            prompt.push_str("\n\n");
            prompt.push_str(&self.context_block(message));
        }

        prompt.push_str("\n\n## User Message\n");
        prompt.push_str(user_message);
        prompt
    }

    /// Text summary of the selected email and its attachments.
    pub fn context_block(&self, message: &SelectedMessageContext) -> String {
        let mut block = String::from("## Selected Email\n");
        block.push_str(&format!("Subject: {}\n", message.subject));
        block.push_str(&format!("From: {}\n", message.from));
        block.push_str(&format!("To: {}\n", message.to));
        block.push_str(&format!("Date: {}\n", message.date));

        if let Some(body) = message.best_body() {
            block.push_str("\nBody:\n");
            block.push_str(&truncate(body.trim(), self.body_limit));
            block.push('\n');
        }

        if !message.attachments.is_empty() {
            block.push_str("\nAttachments:\n");
            for attachment in &message.attachments {
                block.push_str(&format!(
                    "- {} ({})\n",
                    attachment.filename, attachment.mime_type
                ));
                match &attachment.content {
                    AttachmentContent::InlineText(text) => {
                        let text = truncate(text.trim(), self.attachment_limit);
                        for line in text.lines() {
                            block.push_str("  ");
                            block.push_str(line);
                            block.push('\n');
                        }
                    }
                    AttachmentContent::File(path) => {
                        block.push_str(&format!("  File: {}\n", file_reference(path)));
                    }
                }
            }
        }

        block.trim_end().to_string()
    }
}

/// `@path` token the assistant resolves itself; spaces are backslash-escaped.
pub fn file_reference(path: &Path) -> String {
    format!("@{}", path.to_string_lossy().replace(' ', "\\ "))
}
