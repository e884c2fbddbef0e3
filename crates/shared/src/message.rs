//! Snapshot of the email the user currently has selected in the host app.
//!
//! Built fresh for each chat call and dropped afterwards; nothing here is persisted.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Selected email, as handed over by the host application.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SelectedMessageContext {
    pub subject: String,
    pub from: String,
    pub to: String,
    pub date: String,
    /// Fully fetched, searchable body text (preferred when present)
    pub body: Option<String>,
    /// Short preview snippet shown in the message list
    pub preview: Option<String>,
    pub attachments: Vec<AttachmentDescriptor>,
}

impl SelectedMessageContext {
    /// Best available body text: full body first, then preview.
    pub fn best_body(&self) -> Option<&str> {
        self.body
            .as_deref()
            .filter(|b| !b.trim().is_empty())
            .or_else(|| self.preview.as_deref().filter(|p| !p.trim().is_empty()))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttachmentDescriptor {
    pub filename: String,
    pub mime_type: String,
    pub content: AttachmentContent,
}

/// How an attachment reaches the assistant.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum AttachmentContent {
    /// Text extracted by the host, inlined into the prompt
    InlineText(String),
    /// Binary file (image, document) the assistant reads itself
    File(PathBuf),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_best_body_prefers_full_body() {
        let ctx = SelectedMessageContext {
            body: Some("full body".into()),
            preview: Some("preview".into()),
            ..Default::default()
        };
        assert_eq!(ctx.best_body(), Some("full body"));
    }

    #[test]
    fn test_best_body_falls_back_to_preview() {
        let ctx = SelectedMessageContext {
            body: Some("   ".into()),
            preview: Some("preview".into()),
            ..Default::default()
        };
        assert_eq!(ctx.best_body(), Some("preview"));

        let empty = SelectedMessageContext::default();
        assert_eq!(empty.best_body(), None);
    }
}
