//! Persisted "active account" selection.
//!
//! The document is shared with the assistant itself and read-then-written
//! without locking; a concurrent writer in another process wins if it writes last.

use anyhow::{anyhow, Context, Result};
use chrono::Utc;
use shared::accounts::AccountRecord;
use shared::ServiceNotice;
use std::path::{Path, PathBuf};
use tokio::sync::broadcast;

pub struct AccountStore {
    path: PathBuf,
    notices: Option<broadcast::Sender<ServiceNotice>>,
}

impl AccountStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            notices: None,
        }
    }

    /// Send `AccountChanged` notices on `tx` after every switch.
    pub fn with_notifier(mut self, tx: broadcast::Sender<ServiceNotice>) -> Self {
        self.notices = Some(tx);
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read_record(&self) -> Option<AccountRecord> {
        let contents = tokio::fs::read_to_string(&self.path).await.ok()?;
        match serde_json::from_str::<AccountRecord>(&contents) {
            Ok(record) => Some(record),
            Err(e) => {
                tracing::warn!("unreadable account document {}: {}", self.path.display(), e);
                None
            }
        }
    }

    /// Active identity, or `None` if the document is missing, unreadable or has none.
    pub async fn load(&self) -> Option<String> {
        self.read_record().await.and_then(|r| r.active)
    }

    /// Make `identity` active, preserving and extending the history list.
    pub async fn switch(&self, identity: &str) -> Result<()> {
        let identity = identity.trim();
        if identity.is_empty() {
            return Err(anyhow!("account identity must not be empty"));
        }

        let mut record = self.read_record().await.unwrap_or_default();
        record.switch_to(identity);

        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .with_context(|| format!("creating {}", parent.display()))?;
        }
        let json = serde_json::to_string_pretty(&record)?;
        tokio::fs::write(&self.path, json)
            .await
            .with_context(|| format!("writing {}", self.path.display()))?;

        tracing::info!(history = record.history.len(), "active account switched");

        if let Some(tx) = &self.notices {
            // No subscribers is fine.
            let _ = tx.send(ServiceNotice::AccountChanged {
                active: identity.to_string(),
                changed_at: Utc::now(),
            });
        }
        Ok(())
    }
}
