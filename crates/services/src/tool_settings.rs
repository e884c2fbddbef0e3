//! Registration of auxiliary tool servers in the assistant's settings document.
//!
//! Only the `mcpServers.<name>` entry is touched; every other key in the
//! document is written back as it was read.

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::path::Path;

const SERVERS_KEY: &str = "mcpServers";

/// Launch description for one tool server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolServerEntry {
    pub command: String,
    #[serde(default)]
    pub args: Vec<String>,
    /// Session-scoped addressing forwarded to the server process
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub env: BTreeMap<String, String>,
}

async fn read_document(path: &Path) -> Result<Map<String, Value>> {
    let contents = match tokio::fs::read_to_string(path).await {
        Ok(contents) => contents,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Map::new()),
        Err(e) => return Err(e).with_context(|| format!("reading {}", path.display())),
    };
    if contents.trim().is_empty() {
        return Ok(Map::new());
    }
    // Refuse to overwrite a document we cannot parse; it belongs to the user.
    match serde_json::from_str::<Value>(&contents)
        .with_context(|| format!("parsing {}", path.display()))?
    {
        Value::Object(map) => Ok(map),
        _ => Err(anyhow!("{} is not a JSON object", path.display())),
    }
}

async fn write_document(path: &Path, doc: Map<String, Value>) -> Result<()> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .with_context(|| format!("creating {}", parent.display()))?;
    }
    let json = serde_json::to_string_pretty(&Value::Object(doc))?;
    tokio::fs::write(path, json)
        .await
        .with_context(|| format!("writing {}", path.display()))
}

/// Insert or replace the server entry `name`.
pub async fn register_tool_server(path: &Path, name: &str, entry: &ToolServerEntry) -> Result<()> {
    let mut doc = read_document(path).await?;
    if !doc.get(SERVERS_KEY).is_some_and(Value::is_object) {
        doc.insert(SERVERS_KEY.to_string(), Value::Object(Map::new()));
    }
    if let Some(servers) = doc.get_mut(SERVERS_KEY).and_then(Value::as_object_mut) {
        servers.insert(name.to_string(), serde_json::to_value(entry)?);
    }
    write_document(path, doc).await?;
    tracing::info!(server = name, "registered tool server");
    Ok(())
}

/// Remove the server entry `name`. Returns whether it existed.
pub async fn remove_tool_server(path: &Path, name: &str) -> Result<bool> {
    let mut doc = read_document(path).await?;
    let removed = doc
        .get_mut(SERVERS_KEY)
        .and_then(Value::as_object_mut)
        .map(|servers| servers.remove(name).is_some())
        .unwrap_or(false);
    if removed {
        write_document(path, doc).await?;
        tracing::info!(server = name, "removed tool server");
    }
    Ok(removed)
}

/// Read back the server entry `name`, if registered.
pub async fn read_tool_server(path: &Path, name: &str) -> Result<Option<ToolServerEntry>> {
    let doc = read_document(path).await?;
    doc.get(SERVERS_KEY)
        .and_then(|servers| servers.get(name))
        .map(|entry| serde_json::from_value(entry.clone()).map_err(Into::into))
        .transpose()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry() -> ToolServerEntry {
        ToolServerEntry {
            command: "/usr/local/bin/mail-tools".into(),
            args: vec!["--stdio".into()],
            env: [("MAIL_SESSION_PORT".to_string(), "48111".to_string())]
                .into_iter()
                .collect(),
        }
    }

    #[tokio::test]
    async fn test_register_preserves_unrelated_keys() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(
            &path,
            r#"{"theme":"Dracula","mcpServers":{"other":{"command":"x"}}}"#,
        )
        .unwrap();

        register_tool_server(&path, "mail", &entry()).await.unwrap();

        let doc: Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(doc["theme"], "Dracula");
        assert_eq!(doc["mcpServers"]["other"]["command"], "x");
        assert_eq!(doc["mcpServers"]["mail"]["args"][0], "--stdio");
        assert_eq!(doc["mcpServers"]["mail"]["env"]["MAIL_SESSION_PORT"], "48111");
        assert_eq!(
            read_tool_server(&path, "mail").await.unwrap(),
            Some(entry())
        );
    }

    #[tokio::test]
    async fn test_register_creates_missing_document() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".gemini").join("settings.json");
        register_tool_server(&path, "mail", &entry()).await.unwrap();
        assert!(path.exists());
    }

    #[tokio::test]
    async fn test_malformed_document_left_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, "{ broken").unwrap();

        assert!(register_tool_server(&path, "mail", &entry()).await.is_err());
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "{ broken");
    }

    #[tokio::test]
    async fn test_remove_only_named_entry() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        register_tool_server(&path, "mail", &entry()).await.unwrap();
        register_tool_server(&path, "calendar", &entry()).await.unwrap();

        assert!(remove_tool_server(&path, "mail").await.unwrap());
        assert!(!remove_tool_server(&path, "mail").await.unwrap());
        assert!(read_tool_server(&path, "calendar").await.unwrap().is_some());
    }
}
