//! Decoder for the assistant's newline-delimited JSON output.
//!
//! Format: one JSON object per line, tagged by `type`. Banner and warning text
//! can be interleaved with the objects and is skipped.

use serde::Deserialize;
use shared::StreamEvent;

/// Wire shape of one protocol line.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum WireEvent {
    ToolUse {
        #[serde(default)]
        tool_name: Option<String>,
        #[serde(default, alias = "input")]
        parameters: Option<serde_json::Value>,
    },
    ToolResult {
        #[serde(default)]
        status: Option<String>,
    },
    Message {
        #[serde(default)]
        role: Option<String>,
        #[serde(default)]
        content: Option<serde_json::Value>,
    },
    Result,
    #[serde(other)]
    Unknown,
}

/// Line-at-a-time decoder that also accumulates the assistant's reply.
///
/// In structured mode only assistant-role `message` fragments count toward the
/// reply. In plain mode every line is reply text.
pub struct StreamDecoder {
    structured: bool,
    response: String,
}

impl StreamDecoder {
    pub fn new(structured: bool) -> Self {
        Self {
            structured,
            response: String::new(),
        }
    }

    /// Decode one output line. Returns the event to forward, if any.
    pub fn feed_line(&mut self, line: &str) -> Option<StreamEvent> {
        if !self.structured {
            self.response.push_str(line);
            self.response.push('\n');
            return Some(StreamEvent::Message {
                role: "assistant".into(),
                content: line.to_string(),
            });
        }

        let trimmed = line.trim();
        if !trimmed.starts_with('{') {
            return None;
        }

        let wire: WireEvent = match serde_json::from_str(trimmed) {
            Ok(wire) => wire,
            Err(e) => {
                tracing::debug!("skipping malformed protocol line: {}", e);
                return None;
            }
        };

        match wire {
            WireEvent::ToolUse {
                tool_name,
                parameters,
            } => Some(StreamEvent::ToolUse {
                name: tool_name.unwrap_or_else(|| "tool".into()),
                input: parameters,
            }),
            WireEvent::ToolResult { status } => Some(StreamEvent::ToolResult {
                success: status.as_deref() == Some("success"),
            }),
            WireEvent::Message { role, content } => {
                let role = role?;
                if role != "assistant" {
                    return None;
                }
                let content = match content? {
                    serde_json::Value::String(s) => s,
                    _ => return None,
                };
                self.response.push_str(&content);
                Some(StreamEvent::Message { role, content })
            }
            WireEvent::Result => None,
            WireEvent::Unknown => Some(StreamEvent::Other),
        }
    }

    /// Reply text accumulated from the lines fed so far.
    pub fn into_response(self) -> String {
        self.response
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode_all(structured: bool, lines: &[&str]) -> (Vec<StreamEvent>, String) {
        let mut decoder = StreamDecoder::new(structured);
        let events = lines
            .iter()
            .filter_map(|line| decoder.feed_line(line))
            .collect();
        (events, decoder.into_response())
    }

    #[test]
    fn test_tool_use_and_message_sequence() {
        let (events, response) = decode_all(
            true,
            &[
                r#"{"type":"tool_use","tool_name":"search"}"#,
                r#"{"type":"message","role":"assistant","content":"Hi"}"#,
                r#"{"type":"message","role":"assistant","content":" there"}"#,
                r#"{"type":"result"}"#,
            ],
        );

        assert_eq!(events.len(), 3);
        assert_eq!(
            events[0],
            StreamEvent::ToolUse {
                name: "search".into(),
                input: None
            }
        );
        assert_eq!(events[1].assistant_text(), Some("Hi"));
        assert_eq!(events[2].assistant_text(), Some(" there"));
        assert_eq!(response, "Hi there");
    }

    #[test]
    fn test_noise_and_malformed_lines_skipped() {
        let (events, response) = decode_all(
            true,
            &[
                "Loaded cached credentials.",
                "{not json",
                "",
                r#"{"type":"message","role":"assistant","content":"ok"}"#,
            ],
        );
        assert_eq!(events.len(), 1);
        assert_eq!(response, "ok");
    }

    #[test]
    fn test_non_assistant_roles_dropped() {
        let (events, response) = decode_all(
            true,
            &[
                r#"{"type":"message","role":"user","content":"my question"}"#,
                r#"{"type":"message","role":"assistant"}"#,
                r#"{"type":"message","content":"no role"}"#,
            ],
        );
        assert!(events.is_empty());
        assert_eq!(response, "");
    }

    #[test]
    fn test_tool_result_status_and_defaults() {
        let (events, _) = decode_all(
            true,
            &[
                r#"{"type":"tool_use","parameters":{"q":"x"}}"#,
                r#"{"type":"tool_result","status":"success"}"#,
                r#"{"type":"tool_result","status":"error"}"#,
                r#"{"type":"tool_result"}"#,
                r#"{"type":"init","session_id":"abc"}"#,
            ],
        );
        assert_eq!(
            events,
            vec![
                StreamEvent::ToolUse {
                    name: "tool".into(),
                    input: Some(serde_json::json!({"q": "x"})),
                },
                StreamEvent::ToolResult { success: true },
                StreamEvent::ToolResult { success: false },
                StreamEvent::ToolResult { success: false },
                StreamEvent::Other,
            ]
        );
    }

    #[test]
    fn test_plain_mode_surfaces_every_line() {
        let (events, response) = decode_all(false, &["Hallo", "{\"type\":\"result\"}"]);
        assert_eq!(events.len(), 2);
        assert_eq!(events[1].assistant_text(), Some("{\"type\":\"result\"}"));
        assert_eq!(response, "Hallo\n{\"type\":\"result\"}\n");
    }
}
