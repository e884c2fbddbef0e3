//! One-shot assistant invocations.
//!
//! Each call spawns one process, feeds the prompt through stdin (never argv, so
//! message content does not show up in process listings), and drains stdout and
//! stderr concurrently. Every line is forwarded the moment it is read.

use crate::stderr_filter;
use crate::stream_json::StreamDecoder;
use shared::{AssistantError, StreamEvent};
use std::path::PathBuf;
use std::process::Stdio;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::process::Command;
use tokio::sync::mpsc::UnboundedSender;

/// Resolved program used to launch the assistant.
#[derive(Debug, Clone)]
pub struct CliCommand {
    /// Host runtime (e.g. node); `None` executes `binary` directly
    pub runtime: Option<PathBuf>,
    pub binary: PathBuf,
    /// Environment applied to the child only
    pub env: Vec<(String, String)>,
}

impl CliCommand {
    /// Build an invocation with `args` after the binary.
    pub fn invocation(&self, args: Vec<String>, prompt: Option<String>, structured: bool) -> Invocation {
        let (program, mut full_args) = match &self.runtime {
            Some(runtime) => (
                runtime.clone(),
                vec![self.binary.to_string_lossy().to_string()],
            ),
            None => (self.binary.clone(), Vec::new()),
        };
        full_args.extend(args);

        Invocation {
            program,
            args: full_args,
            prompt,
            structured,
            env: self.env.clone(),
        }
    }
}

/// A single process run. Created per call and never reused.
#[derive(Debug, Clone)]
pub struct Invocation {
    pub program: PathBuf,
    pub args: Vec<String>,
    /// Delivered on stdin, then stdin is closed
    pub prompt: Option<String>,
    pub structured: bool,
    pub env: Vec<(String, String)>,
}

/// Raw line as read from the child.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputLine {
    Stdout(String),
    Stderr(String),
}

/// Optional live channels for a run.
#[derive(Debug, Clone, Default)]
pub struct StreamSinks {
    pub events: Option<UnboundedSender<StreamEvent>>,
    pub lines: Option<UnboundedSender<OutputLine>>,
}

/// Everything a finished run produced.
#[derive(Debug, Clone)]
pub struct InvocationOutput {
    pub program: String,
    pub structured: bool,
    /// Accumulated reply text, as decoded
    pub response: String,
    pub events: Vec<StreamEvent>,
    pub stdout: String,
    pub stderr: String,
    pub success: bool,
    pub exit_code: Option<i32>,
}

impl InvocationOutput {
    /// Reply text handed back to callers.
    pub fn reply(&self) -> String {
        if self.structured {
            self.response.clone()
        } else {
            self.response.trim().to_string()
        }
    }
}

/// Spawn the invocation and drain it to completion.
///
/// No timeout and no retry: login runs at human pace and retries are caller policy.
pub async fn run(invocation: Invocation, sinks: StreamSinks) -> Result<InvocationOutput, AssistantError> {
    tracing::debug!(
        program = %invocation.program.display(),
        args = ?invocation.args,
        prompt_bytes = invocation.prompt.as_ref().map(|p| p.len()).unwrap_or(0),
        structured = invocation.structured,
        "spawning assistant"
    );

    let mut child = Command::new(&invocation.program)
        .args(&invocation.args)
        .envs(invocation.env.iter().map(|(k, v)| (k.as_str(), v.as_str())))
        .stdin(if invocation.prompt.is_some() {
            Stdio::piped()
        } else {
            Stdio::null()
        })
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .map_err(AssistantError::Spawn)?;

    let stdin = child.stdin.take();
    let stdout = child
        .stdout
        .take()
        .ok_or_else(|| AssistantError::ProcessFailure {
            message: "assistant stdout was not captured".into(),
        })?;
    let stderr = child
        .stderr
        .take()
        .ok_or_else(|| AssistantError::ProcessFailure {
            message: "assistant stderr was not captured".into(),
        })?;

    let prompt = invocation.prompt.as_deref();
    let write_prompt = async move {
        if let (Some(mut stdin), Some(prompt)) = (stdin, prompt) {
            // Child may exit before reading everything; its exit status decides the outcome.
            if let Err(e) = stdin.write_all(prompt.as_bytes()).await {
                tracing::debug!("assistant closed stdin early: {}", e);
            }
            let _ = stdin.shutdown().await;
        }
    };

    let lines_tx = sinks.lines.as_ref();
    let events_tx = sinks.events.as_ref();
    let structured = invocation.structured;

    let read_stdout = async move {
        let mut reader = BufReader::new(stdout);
        let mut decoder = StreamDecoder::new(structured);
        let mut raw = String::new();
        let mut events = Vec::new();
        while let Some(line) = next_line_lossy(&mut reader).await? {
            raw.push_str(&line);
            raw.push('\n');
            if let Some(tx) = lines_tx {
                let _ = tx.send(OutputLine::Stdout(line.clone()));
            }
            if let Some(event) = decoder.feed_line(&line) {
                if let Some(tx) = events_tx {
                    let _ = tx.send(event.clone());
                }
                events.push(event);
            }
        }
        Ok::<_, std::io::Error>((raw, events, decoder.into_response()))
    };

    let read_stderr = async move {
        let mut reader = BufReader::new(stderr);
        let mut raw = String::new();
        while let Some(line) = next_line_lossy(&mut reader).await? {
            raw.push_str(&line);
            raw.push('\n');
            if let Some(tx) = lines_tx {
                let _ = tx.send(OutputLine::Stderr(line));
            }
        }
        Ok::<_, std::io::Error>(raw)
    };

    let ((), stdout_result, stderr_result) = tokio::join!(write_prompt, read_stdout, read_stderr);
    let (stdout, events, response) = stdout_result?;
    let stderr = stderr_result?;

    let status = child.wait().await?;
    tracing::debug!(
        status = ?status.code(),
        stdout_bytes = stdout.len(),
        stderr_bytes = stderr.len(),
        "assistant exited"
    );

    Ok(InvocationOutput {
        program: invocation.program.to_string_lossy().to_string(),
        structured,
        response,
        events,
        stdout,
        stderr,
        success: status.success(),
        exit_code: status.code(),
    })
}

/// Read one line, tolerating invalid UTF-8. Strips the line terminator.
async fn next_line_lossy<R>(reader: &mut R) -> std::io::Result<Option<String>>
where
    R: AsyncBufRead + Unpin,
{
    let mut buf = Vec::new();
    let read = reader.read_until(b'\n', &mut buf).await?;
    if read == 0 {
        return Ok(None);
    }
    if buf.ends_with(b"\n") {
        buf.pop();
        if buf.ends_with(b"\r") {
            buf.pop();
        }
    }
    Ok(Some(String::from_utf8_lossy(&buf).into_owned()))
}

/// Decide whether a finished run counts as success.
///
/// A nonzero exit whose stderr is only known noise, with usable output, is
/// accepted. Otherwise stderr mentioning auth maps to `AuthenticationRequired`
/// and anything else to `ProcessFailure` carrying the cleaned stderr.
pub fn resolve_outcome(output: &InvocationOutput) -> Result<String, AssistantError> {
    if output.success {
        return Ok(output.reply());
    }

    let cleaned = stderr_filter::classify(&output.stderr);
    let reply = output.reply();

    if cleaned.is_empty() && !reply.trim().is_empty() {
        tracing::warn!(
            exit_code = ?output.exit_code,
            "assistant exited unsuccessfully with benign stderr only; using its output"
        );
        return Ok(reply);
    }

    if cleaned.to_lowercase().contains("auth") {
        return Err(AssistantError::AuthenticationRequired { message: cleaned });
    }

    let message = if cleaned.is_empty() {
        match output.exit_code {
            Some(code) => format!("{} exited with status {}", output.program, code),
            None => format!("{} was terminated by a signal", output.program),
        }
    } else {
        cleaned
    };
    Err(AssistantError::ProcessFailure { message })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn output(success: bool, stdout: &str, stderr: &str) -> InvocationOutput {
        InvocationOutput {
            program: "gemini".into(),
            structured: false,
            response: stdout.to_string(),
            events: vec![],
            stdout: stdout.to_string(),
            stderr: stderr.to_string(),
            success,
            exit_code: Some(if success { 0 } else { 1 }),
        }
    }

    #[test]
    fn test_benign_noise_is_tolerated() {
        let out = output(
            false,
            "Bonjour\n",
            "(node:1) [DEP0040] DeprecationWarning: The `punycode` module is deprecated.\nLoaded cached credentials.\n",
        );
        assert_eq!(resolve_outcome(&out).unwrap(), "Bonjour");
    }

    #[test]
    fn test_real_failure_reports_cleaned_stderr() {
        let out = output(false, "", "Loaded cached credentials.\nError: quota exceeded\n");
        let err = resolve_outcome(&out).unwrap_err();
        assert!(matches!(err, AssistantError::ProcessFailure { .. }));
        assert!(err.to_string().contains("quota exceeded"));
        assert!(!err.to_string().contains("cached credentials"));
    }

    #[test]
    fn test_pid_prefixed_error_is_a_real_failure() {
        let stderr = "(node:4242) UnhandledPromiseRejectionWarning: Error: quota exceeded\n";

        let partial = resolve_outcome(&output(false, "partial\n", stderr)).unwrap_err();
        assert!(matches!(partial, AssistantError::ProcessFailure { .. }));
        assert!(partial.to_string().contains("quota exceeded"));

        let empty = resolve_outcome(&output(false, "", stderr)).unwrap_err();
        assert!(empty.to_string().contains("quota exceeded"));
    }

    #[test]
    fn test_auth_hint_maps_to_auth_required() {
        let out = output(false, "", "Please set an Auth method in your settings\n");
        let err = resolve_outcome(&out).unwrap_err();
        assert!(err.is_auth_required());
    }

    #[test]
    fn test_empty_failure_names_exit_status() {
        let out = output(false, "", "");
        let err = resolve_outcome(&out).unwrap_err();
        assert_eq!(err.to_string(), "gemini exited with status 1");
    }

    #[test]
    fn test_runtime_prefixes_binary() {
        let command = CliCommand {
            runtime: Some(PathBuf::from("node")),
            binary: PathBuf::from("/opt/gemini/cli.js"),
            env: vec![("NODE_NO_WARNINGS".into(), "1".into())],
        };
        let inv = command.invocation(vec!["-p".into(), "-".into()], Some("hi".into()), false);
        assert_eq!(inv.program, PathBuf::from("node"));
        assert_eq!(inv.args, vec!["/opt/gemini/cli.js", "-p", "-"]);
        assert!(!inv.args.iter().any(|a| a == "hi"));
    }

    #[cfg(unix)]
    mod process {
        use super::super::*;
        use std::path::Path;

        fn script_command(dir: &Path, body: &str) -> CliCommand {
            let script = dir.join("fake-assistant.sh");
            std::fs::write(&script, body).unwrap();
            CliCommand {
                runtime: Some(PathBuf::from("sh")),
                binary: script,
                env: vec![("NODE_NO_WARNINGS".into(), "1".into())],
            }
        }

        #[tokio::test]
        async fn test_prompt_arrives_on_stdin_and_events_stream_in_order() {
            let dir = tempfile::tempdir().unwrap();
            let command = script_command(
                dir.path(),
                r#"read prompt
echo "(node:7) [DEP0040] DeprecationWarning: noise" >&2
echo '{"type":"tool_use","tool_name":"search"}'
printf '{"type":"message","role":"assistant","content":"%s"}\n' "$prompt"
echo '{"type":"message","role":"assistant","content":" / '"$NODE_NO_WARNINGS"'"}'
echo '{"type":"result"}'
"#,
            );

            let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
            let inv = command.invocation(vec![], Some("echo me\n".into()), true);
            let out = run(
                inv,
                StreamSinks {
                    events: Some(tx),
                    lines: None,
                },
            )
            .await
            .unwrap();

            assert!(out.success);
            assert_eq!(out.response, "echo me / 1");
            assert_eq!(resolve_outcome(&out).unwrap(), "echo me / 1");

            let mut streamed = Vec::new();
            while let Ok(event) = rx.try_recv() {
                streamed.push(event);
            }
            assert_eq!(streamed, out.events);
            assert!(matches!(streamed[0], StreamEvent::ToolUse { ref name, .. } if name == "search"));
            assert_eq!(streamed.len(), 3);
        }

        #[tokio::test]
        async fn test_lines_forwarded_from_both_streams() {
            let dir = tempfile::tempdir().unwrap();
            let command = script_command(
                dir.path(),
                "echo out-1\necho err-1 >&2\necho out-2\n",
            );
            let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
            let out = run(
                command.invocation(vec![], None, false),
                StreamSinks {
                    events: None,
                    lines: Some(tx),
                },
            )
            .await
            .unwrap();

            let mut lines = Vec::new();
            while let Ok(line) = rx.try_recv() {
                lines.push(line);
            }
            let stdout: Vec<_> = lines
                .iter()
                .filter_map(|l| match l {
                    OutputLine::Stdout(s) => Some(s.as_str()),
                    _ => None,
                })
                .collect();
            assert_eq!(stdout, vec!["out-1", "out-2"]);
            assert!(lines.contains(&OutputLine::Stderr("err-1".into())));
            assert_eq!(out.reply(), "out-1\nout-2");
        }

        #[tokio::test]
        async fn test_nonzero_exit_with_noise_only_succeeds() {
            let dir = tempfile::tempdir().unwrap();
            let command = script_command(
                dir.path(),
                r#"echo "(node:42) [DEP0040] DeprecationWarning: The \`punycode\` module is deprecated." >&2
echo "(Use \`node --trace-deprecation ...\` to show where the warning was created)" >&2
echo "Translated text"
exit 1
"#,
            );
            let out = run(command.invocation(vec![], Some("x".into()), false), StreamSinks::default())
                .await
                .unwrap();
            assert!(!out.success);
            assert_eq!(resolve_outcome(&out).unwrap(), "Translated text");
        }

        #[tokio::test]
        async fn test_nonzero_exit_with_real_error_fails() {
            let dir = tempfile::tempdir().unwrap();
            let command = script_command(dir.path(), "echo 'Error: quota exceeded' >&2\nexit 2\n");
            let out = run(command.invocation(vec![], Some("x".into()), false), StreamSinks::default())
                .await
                .unwrap();
            let err = resolve_outcome(&out).unwrap_err();
            assert!(err.to_string().contains("quota exceeded"));
        }

        #[tokio::test]
        async fn test_missing_program_is_spawn_error() {
            let command = CliCommand {
                runtime: None,
                binary: PathBuf::from("/nonexistent/assistant-binary"),
                env: vec![],
            };
            let err = run(command.invocation(vec![], None, false), StreamSinks::default())
                .await
                .unwrap_err();
            assert!(matches!(err, AssistantError::Spawn(_)));
        }
    }
}
