//! Line-oriented command session
//!
//! Each input line is one command:
//!
//! - `js <context> <script...>` evaluates the rest of the line
//! - `script <context> <path> [args...]` evaluates a templated script file
//!
//! Blank lines and lines starting with `#` are ignored.

use std::path::PathBuf;
use std::sync::Arc;

use jsb_runtime::{BridgeError, CompletionSink, EvalOutcome, ScriptBridge, ScriptSource, require_args};
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::signal;
use tracing::{debug, error, info, warn};

/// Split off the first whitespace-delimited word
fn split_word(text: &str) -> (&str, &str) {
    let text = text.trim_start();
    match text.find(char::is_whitespace) {
        Some(end) => (&text[..end], text[end..].trim_start()),
        None => (text, ""),
    }
}

pub struct Session {
    bridge: Arc<ScriptBridge>,
}

impl Session {
    pub fn new(bridge: Arc<ScriptBridge>) -> Self {
        Self { bridge }
    }

    /// Run one command line and wait for its outcome
    ///
    /// Returns `None` for lines that are not commands.
    pub async fn execute_line(&self, line: &str) -> Option<EvalOutcome> {
        let (command, rest) = split_word(line);
        if command.is_empty() || command.starts_with('#') {
            return None;
        }

        let (sink, rx) = CompletionSink::channel();

        match command {
            "js" => self.js(rest, sink),
            "script" => self.script(rest, sink),
            other => {
                warn!("Unknown command '{}'", other);
                return None;
            }
        }

        let outcome = rx.await.unwrap_or(Err(BridgeError::Abandoned));
        self.bridge.drain_pending_jobs().await;
        Some(outcome)
    }

    fn js(&self, rest: &str, sink: CompletionSink) {
        let (context, script) = split_word(rest);
        let args: Vec<&str> = [context, script].into_iter().filter(|arg| !arg.is_empty()).collect();

        if let Err(error) = require_args(&args, 2) {
            sink.complete(Err(error));
            return;
        }

        self.bridge
            .submit_named(context, ScriptSource::Inline(script.to_string()), sink);
    }

    fn script(&self, rest: &str, sink: CompletionSink) {
        let args: Vec<&str> = rest.split_whitespace().collect();

        if let Err(error) = require_args(&args, 2) {
            sink.complete(Err(error));
            return;
        }

        let source = ScriptSource::File {
            path: PathBuf::from(args[1]),
            args: args[2..].iter().map(|arg| arg.to_string()).collect(),
        };
        self.bridge.submit_named(args[0], source, sink);
    }

    /// Read commands from `input` until end of input or Ctrl+C
    pub async fn run<R: AsyncBufRead + Unpin>(&self, input: R) {
        let mut lines = input.lines();
        info!("Session started, reading commands");

        loop {
            tokio::select! {
                line = lines.next_line() => {
                    match line {
                        Ok(Some(line)) => self.report(&line).await,
                        Ok(None) => {
                            debug!("End of input");
                            break;
                        }
                        Err(e) => {
                            error!("Failed to read command: {}", e);
                            break;
                        }
                    }
                }
                _ = signal::ctrl_c() => {
                    info!("Received shutdown signal (Ctrl+C)");
                    break;
                }
            }
        }
    }

    async fn report(&self, line: &str) {
        match self.execute_line(line).await {
            Some(Ok(Some(text))) => println!("{}", text),
            Some(Ok(None)) | None => {}
            Some(Err(e)) => error!("{}", e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsb_runtime::BridgeConfig;
    use std::io::Write;

    async fn session() -> Session {
        let bridge = ScriptBridge::new(BridgeConfig::default()).await.unwrap();
        Session::new(Arc::new(bridge))
    }

    #[test]
    fn test_split_word() {
        assert_eq!(split_word("  js persistent 1 + 1"), ("js", "persistent 1 + 1"));
        assert_eq!(split_word("js"), ("js", ""));
        assert_eq!(split_word(""), ("", ""));
    }

    #[tokio::test]
    async fn test_js_command() {
        let session = session().await;
        let outcome = session.execute_line("js clean 1 + 1").await.unwrap();
        assert_eq!(outcome.unwrap().as_deref(), Some("2"));
    }

    #[tokio::test]
    async fn test_state_persists_across_lines() {
        let session = session().await;
        session.execute_line("js persistent greeting = 'hi'").await.unwrap().unwrap();
        let outcome = session.execute_line("js global greeting + ' there'").await.unwrap();
        assert_eq!(outcome.unwrap().as_deref(), Some("hi there"));
    }

    #[tokio::test]
    async fn test_missing_arguments_go_through_completion() {
        let session = session().await;

        let err = session.execute_line("js persistent").await.unwrap().unwrap_err();
        assert_eq!(err.to_string(), "not enough arguments (expected 2, was 1)");

        let err = session.execute_line("script").await.unwrap().unwrap_err();
        assert_eq!(err.to_string(), "not enough arguments (expected 2, was 0)");
    }

    #[tokio::test]
    async fn test_invalid_context() {
        let session = session().await;
        let err = session.execute_line("js window 1").await.unwrap().unwrap_err();
        assert!(matches!(err, BridgeError::InvalidContext(_)));
    }

    #[tokio::test]
    async fn test_script_command() {
        let session = session().await;
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "'%2' + '%1'").unwrap();

        let line = format!("script disposable {} a b", file.path().display());
        let outcome = session.execute_line(&line).await.unwrap();
        assert_eq!(outcome.unwrap().as_deref(), Some("ba"));
    }

    #[tokio::test]
    async fn test_ignored_lines() {
        let session = session().await;
        assert!(session.execute_line("").await.is_none());
        assert!(session.execute_line("# comment").await.is_none());
        assert!(session.execute_line("reload").await.is_none());
    }

    #[tokio::test]
    async fn test_run_reads_until_end_of_input() {
        let session = session().await;
        let input: &[u8] = b"js persistent total = 1\njs persistent total += 2\n";
        session.run(input).await;

        let outcome = session.execute_line("js persistent total").await.unwrap();
        assert_eq!(outcome.unwrap().as_deref(), Some("3"));
    }
}
