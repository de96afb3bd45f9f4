//! Evaluation requests

use std::path::PathBuf;

use crate::error::Result;
use crate::selector::ContextSelector;
use crate::template;

/// Where the script text of a request comes from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScriptSource {
    /// Script text given directly
    Inline(String),
    /// Script file with positional arguments for its `%N` placeholders
    File { path: PathBuf, args: Vec<String> },
}

impl ScriptSource {
    /// Label reported in diagnostics: the file path as given, or `command_label`
    pub fn label(&self, command_label: &str) -> String {
        match self {
            ScriptSource::Inline(_) => command_label.to_string(),
            ScriptSource::File { path, .. } => path.display().to_string(),
        }
    }

    /// Final script text, reading and templating a file source
    ///
    /// # Errors
    /// Returns [`BridgeError::Load`](crate::BridgeError::Load) when the file cannot be read
    pub fn into_script(self) -> Result<String> {
        match self {
            ScriptSource::Inline(source) => Ok(source),
            ScriptSource::File { path, args } => template::load_script(&path, &args),
        }
    }
}

/// A script to run and the context to run it in
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EvalRequest {
    pub context: ContextSelector,
    pub source: ScriptSource,
    /// Overrides the label derived from the source
    pub label: Option<String>,
}

impl EvalRequest {
    pub fn inline(context: ContextSelector, source: impl Into<String>) -> Self {
        Self {
            context,
            source: ScriptSource::Inline(source.into()),
            label: None,
        }
    }

    pub fn file<I, S>(context: ContextSelector, path: impl Into<PathBuf>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            context,
            source: ScriptSource::File {
                path: path.into(),
                args: args.into_iter().map(Into::into).collect(),
            },
            label: None,
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Label for this request, given the configured inline label
    pub fn resolved_label(&self, command_label: &str) -> String {
        self.label
            .clone()
            .unwrap_or_else(|| self.source.label(command_label))
    }
}
