//! Console API abstraction
//!
//! Routes script console output into tracing. Events carry `runtime_type`
//! and `context` fields, which the log formatter renders as `js::persistent:`.

use tracing::{debug, error, info, warn};

/// Severity of a console call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsoleLevel {
    Debug,
    Info,
    Warn,
    Error,
}

impl ConsoleLevel {
    /// Map a console method name to its level
    ///
    /// `log` and `print` are informational.
    pub fn from_method(method: &str) -> Option<Self> {
        match method {
            "debug" | "trace" => Some(ConsoleLevel::Debug),
            "log" | "info" | "print" => Some(ConsoleLevel::Info),
            "warn" => Some(ConsoleLevel::Warn),
            "error" => Some(ConsoleLevel::Error),
            _ => None,
        }
    }
}

/// Console API implementation
#[derive(Clone)]
pub struct ConsoleApi {
    runtime_type: &'static str,
    context: String,
}

impl ConsoleApi {
    /// Create a console for the given runtime and context name
    pub fn new(runtime_type: &'static str, context: impl Into<String>) -> Self {
        Self {
            runtime_type,
            context: context.into(),
        }
    }

    /// Context name attached to every message
    pub fn context(&self) -> &str {
        &self.context
    }

    /// Write one message at `level`
    pub fn write(&self, level: ConsoleLevel, message: &str) {
        let runtime_type = self.runtime_type;
        let context = self.context.as_str();
        match level {
            ConsoleLevel::Debug => debug!(runtime_type, context, "{}", message),
            ConsoleLevel::Info => info!(runtime_type, context, "{}", message),
            ConsoleLevel::Warn => warn!(runtime_type, context, "{}", message),
            ConsoleLevel::Error => error!(runtime_type, context, "{}", message),
        }
    }

    /// Join console arguments the way browsers print them
    pub fn join_args<S: AsRef<str>>(parts: &[S]) -> String {
        parts.iter().map(|part| part.as_ref()).collect::<Vec<_>>().join(" ")
    }
}
