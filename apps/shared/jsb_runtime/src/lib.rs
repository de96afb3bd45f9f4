//! JsBridge Runtime
//!
//! Runs JavaScript source against one of three execution contexts and reports
//! every request through a single deferred completion.
//!
//! # Architecture
//!
//! - **ContextSelector**: persistent, disposable or page target, parsed from names
//! - **ScriptBridge**: owns the QuickJS runtime and the persistent context,
//!   dispatches requests to native contexts or to the attached page engine
//! - **PageEngine**: boundary to an external engine evaluating inside a page
//! - **CompletionSink**: callback that fires exactly once per request
//! - **template**: `%N` argument substitution for script files

pub mod api;
pub mod completion;
pub mod config;
pub mod error;
pub mod request;
pub mod selector;
pub mod template;

// Conditional module imports based on features
#[cfg(feature = "js")]
pub mod adapters;

pub use completion::CompletionSink;
pub use config::BridgeConfig;
pub use error::{BridgeError, Diagnostic, EvalOutcome, Result, require_args};
pub use request::{EvalRequest, ScriptSource};
pub use selector::ContextSelector;

#[cfg(feature = "js")]
pub use adapters::js::{HeadlessPage, PageEngine, PageError, ScriptBridge};
