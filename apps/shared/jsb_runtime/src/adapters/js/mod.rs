//! JavaScript Runtime Adapter (QuickJS)
//!
//! Provides the script bridge over the QuickJS engine via rquickjs.

mod runtime;
pub mod bindings;
pub mod context;
pub mod evaluator;
pub mod exception;
pub mod page;

pub use context::{ContextHandle, ContextResolver};
pub use page::{HeadlessPage, PageCallback, PageEngine, PageError, PageResult, stringify_page_value};
pub use runtime::ScriptBridge;
