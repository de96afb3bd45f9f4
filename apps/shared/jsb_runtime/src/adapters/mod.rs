//! Runtime Adapters
//!
//! Engine-specific implementations behind the bridge.

#[cfg(feature = "js")]
pub mod js;

#[cfg(feature = "js")]
pub use js::{HeadlessPage, PageEngine, ScriptBridge};
