//! Host APIs exposed to scripts
//!
//! APIs are runtime-agnostic; the JavaScript bindings in `adapters::js`
//! expose them to script contexts.

pub mod console;

pub use console::{ConsoleApi, ConsoleLevel};
