//! Execution context selector
//!
//! Identifies which environment a script runs against. Parsed from the
//! names used by the command layer.

use std::fmt;
use std::str::FromStr;

use crate::error::BridgeError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContextSelector {
    /// The single process-wide context, shared across evaluations
    Persistent,
    /// A fresh, empty context discarded after one evaluation
    Disposable,
    /// Evaluation delegated to the attached page engine
    Page,
}

impl ContextSelector {
    /// All selectors, in declaration order
    pub const ALL: [ContextSelector; 3] = [
        ContextSelector::Persistent,
        ContextSelector::Disposable,
        ContextSelector::Page,
    ];

    /// Canonical name of this selector
    pub fn name(&self) -> &'static str {
        match self {
            ContextSelector::Persistent => "persistent",
            ContextSelector::Disposable => "disposable",
            ContextSelector::Page => "page",
        }
    }

    /// Whether this selector is served by a native context handle
    pub fn is_native(&self) -> bool {
        !matches!(self, ContextSelector::Page)
    }
}

impl FromStr for ContextSelector {
    type Err = BridgeError;

    /// Parse a selector name
    ///
    /// Accepts the canonical names plus the aliases `global` and `clean`,
    /// case-insensitively.
    ///
    /// # Errors
    /// Returns [`BridgeError::InvalidContext`] for any other name
    fn from_str(name: &str) -> Result<Self, Self::Err> {
        match name.trim().to_ascii_lowercase().as_str() {
            "persistent" | "global" => Ok(ContextSelector::Persistent),
            "disposable" | "clean" => Ok(ContextSelector::Disposable),
            "page" => Ok(ContextSelector::Page),
            _ => Err(BridgeError::InvalidContext(name.to_string())),
        }
    }
}

impl fmt::Display for ContextSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
