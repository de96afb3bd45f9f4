use std::path::Path;

use jsb_runtime::BridgeConfig;
use jsb_schema::Validatable;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::Level;

/// Command-line tool configuration
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[schemars(title = "JsBridge CLI Configuration")]
pub struct Config {
    /// Logging level
    #[serde(default = "default_log_level")]
    #[schemars(description = "Log level: trace, debug, info, warn, error")]
    #[schemars(regex(pattern = r"^(trace|debug|info|warn|error)$"))]
    pub log_level: String,

    /// Script bridge settings
    #[serde(default)]
    #[schemars(description = "Settings of the script bridge and its persistent context")]
    pub bridge: BridgeConfig,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            bridge: BridgeConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from `path`
    ///
    /// A missing file is only tolerated when `required` is false, in which
    /// case the defaults are used.
    pub fn load(path: &Path, required: bool) -> jsb_schema::Result<Self> {
        if !required && !path.exists() {
            return Ok(Self::default());
        }
        Self::from_json_file(path)
    }

    /// Configured log level, or INFO when it cannot be parsed
    pub fn level(&self) -> Level {
        jsb_log::parse_level(&self.log_level).unwrap_or(Level::INFO)
    }
}

impl Validatable for Config {}
