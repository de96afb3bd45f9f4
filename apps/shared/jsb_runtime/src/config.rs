use std::collections::BTreeMap;

use jsb_schema::Validatable;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Script bridge configuration
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[schemars(title = "JsBridge Configuration")]
pub struct BridgeConfig {
    /// Name of the read-only global object exposing host values
    #[serde(default = "default_root_object")]
    #[schemars(description = "Global object on the persistent context holding host-provided values")]
    #[schemars(regex(pattern = r"^[A-Za-z_$][A-Za-z0-9_$]*$"))]
    pub root_object: String,

    /// Source label attached to inline scripts
    #[serde(default = "default_command_label")]
    #[schemars(description = "Source label reported in diagnostics for inline scripts")]
    pub command_label: String,

    /// Install console.* and print on the persistent context
    #[serde(default = "default_true")]
    #[schemars(description = "Expose console.log/info/warn/error/debug and print to persistent scripts")]
    pub console: bool,

    /// Values published on the root object at startup
    #[serde(default)]
    #[schemars(description = "Host values published on the root object when the bridge starts")]
    pub host_values: BTreeMap<String, serde_json::Value>,
}

fn default_root_object() -> String {
    "host".to_string()
}

fn default_command_label() -> String {
    "(command)".to_string()
}

fn default_true() -> bool {
    true
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            root_object: default_root_object(),
            command_label: default_command_label(),
            console: default_true(),
            host_values: BTreeMap::new(),
        }
    }
}

impl BridgeConfig {
    /// Publish a host value on the root object at startup
    pub fn with_host_value(mut self, name: impl Into<String>, value: serde_json::Value) -> Self {
        self.host_values.insert(name.into(), value);
        self
    }
}

impl Validatable for BridgeConfig {}
