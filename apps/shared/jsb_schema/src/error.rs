use thiserror::Error;

pub type Result<T> = std::result::Result<T, SchemaError>;

/// Failures while loading a schema-checked document
#[derive(Error, Debug)]
pub enum SchemaError {
    #[error("Failed to read '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// The generated schema itself could not be compiled
    #[error("Invalid schema: {0}")]
    InvalidSchema(String),

    #[error("Schema validation failed: {0}")]
    Validation(String),
}
