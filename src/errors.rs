use std::path::PathBuf;
use thiserror::Error;

/// Hint printed when the schema is missing from its conventional location.
pub const SCHEMA_NOT_FOUND_HINT: &str =
    "Did you run `sanity schema extract` to generate a schema.json file?";

#[derive(Debug, Error)]
pub enum TypegenError {
    #[error("Failed to resolve config: {0}")]
    ConfigResolution(String),

    #[error("Schema file not found: {}{}", path.display(), hint.map(|h| format!("\n{}", h)).unwrap_or_default())]
    SchemaNotFound {
        path: PathBuf,
        hint: Option<&'static str>,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to access schema file {}: {source}", path.display())]
    SchemaAccess {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse schema file {}: {source}", path.display())]
    SchemaParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to resolve query files: {0}")]
    Extraction(String),

    #[error("Type generation failed: {0}")]
    Generation(String),

    #[error("Progress channel closed")]
    ChannelClosed,

    #[error("Generation worker failed: {0}")]
    Worker(String),

    #[error("Failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to format generated code: {0}")]
    Format(String),

    #[error("File watcher error: {0}")]
    Watcher(#[from] notify::Error),

    #[error("Failed to install signal handlers: {0}")]
    Signal(#[source] std::io::Error),
}

pub type Result<T> = std::result::Result<T, TypegenError>;
