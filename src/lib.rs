// groq-typegen - Type generation for GROQ queries
//!
//! Extracts GROQ queries from project sources, generates TypeScript types
//! for them and for the schema, and keeps the output current in watch mode.

pub mod channel;
pub mod config;
pub mod errors;
pub mod extractor;
pub mod generator;
pub mod host;
pub mod schema;
pub mod telemetry;
pub mod watch;
pub mod worker;

#[cfg(test)]
pub mod tests;

// Re-export common types
pub use channel::{ProgressEvent, ProgressReceiver, ProgressSender, progress_channel};
pub use config::{ConfigMethod, ResolvedConfig, TypeGenConfig, resolve_config};
pub use errors::{Result, TypegenError};
pub use generator::{GenerateTypesResult, Generator, TypeScriptGenerator, TypegenStats};
pub use host::WorkerHost;
pub use watch::{ShutdownGuard, WatchOptions, WatcherStats, run_watch};
pub use worker::{WorkerPayload, spawn_worker};
