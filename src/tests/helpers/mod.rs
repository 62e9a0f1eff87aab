pub mod project;
pub mod recording;
pub mod tempdir;

pub use project::TestProject;
pub use recording::{RecordingOutput, RecordingTelemetry, TaggingFormatter, TraceRecord};
pub use tempdir::unique_temp_dir;
