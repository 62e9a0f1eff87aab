//! Recording collaborators for host and watch tests

use crate::errors::Result;
use crate::host::{Formatter, OutputTarget};
use crate::telemetry::{TelemetryLogger, TelemetryTrace};
use async_trait::async_trait;
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

/// Keeps every write in memory
#[derive(Default)]
pub struct RecordingOutput {
    writes: Mutex<Vec<(PathBuf, String)>>,
}

impl RecordingOutput {
    pub fn writes(&self) -> Vec<(PathBuf, String)> {
        self.writes.lock().unwrap().clone()
    }
}

#[async_trait]
impl OutputTarget for RecordingOutput {
    async fn write_file(&self, path: &Path, contents: &str) -> Result<()> {
        self.writes
            .lock()
            .unwrap()
            .push((path.to_path_buf(), contents.to_string()));
        Ok(())
    }
}

pub const FORMATTED_MARKER: &str = "// formatted\n";

/// Prefixes the code with [`FORMATTED_MARKER`]
pub struct TaggingFormatter;

#[async_trait]
impl Formatter for TaggingFormatter {
    async fn format(&self, code: &str, _path: &Path) -> Result<String> {
        Ok(format!("{}{}", FORMATTED_MARKER, code))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum TraceRecord {
    Start(&'static str),
    Log(&'static str, Value),
    Error(&'static str, String),
    Complete(&'static str),
}

#[derive(Clone, Default)]
pub struct RecordingTelemetry {
    records: Arc<Mutex<Vec<TraceRecord>>>,
}

impl RecordingTelemetry {
    pub fn records(&self) -> Vec<TraceRecord> {
        self.records.lock().unwrap().clone()
    }
}

impl TelemetryLogger for RecordingTelemetry {
    fn trace(&self, name: &'static str) -> Box<dyn TelemetryTrace> {
        Box::new(RecordingTrace {
            name,
            records: self.records.clone(),
        })
    }
}

struct RecordingTrace {
    name: &'static str,
    records: Arc<Mutex<Vec<TraceRecord>>>,
}

impl RecordingTrace {
    fn push(&self, record: TraceRecord) {
        self.records.lock().unwrap().push(record);
    }
}

impl TelemetryTrace for RecordingTrace {
    fn start(&mut self) {
        self.push(TraceRecord::Start(self.name));
    }

    fn log(&mut self, payload: Value) {
        self.push(TraceRecord::Log(self.name, payload));
    }

    fn error(&mut self, error: &dyn std::error::Error) {
        self.push(TraceRecord::Error(self.name, error.to_string()));
    }

    fn complete(&mut self) {
        self.push(TraceRecord::Complete(self.name));
    }
}
