//! Telemetry traces
//!
//! A trace brackets one unit of work: `start`, any number of `log` calls,
//! an optional `error`, then `complete`. The default logger forwards
//! everything to `tracing`; transport is left to the subscriber.

use crate::config::ConfigMethod;
use crate::generator::TypegenStats;
use crate::watch::WatcherStats;
use serde::Serialize;
use serde_json::Value;
use tracing::{info, warn};

pub const GENERATE_TRACE: &str = "typegen.generate";
pub const WATCH_TRACE: &str = "typegen.watch";

pub trait TelemetryLogger: Send + Sync {
    fn trace(&self, name: &'static str) -> Box<dyn TelemetryTrace>;
}

pub trait TelemetryTrace: Send {
    fn start(&mut self);
    fn log(&mut self, payload: Value);
    fn error(&mut self, error: &dyn std::error::Error);
    fn complete(&mut self);
}

/// Payload logged after a successful generation
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationTracePayload {
    #[serde(flatten)]
    pub stats: TypegenStats,
    pub config_method: ConfigMethod,
    pub overload_client_methods: bool,
}

impl GenerationTracePayload {
    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

/// Payload logged when a watch session ends
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WatchTracePayload {
    #[serde(flatten)]
    pub stats: WatcherStats,
    pub config_method: ConfigMethod,
    pub overload_client_methods: bool,
}

impl WatchTracePayload {
    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

/// A started trace that completes itself when dropped
///
/// Dropping the owning future mid-run still closes the trace.
pub struct ActiveTrace {
    inner: Box<dyn TelemetryTrace>,
    completed: bool,
}

impl ActiveTrace {
    pub fn start(logger: &dyn TelemetryLogger, name: &'static str) -> Self {
        let mut inner = logger.trace(name);
        inner.start();
        Self {
            inner,
            completed: false,
        }
    }

    pub fn log(&mut self, payload: Value) {
        self.inner.log(payload);
    }

    pub fn error(&mut self, error: &dyn std::error::Error) {
        self.inner.error(error);
    }

    pub fn complete(mut self) {
        self.finish();
    }

    fn finish(&mut self) {
        if !self.completed {
            self.completed = true;
            self.inner.complete();
        }
    }
}

impl Drop for ActiveTrace {
    fn drop(&mut self) {
        self.finish();
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct TracingTelemetry;

impl TelemetryLogger for TracingTelemetry {
    fn trace(&self, name: &'static str) -> Box<dyn TelemetryTrace> {
        Box::new(TracingTrace { name })
    }
}

struct TracingTrace {
    name: &'static str,
}

impl TelemetryTrace for TracingTrace {
    fn start(&mut self) {
        info!(trace = self.name, "trace started");
    }

    fn log(&mut self, payload: Value) {
        info!(trace = self.name, %payload, "trace log");
    }

    fn error(&mut self, error: &dyn std::error::Error) {
        warn!(trace = self.name, %error, "trace error");
    }

    fn complete(&mut self) {
        info!(trace = self.name, "trace complete");
    }
}

/// Logger whose traces record nothing
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopTelemetry;

impl TelemetryLogger for NoopTelemetry {
    fn trace(&self, _name: &'static str) -> Box<dyn TelemetryTrace> {
        Box::new(NoopTrace)
    }
}

struct NoopTrace;

impl TelemetryTrace for NoopTrace {
    fn start(&mut self) {}
    fn log(&mut self, _payload: Value) {}
    fn error(&mut self, _error: &dyn std::error::Error) {}
    fn complete(&mut self) {}
}
