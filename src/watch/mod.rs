//! Watch mode
//!
//! Keeps the generated types current while the project changes.
//!
//! # Architecture
//!
//! 1. **File system events**: notify delivers raw events on its own thread;
//!    they are filtered against the watched patterns and queued as
//!    [`WatchMessage`]s.
//! 2. **Scheduling**: a single task debounces the changes and feeds the
//!    single-flight gate, which starts at most one generation at a time.
//!
//! Shutdown is driven by a [`ShutdownGuard`], fired by SIGINT/SIGTERM or by
//! the caller.

pub mod debounce;
pub mod events;
pub mod filtering;
pub mod scheduler;
pub mod shutdown;
pub mod state;
pub mod types;

use crate::config::ResolvedConfig;
use crate::errors::Result;
use crate::host::WorkerHost;
use crate::telemetry::{ActiveTrace, WATCH_TRACE, WatchTracePayload};
use futures::FutureExt;
use notify::{RecommendedWatcher, RecursiveMode, Watcher};
use serde_json::json;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

pub use debounce::{DEFAULT_DEBOUNCE, Debounce};
pub use filtering::WatchFilter;
pub use scheduler::{GenerateFn, WatchScheduler};
pub use shutdown::{ShutdownGuard, ShutdownSignal, SignalHandlers};
pub use state::{Settled, Trigger, WatchState};
pub use types::{ChangeKind, WatchEvent, WatchMessage, WatcherStats};

#[derive(Debug, Clone)]
pub struct WatchOptions {
    pub debounce: Duration,
    /// Route SIGINT/SIGTERM into the shutdown guard
    pub handle_signals: bool,
}

impl Default for WatchOptions {
    fn default() -> Self {
        Self {
            debounce: DEFAULT_DEBOUNCE,
            handle_signals: true,
        }
    }
}

/// Run a watch session until `guard` fires
///
/// The session is traced once: `{step: "started"}` when it begins and the
/// accumulated [`WatcherStats`] when it ends, both tagged with the config
/// method and `overloadClientMethods`. Individual runs are untraced.
pub async fn run_watch(
    host: WorkerHost,
    work_dir: &Path,
    resolved: ResolvedConfig,
    options: WatchOptions,
    guard: Arc<ShutdownGuard>,
) -> Result<WatcherStats> {
    let mut trace = ActiveTrace::start(host.telemetry().as_ref(), WATCH_TRACE);
    trace.log(json!({
        "step": "started",
        "configMethod": resolved.method,
        "overloadClientMethods": resolved.config.overload_client_methods,
    }));

    let outcome = watch_session(&host, work_dir, resolved, &options, guard, &mut trace).await;
    if let Err(e) = &outcome {
        trace.error(e);
    }
    trace.complete();
    outcome
}

async fn watch_session(
    host: &WorkerHost,
    work_dir: &Path,
    resolved: ResolvedConfig,
    options: &WatchOptions,
    guard: Arc<ShutdownGuard>,
    trace: &mut ActiveTrace,
) -> Result<WatcherStats> {
    let root = tokio::fs::canonicalize(work_dir)
        .await
        .unwrap_or_else(|_| work_dir.to_path_buf());
    let filter = WatchFilter::new(&root, &resolved.config.path.patterns(), &resolved.config.schema)?;

    let (tx, rx) = mpsc::unbounded_channel();
    let watcher = start_watcher(filter.clone(), tx)?;

    let signals = if options.handle_signals {
        let handlers = SignalHandlers::install(guard.clone())?;
        let abort = handlers.abort_handle();
        guard.on_shutdown(move || abort.abort());
        Some(handlers)
    } else {
        None
    };

    let status = host.status().clone();
    status.info("Typegen enabled. Watching:");
    for pattern in filter.watched_patterns() {
        status.info(format!("  {}", pattern));
    }
    guard.on_shutdown({
        let status = status.clone();
        move || status.info("Stopping typegen watcher…")
    });

    let config_method = resolved.method;
    let overload_client_methods = resolved.config.overload_client_methods;
    let run_host = host.clone();
    let resolved = Arc::new(resolved);
    let run_dir = root.clone();
    let on_generate: GenerateFn = Box::new(move || {
        let host = run_host.clone();
        let resolved = resolved.clone();
        let work_dir = run_dir.clone();
        async move { host.generate(&resolved, &work_dir).await }.boxed()
    });

    let scheduler = WatchScheduler::new(options.debounce, status, on_generate);
    let stats = scheduler.run(rx, guard.subscribe(), true).await;

    drop(signals);
    info!(
        "Watch session finished: {} runs ({} failed)",
        stats.runs, stats.failed_runs
    );
    trace.log(
        WatchTracePayload {
            stats: stats.clone(),
            config_method,
            overload_client_methods,
        }
        .to_value(),
    );
    drop(watcher);

    Ok(stats)
}

fn start_watcher(filter: WatchFilter, tx: mpsc::UnboundedSender<WatchMessage>) -> Result<RecommendedWatcher> {
    let root = filter.root().to_path_buf();
    let schema_dir = filter.external_schema_dir().map(Path::to_path_buf);
    info!("Starting file watcher for {}", root.display());

    let mut watcher = notify::recommended_watcher(move |res: notify::Result<notify::Event>| match res {
        Ok(event) => {
            for change in events::process_file_system_event(&filter, event) {
                debug!("Watched file changed: {:?}", change);
                if tx.send(WatchMessage::Change(change)).is_err() {
                    return;
                }
            }
        }
        Err(e) => {
            let _ = tx.send(WatchMessage::Error(e.to_string()));
        }
    })?;

    watcher.watch(&root, RecursiveMode::Recursive)?;
    if let Some(dir) = schema_dir {
        if dir.is_dir() {
            info!("Watching schema directory {}", dir.display());
            watcher.watch(&dir, RecursiveMode::NonRecursive)?;
        } else {
            warn!("Schema directory {} does not exist; schema changes are not watched", dir.display());
        }
    }
    Ok(watcher)
}
