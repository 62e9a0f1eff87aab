//! Shutdown coordination for a watch session
//!
//! [`ShutdownGuard`] is single-assignment: the first `trigger` runs the
//! registered teardown hooks and wakes every [`ShutdownSignal`]; later calls
//! do nothing. [`SignalHandlers`] forwards SIGINT/SIGTERM into a guard and is
//! deregistered when dropped.

use crate::errors::{Result, TypegenError};
use std::sync::{Arc, Mutex};
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::watch;
use tokio::task::{AbortHandle, JoinHandle};
use tracing::{debug, info};

type Hook = Box<dyn FnOnce() + Send>;

pub struct ShutdownGuard {
    fired: AtomicBool,
    hooks: Mutex<Vec<Hook>>,
    tx: watch::Sender<bool>,
}

impl ShutdownGuard {
    pub fn new() -> Arc<Self> {
        let (tx, _rx) = watch::channel(false);
        Arc::new(Self {
            fired: AtomicBool::new(false),
            hooks: Mutex::new(Vec::new()),
            tx,
        })
    }

    /// Register a teardown step; steps run in registration order
    pub fn on_shutdown(&self, hook: impl FnOnce() + Send + 'static) {
        let mut hooks = self.hooks.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        hooks.push(Box::new(hook));
    }

    /// Request shutdown. Returns `true` only for the call that ran teardown.
    pub fn trigger(&self, reason: &str) -> bool {
        if self.fired.swap(true, Ordering::SeqCst) {
            debug!("Shutdown already in progress, ignoring {}", reason);
            return false;
        }
        info!("Shutting down watch session ({})", reason);

        let hooks = {
            let mut hooks = self.hooks.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
            std::mem::take(&mut *hooks)
        };
        for hook in hooks {
            hook();
        }
        self.tx.send_replace(true);
        true
    }

    pub fn is_triggered(&self) -> bool {
        self.fired.load(Ordering::SeqCst)
    }

    pub fn subscribe(&self) -> ShutdownSignal {
        ShutdownSignal {
            rx: self.tx.subscribe(),
        }
    }
}

/// Resolves once its guard has been triggered
#[derive(Debug, Clone)]
pub struct ShutdownSignal {
    rx: watch::Receiver<bool>,
}

impl ShutdownSignal {
    pub async fn wait(&mut self) {
        if self.rx.wait_for(|fired| *fired).await.is_err() {
            // guard dropped without firing: nothing can trigger us anymore
            std::future::pending::<()>().await;
        }
    }
}

/// OS termination signals routed into a [`ShutdownGuard`]
pub struct SignalHandlers {
    task: JoinHandle<()>,
}

impl SignalHandlers {
    pub fn install(guard: Arc<ShutdownGuard>) -> Result<Self> {
        let mut signals = TerminationSignals::new()?;
        let task = tokio::spawn(async move {
            loop {
                let name = signals.recv().await;
                guard.trigger(name);
            }
        });
        Ok(Self { task })
    }

    pub fn abort_handle(&self) -> AbortHandle {
        self.task.abort_handle()
    }

    pub fn deregister(&self) {
        self.task.abort();
    }
}

impl Drop for SignalHandlers {
    fn drop(&mut self) {
        self.deregister();
    }
}

#[cfg(unix)]
struct TerminationSignals {
    interrupt: tokio::signal::unix::Signal,
    terminate: tokio::signal::unix::Signal,
}

#[cfg(unix)]
impl TerminationSignals {
    fn new() -> Result<Self> {
        use tokio::signal::unix::{SignalKind, signal};
        Ok(Self {
            interrupt: signal(SignalKind::interrupt()).map_err(TypegenError::Signal)?,
            terminate: signal(SignalKind::terminate()).map_err(TypegenError::Signal)?,
        })
    }

    async fn recv(&mut self) -> &'static str {
        tokio::select! {
            _ = self.interrupt.recv() => "SIGINT",
            _ = self.terminate.recv() => "SIGTERM",
        }
    }
}

#[cfg(not(unix))]
struct TerminationSignals;

#[cfg(not(unix))]
impl TerminationSignals {
    fn new() -> Result<Self> {
        Ok(Self)
    }

    async fn recv(&mut self) -> &'static str {
        if tokio::signal::ctrl_c().await.is_err() {
            std::future::pending::<()>().await;
        }
        "SIGINT"
    }
}
