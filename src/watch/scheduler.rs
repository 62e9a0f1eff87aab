//! Watch scheduler loop
//!
//! One task owns the debounce and the single-flight state and multiplexes
//! four sources with `tokio::select!`: shutdown, watcher messages, the
//! debounce deadline, and completion of the in-flight run. Every state
//! transition happens between await points, so there is no locking.

use crate::errors::{Result, TypegenError};
use crate::generator::TypegenStats;
use crate::host::StatusLine;
use crate::watch::debounce::Debounce;
use crate::watch::shutdown::ShutdownSignal;
use crate::watch::state::{Settled, Trigger, WatchState};
use crate::watch::types::{WatchMessage, WatcherStats};
use futures::future::BoxFuture;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::{Instant, sleep_until};
use tracing::{debug, info, warn};

/// Starts one generation; called again for every run
pub type GenerateFn = Box<dyn FnMut() -> BoxFuture<'static, Result<TypegenStats>> + Send>;

type Completion = mpsc::UnboundedSender<Result<TypegenStats>>;

pub struct WatchScheduler {
    state: WatchState,
    debounce: Debounce,
    on_generate: GenerateFn,
    stats: WatcherStats,
    status: StatusLine,
}

impl WatchScheduler {
    pub fn new(delay: Duration, status: StatusLine, on_generate: GenerateFn) -> Self {
        Self {
            state: WatchState::new(),
            debounce: Debounce::new(delay),
            on_generate,
            stats: WatcherStats::default(),
            status,
        }
    }

    /// Drive the session until `shutdown` resolves
    ///
    /// With `initial_run` a generation starts before the first event. On
    /// shutdown a run already in flight is awaited; a queued one is dropped.
    pub async fn run(
        mut self,
        mut messages: mpsc::UnboundedReceiver<WatchMessage>,
        mut shutdown: ShutdownSignal,
        initial_run: bool,
    ) -> WatcherStats {
        let (done_tx, mut done_rx) = mpsc::unbounded_channel();

        if initial_run {
            self.trigger(&done_tx);
        }

        loop {
            let deadline = self.debounce.deadline();
            tokio::select! {
                biased;

                _ = shutdown.wait() => break,

                Some(outcome) = done_rx.recv() => self.settle(outcome, &done_tx),

                _ = wait_until(deadline) => {
                    if self.debounce.fire_if_due(Instant::now()) {
                        self.trigger(&done_tx);
                    }
                }

                Some(message) = messages.recv() => self.handle_message(message),
            }
        }

        if self.state.is_generating() {
            info!("Waiting for the running generation to finish");
            if let Some(outcome) = done_rx.recv().await {
                self.stats.record(&outcome);
            }
        }
        if self.state.has_pending() {
            debug!("Dropping queued generation at shutdown");
        }

        self.stats
    }

    fn handle_message(&mut self, message: WatchMessage) {
        match message {
            WatchMessage::Change(event) => {
                let timestamp = chrono::Local::now().format("%H:%M:%S");
                self.status
                    .info(format!("[{}] {}: {}", timestamp, event.kind, event.relative));
                self.debounce.event(Instant::now());
            }
            WatchMessage::Error(message) => {
                warn!("File watcher error: {}", message);
                self.status.warn(format!("File watcher error: {}", message));
            }
        }
    }

    fn trigger(&mut self, done: &Completion) {
        match self.state.request() {
            Trigger::Start => self.spawn_run(done),
            Trigger::Queued => debug!("Generation in progress, queued a follow-up run"),
        }
    }

    fn settle(&mut self, outcome: Result<TypegenStats>, done: &Completion) {
        if let Err(e) = &outcome {
            warn!("Generation failed: {}", e);
        }
        self.stats.record(&outcome);

        match self.state.finish() {
            Settled::RunAgain => {
                debug!("Running queued generation");
                self.spawn_run(done);
            }
            Settled::Idle => debug!("Watch scheduler idle"),
        }
    }

    fn spawn_run(&mut self, done: &Completion) {
        let run = (self.on_generate)();
        let done = done.clone();
        tokio::spawn(async move {
            let outcome = match tokio::spawn(run).await {
                Ok(outcome) => outcome,
                Err(e) => Err(TypegenError::Worker(format!("generation task failed: {}", e))),
            };
            let _ = done.send(outcome);
        });
    }
}

async fn wait_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::watch::shutdown::ShutdownGuard;
    use crate::watch::types::{ChangeKind, WatchEvent};
    use futures::FutureExt;
    use std::path::PathBuf;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct RunCounter {
        started: AtomicUsize,
        active: AtomicUsize,
        max_active: AtomicUsize,
    }

    fn counting_generate(counter: Arc<RunCounter>, run_time: Duration) -> GenerateFn {
        Box::new(move || {
            let counter = counter.clone();
            async move {
                counter.started.fetch_add(1, Ordering::SeqCst);
                let active = counter.active.fetch_add(1, Ordering::SeqCst) + 1;
                counter.max_active.fetch_max(active, Ordering::SeqCst);
                tokio::time::sleep(run_time).await;
                counter.active.fetch_sub(1, Ordering::SeqCst);
                Ok::<_, TypegenError>(TypegenStats {
                    queries_count: 1,
                    ..Default::default()
                })
            }
            .boxed()
        })
    }

    fn change(relative: &str) -> WatchMessage {
        WatchMessage::Change(WatchEvent {
            path: PathBuf::from(relative),
            relative: relative.to_string(),
            kind: ChangeKind::Update,
        })
    }

    #[tokio::test(start_paused = true)]
    async fn test_burst_of_changes_triggers_one_run() {
        let counter = Arc::new(RunCounter::default());
        let (status, buffer) = StatusLine::buffered();
        let scheduler = WatchScheduler::new(
            Duration::from_millis(1000),
            status,
            counting_generate(counter.clone(), Duration::from_millis(10)),
        );
        let (tx, rx) = mpsc::unbounded_channel();
        let guard = ShutdownGuard::new();
        let session = tokio::spawn(scheduler.run(rx, guard.subscribe(), false));

        for i in 0..10 {
            tx.send(change(&format!("src/file{}.ts", i))).unwrap();
            tokio::time::sleep(Duration::from_millis(100)).await;
        }
        tokio::time::sleep(Duration::from_secs(5)).await;
        guard.trigger("stop");
        let stats = session.await.unwrap();

        assert_eq!(counter.started.load(Ordering::SeqCst), 1);
        assert_eq!(stats.runs, 1);
        assert_eq!(stats.successful_runs, 1);

        let printed = buffer.lines();
        assert_eq!(printed.len(), 10);
        assert!(printed[0].ends_with("] update: src/file0.ts"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_triggers_during_run_coalesce_into_one_follow_up() {
        for triggers in [0usize, 1, 5] {
            let counter = Arc::new(RunCounter::default());
            let scheduler = WatchScheduler::new(
                Duration::from_millis(100),
                StatusLine::buffered().0,
                counting_generate(counter.clone(), Duration::from_secs(60)),
            );
            let (tx, rx) = mpsc::unbounded_channel();
            let guard = ShutdownGuard::new();
            let session = tokio::spawn(scheduler.run(rx, guard.subscribe(), true));

            // each change settles its debounce while the initial run is still busy
            for i in 0..triggers {
                tx.send(change(&format!("src/q{}.ts", i))).unwrap();
                tokio::time::sleep(Duration::from_millis(500)).await;
            }
            tokio::time::sleep(Duration::from_secs(600)).await;
            guard.trigger("stop");
            let stats = session.await.unwrap();

            let expected = 1 + triggers.min(1);
            assert_eq!(counter.started.load(Ordering::SeqCst), expected, "triggers = {}", triggers);
            assert_eq!(stats.runs as usize, expected);
            assert_eq!(counter.max_active.load(Ordering::SeqCst), 1);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_run_does_not_stop_scheduler() {
        let attempts = Arc::new(AtomicUsize::new(0));
        let seen = attempts.clone();
        let on_generate: GenerateFn = Box::new(move || {
            let attempt = seen.fetch_add(1, Ordering::SeqCst);
            async move {
                if attempt == 0 {
                    Err(TypegenError::Generation("boom".to_string()))
                } else {
                    Ok(TypegenStats::default())
                }
            }
            .boxed()
        });
        let scheduler = WatchScheduler::new(Duration::from_millis(100), StatusLine::buffered().0, on_generate);
        let (tx, rx) = mpsc::unbounded_channel();
        let guard = ShutdownGuard::new();
        let session = tokio::spawn(scheduler.run(rx, guard.subscribe(), true));

        tokio::time::sleep(Duration::from_millis(50)).await;
        tx.send(change("schema.json")).unwrap();
        tokio::time::sleep(Duration::from_secs(1)).await;
        guard.trigger("stop");
        let stats = session.await.unwrap();

        assert_eq!(stats.runs, 2);
        assert_eq!(stats.failed_runs, 1);
        assert_eq!(stats.successful_runs, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_waits_for_in_flight_run_but_not_pending() {
        let counter = Arc::new(RunCounter::default());
        let scheduler = WatchScheduler::new(
            Duration::from_millis(10),
            StatusLine::buffered().0,
            counting_generate(counter.clone(), Duration::from_secs(30)),
        );
        let (tx, rx) = mpsc::unbounded_channel();
        let guard = ShutdownGuard::new();
        let session = tokio::spawn(scheduler.run(rx, guard.subscribe(), true));

        tokio::time::sleep(Duration::from_millis(5)).await;
        tx.send(change("src/a.ts")).unwrap();
        tokio::time::sleep(Duration::from_secs(1)).await;
        guard.trigger("SIGINT");
        let stats = session.await.unwrap();

        assert_eq!(counter.started.load(Ordering::SeqCst), 1);
        assert_eq!(counter.active.load(Ordering::SeqCst), 0);
        assert_eq!(stats.runs, 1);
    }

    #[tokio::test]
    async fn test_watcher_errors_are_warnings() {
        let (status, buffer) = StatusLine::buffered();
        let scheduler = WatchScheduler::new(
            Duration::from_millis(10),
            status,
            Box::new(|| async { Ok::<_, TypegenError>(TypegenStats::default()) }.boxed()),
        );
        let (tx, rx) = mpsc::unbounded_channel();
        let guard = ShutdownGuard::new();
        let session = tokio::spawn(scheduler.run(rx, guard.subscribe(), false));

        tx.send(WatchMessage::Error("inotify watch limit reached".to_string())).unwrap();
        tokio::time::sleep(Duration::from_millis(20)).await;
        guard.trigger("stop");
        let stats = session.await.unwrap();

        assert_eq!(stats.runs, 0);
        assert_eq!(buffer.lines(), vec!["⚠ File watcher error: inotify watch limit reached"]);
    }
}
