//! Worker host
//!
//! Owns the worker lifecycle for one invocation: spawns a fresh worker,
//! renders its progress events on the status line, writes the generated
//! file and reports telemetry.

pub mod output;
pub mod progress;
pub mod status;

use crate::channel::ProgressEvent;
use crate::config::{ResolvedConfig, resolve_config};
use crate::errors::{Result, TypegenError};
use crate::extractor::discovery::relative_unix_path;
use crate::generator::{GenerateTypesResult, Generator, GeneratorEvent, TypeScriptGenerator, TypegenStats};
use crate::telemetry::{ActiveTrace, GENERATE_TRACE, GenerationTracePayload, TelemetryLogger, TracingTelemetry};
use crate::worker::{WorkerHandle, WorkerPayload, spawn_worker};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};

pub use output::{CommandFormatter, Formatter, FsOutput, OutputTarget, WriteOutcome, write_generated};
pub use progress::GenerationProgress;
pub use status::{StatusBuffer, StatusLine};

/// Runs generations and renders them for a human
#[derive(Clone)]
pub struct WorkerHost {
    generator: Arc<dyn Generator>,
    formatter: Arc<dyn Formatter>,
    output: Arc<dyn OutputTarget>,
    telemetry: Arc<dyn TelemetryLogger>,
    status: StatusLine,
}

impl Default for WorkerHost {
    fn default() -> Self {
        Self::new(Arc::new(TypeScriptGenerator::new()))
    }
}

impl WorkerHost {
    pub fn new(generator: Arc<dyn Generator>) -> Self {
        Self {
            generator,
            formatter: Arc::new(CommandFormatter::prettier()),
            output: Arc::new(FsOutput),
            telemetry: Arc::new(TracingTelemetry),
            status: StatusLine::stderr(),
        }
    }

    pub fn with_formatter(mut self, formatter: Arc<dyn Formatter>) -> Self {
        self.formatter = formatter;
        self
    }

    pub fn with_output(mut self, output: Arc<dyn OutputTarget>) -> Self {
        self.output = output;
        self
    }

    pub fn with_telemetry(mut self, telemetry: Arc<dyn TelemetryLogger>) -> Self {
        self.telemetry = telemetry;
        self
    }

    pub fn with_status(mut self, status: StatusLine) -> Self {
        self.status = status;
        self
    }

    pub fn status(&self) -> &StatusLine {
        &self.status
    }

    pub fn telemetry(&self) -> &Arc<dyn TelemetryLogger> {
        &self.telemetry
    }

    /// Resolve config and run one traced generation
    pub async fn run_single(&self, work_dir: &Path, config_path: Option<&Path>) -> Result<TypegenStats> {
        let mut trace = ActiveTrace::start(self.telemetry.as_ref(), GENERATE_TRACE);

        let outcome = match self.load_config(work_dir, config_path).await {
            Ok(resolved) => self.generate(&resolved, work_dir).await.map(|stats| (resolved, stats)),
            Err(e) => Err(e),
        };

        match &outcome {
            Ok((resolved, stats)) => trace.log(
                GenerationTracePayload {
                    stats: stats.clone(),
                    config_method: resolved.method,
                    overload_client_methods: resolved.config.overload_client_methods,
                }
                .to_value(),
            ),
            Err(e) => trace.error(e),
        }
        trace.complete();

        outcome.map(|(_, stats)| stats)
    }

    /// Resolve configuration, reporting where it came from
    pub async fn load_config(&self, work_dir: &Path, config_path: Option<&Path>) -> Result<ResolvedConfig> {
        self.status.start("Loading config…");
        match resolve_config(work_dir, config_path).await {
            Ok(resolved) => {
                match &resolved.path {
                    Some(path) => self.status.succeed(format!(
                        "Config loaded from `{}`",
                        relative_unix_path(work_dir, path)
                    )),
                    None => self.status.succeed("Using default config"),
                }
                Ok(resolved)
            }
            Err(e) => {
                self.status.fail(e.to_string());
                Err(e)
            }
        }
    }

    /// One untraced generation with an already resolved config
    pub async fn generate(&self, resolved: &ResolvedConfig, work_dir: &Path) -> Result<TypegenStats> {
        match self.generate_and_write(resolved, work_dir).await {
            Ok(stats) => Ok(stats),
            Err(e) => {
                self.status.fail(e.to_string());
                Err(e)
            }
        }
    }

    async fn generate_and_write(&self, resolved: &ResolvedConfig, work_dir: &Path) -> Result<TypegenStats> {
        let config = &resolved.config;
        let payload = WorkerPayload {
            work_dir: work_dir.to_path_buf(),
            schema_path: config.schema.clone(),
            search_path: config.path.patterns(),
            overload_client_methods: config.overload_client_methods,
        };

        self.status.start("Loading schema…");
        let result = self.run_worker(payload).await?;
        let GenerateTypesResult { code, stats } = result;

        let generates = resolve_path(work_dir, &config.generates);
        let outcome = write_generated(
            self.output.as_ref(),
            self.formatter.as_ref(),
            &generates,
            &code,
            config.format_generated_code,
        )
        .await?;

        match &outcome {
            WriteOutcome::FormatFailed(message) => {
                warn!("Formatting {} failed: {}", generates.display(), message);
                self.status.warn(message);
            }
            WriteOutcome::Formatted | WriteOutcome::Unformatted => {
                debug!("Wrote {} ({:?})", generates.display(), outcome);
            }
        }
        info!("Generated types written to {}", generates.display());

        Ok(stats)
    }

    /// Spawn a worker and render its events until it settles
    async fn run_worker(&self, payload: WorkerPayload) -> Result<GenerateTypesResult> {
        let schema_display = payload.schema_path.display().to_string();
        let WorkerHandle { mut events, join } = spawn_worker(payload, self.generator.clone());

        let mut progress = GenerationProgress::default();
        let mut completed = None;

        while let Some(event) = events.recv().await {
            debug!("Worker event: {}", event.name());
            match event {
                ProgressEvent::LoadedSchema => {
                    self.status.succeed(format!("Schema loaded from `{}`", schema_display));
                }
                ProgressEvent::TypegenStarted { expected_file_count } => {
                    progress = GenerationProgress::new(expected_file_count);
                    self.status.start(progress.render());
                }
                ProgressEvent::Generator(GeneratorEvent::GeneratedSchemaTypes { count }) => {
                    debug!("Generator produced {} schema types", count);
                }
                ProgressEvent::Generator(GeneratorEvent::EvaluatedModule {
                    query_count, errors, ..
                }) => {
                    progress.record_module(query_count);
                    for error in &errors {
                        self.status.warn(error.to_string());
                    }
                    self.status.update(progress.render());
                }
                ProgressEvent::Generator(GeneratorEvent::GeneratedQueryTypes { query_map_entries }) => {
                    debug!("Generator built query map with {} entries", query_map_entries);
                }
                ProgressEvent::TypegenComplete(result) => {
                    let stats = &result.stats;
                    self.status
                        .succeed(format!("Generated {} schema types", stats.schema_types_count));
                    self.status.succeed(format!(
                        "Generated {} query types from {} file(s) out of {} scanned files",
                        stats.queries_count, stats.query_files_count, progress.expected_files
                    ));
                    if stats.files_with_errors > 0 {
                        self.status.warn(format!(
                            "Encountered errors in {} file(s) while generating types",
                            stats.files_with_errors
                        ));
                    }
                    completed = Some(result);
                }
            }
        }

        let worker_result = join
            .await
            .map_err(|e| TypegenError::Worker(format!("worker task failed: {}", e)))?;
        worker_result?;

        completed.ok_or_else(|| TypegenError::Worker("worker exited without completing".to_string()))
    }
}

fn resolve_path(work_dir: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        work_dir.join(path)
    }
}
