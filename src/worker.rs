//! Generation worker
//!
//! Runs one full generation pass on a blocking thread and narrates it over
//! the progress channel:
//!
//! 1. stat the schema file
//! 2. read and parse it → `loadedSchema`
//! 3. resolve the query files → `typegenStarted`
//! 4. run the generator, relaying its reporter events
//! 5. → `typegenComplete`
//!
//! The worker owns everything it touches; only the payload goes in and only
//! events come out.

use crate::channel::{ProgressEvent, ProgressReceiver, ProgressSender, progress_channel};
use crate::config::DEFAULT_SCHEMA_PATH;
use crate::errors::{Result, SCHEMA_NOT_FOUND_HINT, TypegenError};
use crate::extractor::find_queries_in_path;
use crate::generator::{GenerateTypesOptions, Generator};
use crate::schema::parse_schema;
use serde::{Deserialize, Serialize};
use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, info};

/// Everything a worker needs to run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkerPayload {
    pub work_dir: PathBuf,
    pub schema_path: PathBuf,
    pub search_path: Vec<String>,
    pub overload_client_methods: bool,
}

/// Handle to a running worker
pub struct WorkerHandle {
    pub events: ProgressReceiver,
    pub join: JoinHandle<Result<()>>,
}

/// Start a fresh worker on the blocking pool
pub fn spawn_worker(payload: WorkerPayload, generator: Arc<dyn Generator>) -> WorkerHandle {
    let (sender, events) = progress_channel();
    let join = tokio::task::spawn_blocking(move || run_generation(payload, generator.as_ref(), &sender));
    WorkerHandle { events, join }
}

/// Execute one generation pass, sending progress on `sender`
pub fn run_generation(
    payload: WorkerPayload,
    generator: &dyn Generator,
    sender: &ProgressSender,
) -> Result<()> {
    let schema_path = resolve(&payload.work_dir, &payload.schema_path);

    if let Err(source) = std::fs::metadata(&schema_path) {
        return Err(if source.kind() == ErrorKind::NotFound {
            let hint = is_default_schema_path(&payload.schema_path).then_some(SCHEMA_NOT_FOUND_HINT);
            TypegenError::SchemaNotFound {
                path: payload.schema_path.clone(),
                hint,
                source,
            }
        } else {
            TypegenError::SchemaAccess {
                path: payload.schema_path.clone(),
                source,
            }
        });
    }

    let content = std::fs::read_to_string(&schema_path).map_err(|source| TypegenError::SchemaAccess {
        path: payload.schema_path.clone(),
        source,
    })?;
    let schema = parse_schema(&payload.schema_path, &content)?;
    debug!("Loaded schema with {} types", schema.len());
    sender.send(ProgressEvent::LoadedSchema)?;

    let mut queries = find_queries_in_path(&payload.work_dir, &payload.search_path)?;
    let expected_file_count = queries.file_count();
    sender.send(ProgressEvent::TypegenStarted { expected_file_count })?;

    let options = GenerateTypesOptions {
        root: payload.work_dir.clone(),
        schema_path: payload.schema_path.clone(),
        overload_client_methods: payload.overload_client_methods,
    };
    let result = generator.generate_types(&schema, &mut queries, &options, sender)?;

    info!(
        "Generated {} schema types and {} query types",
        result.stats.schema_types_count, result.stats.queries_count
    );
    sender.send(ProgressEvent::TypegenComplete(result))?;
    Ok(())
}

fn resolve(work_dir: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        work_dir.join(path)
    }
}

fn is_default_schema_path(path: &Path) -> bool {
    let significant = |p: &Path| {
        p.components()
            .filter(|c| !matches!(c, Component::CurDir))
            .map(|c| c.as_os_str().to_os_string())
            .collect::<Vec<_>>()
    };
    significant(path) == significant(Path::new(DEFAULT_SCHEMA_PATH))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_schema_path_detection() {
        assert!(is_default_schema_path(Path::new("./schema.json")));
        assert!(is_default_schema_path(Path::new("schema.json")));
        assert!(!is_default_schema_path(Path::new("./studio/schema.json")));
    }
}
