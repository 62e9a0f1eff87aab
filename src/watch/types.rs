//! Type definitions for watch events and session statistics

use crate::errors::Result;
use crate::generator::TypegenStats;
use serde::Serialize;
use std::fmt;
use std::path::PathBuf;

/// Kinds of file system changes that may trigger a generation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    Create,
    Update,
    Delete,
}

impl fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ChangeKind::Create => "create",
            ChangeKind::Update => "update",
            ChangeKind::Delete => "delete",
        };
        f.write_str(name)
    }
}

/// A change to a watched file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchEvent {
    pub path: PathBuf,
    /// Path relative to the working directory, forward slashes
    pub relative: String,
    pub kind: ChangeKind,
}

/// Messages from the file watcher to the scheduler
#[derive(Debug, Clone)]
pub enum WatchMessage {
    Change(WatchEvent),
    /// Watcher-level failure; reported, never fatal
    Error(String),
}

/// Accumulated statistics for a watch session
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WatcherStats {
    pub runs: u64,
    pub successful_runs: u64,
    pub failed_runs: u64,
    #[serde(flatten)]
    pub totals: TypegenStats,
}

impl WatcherStats {
    /// Count one settled run and fold in its stats when it succeeded
    pub fn record(&mut self, outcome: &Result<TypegenStats>) {
        self.runs += 1;
        match outcome {
            Ok(stats) => {
                self.successful_runs += 1;
                self.merge(stats);
            }
            Err(_) => self.failed_runs += 1,
        }
    }

    pub fn merge(&mut self, stats: &TypegenStats) {
        let totals = &mut self.totals;
        totals.schema_types_count += stats.schema_types_count;
        totals.queries_count += stats.queries_count;
        totals.query_files_count += stats.query_files_count;
        totals.files_with_errors += stats.files_with_errors;
        totals.type_nodes_generated += stats.type_nodes_generated;
        totals.unknown_type_nodes_generated += stats.unknown_type_nodes_generated;
        totals.empty_union_type_nodes_generated += stats.empty_union_type_nodes_generated;
        // ratio of the sums, not a sum of ratios
        totals.unknown_type_nodes_ratio = if totals.type_nodes_generated == 0 {
            0.0
        } else {
            totals.unknown_type_nodes_generated as f64 / totals.type_nodes_generated as f64
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::TypegenError;

    fn stats(queries: usize, type_nodes: usize, unknown: usize) -> TypegenStats {
        TypegenStats {
            queries_count: queries,
            type_nodes_generated: type_nodes,
            unknown_type_nodes_generated: unknown,
            ..Default::default()
        }
    }

    #[test]
    fn test_record_counts_runs_and_sums_successes() {
        let mut watcher = WatcherStats::default();
        watcher.record(&Ok(stats(2, 10, 1)));
        watcher.record(&Err(TypegenError::ChannelClosed));
        watcher.record(&Ok(stats(3, 30, 3)));

        assert_eq!(watcher.runs, 3);
        assert_eq!(watcher.successful_runs, 2);
        assert_eq!(watcher.failed_runs, 1);
        assert_eq!(watcher.totals.queries_count, 5);
        assert_eq!(watcher.totals.type_nodes_generated, 40);
        assert!((watcher.totals.unknown_type_nodes_ratio - 0.1).abs() < f64::EPSILON);
    }

    #[test]
    fn test_serializes_flat_camel_case() {
        let mut watcher = WatcherStats::default();
        watcher.record(&Ok(stats(1, 0, 0)));
        let value = serde_json::to_value(&watcher).unwrap();
        assert_eq!(value["successfulRuns"], 1);
        assert_eq!(value["queriesCount"], 1);
    }

    #[test]
    fn test_change_kind_names() {
        assert_eq!(ChangeKind::Create.to_string(), "create");
        assert_eq!(ChangeKind::Update.to_string(), "update");
        assert_eq!(ChangeKind::Delete.to_string(), "delete");
    }
}
