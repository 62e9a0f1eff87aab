//! Type generation contract
//!
//! A [`Generator`] consumes the schema and the lazy module sequence and
//! narrates its progress through a [`GeneratorReporter`]. The events it may
//! report form the [`GeneratorEvent`] catalog, which the progress channel
//! carries alongside the orchestrator's own events.

pub mod typescript;

use crate::errors::Result;
use crate::extractor::{ExtractedModule, ExtractionError};
use crate::schema::Schema;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub use typescript::TypeScriptGenerator;

/// Progress events defined by the generator's reporter contract
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "camelCase")]
pub enum GeneratorEvent {
    /// Schema type declarations are ready
    #[serde(rename_all = "camelCase")]
    GeneratedSchemaTypes { count: usize },

    /// One extracted module has been evaluated
    #[serde(rename_all = "camelCase")]
    EvaluatedModule {
        filename: String,
        query_count: usize,
        errors: Vec<ExtractionError>,
    },

    /// The client query map is built; zero entries when it was not rendered
    #[serde(rename_all = "camelCase")]
    GeneratedQueryTypes { query_map_entries: usize },
}

impl GeneratorEvent {
    pub fn name(&self) -> &'static str {
        match self {
            GeneratorEvent::GeneratedSchemaTypes { .. } => "generatedSchemaTypes",
            GeneratorEvent::EvaluatedModule { .. } => "evaluatedModule",
            GeneratorEvent::GeneratedQueryTypes { .. } => "generatedQueryTypes",
        }
    }
}

/// Sink for generator progress; a failed report aborts generation
pub trait GeneratorReporter {
    fn report(&self, event: GeneratorEvent) -> Result<()>;
}

/// Reporter that drops every event
pub struct SilentReporter;

impl GeneratorReporter for SilentReporter {
    fn report(&self, _event: GeneratorEvent) -> Result<()> {
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct GenerateTypesOptions {
    pub root: PathBuf,
    pub schema_path: PathBuf,
    pub overload_client_methods: bool,
}

/// Counters describing one generation run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypegenStats {
    pub schema_types_count: usize,
    pub queries_count: usize,
    pub query_files_count: usize,
    pub files_with_errors: usize,
    pub type_nodes_generated: usize,
    pub unknown_type_nodes_generated: usize,
    pub unknown_type_nodes_ratio: f64,
    pub empty_union_type_nodes_generated: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerateTypesResult {
    pub code: String,
    #[serde(flatten)]
    pub stats: TypegenStats,
}

pub trait Generator: Send + Sync {
    /// Generate declarations, consuming `queries` once and in order
    fn generate_types(
        &self,
        schema: &Schema,
        queries: &mut dyn Iterator<Item = ExtractedModule>,
        options: &GenerateTypesOptions,
        reporter: &dyn GeneratorReporter,
    ) -> Result<GenerateTypesResult>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_result_serializes_flat_camel_case() {
        let result = GenerateTypesResult {
            code: "export {}".to_string(),
            stats: TypegenStats {
                schema_types_count: 2,
                files_with_errors: 1,
                ..Default::default()
            },
        };
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["code"], "export {}");
        assert_eq!(json["schemaTypesCount"], 2);
        assert_eq!(json["filesWithErrors"], 1);
        assert!(json.get("stats").is_none());
    }

    #[test]
    fn test_event_wire_shape() {
        let event = GeneratorEvent::EvaluatedModule {
            filename: "a.ts".to_string(),
            query_count: 1,
            errors: vec![],
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], event.name());
        assert_eq!(json["payload"]["queryCount"], 1);
    }
}
