//! Schema model read from an extracted `schema.json`
//!
//! The file is a JSON array of named document and type definitions whose
//! bodies are built from a small set of type nodes.

use crate::errors::{Result, TypegenError};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;

pub type Schema = Vec<SchemaType>;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum SchemaType {
    Document {
        name: String,
        attributes: BTreeMap<String, ObjectAttribute>,
    },
    Type {
        name: String,
        value: TypeNode,
    },
}

impl SchemaType {
    pub fn name(&self) -> &str {
        match self {
            SchemaType::Document { name, .. } | SchemaType::Type { name, .. } => name,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ObjectAttribute {
    pub value: TypeNode,
    #[serde(default)]
    pub optional: bool,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum TypeNode {
    String {
        #[serde(default)]
        value: Option<String>,
    },
    Number {
        #[serde(default)]
        value: Option<f64>,
    },
    Boolean {
        #[serde(default)]
        value: Option<bool>,
    },
    Unknown,
    Null,
    Array {
        of: Box<TypeNode>,
    },
    Object {
        #[serde(default)]
        attributes: BTreeMap<String, ObjectAttribute>,
        #[serde(default)]
        rest: Option<Box<TypeNode>>,
        #[serde(default, rename = "dereferencesTo")]
        dereferences_to: Option<String>,
    },
    Union {
        of: Vec<TypeNode>,
    },
    Inline {
        name: String,
    },
}

/// Parse a schema from its JSON text
pub fn parse_schema(path: &Path, content: &str) -> Result<Schema> {
    serde_json::from_str(content).map_err(|source| TypegenError::SchemaParse {
        path: path.to_path_buf(),
        source,
    })
}
