//! TypeScript declaration generator
//!
//! Renders one type alias per schema type, a union of all schema types, a
//! `<Variable>Result` alias per extracted query and, when client method
//! overloading is enabled, a `SanityQueries` interface augmenting
//! `@sanity/client`.
//!
//! Query result types are inferred only for the plain document filter
//! shapes `*[_type == "x"]` and `*[_type == "x"][0]`; anything else is
//! typed as `unknown` and counted as such in the stats.

use super::{
    GenerateTypesOptions, GenerateTypesResult, Generator, GeneratorEvent, GeneratorReporter,
    TypegenStats,
};
use crate::errors::Result;
use crate::extractor::{ExtractedModule, ExtractedQuery};
use crate::schema::{ObjectAttribute, Schema, SchemaType, TypeNode};
use regex::Regex;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt::Write as _;
use std::path::Path;
use std::sync::LazyLock;

const REFERENCE_SYMBOL: &str = "internalGroqTypeReferenceTo";
const ALL_SCHEMA_TYPES: &str = "AllSanitySchemaTypes";

static DOCUMENT_FILTER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"^\*\s*\[\s*_type\s*==\s*["']([^"']+)["']\s*\]\s*(\[\s*0\s*\])?$"#)
        .expect("document filter pattern is valid")
});

static IDENTIFIER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z_$][A-Za-z0-9_$]*$").expect("identifier pattern is valid")
});

#[derive(Debug, Default, Clone, Copy)]
pub struct TypeScriptGenerator;

impl TypeScriptGenerator {
    pub fn new() -> Self {
        Self
    }
}

impl Generator for TypeScriptGenerator {
    fn generate_types(
        &self,
        schema: &Schema,
        queries: &mut dyn Iterator<Item = ExtractedModule>,
        options: &GenerateTypesOptions,
        reporter: &dyn GeneratorReporter,
    ) -> Result<GenerateTypesResult> {
        let mut renderer = TypeRenderer::new(schema);
        let mut stats = TypegenStats {
            schema_types_count: schema.len(),
            ..Default::default()
        };

        let mut code = String::new();
        let _ = writeln!(code, "export declare const {}: unique symbol;\n", REFERENCE_SYMBOL);

        let source_comment = normalize_path(&options.root, &options.schema_path);
        let _ = writeln!(code, "// Source: {}", source_comment);
        for schema_type in schema {
            let name = renderer.name_of(schema_type.name()).to_string();
            let body = match schema_type {
                SchemaType::Document { attributes, .. } => renderer.render_object(attributes, None, 0),
                SchemaType::Type { value, .. } => renderer.render(value, 0),
            };
            let _ = writeln!(code, "export type {} = {};\n", name, body);
        }

        let all_types = if schema.is_empty() {
            "never".to_string()
        } else {
            schema
                .iter()
                .map(|t| renderer.name_of(t.name()).to_string())
                .collect::<Vec<_>>()
                .join(" | ")
        };
        let _ = writeln!(code, "export type {} = {};\n", ALL_SCHEMA_TYPES, all_types);

        reporter.report(GeneratorEvent::GeneratedSchemaTypes { count: schema.len() })?;

        let mut query_map: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for module in queries {
            for query in &module.queries {
                let (id, declaration) = renderer.render_query(&module.filename, query);
                code.push_str(&declaration);
                query_map.entry(query.query.clone()).or_default().push(id);
            }

            stats.queries_count += module.queries.len();
            if !module.queries.is_empty() {
                stats.query_files_count += 1;
            }
            if !module.errors.is_empty() {
                stats.files_with_errors += 1;
            }

            reporter.report(GeneratorEvent::EvaluatedModule {
                filename: module.filename,
                query_count: module.queries.len(),
                errors: module.errors,
            })?;
        }

        let query_map_entries = if options.overload_client_methods { query_map.len() } else { 0 };
        if query_map_entries > 0 {
            code.push_str(&render_query_map(&query_map));
        }
        reporter.report(GeneratorEvent::GeneratedQueryTypes { query_map_entries })?;

        stats.type_nodes_generated = renderer.type_nodes;
        stats.unknown_type_nodes_generated = renderer.unknown_nodes;
        stats.empty_union_type_nodes_generated = renderer.empty_unions;
        stats.unknown_type_nodes_ratio = if renderer.type_nodes == 0 {
            0.0
        } else {
            renderer.unknown_nodes as f64 / renderer.type_nodes as f64
        };

        Ok(GenerateTypesResult { code, stats })
    }
}

fn render_query_map(query_map: &BTreeMap<String, Vec<String>>) -> String {
    let mut out = String::from("// Query TypeMap\nimport \"@sanity/client\";\n");
    out.push_str("declare module \"@sanity/client\" {\n  interface SanityQueries {\n");
    for (query, ids) in query_map {
        let key = serde_json::to_string(query).unwrap_or_else(|_| format!("{:?}", query));
        let _ = writeln!(out, "    {}: {};", key, ids.join(" | "));
    }
    out.push_str("  }\n}\n");
    out
}

fn normalize_path(root: &Path, path: &Path) -> String {
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        root.join(path)
    };
    absolute
        .strip_prefix(root)
        .unwrap_or(&absolute)
        .to_string_lossy()
        .replace('\\', "/")
        .trim_start_matches("./")
        .to_string()
}

/// Emits TypeScript for type nodes, tracking identifiers and node counts
struct TypeRenderer<'s> {
    schema: &'s Schema,
    names: HashMap<String, String>,
    used: HashSet<String>,
    type_nodes: usize,
    unknown_nodes: usize,
    empty_unions: usize,
}

impl<'s> TypeRenderer<'s> {
    fn new(schema: &'s Schema) -> Self {
        let mut renderer = Self {
            schema,
            names: HashMap::new(),
            used: HashSet::from([REFERENCE_SYMBOL.to_string(), ALL_SCHEMA_TYPES.to_string()]),
            type_nodes: 0,
            unknown_nodes: 0,
            empty_unions: 0,
        };
        for schema_type in schema {
            let id = renderer.unique_identifier(&type_name(schema_type.name()));
            renderer.names.insert(schema_type.name().to_string(), id);
        }
        renderer
    }

    fn name_of(&self, schema_name: &str) -> &str {
        self.names.get(schema_name).map(String::as_str).unwrap_or("unknown")
    }

    fn unique_identifier(&mut self, desired: &str) -> String {
        let mut candidate = desired.to_string();
        let mut index = 2;
        while self.used.contains(&candidate) {
            candidate = format!("{}_{}", desired, index);
            index += 1;
        }
        self.used.insert(candidate.clone());
        candidate
    }

    fn unknown(&mut self) -> String {
        self.unknown_nodes += 1;
        "unknown".to_string()
    }

    fn render(&mut self, node: &TypeNode, indent: usize) -> String {
        self.type_nodes += 1;
        match node {
            TypeNode::String { value: Some(v) } => string_literal(v),
            TypeNode::String { value: None } => "string".to_string(),
            TypeNode::Number { value: Some(v) } => number_literal(*v),
            TypeNode::Number { value: None } => "number".to_string(),
            TypeNode::Boolean { value: Some(v) } => v.to_string(),
            TypeNode::Boolean { value: None } => "boolean".to_string(),
            TypeNode::Unknown => self.unknown(),
            TypeNode::Null => "null".to_string(),
            TypeNode::Array { of } => format!("Array<{}>", self.render(of, indent)),
            TypeNode::Object {
                attributes,
                rest,
                dereferences_to,
            } => self.render_object_with_rest(attributes, rest.as_deref(), dereferences_to.as_deref(), indent),
            TypeNode::Union { of } => match of.len() {
                0 => {
                    self.empty_unions += 1;
                    "never".to_string()
                }
                1 => self.render(&of[0], indent),
                _ => of
                    .iter()
                    .map(|member| self.render(member, indent))
                    .collect::<Vec<_>>()
                    .join(" | "),
            },
            TypeNode::Inline { name } => self.render_inline(name),
        }
    }

    fn render_inline(&mut self, name: &str) -> String {
        if self.schema.iter().any(|t| t.name() == name) {
            return self.name_of(name).to_string();
        }
        self.unknown_nodes += 1;
        format!("unknown /* Unable to locate the referenced type \"{}\" in schema */", name)
    }

    fn render_object_with_rest(
        &mut self,
        attributes: &BTreeMap<String, ObjectAttribute>,
        rest: Option<&TypeNode>,
        dereferences_to: Option<&str>,
        indent: usize,
    ) -> String {
        match rest {
            None => self.render_object(attributes, dereferences_to, indent),
            Some(TypeNode::Unknown) => self.unknown(),
            Some(TypeNode::Object {
                attributes: rest_attributes,
                ..
            }) => {
                let mut merged = attributes.clone();
                merged.extend(rest_attributes.iter().map(|(k, v)| (k.clone(), v.clone())));
                self.render_object(&merged, dereferences_to, indent)
            }
            Some(TypeNode::Inline { name }) => {
                let resolved = self.render_inline(name);
                if resolved.starts_with("unknown") {
                    return resolved;
                }
                let object = self.render_object(attributes, dereferences_to, indent);
                format!("{} & {}", object, resolved)
            }
            Some(_) => self.unknown(),
        }
    }

    fn render_object(
        &mut self,
        attributes: &BTreeMap<String, ObjectAttribute>,
        dereferences_to: Option<&str>,
        indent: usize,
    ) -> String {
        if attributes.is_empty() && dereferences_to.is_none() {
            return "{}".to_string();
        }

        let pad = "  ".repeat(indent + 1);
        let mut out = String::from("{\n");
        for (key, attribute) in attributes {
            let value = self.render(&attribute.value, indent + 1);
            let optional = if attribute.optional { "?" } else { "" };
            let _ = writeln!(out, "{}{}{}: {};", pad, property_key(key), optional, value);
        }
        if let Some(target) = dereferences_to {
            let _ = writeln!(out, "{}[{}]?: {};", pad, REFERENCE_SYMBOL, string_literal(target));
        }
        out.push_str(&"  ".repeat(indent));
        out.push('}');
        out
    }

    /// Returns the result identifier and its declaration
    fn render_query(&mut self, filename: &str, query: &ExtractedQuery) -> (String, String) {
        let id = self.unique_identifier(&format!("{}Result", type_name(&query.variable)));
        let tstype = self.infer_query_type(&query.query);
        let trimmed: String = query.query.replace(['\r', '\n'], "").trim().to_string();
        let declaration = format!(
            "// Source: {}\n// Variable: {}\n// Query: {}\nexport type {} = {};\n\n",
            filename, query.variable, trimmed, id, tstype
        );
        (id, declaration)
    }

    fn infer_query_type(&mut self, query: &str) -> String {
        let filter = DOCUMENT_FILTER.captures(query.trim()).and_then(|captures| {
            let document = captures.get(1)?.as_str();
            self.names
                .get(document)
                .map(|id| (id.clone(), captures.get(2).is_some()))
        });

        self.type_nodes += 1;
        match filter {
            Some((id, true)) => {
                self.type_nodes += 2;
                format!("{} | null", id)
            }
            Some((id, false)) => {
                self.type_nodes += 1;
                format!("Array<{}>", id)
            }
            None => self.unknown(),
        }
    }
}

fn type_name(name: &str) -> String {
    let sanitized = sanitize_identifier(name);
    let mut chars = sanitized.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => "Unnamed".to_string(),
    }
}

/// Drop characters that are invalid in identifiers, camel-casing across them
fn sanitize_identifier(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut upper_next = false;
    for (i, c) in input.chars().enumerate() {
        if c.is_ascii_alphanumeric() || c == '_' || c == '$' {
            if i == 0 && c.is_ascii_digit() {
                out.push('_');
            } else if upper_next {
                out.extend(c.to_uppercase());
            } else {
                out.push(c);
            }
            upper_next = false;
        } else {
            upper_next = !out.is_empty();
        }
    }
    out
}

fn property_key(key: &str) -> String {
    if IDENTIFIER.is_match(key) {
        key.to_string()
    } else {
        string_literal(key)
    }
}

fn string_literal(value: &str) -> String {
    serde_json::to_string(value).unwrap_or_else(|_| format!("{:?}", value))
}

fn number_literal(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        value.to_string()
    }
}
