//! Tree-sitter based query extraction for TypeScript and JavaScript sources
//!
//! Recognized forms:
//! - `const postQuery = groq\`*[_type == "post"]\``
//! - `const postQuery = defineQuery("*[_type == \"post\"]")` (string or template)
//!
//! Template substitutions are resolved when they name a string constant
//! declared earlier in the same file. Declarations preceded by a
//! `@sanity-typegen-ignore` comment are skipped.

use super::{ExtractedModule, ExtractedQuery, ExtractionError, Location};
use std::collections::HashMap;
use tree_sitter::{Language, Node, Parser};

const IGNORE_COMMENT: &str = "@sanity-typegen-ignore";
const GROQ_TAG: &str = "groq";
const DEFINE_QUERY: &str = "defineQuery";

fn language_for(filename: &str) -> Language {
    let extension = filename.rsplit('.').next().unwrap_or_default();
    match extension {
        "ts" | "mts" | "cts" => tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into(),
        _ => tree_sitter_typescript::LANGUAGE_TSX.into(),
    }
}

/// Extract every query declared in `source`
pub fn find_queries_in_source(source: &str, filename: &str) -> ExtractedModule {
    let mut module = ExtractedModule {
        filename: filename.to_string(),
        ..Default::default()
    };

    let mut parser = Parser::new();
    if let Err(e) = parser.set_language(&language_for(filename)) {
        module.errors.push(error(filename, format!("Failed to load parser: {}", e)));
        return module;
    }

    let Some(tree) = parser.parse(source, None) else {
        module.errors.push(error(filename, "Failed to parse source file".to_string()));
        return module;
    };

    let root = tree.root_node();
    if root.has_error() {
        module
            .errors
            .push(error(filename, "Failed to parse source file: syntax error".to_string()));
        return module;
    }

    let mut walker = QueryWalker {
        source,
        filename,
        constants: HashMap::new(),
        module: &mut module,
    };
    walker.visit(root);
    module
}

fn error(filename: &str, cause: String) -> ExtractionError {
    ExtractionError {
        cause,
        filename: filename.to_string(),
    }
}

struct QueryWalker<'a> {
    source: &'a str,
    filename: &'a str,
    /// String constants seen so far, in document order
    constants: HashMap<String, String>,
    module: &'a mut ExtractedModule,
}

impl<'a> QueryWalker<'a> {
    fn visit(&mut self, node: Node) {
        if node.kind() == "variable_declarator" {
            self.visit_declarator(node);
        }

        let mut cursor = node.walk();
        let children: Vec<Node> = node.named_children(&mut cursor).collect();
        for child in children {
            self.visit(child);
        }
    }

    fn visit_declarator(&mut self, declarator: Node) {
        let (Some(name), Some(value)) = (
            declarator.child_by_field_name("name"),
            declarator.child_by_field_name("value"),
        ) else {
            return;
        };
        if name.kind() != "identifier" {
            return;
        }
        let variable = self.text(name).to_string();
        let value = unwrap_type_assertion(value);

        match value.kind() {
            "string" | "template_string" => {
                if let Ok(literal) = self.resolve_literal(value) {
                    self.constants.insert(variable, literal);
                }
            }
            "call_expression" => self.visit_call(declarator, variable, value),
            _ => {}
        }
    }

    fn visit_call(&mut self, declarator: Node, variable: String, call: Node) {
        let (Some(function), Some(arguments)) = (
            call.child_by_field_name("function"),
            call.child_by_field_name("arguments"),
        ) else {
            return;
        };

        let query_node = match (self.text(function), arguments.kind()) {
            (GROQ_TAG, "template_string") => Some(arguments),
            (DEFINE_QUERY, "arguments") => arguments.named_child(0),
            _ => return,
        };

        if self.has_ignore_comment(declarator) {
            return;
        }

        let Some(query_node) = query_node else {
            self.module.errors.push(error(
                self.filename,
                format!("{}() called without a query for `{}`", DEFINE_QUERY, variable),
            ));
            return;
        };

        match self.resolve_literal(query_node) {
            Ok(query) => {
                let point = call.start_position();
                self.module.queries.push(ExtractedQuery {
                    variable,
                    query,
                    location: Location {
                        line: point.row + 1,
                        column: point.column + 1,
                    },
                });
            }
            Err(cause) => self.module.errors.push(error(
                self.filename,
                format!("Unable to resolve query `{}`: {}", variable, cause),
            )),
        }
    }

    /// Check for the ignore marker on the statement that owns `declarator`
    fn has_ignore_comment(&self, declarator: Node) -> bool {
        let mut statement = match declarator.parent() {
            Some(parent) => parent,
            None => return false,
        };
        if let Some(parent) = statement.parent() {
            if parent.kind() == "export_statement" {
                statement = parent;
            }
        }

        statement
            .prev_named_sibling()
            .filter(|sibling| sibling.kind() == "comment")
            .map(|comment| self.text(comment).contains(IGNORE_COMMENT))
            .unwrap_or(false)
    }

    fn resolve_literal(&self, node: Node) -> Result<String, String> {
        match node.kind() {
            "string" => Ok(self.inner_text(node).to_string()),
            "template_string" => self.resolve_template(node),
            "identifier" => self
                .constants
                .get(self.text(node))
                .cloned()
                .ok_or_else(|| format!("`{}` is not a string constant", self.text(node))),
            "parenthesized_expression" => match node.named_child(0) {
                Some(inner) => self.resolve_literal(inner),
                None => Err("empty expression".to_string()),
            },
            other => Err(format!("unsupported expression `{}` ({})", self.text(node), other)),
        }
    }

    fn resolve_template(&self, node: Node) -> Result<String, String> {
        let start = node.start_byte() + 1;
        let end = node.end_byte().saturating_sub(1).max(start);
        let mut resolved = String::new();
        let mut position = start;

        let mut cursor = node.walk();
        for child in node.named_children(&mut cursor) {
            if child.kind() != "template_substitution" {
                continue;
            }
            resolved.push_str(self.slice(position, child.start_byte()));
            let expression = child
                .named_child(0)
                .ok_or_else(|| "empty template substitution".to_string())?;
            resolved.push_str(&self.resolve_literal(unwrap_type_assertion(expression))?);
            position = child.end_byte();
        }
        resolved.push_str(self.slice(position, end));
        Ok(resolved)
    }

    fn text(&self, node: Node) -> &'a str {
        self.slice(node.start_byte(), node.end_byte())
    }

    /// Text of a quoted literal without its delimiters
    fn inner_text(&self, node: Node) -> &'a str {
        let start = node.start_byte() + 1;
        let end = node.end_byte().saturating_sub(1).max(start);
        self.slice(start, end)
    }

    fn slice(&self, start: usize, end: usize) -> &'a str {
        self.source.get(start..end).unwrap_or_default()
    }
}

/// Look through `x as const` and `x satisfies T`
fn unwrap_type_assertion(node: Node) -> Node {
    match node.kind() {
        "as_expression" | "satisfies_expression" => node.named_child(0).unwrap_or(node),
        _ => node,
    }
}
