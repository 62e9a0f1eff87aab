//! Which paths the watch session reacts to
//!
//! A path is watched when it matches one of the query globs or is the schema
//! file, and no component of it is an ignored directory.

use crate::errors::Result;
use crate::extractor::QueryPatterns;
use crate::extractor::discovery::is_ignored;
use std::path::{Component, Path, PathBuf};

#[derive(Debug, Clone)]
pub struct WatchFilter {
    root: PathBuf,
    queries: QueryPatterns,
    /// Absolute, lexically normalized schema path
    schema: PathBuf,
    /// The schema as shown to the user
    schema_display: String,
}

impl WatchFilter {
    pub fn new(root: &Path, query_patterns: &[String], schema_path: &Path) -> Result<Self> {
        let root = normalize(root);
        let schema = if schema_path.is_absolute() {
            normalize(schema_path)
        } else {
            normalize(&root.join(schema_path))
        };
        let schema_display = match schema.strip_prefix(&root) {
            Ok(relative) => relative.to_string_lossy().replace('\\', "/"),
            Err(_) => schema_path
                .to_string_lossy()
                .replace('\\', "/")
                .trim_start_matches("./")
                .to_string(),
        };
        Ok(Self {
            queries: QueryPatterns::new(query_patterns)?,
            root,
            schema,
            schema_display,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory to watch separately when the schema lies outside the root
    pub fn external_schema_dir(&self) -> Option<&Path> {
        if self.schema.starts_with(&self.root) {
            None
        } else {
            self.schema.parent()
        }
    }

    /// Every watched pattern, query globs first
    pub fn watched_patterns(&self) -> Vec<String> {
        let mut patterns = self.queries.patterns().to_vec();
        patterns.push(self.schema_display.clone());
        patterns
    }

    /// The display path of `path` when it is watched
    pub fn matches(&self, path: &Path) -> Option<String> {
        if normalize(path) == self.schema {
            return Some(self.schema_display.clone());
        }
        let relative = path.strip_prefix(&self.root).ok()?.to_string_lossy().replace('\\', "/");
        if relative.is_empty() || is_ignored(&relative) {
            return None;
        }
        self.queries.matches(&relative).then_some(relative)
    }
}

/// Resolve `.` and `..` without touching the file system
fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if matches!(out.components().next_back(), Some(Component::Normal(_))) {
                    out.pop();
                } else if !out.has_root() {
                    out.push("..");
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}
