//! Query file discovery
//!
//! Globs are matched against paths relative to the working directory using
//! forward slashes, so `./src/**/*.{ts,tsx}` behaves the same on every platform.

use crate::errors::{Result, TypegenError};
use globset::{Glob, GlobSet, GlobSetBuilder};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Directory names never searched or watched
pub const IGNORED_DIRECTORIES: &[&str] = &[
    "node_modules",
    ".git",
    "dist",
    "build",
    ".next",
    ".sanity",
    "target",
    "coverage",
];

/// Compiled set of query file globs
#[derive(Debug, Clone)]
pub struct QueryPatterns {
    patterns: Vec<String>,
    set: GlobSet,
}

impl QueryPatterns {
    pub fn new(patterns: &[String]) -> Result<Self> {
        let mut builder = GlobSetBuilder::new();
        let mut normalized = Vec::with_capacity(patterns.len());
        for pattern in patterns {
            let pattern = normalize_pattern(pattern);
            let glob = Glob::new(&pattern).map_err(|e| {
                TypegenError::Extraction(format!("Invalid glob pattern {}: {}", pattern, e))
            })?;
            builder.add(glob);
            normalized.push(pattern);
        }
        let set = builder
            .build()
            .map_err(|e| TypegenError::Extraction(format!("Invalid glob patterns: {}", e)))?;
        Ok(Self {
            patterns: normalized,
            set,
        })
    }

    /// Patterns as matched, without any leading `./`
    pub fn patterns(&self) -> &[String] {
        &self.patterns
    }

    /// Match a path relative to the working directory
    pub fn matches(&self, relative: &str) -> bool {
        self.set.is_match(relative)
    }
}

fn normalize_pattern(pattern: &str) -> String {
    let pattern = pattern.replace('\\', "/");
    pattern.trim_start_matches("./").to_string()
}

/// Relative path from `root` with forward slashes, or the path itself when outside `root`
pub fn relative_unix_path(root: &Path, path: &Path) -> String {
    let relative = path.strip_prefix(root).unwrap_or(path);
    relative.to_string_lossy().replace('\\', "/")
}

/// True when any component of the relative path is an ignored directory
pub fn is_ignored(relative: &str) -> bool {
    relative
        .split('/')
        .any(|component| IGNORED_DIRECTORIES.contains(&component))
}

/// Walk `root` and return every file matching `patterns`, sorted
pub fn discover_files(root: &Path, patterns: &QueryPatterns) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = WalkDir::new(root)
        .follow_links(false)
        .into_iter()
        .filter_entry(|entry| {
            entry.depth() == 0
                || !entry
                    .file_name()
                    .to_str()
                    .map(|name| entry.file_type().is_dir() && IGNORED_DIRECTORIES.contains(&name))
                    .unwrap_or(false)
        })
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.into_path())
        .filter(|path| patterns.matches(&relative_unix_path(root, path)))
        .collect();

    files.sort();
    files
}
