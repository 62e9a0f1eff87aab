//! Query extraction
//!
//! Resolves the query source files for a set of globs and yields one
//! [`ExtractedModule`] per file. Files are only read and parsed when the
//! sequence is advanced, so the total file count is known before any
//! parsing happens.

pub mod discovery;
pub mod source;

use crate::errors::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

pub use discovery::{IGNORED_DIRECTORIES, QueryPatterns};
pub use source::find_queries_in_source;

/// Position of a query in its source file (1-based line and column)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    pub line: usize,
    pub column: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedQuery {
    /// Name of the variable the query is assigned to
    pub variable: String,
    pub query: String,
    pub location: Location,
}

/// A non-fatal problem found while extracting queries from one file
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("Error while extracting query in {filename}: {cause}")]
pub struct ExtractionError {
    pub cause: String,
    pub filename: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ExtractedModule {
    pub filename: String,
    pub queries: Vec<ExtractedQuery>,
    pub errors: Vec<ExtractionError>,
}

/// Lazy, ordered sequence of extracted modules for a resolved file set
#[derive(Debug)]
pub struct QueryFiles {
    root: PathBuf,
    files: std::vec::IntoIter<PathBuf>,
    total: usize,
}

impl QueryFiles {
    pub fn new(root: PathBuf, files: Vec<PathBuf>) -> Self {
        let total = files.len();
        Self {
            root,
            files: files.into_iter(),
            total,
        }
    }

    /// Number of files in the set, available before iteration starts
    pub fn file_count(&self) -> usize {
        self.total
    }
}

impl Iterator for QueryFiles {
    type Item = ExtractedModule;

    fn next(&mut self) -> Option<ExtractedModule> {
        let path = self.files.next()?;
        let filename = discovery::relative_unix_path(&self.root, &path);
        debug!("Extracting queries from {}", filename);

        Some(match std::fs::read_to_string(&path) {
            Ok(content) => find_queries_in_source(&content, &filename),
            Err(e) => ExtractedModule {
                errors: vec![ExtractionError {
                    cause: format!("Failed to read file: {}", e),
                    filename: filename.clone(),
                }],
                filename,
                queries: Vec::new(),
            },
        })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.files.size_hint()
    }
}

/// Resolve `patterns` under `root` into a lazy module sequence
pub fn find_queries_in_path(root: &Path, patterns: &[String]) -> Result<QueryFiles> {
    let matcher = QueryPatterns::new(patterns)?;
    let files = discovery::discover_files(root, &matcher);
    debug!("Resolved {} query files under {}", files.len(), root.display());
    Ok(QueryFiles::new(root.to_path_buf(), files))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_count_is_known_before_iteration() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("src")).unwrap();
        fs::write(dir.path().join("src/a.ts"), "const a = 1").unwrap();
        fs::write(dir.path().join("src/b.ts"), "const b = 2").unwrap();

        let files = find_queries_in_path(dir.path(), &["./src/**/*.ts".to_string()]).unwrap();
        assert_eq!(files.file_count(), 2);

        let filenames: Vec<String> = files.map(|m| m.filename).collect();
        assert_eq!(filenames, vec!["src/a.ts".to_string(), "src/b.ts".to_string()]);
    }

    #[test]
    fn test_unreadable_file_becomes_extraction_error() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("gone.ts");
        let mut files = QueryFiles::new(dir.path().to_path_buf(), vec![missing]);

        let module = files.next().unwrap();
        assert_eq!(module.filename, "gone.ts");
        assert!(module.queries.is_empty());
        assert_eq!(module.errors.len(), 1);
        assert!(files.next().is_none());
    }
}
