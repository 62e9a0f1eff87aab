//! Throwaway projects on disk for end-to-end generation tests

use super::tempdir::unique_temp_dir;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Two schema types: a `post` document and an `author` document
pub const SCHEMA_JSON: &str = r#"[
  {
    "name": "post",
    "type": "document",
    "attributes": {
      "_id": {"type": "objectAttribute", "value": {"type": "string"}},
      "_type": {"type": "objectAttribute", "value": {"type": "string", "value": "post"}},
      "title": {"type": "objectAttribute", "value": {"type": "string"}, "optional": true}
    }
  },
  {
    "name": "author",
    "type": "document",
    "attributes": {
      "_id": {"type": "objectAttribute", "value": {"type": "string"}},
      "_type": {"type": "objectAttribute", "value": {"type": "string", "value": "author"}},
      "name": {"type": "objectAttribute", "value": {"type": "string"}, "optional": true}
    }
  }
]"#;

/// Two queries in one file
pub const QUERIES_TS: &str = r#"import {defineQuery, groq} from "groq";

export const postsQuery = groq`*[_type == "post"]`;
export const authorQuery = defineQuery(`*[_type == "author"][0]`);
"#;

/// No queries at all
pub const PLAIN_TS: &str = r#"export function slugify(input: string): string {
  return input.toLowerCase();
}
"#;

/// A query whose substitution cannot be resolved
pub const BROKEN_TS: &str = r#"import {groq} from "groq";

export const brokenQuery = groq`*[_type == "${documentType()}"]`;
"#;

pub struct TestProject {
    dir: TempDir,
}

impl TestProject {
    pub fn new(test_name: &str) -> Self {
        Self {
            dir: unique_temp_dir(test_name),
        }
    }

    /// Schema plus `src/a.ts` (2 queries), `src/b.ts` (none), `src/c.ts` (1 error)
    pub fn scenario(test_name: &str) -> Self {
        let project = Self::new(test_name);
        project.write("schema.json", SCHEMA_JSON);
        project.write("src/a.ts", QUERIES_TS);
        project.write("src/b.ts", PLAIN_TS);
        project.write("src/c.ts", BROKEN_TS);
        project
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    pub fn path(&self, relative: &str) -> PathBuf {
        self.root().join(relative)
    }

    pub fn write(&self, relative: &str, contents: &str) {
        let path = self.path(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, contents).unwrap();
    }

    /// Write `sanity-typegen.json` with the scenario settings
    pub fn write_legacy_config(&self, format_generated_code: bool) {
        self.write(
            "sanity-typegen.json",
            &format!(
                r#"{{
  "path": "./src/**/*.ts",
  "schema": "./schema.json",
  "generates": "./out/sanity.types.ts",
  "overloadClientMethods": true,
  "formatGeneratedCode": {}
}}"#,
                format_generated_code
            ),
        );
    }
}
