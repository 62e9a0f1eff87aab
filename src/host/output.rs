//! Output persistence and formatting
//!
//! The generated code is always written unformatted first. When formatting
//! is enabled the formatted code is written a second time to the same path.

use crate::errors::{Result, TypegenError};
use async_trait::async_trait;
use std::path::Path;
use std::process::Stdio;
use tokio::io::AsyncWriteExt;
use tracing::debug;

#[async_trait]
pub trait Formatter: Send + Sync {
    async fn format(&self, code: &str, path: &Path) -> Result<String>;
}

/// Formats by piping code through an external command
#[derive(Debug, Clone)]
pub struct CommandFormatter {
    program: String,
    args: Vec<String>,
}

impl CommandFormatter {
    /// `program args… <path>` is run with the code on stdin
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    pub fn prettier() -> Self {
        Self::new(
            "npx",
            vec![
                "--no-install".to_string(),
                "prettier".to_string(),
                "--stdin-filepath".to_string(),
            ],
        )
    }
}

#[async_trait]
impl Formatter for CommandFormatter {
    async fn format(&self, code: &str, path: &Path) -> Result<String> {
        debug!("Formatting {} with {}", path.display(), self.program);
        let mut child = tokio::process::Command::new(&self.program)
            .args(&self.args)
            .arg(path)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| TypegenError::Format(format!("Failed to start {}: {}", self.program, e)))?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin
                .write_all(code.as_bytes())
                .await
                .map_err(|e| TypegenError::Format(e.to_string()))?;
        }

        let output = child
            .wait_with_output()
            .await
            .map_err(|e| TypegenError::Format(e.to_string()))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(TypegenError::Format(format!(
                "{} exited with {}: {}",
                self.program,
                output.status,
                stderr.trim()
            )));
        }

        String::from_utf8(output.stdout).map_err(|e| TypegenError::Format(e.to_string()))
    }
}

/// Destination for generated files
#[async_trait]
pub trait OutputTarget: Send + Sync {
    async fn write_file(&self, path: &Path, contents: &str) -> Result<()>;
}

/// Writes to the local filesystem, creating parent directories
#[derive(Debug, Default, Clone, Copy)]
pub struct FsOutput;

#[async_trait]
impl OutputTarget for FsOutput {
    async fn write_file(&self, path: &Path, contents: &str) -> Result<()> {
        let write_error = |source: std::io::Error| TypegenError::Write {
            path: path.to_path_buf(),
            source,
        };
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await.map_err(write_error)?;
        }
        tokio::fs::write(path, contents).await.map_err(write_error)?;
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteOutcome {
    Unformatted,
    Formatted,
    /// Formatting was requested but failed; the unformatted code was kept
    FormatFailed(String),
}

/// Write `code` to `path`, then optionally a formatted copy over it
pub async fn write_generated(
    target: &dyn OutputTarget,
    formatter: &dyn Formatter,
    path: &Path,
    code: &str,
    format: bool,
) -> Result<WriteOutcome> {
    target.write_file(path, code).await?;
    if !format {
        return Ok(WriteOutcome::Unformatted);
    }

    match formatter.format(code, path).await {
        Ok(formatted) => {
            target.write_file(path, &formatted).await?;
            Ok(WriteOutcome::Formatted)
        }
        Err(e) => Ok(WriteOutcome::FormatFailed(e.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    struct UppercaseFormatter;

    #[async_trait]
    impl Formatter for UppercaseFormatter {
        async fn format(&self, code: &str, _path: &Path) -> Result<String> {
            Ok(code.to_uppercase())
        }
    }

    struct BrokenFormatter;

    #[async_trait]
    impl Formatter for BrokenFormatter {
        async fn format(&self, _code: &str, _path: &Path) -> Result<String> {
            Err(TypegenError::Format("not installed".to_string()))
        }
    }

    #[tokio::test]
    async fn test_parent_directories_are_created() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("out/nested/sanity.types.ts");

        let outcome = write_generated(&FsOutput, &UppercaseFormatter, &path, "export {}", true)
            .await
            .unwrap();

        assert_eq!(outcome, WriteOutcome::Formatted);
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "EXPORT {}");
    }

    #[tokio::test]
    async fn test_format_failure_keeps_unformatted_output() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("sanity.types.ts");

        let outcome = write_generated(&FsOutput, &BrokenFormatter, &path, "export {}", true)
            .await
            .unwrap();

        assert!(matches!(outcome, WriteOutcome::FormatFailed(ref message) if message.contains("not installed")));
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "export {}");
    }

    #[tokio::test]
    async fn test_write_error_when_parent_is_a_file() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("blocker"), "").unwrap();
        let path = dir.path().join("blocker/sanity.types.ts");

        let err = FsOutput.write_file(&path, "x").await.unwrap_err();
        assert!(matches!(err, TypegenError::Write { .. }));
    }

    #[tokio::test]
    async fn test_missing_formatter_command_is_format_error() {
        let formatter = CommandFormatter::new("definitely-not-a-real-formatter-binary", vec![]);
        let err = formatter.format("x", Path::new("a.ts")).await.unwrap_err();
        assert!(matches!(err, TypegenError::Format(_)));
    }
}
