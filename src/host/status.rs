//! Human-facing status output
//!
//! On a terminal the pending line is redrawn in place; otherwise every
//! update is written as its own line, which keeps piped output and tests
//! readable.

use std::io::{self, IsTerminal, Write};
use std::sync::{Arc, Mutex};

const PENDING: &str = "…";
const SUCCESS: &str = "✓";
const WARNING: &str = "⚠";
const FAILURE: &str = "✗";

struct StatusState {
    writer: Box<dyn Write + Send>,
    interactive: bool,
    /// Lines currently occupied by the pending status, when interactive
    pending_lines: usize,
}

impl StatusState {
    fn clear_pending(&mut self) {
        if !self.interactive || self.pending_lines == 0 {
            return;
        }
        let _ = write!(self.writer, "\r\x1b[2K");
        for _ in 1..self.pending_lines {
            let _ = write!(self.writer, "\x1b[1A\x1b[2K");
        }
        self.pending_lines = 0;
    }

    fn write_pending(&mut self, text: &str) {
        self.clear_pending();
        if self.interactive {
            let _ = write!(self.writer, "{} {}", PENDING, text);
            self.pending_lines = text.lines().count().max(1);
        } else {
            let _ = writeln!(self.writer, "{} {}", PENDING, text);
        }
        let _ = self.writer.flush();
    }

    fn write_final(&mut self, symbol: &str, text: &str) {
        self.clear_pending();
        let line = if symbol.is_empty() {
            text.to_string()
        } else {
            format!("{} {}", symbol, text)
        };
        let _ = writeln!(self.writer, "{}", line);
        let _ = self.writer.flush();
    }
}

/// Shared status line; clones write to the same output
#[derive(Clone)]
pub struct StatusLine {
    state: Arc<Mutex<StatusState>>,
}

impl StatusLine {
    pub fn stderr() -> Self {
        let interactive = io::stderr().is_terminal();
        Self::new(Box::new(io::stderr()), interactive)
    }

    pub fn new(writer: Box<dyn Write + Send>, interactive: bool) -> Self {
        Self {
            state: Arc::new(Mutex::new(StatusState {
                writer,
                interactive,
                pending_lines: 0,
            })),
        }
    }

    /// Non-interactive status line writing into a shared buffer
    pub fn buffered() -> (Self, StatusBuffer) {
        let buffer = StatusBuffer::default();
        (Self::new(Box::new(buffer.clone()), false), buffer)
    }

    fn with_state(&self, f: impl FnOnce(&mut StatusState)) {
        let mut state = self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        f(&mut state);
    }

    /// Begin (or replace) the pending status
    pub fn start(&self, text: impl AsRef<str>) {
        self.with_state(|s| s.write_pending(text.as_ref()));
    }

    /// Replace the pending status text
    pub fn update(&self, text: impl AsRef<str>) {
        self.with_state(|s| s.write_pending(text.as_ref()));
    }

    pub fn succeed(&self, text: impl AsRef<str>) {
        self.with_state(|s| s.write_final(SUCCESS, text.as_ref()));
    }

    pub fn warn(&self, text: impl AsRef<str>) {
        self.with_state(|s| s.write_final(WARNING, text.as_ref()));
    }

    pub fn fail(&self, text: impl AsRef<str>) {
        self.with_state(|s| s.write_final(FAILURE, text.as_ref()));
    }

    /// Plain line, no status symbol
    pub fn info(&self, text: impl AsRef<str>) {
        self.with_state(|s| s.write_final("", text.as_ref()));
    }
}

/// In-memory status output
#[derive(Clone, Default)]
pub struct StatusBuffer {
    bytes: Arc<Mutex<Vec<u8>>>,
}

impl StatusBuffer {
    pub fn contents(&self) -> String {
        let bytes = self.bytes.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        String::from_utf8_lossy(&bytes).into_owned()
    }

    pub fn lines(&self) -> Vec<String> {
        self.contents().lines().map(str::to_string).collect()
    }
}

impl Write for StatusBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut bytes = self.bytes.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        bytes.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_buffered_lines_carry_symbols() {
        let (status, buffer) = StatusLine::buffered();
        status.start("Loading schema…");
        status.succeed("Schema loaded from `schema.json`");
        status.warn("Encountered errors in 1 file(s) while generating types");
        status.fail("boom");
        status.info("[12:00:00] update: src/a.ts");

        assert_eq!(
            buffer.lines(),
            vec![
                "… Loading schema…",
                "✓ Schema loaded from `schema.json`",
                "⚠ Encountered errors in 1 file(s) while generating types",
                "✗ boom",
                "[12:00:00] update: src/a.ts",
            ]
        );
    }

    #[test]
    fn test_interactive_pending_is_redrawn() {
        let buffer = StatusBuffer::default();
        let status = StatusLine::new(Box::new(buffer.clone()), true);
        status.start("one");
        status.update("two");
        status.succeed("done");

        let contents = buffer.contents();
        assert!(contents.starts_with("… one"));
        assert!(contents.contains("\r\x1b[2K… two"));
        assert!(contents.ends_with("\r\x1b[2K✓ done\n"));
    }
}
