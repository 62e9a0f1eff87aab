//! Progress tracking for a single generation run
//!
//! Accumulates per-file counts from relayed generator events and renders
//! the percentage status line.

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GenerationProgress {
    pub expected_files: usize,
    pub processed_files: usize,
    pub queries: usize,
    pub files_with_queries: usize,
}

impl GenerationProgress {
    pub fn new(expected_files: usize) -> Self {
        Self {
            expected_files,
            ..Default::default()
        }
    }

    /// Record one evaluated module
    pub fn record_module(&mut self, query_count: usize) {
        self.processed_files += 1;
        self.queries += query_count;
        if query_count > 0 {
            self.files_with_queries += 1;
        }
    }

    /// Completion percentage rounded to one decimal
    pub fn percent(&self) -> f64 {
        if self.expected_files == 0 {
            return 0.0;
        }
        let ratio = self.processed_files as f64 / self.expected_files as f64;
        (ratio * 1000.0).round() / 10.0
    }

    pub fn render(&self) -> String {
        format!(
            "Generating query types… ({:.1}%)\n  └ Processed {} of {} files. Found {} queries from {} files.",
            self.percent(),
            self.processed_files,
            self.expected_files,
            self.queries,
            self.files_with_queries
        )
    }
}
