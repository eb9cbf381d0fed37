//! Reporting types for writes and batch syncs.

use mcpbridge_snapshot::Source;
use serde::{Deserialize, Serialize};

/// Result of writing one native config file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WriteReport {
    /// Number of MCP entries written.
    pub written: usize,
    /// Non-fatal problems noticed while writing.
    pub warnings: Vec<String>,
}

/// One item that failed inside a batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchFailure {
    pub name: String,
    pub error: String,
}

/// Outcome of a non-transactional batch sync.
///
/// Items are attempted in order. A failure does not roll back earlier items
/// and does not stop later ones, so `synced` and `failures` together cover
/// every attempted name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchReport {
    pub from: Source,
    pub to: Source,
    pub attempted: usize,
    pub completed: usize,
    pub synced: Vec<String>,
    pub failures: Vec<BatchFailure>,
}

impl BatchReport {
    pub fn new(from: Source, to: Source) -> Self {
        Self {
            from,
            to,
            attempted: 0,
            completed: 0,
            synced: Vec::new(),
            failures: Vec::new(),
        }
    }

    pub(crate) fn record_success(&mut self, name: &str) {
        self.attempted += 1;
        self.completed += 1;
        self.synced.push(name.to_string());
    }

    pub(crate) fn record_failure(&mut self, name: &str, error: impl ToString) {
        self.attempted += 1;
        self.failures.push(BatchFailure {
            name: name.to_string(),
            error: error.to_string(),
        });
    }

    /// The earliest failure, if any.
    pub fn first_failure(&self) -> Option<&BatchFailure> {
        self.failures.first()
    }

    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }

    /// Generates a formatted summary for display.
    pub fn format_summary(&self) -> String {
        let mut out = String::new();
        out.push_str(&format!(
            "Sync {}: {} → {}\n",
            if self.is_success() { "Complete" } else { "Incomplete" },
            self.from.display_name(),
            self.to.display_name()
        ));
        out.push_str(&format!(
            "  {} of {} synced\n",
            self.completed, self.attempted
        ));
        if let Some(first) = self.first_failure() {
            out.push_str(&format!("  First failure: {} ({})\n", first.name, first.error));
            if self.failures.len() > 1 {
                out.push_str(&format!(
                    "  {} more failed\n",
                    self.failures.len() - 1
                ));
            }
        }
        out
    }
}
