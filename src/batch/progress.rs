//! Outcome accounting and reporting for a run

use std::io::Write;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use serde::Serialize;

use crate::processing::{FileOutcome, ProcessedFile};

/// Final tally of a run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub converted: usize,
    pub failed: usize,
    pub skipped: usize,
    /// Only non-zero in a dry run
    #[serde(skip_serializing_if = "is_zero")]
    pub planned: usize,
}

fn is_zero(n: &usize) -> bool {
    *n == 0
}

impl RunSummary {
    /// Number of files that reached a terminal state
    pub fn total(&self) -> usize {
        self.converted + self.failed + self.skipped + self.planned
    }

    /// Text summary block, one entry per line
    pub fn lines(&self, dry_run: bool) -> Vec<String> {
        let first = if dry_run {
            format!("Planned: {}", self.planned)
        } else {
            format!("Converted: {}", self.converted)
        };
        vec![
            "Conversion Summary:".to_string(),
            first,
            format!("Failed: {}", self.failed),
            format!("Skipped: {}", self.skipped),
        ]
    }
}

/// Thread-safe counters shared by all workers
#[derive(Debug, Default)]
pub struct SummaryTracker {
    converted: AtomicUsize,
    failed: AtomicUsize,
    skipped: AtomicUsize,
    planned: AtomicUsize,
}

impl SummaryTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one file outcome
    pub fn record(&self, outcome: &FileOutcome) {
        let counter = match outcome {
            FileOutcome::Converted { .. } => &self.converted,
            FileOutcome::Planned { .. } => &self.planned,
            FileOutcome::Skipped(_) => &self.skipped,
            FileOutcome::Failed { .. } => &self.failed,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    /// Snapshot of the counters
    pub fn summary(&self) -> RunSummary {
        RunSummary {
            converted: self.converted.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
            skipped: self.skipped.load(Ordering::Relaxed),
            planned: self.planned.load(Ordering::Relaxed),
        }
    }
}

/// Destination for user-facing output lines.
///
/// Each call must emit the whole line at once so lines from concurrent
/// workers never interleave mid-line.
pub trait OutcomeSink: Send + Sync {
    fn line(&self, line: &str);

    /// Report one processed file
    fn outcome(&self, processed: &ProcessedFile) {
        self.line(&processed.to_string());
    }
}

/// Writes lines to standard output
#[derive(Debug, Default)]
pub struct ConsoleSink;

impl OutcomeSink for ConsoleSink {
    fn line(&self, line: &str) {
        let stdout = std::io::stdout();
        let mut handle = stdout.lock();
        let _ = writeln!(handle, "{}", line);
    }
}

/// Collects lines in memory
#[derive(Debug, Default)]
pub struct MemorySink {
    lines: Mutex<Vec<String>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything written so far
    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().map(|l| l.clone()).unwrap_or_default()
    }
}

impl OutcomeSink for MemorySink {
    fn line(&self, line: &str) {
        if let Ok(mut lines) = self.lines.lock() {
            lines.push(line.to_string());
        }
    }
}
