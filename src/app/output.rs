//! Result printing
//!
//! [`Reporter`] is the sink the binary hands to every scan. Pointers and
//! lockable paths go to stdout, per-object errors to stderr (or stdout as JSON
//! with `--json`). Lines are written whole so concurrent workers never
//! interleave within a line.

use crate::scanner::api::{LockableSink, PointerSink, PointerSummary, ScanError, WrappedPointer};
use colored::Colorize;
use serde_json::json;
use std::sync::atomic::{AtomicUsize, Ordering};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
}

/// Counts of what a scan reported
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScanSummary {
    pub pointers: usize,
    pub lockables: usize,
    pub errors: usize,
}

#[derive(Debug)]
pub struct Reporter {
    format: OutputFormat,
    pointers: AtomicUsize,
    lockables: AtomicUsize,
    errors: AtomicUsize,
}

impl Reporter {
    pub fn new(format: OutputFormat) -> Self {
        Self {
            format,
            pointers: AtomicUsize::new(0),
            lockables: AtomicUsize::new(0),
            errors: AtomicUsize::new(0),
        }
    }

    pub fn summary(&self) -> ScanSummary {
        ScanSummary {
            pointers: self.pointers.load(Ordering::Relaxed),
            lockables: self.lockables.load(Ordering::Relaxed),
            errors: self.errors.load(Ordering::Relaxed),
        }
    }
}

impl PointerSink for Reporter {
    fn found(&self, result: Result<WrappedPointer, ScanError>) {
        match result {
            Ok(pointer) => {
                self.pointers.fetch_add(1, Ordering::Relaxed);
                println!("{}", format_pointer(&pointer, self.format));
            }
            Err(err) => {
                self.errors.fetch_add(1, Ordering::Relaxed);
                match self.format {
                    OutputFormat::Json => println!("{}", json!({ "error": err.to_string() })),
                    OutputFormat::Text => eprintln!("{} {}", "error:".red().bold(), err),
                }
            }
        }
    }
}

impl LockableSink for Reporter {
    fn found(&self, path: &str) {
        self.lockables.fetch_add(1, Ordering::Relaxed);
        println!("{}", format_lockable(path, self.format));
    }
}

/// `4d7a214614 art/cover.psd (12.1 MB)`, or a JSON object
pub fn format_pointer(pointer: &WrappedPointer, format: OutputFormat) -> String {
    match format {
        OutputFormat::Json => serde_json::to_string(&PointerSummary::from(pointer))
            .unwrap_or_else(|e| json!({ "error": e.to_string() }).to_string()),
        OutputFormat::Text => {
            let short_oid: String = pointer.oid().chars().take(10).collect();
            format!(
                "{} {} ({})",
                short_oid.yellow(),
                pointer.name,
                human_size(pointer.size()).dimmed()
            )
        }
    }
}

pub fn format_lockable(path: &str, format: OutputFormat) -> String {
    match format {
        OutputFormat::Json => json!({ "lockable": path }).to_string(),
        OutputFormat::Text => format!("{} {}", "lockable".cyan(), path),
    }
}

/// Size with a binary-prefixed unit, one decimal
pub fn human_size(bytes: u64) -> String {
    const UNITS: [&str; 5] = ["B", "KB", "MB", "GB", "TB"];
    if bytes < 1024 {
        return format!("{} B", bytes);
    }
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    format!("{:.1} {}", value, UNITS[unit])
}
