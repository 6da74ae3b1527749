//! Failure reporting.

use parking_lot::Mutex;
use tracing::error;

/// A server-side save failure, stripped of personal data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailureReport {
    /// Key of the failing job.
    pub idempotency_key: String,
    /// Attempt number, starting at 1.
    pub attempt: u32,
    /// Exercises in the record.
    pub exercise_count: usize,
    /// Wire sets in the record.
    pub set_count: usize,
    /// Serialized record size in bytes.
    pub approximate_bytes: usize,
    /// Backend error message.
    pub message: String,
}

/// Receives failure reports.
pub trait TelemetrySink: Send + Sync {
    /// Records one failure.
    fn report(&self, report: &FailureReport);
}

/// Reports through `tracing` at error level.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingTelemetry;

impl TelemetrySink for TracingTelemetry {
    fn report(&self, report: &FailureReport) {
        error!(
            key = %report.idempotency_key,
            attempt = report.attempt,
            exercises = report.exercise_count,
            sets = report.set_count,
            bytes = report.approximate_bytes,
            message = %report.message,
            "workout save failed"
        );
    }
}

/// Keeps reports in memory.
#[derive(Debug, Default)]
pub struct MemoryTelemetry {
    reports: Mutex<Vec<FailureReport>>,
}

impl MemoryTelemetry {
    /// Creates an empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Reports received so far.
    pub fn reports(&self) -> Vec<FailureReport> {
        self.reports.lock().clone()
    }
}

impl TelemetrySink for MemoryTelemetry {
    fn report(&self, report: &FailureReport) {
        self.reports.lock().push(report.clone());
    }
}
