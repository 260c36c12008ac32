//! Progress reporting for collection syncs.

use std::fmt;
use std::sync::Arc;
use std::time::Instant;

/// Stage of a sync run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncPhase {
    Load,
    Plan,
    Delete,
    Chunk,
    Store,
}

impl fmt::Display for SyncPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Load => "load",
            Self::Plan => "plan",
            Self::Delete => "delete",
            Self::Chunk => "chunk",
            Self::Store => "store",
        };
        f.write_str(name)
    }
}

/// One progress update.
#[derive(Debug, Clone)]
pub struct ProgressEvent {
    pub phase: SyncPhase,
    pub current: u64,
    pub total: Option<u64>,
    pub message: String,
    /// Seconds since the reporter was created
    pub elapsed_secs: f64,
}

impl ProgressEvent {
    pub fn percentage(&self) -> Option<f64> {
        self.total.map(|total| {
            if total > 0 {
                self.current as f64 / total as f64 * 100.0
            } else {
                100.0
            }
        })
    }

    /// Single-line rendering for terminals.
    pub fn format_simple(&self) -> String {
        let progress = match (self.total, self.percentage()) {
            (Some(total), Some(pct)) => format!("{}/{} ({:.0}%)", self.current, total, pct),
            _ => self.current.to_string(),
        };
        format!("[{}] {} - {}", self.phase, progress, self.message)
    }
}

pub type ProgressCallback = Arc<dyn Fn(ProgressEvent) + Send + Sync>;

/// Sends progress events to an optional callback and the debug log.
#[derive(Clone)]
pub struct ProgressReporter {
    callback: Option<ProgressCallback>,
    started: Instant,
}

impl ProgressReporter {
    pub fn new(callback: ProgressCallback) -> Self {
        Self {
            callback: Some(callback),
            started: Instant::now(),
        }
    }

    pub fn noop() -> Self {
        Self {
            callback: None,
            started: Instant::now(),
        }
    }

    pub fn emit(&self, phase: SyncPhase, current: u64, total: Option<u64>, message: impl Into<String>) {
        let event = ProgressEvent {
            phase,
            current,
            total,
            message: message.into(),
            elapsed_secs: self.started.elapsed().as_secs_f64(),
        };

        tracing::debug!(
            phase = %event.phase,
            current = event.current,
            total = ?event.total,
            message = %event.message,
            "Sync progress"
        );

        if let Some(callback) = &self.callback {
            callback(event);
        }
    }

    pub fn loaded(&self, records: usize) {
        self.emit(SyncPhase::Load, records as u64, None, format!("{} records", records));
    }

    pub fn planned(&self, to_add: usize, to_delete: usize) {
        self.emit(
            SyncPhase::Plan,
            (to_add + to_delete) as u64,
            None,
            format!("{} records to chunk, {} chunks to delete", to_add, to_delete),
        );
    }

    pub fn deleted(&self, deleted: usize, requested: usize) {
        self.emit(
            SyncPhase::Delete,
            deleted as u64,
            Some(requested as u64),
            "stale chunks removed",
        );
    }

    pub fn chunked(&self, current: usize, total: usize, source_id: &str) {
        self.emit(SyncPhase::Chunk, current as u64, Some(total as u64), source_id.to_string());
    }

    pub fn stored(&self, chunks: usize) {
        self.emit(SyncPhase::Store, chunks as u64, None, format!("{} chunks written", chunks));
    }
}

impl Default for ProgressReporter {
    fn default() -> Self {
        Self::noop()
    }
}
