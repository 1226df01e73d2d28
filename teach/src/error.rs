//! Capture failures reported by [`TeachingSessionManager::stop`](crate::TeachingSessionManager::stop).

use mentor_core::abstract_editor::EditActionError;
use thiserror::Error;

use crate::replay::SkippedStep;

/// Why a capture produced no result.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AbortReason {
    /// `stop` was called without an active session. Nothing changed.
    #[error("no teaching session is recording")]
    NotRecording,
    #[error("edit history is unavailable")]
    HostUnavailable,
    #[error("invalid capture range (baseline {baseline:?}, queue length {queue_length:?})")]
    InvalidRange {
        baseline: Option<usize>,
        queue_length: Option<usize>,
    },
    /// The history is left partially rewound.
    #[error("rewind failed after {undone} undo steps: {source}")]
    RewindFailed {
        undone: usize,
        source: EditActionError,
    },
}

/// Error returned when a capture does not complete cleanly.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CaptureError {
    #[error("capture aborted: {0}")]
    Aborted(#[from] AbortReason),
    /// Replay finished, but some steps contributed nothing.
    #[error("capture kept {captured} transactions, {} steps skipped", .skipped.len())]
    PartialSuccess {
        captured: usize,
        skipped: Vec<SkippedStep>,
    },
}
