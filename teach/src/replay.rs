//! Reconstructs before/after snapshots for each transaction of a history.
//!
//! The history only moves relative to its current position, so the state at
//! any point is rebuilt by rewinding everything and redoing one transaction
//! at a time from the start. The replay is not reentrant and must not run
//! alongside other edits to the same history.

use std::fmt;

use mentor_core::abstract_editor::EditActionError;

use crate::diff::TransactionDiff;
use crate::differ::diff_object_sets;
use crate::error::AbortReason;
use crate::host::TransactionHost;
use crate::snapshot::{clone_all, release};

/// Why a replay step contributed no diff.
#[derive(Debug, Clone, PartialEq)]
pub enum SkipReason {
    MissingRecord,
    RedoFailed(EditActionError),
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingRecord => f.write_str("transaction record missing"),
            Self::RedoFailed(err) => write!(f, "redo failed: {err}"),
        }
    }
}

/// A replay step that was skipped.
#[derive(Debug, Clone, PartialEq)]
pub struct SkippedStep {
    pub index: usize,
    pub reason: SkipReason,
}

/// Result of a completed replay.
#[derive(Debug, Default)]
pub struct ReplayOutcome {
    /// Diffs of captured transactions that have differences, in order.
    pub diffs: Vec<TransactionDiff>,
    /// Skipped steps at any position, captured or not.
    pub skipped: Vec<SkippedStep>,
}

/// Undoes every applied transaction, most recent first.
///
/// Returns the number of undone transactions. On failure the history is
/// left partially rewound.
pub fn rewind(host: &mut dyn TransactionHost) -> Result<usize, AbortReason> {
    let count = host.undo_count();
    for undone in 0..count {
        if let Err(source) = host.undo() {
            log::error!("Failed to undo transaction {undone} / {count}: {source}");
            return Err(AbortReason::RewindFailed { undone, source });
        }
    }
    Ok(count)
}

/// Moves the history cursor until exactly `applied` transactions are applied.
///
/// Failures are logged and stop the walk; the diffs already gathered stay
/// valid.
fn restore(host: &mut dyn TransactionHost, applied: usize) {
    while host.undo_count() > applied {
        if let Err(err) = host.undo() {
            log::error!("Failed to restore history position {applied}: {err}");
            return;
        }
    }
    while host.undo_count() < applied {
        if let Err(err) = host.redo() {
            log::error!("Failed to restore history position {applied}: {err}");
            return;
        }
    }
}

/// Rewinds the history, then redoes transactions `0..=end`, diffing those
/// at `start` or later.
///
/// Afterwards the history is returned to the position it had on entry, so
/// transactions undone before the replay stay undone.
pub fn replay(
    host: &mut dyn TransactionHost,
    start: usize,
    end: usize,
) -> Result<ReplayOutcome, AbortReason> {
    let applied = rewind(host)?;
    let mut outcome = ReplayOutcome::default();

    for index in 0..=end {
        let Some(record) = host.transaction(index) else {
            log::warn!("Transaction {index} is missing");
            outcome.skipped.push(SkippedStep {
                index,
                reason: SkipReason::MissingRecord,
            });
            continue;
        };
        let capture = index >= start;

        let before = clone_all(host.scene_mut(), &record.objects);
        if let Err(err) = host.redo() {
            log::error!("Redo failed at transaction {index}: {err}");
            release(host.scene_mut(), before);
            outcome.skipped.push(SkippedStep {
                index,
                reason: SkipReason::RedoFailed(err),
            });
            continue;
        }
        let after = clone_all(host.scene_mut(), &record.objects);

        if capture {
            log::info!("Analyzing transaction {index}: {}", record.title);
            let diff = TransactionDiff {
                index,
                title: record.title,
                context: record.context,
                objects: diff_object_sets(host.scene(), &before, &after),
            };
            if diff.has_differences() {
                outcome.diffs.push(diff);
            }
        }

        let scene = host.scene_mut();
        release(scene, before);
        release(scene, after);
        scene.collect_garbage();
    }

    restore(host, applied);
    Ok(outcome)
}
