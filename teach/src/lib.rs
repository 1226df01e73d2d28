//! Mentor Teach - records editor sessions as structured property diffs.
//!
//! A teaching session marks a point in the undo history, lets the user work,
//! and on stop replays everything recorded since, snapshotting each touched
//! object before and after every transaction. The resulting diffs are pruned
//! by a [`FilterChain`] and handed to a [`PresentationSink`].

pub mod diff;
pub mod differ;
pub mod error;
pub mod filter;
pub mod host;
pub mod present;
pub mod progress;
pub mod replay;
pub mod session;
pub mod snapshot;

pub use diff::{ObjectDiff, PropertyDiff, TransactionDiff};
pub use error::{AbortReason, CaptureError};
pub use filter::{
    AssetObjectFilter, BaseFilter, EditablePropertyFilter, FilterChain, FilterRules,
    TeachingFilter,
};
pub use host::{SceneHost, TransactionHost, TransactionRecord};
pub use present::{DiffTreeEntry, EntryKind, PresentationSink, build_diff_tree, render_text};
pub use progress::{LogProgressSink, ProgressSink};
pub use replay::{ReplayOutcome, SkipReason, SkippedStep};
pub use session::{CaptureSummary, CustomEvent, SessionState, TeachingSessionManager};
