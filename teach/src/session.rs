//! The teaching session state machine.
//!
//! `Idle -> start -> Recording -> stop -> Idle`. Starting marks the current
//! history length as the baseline; stopping replays the transactions recorded
//! since, diffs them, runs the filter chain and hands the result to the
//! presentation sink.

use std::time::{SystemTime, UNIX_EPOCH};

use serde::Serialize;

use crate::diff::TransactionDiff;
use crate::error::{AbortReason, CaptureError};
use crate::filter::{FilterChain, FilterRules};
use crate::host::TransactionHost;
use crate::present::{LogPresentationSink, PresentationSink};
use crate::progress::{LogProgressSink, ProgressSink};
use crate::replay::replay;

/// A user-defined marker recorded during a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CustomEvent {
    pub name: String,
    pub payload: String,
    /// Milliseconds since the Unix epoch.
    pub timestamp_ms: u64,
}

/// Everything a session accumulates. Reset on every start.
#[derive(Debug, Default)]
pub struct SessionState {
    pub recording: bool,
    /// History length when recording started, if the history reported one.
    pub baseline: Option<usize>,
    pub events: Vec<CustomEvent>,
    pub captured: Vec<TransactionDiff>,
}

/// Outcome of a capture that ran to completion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CaptureSummary {
    /// Inclusive transaction range, `None` when nothing was recorded.
    pub range: Option<(usize, usize)>,
    /// Transactions left after filtering.
    pub captured: usize,
}

/// Owns the session state and the filter chain.
pub struct TeachingSessionManager {
    state: SessionState,
    filters: FilterChain,
    rules: FilterRules,
    progress: Box<dyn ProgressSink>,
    presentation: Box<dyn PresentationSink>,
}

impl TeachingSessionManager {
    pub fn new(rules: FilterRules) -> Self {
        Self {
            state: SessionState::default(),
            filters: FilterChain::new(),
            rules,
            progress: Box::new(LogProgressSink),
            presentation: Box::new(LogPresentationSink),
        }
    }

    pub fn set_progress_sink(&mut self, sink: Box<dyn ProgressSink>) {
        self.progress = sink;
    }

    pub fn set_presentation_sink(&mut self, sink: Box<dyn PresentationSink>) {
        self.presentation = sink;
    }

    /// Starts recording. Without a host nothing changes.
    pub fn start(&mut self, host: Option<&dyn TransactionHost>) {
        let Some(host) = host else {
            log::error!("Starting teaching session failed: edit history is unavailable");
            return;
        };

        self.reset();
        self.state.baseline = host.queue_length();
        self.state.recording = true;
        match self.state.baseline {
            Some(baseline) => log::info!("Starting teaching session at transaction {baseline}"),
            None => log::warn!("Starting teaching session without a history baseline"),
        }
        self.progress.show_recording();
    }

    /// Stops recording and captures everything recorded since `start`.
    ///
    /// The history is rewound and replayed in full, so it must not be edited
    /// while this runs.
    pub fn stop(
        &mut self,
        host: Option<&mut dyn TransactionHost>,
    ) -> Result<CaptureSummary, CaptureError> {
        if !self.state.recording {
            log::warn!("Stopping teaching session ignored: not recording");
            return Err(AbortReason::NotRecording.into());
        }
        self.state.recording = false;
        let Some(host) = host else {
            log::error!("Stopping teaching session aborted: edit history is unavailable");
            self.progress.show_result(false);
            return Err(AbortReason::HostUnavailable.into());
        };

        let baseline = self.state.baseline;
        let queue_length = host.queue_length();
        let (Some(start), Some(length)) = (baseline, queue_length) else {
            log::error!("Stopping teaching session aborted: invalid indices");
            self.progress.show_result(false);
            return Err(AbortReason::InvalidRange {
                baseline,
                queue_length,
            }
            .into());
        };

        if length <= start {
            log::info!("Stopping teaching session skipped: no new transactions");
            self.presentation.present(&[]);
            self.progress.show_result(true);
            return Ok(CaptureSummary {
                range: None,
                captured: 0,
            });
        }
        let end = length - 1;
        log::info!("Stopping teaching session. Transactions [{start}, {end}]");

        self.filters
            .populate_defaults(host.scene().registry().clone(), &self.rules);

        let outcome = match replay(host, start, end) {
            Ok(outcome) => outcome,
            Err(reason) => {
                log::error!("Teaching session capture aborted: {reason}");
                self.progress.show_result(false);
                return Err(reason.into());
            }
        };

        let mut diffs = outcome.diffs;
        self.filters.apply(&mut diffs);
        self.presentation.present(&diffs);
        self.state.captured = diffs;
        self.progress.show_result(true);

        let captured = self.state.captured.len();
        if outcome.skipped.is_empty() {
            Ok(CaptureSummary {
                range: Some((start, end)),
                captured,
            })
        } else {
            log::warn!("{} transactions could not be replayed", outcome.skipped.len());
            Err(CaptureError::PartialSuccess {
                captured,
                skipped: outcome.skipped,
            })
        }
    }

    /// Appends a timestamped event. Ignored unless recording.
    pub fn record_custom_event(&mut self, name: impl Into<String>, payload: impl Into<String>) {
        if !self.state.recording {
            return;
        }
        let timestamp_ms = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or_default();
        self.state.events.push(CustomEvent {
            name: name.into(),
            payload: payload.into(),
            timestamp_ms,
        });
    }

    fn reset(&mut self) {
        self.state = SessionState::default();
        self.filters.clear();
    }

    pub fn is_recording(&self) -> bool {
        self.state.recording
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    /// Filtered diffs of the last capture.
    pub fn captured(&self) -> &[TransactionDiff] {
        &self.state.captured
    }

    pub fn events(&self) -> &[CustomEvent] {
        &self.state.events
    }

    pub fn filter_chain(&self) -> &FilterChain {
        &self.filters
    }

    pub fn rules(&self) -> &FilterRules {
        &self.rules
    }
}

impl Default for TeachingSessionManager {
    fn default() -> Self {
        Self::new(FilterRules::default())
    }
}
