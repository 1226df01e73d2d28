//! Progress notifications around a teaching session.

/// Receives session progress.
pub trait ProgressSink: Send {
    /// A session started recording.
    fn show_recording(&mut self);

    /// A capture finished.
    fn show_result(&mut self, success: bool);
}

/// Reports progress to the log only.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogProgressSink;

impl ProgressSink for LogProgressSink {
    fn show_recording(&mut self) {
        log::info!("Teaching session recording...");
    }

    fn show_result(&mut self, success: bool) {
        if success {
            log::info!("Teaching session captured");
        } else {
            log::warn!("Teaching session capture failed");
        }
    }
}
