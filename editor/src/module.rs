//! The editor module: scene, history, teaching session and log capture.

use std::sync::Arc;

use mentor_core::abstract_editor::{EditAction, EditActionResult};
use mentor_core::scene::Scene;
use mentor_teach::{
    CaptureError, CaptureSummary, SceneHost, TeachingSessionManager, TransactionHost,
};
use parking_lot::Mutex;

use crate::config::EditorConfig;
use crate::diff_panel::DiffPanel;
use crate::log_capture::LogBuffer;

pub struct EditorModule {
    host: SceneHost,
    teaching: TeachingSessionManager,
    diff_panel: DiffPanel,
    log: Arc<Mutex<LogBuffer>>,
}

impl EditorModule {
    pub fn new(scene: Scene, config: &EditorConfig, log: Arc<Mutex<LogBuffer>>) -> Self {
        let diff_panel = DiffPanel::new();
        let mut teaching = TeachingSessionManager::new(config.teaching.clone());
        teaching.set_presentation_sink(Box::new(diff_panel.sink()));

        log::info!("Editor module started (max undo {})", config.history.max_undo);
        Self {
            host: SceneHost::with_max_undo(scene, config.history.max_undo),
            teaching,
            diff_panel,
            log,
        }
    }

    pub fn start_teaching(&mut self) {
        self.teaching.start(Some(&self.host));
    }

    pub fn stop_teaching(&mut self) -> Result<CaptureSummary, CaptureError> {
        self.teaching.stop(Some(&mut self.host))
    }

    pub fn execute(&mut self, action: Box<dyn EditAction<Scene>>) -> EditActionResult {
        self.host.execute(action)
    }

    pub fn undo(&mut self) -> EditActionResult {
        self.host.undo()
    }

    pub fn redo(&mut self) -> EditActionResult {
        self.host.redo()
    }

    pub fn scene(&self) -> &Scene {
        self.host.scene()
    }

    pub fn scene_mut(&mut self) -> &mut Scene {
        self.host.scene_mut()
    }

    pub fn host(&self) -> &SceneHost {
        &self.host
    }

    pub fn teaching(&self) -> &TeachingSessionManager {
        &self.teaching
    }

    pub fn teaching_mut(&mut self) -> &mut TeachingSessionManager {
        &mut self.teaching
    }

    pub fn diff_panel(&self) -> &DiffPanel {
        &self.diff_panel
    }

    pub fn diff_panel_mut(&mut self) -> &mut DiffPanel {
        &mut self.diff_panel
    }

    pub fn log_buffer(&self) -> &Arc<Mutex<LogBuffer>> {
        &self.log
    }
}
