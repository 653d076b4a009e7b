mod flow;
mod state;
mod ui;

use crate::analysis::{AnalysisProvider, Language};
use crate::upload::IMAGE_EXTENSIONS;
use eframe::{egui, App};
pub use flow::UploadAnalysisFlow;
use log::{debug, info, warn};
use rfd::FileDialog;
pub use state::{FlowError, FlowState, FollowUpAction, Panel, Preview, GENERIC_ANALYSIS_FAILURE};
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Runtime;

/// Seconds each translation of the language prompt stays on screen.
const PROMPT_ROTATION_SECS: f64 = 2.0;

/// Remembers which preview URI egui has cached so a replaced preview can be
/// evicted from the image loaders.
#[derive(Debug, Default)]
pub struct PreviewTracker {
    shown: Option<String>,
}

impl PreviewTracker {
    /// Records `current` as the visible preview, forgetting the previous one
    /// if it changed. Returns the URI that was released.
    pub fn sync(&mut self, ctx: &egui::Context, current: Option<&str>) -> Option<String> {
        if self.shown.as_deref() == current {
            return None;
        }

        let released = self.shown.take();
        if let Some(uri) = &released {
            debug!("Releasing preview {}", uri);
            ctx.forget_image(uri);
        }
        self.shown = current.map(str::to_string);
        released
    }
}

pub struct ParkingAnalyzer {
    flow: UploadAnalysisFlow,
    previews: PreviewTracker,
    endpoint_label: String,
    notice: Option<String>,
    // Provider tasks run here; dropped after the flow so aborts land first.
    _runtime: Runtime,
}

impl ParkingAnalyzer {
    pub fn new(
        cc: &eframe::CreationContext<'_>,
        provider: Arc<dyn AnalysisProvider>,
        endpoint_label: String,
        language: Language,
        runtime: Runtime,
    ) -> Self {
        info!("Initializing Parking Sign Analyzer");
        egui_extras::install_image_loaders(&cc.egui_ctx);

        let flow = UploadAnalysisFlow::new(provider, runtime.handle().clone()).with_language(language);
        Self {
            flow,
            previews: PreviewTracker::default(),
            endpoint_label,
            notice: None,
            _runtime: runtime,
        }
    }

    pub fn pick_file(&mut self) {
        debug!("Upload button clicked");
        match FileDialog::new()
            .set_title("Choose a photo of the parking sign")
            .add_filter("Images", &IMAGE_EXTENSIONS)
            .pick_file()
        {
            Some(path) => {
                self.notice = None;
                self.flow.select_path(&path);
            }
            None => debug!("No file selected"),
        }
    }

    pub fn request_follow_up(&mut self, action: FollowUpAction) {
        self.notice = Some(self.flow.handle_follow_up(action).to_string());
    }

    pub fn set_language(&mut self, language: Language) {
        self.flow.set_language(language);
    }

    /// Index into [`Language::ALL`] of the prompt shown at `time` seconds.
    pub fn prompt_index(time: f64) -> usize {
        (time / PROMPT_ROTATION_SECS).floor() as usize % Language::ALL.len()
    }

    fn handle_dropped_files(&mut self, ctx: &egui::Context) {
        let dropped = ctx.input(|i| i.raw.dropped_files.clone());
        let Some(file) = dropped.into_iter().last() else {
            return;
        };

        self.notice = None;
        if let Some(path) = &file.path {
            self.flow.select_path(path);
        } else if let Some(bytes) = &file.bytes {
            let uploaded = self.flow.file_processor().from_bytes(&file.name, bytes.to_vec());
            self.flow.select_file(uploaded);
        } else {
            warn!("Dropped file '{}' carried neither a path nor bytes", file.name);
        }
    }

    pub fn update_state(&mut self, ctx: &egui::Context) {
        self.handle_dropped_files(ctx);

        if self.flow.poll() {
            ctx.request_repaint();
        }

        let current = self.flow.preview().map(|preview| preview.uri.as_str());
        self.previews.sync(ctx, current);

        if self.flow.state().is_loading() {
            ctx.request_repaint_after(Duration::from_millis(100));
        } else {
            ctx.request_repaint_after(Duration::from_secs_f64(PROMPT_ROTATION_SECS / 2.0));
        }
    }
}

impl App for ParkingAnalyzer {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.update_state(ctx);
        self.render(ctx);
    }
}
