use super::state::{FlowError, FlowState, FollowUpAction, Preview};
use crate::analysis::{AnalysisError, AnalysisProvider, Language};
use crate::upload::{FileProcessor, UploadedFile};
use derivative::Derivative;
use log::{debug, error, info, warn};
use std::path::Path;
use std::sync::Arc;
use tokio::runtime::Handle;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::task::{JoinError, JoinHandle};

#[derive(Debug)]
struct Outcome {
    generation: u64,
    result: Result<String, AnalysisError>,
}

enum Settled {
    Reported(Option<Outcome>),
    Ended(Result<(), JoinError>),
}

/// Drives one upload at a time from file selection to a rendered result.
///
/// A new selection always supersedes the previous one: the in-flight
/// provider task is aborted and any outcome tagged with an older generation
/// is dropped, so a slow response can never overwrite a newer upload.
#[derive(Derivative)]
#[derivative(Debug)]
pub struct UploadAnalysisFlow {
    #[derivative(Debug = "ignore")]
    provider: Arc<dyn AnalysisProvider>,
    #[derivative(Debug = "ignore")]
    runtime: Handle,
    processor: FileProcessor,
    state: FlowState,
    language: Language,
    #[derivative(Debug = "ignore")]
    preview: Option<Preview>,
    generation: u64,
    in_flight: Option<JoinHandle<()>>,
    outcome_sender: UnboundedSender<Outcome>,
    #[derivative(Debug = "ignore")]
    outcome_receiver: UnboundedReceiver<Outcome>,
}

impl UploadAnalysisFlow {
    pub fn new(provider: Arc<dyn AnalysisProvider>, runtime: Handle) -> Self {
        let (outcome_sender, outcome_receiver) = mpsc::unbounded_channel();
        Self {
            provider,
            runtime,
            processor: FileProcessor::default(),
            state: FlowState::Idle,
            language: Language::default(),
            preview: None,
            generation: 0,
            in_flight: None,
            outcome_sender,
            outcome_receiver,
        }
    }

    pub fn with_file_processor(mut self, processor: FileProcessor) -> Self {
        self.processor = processor;
        self
    }

    pub fn with_language(mut self, language: Language) -> Self {
        self.language = language;
        self
    }

    pub fn state(&self) -> &FlowState {
        &self.state
    }

    pub fn preview(&self) -> Option<&Preview> {
        self.preview.as_ref()
    }

    pub fn language(&self) -> Language {
        self.language
    }

    pub fn provider_name(&self) -> &'static str {
        self.provider.name()
    }

    pub fn file_processor(&self) -> &FileProcessor {
        &self.processor
    }

    pub fn is_analyzed(&self) -> bool {
        self.state.is_analyzed()
    }

    /// Applies to the next analysis; one already in flight keeps its code.
    pub fn set_language(&mut self, language: Language) {
        if language != self.language {
            info!("Language changed to: {}", language);
            self.language = language;
        }
    }

    pub fn select_path(&mut self, path: &Path) {
        info!("Processing file: {}", path.display());
        match self.processor.load_path(path) {
            Ok(file) => self.select_file(file),
            Err(err) => {
                self.supersede();
                self.fail(err.into());
            }
        }
    }

    pub fn select_file(&mut self, file: UploadedFile) {
        self.supersede();

        if let Err(err) = self.processor.validate(&file) {
            self.fail(err.into());
            return;
        }

        self.reset();
        self.preview = Some(Self::make_preview(&file, self.generation));
        self.state = FlowState::Loading;
        debug!("Showing loading state for {}", file.name);
        self.start_analysis(file);
    }

    /// Applies any finished analysis. Never blocks; returns whether the state
    /// changed.
    pub fn poll(&mut self) -> bool {
        let mut changed = self.drain_outcomes();
        if self.in_flight.as_ref().is_some_and(|task| task.is_finished()) {
            changed |=
                self.settle_ended_task("analysis task ended without a result".to_string());
        }
        changed
    }

    /// Resolves once the current analysis has settled.
    pub async fn wait_for_outcome(&mut self) -> &FlowState {
        while self.state.is_loading() {
            let Some(task) = self.in_flight.as_mut() else {
                self.settle_ended_task("no analysis in flight".to_string());
                break;
            };

            let settled = tokio::select! {
                biased;
                outcome = self.outcome_receiver.recv() => Settled::Reported(outcome),
                joined = task => Settled::Ended(joined),
            };

            match settled {
                Settled::Reported(Some(outcome)) => {
                    self.apply(outcome);
                }
                Settled::Reported(None) => break,
                Settled::Ended(Ok(())) => {
                    self.settle_ended_task("analysis task ended without a result".to_string());
                }
                Settled::Ended(Err(err)) => {
                    self.settle_ended_task(format!("analysis task failed: {}", err));
                }
            }
        }
        &self.state
    }

    pub fn handle_follow_up(&self, action: FollowUpAction) -> &'static str {
        info!("Follow-up requested: {:?}", action);
        action.acknowledgement()
    }

    fn reset(&mut self) {
        debug!("Resetting analysis");
        self.state = FlowState::Idle;
        self.preview = None;
    }

    fn supersede(&mut self) {
        if let Some(task) = self.in_flight.take() {
            if !task.is_finished() {
                info!("Cancelling analysis superseded by a new selection");
            }
            task.abort();
        }
        self.generation += 1;
    }

    fn fail(&mut self, error: FlowError) {
        warn!("Showing error: {}", error);
        self.state = FlowState::Error { error };
    }

    fn start_analysis(&mut self, file: UploadedFile) {
        let provider = Arc::clone(&self.provider);
        let sender = self.outcome_sender.clone();
        let generation = self.generation;
        let language = self.language;

        info!(
            "Starting {} analysis #{} of {}",
            provider.name(),
            generation,
            file.name
        );

        self.in_flight = Some(self.runtime.spawn(async move {
            let result = provider.analyze(&file, language).await;
            let _ = sender.send(Outcome { generation, result });
        }));
    }

    fn drain_outcomes(&mut self) -> bool {
        let mut changed = false;
        while let Ok(outcome) = self.outcome_receiver.try_recv() {
            changed |= self.apply(outcome);
        }
        changed
    }

    /// The provider task is gone. Anything it reported is applied first; if
    /// it never reported (it panicked), the upload fails instead of loading
    /// forever.
    fn settle_ended_task(&mut self, reason: String) -> bool {
        self.in_flight = None;
        let changed = self.drain_outcomes();
        if !self.state.is_loading() {
            return changed;
        }

        error!("Analysis #{} failed: {}", self.generation, reason);
        self.state = FlowState::Error {
            error: AnalysisError::Unknown(reason).into(),
        };
        true
    }

    fn apply(&mut self, outcome: Outcome) -> bool {
        if outcome.generation != self.generation || !self.state.is_loading() {
            debug!("Discarding stale outcome of analysis #{}", outcome.generation);
            return false;
        }

        self.in_flight = None;
        self.state = match outcome.result {
            Ok(result) => {
                info!("Analysis complete: {}", result);
                FlowState::Success { result }
            }
            Err(err) => {
                error!("Analysis failed: {}", err);
                FlowState::Error { error: err.into() }
            }
        };
        true
    }

    fn make_preview(file: &UploadedFile, generation: u64) -> Preview {
        let extension = FileProcessor::extension_for(&file.media_type).unwrap_or("img");
        Preview {
            uri: format!("bytes://preview-{}.{}", generation, extension),
            name: file.name.clone(),
            size: file.size(),
            bytes: Arc::clone(&file.bytes),
        }
    }
}

impl Drop for UploadAnalysisFlow {
    fn drop(&mut self) {
        if let Some(task) = self.in_flight.take() {
            task.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::{SimulatedProvider, SIMULATED_RESULT};
    use crate::upload::UploadError;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    /// Answers with the file name after a delay taken from the first byte,
    /// counting every call.
    #[derive(Default)]
    struct EchoProvider {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl AnalysisProvider for EchoProvider {
        async fn analyze(
            &self,
            image: &UploadedFile,
            language: Language,
        ) -> Result<String, AnalysisError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let delay = image.bytes.first().copied().unwrap_or(0);
            tokio::time::sleep(Duration::from_secs(delay as u64)).await;
            Ok(format!("{} in {}", image.name, language))
        }

        fn name(&self) -> &'static str {
            "echo"
        }
    }

    struct FailingProvider(AnalysisError);

    #[async_trait]
    impl AnalysisProvider for FailingProvider {
        async fn analyze(&self, _: &UploadedFile, _: Language) -> Result<String, AnalysisError> {
            Err(self.0.clone())
        }

        fn name(&self) -> &'static str {
            "failing"
        }
    }

    struct PanickingProvider;

    #[async_trait]
    impl AnalysisProvider for PanickingProvider {
        async fn analyze(&self, _: &UploadedFile, _: Language) -> Result<String, AnalysisError> {
            panic!("decoder blew up");
        }

        fn name(&self) -> &'static str {
            "panicking"
        }
    }

    fn image(name: &str, delay_secs: u8) -> UploadedFile {
        UploadedFile::new(name, "image/png", vec![delay_secs, 0, 0, 0])
    }

    #[tokio::test]
    async fn non_images_fail_without_calling_provider() {
        let provider = Arc::new(EchoProvider::default());
        let mut flow = UploadAnalysisFlow::new(provider.clone(), Handle::current());

        flow.select_file(UploadedFile::new("notes.txt", "text/plain", b"hi".to_vec()));

        assert_eq!(
            flow.state(),
            &FlowState::Error {
                error: FlowError::Upload(UploadError::InvalidFileType {
                    media_type: "text/plain".to_string()
                })
            }
        );
        assert!(flow.preview().is_none());
        tokio::task::yield_now().await;
        assert_eq!(provider.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn oversized_images_fail_without_calling_provider() {
        let provider = Arc::new(EchoProvider::default());
        let mut flow = UploadAnalysisFlow::new(provider.clone(), Handle::current())
            .with_file_processor(FileProcessor::new(3));

        flow.select_file(image("big.png", 0));

        assert!(matches!(
            flow.state().error(),
            Some(FlowError::Upload(UploadError::FileTooLarge { size: 4, limit: 3 }))
        ));
        assert_eq!(provider.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn accepted_image_shows_preview_and_loads_then_succeeds() {
        let provider = Arc::new(EchoProvider::default());
        let mut flow = UploadAnalysisFlow::new(provider.clone(), Handle::current())
            .with_language(Language::Portuguese);

        flow.select_file(image("meter.png", 0));

        assert!(flow.state().is_loading());
        let preview = flow.preview().unwrap();
        assert_eq!(preview.name, "meter.png");
        assert!(preview.uri.starts_with("bytes://preview-"));
        assert!(preview.uri.ends_with(".png"));

        let state = flow.wait_for_outcome().await.clone();
        assert_eq!(
            state,
            FlowState::Success {
                result: "meter.png in pt".to_string()
            }
        );
        assert!(flow.is_analyzed());
        assert_eq!(provider.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn provider_failure_ends_in_error_state() {
        let provider = Arc::new(FailingProvider(AnalysisError::Server(500)));
        let mut flow = UploadAnalysisFlow::new(provider, Handle::current());

        flow.select_file(image("sign.png", 0));
        let state = flow.wait_for_outcome().await;

        assert_eq!(
            state.error(),
            Some(&FlowError::Analysis(AnalysisError::Server(500)))
        );
        assert!(!flow.is_analyzed());
    }

    #[tokio::test(start_paused = true)]
    async fn newer_selection_cancels_pending_analysis() {
        let provider = Arc::new(EchoProvider::default());
        let mut flow = UploadAnalysisFlow::new(provider.clone(), Handle::current());

        flow.select_file(image("first.png", 30));
        tokio::task::yield_now().await;
        flow.select_file(image("second.png", 1));

        let state = flow.wait_for_outcome().await.clone();
        assert_eq!(
            state,
            FlowState::Success {
                result: "second.png in en".to_string()
            }
        );
        assert_eq!(flow.preview().unwrap().name, "second.png");

        tokio::time::sleep(Duration::from_secs(60)).await;
        assert!(!flow.poll());
        assert_eq!(flow.preview().unwrap().name, "second.png");
    }

    #[tokio::test]
    async fn stale_outcomes_are_discarded() {
        let provider = Arc::new(EchoProvider::default());
        let mut flow = UploadAnalysisFlow::new(provider, Handle::current());
        flow.select_file(image("current.png", 0));
        let stale_generation = flow.generation - 1;

        let applied = flow.apply(Outcome {
            generation: stale_generation,
            result: Ok("old news".to_string()),
        });

        assert!(!applied);
        assert!(flow.state().is_loading());
    }

    #[tokio::test]
    async fn rejected_selection_supersedes_pending_analysis() {
        let provider = Arc::new(EchoProvider::default());
        let mut flow = UploadAnalysisFlow::new(provider, Handle::current());

        flow.select_file(image("pending.png", 5));
        flow.select_file(UploadedFile::new("doc.pdf", "application/pdf", vec![1]));

        assert!(flow.state().error().is_some());
        assert!(!flow.poll());
        assert!(flow.state().error().is_some());
    }

    #[tokio::test]
    async fn panicking_provider_still_settles_in_error() {
        let mut flow = UploadAnalysisFlow::new(Arc::new(PanickingProvider), Handle::current());

        flow.select_file(image("sign.png", 0));
        let state = tokio::time::timeout(Duration::from_secs(2), flow.wait_for_outcome())
            .await
            .expect("flow stayed in Loading")
            .clone();

        assert!(matches!(
            state.error(),
            Some(FlowError::Analysis(AnalysisError::Unknown(_)))
        ));
        assert!(flow.in_flight.is_none());
    }

    #[tokio::test]
    async fn poll_notices_a_provider_that_panicked() {
        let mut flow = UploadAnalysisFlow::new(Arc::new(PanickingProvider), Handle::current());
        flow.select_file(image("sign.png", 0));

        let mut settled = false;
        for _ in 0..100 {
            tokio::task::yield_now().await;
            if flow.poll() {
                settled = true;
                break;
            }
        }

        assert!(settled);
        assert!(matches!(
            flow.state().error(),
            Some(FlowError::Analysis(AnalysisError::Unknown(_)))
        ));
        assert!(!flow.poll());
    }

    #[tokio::test(start_paused = true)]
    async fn simulated_provider_drives_flow_to_fixed_result() {
        let mut flow =
            UploadAnalysisFlow::new(Arc::new(SimulatedProvider::default()), Handle::current());

        flow.select_file(image("sign.png", 0));
        let state = flow.wait_for_outcome().await;

        assert_eq!(
            state,
            &FlowState::Success {
                result: SIMULATED_RESULT.to_string()
            }
        );
    }

    #[tokio::test]
    async fn select_path_reports_unreadable_files() {
        let dir = tempfile::tempdir().unwrap();
        let mut flow =
            UploadAnalysisFlow::new(Arc::new(EchoProvider::default()), Handle::current());

        flow.select_path(&dir.path().join("missing.jpg"));

        assert!(matches!(
            flow.state().error(),
            Some(FlowError::Upload(UploadError::Unreadable(_)))
        ));
    }

    #[tokio::test]
    async fn follow_up_actions_only_acknowledge() {
        let flow = UploadAnalysisFlow::new(Arc::new(EchoProvider::default()), Handle::current());

        assert_eq!(
            flow.handle_follow_up(FollowUpAction::SetReminder),
            "Reminder feature coming soon!"
        );
        assert_eq!(flow.state(), &FlowState::Idle);
    }
}
