use super::{AnalysisError, AnalysisProvider, Language};
use crate::upload::UploadedFile;
use async_trait::async_trait;
use log::info;
use std::time::Duration;

pub const SIMULATED_RESULT: &str = "You can park here - but be sure to move your car by 5:00pm! After that, this space will become a valet zone.";

pub const DEFAULT_SIMULATED_DELAY: Duration = Duration::from_secs(2);

/// Offline stand-in for the remote endpoint: waits, then always answers
/// with [`SIMULATED_RESULT`].
#[derive(Debug, Clone)]
pub struct SimulatedProvider {
    delay: Duration,
}

impl Default for SimulatedProvider {
    fn default() -> Self {
        Self::new(DEFAULT_SIMULATED_DELAY)
    }
}

impl SimulatedProvider {
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }
}

#[async_trait]
impl AnalysisProvider for SimulatedProvider {
    async fn analyze(
        &self,
        image: &UploadedFile,
        language: Language,
    ) -> Result<String, AnalysisError> {
        info!(
            "Simulating analysis of {} ({}) for {:?}",
            image.name, language, self.delay
        );
        tokio::time::sleep(self.delay).await;
        Ok(SIMULATED_RESULT.to_string())
    }

    fn name(&self) -> &'static str {
        "simulated"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::Instant;

    #[tokio::test(start_paused = true)]
    async fn answers_with_fixed_text_after_delay() {
        let provider = SimulatedProvider::default();
        let image = UploadedFile::new("sign.png", "image/png", vec![1, 2, 3]);
        let started = Instant::now();

        let result = provider.analyze(&image, Language::Spanish).await;

        assert_eq!(result.as_deref(), Ok(SIMULATED_RESULT));
        assert!(started.elapsed() >= DEFAULT_SIMULATED_DELAY);
    }
}
