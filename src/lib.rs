//! Desktop client that sends a photo of a parking sign to an analysis
//! service and shows what the sign means.

pub mod analysis;
pub mod app;
pub mod config;
pub mod upload;
pub mod utils;

pub use analysis::{AnalysisError, AnalysisProvider, Language, RemoteProvider, SimulatedProvider};
pub use app::{FlowError, FlowState, ParkingAnalyzer, UploadAnalysisFlow};
pub use config::{AppConfig, ConfigError, ProviderKind};
pub use upload::{FileProcessor, UploadError, UploadedFile};
