use crate::analysis::AnalysisError;
use crate::upload::UploadError;
use std::sync::Arc;
use thiserror::Error;

pub const GENERIC_ANALYSIS_FAILURE: &str =
    "Something went wrong during analysis. Please try again.";

/// Everything that can go wrong between picking a file and showing a result.
/// All of it is recovered inside the flow.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FlowError {
    #[error(transparent)]
    Upload(#[from] UploadError),
    #[error(transparent)]
    Analysis(#[from] AnalysisError),
}

impl FlowError {
    pub fn user_message(&self) -> String {
        match self {
            FlowError::Upload(err) => err.user_message(),
            FlowError::Analysis(_) => GENERIC_ANALYSIS_FAILURE.to_string(),
        }
    }

    pub fn hint(&self) -> Option<&'static str> {
        match self {
            FlowError::Upload(_) => None,
            FlowError::Analysis(err) => Some(err.hint()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum FlowState {
    #[default]
    Idle,
    Loading,
    Success {
        result: String,
    },
    Error {
        error: FlowError,
    },
}

/// The region of the results section that is on screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Panel {
    Loading,
    Result,
    Error,
}

impl FlowState {
    /// At most one panel is ever visible; `None` hides the results section.
    pub fn visible_panel(&self) -> Option<Panel> {
        match self {
            FlowState::Idle => None,
            FlowState::Loading => Some(Panel::Loading),
            FlowState::Success { .. } => Some(Panel::Result),
            FlowState::Error { .. } => Some(Panel::Error),
        }
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, FlowState::Loading)
    }

    pub fn is_analyzed(&self) -> bool {
        matches!(self, FlowState::Success { .. })
    }

    pub fn shows_follow_up_actions(&self) -> bool {
        self.is_analyzed()
    }

    pub fn error(&self) -> Option<&FlowError> {
        match self {
            FlowState::Error { error } => Some(error),
            _ => None,
        }
    }
}

/// Local copy of the accepted image, addressed by a URI unique to its upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Preview {
    pub uri: String,
    pub name: String,
    pub size: u64,
    pub bytes: Arc<[u8]>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FollowUpAction {
    SetReminder,
    ReportIssue,
}

impl FollowUpAction {
    pub fn label(self) -> &'static str {
        match self {
            FollowUpAction::SetReminder => "⏰ Set Reminder",
            FollowUpAction::ReportIssue => "⚠ Report Issue",
        }
    }

    pub fn acknowledgement(self) -> &'static str {
        match self {
            FollowUpAction::SetReminder => "Reminder feature coming soon!",
            FollowUpAction::ReportIssue => "Issue reporting feature coming soon!",
        }
    }
}
