mod error;
mod remote;
mod simulated;

pub use error::AnalysisError;
pub use remote::RemoteProvider;
pub use simulated::{SimulatedProvider, SIMULATED_RESULT};

use crate::upload::UploadedFile;
use async_trait::async_trait;
use std::fmt;
use std::str::FromStr;

/// Supplies analysis text for an uploaded image.
#[async_trait]
pub trait AnalysisProvider: Send + Sync {
    async fn analyze(&self, image: &UploadedFile, language: Language)
        -> Result<String, AnalysisError>;

    /// Short name used in logs.
    fn name(&self) -> &'static str;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Language {
    #[default]
    English,
    Spanish,
    Chinese,
    Portuguese,
}

impl Language {
    pub const ALL: [Language; 4] = [
        Language::English,
        Language::Spanish,
        Language::Chinese,
        Language::Portuguese,
    ];

    /// Code sent to the analysis endpoint.
    pub fn code(self) -> &'static str {
        match self {
            Language::English => "en",
            Language::Spanish => "es",
            Language::Chinese => "zh",
            Language::Portuguese => "pt",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Language::English => "English",
            Language::Spanish => "Español",
            Language::Chinese => "中文",
            Language::Portuguese => "Português",
        }
    }

    /// "Select your language" in this language.
    pub fn select_prompt(self) -> &'static str {
        match self {
            Language::English => "Select your language:",
            Language::Spanish => "Selecciona tu idioma:",
            Language::Chinese => "选择你的语言:",
            Language::Portuguese => "Selecione seu idioma:",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Language {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Language::ALL
            .into_iter()
            .find(|language| language.code().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown language code '{}'", s))
    }
}

#[cfg(test)]
mod tests {
    use super::Language;

    #[test]
    fn parses_codes_case_insensitively() {
        assert_eq!("ES".parse::<Language>(), Ok(Language::Spanish));
        assert_eq!(" zh ".parse::<Language>(), Ok(Language::Chinese));
        assert!("fr".parse::<Language>().is_err());
    }
}
