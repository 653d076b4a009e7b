use crate::analysis::{AnalysisProvider, Language, RemoteProvider, SimulatedProvider};
use std::env;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_ENDPOINT: &str = "http://localhost:8080";
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;
pub const DEFAULT_SIMULATED_DELAY_MS: u64 = 2000;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{var}: unknown provider '{value}' (expected 'remote' or 'simulated')")]
    UnknownProvider { var: &'static str, value: String },
    #[error("{var}: {reason}")]
    InvalidLanguage { var: &'static str, reason: String },
    #[error("{var}: '{value}' is not a whole number")]
    InvalidNumber { var: &'static str, value: String },
    #[error("{var}: '{value}' is not an http(s) URL")]
    InvalidEndpoint { var: &'static str, value: String },
    #[error("failed to build HTTP client: {0}")]
    HttpClient(#[from] reqwest::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderKind {
    Remote,
    Simulated,
}

impl FromStr for ProviderKind {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "remote" => Ok(ProviderKind::Remote),
            "simulated" | "simulate" | "offline" => Ok(ProviderKind::Simulated),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub endpoint: String,
    pub provider: ProviderKind,
    /// `None` disables the request timeout.
    pub timeout: Option<Duration>,
    pub simulated_delay: Duration,
    pub language: Language,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            provider: ProviderKind::Remote,
            timeout: Some(Duration::from_secs(DEFAULT_TIMEOUT_SECS)),
            simulated_delay: Duration::from_millis(DEFAULT_SIMULATED_DELAY_MS),
            language: Language::default(),
        }
    }
}

impl AppConfig {
    /// Reads the process environment. `main` loads `.env` into it first so
    /// `RUST_LOG` from the file reaches the logger too.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the config from any key/value source, falling back to the
    /// defaults for missing keys.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let endpoint = match lookup("PARKING_ANALYZER_ENDPOINT") {
            Some(value) => {
                let value = value.trim().to_string();
                if !(value.starts_with("http://") || value.starts_with("https://")) {
                    return Err(ConfigError::InvalidEndpoint {
                        var: "PARKING_ANALYZER_ENDPOINT",
                        value,
                    });
                }
                value
            }
            None => defaults.endpoint,
        };

        let provider = match lookup("PARKING_ANALYZER_PROVIDER") {
            Some(value) => {
                value
                    .parse::<ProviderKind>()
                    .map_err(|_| ConfigError::UnknownProvider {
                        var: "PARKING_ANALYZER_PROVIDER",
                        value,
                    })?
            }
            None => defaults.provider,
        };

        let timeout = match lookup("PARKING_ANALYZER_TIMEOUT_SECS") {
            Some(value) => match parse_number("PARKING_ANALYZER_TIMEOUT_SECS", value)? {
                0 => None,
                secs => Some(Duration::from_secs(secs)),
            },
            None => defaults.timeout,
        };

        let simulated_delay = match lookup("PARKING_ANALYZER_SIMULATED_DELAY_MS") {
            Some(value) => Duration::from_millis(parse_number(
                "PARKING_ANALYZER_SIMULATED_DELAY_MS",
                value,
            )?),
            None => defaults.simulated_delay,
        };

        let language = match lookup("PARKING_ANALYZER_LANGUAGE") {
            Some(value) => value
                .parse::<Language>()
                .map_err(|reason| ConfigError::InvalidLanguage {
                    var: "PARKING_ANALYZER_LANGUAGE",
                    reason,
                })?,
            None => defaults.language,
        };

        Ok(Self {
            endpoint,
            provider,
            timeout,
            simulated_delay,
            language,
        })
    }

    pub fn build_provider(&self) -> Result<Arc<dyn AnalysisProvider>, ConfigError> {
        let provider: Arc<dyn AnalysisProvider> = match self.provider {
            ProviderKind::Remote => Arc::new(RemoteProvider::new(&self.endpoint, self.timeout)?),
            ProviderKind::Simulated => Arc::new(SimulatedProvider::new(self.simulated_delay)),
        };
        Ok(provider)
    }
}

fn parse_number(var: &'static str, value: String) -> Result<u64, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::InvalidNumber { var, value })
}
