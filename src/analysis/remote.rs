use super::{AnalysisError, AnalysisProvider, Language};
use crate::upload::UploadedFile;
use async_trait::async_trait;
use log::{debug, error, info};
use reqwest::multipart::{Form, Part};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::time::Duration;

const EMPTY_RESULT: &str = "Analysis completed but no result returned.";

#[derive(Debug, Deserialize)]
struct AnalysisResponse {
    result: Option<String>,
    message: Option<String>,
}

impl AnalysisResponse {
    fn into_text(self) -> String {
        self.result
            .filter(|text| !text.is_empty())
            .or(self.message.filter(|text| !text.is_empty()))
            .unwrap_or_else(|| EMPTY_RESULT.to_string())
    }
}

/// Posts the image as multipart form data to an analysis endpoint.
#[derive(Debug, Clone)]
pub struct RemoteProvider {
    endpoint: String,
    client: Client,
}

impl RemoteProvider {
    /// `timeout` of `None` lets a request wait for as long as the server
    /// keeps the connection open.
    pub fn new(endpoint: impl Into<String>, timeout: Option<Duration>) -> reqwest::Result<Self> {
        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            endpoint: endpoint.into(),
            client: builder.build()?,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn build_form(image: &UploadedFile, language: Language) -> Result<Form, AnalysisError> {
        let part = Part::bytes(image.bytes.to_vec())
            .file_name(image.name.clone())
            .mime_str(&image.media_type)
            .map_err(|e| AnalysisError::Unknown(format!("invalid media type: {}", e)))?;

        Ok(Form::new()
            .part("image", part)
            .text("language", language.code()))
    }

    fn classify_status(&self, status: StatusCode) -> AnalysisError {
        match status {
            StatusCode::NOT_FOUND => AnalysisError::NotFound(self.endpoint.clone()),
            _ if status.is_server_error() => AnalysisError::Server(status.as_u16()),
            _ => AnalysisError::Unknown(format!("unexpected status: {}", status)),
        }
    }
}

#[async_trait]
impl AnalysisProvider for RemoteProvider {
    async fn analyze(
        &self,
        image: &UploadedFile,
        language: Language,
    ) -> Result<String, AnalysisError> {
        info!(
            "Sending {} ({} bytes) to {} in '{}'",
            image.name,
            image.size(),
            self.endpoint,
            language
        );

        let form = Self::build_form(image, language)?;
        let response = self
            .client
            .post(&self.endpoint)
            .multipart(form)
            .send()
            .await
            .map_err(|e| {
                error!("Analysis request failed: {}", e);
                AnalysisError::from_transport(e)
            })?;

        let status = response.status();
        if !status.is_success() {
            error!("Analysis endpoint answered with status: {}", status);
            return Err(self.classify_status(status));
        }

        let body = response.json::<AnalysisResponse>().await.map_err(|e| {
            error!("Failed to parse analysis response: {}", e);
            if e.is_timeout() {
                AnalysisError::Timeout
            } else {
                AnalysisError::Unknown(format!("invalid response body: {}", e))
            }
        })?;

        let text = body.into_text();
        debug!("Analysis result: {}", text);
        Ok(text)
    }

    fn name(&self) -> &'static str {
        "remote"
    }
}
