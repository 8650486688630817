//! `Classifier` trait and the `reqwest` multipart implementation.
//!
//! The endpoint, form field name and timeout come from [`UploadConfig`];
//! nothing is hardcoded here.

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use thiserror::Error;

use super::response::ClassifyResponse;
use crate::config::UploadConfig;
use crate::wav::WavFile;

// ---------------------------------------------------------------------------
// UploadError
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum UploadError {
    /// HTTP transport or connection error.
    #[error("HTTP request failed: {0}")]
    Request(String),

    /// The request did not complete within the configured timeout.
    #[error("classification request timed out")]
    Timeout,

    /// The service answered with a non-success status.
    #[error("classifier returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    /// The response body did not match the expected schema.
    #[error("failed to parse classifier response: {0}")]
    Parse(String),
}

impl From<reqwest::Error> for UploadError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            UploadError::Timeout
        } else {
            UploadError::Request(e.to_string())
        }
    }
}

// ---------------------------------------------------------------------------
// Classifier trait
// ---------------------------------------------------------------------------

/// Sends WAV files for labelling.
///
/// Implementors must be `Send + Sync` so they can live behind
/// `Arc<dyn Classifier>` inside the orchestrator task.
#[async_trait]
pub trait Classifier: Send + Sync {
    async fn classify(&self, wav: &WavFile, filename: &str)
        -> Result<ClassifyResponse, UploadError>;

    /// Classify several files.  The default sends them one at a time and
    /// merges the answers; the first failing request ends the batch.
    async fn classify_many(
        &self,
        files: &[(&WavFile, &str)],
    ) -> Result<ClassifyResponse, UploadError> {
        let mut out = ClassifyResponse::default();
        for (wav, filename) in files {
            out.merge(self.classify(wav, filename).await?);
        }
        Ok(out)
    }
}

// ---------------------------------------------------------------------------
// HttpClassifier
// ---------------------------------------------------------------------------

/// Multipart `POST` of the WAV file to the configured endpoint.
pub struct HttpClassifier {
    client: reqwest::Client,
    config: UploadConfig,
}

impl HttpClassifier {
    /// Build a client with the per-request timeout from `config`.  Falls back
    /// to a default client if the builder fails.
    pub fn from_config(config: &UploadConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            client,
            config: config.clone(),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.config.endpoint
    }

    /// One multipart form with a part per file, all under the configured
    /// field name.
    fn form(&self, files: &[(&WavFile, &str)]) -> Result<Form, UploadError> {
        files.iter().try_fold(Form::new(), |form, (wav, filename)| {
            let part = Part::bytes(wav.as_bytes().to_vec())
                .file_name(filename.to_string())
                .mime_str("audio/wav")?;
            Ok::<_, UploadError>(form.part(self.config.field_name.clone(), part))
        })
    }

    async fn post(&self, form: Form) -> Result<ClassifyResponse, UploadError> {
        let response = self
            .client
            .post(&self.config.endpoint)
            .multipart(form)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(UploadError::Status {
                status: status.as_u16(),
                body,
            });
        }

        ClassifyResponse::from_json(&body)
    }
}

#[async_trait]
impl Classifier for HttpClassifier {
    async fn classify(
        &self,
        wav: &WavFile,
        filename: &str,
    ) -> Result<ClassifyResponse, UploadError> {
        self.classify_many(&[(wav, filename)]).await
    }

    async fn classify_many(
        &self,
        files: &[(&WavFile, &str)],
    ) -> Result<ClassifyResponse, UploadError> {
        let form = self.form(files)?;

        log::debug!(
            "upload: POST {} ({} file(s), {} bytes)",
            self.config.endpoint,
            files.len(),
            files.iter().map(|(wav, _)| wav.len()).sum::<usize>()
        );

        self.post(form).await
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
