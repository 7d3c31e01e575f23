use std::path::PathBuf;

use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use sorter_logging::{sorter_debug, sorter_info, sorter_warn};

use crate::{ClientSettings, EngineError, JobTicket, SubmissionError};

/// Multipart field every image is attached under.
pub const UPLOAD_FIELD: &str = "files";

#[async_trait::async_trait]
pub trait JobSubmitter: Send + Sync {
    /// Uploads the batch in order and returns the processor's job ticket.
    async fn submit(&self, files: &[PathBuf]) -> Result<JobTicket, SubmissionError>;
}

#[derive(Debug, Deserialize)]
struct SubmitResponse {
    job_id: String,
    #[serde(default)]
    stream_url: Option<String>,
    #[serde(default)]
    total_files: Option<usize>,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    detail: serde_json::Value,
}

#[derive(Debug, Clone)]
pub struct ReqwestSubmitter {
    client: reqwest::Client,
    endpoint: url::Url,
}

impl ReqwestSubmitter {
    pub fn new(settings: &ClientSettings) -> Result<Self, EngineError> {
        let client = reqwest::Client::builder()
            .connect_timeout(settings.connect_timeout)
            .timeout(settings.request_timeout)
            .build()
            .map_err(|err| EngineError::Client(err.to_string()))?;
        Ok(Self {
            client,
            endpoint: settings.submit_url(),
        })
    }

    async fn build_form(files: &[PathBuf]) -> Result<Form, SubmissionError> {
        let mut form = Form::new();
        for path in files {
            let bytes =
                tokio::fs::read(path)
                    .await
                    .map_err(|err| SubmissionError::Unreadable {
                        path: path.display().to_string(),
                        message: err.to_string(),
                    })?;
            let name = path
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_else(|| "upload".to_string());
            let part = Part::bytes(bytes)
                .file_name(name.clone())
                .mime_str(mime_for(&name))
                .map_err(|err| SubmissionError::InvalidResponse(err.to_string()))?;
            form = form.part(UPLOAD_FIELD, part);
        }
        Ok(form)
    }
}

#[async_trait::async_trait]
impl JobSubmitter for ReqwestSubmitter {
    async fn submit(&self, files: &[PathBuf]) -> Result<JobTicket, SubmissionError> {
        if files.is_empty() {
            return Err(SubmissionError::EmptyBatch);
        }
        let form = Self::build_form(files).await?;
        sorter_debug!("Submitting {} file(s) to {}", files.len(), self.endpoint);

        let response = self
            .client
            .post(self.endpoint.clone())
            .multipart(form)
            .send()
            .await
            .map_err(map_reqwest_error)?;

        let status = response.status();
        let body = response.text().await.map_err(map_reqwest_error)?;
        if !status.is_success() {
            let detail = error_detail(&body);
            sorter_warn!(
                "Submission rejected with {}: {}",
                status,
                detail.as_deref().unwrap_or("<no detail>")
            );
            return Err(SubmissionError::HttpStatus {
                status: status.as_u16(),
                detail,
            });
        }

        let parsed: SubmitResponse = serde_json::from_str(&body)
            .map_err(|err| SubmissionError::InvalidResponse(err.to_string()))?;
        if parsed.job_id.trim().is_empty() {
            return Err(SubmissionError::InvalidResponse("empty job_id".into()));
        }
        sorter_info!(
            "Job {} accepted ({} file(s) registered, events at {})",
            parsed.job_id,
            parsed
                .total_files
                .map_or_else(|| "?".to_string(), |count| count.to_string()),
            parsed.stream_url.as_deref().unwrap_or("<default>")
        );
        Ok(JobTicket {
            job_id: parsed.job_id,
            stream_url: parsed.stream_url,
            total_files: parsed.total_files,
        })
    }
}

/// Pulls `detail` out of an error body; string details are used as-is.
fn error_detail(body: &str) -> Option<String> {
    let parsed: ErrorBody = serde_json::from_str(body).ok()?;
    match parsed.detail {
        serde_json::Value::String(text) if !text.trim().is_empty() => Some(text),
        serde_json::Value::Null => None,
        other => Some(other.to_string()),
    }
}

fn mime_for(name: &str) -> &'static str {
    let ext = name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "bmp" => "image/bmp",
        "tif" | "tiff" => "image/tiff",
        "heic" => "image/heic",
        "heif" => "image/heif",
        _ => "application/octet-stream",
    }
}

fn map_reqwest_error(err: reqwest::Error) -> SubmissionError {
    if err.is_timeout() {
        return SubmissionError::Timeout;
    }
    SubmissionError::Network(err.to_string())
}
