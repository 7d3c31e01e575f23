use std::path::{Path, PathBuf};

use futures_util::StreamExt;
use reqwest::header::CONTENT_DISPOSITION;
use sorter_logging::{sorter_debug, sorter_info};

use crate::filename::{artifact_filename, disposition_filename};
use crate::{AtomicFileWriter, ClientSettings, EngineError, RetrievalError, SavedArtifact};

#[async_trait::async_trait]
pub trait ArtifactFetcher: Send + Sync {
    /// Downloads `url` into `output_dir`. `fallback_filename` is used when the
    /// server does not name the file.
    async fn fetch(
        &self,
        url: &str,
        output_dir: &Path,
        fallback_filename: &str,
    ) -> Result<SavedArtifact, RetrievalError>;
}

#[derive(Debug, Clone)]
pub struct ReqwestArtifactFetcher {
    client: reqwest::Client,
}

impl ReqwestArtifactFetcher {
    pub fn new(settings: &ClientSettings) -> Result<Self, EngineError> {
        let client = reqwest::Client::builder()
            .connect_timeout(settings.connect_timeout)
            .timeout(settings.request_timeout)
            .build()
            .map_err(|err| EngineError::Client(err.to_string()))?;
        Ok(Self { client })
    }
}

#[async_trait::async_trait]
impl ArtifactFetcher for ReqwestArtifactFetcher {
    async fn fetch(
        &self,
        url: &str,
        output_dir: &Path,
        fallback_filename: &str,
    ) -> Result<SavedArtifact, RetrievalError> {
        let parsed =
            reqwest::Url::parse(url).map_err(|err| RetrievalError::InvalidUrl(err.to_string()))?;
        sorter_debug!("Fetching artifact {}", parsed);

        let response = self
            .client
            .get(parsed)
            .send()
            .await
            .map_err(map_reqwest_error)?;
        let status = response.status();
        if !status.is_success() {
            return Err(RetrievalError::HttpStatus(status.as_u16()));
        }

        let server_filename = response
            .headers()
            .get(CONTENT_DISPOSITION)
            .and_then(|value| value.to_str().ok())
            .and_then(disposition_filename);
        let filename = artifact_filename(server_filename.as_deref(), fallback_filename);

        let mut bytes = Vec::new();
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(map_reqwest_error)?;
            bytes.extend_from_slice(&chunk);
        }

        let byte_len = bytes.len() as u64;
        let path = write_artifact(output_dir.to_path_buf(), filename, bytes).await?;
        sorter_info!("Saved {} bytes to {}", byte_len, path.display());
        Ok(SavedArtifact {
            path,
            byte_len,
            server_filename,
        })
    }
}

async fn write_artifact(
    dir: PathBuf,
    filename: String,
    bytes: Vec<u8>,
) -> Result<PathBuf, RetrievalError> {
    tokio::task::spawn_blocking(move || AtomicFileWriter::new(dir).write(&filename, &bytes))
        .await
        .map_err(|err| RetrievalError::Persist(err.to_string()))?
        .map_err(|err| RetrievalError::Persist(err.to_string()))
}

fn map_reqwest_error(err: reqwest::Error) -> RetrievalError {
    if err.is_timeout() {
        return RetrievalError::Timeout;
    }
    RetrievalError::Network(err.to_string())
}
