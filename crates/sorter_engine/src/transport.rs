use std::collections::VecDeque;

use futures_util::stream::{self, BoxStream};
use futures_util::StreamExt;
use reqwest::header::{ACCEPT, CACHE_CONTROL};
use sorter_logging::sorter_debug;

use crate::sse::SseDecoder;
use crate::{ClientSettings, EngineError, StreamError};

/// Payloads of one live connection, in the order the processor sent them.
/// The stream ending (or yielding an error) means the connection dropped.
pub type LineStream = BoxStream<'static, Result<String, StreamError>>;

#[async_trait::async_trait]
pub trait EventTransport: Send + Sync {
    async fn connect(&self, job_id: &str) -> Result<LineStream, StreamError>;
}

/// Server-sent events over HTTP: `GET {base}/events/{job_id}`.
#[derive(Debug, Clone)]
pub struct SseTransport {
    client: reqwest::Client,
    settings: ClientSettings,
}

impl SseTransport {
    pub fn new(settings: ClientSettings) -> Result<Self, EngineError> {
        // No total timeout: the stream lives as long as the job does.
        let client = reqwest::Client::builder()
            .connect_timeout(settings.connect_timeout)
            .build()
            .map_err(|err| EngineError::Client(err.to_string()))?;
        Ok(Self { client, settings })
    }
}

#[async_trait::async_trait]
impl EventTransport for SseTransport {
    async fn connect(&self, job_id: &str) -> Result<LineStream, StreamError> {
        let url = self.settings.events_url(job_id);
        sorter_debug!("Opening event stream {}", url);

        let response = self
            .client
            .get(url)
            .header(ACCEPT, "text/event-stream")
            .header(CACHE_CONTROL, "no-cache")
            .send()
            .await
            .map_err(|err| StreamError::Connect(err.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(StreamError::HttpStatus(status.as_u16()));
        }

        let body = Box::pin(response.bytes_stream());
        let lines = stream::unfold(
            (body, SseDecoder::new(), VecDeque::<String>::new(), false),
            |(mut body, mut decoder, mut ready, failed)| async move {
                loop {
                    if let Some(line) = ready.pop_front() {
                        return Some((Ok(line), (body, decoder, ready, failed)));
                    }
                    if failed {
                        return None;
                    }
                    match body.next().await {
                        Some(Ok(chunk)) => ready.extend(decoder.push(&chunk)),
                        Some(Err(err)) => {
                            let error = StreamError::Read(err.to_string());
                            return Some((Err(error), (body, decoder, ready, true)));
                        }
                        None => return None,
                    }
                }
            },
        );
        Ok(lines.boxed())
    }
}
