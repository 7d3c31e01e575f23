use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SubmissionError {
    #[error("no files to submit")]
    EmptyBatch,
    #[error("could not read {path}: {message}")]
    Unreadable { path: String, message: String },
    #[error("network error: {0}")]
    Network(String),
    #[error("submission timed out")]
    Timeout,
    #[error("processor returned http status {status}")]
    HttpStatus { status: u16, detail: Option<String> },
    #[error("invalid submission response: {0}")]
    InvalidResponse(String),
}

impl SubmissionError {
    /// Human-readable reason, preferring the processor's own `detail` text.
    pub fn user_detail(&self) -> String {
        match self {
            SubmissionError::HttpStatus {
                detail: Some(detail),
                ..
            } => detail.clone(),
            other => other.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StreamError {
    #[error("could not connect: {0}")]
    Connect(String),
    #[error("event stream returned http status {0}")]
    HttpStatus(u16),
    #[error("read failed: {0}")]
    Read(String),
    #[error("stream closed without end marker")]
    UnexpectedEof,
    #[error("a stream is already open for job {job_id}")]
    AlreadyOpen { job_id: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RetrievalError {
    #[error("invalid artifact url: {0}")]
    InvalidUrl(String),
    #[error("network error: {0}")]
    Network(String),
    #[error("download timed out")]
    Timeout,
    #[error("http status {0}")]
    HttpStatus(u16),
    #[error("could not save artifact: {0}")]
    Persist(String),
}

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("failed to start engine runtime: {0}")]
    Runtime(#[from] std::io::Error),
    #[error("failed to build http client: {0}")]
    Client(String),
}
