use std::path::PathBuf;
use std::time::{Duration, SystemTime};

use crate::{RetrievalError, StreamError, SubmissionError};

pub type JobId = String;

/// What the processor returns when it accepts a batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobTicket {
    pub job_id: JobId,
    pub stream_url: Option<String>,
    pub total_files: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamEvent {
    Line {
        job_id: JobId,
        raw: String,
        received_at: SystemTime,
    },
    /// The connection dropped; another attempt runs after `delay`.
    Reconnecting {
        job_id: JobId,
        attempt: u32,
        max_attempts: u32,
        delay: Duration,
        reason: StreamError,
        at: SystemTime,
    },
    /// The processor sent the end-of-stream marker.
    Ended { job_id: JobId },
    /// Reconnect ceiling reached. Emitted at most once per opened stream.
    Exhausted {
        job_id: JobId,
        attempts: u32,
        last_error: StreamError,
        at: SystemTime,
    },
}

impl StreamEvent {
    pub fn job_id(&self) -> &str {
        match self {
            StreamEvent::Line { job_id, .. }
            | StreamEvent::Reconnecting { job_id, .. }
            | StreamEvent::Ended { job_id }
            | StreamEvent::Exhausted { job_id, .. } => job_id,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SavedArtifact {
    pub path: PathBuf,
    pub byte_len: u64,
    pub server_filename: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    SubmitCompleted {
        ticket: u64,
        result: Result<JobTicket, SubmissionError>,
    },
    Stream(StreamEvent),
    DebounceElapsed {
        job_id: JobId,
    },
    ArtifactCompleted {
        job_id: JobId,
        result: Result<SavedArtifact, RetrievalError>,
    },
}
