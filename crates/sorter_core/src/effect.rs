use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    SubmitJob {
        ticket: crate::SubmissionTicket,
        files: Vec<PathBuf>,
    },
    OpenStream { job_id: crate::JobId },
    /// Idempotent; also cancels any pending reconnect.
    CloseStream,
    StartSuccessDebounce {
        job_id: crate::JobId,
        delay: Duration,
    },
    CancelSuccessDebounce,
    NotifySucceeded { artifact: crate::Artifact },
    NotifyFailed { error: crate::WorkflowError },
    FetchArtifact {
        job_id: crate::JobId,
        url: String,
        filename: String,
    },
    CreatePreview {
        handle: crate::PreviewHandle,
        path: PathBuf,
    },
    ReleasePreview { handle: crate::PreviewHandle },
}
