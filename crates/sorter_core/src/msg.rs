use std::path::PathBuf;
use std::time::{Duration, SystemTime};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Msg {
    /// User picked files (or a folder) to add to the batch.
    FilesStaged(Vec<crate::FileSelection>),
    /// A staged file is about to be shown and needs its preview.
    PreviewRequested { index: usize },
    /// User removed one staged file.
    StagedFileRemoved { index: usize },
    /// User cleared the staged batch.
    StagedCleared,
    /// User asked to process the staged batch.
    SubmitClicked,
    /// The processor accepted the batch.
    SubmitSucceeded {
        ticket: crate::SubmissionTicket,
        job_id: crate::JobId,
    },
    /// The submission call failed.
    SubmitFailed {
        ticket: crate::SubmissionTicket,
        detail: String,
    },
    /// One line from the job's event stream.
    StreamMessage {
        job_id: crate::JobId,
        raw: String,
        received_at: SystemTime,
    },
    /// The stream dropped and a reconnect is scheduled.
    StreamInterrupted {
        job_id: crate::JobId,
        attempt: u32,
        max_attempts: u32,
        delay: Duration,
        received_at: SystemTime,
    },
    /// The processor sent the end-of-stream sentinel.
    StreamEnded { job_id: crate::JobId },
    /// Reconnect attempts were exhausted.
    StreamFailed {
        job_id: crate::JobId,
        message: String,
        received_at: SystemTime,
    },
    /// The success debounce timer for a job fired.
    SuccessDebounceElapsed { job_id: crate::JobId },
    /// User asked to download the finished document.
    DownloadClicked,
    /// The artifact fetch finished.
    DownloadFinished {
        job_id: crate::JobId,
        result: Result<PathBuf, String>,
    },
    /// User clicked "clear all".
    ResetClicked,
    /// Fallback for placeholder wiring.
    NoOp,
}
