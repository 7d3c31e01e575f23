use thiserror::Error;

/// Local precondition failures. These never reach the network.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("no files staged for submission")]
    NoStagedFiles,
    #[error("a job is already being submitted or processed")]
    Busy,
    #[error("files can only be added before a job is submitted; reset first")]
    NotAccepting,
    #[error("no staged file at index {index} (staged: {len})")]
    IndexOutOfRange { index: usize, len: usize },
    #[error("no file ready for download yet")]
    NoArtifactReady,
}

/// Failures surfaced to the user. Transient stream drops are not here: they
/// only show up as advisory log entries.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WorkflowError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("submission failed: {detail}")]
    Submission { detail: String },
    #[error("{message}")]
    StreamTerminal { message: String },
    #[error("download failed: {detail}")]
    Retrieval { detail: String },
}
