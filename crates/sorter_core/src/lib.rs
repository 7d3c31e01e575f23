//! Receipt sorter core: pure workflow state machine, event classifier and
//! progress log.
//!
//! Nothing here performs IO or reads a clock. Timers, network calls and
//! stream connections are requested through [`Effect`]s and report back as
//! [`Msg`]s, so every transition can be driven deterministically in tests.
pub mod classify;
mod effect;
mod error;
mod msg;
mod progress_log;
mod state;
mod update;
mod view_model;

pub use classify::{
    classify, detect_terminal, display_text, EventStatus, TerminalSignal, STREAM_END,
};
pub use effect::Effect;
pub use error::{ValidationError, WorkflowError};
pub use msg::Msg;
pub use progress_log::{EventOrigin, ProgressEvent, ProgressLog};
pub use state::{
    artifact_filename, artifact_url, is_image_name, AppState, Artifact, DownloadStatus,
    FileSelection, JobId, PreviewHandle, StageStats, StagedFile, SubmissionTicket,
    WorkflowSettings, WorkflowState, DEFAULT_SUCCESS_DEBOUNCE,
};
pub use update::update;
pub use view_model::{AppViewModel, StagedFileView};
