use crate::{DownloadStatus, JobId, ProgressEvent, StageStats, WorkflowState};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppViewModel {
    pub phase: WorkflowState,
    pub staged: Vec<StagedFileView>,
    pub job_id: Option<JobId>,
    pub log: Vec<ProgressEvent>,
    /// Completion seen, waiting out the debounce before declaring success.
    pub finalizing: bool,
    pub artifact_url: Option<String>,
    pub error: Option<String>,
    pub download: Option<DownloadStatus>,
    pub last_stage_stats: Option<StageStats>,
    pub can_submit: bool,
    pub can_edit_batch: bool,
    pub can_download: bool,
    pub dirty: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagedFileView {
    pub name: String,
    pub size_bytes: u64,
    pub has_preview: bool,
}
