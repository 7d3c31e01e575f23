use std::fmt;
use std::path::PathBuf;
use std::time::{Duration, SystemTime};

use url::Url;

use crate::view_model::{AppViewModel, StagedFileView};
use crate::{EventOrigin, EventStatus, ProgressLog, WorkflowError};

/// Default wait between the first completion phrase and declaring success.
pub const DEFAULT_SUCCESS_DEBOUNCE: Duration = Duration::from_millis(500);

const IMAGE_EXTENSIONS: &[&str] = &[
    "jpg", "jpeg", "png", "gif", "webp", "bmp", "tif", "tiff", "heic", "heif",
];

/// Opaque job identifier assigned by the processor.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct JobId(String);

impl JobId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for JobId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for JobId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Identifies one submit attempt so late responses to an abandoned attempt
/// can be recognized and dropped.
pub type SubmissionTicket = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PreviewHandle(pub u64);

/// A file picked by the user, before it is staged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileSelection {
    pub name: String,
    pub size_bytes: u64,
    pub path: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagedFile {
    pub name: String,
    pub size_bytes: u64,
    pub path: PathBuf,
    pub preview: Option<PreviewHandle>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WorkflowState {
    #[default]
    Idle,
    Staged,
    Submitting,
    Streaming,
    Succeeded,
    Failed,
}

impl WorkflowState {
    pub fn is_terminal(self) -> bool {
        matches!(self, WorkflowState::Succeeded | WorkflowState::Failed)
    }

    /// Submission or streaming in flight; the batch must not change.
    pub fn is_busy(self) -> bool {
        matches!(self, WorkflowState::Submitting | WorkflowState::Streaming)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkflowSettings {
    /// Processor base URL; artifact locations are built from it.
    pub download_base: Url,
    pub success_debounce: Duration,
}

impl WorkflowSettings {
    pub fn new(download_base: Url) -> Self {
        Self {
            download_base,
            success_debounce: DEFAULT_SUCCESS_DEBOUNCE,
        }
    }
}

/// The finished document for a succeeded job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    pub job_id: JobId,
    pub url: Url,
    pub filename: String,
}

impl Artifact {
    pub fn for_job(base: &Url, job_id: &JobId) -> Self {
        Self {
            job_id: job_id.clone(),
            url: artifact_url(base, job_id),
            filename: artifact_filename(job_id),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DownloadStatus {
    InFlight,
    Saved { path: PathBuf },
    Failed { detail: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StageStats {
    pub accepted: usize,
    pub skipped: usize,
}

/// Name the processor gives the compiled document of a job.
pub fn artifact_filename(job_id: &JobId) -> String {
    format!("sorted_receipts_{job_id}.docx")
}

/// `{base}/download/{artifact_filename}`, with the filename percent-encoded
/// as a single path segment.
pub fn artifact_url(base: &Url, job_id: &JobId) -> Url {
    let mut url = base.clone();
    url.set_query(None);
    url.set_fragment(None);
    if let Ok(mut segments) = url.path_segments_mut() {
        segments
            .pop_if_empty()
            .push("download")
            .push(&artifact_filename(job_id));
    }
    url
}

/// Image check by file extension, case-insensitive.
pub fn is_image_name(name: &str) -> bool {
    name.rsplit_once('.')
        .map(|(_, ext)| {
            IMAGE_EXTENSIONS
                .iter()
                .any(|allowed| allowed.eq_ignore_ascii_case(ext))
        })
        .unwrap_or(false)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppState {
    settings: WorkflowSettings,
    phase: WorkflowState,
    staged: Vec<StagedFile>,
    next_preview: u64,
    ticket: SubmissionTicket,
    job_id: Option<JobId>,
    log: ProgressLog,
    success_pending: bool,
    artifact: Option<Artifact>,
    error: Option<WorkflowError>,
    download: Option<DownloadStatus>,
    last_stage_stats: Option<StageStats>,
    dirty: bool,
}

impl AppState {
    pub fn new(settings: WorkflowSettings) -> Self {
        Self {
            settings,
            phase: WorkflowState::Idle,
            staged: Vec::new(),
            next_preview: 0,
            ticket: 0,
            job_id: None,
            log: ProgressLog::new(),
            success_pending: false,
            artifact: None,
            error: None,
            download: None,
            last_stage_stats: None,
            dirty: false,
        }
    }

    pub fn settings(&self) -> &WorkflowSettings {
        &self.settings
    }

    pub fn phase(&self) -> WorkflowState {
        self.phase
    }

    pub fn staged(&self) -> &[StagedFile] {
        &self.staged
    }

    pub fn job_id(&self) -> Option<&JobId> {
        self.job_id.as_ref()
    }

    pub fn log(&self) -> &ProgressLog {
        &self.log
    }

    pub fn artifact(&self) -> Option<&Artifact> {
        self.artifact.as_ref()
    }

    pub fn error(&self) -> Option<&WorkflowError> {
        self.error.as_ref()
    }

    pub fn download(&self) -> Option<&DownloadStatus> {
        self.download.as_ref()
    }

    pub fn current_ticket(&self) -> SubmissionTicket {
        self.ticket
    }

    /// A completion phrase arrived and the debounce timer is running.
    pub fn is_success_pending(&self) -> bool {
        self.success_pending
    }

    pub fn view(&self) -> AppViewModel {
        AppViewModel {
            phase: self.phase,
            staged: self
                .staged
                .iter()
                .map(|file| StagedFileView {
                    name: file.name.clone(),
                    size_bytes: file.size_bytes,
                    has_preview: file.preview.is_some(),
                })
                .collect(),
            job_id: self.job_id.clone(),
            log: self.log.all().to_vec(),
            finalizing: self.success_pending,
            artifact_url: self.artifact.as_ref().map(|a| a.url.to_string()),
            error: self.error.as_ref().map(ToString::to_string),
            download: self.download.clone(),
            last_stage_stats: self.last_stage_stats,
            can_submit: !self.staged.is_empty()
                && matches!(
                    self.phase,
                    WorkflowState::Staged | WorkflowState::Succeeded | WorkflowState::Failed
                ),
            can_edit_batch: !self.phase.is_busy(),
            can_download: self.phase == WorkflowState::Succeeded
                && self.artifact.is_some()
                && self.download != Some(DownloadStatus::InFlight),
            dirty: self.dirty,
        }
    }

    /// Returns whether anything changed since the last call, and resets the flag.
    pub fn consume_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    pub(crate) fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    pub(crate) fn set_phase(&mut self, phase: WorkflowState) {
        if self.phase != phase {
            self.phase = phase;
            self.mark_dirty();
        }
    }

    pub(crate) fn set_error(&mut self, error: Option<WorkflowError>) {
        self.error = error;
        self.mark_dirty();
    }

    pub(crate) fn stage(&mut self, files: Vec<FileSelection>) -> StageStats {
        let mut stats = StageStats::default();
        for file in files {
            if is_image_name(&file.name) {
                self.staged.push(StagedFile {
                    name: file.name,
                    size_bytes: file.size_bytes,
                    path: file.path,
                    preview: None,
                });
                stats.accepted += 1;
            } else {
                stats.skipped += 1;
            }
        }
        self.last_stage_stats = Some(stats);
        self.mark_dirty();
        stats
    }

    /// Allocates the preview handle for a staged file if it has none yet.
    pub(crate) fn ensure_preview(&mut self, index: usize) -> Option<(PreviewHandle, PathBuf)> {
        let file = self.staged.get_mut(index)?;
        if file.preview.is_some() {
            return None;
        }
        self.next_preview += 1;
        let handle = PreviewHandle(self.next_preview);
        file.preview = Some(handle);
        self.dirty = true;
        Some((handle, file.path.clone()))
    }

    pub(crate) fn remove_staged(&mut self, index: usize) -> Option<StagedFile> {
        if index >= self.staged.len() {
            return None;
        }
        self.mark_dirty();
        Some(self.staged.remove(index))
    }

    /// Empties the staged list, returning every preview handle to release.
    pub(crate) fn clear_staged(&mut self) -> Vec<PreviewHandle> {
        let handles = self.staged.iter().filter_map(|file| file.preview).collect();
        self.staged.clear();
        self.last_stage_stats = None;
        self.mark_dirty();
        handles
    }

    /// Clears everything tied to the previous job and issues a new ticket.
    pub(crate) fn begin_submission(&mut self) -> SubmissionTicket {
        self.ticket += 1;
        self.job_id = None;
        self.log.clear();
        self.success_pending = false;
        self.artifact = None;
        self.error = None;
        self.download = None;
        self.set_phase(WorkflowState::Submitting);
        self.mark_dirty();
        self.ticket
    }

    pub(crate) fn assign_job(&mut self, job_id: JobId) {
        self.job_id = Some(job_id);
        self.set_phase(WorkflowState::Streaming);
    }

    pub(crate) fn is_current_job(&self, job_id: &JobId) -> bool {
        self.job_id.as_ref() == Some(job_id)
    }

    pub(crate) fn append_event(
        &mut self,
        raw: impl Into<String>,
        status: EventStatus,
        origin: EventOrigin,
        received_at: SystemTime,
    ) {
        self.log.append(raw, status, origin, received_at);
        self.mark_dirty();
    }

    pub(crate) fn set_success_pending(&mut self, pending: bool) {
        self.success_pending = pending;
        self.mark_dirty();
    }

    pub(crate) fn succeed(&mut self) -> Option<Artifact> {
        let job_id = self.job_id.clone()?;
        let artifact = Artifact::for_job(&self.settings.download_base, &job_id);
        self.artifact = Some(artifact.clone());
        self.success_pending = false;
        self.set_phase(WorkflowState::Succeeded);
        Some(artifact)
    }

    pub(crate) fn fail(&mut self, error: WorkflowError) {
        self.success_pending = false;
        self.error = Some(error);
        self.set_phase(WorkflowState::Failed);
        self.mark_dirty();
    }

    pub(crate) fn set_download(&mut self, status: Option<DownloadStatus>) {
        self.download = status;
        self.mark_dirty();
    }

    /// Back to `Idle`, returning every preview handle to release.
    pub(crate) fn reset(&mut self) -> Vec<PreviewHandle> {
        let handles = self.clear_staged();
        self.ticket += 1;
        self.job_id = None;
        self.log.clear();
        self.success_pending = false;
        self.artifact = None;
        self.error = None;
        self.download = None;
        self.phase = WorkflowState::Idle;
        self.mark_dirty();
        handles
    }
}
