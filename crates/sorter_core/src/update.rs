use crate::classify::{classify, detect_terminal, display_text, is_stream_end, TerminalSignal};
use crate::{
    AppState, DownloadStatus, Effect, EventOrigin, EventStatus, Msg, ValidationError,
    WorkflowError, WorkflowState,
};

const EXHAUSTED_NOTICE: &str = "Max reconnection attempts reached.";

/// Pure update function: applies a message to state and returns any effects.
pub fn update(mut state: AppState, msg: Msg) -> (AppState, Vec<Effect>) {
    let effects = match msg {
        Msg::FilesStaged(files) => {
            if !matches!(state.phase(), WorkflowState::Idle | WorkflowState::Staged) {
                reject(&mut state, ValidationError::NotAccepting);
                return (state, Vec::new());
            }
            let stats = state.stage(files);
            if stats.accepted > 0 {
                clear_validation_error(&mut state);
                if state.phase() == WorkflowState::Idle {
                    state.set_phase(WorkflowState::Staged);
                }
            }
            Vec::new()
        }
        Msg::PreviewRequested { index } => match state.ensure_preview(index) {
            Some((handle, path)) => vec![Effect::CreatePreview { handle, path }],
            None => Vec::new(),
        },
        Msg::StagedFileRemoved { index } => {
            if state.phase().is_busy() {
                reject(&mut state, ValidationError::Busy);
                return (state, Vec::new());
            }
            let len = state.staged().len();
            let Some(removed) = state.remove_staged(index) else {
                reject(&mut state, ValidationError::IndexOutOfRange { index, len });
                return (state, Vec::new());
            };
            if state.staged().is_empty() && state.phase() == WorkflowState::Staged {
                state.set_phase(WorkflowState::Idle);
            }
            removed
                .preview
                .map(|handle| vec![Effect::ReleasePreview { handle }])
                .unwrap_or_default()
        }
        Msg::StagedCleared => {
            if state.phase().is_busy() {
                reject(&mut state, ValidationError::Busy);
                return (state, Vec::new());
            }
            let handles = state.clear_staged();
            if state.phase() == WorkflowState::Staged {
                state.set_phase(WorkflowState::Idle);
            }
            handles
                .into_iter()
                .map(|handle| Effect::ReleasePreview { handle })
                .collect()
        }
        Msg::SubmitClicked => {
            if state.phase().is_busy() {
                reject(&mut state, ValidationError::Busy);
                return (state, Vec::new());
            }
            if state.staged().is_empty() {
                reject(&mut state, ValidationError::NoStagedFiles);
                return (state, Vec::new());
            }
            let files = state.staged().iter().map(|file| file.path.clone()).collect();
            let ticket = state.begin_submission();
            vec![Effect::SubmitJob { ticket, files }]
        }
        Msg::SubmitSucceeded { ticket, job_id } => {
            if !is_pending_submission(&state, ticket) {
                return (state, Vec::new());
            }
            state.assign_job(job_id.clone());
            vec![Effect::OpenStream { job_id }]
        }
        Msg::SubmitFailed { ticket, detail } => {
            if !is_pending_submission(&state, ticket) {
                return (state, Vec::new());
            }
            let error = WorkflowError::Submission { detail };
            state.fail(error.clone());
            vec![Effect::NotifyFailed { error }]
        }
        Msg::StreamMessage {
            job_id,
            raw,
            received_at,
        } => {
            if !state.is_current_job(&job_id) || is_stream_end(&raw) {
                return (state, Vec::new());
            }
            let status = classify(&raw);
            let signal = detect_terminal(&raw);
            let message = display_text(&raw);
            state.append_event(raw, status, EventOrigin::Server, received_at);

            // Terminal states keep logging but never transition again.
            if state.phase() != WorkflowState::Streaming {
                return (state, Vec::new());
            }
            match signal {
                Some(TerminalSignal::Failure) => {
                    fail_stream(&mut state, WorkflowError::StreamTerminal { message })
                }
                Some(TerminalSignal::Completion) if !state.is_success_pending() => {
                    state.set_success_pending(true);
                    vec![Effect::StartSuccessDebounce {
                        job_id,
                        delay: state.settings().success_debounce,
                    }]
                }
                _ => Vec::new(),
            }
        }
        Msg::StreamInterrupted {
            job_id,
            attempt,
            max_attempts,
            delay,
            received_at,
        } => {
            if state.is_current_job(&job_id) {
                let notice = format!(
                    "Connection lost. Retrying in {}ms (attempt {attempt}/{max_attempts})...",
                    delay.as_millis()
                );
                state.append_event(notice, EventStatus::Error, EventOrigin::Local, received_at);
            }
            Vec::new()
        }
        Msg::StreamEnded { .. } => Vec::new(),
        Msg::StreamFailed {
            job_id,
            message,
            received_at,
        } => {
            // A pending success already saw the completion phrase; let it land.
            if !state.is_current_job(&job_id)
                || state.phase() != WorkflowState::Streaming
                || state.is_success_pending()
            {
                return (state, Vec::new());
            }
            state.append_event(
                EXHAUSTED_NOTICE,
                EventStatus::Error,
                EventOrigin::Local,
                received_at,
            );
            fail_stream(&mut state, WorkflowError::StreamTerminal { message })
        }
        Msg::SuccessDebounceElapsed { job_id } => {
            if !state.is_current_job(&job_id)
                || state.phase() != WorkflowState::Streaming
                || !state.is_success_pending()
            {
                return (state, Vec::new());
            }
            clear_validation_error(&mut state);
            match state.succeed() {
                Some(artifact) => vec![Effect::CloseStream, Effect::NotifySucceeded { artifact }],
                None => Vec::new(),
            }
        }
        Msg::DownloadClicked => {
            let ready = match (state.phase(), state.artifact()) {
                (WorkflowState::Succeeded, Some(artifact)) => Some(artifact.clone()),
                _ => None,
            };
            let Some(artifact) = ready else {
                reject(&mut state, ValidationError::NoArtifactReady);
                return (state, Vec::new());
            };
            if state.download() == Some(&DownloadStatus::InFlight) {
                return (state, Vec::new());
            }
            state.set_download(Some(DownloadStatus::InFlight));
            if matches!(
                state.error(),
                Some(WorkflowError::Retrieval { .. }) | Some(WorkflowError::Validation(_))
            ) {
                state.set_error(None);
            }
            vec![Effect::FetchArtifact {
                job_id: artifact.job_id,
                url: artifact.url.to_string(),
                filename: artifact.filename,
            }]
        }
        Msg::DownloadFinished { job_id, result } => {
            if !state.is_current_job(&job_id) || state.phase() != WorkflowState::Succeeded {
                return (state, Vec::new());
            }
            match result {
                Ok(path) => {
                    state.set_download(Some(DownloadStatus::Saved { path }));
                    clear_validation_error(&mut state);
                }
                Err(detail) => {
                    state.set_download(Some(DownloadStatus::Failed {
                        detail: detail.clone(),
                    }));
                    state.set_error(Some(WorkflowError::Retrieval { detail }));
                }
            }
            Vec::new()
        }
        Msg::ResetClicked => {
            let handles = state.reset();
            let mut effects = Vec::with_capacity(2 + handles.len());
            effects.push(Effect::CloseStream);
            effects.push(Effect::CancelSuccessDebounce);
            effects.extend(
                handles
                    .into_iter()
                    .map(|handle| Effect::ReleasePreview { handle }),
            );
            effects
        }
        Msg::NoOp => Vec::new(),
    };

    (state, effects)
}

fn is_pending_submission(state: &AppState, ticket: crate::SubmissionTicket) -> bool {
    state.phase() == WorkflowState::Submitting && state.current_ticket() == ticket
}

fn fail_stream(state: &mut AppState, error: WorkflowError) -> Vec<Effect> {
    let mut effects = Vec::with_capacity(3);
    if state.is_success_pending() {
        effects.push(Effect::CancelSuccessDebounce);
    }
    state.fail(error.clone());
    effects.push(Effect::CloseStream);
    effects.push(Effect::NotifyFailed { error });
    effects
}

/// Records a validation error without hiding a terminal failure.
fn reject(state: &mut AppState, error: ValidationError) {
    match state.error() {
        Some(WorkflowError::Submission { .. }) | Some(WorkflowError::StreamTerminal { .. }) => {}
        _ => state.set_error(Some(error.into())),
    }
}

fn clear_validation_error(state: &mut AppState) {
    if matches!(state.error(), Some(WorkflowError::Validation(_))) {
        state.set_error(None);
    }
}
