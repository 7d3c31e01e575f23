#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::Once;
use std::time::SystemTime;

use sorter_core::{update, AppState, Effect, FileSelection, JobId, Msg, WorkflowSettings};
use url::Url;

pub fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(sorter_logging::initialize_for_tests);
}

pub fn new_state() -> AppState {
    let base = Url::parse("http://127.0.0.1:8000").unwrap();
    AppState::new(WorkflowSettings::new(base))
}

pub fn selection(name: &str) -> FileSelection {
    FileSelection {
        name: name.to_string(),
        size_bytes: 2048,
        path: PathBuf::from(format!("/receipts/{name}")),
    }
}

pub fn stage(state: AppState, names: &[&str]) -> (AppState, Vec<Effect>) {
    update(
        state,
        Msg::FilesStaged(names.iter().map(|name| selection(name)).collect()),
    )
}

/// Stages files, submits, and answers the submission with `job_id`.
pub fn streaming(names: &[&str], job_id: &str) -> AppState {
    let (state, _) = stage(new_state(), names);
    let (state, effects) = update(state, Msg::SubmitClicked);
    let ticket = submit_ticket(&effects).expect("submit effect");
    let (state, _) = update(
        state,
        Msg::SubmitSucceeded {
            ticket,
            job_id: JobId::new(job_id),
        },
    );
    state
}

pub fn submit_ticket(effects: &[Effect]) -> Option<u64> {
    effects.iter().find_map(|effect| match effect {
        Effect::SubmitJob { ticket, .. } => Some(*ticket),
        _ => None,
    })
}

pub fn line(job_id: &str, raw: &str) -> Msg {
    Msg::StreamMessage {
        job_id: JobId::new(job_id),
        raw: raw.to_string(),
        received_at: SystemTime::UNIX_EPOCH,
    }
}

pub fn count_succeeded(effects: &[Effect]) -> usize {
    effects
        .iter()
        .filter(|effect| matches!(effect, Effect::NotifySucceeded { .. }))
        .count()
}

pub fn count_failed(effects: &[Effect]) -> usize {
    effects
        .iter()
        .filter(|effect| matches!(effect, Effect::NotifyFailed { .. }))
        .count()
}
