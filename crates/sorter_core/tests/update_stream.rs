mod common;

use std::path::PathBuf;
use std::time::{Duration, SystemTime};

use common::{
    count_failed, count_succeeded, init_logging, line, new_state, stage, streaming, submit_ticket,
};
use pretty_assertions::assert_eq;
use sorter_core::{
    update, DownloadStatus, Effect, EventOrigin, EventStatus, JobId, Msg, WorkflowError,
    WorkflowState, DEFAULT_SUCCESS_DEBOUNCE,
};

fn debounce_elapsed(job_id: &str) -> Msg {
    Msg::SuccessDebounceElapsed {
        job_id: JobId::new(job_id),
    }
}

fn interrupted(job_id: &str, attempt: u32) -> Msg {
    Msg::StreamInterrupted {
        job_id: JobId::new(job_id),
        attempt,
        max_attempts: 5,
        delay: Duration::from_millis(1000),
        received_at: SystemTime::UNIX_EPOCH,
    }
}

#[test]
fn submit_success_opens_stream_for_job() {
    init_logging();
    let (state, _) = stage(new_state(), &["a.jpg"]);
    let (state, effects) = update(state, Msg::SubmitClicked);
    let ticket = submit_ticket(&effects).unwrap();

    let (state, effects) = update(
        state,
        Msg::SubmitSucceeded {
            ticket,
            job_id: JobId::new("abc123"),
        },
    );
    assert_eq!(state.phase(), WorkflowState::Streaming);
    assert_eq!(state.job_id(), Some(&JobId::new("abc123")));
    assert_eq!(
        effects,
        vec![Effect::OpenStream {
            job_id: JobId::new("abc123")
        }]
    );
}

#[test]
fn submit_failure_fails_without_opening_stream() {
    init_logging();
    let (state, _) = stage(new_state(), &["a.jpg"]);
    let (state, effects) = update(state, Msg::SubmitClicked);
    let ticket = submit_ticket(&effects).unwrap();

    let (state, effects) = update(
        state,
        Msg::SubmitFailed {
            ticket,
            detail: "No files uploaded".to_string(),
        },
    );
    let error = WorkflowError::Submission {
        detail: "No files uploaded".to_string(),
    };
    assert_eq!(state.phase(), WorkflowState::Failed);
    assert_eq!(state.error(), Some(&error));
    assert_eq!(effects, vec![Effect::NotifyFailed { error }]);

    // The batch is kept so the user can resubmit.
    let (state, effects) = update(state, Msg::SubmitClicked);
    assert_eq!(state.phase(), WorkflowState::Submitting);
    assert_eq!(submit_ticket(&effects), Some(ticket + 1));
    assert!(state.error().is_none());
}

#[test]
fn late_submission_response_after_reset_is_ignored() {
    init_logging();
    let (state, _) = stage(new_state(), &["a.jpg"]);
    let (state, effects) = update(state, Msg::SubmitClicked);
    let ticket = submit_ticket(&effects).unwrap();
    let (state, _) = update(state, Msg::ResetClicked);

    let (state, effects) = update(
        state,
        Msg::SubmitSucceeded {
            ticket,
            job_id: JobId::new("late"),
        },
    );
    assert!(effects.is_empty());
    assert_eq!(state.phase(), WorkflowState::Idle);
    assert!(state.job_id().is_none());
}

#[test]
fn scenario_completion_reaches_succeeded_once() {
    init_logging();
    let state = streaming(&["a.jpg", "b.jpg", "c.jpg"], "abc123");

    let (state, effects) = update(state, line("abc123", "Sorting receipts..."));
    assert!(effects.is_empty());

    let (state, effects) = update(state, line("abc123", "Processing complete! \u{1F389}"));
    assert_eq!(
        effects,
        vec![Effect::StartSuccessDebounce {
            job_id: JobId::new("abc123"),
            delay: DEFAULT_SUCCESS_DEBOUNCE,
        }]
    );
    assert_eq!(state.phase(), WorkflowState::Streaming);
    assert!(state.view().finalizing);

    let (state, effects) = update(state, debounce_elapsed("abc123"));
    assert_eq!(state.phase(), WorkflowState::Succeeded);
    assert_eq!(count_succeeded(&effects), 1);
    assert!(effects.contains(&Effect::CloseStream));

    let artifact = state.artifact().unwrap();
    assert!(artifact.url.as_str().contains("abc123"));
    assert_eq!(
        artifact.url.as_str(),
        "http://127.0.0.1:8000/download/sorted_receipts_abc123.docx"
    );

    let statuses: Vec<_> = state.log().all().iter().map(|e| e.status).collect();
    assert_eq!(
        statuses,
        vec![EventStatus::Processing, EventStatus::Completed]
    );
}

#[test]
fn trailing_messages_never_refire_success() {
    init_logging();
    let state = streaming(&["a.jpg"], "job-1");
    let mut total_succeeded = 0;
    let mut debounces = 0;

    let mut state = state;
    for raw in [
        "\u{2705} Word document saved as 'x.docx'",
        "\u{1F389} Processing complete! Ready for download.",
        "Ready for download",
    ] {
        let (next, effects) = update(state, line("job-1", raw));
        debounces += effects
            .iter()
            .filter(|e| matches!(e, Effect::StartSuccessDebounce { .. }))
            .count();
        state = next;
    }
    assert_eq!(debounces, 1);

    let (state, effects) = update(state, debounce_elapsed("job-1"));
    total_succeeded += count_succeeded(&effects);

    let mut state = state;
    for raw in ["Processing complete!", "Ready for download"] {
        let (next, effects) = update(state, line("job-1", raw));
        total_succeeded += count_succeeded(&effects);
        assert!(effects.is_empty());
        state = next;
    }
    let (state, effects) = update(state, debounce_elapsed("job-1"));
    total_succeeded += count_succeeded(&effects);

    assert_eq!(total_succeeded, 1);
    assert_eq!(state.phase(), WorkflowState::Succeeded);
    // Audit: trailing lines are still logged.
    assert_eq!(state.log().len(), 5);
}

#[test]
fn scenario_failure_phrase_fails_immediately() {
    init_logging();
    let state = streaming(&["a.jpg"], "job-c");
    let (state, effects) = update(
        state,
        line("job-c", "\u{274C} Processing failed: corrupt image"),
    );

    assert_eq!(state.phase(), WorkflowState::Failed);
    assert_eq!(count_failed(&effects), 1);
    assert_eq!(count_succeeded(&effects), 0);
    assert!(effects.contains(&Effect::CloseStream));
    assert!(state.artifact().is_none());

    let entry = &state.log().all()[0];
    assert_eq!(entry.raw_message, "\u{274C} Processing failed: corrupt image");
    assert_eq!(entry.status, EventStatus::Error);
    assert_eq!(entry.origin, EventOrigin::Server);

    // Nothing afterwards can make it succeed.
    let (state, effects) = update(state, line("job-c", "Processing complete!"));
    assert!(effects.is_empty());
    let (state, effects) = update(state, debounce_elapsed("job-c"));
    assert!(effects.is_empty());
    assert_eq!(state.phase(), WorkflowState::Failed);
}

#[test]
fn failure_phrase_beats_completion_phrase_in_same_message() {
    init_logging();
    let state = streaming(&["a.jpg"], "job-x");
    let (state, effects) = update(
        state,
        line("job-x", "Processing complete? No: processing failed at export"),
    );
    assert_eq!(state.phase(), WorkflowState::Failed);
    assert_eq!(count_failed(&effects), 1);
    assert!(!effects
        .iter()
        .any(|e| matches!(e, Effect::StartSuccessDebounce { .. })));
}

#[test]
fn failure_during_debounce_cancels_pending_success() {
    init_logging();
    let state = streaming(&["a.jpg"], "job-d");
    let (state, _) = update(state, line("job-d", "Processing complete!"));
    let (state, effects) = update(state, line("job-d", "Processing failed: late crash"));

    assert_eq!(state.phase(), WorkflowState::Failed);
    assert_eq!(effects[0], Effect::CancelSuccessDebounce);
    let (state, effects) = update(state, debounce_elapsed("job-d"));
    assert!(effects.is_empty());
    assert_eq!(state.phase(), WorkflowState::Failed);
}

#[test]
fn per_file_errors_keep_streaming() {
    init_logging();
    let state = streaming(&["a.jpg", "b.jpg"], "job-e");
    let (state, effects) = update(
        state,
        line("job-e", "\u{274C} Error processing b.jpg: blurry"),
    );
    assert!(effects.is_empty());
    assert_eq!(state.phase(), WorkflowState::Streaming);
    assert_eq!(state.log().all()[0].status, EventStatus::Error);
}

#[test]
fn scenario_reconnect_exhaustion_fails_with_stream_terminal_error() {
    init_logging();
    let mut state = streaming(&["a.jpg"], "xyz");
    for attempt in 1..=5 {
        let (next, effects) = update(state, interrupted("xyz", attempt));
        assert!(effects.is_empty());
        assert_eq!(next.phase(), WorkflowState::Streaming);
        state = next;
    }
    let (state, effects) = update(
        state,
        Msg::StreamFailed {
            job_id: JobId::new("xyz"),
            message: "Connection failed after multiple attempts".to_string(),
            received_at: SystemTime::UNIX_EPOCH,
        },
    );

    assert_eq!(state.phase(), WorkflowState::Failed);
    assert_eq!(
        state.error(),
        Some(&WorkflowError::StreamTerminal {
            message: "Connection failed after multiple attempts".to_string()
        })
    );
    assert!(state.artifact().is_none());
    assert_eq!(count_failed(&effects), 1);

    // Five advisory entries plus the exhaustion notice, all local errors.
    assert_eq!(state.log().len(), 6);
    assert!(state
        .log()
        .all()
        .iter()
        .all(|e| e.origin == EventOrigin::Local && e.status == EventStatus::Error));

    let (state, effects) = update(
        state,
        Msg::StreamFailed {
            job_id: JobId::new("xyz"),
            message: "again".to_string(),
            received_at: SystemTime::UNIX_EPOCH,
        },
    );
    assert!(effects.is_empty());
    assert_eq!(state.log().len(), 6);
}

#[test]
fn exhaustion_during_pending_success_still_succeeds() {
    init_logging();
    let state = streaming(&["a.jpg"], "job-f");
    let (state, _) = update(state, line("job-f", "Processing complete!"));
    let (state, effects) = update(
        state,
        Msg::StreamFailed {
            job_id: JobId::new("job-f"),
            message: "gone".to_string(),
            received_at: SystemTime::UNIX_EPOCH,
        },
    );
    assert!(effects.is_empty());

    let (state, effects) = update(state, debounce_elapsed("job-f"));
    assert_eq!(state.phase(), WorkflowState::Succeeded);
    assert_eq!(count_succeeded(&effects), 1);
}

#[test]
fn events_from_a_previous_job_are_dropped() {
    init_logging();
    let state = streaming(&["a.jpg"], "old");
    let (state, _) = update(state, line("old", "Sorting receipts..."));
    let (state, _) = update(state, line("old", "\u{274C} Processing failed: boom"));
    assert_eq!(state.phase(), WorkflowState::Failed);

    // Resubmit the kept batch under a new job.
    let (state, effects) = update(state, Msg::SubmitClicked);
    let ticket = submit_ticket(&effects).unwrap();
    assert!(state.log().is_empty());
    let (state, _) = update(
        state,
        Msg::SubmitSucceeded {
            ticket,
            job_id: JobId::new("new"),
        },
    );

    let (state, effects) = update(state, line("old", "Processing complete!"));
    assert!(effects.is_empty());
    let (state, _) = update(state, interrupted("old", 2));
    let (state, effects) = update(state, debounce_elapsed("old"));
    assert!(effects.is_empty());

    assert!(state.log().is_empty());
    assert_eq!(state.phase(), WorkflowState::Streaming);
}

#[test]
fn reset_is_idempotent_from_any_state() {
    init_logging();
    let streaming_state = streaming(&["a.jpg", "b.jpg"], "job-r");
    let (streaming_state, _) = update(streaming_state, line("job-r", "Sorting receipts..."));
    let (staged_state, _) = stage(new_state(), &["a.jpg"]);
    let (failed_state, _) = update(
        streaming(&["a.jpg"], "job-q"),
        line("job-q", "Processing failed"),
    );

    for state in [new_state(), staged_state, streaming_state, failed_state] {
        let (state, effects) = update(state, Msg::ResetClicked);
        assert!(effects.contains(&Effect::CloseStream));
        assert!(effects.contains(&Effect::CancelSuccessDebounce));
        assert_eq!(state.phase(), WorkflowState::Idle);
        assert!(state.staged().is_empty());
        assert!(state.log().is_empty());
        assert!(state.job_id().is_none());
        assert!(state.artifact().is_none());
        assert!(state.error().is_none());

        let (state, _) = update(state, Msg::ResetClicked);
        assert_eq!(state.phase(), WorkflowState::Idle);
        assert!(state.staged().is_empty());
        assert!(state.log().is_empty());
    }
}

#[test]
fn download_is_user_initiated_and_failure_keeps_succeeded() {
    init_logging();
    let state = streaming(&["a.jpg"], "job-dl");
    let (state, _) = update(state, line("job-dl", "Processing complete!"));

    // Not ready yet.
    let (state, effects) = update(state, Msg::DownloadClicked);
    assert!(effects.is_empty());

    let (state, effects) = update(state, debounce_elapsed("job-dl"));
    assert!(!effects
        .iter()
        .any(|e| matches!(e, Effect::FetchArtifact { .. })));

    let (state, effects) = update(state, Msg::DownloadClicked);
    assert_eq!(
        effects,
        vec![Effect::FetchArtifact {
            job_id: JobId::new("job-dl"),
            url: "http://127.0.0.1:8000/download/sorted_receipts_job-dl.docx".to_string(),
            filename: "sorted_receipts_job-dl.docx".to_string(),
        }]
    );
    // A second click while the fetch is in flight does nothing.
    let (state, effects) = update(state, Msg::DownloadClicked);
    assert!(effects.is_empty());

    let (state, _) = update(
        state,
        Msg::DownloadFinished {
            job_id: JobId::new("job-dl"),
            result: Err("http status 502".to_string()),
        },
    );
    assert_eq!(state.phase(), WorkflowState::Succeeded);
    assert_eq!(
        state.error(),
        Some(&WorkflowError::Retrieval {
            detail: "http status 502".to_string()
        })
    );
    assert!(state.view().can_download);

    let (state, effects) = update(state, Msg::DownloadClicked);
    assert_eq!(effects.len(), 1);
    assert!(state.error().is_none());

    let (state, _) = update(
        state,
        Msg::DownloadFinished {
            job_id: JobId::new("job-dl"),
            result: Ok(PathBuf::from("/out/sorted-receipts.docx")),
        },
    );
    assert_eq!(
        state.download(),
        Some(&DownloadStatus::Saved {
            path: PathBuf::from("/out/sorted-receipts.docx")
        })
    );
}
