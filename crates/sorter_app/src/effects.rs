use std::path::PathBuf;
use std::sync::{mpsc, Arc};

use sorter_core::{Effect, JobId, Msg};
use sorter_engine::{ClientSettings, EngineError, EngineEvent, EngineHandle, EventSink, StreamEvent};
use sorter_logging::{sorter_debug, sorter_error, sorter_info};

/// Executes core effects on the engine and turns engine events back into messages.
pub struct EffectRunner {
    engine: EngineHandle,
    output_dir: PathBuf,
}

impl EffectRunner {
    pub fn new(
        settings: ClientSettings,
        output_dir: PathBuf,
        msg_tx: mpsc::Sender<Msg>,
    ) -> Result<Self, EngineError> {
        let engine = EngineHandle::new(settings, Arc::new(MsgSink { msg_tx }))?;
        Ok(Self { engine, output_dir })
    }

    pub fn run(&self, effects: Vec<Effect>) {
        for effect in effects {
            match effect {
                Effect::SubmitJob { ticket, files } => {
                    sorter_info!("SubmitJob ticket={} files={}", ticket, files.len());
                    self.engine.submit(ticket, files);
                }
                Effect::OpenStream { job_id } => {
                    sorter_info!("OpenStream job_id={}", job_id);
                    self.engine.open_stream(job_id.as_str());
                }
                Effect::CloseStream => self.engine.close_stream(),
                Effect::StartSuccessDebounce { job_id, delay } => {
                    self.engine.start_debounce(job_id.as_str(), delay);
                }
                Effect::CancelSuccessDebounce => self.engine.cancel_debounce(),
                Effect::NotifySucceeded { artifact } => {
                    sorter_info!("Job {} succeeded; artifact at {}", artifact.job_id, artifact.url);
                }
                Effect::NotifyFailed { error } => {
                    sorter_error!("Job failed: {}", error);
                }
                Effect::FetchArtifact {
                    job_id,
                    url,
                    filename,
                } => {
                    self.engine
                        .fetch_artifact(job_id.as_str(), url, self.output_dir.clone(), filename);
                }
                Effect::CreatePreview { handle, path } => {
                    // Terminal output has no thumbnails.
                    sorter_debug!("Preview {:?} requested for {}", handle, path.display());
                }
                Effect::ReleasePreview { handle } => {
                    sorter_debug!("Preview {:?} released", handle);
                }
            }
        }
    }
}

struct MsgSink {
    msg_tx: mpsc::Sender<Msg>,
}

impl EventSink for MsgSink {
    fn emit(&self, event: EngineEvent) {
        let _ = self.msg_tx.send(event_to_msg(event));
    }
}

pub fn event_to_msg(event: EngineEvent) -> Msg {
    match event {
        EngineEvent::SubmitCompleted { ticket, result } => match result {
            Ok(accepted) => Msg::SubmitSucceeded {
                ticket,
                job_id: JobId::new(accepted.job_id),
            },
            Err(err) => Msg::SubmitFailed {
                ticket,
                detail: err.user_detail(),
            },
        },
        EngineEvent::Stream(StreamEvent::Line {
            job_id,
            raw,
            received_at,
        }) => Msg::StreamMessage {
            job_id: JobId::new(job_id),
            raw,
            received_at,
        },
        EngineEvent::Stream(StreamEvent::Reconnecting {
            job_id,
            attempt,
            max_attempts,
            delay,
            at,
            ..
        }) => Msg::StreamInterrupted {
            job_id: JobId::new(job_id),
            attempt,
            max_attempts,
            delay,
            received_at: at,
        },
        EngineEvent::Stream(StreamEvent::Ended { job_id }) => Msg::StreamEnded {
            job_id: JobId::new(job_id),
        },
        EngineEvent::Stream(StreamEvent::Exhausted {
            job_id,
            attempts,
            last_error,
            at,
        }) => Msg::StreamFailed {
            job_id: JobId::new(job_id),
            message: format!(
                "Lost connection to the processor after {attempts} reconnect attempts ({last_error})"
            ),
            received_at: at,
        },
        EngineEvent::DebounceElapsed { job_id } => Msg::SuccessDebounceElapsed {
            job_id: JobId::new(job_id),
        },
        EngineEvent::ArtifactCompleted { job_id, result } => Msg::DownloadFinished {
            job_id: JobId::new(job_id),
            result: result
                .map(|saved| saved.path)
                .map_err(|err| err.to_string()),
        },
    }
}
