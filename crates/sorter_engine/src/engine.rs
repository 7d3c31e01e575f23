use std::path::PathBuf;
use std::sync::{mpsc, Arc};
use std::thread;
use std::time::Duration;

use sorter_logging::{sorter_debug, sorter_info, sorter_warn};
use tokio::runtime::Runtime;
use tokio::task::JoinHandle;

use crate::{
    ArtifactFetcher, ClientSettings, EngineError, EngineEvent, EventSink, EventTransport, JobId,
    JobSubmitter, ReqwestArtifactFetcher, ReqwestSubmitter, SseTransport, StreamManager,
};

enum EngineCommand {
    Submit {
        ticket: u64,
        files: Vec<PathBuf>,
    },
    OpenStream {
        job_id: JobId,
    },
    CloseStream,
    StartDebounce {
        job_id: JobId,
        delay: Duration,
    },
    CancelDebounce,
    FetchArtifact {
        job_id: JobId,
        url: String,
        output_dir: PathBuf,
        fallback_filename: String,
    },
}

/// The IO services the engine drives. Swapped for scripted fakes in tests.
#[derive(Clone)]
pub struct EngineServices {
    pub submitter: Arc<dyn JobSubmitter>,
    pub transport: Arc<dyn EventTransport>,
    pub fetcher: Arc<dyn ArtifactFetcher>,
}

impl EngineServices {
    pub fn reqwest(settings: &ClientSettings) -> Result<Self, EngineError> {
        Ok(Self {
            submitter: Arc::new(ReqwestSubmitter::new(settings)?),
            transport: Arc::new(SseTransport::new(settings.clone())?),
            fetcher: Arc::new(ReqwestArtifactFetcher::new(settings)?),
        })
    }
}

/// Cheap to clone. The engine thread stops once every handle is dropped,
/// tearing down any open stream and timer with it.
#[derive(Clone)]
pub struct EngineHandle {
    cmd_tx: mpsc::Sender<EngineCommand>,
}

impl EngineHandle {
    pub fn new(settings: ClientSettings, sink: Arc<dyn EventSink>) -> Result<Self, EngineError> {
        let services = EngineServices::reqwest(&settings)?;
        Self::with_services(settings, services, sink)
    }

    pub fn with_services(
        settings: ClientSettings,
        services: EngineServices,
        sink: Arc<dyn EventSink>,
    ) -> Result<Self, EngineError> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .thread_name("sorter-engine-io")
            .build()?;
        let (cmd_tx, cmd_rx) = mpsc::channel();

        thread::Builder::new()
            .name("sorter-engine".into())
            .spawn(move || run_engine(runtime, settings, services, sink, cmd_rx))?;

        Ok(Self { cmd_tx })
    }

    pub fn submit(&self, ticket: u64, files: Vec<PathBuf>) {
        self.send(EngineCommand::Submit { ticket, files });
    }

    pub fn open_stream(&self, job_id: impl Into<JobId>) {
        self.send(EngineCommand::OpenStream {
            job_id: job_id.into(),
        });
    }

    pub fn close_stream(&self) {
        self.send(EngineCommand::CloseStream);
    }

    /// Emits [`EngineEvent::DebounceElapsed`] after `delay` unless cancelled
    /// or replaced by another debounce first.
    pub fn start_debounce(&self, job_id: impl Into<JobId>, delay: Duration) {
        self.send(EngineCommand::StartDebounce {
            job_id: job_id.into(),
            delay,
        });
    }

    pub fn cancel_debounce(&self) {
        self.send(EngineCommand::CancelDebounce);
    }

    pub fn fetch_artifact(
        &self,
        job_id: impl Into<JobId>,
        url: impl Into<String>,
        output_dir: PathBuf,
        fallback_filename: impl Into<String>,
    ) {
        self.send(EngineCommand::FetchArtifact {
            job_id: job_id.into(),
            url: url.into(),
            output_dir,
            fallback_filename: fallback_filename.into(),
        });
    }

    fn send(&self, command: EngineCommand) {
        if self.cmd_tx.send(command).is_err() {
            sorter_warn!("Engine thread is gone; command dropped");
        }
    }
}

fn run_engine(
    runtime: Runtime,
    settings: ClientSettings,
    services: EngineServices,
    sink: Arc<dyn EventSink>,
    cmd_rx: mpsc::Receiver<EngineCommand>,
) {
    let mut streams = StreamManager::new(
        runtime.handle().clone(),
        Arc::clone(&services.transport),
        settings.reconnect,
        settings.connect_grace,
    );
    let mut debounce: Option<JoinHandle<()>> = None;

    while let Ok(command) = cmd_rx.recv() {
        match command {
            EngineCommand::Submit { ticket, files } => {
                sorter_info!("Submitting batch #{} ({} file(s))", ticket, files.len());
                let submitter = Arc::clone(&services.submitter);
                let sink = Arc::clone(&sink);
                runtime.spawn(async move {
                    let result = submitter.submit(&files).await;
                    if let Err(err) = &result {
                        sorter_warn!("Submission #{} failed: {}", ticket, err);
                    }
                    sink.emit(EngineEvent::SubmitCompleted { ticket, result });
                });
            }
            EngineCommand::OpenStream { job_id } => {
                if let Err(err) = streams.open(&job_id, Arc::clone(&sink)) {
                    sorter_warn!("Not opening stream: {}", err);
                }
            }
            EngineCommand::CloseStream => streams.close(),
            EngineCommand::StartDebounce { job_id, delay } => {
                if let Some(previous) = debounce.take() {
                    previous.abort();
                }
                sorter_debug!("Success debounce for job {} armed ({:?})", job_id, delay);
                let sink = Arc::clone(&sink);
                debounce = Some(runtime.spawn(async move {
                    tokio::time::sleep(delay).await;
                    sink.emit(EngineEvent::DebounceElapsed { job_id });
                }));
            }
            EngineCommand::CancelDebounce => {
                if let Some(previous) = debounce.take() {
                    previous.abort();
                    sorter_debug!("Success debounce cancelled");
                }
            }
            EngineCommand::FetchArtifact {
                job_id,
                url,
                output_dir,
                fallback_filename,
            } => {
                sorter_info!("Downloading artifact for job {} from {}", job_id, url);
                let fetcher = Arc::clone(&services.fetcher);
                let sink = Arc::clone(&sink);
                runtime.spawn(async move {
                    let result = fetcher.fetch(&url, &output_dir, &fallback_filename).await;
                    if let Err(err) = &result {
                        sorter_warn!("Download for job {} failed: {}", job_id, err);
                    }
                    sink.emit(EngineEvent::ArtifactCompleted { job_id, result });
                });
            }
        }
    }

    streams.close();
    if let Some(previous) = debounce.take() {
        previous.abort();
    }
    sorter_info!("Engine stopped");
}
