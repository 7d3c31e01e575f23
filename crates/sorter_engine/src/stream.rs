//! Owns the live event-stream connection of the active job.
//!
//! [`StreamManager::open`] spawns one connection task per job. The task waits
//! out the connect grace period, then connects, forwards every payload to the
//! sink, and reconnects with exponential backoff when the connection drops.
//! Receiving a payload resets the attempt counter. Exceeding the reconnect
//! ceiling emits [`StreamEvent::Exhausted`] once and ends the task; the
//! end-of-stream marker ends it with [`StreamEvent::Ended`].
//!
//! Every task carries its own cancellation token. [`StreamManager::close`]
//! cancels it, which also cancels a pending reconnect timer, so a superseded
//! job never reconnects into a newer one.

use std::sync::Arc;
use std::time::{Duration, SystemTime};

use futures_util::StreamExt;
use sorter_logging::{sorter_debug, sorter_error, sorter_info, sorter_warn};
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::{
    EngineEvent, EventSink, EventTransport, JobId, ReconnectPolicy, StreamError, StreamEvent,
};

/// Payload the processor sends when it has nothing more for a job.
pub const STREAM_END_SENTINEL: &str = "[STREAM_END]";

struct ActiveStream {
    job_id: JobId,
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

pub struct StreamManager {
    runtime: Handle,
    transport: Arc<dyn EventTransport>,
    policy: ReconnectPolicy,
    grace: Duration,
    active: Option<ActiveStream>,
}

impl StreamManager {
    pub fn new(
        runtime: Handle,
        transport: Arc<dyn EventTransport>,
        policy: ReconnectPolicy,
        grace: Duration,
    ) -> Self {
        Self {
            runtime,
            transport,
            policy,
            grace,
            active: None,
        }
    }

    /// Starts streaming `job_id` into `sink`.
    ///
    /// Opening a different job closes the current one first. Opening the job
    /// that is already streaming is refused.
    pub fn open(&mut self, job_id: &str, sink: Arc<dyn EventSink>) -> Result<(), StreamError> {
        if self.active_job() == Some(job_id) {
            return Err(StreamError::AlreadyOpen {
                job_id: job_id.to_string(),
            });
        }
        self.close();

        let cancel = CancellationToken::new();
        let connection = Connection {
            job_id: job_id.to_string(),
            transport: Arc::clone(&self.transport),
            policy: self.policy,
            grace: self.grace,
            sink,
            cancel: cancel.clone(),
        };
        let task = self.runtime.spawn(connection.run());
        sorter_info!("Stream opened for job {}", job_id);
        self.active = Some(ActiveStream {
            job_id: job_id.to_string(),
            cancel,
            task,
        });
        Ok(())
    }

    /// Tears down the current connection and any pending reconnect.
    /// Safe to call at any time, any number of times.
    pub fn close(&mut self) {
        if let Some(active) = self.active.take() {
            active.cancel.cancel();
            active.task.abort();
            sorter_info!("Stream closed for job {}", active.job_id);
        }
    }

    /// Job whose connection task is still running.
    pub fn active_job(&self) -> Option<&str> {
        self.active
            .as_ref()
            .filter(|active| !active.task.is_finished())
            .map(|active| active.job_id.as_str())
    }
}

impl Drop for StreamManager {
    fn drop(&mut self) {
        self.close();
    }
}

struct Connection {
    job_id: JobId,
    transport: Arc<dyn EventTransport>,
    policy: ReconnectPolicy,
    grace: Duration,
    sink: Arc<dyn EventSink>,
    cancel: CancellationToken,
}

impl Connection {
    async fn run(self) {
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => return,
            _ = tokio::time::sleep(self.grace) => {}
        }

        let mut attempt: u32 = 0;
        loop {
            sorter_debug!(
                "Connecting event stream for job {} (attempt {})",
                self.job_id,
                attempt
            );
            let outcome = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => return,
                outcome = self.pump(&mut attempt) => outcome,
            };
            if self.cancel.is_cancelled() {
                return;
            }

            let reason = match outcome {
                Ok(()) => {
                    sorter_info!("Event stream for job {} ended normally", self.job_id);
                    self.emit(StreamEvent::Ended {
                        job_id: self.job_id.clone(),
                    });
                    return;
                }
                Err(reason) => reason,
            };

            if attempt >= self.policy.max_attempts {
                sorter_error!(
                    "Event stream for job {} gave up after {} reconnects: {}",
                    self.job_id,
                    attempt,
                    reason
                );
                self.emit(StreamEvent::Exhausted {
                    job_id: self.job_id.clone(),
                    attempts: attempt,
                    last_error: reason,
                    at: SystemTime::now(),
                });
                return;
            }

            attempt += 1;
            let delay = self.policy.delay_for(attempt);
            sorter_warn!(
                "Event stream for job {} dropped ({}); reconnecting in {:?} (attempt {}/{})",
                self.job_id,
                reason,
                delay,
                attempt,
                self.policy.max_attempts
            );
            self.emit(StreamEvent::Reconnecting {
                job_id: self.job_id.clone(),
                attempt,
                max_attempts: self.policy.max_attempts,
                delay,
                reason,
                at: SystemTime::now(),
            });

            tokio::select! {
                biased;
                _ = self.cancel.cancelled() => return,
                _ = tokio::time::sleep(delay) => {}
            }
        }
    }

    /// Runs one connection. `Ok` means the end marker arrived (or the task
    /// was cancelled mid-read); `Err` means the connection dropped.
    async fn pump(&self, attempt: &mut u32) -> Result<(), StreamError> {
        let mut lines = self.transport.connect(&self.job_id).await?;
        while let Some(item) = lines.next().await {
            let line = item?;
            if self.cancel.is_cancelled() {
                return Ok(());
            }
            if line.trim() == STREAM_END_SENTINEL {
                return Ok(());
            }
            *attempt = 0;
            self.emit(StreamEvent::Line {
                job_id: self.job_id.clone(),
                raw: line,
                received_at: SystemTime::now(),
            });
        }
        Err(StreamError::UnexpectedEof)
    }

    fn emit(&self, event: StreamEvent) {
        self.sink.emit(EngineEvent::Stream(event));
    }
}
