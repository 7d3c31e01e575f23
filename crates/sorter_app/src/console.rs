use std::io::{self, Write};

use chrono::{DateTime, Local};
use sorter_core::{
    display_text, AppViewModel, DownloadStatus, EventStatus, JobId, ProgressEvent, WorkflowState,
};

/// Prints view changes to the terminal. Each log entry is printed once, in
/// sequence order.
#[derive(Debug, Default)]
pub struct Console {
    job_id: Option<JobId>,
    printed_through: u64,
    phase: WorkflowState,
    finalizing: bool,
    error: Option<String>,
    download: Option<DownloadStatus>,
}

impl Console {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn render(&mut self, view: &AppViewModel, out: &mut impl Write) -> io::Result<()> {
        if view.job_id != self.job_id {
            self.job_id = view.job_id.clone();
            self.printed_through = 0;
        }

        if view.phase != self.phase {
            match view.phase {
                WorkflowState::Submitting => {
                    writeln!(out, "Uploading {} receipt(s)...", view.staged.len())?
                }
                WorkflowState::Streaming => {
                    if let Some(job_id) = &view.job_id {
                        writeln!(out, "Job {job_id} accepted, following progress")?;
                    }
                }
                WorkflowState::Succeeded => {
                    if let Some(url) = &view.artifact_url {
                        writeln!(out, "Done. Document available at {url}")?;
                    }
                }
                _ => {}
            }
        }

        for event in view.log.iter() {
            if event.sequence_id <= self.printed_through {
                continue;
            }
            writeln!(out, "{}", format_event(event))?;
            self.printed_through = event.sequence_id;
        }

        if view.finalizing && !self.finalizing {
            writeln!(out, "Finalizing...")?;
        }

        if view.error != self.error {
            if let Some(error) = &view.error {
                writeln!(out, "Error: {error}")?;
            }
        }

        if view.download != self.download {
            match &view.download {
                Some(DownloadStatus::InFlight) => writeln!(out, "Downloading document...")?,
                Some(DownloadStatus::Saved { path }) => {
                    writeln!(out, "Saved {}", path.display())?
                }
                _ => {}
            }
        }

        self.phase = view.phase;
        self.finalizing = view.finalizing;
        self.error = view.error.clone();
        self.download = view.download.clone();
        out.flush()
    }
}

pub fn format_event(event: &ProgressEvent) -> String {
    let marker = match event.status {
        EventStatus::Completed => '✓',
        EventStatus::Error => '✗',
        EventStatus::Processing => '→',
        EventStatus::Pending => '·',
    };
    let time: DateTime<Local> = event.received_at.into();
    format!(
        "{marker} [{}] {}",
        time.format("%H:%M:%S"),
        display_text(&event.raw_message)
    )
}
