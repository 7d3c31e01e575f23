use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::mpsc;

use anyhow::{bail, Context};
use sorter_core::{update, AppState, DownloadStatus, FileSelection, Msg, WorkflowState};
use sorter_logging::{sorter_debug, sorter_info};

use crate::cli::Cli;
use crate::config::AppConfig;
use crate::console::Console;
use crate::effects::EffectRunner;
use crate::logging;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Succeeded,
    JobFailed,
    DownloadFailed,
}

impl Outcome {
    pub fn exit_code(self) -> ExitCode {
        match self {
            Outcome::Succeeded => ExitCode::SUCCESS,
            Outcome::JobFailed => ExitCode::from(1),
            Outcome::DownloadFailed => ExitCode::from(2),
        }
    }
}

pub fn run(cli: Cli) -> anyhow::Result<Outcome> {
    logging::initialize(cli.verbose);

    let mut config = AppConfig::load(cli.config.as_deref())?;
    config.apply_cli(&cli);
    config.validate()?;
    sorter_info!("Using processor at {}", config.base_url);

    let selections = collect_selections(&cli.inputs)?;
    let (msg_tx, msg_rx) = mpsc::channel();
    let runner = EffectRunner::new(
        config.client_settings()?,
        config.output_dir.clone(),
        msg_tx,
    )
    .context("starting network engine")?;

    let mut driver = Driver {
        state: Some(AppState::new(config.workflow_settings()?)),
        runner,
        console: Console::new(),
        out: io::stdout(),
    };

    driver.dispatch(Msg::FilesStaged(selections))?;
    let view = driver.state()?.view();
    if let Some(stats) = view.last_stage_stats {
        writeln!(
            driver.out,
            "Staged {} receipt(s), skipped {} other file(s)",
            stats.accepted, stats.skipped
        )?;
    }
    if view.staged.is_empty() {
        bail!("no receipt images found in the given paths");
    }

    driver.dispatch(Msg::SubmitClicked)?;
    loop {
        if let Some(outcome) = driver.settle(cli.no_download)? {
            return Ok(outcome);
        }
        let msg = msg_rx
            .recv()
            .context("network engine stopped unexpectedly")?;
        driver.dispatch(msg)?;
    }
}

struct Driver {
    state: Option<AppState>,
    runner: EffectRunner,
    console: Console,
    out: io::Stdout,
}

impl Driver {
    fn state(&self) -> anyhow::Result<&AppState> {
        self.state.as_ref().context("workflow state missing")
    }

    fn dispatch(&mut self, msg: Msg) -> anyhow::Result<()> {
        let state = self.state.take().context("workflow state missing")?;
        let before = state.phase();
        let (mut state, effects) = update(state, msg);
        if state.phase() != before {
            sorter_debug!("Workflow {:?} -> {:?}", before, state.phase());
        }
        self.runner.run(effects);
        if state.consume_dirty() {
            self.console.render(&state.view(), &mut self.out)?;
        }
        self.state = Some(state);
        Ok(())
    }

    /// Decides whether the run is over, requesting the download on success.
    fn settle(&mut self, no_download: bool) -> anyhow::Result<Option<Outcome>> {
        let state = self.state()?;
        let phase = state.phase();
        let download = state.download().cloned();
        let outcome = match (phase, download) {
            (WorkflowState::Failed, _) => Some(Outcome::JobFailed),
            (WorkflowState::Succeeded, _) if no_download => Some(Outcome::Succeeded),
            (WorkflowState::Succeeded, None) => {
                self.dispatch(Msg::DownloadClicked)?;
                None
            }
            (WorkflowState::Succeeded, Some(DownloadStatus::Saved { .. })) => {
                Some(Outcome::Succeeded)
            }
            (WorkflowState::Succeeded, Some(DownloadStatus::Failed { .. })) => {
                Some(Outcome::DownloadFailed)
            }
            _ => None,
        };
        Ok(outcome)
    }
}

/// Expands the command-line paths into file selections. Folders contribute
/// their direct entries, sorted by name; filtering to images happens on staging.
pub fn collect_selections(inputs: &[PathBuf]) -> anyhow::Result<Vec<FileSelection>> {
    let mut selections = Vec::new();
    for input in inputs {
        let meta =
            fs::metadata(input).with_context(|| format!("cannot access {}", input.display()))?;
        if meta.is_dir() {
            let mut entries = Vec::new();
            for entry in
                fs::read_dir(input).with_context(|| format!("cannot list {}", input.display()))?
            {
                let path = entry?.path();
                if path.is_file() {
                    entries.push(path);
                }
            }
            entries.sort();
            for path in entries {
                selections.push(selection_for(&path)?);
            }
        } else {
            selections.push(selection_for(input)?);
        }
    }
    Ok(selections)
}

fn selection_for(path: &Path) -> anyhow::Result<FileSelection> {
    let meta = fs::metadata(path).with_context(|| format!("cannot access {}", path.display()))?;
    let name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    Ok(FileSelection {
        name,
        size_bytes: meta.len(),
        path: path.to_path_buf(),
    })
}
