// src/core/supervisor.rs

//! # Process Supervisor
//!
//! Runs one companion program while the operator keeps a hand on the keypad.
//!
//! ```text
//! STARTING ──> RUNNING ──┬──> EXITED_NATURALLY
//!                        ├──> ABORTED_BY_USER   (abort combo held)
//!                        └──> ABORTED_BY_SHELL  (termination signal)
//! ```
//!
//! Whatever the path, [`ProcessSupervisor::run`] only returns once the child
//! is gone: the abort paths send a single terminate request and then block on
//! the child's exit.

use crate::{
    CancellationToken,
    core::{commons, screens},
    models::{ExitStatus, KeySet, LaunchSpec, SupervisorConfig, combo_label},
    system::{
        executor::{ProcessHandle, ProcessLauncher},
        panel::{Panel, PanelError},
    },
};
use std::io;
use std::time::Duration;
use thiserror::Error;

/// How a supervised run ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SupervisorOutcome {
    /// The program finished on its own.
    ExitedNaturally(ExitStatus),
    /// The operator held the abort combination.
    AbortedByUser(ExitStatus),
    /// The shell is terminating. `None` when the request came before the
    /// program was even started.
    AbortedByShell(Option<ExitStatus>),
    /// The program could not be started. The operator has acknowledged it.
    LaunchFailed(String),
}

#[derive(Error, Debug)]
pub enum SupervisorError {
    #[error("Program supervision interrupted by a termination request.")]
    Interrupted,
    #[error(transparent)]
    Panel(PanelError),
    #[error("Lost track of process {pid}: {source}")]
    Process {
        pid: u32,
        #[source]
        source: io::Error,
    },
}

impl From<PanelError> for SupervisorError {
    fn from(e: PanelError) -> Self {
        match e {
            PanelError::Interrupted => Self::Interrupted,
            other => Self::Panel(other),
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum AbortReason {
    User,
    Shell,
}

#[derive(Debug, Clone)]
pub struct ProcessSupervisor {
    splash_delay: Duration,
    poll_period: Duration,
    abort_combo: KeySet,
}

impl ProcessSupervisor {
    pub fn new(config: &SupervisorConfig) -> Self {
        Self {
            splash_delay: config.splash_delay(),
            poll_period: config.poll_period(),
            abort_combo: config.abort_combo.clone(),
        }
    }

    /// Shows `title` with the abort hint, starts `spec` and watches it.
    pub fn run(
        &self,
        panel: &mut dyn Panel,
        launcher: &mut dyn ProcessLauncher,
        title: &str,
        spec: &LaunchSpec,
        token: &CancellationToken,
    ) -> Result<SupervisorOutcome, SupervisorError> {
        panel.clear()?;
        panel.center_text_at(title, 2)?;
        let hint = format!(t!("supervisor.abort_hint"), keys = combo_label(&self.abort_combo));
        panel.center_text_at(&hint, panel.height())?;

        if commons::interruptible_sleep(self.splash_delay, token).is_err() {
            log::info!("termination requested before starting \"{}\"", spec);
            return Ok(SupervisorOutcome::AbortedByShell(None));
        }
        panel.leds_off()?;

        log::info!("starting \"{}\" as subprocess", spec);
        let mut child = match launcher.start(spec) {
            Ok(child) => child,
            Err(e) => {
                log::error!("could not start \"{}\": {}", spec, e);
                screens::acknowledge_error(
                    panel,
                    t!("supervisor.launch_error"),
                    &e.to_string(),
                    token,
                )?;
                return Ok(SupervisorOutcome::LaunchFailed(e.to_string()));
            }
        };
        log::info!("PID={}", child.id());

        self.watch(panel, child.as_mut(), token)
    }

    fn watch(
        &self,
        panel: &mut dyn Panel,
        child: &mut dyn ProcessHandle,
        token: &CancellationToken,
    ) -> Result<SupervisorOutcome, SupervisorError> {
        let pid = child.id();
        log::info!("watching for keypad actions...");

        let reason = loop {
            if commons::is_terminated(token) {
                log::info!("shell termination requested");
                break AbortReason::Shell;
            }

            if let Some(status) = child
                .try_wait()
                .map_err(|source| SupervisorError::Process { pid, source })?
            {
                log::info!("terminated with {}", status);
                return Ok(SupervisorOutcome::ExitedNaturally(status));
            }

            match panel.current_keys() {
                Ok(keys) if keys == self.abort_combo => {
                    log::info!("exit action caught");
                    break AbortReason::User;
                }
                Ok(_) => {}
                Err(PanelError::Interrupted) => {
                    log::warn!("front panel reported an interruption");
                    commons::request_termination(token);
                    continue;
                }
                Err(e) => log::warn!("keypad read failed: {}", e),
            }

            // A termination request cutting the sleep short is handled on the next turn.
            let _ = commons::interruptible_sleep(self.poll_period, token);
        };

        let status = stop(child)?;
        // A termination request seen at any point of the watch outranks the combo.
        if commons::is_terminated(token) {
            return Ok(SupervisorOutcome::AbortedByShell(Some(status)));
        }
        Ok(match reason {
            AbortReason::User => SupervisorOutcome::AbortedByUser(status),
            AbortReason::Shell => SupervisorOutcome::AbortedByShell(Some(status)),
        })
    }
}

/// Sends the terminate request once, then blocks until the child is gone.
/// The wait is authoritative: a failed request is only logged.
fn stop(child: &mut dyn ProcessHandle) -> Result<ExitStatus, SupervisorError> {
    let pid = child.id();
    log::info!("sending terminate signal to subprocess {}", pid);
    if let Err(e) = child.terminate() {
        log::warn!("terminate request to {} failed: {}", pid, e);
    }

    log::info!("waiting for completion");
    let status = child
        .wait()
        .map_err(|source| SupervisorError::Process { pid, source })?;
    log::info!("terminated with {}", status);
    Ok(status)
}
