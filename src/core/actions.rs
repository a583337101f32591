// src/core/actions.rs

//! The leaf actions of the shell menu and their executor.

use crate::{
    CancellationToken,
    core::{
        commons, paths, screens,
        navigation::{ActionError, ActionHandler, Flow},
        supervisor::{ProcessSupervisor, SupervisorOutcome},
    },
    models::{ExitRequest, LaunchSpec, ShellConfig},
    system::{
        arm::{ArmClient, ArmError},
        executor::{self, ExecutionError, ProcessLauncher},
        panel::Panel,
    },
};
use anyhow::Context;
use std::path::PathBuf;
use std::time::Duration;

/// A companion program started from the mode menus.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgramAction {
    /// Shown centered on the splash before the program starts.
    pub title: String,
    /// Command line, program first.
    pub command: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShellAction {
    About,
    DisableArm,
    ResetArm,
    RunProgram(ProgramAction),
    QuitToShell,
    Reboot,
    PowerOff,
}

#[derive(Debug, Clone, Copy)]
enum ArmOperation {
    DisableMotors,
    Initialize,
}

impl ArmOperation {
    fn label(self) -> &'static str {
        match self {
            Self::DisableMotors => t!("choice.disable"),
            Self::Initialize => t!("choice.reset"),
        }
    }
}

/// Shows the name and version of the shell for `delay`.
pub fn display_about(
    panel: &mut dyn Panel,
    delay: Duration,
    token: &CancellationToken,
) -> Result<(), ActionError> {
    let version = format!(t!("about.version"), version = env!("CARGO_PKG_VERSION"));
    let lines = [t!("about.title"), t!("about.by"), "", version.as_str()];
    screens::display_splash(panel, &lines, delay, token)?;
    Ok(())
}

/// Runs [`ShellAction`]s against the shell's collaborators.
pub struct ShellActions<'a> {
    arm: &'a mut dyn ArmClient,
    launcher: &'a mut dyn ProcessLauncher,
    supervisor: ProcessSupervisor,
    bin_dir: Option<PathBuf>,
    reboot_command: String,
    poweroff_command: String,
    about_delay: Duration,
    notice_delay: Duration,
    poll_period: Duration,
}

impl std::fmt::Debug for ShellActions<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShellActions")
            .field("supervisor", &self.supervisor)
            .field("bin_dir", &self.bin_dir)
            .finish_non_exhaustive()
    }
}

impl<'a> ShellActions<'a> {
    pub fn new(
        arm: &'a mut dyn ArmClient,
        launcher: &'a mut dyn ProcessLauncher,
        config: &ShellConfig,
    ) -> Self {
        let bin_dir = match paths::expand_path(&config.programs.bin_dir) {
            Ok(dir) => Some(dir),
            Err(e) => {
                log::warn!("{}; programs will be searched in PATH only.", e);
                None
            }
        };
        Self {
            arm,
            launcher,
            supervisor: ProcessSupervisor::new(&config.supervisor),
            bin_dir,
            reboot_command: config.system.reboot_command.clone(),
            poweroff_command: config.system.poweroff_command.clone(),
            about_delay: config.system.about_delay(),
            notice_delay: config.system.notice_delay(),
            poll_period: config.supervisor.poll_period(),
        }
    }

    fn run_program(
        &mut self,
        program: &ProgramAction,
        panel: &mut dyn Panel,
        token: &CancellationToken,
    ) -> Result<Flow, ActionError> {
        let mut spec = LaunchSpec::parse(&program.command, self.bin_dir.as_deref())
            .with_context(|| format!("Invalid command line for \"{}\"", program.title))?;
        if log::log_enabled!(log::Level::Debug) {
            spec = spec.with_verbose_flag();
        }

        let outcome = self
            .supervisor
            .run(panel, self.launcher, &program.title, &spec, token)?;
        log::info!("\"{}\" ended: {:?}", program.title, outcome);

        match outcome {
            SupervisorOutcome::AbortedByShell(_) => Err(ActionError::Interrupted),
            _ => Ok(Flow::Stay),
        }
    }

    /// Runs an arm operation, then shows `notice`. A failure is reported on
    /// the panel and acknowledged by the operator.
    fn arm_operation(
        &mut self,
        operation: ArmOperation,
        notice: &[&str],
        panel: &mut dyn Panel,
        token: &CancellationToken,
    ) -> Result<Flow, ActionError> {
        screens::please_wait(panel, operation.label())?;
        let result = match operation {
            ArmOperation::DisableMotors => self.arm.disable_motors(token),
            ArmOperation::Initialize => self.arm.initialize(token),
        };

        match result {
            Ok(()) => screens::display_splash(panel, notice, self.notice_delay, token)?,
            Err(ArmError::Execution(ExecutionError::Cancelled)) => {
                return Err(ActionError::Interrupted);
            }
            Err(e) => {
                log::error!("{:?} failed: {}", operation, e);
                let message = e.to_string();
                screens::acknowledge_error(
                    panel,
                    t!("screen.unexpected_error"),
                    commons::last_line(&message),
                    token,
                )?;
            }
        }
        Ok(Flow::Stay)
    }

    fn system_command(
        &mut self,
        command: &str,
        request: ExitRequest,
        progress: &str,
        panel: &mut dyn Panel,
        token: &CancellationToken,
    ) -> Result<Flow, ActionError> {
        screens::display_progress(panel, progress)?;
        let spec = LaunchSpec::parse(command, None)
            .with_context(|| format!("Invalid {:?} command", request))?;

        log::info!("{:?} requested, running \"{}\"", request, spec);
        match executor::execute_command(self.launcher, &spec, self.poll_period, token) {
            Ok(_) => Ok(Flow::Exit(request)),
            Err(ExecutionError::Cancelled) => Err(ActionError::Interrupted),
            Err(e) => Err(anyhow::Error::new(e)
                .context(format!("{:?} command failed", request))
                .into()),
        }
    }
}

impl ActionHandler<ShellAction> for ShellActions<'_> {
    fn execute(
        &mut self,
        action: &ShellAction,
        panel: &mut dyn Panel,
        token: &CancellationToken,
    ) -> Result<Flow, ActionError> {
        commons::check_for_cancellation(token)?;
        match action {
            ShellAction::About => {
                display_about(panel, self.about_delay, token)?;
                Ok(Flow::Stay)
            }
            ShellAction::DisableArm => self.arm_operation(
                ArmOperation::DisableMotors,
                &["", t!("arm.disabled.line1"), t!("arm.disabled.line2")],
                panel,
                token,
            ),
            ShellAction::ResetArm => {
                self.arm_operation(ArmOperation::Initialize, &["", t!("arm.reset")], panel, token)
            }
            ShellAction::RunProgram(program) => self.run_program(program, panel, token),
            ShellAction::QuitToShell => {
                log::info!("quit to shell requested");
                panel.clear()?;
                panel.center_text_at(t!("shutdown.quit"), 2)?;
                Ok(Flow::Exit(ExitRequest::QuitToShell))
            }
            ShellAction::Reboot => {
                let command = self.reboot_command.clone();
                self.system_command(&command, ExitRequest::Reboot, t!("shutdown.reboot"), panel, token)
            }
            ShellAction::PowerOff => {
                let command = self.poweroff_command.clone();
                self.system_command(
                    &command,
                    ExitRequest::PowerOff,
                    t!("shutdown.poweroff"),
                    panel,
                    token,
                )
            }
        }
    }
}
