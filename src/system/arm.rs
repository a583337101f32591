// src/system/arm.rs

use crate::{
    CancellationToken,
    models::{ExitStatus, LaunchSpec},
    system::executor::{self, ExecutionError, LaunchError, ProcessLauncher},
};
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ArmError {
    #[error("No arm control command configured.")]
    NotConfigured,
    /// The control tool ran but reported a failure.
    #[error("Arm operation '{operation}' failed: control tool exited with {status}.")]
    Driver { operation: String, status: ExitStatus },
    #[error(transparent)]
    Launch(#[from] LaunchError),
    #[error(transparent)]
    Execution(#[from] ExecutionError),
}

/// Blocking operations of the arm driver used by the maintenance menu.
pub trait ArmClient {
    /// Switches the motors off (high impedance) so the arm can be moved by hand.
    fn disable_motors(&mut self, token: &CancellationToken) -> Result<(), ArmError>;

    /// Re-initializes the controller.
    fn initialize(&mut self, token: &CancellationToken) -> Result<(), ArmError>;
}

/// Drives the arm through its control command line tool: each operation runs
/// `<control_command> <operation>` and succeeds when the tool exits with 0.
pub struct CommandArm {
    control_command: Option<String>,
    launcher: Box<dyn ProcessLauncher>,
    poll_period: Duration,
}

impl std::fmt::Debug for CommandArm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandArm")
            .field("control_command", &self.control_command)
            .finish_non_exhaustive()
    }
}

impl CommandArm {
    pub fn new(
        control_command: Option<String>,
        launcher: Box<dyn ProcessLauncher>,
        poll_period: Duration,
    ) -> Self {
        Self {
            control_command,
            launcher,
            poll_period,
        }
    }

    fn run(&mut self, operation: &str, token: &CancellationToken) -> Result<(), ArmError> {
        let command = self.control_command.as_deref().ok_or(ArmError::NotConfigured)?;
        let mut spec = LaunchSpec::parse(command, None)?;
        spec.args.push(operation.to_string());

        log::info!("arm: {}", operation);
        match executor::execute_command(self.launcher.as_mut(), &spec, self.poll_period, token) {
            Ok(_) => Ok(()),
            Err(ExecutionError::NonZeroExitStatus(_, status)) => Err(ArmError::Driver {
                operation: operation.to_string(),
                status,
            }),
            Err(e) => Err(e.into()),
        }
    }
}

impl ArmClient for CommandArm {
    fn disable_motors(&mut self, token: &CancellationToken) -> Result<(), ArmError> {
        self.run("disable", token)
    }

    fn initialize(&mut self, token: &CancellationToken) -> Result<(), ArmError> {
        self.run("initialize", token)
    }
}
