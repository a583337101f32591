// src/system/executor.rs

use crate::{
    CancellationToken,
    core::commons,
    models::{ExitStatus, LaunchSpec},
};
use std::io;
use std::path::{Path, PathBuf};
use std::process::{Child, Command as StdCommand, Stdio};
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LaunchError {
    #[error("Command could not be parsed: {0}")]
    CommandParse(String),
    #[error("No command specified to run.")]
    EmptyCommand,
    #[error("{source}")]
    Spawn {
        command: String,
        #[source]
        source: io::Error,
    },
}

#[derive(Error, Debug)]
pub enum ExecutionError {
    #[error(transparent)]
    Launch(#[from] LaunchError),
    #[error("Command '{0}' exited with {1}.")]
    NonZeroExitStatus(String, ExitStatus),
    #[error("Lost track of command '{command}': {source}")]
    Wait {
        command: String,
        #[source]
        source: io::Error,
    },
    #[error("Operation was cancelled by a termination request.")]
    Cancelled,
}

/// A started child process.
pub trait ProcessHandle {
    fn id(&self) -> u32;

    /// Non-blocking check for exit.
    fn try_wait(&mut self) -> io::Result<Option<ExitStatus>>;

    /// Asks the process to terminate (SIGTERM on unix). Does not wait.
    fn terminate(&mut self) -> io::Result<()>;

    /// Blocks until the process has exited.
    fn wait(&mut self) -> io::Result<ExitStatus>;
}

pub trait ProcessLauncher {
    fn start(&mut self, spec: &LaunchSpec) -> Result<Box<dyn ProcessHandle>, LaunchError>;
}

impl LaunchSpec {
    /// Splits `command_line` with shell quoting rules. A relative program
    /// path containing no separator is looked up in `bin_dir` when it exists
    /// there, and left to the `PATH` search otherwise.
    pub fn parse(command_line: &str, bin_dir: Option<&Path>) -> Result<Self, LaunchError> {
        let trimmed = command_line.trim();
        if trimmed.is_empty() {
            return Err(LaunchError::EmptyCommand);
        }

        let mut parts = shlex::split(trimmed)
            .ok_or_else(|| LaunchError::CommandParse(trimmed.to_string()))?
            .into_iter();
        let program = parts.next().ok_or(LaunchError::EmptyCommand)?;

        let mut program_path = PathBuf::from(&program);
        if let Some(dir) = bin_dir {
            let candidate = dir.join(&program);
            if program_path.components().count() == 1 && candidate.is_file() {
                program_path = candidate;
            }
        }

        Ok(Self {
            program: program_path,
            args: parts.collect(),
        })
    }

    /// Appends the `-v` flag companion programs understand as "log verbosely".
    pub fn with_verbose_flag(mut self) -> Self {
        self.args.push("-v".to_string());
        self
    }
}

/// Starts real OS processes, sharing the shell's stdio.
#[derive(Debug, Default)]
pub struct OsProcessLauncher;

impl ProcessLauncher for OsProcessLauncher {
    fn start(&mut self, spec: &LaunchSpec) -> Result<Box<dyn ProcessHandle>, LaunchError> {
        let child = StdCommand::new(&spec.program)
            .args(&spec.args)
            .stdin(Stdio::null())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .spawn()
            .map_err(|e| LaunchError::Spawn {
                command: spec.to_string(),
                source: e,
            })?;
        Ok(Box::new(OsProcess { child }))
    }
}

#[derive(Debug)]
struct OsProcess {
    child: Child,
}

impl ProcessHandle for OsProcess {
    fn id(&self) -> u32 {
        self.child.id()
    }

    fn try_wait(&mut self) -> io::Result<Option<ExitStatus>> {
        Ok(self.child.try_wait()?.map(convert_status))
    }

    #[cfg(unix)]
    fn terminate(&mut self) -> io::Result<()> {
        use nix::sys::signal::{self, Signal};
        use nix::unistd::Pid;

        let pid = i32::try_from(self.child.id())
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;
        signal::kill(Pid::from_raw(pid), Signal::SIGTERM).map_err(io::Error::from)
    }

    #[cfg(not(unix))]
    fn terminate(&mut self) -> io::Result<()> {
        self.child.kill()
    }

    fn wait(&mut self) -> io::Result<ExitStatus> {
        self.child.wait().map(convert_status)
    }
}

fn convert_status(status: std::process::ExitStatus) -> ExitStatus {
    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        ExitStatus {
            code: status.code(),
            signal: status.signal(),
        }
    }
    #[cfg(not(unix))]
    {
        ExitStatus {
            code: status.code(),
            signal: None,
        }
    }
}

/// Runs a short-lived command to completion, with support for graceful
/// cancellation. A non-zero exit status is an error.
pub fn execute_command(
    launcher: &mut dyn ProcessLauncher,
    spec: &LaunchSpec,
    poll_period: Duration,
    cancellation_token: &CancellationToken,
) -> Result<ExitStatus, ExecutionError> {
    let command = spec.to_string();
    log::debug!("Executing '{}'", command);
    let mut child = launcher.start(spec)?;
    let wait_error = |source| ExecutionError::Wait {
        command: command.clone(),
        source,
    };

    // Non-blocking wait loop to allow for cancellation.
    loop {
        if let Some(status) = child.try_wait().map_err(wait_error)? {
            if !status.success() {
                return Err(ExecutionError::NonZeroExitStatus(command.clone(), status));
            }
            return Ok(status);
        }

        if commons::is_terminated(cancellation_token) {
            log::debug!(
                "Cancellation requested, terminating child process (PID: {})...",
                child.id()
            );
            if let Err(e) = child.terminate() {
                log::warn!("Failed to terminate child process {}: {}", child.id(), e);
            }
            child.wait().map_err(wait_error)?;
            return Err(ExecutionError::Cancelled);
        }

        std::thread::sleep(poll_period);
    }
}
