// src/bin/armshell.rs

use anyhow::{Context, Result};
use armshell::{
    cli::Cli,
    core::{commons, config_loader, paths, toplevel},
    system::{arm::CommandArm, executor::OsProcessLauncher, fs_panel::FsPanel, signals},
};
use clap::Parser;
use colored::*;
use std::fs::OpenOptions;

/// The entry point of the `armshell` binary.
/// Start-up errors (configuration, log file, panel device) are printed to
/// stderr; once the shell runs, everything goes to the log file.
fn main() {
    match run(Cli::parse()) {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            eprintln!("\n{}: {:#}", "Error".red().bold(), e);
            std::process::exit(1);
        }
    }
}

/// Sends the logs to the append-only log file. `RUST_LOG`, when set, wins
/// over the level chosen from `--verbose`.
fn init_logging(log_file: &str, verbose: bool) -> Result<()> {
    let path = paths::expand_path(log_file)?;
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .with_context(|| format!("Could not open log file '{}'", path.display()))?;

    let level = if verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .format_timestamp_millis()
        .target(env_logger::Target::Pipe(Box::new(file)))
        .try_init()
        .context("Could not initialize logging")?;
    Ok(())
}

fn run(cli: Cli) -> Result<i32> {
    let loaded = config_loader::load().context("Failed to load the configuration")?;
    init_logging(&loaded.config.system.log_file, cli.verbose)?;
    loaded.log_source();
    let config = loaded.config;
    log::debug!("CLI args parsed: {:?}", cli);

    let token = commons::new_cancellation_token();
    signals::install_termination_handler(&token)
        .context("Could not install the termination signal handler")?;

    let mut panel = FsPanel::open(&config.display).context("Front panel unavailable")?;
    panel.reset().context("Could not reset the front panel")?;

    let mut arm = CommandArm::new(
        config.arm.control_command.clone(),
        Box::new(OsProcessLauncher),
        config.supervisor.poll_period(),
    );
    let mut launcher = OsProcessLauncher;

    let outcome = toplevel::run(
        &mut panel,
        &mut arm,
        &mut launcher,
        &config,
        cli.allow_quit,
        &token,
    );
    if let toplevel::ShellOutcome::Fatal(reason) = &outcome {
        eprintln!("\n{}: {}", "Error".red().bold(), reason);
    }
    Ok(outcome.exit_code())
}
