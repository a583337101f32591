// src/core/toplevel.rs

//! # Top Level Controller
//!
//! Builds the shell's menu tree from the configuration and drives a whole
//! session:
//!
//! ```text
//! INIT ─> SPLASH ─> ROOT MENU ─> (nested levels) ─┬─> CLEAN        (exit code 0)
//!                                                 ├─> INTERRUPTED  (exit code 130)
//!                                                 └─> FATAL        (exit code 1)
//! ```
//!
//! Whatever the terminal state, the panel LEDs are switched off exactly once
//! on the way out.

use crate::{
    CancellationToken,
    core::{
        actions::{self, ProgramAction, ShellAction, ShellActions},
        navigation::{ActionError, Choice, MenuError, MenuLevel, NavigationError, Navigator},
        screens,
    },
    models::{ExitRequest, ShellConfig},
    system::{arm::ArmClient, executor::ProcessLauncher, panel::Panel},
};

/// Terminal state of a shell session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShellOutcome {
    Clean(ExitRequest),
    Interrupted,
    Fatal(String),
}

impl ShellOutcome {
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Clean(_) => 0,
            Self::Interrupted => 130,
            Self::Fatal(_) => 1,
        }
    }
}

fn program(title: &str, command: &str) -> ShellAction {
    ShellAction::RunProgram(ProgramAction {
        title: title.to_string(),
        command: command.to_string(),
    })
}

/// Builds the menu tree. "Quit to shell" is only offered with `allow_quit`.
pub fn build_menu(config: &ShellConfig, allow_quit: bool) -> Result<MenuLevel<ShellAction>, MenuError> {
    let mut shutdown_choices = Vec::new();
    if allow_quit {
        shutdown_choices.push(Choice::action(t!("choice.quit"), ShellAction::QuitToShell));
    }
    shutdown_choices.push(Choice::action(t!("choice.reboot"), ShellAction::Reboot));
    shutdown_choices.push(Choice::action(t!("choice.poweroff"), ShellAction::PowerOff));
    let shutdown = MenuLevel::submenu(t!("menu.shutdown"), shutdown_choices)?;

    let system = MenuLevel::submenu(
        t!("menu.system"),
        vec![
            Choice::action(t!("choice.about"), ShellAction::About),
            Choice::action(t!("choice.reset"), ShellAction::ResetArm),
            Choice::action(t!("choice.disable"), ShellAction::DisableArm),
            Choice::submenu(t!("choice.shutdown"), shutdown),
        ],
    )?;

    let programs = &config.programs;
    let network = MenuLevel::submenu(
        t!("menu.network"),
        vec![
            Choice::action(
                t!("choice.web_services"),
                program(t!("program.web_services.title"), &programs.web_services),
            ),
            Choice::action(
                t!("choice.browser_ui"),
                program(t!("program.browser_ui.title"), &programs.browser_ui),
            ),
        ],
    )?;

    let mode = MenuLevel::submenu(
        t!("menu.mode"),
        vec![
            Choice::action(t!("choice.demo"), program(t!("program.demo.title"), &programs.demo)),
            Choice::action(
                t!("choice.gamepad"),
                program(t!("program.gamepad.title"), &programs.gamepad),
            ),
            Choice::action(
                t!("choice.minitel"),
                program(t!("program.minitel.title"), &programs.minitel),
            ),
            Choice::submenu(t!("choice.network"), network),
        ],
    )?;

    MenuLevel::root(
        t!("menu.main"),
        vec![
            Choice::submenu(t!("choice.system"), system),
            Choice::submenu(t!("choice.mode"), mode),
        ],
    )
}

/// Runs a shell session until it reaches a terminal state.
pub fn run(
    panel: &mut dyn Panel,
    arm: &mut dyn ArmClient,
    launcher: &mut dyn ProcessLauncher,
    config: &ShellConfig,
    allow_quit: bool,
    token: &CancellationToken,
) -> ShellOutcome {
    log::info!("{}", "-".repeat(40));
    log::info!("started");
    log::info!("version: {}", env!("CARGO_PKG_VERSION"));
    log::info!("{}", "-".repeat(40));

    let mut panel = scopeguard::guard(panel, |panel| {
        if let Err(e) = panel.leds_off() {
            log::warn!("Could not switch the panel LEDs off: {}", e);
        }
    });

    let outcome = session(&mut **panel, arm, launcher, config, allow_quit, token);

    // A clean exit leaves the last action's screen up.
    let farewell: Vec<&str> = match &outcome {
        ShellOutcome::Clean(_) => Vec::new(),
        ShellOutcome::Interrupted => vec!["", t!("terminal.interrupted")],
        ShellOutcome::Fatal(_) => vec!["", t!("terminal.aborted"), t!("terminal.see_log")],
    };
    if !farewell.is_empty() {
        if let Err(e) = screens::terminal_screen(&mut **panel, &farewell) {
            log::warn!("Could not display the final screen: {}", e);
        }
    }

    match &outcome {
        ShellOutcome::Fatal(reason) => log::error!("aborted: {}", reason),
        other => log::info!("terminated: {:?}", other),
    }
    outcome
}

fn session(
    panel: &mut dyn Panel,
    arm: &mut dyn ArmClient,
    launcher: &mut dyn ProcessLauncher,
    config: &ShellConfig,
    allow_quit: bool,
    token: &CancellationToken,
) -> ShellOutcome {
    let menu = match build_menu(config, allow_quit) {
        Ok(menu) => menu,
        Err(e) => return ShellOutcome::Fatal(e.to_string()),
    };

    match actions::display_about(panel, config.system.about_delay(), token) {
        Ok(()) => {}
        Err(ActionError::Interrupted) => return ShellOutcome::Interrupted,
        Err(ActionError::Failed(e)) => return ShellOutcome::Fatal(format!("{:#}", e)),
    }

    let mut handler = ShellActions::new(arm, launcher, config);
    match Navigator::new(panel, &mut handler, token).run(&menu) {
        Ok(request) => ShellOutcome::Clean(request),
        Err(NavigationError::Interrupted) => ShellOutcome::Interrupted,
        Err(NavigationError::Fatal(e)) => ShellOutcome::Fatal(format!("{:#}", e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::commons;
    use crate::core::navigation::MenuItem;
    use crate::core::test_support::{FakeArm, FakeLauncher, FakePanel, FakeProcess};
    use crate::models::Key;

    fn config() -> ShellConfig {
        let mut config = ShellConfig::default();
        config.supervisor.splash_delay_ms = 0;
        config.supervisor.poll_period_ms = 1;
        config.system.about_delay_ms = 0;
        config.system.notice_delay_ms = 0;
        config
    }

    fn run_session(panel: &mut FakePanel, launcher: &mut FakeLauncher, allow_quit: bool) -> ShellOutcome {
        let mut arm = FakeArm::default();
        let token = commons::new_cancellation_token();
        run(panel, &mut arm, launcher, &config(), allow_quit, &token)
    }

    #[test]
    fn test_quit_to_shell_is_a_clean_exit() {
        let mut panel = FakePanel::new()
            .press(Key::Digit(1))
            .press(Key::Digit(4))
            .press(Key::Digit(1));
        let mut launcher = FakeLauncher::failing();

        let outcome = run_session(&mut panel, &mut launcher, true);

        assert_eq!(outcome, ShellOutcome::Clean(ExitRequest::QuitToShell));
        assert_eq!(outcome.exit_code(), 0);
        assert_eq!(panel.leds_off_calls(), 1);
        assert_eq!(panel.rows()[1].trim(), "I'll be back...");
    }

    #[test]
    fn test_quit_entry_needs_allow_quit() {
        let menu = build_menu(&config(), false).unwrap();
        let MenuItem::Submenu(system) = &menu.choices()[0].item else {
            panic!("System should be a submenu");
        };
        let MenuItem::Submenu(shutdown) = &system.choices()[3].item else {
            panic!("Shutdown should be a submenu");
        };
        let labels: Vec<_> = shutdown.choices().iter().map(|c| c.label.as_str()).collect();
        assert_eq!(labels, vec!["Reboot", "Power off"]);
        assert!(!menu.is_cancelable());
        assert!(system.is_cancelable());
    }

    #[test]
    fn test_power_off_runs_the_command() {
        // Main -> System -> Shutdown -> Power off
        let mut panel = FakePanel::new()
            .press(Key::Digit(1))
            .press(Key::Digit(4))
            .press(Key::Digit(2));
        let mut launcher = FakeLauncher::with_process(FakeProcess::exiting_after(0, 0));

        let outcome = run_session(&mut panel, &mut launcher, false);

        assert_eq!(outcome, ShellOutcome::Clean(ExitRequest::PowerOff));
        assert_eq!(launcher.started()[0].to_string(), "sudo poweroff");
        assert_eq!(panel.leds_off_calls(), 1);
    }

    #[test]
    fn test_interruption_in_a_submenu_ends_interrupted() {
        // Main -> Mode -> Network, then the device goes away.
        let mut panel = FakePanel::new()
            .press(Key::Digit(2))
            .press(Key::Digit(4))
            .interrupt_when_exhausted();
        let mut launcher = FakeLauncher::failing();

        let outcome = run_session(&mut panel, &mut launcher, false);

        assert_eq!(outcome, ShellOutcome::Interrupted);
        assert_eq!(outcome.exit_code(), 130);
        assert_eq!(panel.leds_off_calls(), 1);
        assert!(panel.showed("Interrupted"));
    }

    #[test]
    fn test_interruption_during_a_program_ends_interrupted() {
        // Main -> Mode -> Demo, then SIGTERM while the demo runs.
        let process = FakeProcess::running_forever();
        let journal = process.journal();
        let mut launcher = FakeLauncher::with_process(process);
        let mut arm = FakeArm::default();
        let token = commons::new_cancellation_token();
        let mut panel = FakePanel::new()
            .press(Key::Digit(2))
            .press(Key::Digit(1))
            .terminate_at_read(7, &token);

        let outcome = run(&mut panel, &mut arm, &mut launcher, &config(), false, &token);

        assert_eq!(outcome, ShellOutcome::Interrupted);
        assert_eq!(journal.terminate_calls(), 1);
        assert_eq!(journal.wait_calls(), 1);
    }

    #[test]
    fn test_panel_failure_at_the_root_is_fatal() {
        let mut panel = FakePanel::new().fail_when_exhausted();
        let mut launcher = FakeLauncher::failing();

        let outcome = run_session(&mut panel, &mut launcher, false);

        assert!(matches!(outcome, ShellOutcome::Fatal(_)));
        assert_eq!(outcome.exit_code(), 1);
        assert_eq!(panel.leds_off_calls(), 1);
        assert!(panel.showed("Application aborted"));
    }

    #[test]
    fn test_display_failure_on_the_splash_is_fatal() {
        let mut panel = FakePanel::new().failing_writes();
        let mut launcher = FakeLauncher::failing();

        let outcome = run_session(&mut panel, &mut launcher, false);

        assert!(matches!(&outcome, ShellOutcome::Fatal(reason) if reason.contains("display write failed")));
        assert_eq!(outcome.exit_code(), 1);
        assert_eq!(panel.key_reads(), 0);
        assert_eq!(panel.leds_off_calls(), 1);
    }

    #[test]
    fn test_termination_during_splash_skips_the_menu() {
        let mut panel = FakePanel::new();
        let mut launcher = FakeLauncher::failing();
        let mut arm = FakeArm::default();
        let token = commons::new_cancellation_token();
        commons::request_termination(&token);

        let outcome = run(&mut panel, &mut arm, &mut launcher, &config(), false, &token);

        assert_eq!(outcome, ShellOutcome::Interrupted);
        assert_eq!(panel.key_reads(), 0);
        assert_eq!(panel.leds_off_calls(), 1);
    }
}
