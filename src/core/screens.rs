// src/core/screens.rs

//! Ready-made screens built on top of the [`Panel`] primitives.

use crate::{
    CancellationToken,
    constants::OK_GLYPH,
    core::commons,
    models::{Key, KeySet},
    system::panel::{Panel, PanelError, WaitOptions},
};
use std::time::Duration;

/// Clears the panel and centers `lines`, starting at display line 1.
pub fn show_lines<S: AsRef<str>>(panel: &mut dyn Panel, lines: &[S]) -> Result<(), PanelError> {
    panel.clear()?;
    for (i, line) in lines.iter().take(panel.height()).enumerate() {
        panel.center_text_at(line.as_ref(), i + 1)?;
    }
    Ok(())
}

/// Shows `lines` for `delay`. The pause ends early (with an interruption)
/// when the termination signal is set.
pub fn display_splash<S: AsRef<str>>(
    panel: &mut dyn Panel,
    lines: &[S],
    delay: Duration,
    token: &CancellationToken,
) -> Result<(), PanelError> {
    show_lines(panel, lines)?;
    commons::interruptible_sleep(delay, token)?;
    Ok(())
}

pub fn please_wait(panel: &mut dyn Panel, message: &str) -> Result<(), PanelError> {
    panel.clear()?;
    panel.center_text_at(message, 2)?;
    panel.center_text_at(t!("screen.please_wait"), 3)
}

pub fn display_progress(panel: &mut dyn Panel, message: &str) -> Result<(), PanelError> {
    panel.clear()?;
    panel.center_text_at(message, 2)?;
    panel.center_text_at(t!("screen.in_progress"), 3)
}

/// Shows `title` and the first line of `message` (over two display rows at
/// most), lights the OK glyph and blocks until the operator presses OK.
pub fn acknowledge_error(
    panel: &mut dyn Panel,
    title: &str,
    message: &str,
    token: &CancellationToken,
) -> Result<(), PanelError> {
    let width = panel.width();
    let first_row = panel.height().saturating_sub(1).max(2);

    panel.clear()?;
    panel.center_text_at(title, 1)?;
    for (i, row) in commons::split_for_display(message, width, 2).iter().enumerate() {
        panel.write_at(row, first_row + i, 1)?;
    }
    panel.write_at(&OK_GLYPH.to_string(), 1, width)?;

    let ok: KeySet = [Key::Ok].into_iter().collect();
    panel.wait_for_key(&ok, WaitOptions::blinking(), token)?;
    Ok(())
}

/// Static screen shown when the shell is over. No interaction.
pub fn terminal_screen<S: AsRef<str>>(panel: &mut dyn Panel, lines: &[S]) -> Result<(), PanelError> {
    show_lines(panel, lines)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::test_support::FakePanel;

    #[test]
    fn test_acknowledge_error_waits_for_ok() {
        let mut panel = FakePanel::new().press(Key::Digit(1)).press(Key::Ok);
        let token = commons::new_cancellation_token();

        acknowledge_error(&mut panel, "ERROR", "No such file or directory (os error 2)", &token)
            .unwrap();

        let rows = panel.rows();
        assert_eq!(rows[0], "       ERROR       #");
        assert_eq!(rows[2], "No such file or dire");
        assert_eq!(rows[3].trim_end(), "ctory (os error 2)");
        assert_eq!(panel.unread_key_states(), 0);
        assert!(!panel.ok_led());
    }

    #[test]
    fn test_acknowledge_error_is_interruptible() {
        let mut panel = FakePanel::new();
        let token = commons::new_cancellation_token();
        commons::request_termination(&token);

        let result = acknowledge_error(&mut panel, "ERROR", "boom", &token);
        assert!(matches!(result, Err(PanelError::Interrupted)));
    }

    #[test]
    fn test_display_splash_is_interruptible() {
        let mut panel = FakePanel::new();
        let token = commons::new_cancellation_token();
        commons::request_termination(&token);

        let result = display_splash(&mut panel, &["Arm Shell"], Duration::from_secs(30), &token);
        assert!(matches!(result, Err(PanelError::Interrupted)));
        assert_eq!(panel.rows()[0].trim(), "Arm Shell");
    }
}
