// src/constants.rs

/// Directory name under the user's config dir holding the shell configuration.
pub const CONFIG_DIR_NAME: &str = "armshell";

/// Name of the configuration file (inside the config directory).
pub const CONFIG_FILENAME: &str = "armshell.toml";

/// Environment variable overriding the configuration file location.
pub const CONFIG_ENV_VAR: &str = "ARMSHELL_CONFIG";

/// Mount point of the filesystem-exposed LCD device.
pub const DEFAULT_PANEL_DEVICE: &str = "/mnt/lcdfs";

pub const DEFAULT_DISPLAY_WIDTH: usize = 20;
pub const DEFAULT_DISPLAY_HEIGHT: usize = 4;

/// Period between two keypad scans while waiting for a key.
pub const DEFAULT_KEY_SCAN_MS: u64 = 50;

/// Pause giving the operator time to read the abort hint before the watch starts.
pub const DEFAULT_SPLASH_DELAY_MS: u64 = 3000;

/// Poll period of the supervisor watch loop.
pub const DEFAULT_POLL_PERIOD_MS: u64 = 200;

pub const DEFAULT_ABOUT_DELAY_MS: u64 = 2000;

/// How long short confirmation notices ("motors are disabled now") stay up.
pub const DEFAULT_NOTICE_DELAY_MS: u64 = 2000;

/// Directory where the companion programs are installed.
pub const DEFAULT_BIN_DIR: &str = "~/.local/bin";

pub const DEFAULT_LOG_FILE: &str = "~/armshell.log";

pub const DEFAULT_REBOOT_COMMAND: &str = "sudo reboot";
pub const DEFAULT_POWEROFF_COMMAND: &str = "sudo poweroff";

/// Granularity of interruptible sleeps.
pub const SLEEP_SLICE_MS: u64 = 50;

/// Blink half-period of the OK indicator while waiting for an acknowledgement.
pub const BLINK_HALF_PERIOD_MS: u64 = 500;

/// Glyph shown where a level can be cancelled (the `*` key).
pub const CANCEL_GLYPH: char = '*';

/// Glyph shown where the OK key is expected (the `#` key).
pub const OK_GLYPH: char = '#';

/// Highest number of choices a level can hold (one per digit key).
pub const MAX_CHOICES: usize = 9;

/// Consecutive front panel failures a nested level absorbs before handing
/// control back to its parent.
pub const MAX_PANEL_FAILURES: usize = 3;
