// src/models.rs

use crate::constants::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

// --- KEYPAD MODELS ---

/// One key of the 12-key front panel keypad.
///
/// The `*` key doubles as `Esc` and the `#` key as `Ok`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Key {
    /// A digit key, `0` to `9`.
    Digit(u8),
    Esc,
    Ok,
}

/// A set of keys, as reported by the keypad or used as an abort combination.
pub type KeySet = BTreeSet<Key>;

impl Key {
    /// Builds a digit key, rejecting values above 9.
    pub fn digit(n: u8) -> Option<Self> {
        (n <= 9).then_some(Self::Digit(n))
    }

    /// The key selecting the choice at `position` (0-based) of a level.
    /// Choice 0 is selected with `1`, choice 8 with `9`.
    pub fn for_position(position: usize) -> Option<Self> {
        let n = u8::try_from(position.checked_add(1)?).ok()?;
        Self::digit(n)
    }

    /// Inverse of [`Key::for_position`].
    pub fn position(self) -> Option<usize> {
        match self {
            Self::Digit(n) if n >= 1 => Some(usize::from(n) - 1),
            _ => None,
        }
    }

    /// Bit index of this key in the keypad state word.
    pub fn bit(self) -> u32 {
        match self {
            Self::Digit(n) => u32::from(n),
            Self::Esc => 10,
            Self::Ok => 11,
        }
    }

    /// Inverse of [`Key::bit`].
    pub fn from_bit(bit: u32) -> Option<Self> {
        match bit {
            0..=9 => u8::try_from(bit).ok().map(Self::Digit),
            10 => Some(Self::Esc),
            11 => Some(Self::Ok),
            _ => None,
        }
    }

    /// All the keys of the keypad, in bit order.
    pub fn all() -> impl Iterator<Item = Self> {
        (0..12).filter_map(Self::from_bit)
    }

    /// The character printed on the physical key.
    pub fn glyph(self) -> char {
        match self {
            Self::Digit(n) => char::from(b'0' + n),
            Self::Esc => CANCEL_GLYPH,
            Self::Ok => OK_GLYPH,
        }
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Digit(n) => write!(f, "{}", n),
            Self::Esc => write!(f, "esc"),
            Self::Ok => write!(f, "ok"),
        }
    }
}

impl FromStr for Key {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "esc" | "*" => Ok(Self::Esc),
            "ok" | "#" => Ok(Self::Ok),
            other => other
                .parse::<u8>()
                .ok()
                .and_then(Self::digit)
                .ok_or_else(|| format!("unknown key '{}'", s)),
        }
    }
}

impl TryFrom<String> for Key {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Key> for String {
    fn from(key: Key) -> Self {
        key.to_string()
    }
}

/// Renders a key combination the way it is printed on the keypad, e.g. `*+#`.
pub fn combo_label(keys: &KeySet) -> String {
    keys.iter()
        .map(|k| k.glyph().to_string())
        .collect::<Vec<_>>()
        .join("+")
}

// --- PROCESS MODELS ---

/// What to start: a program and its arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchSpec {
    pub program: PathBuf,
    pub args: Vec<String>,
}

impl fmt::Display for LaunchSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program.display())?;
        for arg in &self.args {
            write!(f, " {}", arg)?;
        }
        Ok(())
    }
}

/// Exit status of a child process as observed by a poll or a wait.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ExitStatus {
    pub code: Option<i32>,
    pub signal: Option<i32>,
}

impl ExitStatus {
    pub fn from_code(code: i32) -> Self {
        Self {
            code: Some(code),
            signal: None,
        }
    }

    pub fn from_signal(signal: i32) -> Self {
        Self {
            code: None,
            signal: Some(signal),
        }
    }

    pub fn success(&self) -> bool {
        self.code == Some(0)
    }
}

impl fmt::Display for ExitStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.code, self.signal) {
            (Some(code), _) => write!(f, "rc={}", code),
            (None, Some(sig)) => write!(f, "signal={}", sig),
            (None, None) => write!(f, "rc=?"),
        }
    }
}

// --- SHELL MODELS ---

/// A request to leave the shell altogether, raised by the shutdown menu.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitRequest {
    QuitToShell,
    Reboot,
    PowerOff,
}

// --- CONFIGURATION MODELS (armshell.toml) ---

/// The whole shell configuration. Every section and field is optional in the
/// file; missing values take their defaults.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Default)]
#[serde(default, deny_unknown_fields)]
pub struct ShellConfig {
    pub display: DisplayConfig,
    pub supervisor: SupervisorConfig,
    pub programs: ProgramsConfig,
    pub arm: ArmConfig,
    pub system: SystemConfig,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct DisplayConfig {
    pub device: PathBuf,
    pub width: usize,
    pub height: usize,
    pub key_scan_ms: u64,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            device: PathBuf::from(DEFAULT_PANEL_DEVICE),
            width: DEFAULT_DISPLAY_WIDTH,
            height: DEFAULT_DISPLAY_HEIGHT,
            key_scan_ms: DEFAULT_KEY_SCAN_MS,
        }
    }
}

impl DisplayConfig {
    pub fn key_scan_period(&self) -> Duration {
        Duration::from_millis(self.key_scan_ms)
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct SupervisorConfig {
    pub splash_delay_ms: u64,
    pub poll_period_ms: u64,
    /// Keys that must be held together (and nothing else) to kill the program.
    pub abort_combo: KeySet,
}

impl Default for SupervisorConfig {
    fn default() -> Self {
        Self {
            splash_delay_ms: DEFAULT_SPLASH_DELAY_MS,
            poll_period_ms: DEFAULT_POLL_PERIOD_MS,
            abort_combo: [Key::Esc, Key::Ok].into_iter().collect(),
        }
    }
}

impl SupervisorConfig {
    pub fn splash_delay(&self) -> Duration {
        Duration::from_millis(self.splash_delay_ms)
    }

    pub fn poll_period(&self) -> Duration {
        Duration::from_millis(self.poll_period_ms)
    }
}

/// Command lines of the companion programs. Relative program names are
/// resolved against `bin_dir`.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct ProgramsConfig {
    pub bin_dir: String,
    pub demo: String,
    pub gamepad: String,
    pub minitel: String,
    pub web_services: String,
    pub browser_ui: String,
}

impl Default for ProgramsConfig {
    fn default() -> Self {
        Self {
            bin_dir: DEFAULT_BIN_DIR.to_string(),
            demo: "arm-demo-auto".to_string(),
            gamepad: "arm-gamepad".to_string(),
            minitel: "arm-minitel".to_string(),
            web_services: "arm-http-server".to_string(),
            browser_ui: "arm-browser-ui".to_string(),
        }
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Default)]
#[serde(default, deny_unknown_fields)]
pub struct ArmConfig {
    /// Command invoked as `<control_command> <operation>` for each arm operation.
    pub control_command: Option<String>,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct SystemConfig {
    pub reboot_command: String,
    pub poweroff_command: String,
    pub about_delay_ms: u64,
    pub notice_delay_ms: u64,
    pub log_file: String,
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            reboot_command: DEFAULT_REBOOT_COMMAND.to_string(),
            poweroff_command: DEFAULT_POWEROFF_COMMAND.to_string(),
            about_delay_ms: DEFAULT_ABOUT_DELAY_MS,
            notice_delay_ms: DEFAULT_NOTICE_DELAY_MS,
            log_file: DEFAULT_LOG_FILE.to_string(),
        }
    }
}

impl SystemConfig {
    pub fn about_delay(&self) -> Duration {
        Duration::from_millis(self.about_delay_ms)
    }

    pub fn notice_delay(&self) -> Duration {
        Duration::from_millis(self.notice_delay_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_positions_follow_digit_keys() {
        assert_eq!(Key::for_position(0), Some(Key::Digit(1)));
        assert_eq!(Key::for_position(8), Some(Key::Digit(9)));
        assert_eq!(Key::for_position(9), None);
        assert_eq!(Key::Digit(3).position(), Some(2));
        assert_eq!(Key::Digit(0).position(), None);
        assert_eq!(Key::Esc.position(), None);
    }

    #[test]
    fn test_key_bits_cover_the_keypad() {
        let keys: Vec<Key> = Key::all().collect();
        assert_eq!(keys.len(), 12);
        for key in keys {
            assert_eq!(Key::from_bit(key.bit()), Some(key));
        }
        assert_eq!(Key::from_bit(12), None);
    }

    #[test]
    fn test_key_parsing_accepts_names_and_glyphs() {
        assert_eq!("ESC".parse::<Key>(), Ok(Key::Esc));
        assert_eq!("#".parse::<Key>(), Ok(Key::Ok));
        assert_eq!("7".parse::<Key>(), Ok(Key::Digit(7)));
        assert!("10".parse::<Key>().is_err());
        assert!("enter".parse::<Key>().is_err());
    }

    #[test]
    fn test_combo_label_uses_keypad_glyphs() {
        let combo: KeySet = [Key::Ok, Key::Esc].into_iter().collect();
        assert_eq!(combo_label(&combo), "*+#");
    }

    #[test]
    fn test_exit_status_display() {
        assert_eq!(ExitStatus::from_code(3).to_string(), "rc=3");
        assert_eq!(ExitStatus::from_signal(15).to_string(), "signal=15");
        assert!(ExitStatus::from_code(0).success());
        assert!(!ExitStatus::from_signal(9).success());
    }
}
