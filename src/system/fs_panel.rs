// src/system/fs_panel.rs

//! Front panel exposed as a directory of plain files by the LCD driver
//! (a FUSE mount on the controller, `/mnt/lcdfs` by default).
//!
//! | file        | direction | content                                           |
//! |-------------|-----------|---------------------------------------------------|
//! | `display`   | write     | the whole frame, one row per line                 |
//! | `keys`      | read      | keypad state word, decimal or `0x` hexadecimal    |
//! | `leds`      | write     | LED bitmask, bit 0 is the OK indicator            |
//! | `backlight` | write     | `1` or `0`                                        |
//!
//! The device directory disappearing while the shell runs means the driver
//! went away: it is reported as an external interruption.

use crate::{
    models::{DisplayConfig, Key, KeySet},
    system::panel::{Panel, PanelError},
};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::Duration;

const DISPLAY_FILE: &str = "display";
const KEYS_FILE: &str = "keys";
const LEDS_FILE: &str = "leds";
const BACKLIGHT_FILE: &str = "backlight";

const OK_LED_BIT: u32 = 0;

#[derive(Debug)]
pub struct FsPanel {
    root: PathBuf,
    width: usize,
    height: usize,
    scan_period: Duration,
    frame: Vec<Vec<char>>,
    leds: u32,
}

impl FsPanel {
    /// Opens the panel device described by `config`. The device directory
    /// must exist at this point.
    pub fn open(config: &DisplayConfig) -> Result<Self, PanelError> {
        let root = config.device.clone();
        fs::metadata(&root).map_err(|e| PanelError::Device {
            path: root.display().to_string(),
            source: e,
        })?;
        log::debug!("Front panel device opened at {}", root.display());

        Ok(Self {
            root,
            width: config.width,
            height: config.height,
            scan_period: config.key_scan_period(),
            frame: vec![vec![' '; config.width]; config.height],
            leds: 0,
        })
    }

    /// The text currently shown, one string per row.
    pub fn rows(&self) -> Vec<String> {
        self.frame.iter().map(|row| row.iter().collect()).collect()
    }

    pub fn set_backlight(&mut self, on: bool) -> Result<(), PanelError> {
        self.write_file(BACKLIGHT_FILE, if on { "1" } else { "0" })
    }

    /// Resets the panel to a known state: blank screen, LEDs off, backlight on.
    pub fn reset(&mut self) -> Result<(), PanelError> {
        self.clear()?;
        self.leds_off()?;
        self.set_backlight(true)
    }

    fn path_of(&self, name: &str) -> PathBuf {
        self.root.join(name)
    }

    fn map_io(path: &Path, e: std::io::Error) -> PanelError {
        if e.kind() == ErrorKind::NotFound {
            log::warn!("Front panel file {} vanished", path.display());
            PanelError::Interrupted
        } else {
            PanelError::Device {
                path: path.display().to_string(),
                source: e,
            }
        }
    }

    fn write_file(&self, name: &str, content: &str) -> Result<(), PanelError> {
        let path = self.path_of(name);
        if !self.root.exists() {
            return Err(Self::map_io(&path, ErrorKind::NotFound.into()));
        }
        fs::write(&path, content).map_err(|e| Self::map_io(&path, e))
    }

    fn flush(&self) -> Result<(), PanelError> {
        let mut content = self.rows().join("\n");
        content.push('\n');
        self.write_file(DISPLAY_FILE, &content)
    }

    fn write_leds(&mut self, mask: u32) -> Result<(), PanelError> {
        self.leds = mask;
        self.write_file(LEDS_FILE, &mask.to_string())
    }
}

impl Panel for FsPanel {
    fn width(&self) -> usize {
        self.width
    }

    fn height(&self) -> usize {
        self.height
    }

    fn key_scan_period(&self) -> Duration {
        self.scan_period
    }

    fn clear(&mut self) -> Result<(), PanelError> {
        for row in &mut self.frame {
            row.fill(' ');
        }
        self.flush()
    }

    fn write_at(&mut self, text: &str, line: usize, col: usize) -> Result<(), PanelError> {
        let Some(row) = line.checked_sub(1).and_then(|l| self.frame.get_mut(l)) else {
            log::debug!("Ignoring write to line {} outside of the display", line);
            return Ok(());
        };
        let start = col.saturating_sub(1);
        for (cell, ch) in row.iter_mut().skip(start).zip(text.chars()) {
            *cell = ch;
        }
        self.flush()
    }

    fn current_keys(&mut self) -> Result<KeySet, PanelError> {
        let path = self.path_of(KEYS_FILE);
        let raw = fs::read_to_string(&path).map_err(|e| Self::map_io(&path, e))?;
        parse_key_state(&raw)
    }

    fn set_ok_led(&mut self, on: bool) -> Result<(), PanelError> {
        let mask = if on {
            self.leds | (1 << OK_LED_BIT)
        } else {
            self.leds & !(1 << OK_LED_BIT)
        };
        self.write_leds(mask)
    }

    fn leds_off(&mut self) -> Result<(), PanelError> {
        self.write_leds(0)
    }
}

/// Decodes the keypad state word published by the driver.
pub fn parse_key_state(raw: &str) -> Result<KeySet, PanelError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(KeySet::new());
    }

    let word = match trimmed.strip_prefix("0x").or_else(|| trimmed.strip_prefix("0X")) {
        Some(hex) => u32::from_str_radix(hex, 16),
        None => trimmed.parse::<u32>(),
    }
    .map_err(|_| PanelError::InvalidKeyState(trimmed.to_string()))?;

    if word >> 12 != 0 {
        return Err(PanelError::InvalidKeyState(trimmed.to_string()));
    }

    Ok(Key::all().filter(|k| word & (1 << k.bit()) != 0).collect())
}
