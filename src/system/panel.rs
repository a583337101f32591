// src/system/panel.rs

//! The front panel seen by the rest of the shell: a character display, a
//! keypad and an OK indicator LED.
//!
//! Lines and columns are 1-based, as printed in the panel documentation.

use crate::{
    CancellationToken,
    constants::BLINK_HALF_PERIOD_MS,
    core::commons,
    models::{Key, KeySet},
};
use std::time::{Duration, Instant};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PanelError {
    /// The panel layer (or the termination signal) asked the shell to unwind.
    #[error("Front panel reported an external interruption.")]
    Interrupted,
    #[error("Front panel device error on '{path}': {source}")]
    Device {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Invalid keypad state '{0}'.")]
    InvalidKeyState(String),
}

impl From<commons::Interrupted> for PanelError {
    fn from(_: commons::Interrupted) -> Self {
        Self::Interrupted
    }
}

/// Options of a blocking key wait.
#[derive(Debug, Clone, Copy, Default)]
pub struct WaitOptions {
    /// Give up after this long. `None` waits forever.
    pub timeout: Option<Duration>,
    /// Flash the OK indicator while waiting.
    pub blink: bool,
}

impl WaitOptions {
    pub fn blinking() -> Self {
        Self {
            timeout: None,
            blink: true,
        }
    }
}

pub trait Panel {
    fn width(&self) -> usize;
    fn height(&self) -> usize;

    /// Delay between two keypad scans in [`Panel::wait_for_key`].
    fn key_scan_period(&self) -> Duration;

    fn clear(&mut self) -> Result<(), PanelError>;

    /// Writes `text` at `line`/`col`, clipping what overflows the line.
    fn write_at(&mut self, text: &str, line: usize, col: usize) -> Result<(), PanelError>;

    fn current_keys(&mut self) -> Result<KeySet, PanelError>;

    fn set_ok_led(&mut self, on: bool) -> Result<(), PanelError>;

    fn leds_off(&mut self) -> Result<(), PanelError>;

    fn center_text_at(&mut self, text: &str, line: usize) -> Result<(), PanelError> {
        let clipped = commons::clip(text, self.width());
        let col = (self.width() - clipped.chars().count()) / 2 + 1;
        self.write_at(&clipped, line, col)
    }

    /// Blocks until one of `keys` goes down.
    ///
    /// Keys already held when the wait starts must be released and pressed
    /// again. Returns `Ok(None)` on timeout and `Err(PanelError::Interrupted)`
    /// as soon as `token` is set.
    fn wait_for_key(
        &mut self,
        keys: &KeySet,
        options: WaitOptions,
        token: &CancellationToken,
    ) -> Result<Option<Key>, PanelError> {
        let mut blink = options.blink.then(Blinker::new);
        if let Some(blinker) = blink.as_mut() {
            blinker.toggle(self)?;
        }

        let outcome = scan_for_key(self, keys, options.timeout, blink.as_mut(), token);

        if blink.is_some_and(|b| b.lit) {
            // Never leave the indicator lit behind us, but keep the wait's own outcome.
            if let Err(e) = self.set_ok_led(false) {
                log::debug!("Could not switch the OK indicator off: {}", e);
            }
        }
        outcome
    }
}

/// State of the flashing OK indicator during a key wait.
#[derive(Debug)]
struct Blinker {
    lit: bool,
    last_toggle: Instant,
}

impl Blinker {
    fn new() -> Self {
        Self {
            lit: false,
            last_toggle: Instant::now(),
        }
    }

    fn toggle<P: Panel + ?Sized>(&mut self, panel: &mut P) -> Result<(), PanelError> {
        self.lit = !self.lit;
        self.last_toggle = Instant::now();
        panel.set_ok_led(self.lit)
    }

    fn tick<P: Panel + ?Sized>(&mut self, panel: &mut P) -> Result<(), PanelError> {
        if self.last_toggle.elapsed() >= Duration::from_millis(BLINK_HALF_PERIOD_MS) {
            self.toggle(panel)?;
        }
        Ok(())
    }
}

fn scan_for_key<P: Panel + ?Sized>(
    panel: &mut P,
    keys: &KeySet,
    timeout: Option<Duration>,
    mut blink: Option<&mut Blinker>,
    token: &CancellationToken,
) -> Result<Option<Key>, PanelError> {
    let started = Instant::now();
    let mut previous = panel.current_keys()?;

    loop {
        if commons::is_terminated(token) {
            return Err(PanelError::Interrupted);
        }
        if timeout.is_some_and(|t| started.elapsed() >= t) {
            return Ok(None);
        }

        std::thread::sleep(panel.key_scan_period());

        let pressed = panel.current_keys()?;
        if let Some(key) = pressed.difference(&previous).find(|k| keys.contains(*k)) {
            return Ok(Some(*key));
        }
        previous = pressed;

        if let Some(blinker) = blink.as_deref_mut() {
            blinker.tick(panel)?;
        }
    }
}
