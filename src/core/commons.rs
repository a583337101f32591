// src/core/commons.rs

// Helpers shared by the navigation engine, the supervisor and the screens.

use crate::{CancellationToken, constants::SLEEP_SLICE_MS};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};
use thiserror::Error;

/// Returned by blocking helpers when the termination signal is observed.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("Operation interrupted by a termination request.")]
pub struct Interrupted;

pub fn new_cancellation_token() -> CancellationToken {
    Arc::new(AtomicBool::new(false))
}

/// Sets the termination signal. A single atomic store: idempotent, never
/// blocks, callable from a signal handler thread.
pub fn request_termination(token: &CancellationToken) {
    token.store(true, Ordering::SeqCst);
}

pub fn is_terminated(token: &CancellationToken) -> bool {
    token.load(Ordering::SeqCst)
}

pub fn check_for_cancellation(token: &CancellationToken) -> Result<(), Interrupted> {
    if is_terminated(token) {
        Err(Interrupted)
    } else {
        Ok(())
    }
}

/// Sleeps for `duration`, waking up every few tens of milliseconds to check
/// the termination signal.
pub fn interruptible_sleep(duration: Duration, token: &CancellationToken) -> Result<(), Interrupted> {
    let deadline = Instant::now() + duration;
    loop {
        check_for_cancellation(token)?;
        let now = Instant::now();
        if now >= deadline {
            return Ok(());
        }
        let remaining = deadline - now;
        std::thread::sleep(remaining.min(Duration::from_millis(SLEEP_SLICE_MS)));
    }
}

/// Keeps at most `width` characters of `text`.
pub fn clip(text: &str, width: usize) -> String {
    text.chars().take(width).collect()
}

/// Cuts the first line of `message` into at most `max_lines` chunks of
/// `width` characters, for display on consecutive panel lines.
pub fn split_for_display(message: &str, width: usize, max_lines: usize) -> Vec<String> {
    let first_line: Vec<char> = message.trim().lines().next().unwrap_or("").chars().collect();
    if width == 0 {
        return Vec::new();
    }
    first_line
        .chunks(width)
        .take(max_lines)
        .map(|chunk| chunk.iter().collect())
        .collect()
}

/// The last non-empty line of an error message, usually the most specific one.
pub fn last_line(message: &str) -> &str {
    message
        .trim()
        .lines()
        .rev()
        .find(|l| !l.trim().is_empty())
        .map(str::trim)
        .unwrap_or("")
}
