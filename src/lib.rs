//! # armshell
//!
//! Operator console shell for a robotic arm controller. The shell drives a
//! small character display with a 12-key keypad, presents a hierarchical menu
//! and supervises the companion programs it launches.
//!
//! - **`core`**: the navigation engine, the process supervisor, the menu
//!   actions and the top level controller.
//! - **`system`**: the collaborators the core talks to (front panel, OS
//!   processes, arm driver, signals).

include!(concat!(env!("OUT_DIR"), "/translations.rs"));

use std::sync::Arc;
use std::sync::atomic::AtomicBool;

/// Process-wide termination request. Monotonic: once set it is never cleared.
pub type CancellationToken = Arc<AtomicBool>;

pub mod cli;
pub mod constants;
pub mod core;
pub mod models;
pub mod system;
