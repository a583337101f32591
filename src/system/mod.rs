//! # System Interaction Layer
//!
//! The collaborators the shell core talks to, each behind a trait so the core
//! can be exercised with in-memory fakes.
//!
//! ## Modules
//!
//! - **`panel`**: the front panel abstraction (display, keypad, OK LED) and the
//!   blocking key wait built on it.
//! - **`fs_panel`**: the panel driver for the filesystem-exposed LCD device.
//! - **`executor`**: starting, polling and terminating OS processes.
//! - **`arm`**: the arm driver operations used by the maintenance menu.
//! - **`signals`**: OS termination signals feeding the cancellation token.

pub mod arm;
pub mod executor;
pub mod fs_panel;
pub mod panel;
pub mod signals;
