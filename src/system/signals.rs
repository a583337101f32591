// src/system/signals.rs

use crate::{CancellationToken, core::commons};

/// Routes SIGINT, SIGTERM and SIGHUP to the termination signal. The handler
/// only performs the atomic store; every blocking wait of the shell notices it
/// on its next check.
pub fn install_termination_handler(token: &CancellationToken) -> Result<(), ctrlc::Error> {
    let token = token.clone();
    ctrlc::set_handler(move || {
        log::info!("termination signal received");
        commons::request_termination(&token);
    })
}
