//! Implementation of the reload command.
//!
//! Validates the configuration locally before signalling, so a broken config
//! produces an error at the terminal instead of a warning buried in the
//! daemon's log.

use anyhow::Result;
use nix::sys::signal::{Signal, kill};
use nix::unistd::Pid;

use crate::io::lock::get_running_pid;

/// Handle the reload command: signal a running daemon to reload its config.
pub fn handle_reload_command() -> Result<()> {
    log_version!();

    // Fail fast on a broken config before bothering the daemon
    let _ = crate::config::Config::load()?;

    match get_running_pid() {
        Ok(pid) => {
            log_block_start!("Signaling timeslot to reload...");
            match kill(Pid::from_raw(pid as i32), Signal::SIGUSR2) {
                Ok(_) => {
                    log_decorated!("Sent reload signal to timeslot (PID: {pid})");
                    log_indented!("Running daemon will reload its configuration");
                }
                Err(e) => {
                    log_pipe!();
                    log_error!("Failed to signal daemon: {e}");
                }
            }
        }
        Err(e) => {
            log_pipe!();
            log_error!("{e}");
            log_indented!("Start the daemon first: timeslot");
        }
    }

    log_end!();
    Ok(())
}
