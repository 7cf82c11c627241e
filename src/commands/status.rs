//! Status command - display the daemon's published state.
//!
//! Reads the persisted state file rather than talking to the daemon, so it
//! works whether or not one is currently running (the file always holds the
//! last published records).

use anyhow::Result;

use crate::io::lock::get_running_pid;
use crate::state;

/// Handle the status command.
///
/// # Arguments
/// * `json` - Output the raw record map as JSON instead of the table
pub fn handle_status_command(json: bool) -> Result<()> {
    let records = state::load_snapshots()?;

    if records.is_empty() {
        log_error_standalone!("No published state found");
        println!("  Start the daemon first: timeslot");
        return Ok(());
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&records)?);
        return Ok(());
    }

    log_version!();

    match get_running_pid() {
        Ok(pid) => log_block_start!("Daemon running (PID: {})", pid),
        Err(_) => {
            log_block_start!("Daemon not running");
            log_indented!("Showing last published state");
        }
    }

    log_block_start!(
        "{} slot{} published",
        records.len(),
        if records.len() == 1 { "" } else { "s" }
    );
    for (id, record) in &records {
        log_indented!(
            "{}: {} ({}, {} to {})",
            id,
            record.state,
            if record.attributes.enabled {
                "enabled"
            } else {
                "disabled"
            },
            record.attributes.start,
            record.attributes.end
        );
    }
    log_end!();

    Ok(())
}
