//! Implementation of the simulate command for testing time-based behavior.
//!
//! Sets up a simulated time source so the daemon runs with accelerated time,
//! letting a whole day of window transitions play out in seconds without
//! waiting for real time to pass.

use std::sync::Arc;

use anyhow::Result;
use chrono::Local;

use crate::time::{self, SimulatedTimeSource};

/// Handle the simulate command by setting up a simulated time source.
///
/// Prepares the simulation environment and returns control to main.rs, which
/// then runs the daemon normally but against accelerated simulated time.
///
/// # Arguments
/// * `start_time` - Start time in format "YYYY-MM-DD HH:MM:SS"
/// * `end_time` - End time in format "YYYY-MM-DD HH:MM:SS"
/// * `multiplier` - Time acceleration factor (-1.0 = fast-forward)
/// * `debug_enabled` - Whether debug mode is enabled
pub fn handle_simulate_command(
    start_time: &str,
    end_time: &str,
    multiplier: f64,
    debug_enabled: bool,
) -> Result<()> {
    let start = time::parse_datetime(start_time)
        .map_err(|e| anyhow::anyhow!("Invalid start time: {}", e))?;
    let end =
        time::parse_datetime(end_time).map_err(|e| anyhow::anyhow!("Invalid end time: {}", e))?;

    if end <= start {
        anyhow::bail!("End time must be after start time");
    }

    // -1.0 is the CLI's fast-forward marker; 0.0 is the time source's
    let time_source_multiplier = if multiplier == -1.0 { 0.0 } else { multiplier };

    // Initialize the simulated time source BEFORE any logging so the
    // simulated timestamps appear from the first line
    let sim_source = Arc::new(SimulatedTimeSource::new(start, end, time_source_multiplier));
    time::init_time_source(sim_source);

    log_version!();
    log_block_start!("Simulation Mode");

    let duration = end.signed_duration_since(start);
    log_decorated!(
        "Simulating from {} to {}",
        start.format("%Y-%m-%d %H:%M:%S"),
        end.format("%Y-%m-%d %H:%M:%S")
    );
    log_indented!(
        "Total simulated time: {} hours {} minutes",
        duration.num_hours(),
        duration.num_minutes() % 60
    );

    if time_source_multiplier == 0.0 {
        log_indented!("Time acceleration: fast-forward (instant execution)");
    } else {
        let real_duration_secs = duration.num_seconds() as f64 / time_source_multiplier;
        log_indented!(
            "Time acceleration: {}x (will complete in ~{:.1} seconds)",
            time_source_multiplier as u64,
            real_duration_secs
        );
    }

    log_indented!("Running simulation...");

    if debug_enabled {
        log_pipe!();
        log_debug!("Simulated time source initialized");
    }

    Ok(())
}

/// Suggested log file name for `--log` runs.
pub fn simulation_log_filename() -> String {
    format!(
        "timeslot-simulation-{}.log",
        Local::now().format("%Y%m%d-%H%M%S")
    )
}
