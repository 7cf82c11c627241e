//! Slot commands - steer a running daemon's slots from the CLI.
//!
//! The CLI validates strictly and refuses bad input outright, unlike the
//! daemon-side parser which is lenient. A typo at the terminal should be an
//! error, not a silently skipped field.

use anyhow::{Context, Result, bail};
use nix::sys::signal::{Signal, kill};
use nix::unistd::Pid;

use crate::io::lock::get_running_pid;
use crate::io::signals::{command_file_path, format_command};
use crate::slot::registry::SlotCommand;
use crate::slot::{SlotParameters, parse_time_of_day};

/// Handle the on/off/toggle commands.
pub fn handle_switch_command(id: &str, command: SlotCommand) -> Result<()> {
    log_version!();
    send_command(id, &command)?;
    log_end!();
    Ok(())
}

/// Handle the set command: `timeslot set <id> <field> <value> [...]`.
pub fn handle_set_command(id: &str, fields: &[(String, String)]) -> Result<()> {
    log_version!();
    let params = build_parameters(fields)?;
    if params.is_empty() {
        log_decorated!("No fields given, requesting a republish of '{}'", id);
    }
    send_command(id, &SlotCommand::SetParameters(params))?;
    log_end!();
    Ok(())
}

/// Parse CLI field/value pairs into slot parameters, strictly.
fn build_parameters(fields: &[(String, String)]) -> Result<SlotParameters> {
    let mut params = SlotParameters::default();

    for (field, value) in fields {
        match field.as_str() {
            "name" => {
                if value.trim().is_empty() {
                    bail!("Slot name must not be empty");
                }
                params.name = Some(value.clone());
            }
            "enabled" => {
                params.enabled = Some(parse_bool(value)?);
            }
            "start" => {
                params.start = Some(
                    parse_time_of_day(value)
                        .with_context(|| format!("Invalid start time '{}': use HH:MM:SS", value))?,
                );
            }
            "end" => {
                params.end = Some(
                    parse_time_of_day(value)
                        .with_context(|| format!("Invalid end time '{}': use HH:MM:SS", value))?,
                );
            }
            other => bail!(
                "Unknown field '{}': valid fields are name, enabled, start, end",
                other
            ),
        }
    }

    Ok(params)
}

fn parse_bool(value: &str) -> Result<bool> {
    match value.to_ascii_lowercase().as_str() {
        "true" | "yes" | "on" | "1" => Ok(true),
        "false" | "no" | "off" | "0" => Ok(false),
        other => bail!("Invalid boolean '{}': use true or false", other),
    }
}

/// Deliver a slot command to the running daemon.
///
/// Writes the command file keyed by the daemon's PID, then sends SIGUSR1 so
/// the daemon picks it up.
fn send_command(id: &str, command: &SlotCommand) -> Result<()> {
    let pid = match get_running_pid() {
        Ok(pid) => pid,
        Err(e) => {
            log_pipe!();
            log_error!("{e}");
            log_indented!("Start the daemon first: timeslot");
            log_end!();
            std::process::exit(crate::constants::EXIT_FAILURE);
        }
    };

    let command_path = command_file_path(pid);
    std::fs::write(&command_path, format_command(id, command))
        .with_context(|| format!("Failed to write command file {}", command_path.display()))?;

    match kill(Pid::from_raw(pid as i32), Signal::SIGUSR1) {
        Ok(_) => {
            log_block_start!("Sent slot command to timeslot (PID: {pid})");
            log_indented!("Slot: {}", id);
        }
        Err(e) => {
            let _ = std::fs::remove_file(&command_path);
            bail!("Failed to signal daemon: {}", e);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveTime;

    fn pairs(raw: &[(&str, &str)]) -> Vec<(String, String)> {
        raw.iter()
            .map(|(f, v)| (f.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_build_parameters_full() {
        let params = build_parameters(&pairs(&[
            ("name", "Evening"),
            ("enabled", "yes"),
            ("start", "18:00:00"),
            ("end", "23:30"),
        ]))
        .unwrap();

        assert_eq!(params.name.as_deref(), Some("Evening"));
        assert_eq!(params.enabled, Some(true));
        assert_eq!(params.start, NaiveTime::from_hms_opt(18, 0, 0));
        assert_eq!(params.end, NaiveTime::from_hms_opt(23, 30, 0));
    }

    #[test]
    fn test_build_parameters_no_fields_is_empty() {
        let params = build_parameters(&[]).unwrap();
        assert!(params.is_empty());
    }

    #[test]
    fn test_build_parameters_rejects_bad_input() {
        assert!(build_parameters(&pairs(&[("enabled", "maybe")])).is_err());
        assert!(build_parameters(&pairs(&[("start", "25:99")])).is_err());
        assert!(build_parameters(&pairs(&[("name", "  ")])).is_err());
        assert!(build_parameters(&pairs(&[("colour", "blue")])).is_err());
    }

    #[test]
    fn test_parse_bool_variants() {
        for s in ["true", "True", "yes", "on", "1"] {
            assert!(parse_bool(s).unwrap());
        }
        for s in ["false", "FALSE", "no", "off", "0"] {
            assert!(!parse_bool(s).unwrap());
        }
        assert!(parse_bool("2").is_err());
    }
}
