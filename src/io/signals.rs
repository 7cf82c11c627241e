//! Signal handling and inter-process communication.
//!
//! A running daemon is steered entirely through Unix signals. SIGUSR2 asks for
//! a configuration reload, SIGTERM/SIGINT/SIGHUP shut it down, and SIGUSR1
//! delivers a slot command whose parameters travel through a small temp file
//! keyed by the daemon's PID (signals themselves carry no payload).
//!
//! The command file format is line-based:
//!
//! ```text
//! toggle            <- action: turn_on, turn_off, toggle or set
//! work              <- slot id
//! enabled=true      <- set only: field=value lines
//! ```

use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;

use anyhow::{Context, Result};
use signal_hook::{
    consts::signal::{SIGHUP, SIGINT, SIGTERM, SIGUSR1, SIGUSR2},
    iterator::Signals,
};

use crate::slot::SlotParameters;
use crate::slot::registry::SlotCommand;

/// Unified signal message type for all signal-based communication
#[derive(Debug, Clone)]
pub enum SignalMessage {
    /// Configuration reload (SIGUSR2 or config watcher)
    Reload,
    /// Slot command delivered via SIGUSR1 command file
    Slot { id: String, command: SlotCommand },
    /// Shutdown (SIGTERM, SIGINT, SIGHUP)
    Shutdown,
}

/// Signal handling state shared between threads
pub struct SignalState {
    /// Atomic flag indicating if the application should keep running
    pub running: Arc<AtomicBool>,
    /// Channel receiver for unified signal messages
    pub signal_receiver: std::sync::mpsc::Receiver<SignalMessage>,
    /// Channel sender for unified signal messages (config watcher feeds this)
    pub signal_sender: std::sync::mpsc::Sender<SignalMessage>,
}

/// Path of the command file used to pass slot command parameters to `pid`.
///
/// Both sides derive this path independently: the CLI writes it before
/// signalling, the daemon's signal thread reads and removes it.
pub fn command_file_path(pid: u32) -> PathBuf {
    let runtime_dir = std::env::var("XDG_RUNTIME_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("/tmp"));
    runtime_dir.join(format!("timeslot-cmd-{pid}.tmp"))
}

/// Serialize a slot command into the command file wire format.
pub fn format_command(id: &str, command: &SlotCommand) -> String {
    match command {
        SlotCommand::TurnOn => format!("turn_on\n{id}\n"),
        SlotCommand::TurnOff => format!("turn_off\n{id}\n"),
        SlotCommand::Toggle => format!("toggle\n{id}\n"),
        SlotCommand::SetParameters(params) => {
            let mut out = format!("set\n{id}\n");
            if let Some(ref name) = params.name {
                out.push_str(&format!("name={name}\n"));
            }
            if let Some(enabled) = params.enabled {
                out.push_str(&format!("enabled={enabled}\n"));
            }
            if let Some(start) = params.start {
                out.push_str(&format!("start={}\n", start.format(crate::constants::TIME_FORMAT)));
            }
            if let Some(end) = params.end {
                out.push_str(&format!("end={}\n", end.format(crate::constants::TIME_FORMAT)));
            }
            out
        }
    }
}

/// Parse the command file contents back into a slot command.
///
/// The daemon side is lenient: unknown fields warn and are skipped, so a
/// newer CLI talking to an older daemon degrades instead of failing.
pub fn parse_command(content: &str) -> Option<(String, SlotCommand)> {
    let mut lines = content.trim().lines();
    let action = lines.next()?.trim();
    let id = lines.next()?.trim();
    if id.is_empty() {
        return None;
    }

    let command = match action {
        "turn_on" => SlotCommand::TurnOn,
        "turn_off" => SlotCommand::TurnOff,
        "toggle" => SlotCommand::Toggle,
        "set" => {
            let mut params = SlotParameters::default();
            for line in lines {
                let Some((field, value)) = line.split_once('=') else {
                    continue;
                };
                match field.trim() {
                    "name" => params.name = Some(value.trim().to_string()),
                    "enabled" => match value.trim().parse::<bool>() {
                        Ok(enabled) => params.enabled = Some(enabled),
                        Err(_) => {
                            log_warning!("Ignoring unparseable enabled value '{}'", value.trim());
                        }
                    },
                    "start" => match crate::slot::parse_time_of_day(value.trim()) {
                        Some(start) => params.start = Some(start),
                        None => {
                            log_warning!("Ignoring unparseable start time '{}'", value.trim());
                        }
                    },
                    "end" => match crate::slot::parse_time_of_day(value.trim()) {
                        Some(end) => params.end = Some(end),
                        None => {
                            log_warning!("Ignoring unparseable end time '{}'", value.trim());
                        }
                    },
                    other => {
                        log_warning!("Ignoring unknown command field '{}'", other);
                    }
                }
            }
            SlotCommand::SetParameters(params)
        }
        _ => return None,
    };

    Some((id.to_string(), command))
}

/// Set up signal handling for the application.
///
/// Returns a SignalState containing the running flag and signal receiver
/// channel. Spawns a background thread that monitors for signals and sends
/// appropriate messages via the channel.
pub fn setup_signal_handler() -> Result<SignalState> {
    let running = Arc::new(AtomicBool::new(true));
    let (signal_sender, signal_receiver) = std::sync::mpsc::channel::<SignalMessage>();

    let mut signals = Signals::new([SIGINT, SIGTERM, SIGHUP, SIGUSR1, SIGUSR2])
        .context("failed to register signal handlers")?;

    let running_clone = running.clone();
    let signal_sender_clone = signal_sender.clone();

    thread::spawn(move || {
        for sig in signals.forever() {
            match sig {
                SIGUSR1 => {
                    let command_path = command_file_path(std::process::id());
                    if let Ok(content) = std::fs::read_to_string(&command_path) {
                        let _ = std::fs::remove_file(&command_path);

                        match parse_command(&content) {
                            Some((id, command)) => {
                                log_pipe!();
                                log_info!("Received slot command for '{}'", id);
                                if signal_sender_clone
                                    .send(SignalMessage::Slot { id, command })
                                    .is_err()
                                {
                                    break;
                                }
                            }
                            None => {
                                log_pipe!();
                                log_warning!("Received SIGUSR1 with a malformed command file");
                            }
                        }
                    }
                }
                SIGUSR2 => {
                    match signal_sender_clone.send(SignalMessage::Reload) {
                        Ok(()) => {
                            log_pipe!();
                            log_info!("Received configuration reload signal");
                        }
                        Err(_) => break,
                    }
                }
                SIGTERM | SIGINT | SIGHUP => {
                    running_clone.store(false, Ordering::SeqCst);
                    if signal_sender_clone.send(SignalMessage::Shutdown).is_err() {
                        break;
                    }
                    break;
                }
                _ => {}
            }
        }
    });

    Ok(SignalState {
        running,
        signal_receiver,
        signal_sender,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveTime;

    #[test]
    fn test_simple_commands_round_trip() {
        for command in [SlotCommand::TurnOn, SlotCommand::TurnOff, SlotCommand::Toggle] {
            let wire = format_command("work", &command);
            let (id, parsed) = parse_command(&wire).unwrap();
            assert_eq!(id, "work");
            assert_eq!(parsed, command);
        }
    }

    #[test]
    fn test_set_command_round_trip() {
        let params = SlotParameters {
            name: Some("Evening".to_string()),
            enabled: Some(true),
            start: NaiveTime::from_hms_opt(18, 0, 0),
            end: NaiveTime::from_hms_opt(23, 30, 0),
        };
        let wire = format_command("evening", &SlotCommand::SetParameters(params.clone()));
        let (id, parsed) = parse_command(&wire).unwrap();
        assert_eq!(id, "evening");
        assert_eq!(parsed, SlotCommand::SetParameters(params));
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(parse_command("").is_none());
        assert!(parse_command("explode\nwork\n").is_none());
        assert!(parse_command("toggle\n\n").is_none());
    }

    #[test]
    fn test_parse_set_skips_bad_fields() {
        crate::logger::Log::set_enabled(false);
        let (_, command) =
            parse_command("set\nwork\nenabled=maybe\nstart=late\nend=06:00:00\nfuture=1\n").unwrap();
        crate::logger::Log::set_enabled(true);
        let SlotCommand::SetParameters(params) = command else {
            panic!("expected set command");
        };
        assert_eq!(params.enabled, None);
        assert_eq!(params.start, None);
        assert_eq!(params.end, NaiveTime::from_hms_opt(6, 0, 0));
    }
}
