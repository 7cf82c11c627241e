//! Command-line argument parsing and processing.
//!
//! This module handles parsing of command-line arguments and provides a clean
//! interface for the main application logic. It supports subcommands for
//! steering a running daemon plus the standard help, version, and debug flags,
//! while gracefully handling unknown options.

/// Represents the parsed command-line arguments and their intended actions.
#[derive(Debug, PartialEq)]
pub enum CliAction {
    /// Run the daemon with these settings
    Run {
        debug_enabled: bool,
        config_dir: Option<String>,
    },
    /// Print the published state of all slots
    StatusCommand {
        json: bool,
        config_dir: Option<String>,
    },
    /// Ask the running daemon to reload its configuration
    ReloadCommand { config_dir: Option<String> },
    /// Enable a slot in the running daemon
    TurnOnCommand {
        id: String,
        config_dir: Option<String>,
    },
    /// Disable a slot in the running daemon
    TurnOffCommand {
        id: String,
        config_dir: Option<String>,
    },
    /// Invert a slot's enabled flag in the running daemon
    ToggleCommand {
        id: String,
        config_dir: Option<String>,
    },
    /// Update slot fields in the running daemon
    SetCommand {
        id: String,
        fields: Vec<(String, String)>,
        config_dir: Option<String>,
    },
    /// Run against simulated time for testing window behavior
    SimulateCommand {
        debug_enabled: bool,
        start_time: String,
        end_time: String,
        multiplier: f64,
        log_to_file: bool,
        config_dir: Option<String>,
    },

    /// Display help information and exit
    ShowHelp,
    /// Display version information and exit
    ShowVersion,
    /// Show help due to unknown arguments and exit
    ShowHelpDueToError,
}

/// Result of parsing command-line arguments.
pub struct ParsedArgs {
    pub action: CliAction,
}

impl ParsedArgs {
    /// Parse command-line arguments into a structured result.
    ///
    /// # Arguments
    /// * `args` - Iterator over command-line arguments (typically from std::env::args())
    ///
    /// # Returns
    /// ParsedArgs containing the determined action
    pub fn parse<I, S>(args: I) -> ParsedArgs
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let args_vec: Vec<String> = args
            .into_iter()
            .skip(1)
            .map(|s| s.as_ref().to_string())
            .collect();

        // Help/version flags take precedence over everything else
        if args_vec
            .iter()
            .any(|arg| arg == "--version" || arg == "-V" || arg == "-v")
        {
            return ParsedArgs {
                action: CliAction::ShowVersion,
            };
        }
        if args_vec.iter().any(|arg| arg == "--help" || arg == "-h") {
            return ParsedArgs {
                action: CliAction::ShowHelp,
            };
        }

        let debug_enabled = args_vec.iter().any(|arg| arg == "--debug" || arg == "-d");

        let config_dir = match parse_config_dir(&args_vec) {
            Ok(dir) => dir,
            Err(action) => return ParsedArgs { action },
        };

        // Find the first non-flag argument, skipping flag values
        let mut command_idx = None;
        let mut idx = 0;
        while idx < args_vec.len() {
            let arg = &args_vec[idx];
            if arg.starts_with('-') {
                if matches!(arg.as_str(), "--config" | "-c") {
                    idx += 2; // Skip the flag and its argument
                } else {
                    idx += 1;
                }
            } else {
                command_idx = Some(idx);
                break;
            }
        }

        let Some(cmd_idx) = command_idx else {
            // No subcommand: run the daemon
            return ParsedArgs {
                action: CliAction::Run {
                    debug_enabled,
                    config_dir,
                },
            };
        };

        let command = args_vec[cmd_idx].as_str();
        let positional: Vec<&String> = args_vec[cmd_idx + 1..]
            .iter()
            .take_while(|arg| !arg.starts_with('-'))
            .collect();

        let action = match command {
            "status" => CliAction::StatusCommand {
                json: args_vec.iter().any(|arg| arg == "--json"),
                config_dir,
            },
            "reload" | "r" => CliAction::ReloadCommand { config_dir },
            "on" | "off" | "toggle" => {
                let Some(id) = positional.first() else {
                    log_warning!("Missing slot id. Usage: timeslot {} <id>", command);
                    return ParsedArgs {
                        action: CliAction::ShowHelpDueToError,
                    };
                };
                let id = (*id).clone();
                match command {
                    "on" => CliAction::TurnOnCommand { id, config_dir },
                    "off" => CliAction::TurnOffCommand { id, config_dir },
                    _ => CliAction::ToggleCommand { id, config_dir },
                }
            }
            "set" | "s" => {
                let Some(id) = positional.first() else {
                    log_warning!(
                        "Missing slot id. Usage: timeslot set <id> <field> <value> [<field> <value>...]"
                    );
                    return ParsedArgs {
                        action: CliAction::ShowHelpDueToError,
                    };
                };
                // Bare `set <id>` is valid: it asks the daemon for a no-op
                // republish of the slot's current state
                let pairs = &positional[1..];
                if pairs.len() % 2 != 0 {
                    log_warning!(
                        "Missing value for field. Usage: timeslot set <id> <field> <value> [<field> <value>...]"
                    );
                    log_warning!("Example: timeslot set work enabled true");
                    log_warning!("Example: timeslot set night start 21:00:00 end 05:30:00");
                    return ParsedArgs {
                        action: CliAction::ShowHelpDueToError,
                    };
                }
                let fields = pairs
                    .chunks(2)
                    .map(|pair| (pair[0].clone(), pair[1].clone()))
                    .collect();
                CliAction::SetCommand {
                    id: (*id).clone(),
                    fields,
                    config_dir,
                }
            }
            "simulate" => {
                let args_after = &args_vec[cmd_idx + 1..];
                match parse_simulate(args_after) {
                    Some((start_time, end_time, multiplier)) => CliAction::SimulateCommand {
                        debug_enabled,
                        start_time,
                        end_time,
                        multiplier,
                        log_to_file: args_after.iter().any(|arg| arg == "--log"),
                        config_dir,
                    },
                    None => {
                        return ParsedArgs {
                            action: CliAction::ShowHelpDueToError,
                        };
                    }
                }
            }
            _ => {
                log_warning!("Unknown command: {}", command);
                CliAction::ShowHelpDueToError
            }
        };

        ParsedArgs { action }
    }
}

fn parse_config_dir(args_vec: &[String]) -> Result<Option<String>, CliAction> {
    let Some(idx) = args_vec
        .iter()
        .position(|arg| arg == "--config" || arg == "-c")
    else {
        return Ok(None);
    };

    match args_vec.get(idx + 1) {
        Some(dir) if !dir.starts_with('-') => Ok(Some(dir.clone())),
        _ => {
            log_warning!("Missing directory for --config. Usage: --config <directory>");
            Err(CliAction::ShowHelpDueToError)
        }
    }
}

/// Parse `simulate <start> <end> [multiplier | --fast-forward]`.
///
/// Returns the start and end datetime strings plus the multiplier, with -1.0
/// as the fast-forward marker. Full datetime parsing happens in the simulate
/// command; this only checks the rough shape.
fn parse_simulate(args: &[String]) -> Option<(String, String, f64)> {
    let validate_datetime = |s: &str| -> bool {
        s.len() == 19
            && s.chars().nth(4) == Some('-')
            && s.chars().nth(7) == Some('-')
            && s.chars().nth(10) == Some(' ')
            && s.chars().nth(13) == Some(':')
            && s.chars().nth(16) == Some(':')
    };

    let positional: Vec<&String> = args.iter().take_while(|arg| !arg.starts_with('-')).collect();
    if positional.len() < 2 {
        log_warning!(
            "Missing arguments for simulate. Usage: timeslot simulate \"YYYY-MM-DD HH:MM:SS\" \"YYYY-MM-DD HH:MM:SS\" [multiplier | --fast-forward] [--log]"
        );
        return None;
    }

    let start = positional[0];
    let end = positional[1];
    for value in [start, end] {
        if !validate_datetime(value) {
            log_error!("Invalid time format: '{}'. Use YYYY-MM-DD HH:MM:SS", value);
            return None;
        }
    }

    let multiplier = if args.iter().any(|arg| arg == "--fast-forward") {
        -1.0
    } else if let Some(mult_str) = positional.get(2) {
        match mult_str.parse::<f64>() {
            Ok(mult) if (0.1..=3600.0).contains(&mult) => mult,
            _ => {
                log_error!(
                    "Invalid multiplier: {}. Must be between 0.1 and 3600.",
                    mult_str
                );
                return None;
            }
        }
    } else {
        1.0
    };

    Some((start.clone(), end.clone(), multiplier))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> CliAction {
        let mut full = vec!["timeslot"];
        full.extend_from_slice(args);
        ParsedArgs::parse(full).action
    }

    #[test]
    fn test_no_args_runs_daemon() {
        assert_eq!(
            parse(&[]),
            CliAction::Run {
                debug_enabled: false,
                config_dir: None,
            }
        );
    }

    #[test]
    fn test_debug_and_config_flags() {
        assert_eq!(
            parse(&["--debug", "--config", "/tmp/conf"]),
            CliAction::Run {
                debug_enabled: true,
                config_dir: Some("/tmp/conf".to_string()),
            }
        );
    }

    #[test]
    fn test_help_and_version() {
        assert_eq!(parse(&["--help"]), CliAction::ShowHelp);
        assert_eq!(parse(&["-V"]), CliAction::ShowVersion);
        // Help wins even with a subcommand present
        assert_eq!(parse(&["status", "--help"]), CliAction::ShowHelp);
    }

    #[test]
    fn test_status_command() {
        assert_eq!(
            parse(&["status"]),
            CliAction::StatusCommand {
                json: false,
                config_dir: None,
            }
        );
        assert_eq!(
            parse(&["status", "--json"]),
            CliAction::StatusCommand {
                json: true,
                config_dir: None,
            }
        );
    }

    #[test]
    fn test_switch_commands() {
        assert_eq!(
            parse(&["on", "work"]),
            CliAction::TurnOnCommand {
                id: "work".to_string(),
                config_dir: None,
            }
        );
        assert_eq!(
            parse(&["off", "work"]),
            CliAction::TurnOffCommand {
                id: "work".to_string(),
                config_dir: None,
            }
        );
        assert_eq!(
            parse(&["toggle", "night"]),
            CliAction::ToggleCommand {
                id: "night".to_string(),
                config_dir: None,
            }
        );
    }

    #[test]
    fn test_switch_requires_id() {
        crate::logger::Log::set_enabled(false);
        let action = parse(&["toggle"]);
        crate::logger::Log::set_enabled(true);
        assert_eq!(action, CliAction::ShowHelpDueToError);
    }

    #[test]
    fn test_set_command_pairs() {
        assert_eq!(
            parse(&["set", "work", "enabled", "true", "start", "09:00:00"]),
            CliAction::SetCommand {
                id: "work".to_string(),
                fields: vec![
                    ("enabled".to_string(), "true".to_string()),
                    ("start".to_string(), "09:00:00".to_string()),
                ],
                config_dir: None,
            }
        );
    }

    #[test]
    fn test_set_with_no_fields_is_noop_republish() {
        // A bare set asks the daemon to republish the slot unchanged
        assert_eq!(
            parse(&["set", "work"]),
            CliAction::SetCommand {
                id: "work".to_string(),
                fields: vec![],
                config_dir: None,
            }
        );
    }

    #[test]
    fn test_set_rejects_dangling_field() {
        crate::logger::Log::set_enabled(false);
        let action = parse(&["set", "work", "enabled"]);
        crate::logger::Log::set_enabled(true);
        assert_eq!(action, CliAction::ShowHelpDueToError);
    }

    #[test]
    fn test_simulate_command() {
        assert_eq!(
            parse(&[
                "simulate",
                "2025-06-01 20:00:00",
                "2025-06-02 08:00:00",
                "60"
            ]),
            CliAction::SimulateCommand {
                debug_enabled: false,
                start_time: "2025-06-01 20:00:00".to_string(),
                end_time: "2025-06-02 08:00:00".to_string(),
                multiplier: 60.0,
                log_to_file: false,
                config_dir: None,
            }
        );
    }

    #[test]
    fn test_simulate_fast_forward() {
        let action = parse(&[
            "simulate",
            "2025-06-01 20:00:00",
            "2025-06-02 08:00:00",
            "--fast-forward",
            "--log",
        ]);
        assert_eq!(
            action,
            CliAction::SimulateCommand {
                debug_enabled: false,
                start_time: "2025-06-01 20:00:00".to_string(),
                end_time: "2025-06-02 08:00:00".to_string(),
                multiplier: -1.0,
                log_to_file: true,
                config_dir: None,
            }
        );
    }

    #[test]
    fn test_simulate_rejects_bad_datetime() {
        crate::logger::Log::set_enabled(false);
        let action = parse(&["simulate", "20:00:00", "2025-06-02 08:00:00"]);
        crate::logger::Log::set_enabled(true);
        assert_eq!(action, CliAction::ShowHelpDueToError);
    }

    #[test]
    fn test_unknown_command_is_error() {
        crate::logger::Log::set_enabled(false);
        let action = parse(&["explode"]);
        crate::logger::Log::set_enabled(true);
        assert_eq!(action, CliAction::ShowHelpDueToError);
    }
}
