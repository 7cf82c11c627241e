//! Main application entry point and CLI dispatch.
//!
//! This module stays intentionally small: it parses command-line arguments and
//! hands control to the appropriate module. Everything else lives in the library:
//!
//! - `args`: Command-line argument parsing and help/version display
//! - `config`: Configuration loading and validation
//! - `commands`: One-shot subcommands (status, reload, on/off/toggle, set)
//! - `daemon`: The `Daemon` builder that runs the main loop
//! - `logger`: Centralized logging functionality
//!
//! The daemon flow is managed through the `Daemon` builder pattern:
//! - Normal startup: `Daemon::new(debug_enabled).run()`
//! - Simulation: `Daemon::new(debug_enabled).without_lock().without_headers().run()`

use anyhow::Result;

use timeslot::{
    Daemon,
    args::{CliAction, ParsedArgs},
    commands,
    config::set_config_dir,
    constants::EXIT_FAILURE,
    logger::Log,
    slot::registry::SlotCommand,
};

fn main() -> Result<()> {
    let parsed_args = ParsedArgs::parse(std::env::args());

    match parsed_args.action {
        CliAction::ShowVersion => {
            commands::help::display_version();
            Ok(())
        }
        CliAction::ShowHelp => {
            commands::help::display_help();
            Ok(())
        }
        CliAction::ShowHelpDueToError => {
            commands::help::display_help();
            std::process::exit(EXIT_FAILURE);
        }
        CliAction::Run {
            debug_enabled,
            config_dir,
        } => {
            set_config_dir(config_dir)?;
            Daemon::new(debug_enabled).run()
        }
        CliAction::StatusCommand { json, config_dir } => {
            set_config_dir(config_dir)?;
            commands::status::handle_status_command(json)
        }
        CliAction::ReloadCommand { config_dir } => {
            set_config_dir(config_dir)?;
            commands::reload::handle_reload_command()
        }
        CliAction::TurnOnCommand { id, config_dir } => {
            set_config_dir(config_dir)?;
            commands::slot::handle_switch_command(&id, SlotCommand::TurnOn)
        }
        CliAction::TurnOffCommand { id, config_dir } => {
            set_config_dir(config_dir)?;
            commands::slot::handle_switch_command(&id, SlotCommand::TurnOff)
        }
        CliAction::ToggleCommand { id, config_dir } => {
            set_config_dir(config_dir)?;
            commands::slot::handle_switch_command(&id, SlotCommand::Toggle)
        }
        CliAction::SetCommand {
            id,
            fields,
            config_dir,
        } => {
            set_config_dir(config_dir)?;
            commands::slot::handle_set_command(&id, &fields)
        }
        CliAction::SimulateCommand {
            debug_enabled,
            start_time,
            end_time,
            multiplier,
            log_to_file,
            config_dir,
        } => {
            set_config_dir(config_dir)?;

            // Keep the guard alive for the duration of the simulation so the
            // log file is flushed on shutdown
            let _logger_guard = if log_to_file {
                Some(Log::start_file_logging(
                    commands::simulate::simulation_log_filename(),
                )?)
            } else {
                None
            };

            commands::simulate::handle_simulate_command(
                &start_time,
                &end_time,
                multiplier,
                debug_enabled,
            )?;

            // Headers already shown by the simulate command; a lock would
            // interfere with a real instance running alongside the simulation
            Daemon::new(debug_enabled)
                .without_lock()
                .without_headers()
                .run()
        }
    }
}
