//! Application coordinator that manages the complete lifecycle of the daemon.
//!
//! This module handles resource acquisition, initialization, and orchestration
//! of the core loop. It manages:
//! - Configuration loading
//! - Restoring previously published state into the slot registry
//! - Lock file management for single-instance enforcement
//! - Signal handler setup and the config watcher
//!
//! The `Daemon` struct uses a builder pattern to support different startup
//! contexts:
//! - Normal startup: `Daemon::new(debug_enabled).run()`
//! - Simulation mode: `Daemon::new(debug_enabled).without_lock().without_headers().run()`

use anyhow::{Context, Result};

use crate::config::{self, Config};
use crate::constants::EXIT_FAILURE;
use crate::core::{Core, CoreParams};
use crate::io::lock::acquire_lock;
use crate::io::signals::setup_signal_handler;
use crate::slot::registry::Registry;
use crate::state;
use crate::state::snapshot::FileSink;

/// Builder for configuring and running the daemon.
pub struct Daemon {
    debug_enabled: bool,
    create_lock: bool,
    show_headers: bool,
}

impl Daemon {
    /// Create a new runner with defaults matching normal run
    pub fn new(debug_enabled: bool) -> Self {
        Self {
            debug_enabled,
            create_lock: true,
            show_headers: true,
        }
    }

    /// Skip lock file creation (for simulation mode)
    pub fn without_lock(mut self) -> Self {
        self.create_lock = false;
        self
    }

    /// Skip header display
    pub fn without_headers(mut self) -> Self {
        self.show_headers = false;
        self
    }

    /// Execute the daemon with the configured settings.
    ///
    /// Handles the complete lifecycle: configuration loading, state
    /// restoration, lock file management, signal handler setup, the main
    /// loop, and graceful shutdown.
    pub fn run(self) -> Result<()> {
        if self.show_headers {
            log_version!();
        }

        // Load and validate configuration first
        let config = match Config::load() {
            Ok(config) => config,
            Err(e) => {
                log_error_exit!("Configuration failed");
                eprintln!("{:?}", e);
                std::process::exit(EXIT_FAILURE);
            }
        };

        // Handle lock file BEFORE any debug output from watchers
        let lock_info = if self.create_lock {
            let (lock_file, lock_path) = acquire_lock()?;
            Some((lock_file, lock_path))
        } else {
            None
        };

        let signal_state = setup_signal_handler()?;

        // Config watcher for hot reload (graceful degradation if unavailable)
        if let Err(e) =
            config::start_config_watcher(signal_state.signal_sender.clone(), self.debug_enabled)
            && self.debug_enabled
        {
            log_pipe!();
            log_warning!("Config file watching unavailable: {}", e);
            log_indented!("Hot config reload disabled, use SIGUSR2 for manual reload");
        }

        config.log_config();

        // Build the registry and merge in previously published state.
        // Configured fields win; everything else picks up where the last
        // run left off.
        let mut registry = Registry::from_config(&config);
        match state::load_snapshots() {
            Ok(snapshots) => {
                if !snapshots.is_empty() {
                    registry.restore_from(&snapshots);
                    log_block_start!("Restored previously published state");
                }
            }
            Err(e) => {
                log_pipe!();
                log_warning!("Could not restore previous state: {e}");
                log_indented!("Starting from configured values");
            }
        }

        let state_path = state::state_file_path()?;
        let sink = FileSink::new(state_path).context("Failed to open state file")?;

        if lock_info.is_some() {
            log_block_start!("Lock acquired, starting timeslot...");
        }

        let core = Core::new(CoreParams {
            config,
            registry,
            sink: Box::new(sink),
            signal_state,
            debug_enabled: self.debug_enabled,
            lock_info,
        });

        core.execute()?;

        Ok(())
    }
}
