//! Core application logic: the daemon's main loop.
//!
//! This module runs the continuous publish loop. It handles:
//!
//! - Periodic republication of every slot's state on the tick interval
//! - Window boundary detection between ticks
//! - Signal processing (SIGUSR1 slot commands, SIGUSR2 reload)
//! - Configuration hot-reloading with live state carried across the rebuild
//!
//! The `Core` struct owns all runtime state, providing encapsulation and
//! making the loop easier to test and reason about.

use std::fs::File;
use std::sync::atomic::Ordering;
use std::time::Duration;

use anyhow::Result;

use crate::config::{self, Config};
use crate::io::signals::{SignalMessage, SignalState};
use crate::slot::registry::Registry;
use crate::state::snapshot::StateSink;

/// Parameters for creating a Core instance.
///
/// Bundles all the dependencies needed to create a Core, avoiding a
/// constructor with too many positional arguments.
pub(crate) struct CoreParams {
    pub config: Config,
    pub registry: Registry,
    pub sink: Box<dyn StateSink>,
    pub signal_state: SignalState,
    pub debug_enabled: bool,
    pub lock_info: Option<(File, String)>,
}

/// The daemon's main loop state.
pub(crate) struct Core {
    config: Config,
    registry: Registry,
    sink: Box<dyn StateSink>,
    signal_state: SignalState,
    debug_enabled: bool,
    lock_info: Option<(File, String)>,
}

impl Core {
    pub fn new(params: CoreParams) -> Self {
        Self {
            config: params.config,
            registry: params.registry,
            sink: params.sink,
            signal_state: params.signal_state,
            debug_enabled: params.debug_enabled,
            lock_info: params.lock_info,
        }
    }

    /// Execute the core application logic.
    pub fn execute(mut self) -> Result<()> {
        if let Some(custom_dir) = config::get_custom_config_dir() {
            log_block_start!(
                "Base directory: {}",
                config::loading::private_path(&custom_dir)
            );
        }

        // Publish every slot's state before looping, so the state file
        // reflects the effective post-restore configuration immediately
        let now = crate::time::now().time();
        self.registry.publish_all(self.sink.as_mut(), now)?;
        self.log_slot_states(now);

        self.main_loop()?;

        self.cleanup();
        Ok(())
    }

    fn log_slot_states(&self, now: chrono::NaiveTime) {
        if self.registry.is_empty() {
            log_block_start!("No slots configured");
            log_indented!("Add [slots.<id>] tables to timeslot.toml");
            return;
        }

        log_block_start!(
            "Watching {} slot{}",
            self.registry.len(),
            if self.registry.len() == 1 { "" } else { "s" }
        );
        for (id, slot) in self.registry.iter() {
            log_indented!(
                "{}: {} ({} to {})",
                id,
                slot.state(now),
                slot.start().format(crate::constants::TIME_FORMAT),
                slot.end().format(crate::constants::TIME_FORMAT)
            );
        }
    }

    /// Run the main loop until shutdown.
    ///
    /// The loop blocks in `recv_timeout` on the signal channel, so signals
    /// are handled immediately while ticks fire on the configured interval.
    fn main_loop(&mut self) -> Result<()> {
        use std::sync::mpsc::RecvTimeoutError;

        let mut previous_active = {
            let now = crate::time::now().time();
            self.registry.active_map(now)
        };

        while self.signal_state.running.load(Ordering::SeqCst)
            && !crate::time::simulation_ended()
        {
            let tick = Duration::from_secs(self.config.tick_interval());

            // In simulation mode crate::time::sleep handles the time scaling,
            // so the tick runs on a helper thread while we poll for signals.
            let recv_result = if crate::time::is_simulated() {
                let sleep_handle = std::thread::spawn(move || {
                    crate::time::sleep(tick);
                });

                loop {
                    match self
                        .signal_state
                        .signal_receiver
                        .recv_timeout(Duration::from_millis(10))
                    {
                        Ok(msg) => break Ok(msg),
                        Err(RecvTimeoutError::Timeout) => {
                            if sleep_handle.is_finished() {
                                break Err(RecvTimeoutError::Timeout);
                            }
                        }
                        Err(e) => break Err(e),
                    }
                }
            } else {
                self.signal_state.signal_receiver.recv_timeout(tick)
            };

            match recv_result {
                Ok(SignalMessage::Shutdown) => break,
                Ok(SignalMessage::Reload) => {
                    self.handle_config_reload();
                    previous_active = self.registry.active_map(crate::time::now().time());
                }
                Ok(SignalMessage::Slot { id, command }) => {
                    let now = crate::time::now().time();
                    match self.registry.dispatch(&id, &command, self.sink.as_mut(), now) {
                        Ok(()) => {
                            if let Some(slot) = self.registry.get(&id) {
                                log_indented!("{}: {}", id, slot.state(now));
                            }
                            previous_active = self.registry.active_map(now);
                        }
                        Err(e) => {
                            log_pipe!();
                            log_error!("Slot command failed: {e}");
                        }
                    }
                }
                Err(RecvTimeoutError::Timeout) => {
                    // Tick: republish everything and report boundary crossings
                    let now = crate::time::now().time();
                    let current_active = self.registry.active_map(now);

                    for (id, active) in &current_active {
                        if previous_active.get(id) != Some(active) {
                            log_block_start!(
                                "Slot '{}' switched {}",
                                id,
                                if *active { "on" } else { "off" }
                            );
                        }
                    }
                    previous_active = current_active;

                    if let Err(e) = self.registry.publish_all(self.sink.as_mut(), now) {
                        log_pipe!();
                        log_error!("Failed to publish state: {e}");
                        log_decorated!("Will retry on next tick...");
                    } else if self.debug_enabled {
                        log_debug!(
                            "Tick at {}: republished {} slot(s)",
                            now.format(crate::constants::TIME_FORMAT),
                            self.registry.len()
                        );
                    }
                }
                Err(RecvTimeoutError::Disconnected) => {
                    if self.signal_state.running.load(Ordering::SeqCst) {
                        log_pipe!();
                        log_error!("Signal handler disconnected unexpectedly");
                        log_indented!("Shutting down");
                    }
                    break;
                }
            }
        }

        Ok(())
    }

    /// Reload configuration, carrying live runtime state across the rebuild.
    ///
    /// The rebuilt slots go through the same restore merge used at startup,
    /// with the current in-memory attributes playing the role of the saved
    /// snapshot: newly configured fields win, everything else survives.
    fn handle_config_reload(&mut self) {
        let new_config = match Config::load() {
            Ok(config) => config,
            Err(e) => {
                log_pipe!();
                log_error!("Failed to reload config: {e}");
                log_indented!("Continuing with previous configuration");
                return;
            }
        };

        let now = crate::time::now().time();
        let live_state = self.registry.attributes(now);

        let mut registry = Registry::from_config(&new_config);
        registry.restore_from(&live_state);

        self.config = new_config;
        self.registry = registry;

        log_block_start!("Configuration reloaded");
        if let Err(e) = self.registry.publish_all(self.sink.as_mut(), now) {
            log_pipe!();
            log_error!("Failed to publish state after reload: {e}");
        }
        self.log_slot_states(now);
    }

    fn cleanup(&mut self) {
        if let Some((lock_file, lock_path)) = self.lock_info.take() {
            drop(lock_file);
            let _ = std::fs::remove_file(&lock_path);
        }

        log_block_start!("Shutting down timeslot...");
        log_end!();
    }
}
