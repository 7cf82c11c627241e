//! File watching module for hot config reloading.
//!
//! Monitors `timeslot.toml` and feeds reload messages into the main loop so
//! configuration edits apply without a manual reload signal.

use std::path::PathBuf;
use std::sync::mpsc::Sender;
use std::thread;
use std::time::Duration;

use anyhow::{Context, Result};
use notify::{
    Config as NotifyConfig, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher,
};

use super::Config;
use super::loading::private_path;
use crate::io::signals::SignalMessage;

/// Debounce duration for file change events (in milliseconds).
/// This prevents multiple reloads when editors write files in multiple steps.
const DEBOUNCE_MS: u64 = 500;

/// Configuration file watcher that monitors for changes and triggers reloads.
pub struct ConfigWatcher {
    /// Channel sender for sending reload signals to the main loop
    signal_sender: Sender<SignalMessage>,
    /// Whether debug logging is enabled
    debug_enabled: bool,
}

impl ConfigWatcher {
    pub fn new(signal_sender: Sender<SignalMessage>, debug_enabled: bool) -> Self {
        Self {
            signal_sender,
            debug_enabled,
        }
    }

    /// Start watching the configuration file for changes.
    ///
    /// Spawns a background thread that monitors the config file's directory
    /// and sends reload messages when the file changes.
    pub fn start(self) -> Result<()> {
        let config_path = Config::get_config_path()?;
        if !config_path.exists() {
            if self.debug_enabled {
                log_pipe!();
                log_debug!("No configuration file found to watch for hot reload");
            }
            return Ok(());
        }

        // Watch the parent directory rather than the file itself; editors
        // typically replace the file, which breaks a direct file watch.
        let watch_dir: PathBuf = config_path
            .parent()
            .context("Config path has no parent directory")?
            .to_path_buf();

        if self.debug_enabled {
            log_pipe!();
            log_debug!("Starting config file watcher for hot reload:");
            log_indented!("Watching: {}", private_path(&config_path));
        }

        let (tx, rx) = std::sync::mpsc::channel();

        let mut watcher = RecommendedWatcher::new(
            move |res: Result<Event, notify::Error>| {
                if let Ok(event) = res {
                    match event.kind {
                        EventKind::Create(_) | EventKind::Modify(_) | EventKind::Remove(_) => {
                            let _ = tx.send(event);
                        }
                        _ => {}
                    }
                }
            },
            NotifyConfig::default(),
        )
        .context("Failed to create file watcher")?;

        watcher
            .watch(&watch_dir, RecursiveMode::NonRecursive)
            .with_context(|| format!("Failed to watch directory: {}", watch_dir.display()))?;

        let signal_sender = self.signal_sender;
        let debug_enabled = self.debug_enabled;
        let config_name = config_path
            .file_name()
            .map(|n| n.to_os_string())
            .context("Config path has no file name")?;

        thread::spawn(move || {
            // Keep the watcher alive by moving it into the thread
            let _watcher = watcher;
            let mut last_reload_time = std::time::Instant::now();

            for event in rx {
                let affects_config = event
                    .paths
                    .iter()
                    .any(|path| path.file_name() == Some(config_name.as_os_str()));
                if !affects_config {
                    continue;
                }

                // Debounce: ignore events that come too quickly after the last reload
                if last_reload_time.elapsed() < Duration::from_millis(DEBOUNCE_MS) {
                    continue;
                }

                if debug_enabled {
                    log_pipe!();
                    log_info!("Configuration file change detected");
                }

                match signal_sender.send(SignalMessage::Reload) {
                    Ok(()) => {
                        last_reload_time = std::time::Instant::now();
                        if debug_enabled {
                            log_indented!("Triggering automatic configuration reload");
                        }
                    }
                    Err(_) => {
                        // Channel disconnected, exit thread
                        break;
                    }
                }
            }
        });

        Ok(())
    }
}

/// Start the configuration file watcher.
///
/// This is called from the main application to enable hot config reloading.
pub fn start_config_watcher(
    signal_sender: Sender<SignalMessage>,
    debug_enabled: bool,
) -> Result<()> {
    let watcher = ConfigWatcher::new(signal_sender, debug_enabled);
    watcher.start()
}
