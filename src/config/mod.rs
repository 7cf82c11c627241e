//! Configuration system for timeslot with validation and default generation.
//!
//! Configuration is a single TOML file, `timeslot.toml`, looked up under
//! **XDG_CONFIG_HOME**/timeslot/ (or a custom directory via `--config`). When
//! no file exists a commented default is generated so a first run always has
//! something to start from.
//!
//! ## Configuration Structure
//!
//! ```toml
//! #[Daemon]
//! tick_interval = 60       # Seconds between periodic republishes (10-3600)
//!
//! [slots.work]
//! name = "Work hours"      # Display name
//! enabled = false          # Whether the slot starts enabled
//! start = "08:00:00"       # Window start, inclusive (HH:MM:SS)
//! end = "17:00:00"         # Window end, exclusive (HH:MM:SS)
//! ```
//!
//! Every `[slots.<id>]` table becomes one switch entity. All per-slot fields
//! are optional; fields left out fall back to entity defaults and become
//! eligible for restoration from previously published state.
//!
//! ## Validation and Error Handling
//!
//! Structural problems (bad ids, out-of-range tick interval) fail the load
//! with a pointed error message. Malformed time strings only warn; the entity
//! layer fails them closed to midnight so a typo never stops the daemon.

pub mod builder;
pub mod loading;
pub mod validation;
pub mod watcher;

use std::collections::BTreeMap;
use std::path::PathBuf;

use anyhow::Result;
use serde::Deserialize;

use crate::constants::DEFAULT_TICK_INTERVAL;

// Re-export public API
pub use builder::create_default_config;
pub use loading::{get_config_path, get_custom_config_dir, load, load_from_path, set_config_dir};
pub use watcher::start_config_watcher;

/// Per-slot configuration table.
///
/// All fields optional. A field the user writes here is authoritative: the
/// restore merge will never overwrite it with a previously published value.
#[derive(Debug, Deserialize, Clone, Default, PartialEq)]
pub struct SlotConfig {
    /// Display name for the slot.
    pub name: Option<String>,
    /// Whether the slot starts enabled.
    pub enabled: Option<bool>,
    /// Window start, inclusive (HH:MM:SS).
    pub start: Option<String>,
    /// Window end, exclusive (HH:MM:SS).
    pub end: Option<String>,
}

/// Top-level configuration loaded from `timeslot.toml`.
#[derive(Debug, Deserialize, Clone, Default, PartialEq)]
pub struct Config {
    /// Seconds between periodic republishes (10-3600).
    pub tick_interval: Option<u64>,

    /// One switch entity per table, keyed by id.
    #[serde(default)]
    pub slots: BTreeMap<String, SlotConfig>,
}

impl Config {
    /// Effective tick interval in seconds.
    pub fn tick_interval(&self) -> u64 {
        self.tick_interval.unwrap_or(DEFAULT_TICK_INTERVAL)
    }

    /// Load configuration using the module's load function
    pub fn load() -> Result<Self> {
        load()
    }

    /// Load from path using the module's load_from_path function
    pub fn load_from_path(path: &PathBuf) -> Result<Self> {
        load_from_path(path)
    }

    /// Get configuration path using the module's get_config_path function
    pub fn get_config_path() -> Result<PathBuf> {
        get_config_path()
    }

    /// Log the loaded configuration in the block style of the startup banner.
    pub fn log_config(&self) {
        log_block_start!("Loaded configuration");
        log_indented!("Tick interval: {} seconds", self.tick_interval());

        if self.slots.is_empty() {
            log_indented!("No slots configured");
            return;
        }

        log_indented!(
            "{} slot{} configured",
            self.slots.len(),
            if self.slots.len() == 1 { "" } else { "s" }
        );
        for (id, slot) in &self.slots {
            let label = match &slot.name {
                Some(name) => format!("{} ({})", id, name),
                None => id.clone(),
            };
            log_indented!(
                "{}: {} to {}{}",
                label,
                slot.start.as_deref().unwrap_or("00:00:00"),
                slot.end.as_deref().unwrap_or("00:00:00"),
                if slot.enabled.unwrap_or(false) {
                    ""
                } else {
                    " [disabled]"
                }
            );
        }
    }
}
