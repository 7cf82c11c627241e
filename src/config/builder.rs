//! Default configuration file creation.
//!
//! Builds the commented default `timeslot.toml` through a small builder that
//! keeps setting comments aligned, so changing a default in constants.rs never
//! leaves the generated file ragged.

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};

use super::loading::private_path;
use crate::constants::{DEFAULT_TICK_INTERVAL, MAXIMUM_TICK_INTERVAL, MINIMUM_TICK_INTERVAL};

/// Create a default config file at `path`.
///
/// The generated file has the daemon settings plus one disabled example slot
/// so the table syntax is on display without anything switching on by itself.
pub fn create_default_config(path: &PathBuf) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).context("Failed to create config directory")?;
    }

    let config_content = ConfigBuilder::new()
        .add_section("Daemon")
        .add_setting(
            "tick_interval",
            &DEFAULT_TICK_INTERVAL.to_string(),
            &format!(
                "Seconds between periodic republishes ({MINIMUM_TICK_INTERVAL}-{MAXIMUM_TICK_INTERVAL})"
            ),
        )
        .add_table("slots.example")
        .add_setting("name", "\"Example window\"", "Display name")
        .add_setting("enabled", "false", "Whether the slot starts enabled")
        .add_setting("start", "\"08:00:00\"", "Window start, inclusive (HH:MM:SS)")
        .add_setting("end", "\"17:00:00\"", "Window end, exclusive (HH:MM:SS)")
        .build();

    fs::write(path, config_content).context("Failed to write default config file")?;

    log_block_start!("Created default configuration");
    log_indented!("{}", private_path(path));

    Ok(())
}

/// Builder for creating dynamically-aligned configuration files.
///
/// Maintains comment alignment by calculating the maximum width of all
/// setting lines and applying consistent padding.
struct ConfigBuilder {
    entries: Vec<ConfigEntry>,
}

#[derive(Clone)]
struct ConfigEntry {
    content: String,
    entry_type: EntryType,
}

#[derive(Clone)]
enum EntryType {
    Header,
    Setting { line: String, comment: String },
}

impl ConfigBuilder {
    fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Decorative section header, `#[Title]`.
    fn add_section(mut self, title: &str) -> Self {
        self.entries.push(ConfigEntry {
            content: format!("#[{title}]"),
            entry_type: EntryType::Header,
        });
        self
    }

    /// Real TOML table header, `[name]`.
    fn add_table(mut self, name: &str) -> Self {
        self.entries.push(ConfigEntry {
            content: format!("[{name}]"),
            entry_type: EntryType::Header,
        });
        self
    }

    fn add_setting(mut self, key: &str, value: &str, comment: &str) -> Self {
        let line = format!("{key} = {value}");
        self.entries.push(ConfigEntry {
            content: line.clone(),
            entry_type: EntryType::Setting {
                line,
                comment: format!("# {comment}"),
            },
        });
        self
    }

    fn build(self) -> String {
        let max_width = self
            .entries
            .iter()
            .filter_map(|entry| match &entry.entry_type {
                EntryType::Setting { line, .. } => Some(line.len()),
                EntryType::Header => None,
            })
            .max()
            .unwrap_or(0)
            + 1; // one space between setting and comment

        let mut result = Vec::new();
        let mut first_header = true;

        for entry in self.entries {
            match entry.entry_type {
                EntryType::Header => {
                    if !first_header {
                        result.push(String::new());
                    }
                    result.push(entry.content);
                    first_header = false;
                }
                EntryType::Setting { line, comment } => {
                    let padding = " ".repeat(max_width - line.len());
                    result.push(format!("{line}{padding}{comment}"));
                }
            }
        }

        result.push(String::new());
        result.join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_parses() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("timeslot.toml");
        crate::logger::Log::set_enabled(false);
        create_default_config(&path).unwrap();
        crate::logger::Log::set_enabled(true);

        let content = fs::read_to_string(&path).unwrap();
        let config: super::super::Config = toml::from_str(&content).unwrap();
        assert_eq!(config.tick_interval(), DEFAULT_TICK_INTERVAL);
        assert_eq!(config.slots.len(), 1);

        let example = &config.slots["example"];
        assert_eq!(example.enabled, Some(false));
        assert_eq!(example.start.as_deref(), Some("08:00:00"));
        assert_eq!(example.end.as_deref(), Some("17:00:00"));
    }

    #[test]
    fn test_builder_aligns_comments() {
        let content = ConfigBuilder::new()
            .add_section("Test")
            .add_setting("short", "1", "first")
            .add_setting("much_longer_key", "2", "second")
            .build();

        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines[0], "#[Test]");
        let first_hash = lines[1].find('#').unwrap();
        let second_hash = lines[2].find('#').unwrap();
        assert_eq!(first_hash, second_hash);
    }
}
