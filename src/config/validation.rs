//! Configuration validation functionality.
//!
//! Structural problems fail the load with a pointed message. Malformed slot
//! times deliberately do NOT fail here: the entity layer falls them back to
//! midnight, so validation only warns about them.

use anyhow::Result;

use super::Config;
use crate::constants::{MAXIMUM_TICK_INTERVAL, MINIMUM_TICK_INTERVAL};
use crate::slot::parse_time_of_day;

/// Validate a loaded configuration before entities are built from it.
pub fn validate_config(config: &Config) -> Result<()> {
    if let Some(interval) = config.tick_interval
        && !(MINIMUM_TICK_INTERVAL..=MAXIMUM_TICK_INTERVAL).contains(&interval)
    {
        anyhow::bail!(
            "tick_interval ({} seconds) must be between {} and {} seconds",
            interval,
            MINIMUM_TICK_INTERVAL,
            MAXIMUM_TICK_INTERVAL
        );
    }

    for (id, slot) in &config.slots {
        validate_slot_id(id)?;

        if let Some(name) = &slot.name
            && name.trim().is_empty()
        {
            anyhow::bail!("Slot '{}' has an empty name", id);
        }

        // Unparseable times fall back to midnight at construction, so only warn
        for (field, value) in [("start", &slot.start), ("end", &slot.end)] {
            if let Some(value) = value
                && parse_time_of_day(value).is_none()
            {
                log_pipe!();
                log_warning!(
                    "Slot '{}': {} time '{}' is not valid HH:MM:SS and will be treated as 00:00:00",
                    id,
                    field,
                    value
                );
            }
        }
    }

    Ok(())
}

/// Slot ids become file keys and command-line arguments, so they are kept to
/// a conservative slug alphabet.
fn validate_slot_id(id: &str) -> Result<()> {
    if id.is_empty() {
        anyhow::bail!("Slot ids must not be empty");
    }
    if !id
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_' || c == '-')
    {
        anyhow::bail!(
            "Slot id '{}' is invalid: use lowercase letters, digits, '_' or '-'",
            id
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SlotConfig;

    fn config_with_tick(tick: u64) -> Config {
        Config {
            tick_interval: Some(tick),
            slots: Default::default(),
        }
    }

    #[test]
    fn test_tick_interval_bounds() {
        assert!(validate_config(&config_with_tick(60)).is_ok());
        assert!(validate_config(&config_with_tick(MINIMUM_TICK_INTERVAL)).is_ok());
        assert!(validate_config(&config_with_tick(MAXIMUM_TICK_INTERVAL)).is_ok());
        assert!(validate_config(&config_with_tick(MINIMUM_TICK_INTERVAL - 1)).is_err());
        assert!(validate_config(&config_with_tick(MAXIMUM_TICK_INTERVAL + 1)).is_err());
    }

    #[test]
    fn test_slot_id_slug_alphabet() {
        assert!(validate_slot_id("work_hours").is_ok());
        assert!(validate_slot_id("night-2").is_ok());
        assert!(validate_slot_id("").is_err());
        assert!(validate_slot_id("Work").is_err());
        assert!(validate_slot_id("with space").is_err());
        assert!(validate_slot_id("dotted.id").is_err());
    }

    #[test]
    fn test_empty_name_rejected() {
        let mut config = Config::default();
        config.slots.insert(
            "work".to_string(),
            SlotConfig {
                name: Some("   ".to_string()),
                ..Default::default()
            },
        );
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_bad_time_only_warns() {
        crate::logger::Log::set_enabled(false);
        let mut config = Config::default();
        config.slots.insert(
            "work".to_string(),
            SlotConfig {
                start: Some("25:99".to_string()),
                ..Default::default()
            },
        );
        let result = validate_config(&config);
        crate::logger::Log::set_enabled(true);
        assert!(result.is_ok());
    }
}
