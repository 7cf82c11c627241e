//! The set of configured slots and the command surface over them.
//!
//! All mutation goes through [`Registry::dispatch`], which applies the
//! command and then publishes the slot's current record to the sink. Commands
//! always publish, even when they did not change anything observable; this
//! keeps the persisted state file in step with the live entities.

use std::collections::BTreeMap;

use anyhow::{Result, anyhow};
use chrono::NaiveTime;

use crate::config::Config;
use crate::slot::{SlotParameters, Timeslot};
use crate::state::snapshot::{PublishedState, StateSink};

/// A mutation applied to one slot.
#[derive(Debug, Clone, PartialEq)]
pub enum SlotCommand {
    TurnOn,
    TurnOff,
    Toggle,
    SetParameters(SlotParameters),
}

/// All configured slots, keyed by id.
#[derive(Debug, Default)]
pub struct Registry {
    slots: BTreeMap<String, Timeslot>,
}

impl Registry {
    /// Build the registry from configuration, one entity per `[slots.<id>]`.
    pub fn from_config(config: &Config) -> Self {
        let slots = config
            .slots
            .iter()
            .map(|(id, slot_config)| (id.clone(), Timeslot::from_config(id, slot_config)))
            .collect();
        Self { slots }
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&Timeslot> {
        self.slots.get(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Timeslot)> {
        self.slots.iter()
    }

    /// Merge previously published snapshots into the slots.
    ///
    /// Snapshots for ids no longer configured are ignored; their records stay
    /// in the state file but no entity picks them up.
    pub fn restore_from(&mut self, snapshots: &BTreeMap<String, PublishedState>) {
        for (id, slot) in self.slots.iter_mut() {
            if let Some(record) = snapshots.get(id) {
                slot.restore(&record.attributes);
            }
        }
    }

    /// Current attribute sets for all slots, in the snapshot shape.
    ///
    /// Used on reload to carry live runtime state across a registry rebuild.
    pub fn attributes(&self, now: NaiveTime) -> BTreeMap<String, PublishedState> {
        self.slots
            .iter()
            .map(|(id, slot)| {
                (
                    id.clone(),
                    PublishedState {
                        state: slot.state(now).to_string(),
                        attributes: slot.attributes(),
                    },
                )
            })
            .collect()
    }

    /// Apply `command` to the slot `id` and publish its resulting record.
    ///
    /// Unknown ids are an error; nothing is mutated or published.
    pub fn dispatch(
        &mut self,
        id: &str,
        command: &SlotCommand,
        sink: &mut dyn StateSink,
        now: NaiveTime,
    ) -> Result<()> {
        let slot = self
            .slots
            .get_mut(id)
            .ok_or_else(|| anyhow!("No slot '{}' is configured", id))?;

        match command {
            SlotCommand::TurnOn => slot.turn_on(),
            SlotCommand::TurnOff => slot.turn_off(),
            SlotCommand::Toggle => slot.toggle(),
            SlotCommand::SetParameters(params) => slot.set_parameters(params),
        }

        publish_slot(slot, sink, now)
    }

    /// Publish the current record of every slot.
    pub fn publish_all(&self, sink: &mut dyn StateSink, now: NaiveTime) -> Result<()> {
        for slot in self.slots.values() {
            publish_slot(slot, sink, now)?;
        }
        Ok(())
    }

    /// Map of slot id to current active state. Used by the tick loop to spot
    /// window boundary crossings between publishes.
    pub fn active_map(&self, now: NaiveTime) -> BTreeMap<String, bool> {
        self.slots
            .iter()
            .map(|(id, slot)| (id.clone(), slot.is_active(now)))
            .collect()
    }
}

fn publish_slot(slot: &Timeslot, sink: &mut dyn StateSink, now: NaiveTime) -> Result<()> {
    let update = PublishedState {
        state: slot.state(now).to_string(),
        attributes: slot.attributes(),
    };
    sink.publish(slot.id(), &update)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SlotConfig;
    use crate::state::snapshot::{RecordingSink, SlotAttributes};

    fn time(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    fn test_config() -> Config {
        let mut config = Config::default();
        config.slots.insert(
            "work".to_string(),
            SlotConfig {
                name: Some("Work hours".to_string()),
                enabled: Some(true),
                start: Some("08:00:00".to_string()),
                end: Some("17:00:00".to_string()),
            },
        );
        config.slots.insert(
            "night".to_string(),
            SlotConfig {
                name: None,
                enabled: None,
                start: Some("22:00:00".to_string()),
                end: Some("06:00:00".to_string()),
            },
        );
        config
    }

    #[test]
    fn test_from_config_builds_all_slots() {
        let registry = Registry::from_config(&test_config());
        assert_eq!(registry.len(), 2);
        assert!(registry.get("work").is_some());
        assert!(registry.get("night").is_some());
        assert!(registry.get("missing").is_none());
    }

    #[test]
    fn test_dispatch_publishes_after_mutation() {
        let mut registry = Registry::from_config(&test_config());
        let mut sink = RecordingSink::new();

        registry
            .dispatch("night", &SlotCommand::TurnOn, &mut sink, time(23, 30))
            .unwrap();

        let record = sink.last_for("night").unwrap();
        assert_eq!(record.state, "on");
        assert!(record.attributes.enabled);
    }

    #[test]
    fn test_dispatch_unknown_id_is_error_and_publishes_nothing() {
        let mut registry = Registry::from_config(&test_config());
        let mut sink = RecordingSink::new();

        let result = registry.dispatch("missing", &SlotCommand::Toggle, &mut sink, time(12, 0));
        assert!(result.is_err());
        assert!(sink.published.is_empty());
    }

    #[test]
    fn test_set_parameters_publishes_even_without_change() {
        let mut registry = Registry::from_config(&test_config());
        let mut sink = RecordingSink::new();

        registry
            .dispatch(
                "work",
                &SlotCommand::SetParameters(SlotParameters::default()),
                &mut sink,
                time(12, 0),
            )
            .unwrap();

        assert_eq!(sink.published.len(), 1);
        assert_eq!(sink.last_for("work").unwrap().state, "on");
    }

    #[test]
    fn test_publish_all_covers_every_slot() {
        let registry = Registry::from_config(&test_config());
        let mut sink = RecordingSink::new();

        registry.publish_all(&mut sink, time(12, 0)).unwrap();
        assert_eq!(sink.published.len(), 2);
        assert_eq!(sink.last_for("work").unwrap().state, "on");
        // Disabled by default, so off even inside its window
        assert_eq!(sink.last_for("night").unwrap().state, "off");
    }

    #[test]
    fn test_restore_skips_unconfigured_ids() {
        let mut registry = Registry::from_config(&test_config());
        let mut snapshots = BTreeMap::new();
        snapshots.insert(
            "vanished".to_string(),
            PublishedState {
                state: "on".to_string(),
                attributes: SlotAttributes {
                    editable: true,
                    enabled: true,
                    start: "00:00:00".to_string(),
                    end: "00:00:00".to_string(),
                },
            },
        );
        snapshots.insert(
            "night".to_string(),
            PublishedState {
                state: "on".to_string(),
                attributes: SlotAttributes {
                    editable: true,
                    enabled: true,
                    start: "21:00:00".to_string(),
                    end: "05:00:00".to_string(),
                },
            },
        );

        registry.restore_from(&snapshots);
        assert_eq!(registry.len(), 2);

        // "night" config left enabled unset, so the snapshot's value applies,
        // but its configured times take precedence over the snapshot's.
        let night = registry.get("night").unwrap();
        assert!(night.enabled());
        assert_eq!(night.start(), time(22, 0));
        assert_eq!(night.end(), time(6, 0));
    }

    #[test]
    fn test_active_map_tracks_window_membership() {
        let mut registry = Registry::from_config(&test_config());
        let mut sink = RecordingSink::new();
        registry
            .dispatch("night", &SlotCommand::TurnOn, &mut sink, time(12, 0))
            .unwrap();

        let at_noon = registry.active_map(time(12, 0));
        assert!(at_noon["work"]);
        assert!(!at_noon["night"]);

        let at_midnight = registry.active_map(time(0, 0));
        assert!(!at_midnight["work"]);
        assert!(at_midnight["night"]);
    }
}
