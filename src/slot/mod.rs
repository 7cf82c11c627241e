//! The time window switch entity and its membership logic.
//!
//! A `Timeslot` is logically "on" only when its enabled flag is set AND the
//! current wall-clock time falls within the configured `[start, end)` window.
//! Windows where `start > end` wrap past midnight (night windows). The active
//! state is never stored; it is recomputed from `(enabled, start, end, now)`
//! on every query, so transitions need no bookkeeping.
//!
//! Entities are constructed from configuration once at startup and mutated
//! only through the explicit operations below. Previously published state can
//! be merged back in via [`Timeslot::restore`], with configuration taking
//! precedence over the snapshot for any field it explicitly specifies.

pub mod registry;

use chrono::NaiveTime;

use crate::config::SlotConfig;
use crate::constants::{STATE_OFF, STATE_ON, TIME_FORMAT, TIME_FORMAT_SHORT};
use crate::state::snapshot::SlotAttributes;

/// Parse a time-of-day string in "HH:MM:SS" form ("HH:MM" also accepted).
pub fn parse_time_of_day(s: &str) -> Option<NaiveTime> {
    NaiveTime::parse_from_str(s, TIME_FORMAT)
        .or_else(|_| NaiveTime::parse_from_str(s, TIME_FORMAT_SHORT))
        .ok()
}

/// Parse a config-supplied time field, failing closed to midnight.
///
/// Malformed input is a configuration problem worth surfacing, but it must
/// never prevent entity construction. The affected field falls back to
/// 00:00:00 with a logged warning.
fn parse_time_or_default(slot_id: &str, field: &str, value: &str) -> NaiveTime {
    match parse_time_of_day(value) {
        Some(time) => time,
        None => {
            log_pipe!();
            log_warning!(
                "Slot '{}': invalid {} time '{}', falling back to 00:00:00",
                slot_id,
                field,
                value
            );
            NaiveTime::MIN
        }
    }
}

/// Optional field overrides for [`Timeslot::set_parameters`].
///
/// Absent fields leave the corresponding entity field unchanged.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct SlotParameters {
    pub name: Option<String>,
    pub enabled: Option<bool>,
    pub start: Option<NaiveTime>,
    pub end: Option<NaiveTime>,
}

impl SlotParameters {
    /// True when no field is set (a set with no arguments is a no-op publish).
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.enabled.is_none() && self.start.is_none() && self.end.is_none()
    }
}

/// A named time window switch.
#[derive(Debug, Clone)]
pub struct Timeslot {
    id: String,
    name: Option<String>,
    enabled: bool,
    start: NaiveTime,
    end: NaiveTime,
    /// The configuration this slot was constructed from, retained so the
    /// restore merge can tell which fields were explicitly configured.
    config: SlotConfig,
}

impl Timeslot {
    /// Construct a slot from its configuration table.
    ///
    /// Unspecified fields default to `enabled = false` and midnight times.
    /// Malformed time strings fail closed to midnight with a warning.
    pub fn from_config(id: &str, config: &SlotConfig) -> Self {
        let start = config
            .start
            .as_deref()
            .map(|s| parse_time_or_default(id, "start", s))
            .unwrap_or(NaiveTime::MIN);
        let end = config
            .end
            .as_deref()
            .map(|s| parse_time_or_default(id, "end", s))
            .unwrap_or(NaiveTime::MIN);

        Self {
            id: id.to_string(),
            name: config.name.clone(),
            enabled: config.enabled.unwrap_or(false),
            start,
            end,
            config: config.clone(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn enabled(&self) -> bool {
        self.enabled
    }

    pub fn start(&self) -> NaiveTime {
        self.start
    }

    pub fn end(&self) -> NaiveTime {
        self.end
    }

    /// Window membership test: is this slot active at `now`?
    ///
    /// - Disabled slots are never active, regardless of times.
    /// - `start <= end` is a same-day window: active iff `start <= now < end`.
    /// - `start > end` is a night window wrapping midnight: active iff
    ///   `now >= start || now < end`.
    ///
    /// `start == end` collapses to an empty window that is never active. An
    /// all-day window is expressed with explicit full-day bounds instead.
    pub fn is_active(&self, now: NaiveTime) -> bool {
        if !self.enabled {
            return false;
        }

        if self.start <= self.end {
            self.start <= now && now < self.end
        } else {
            // Night window
            now >= self.start || now < self.end
        }
    }

    /// Published state value ("on"/"off") for `now`.
    pub fn state(&self, now: NaiveTime) -> &'static str {
        if self.is_active(now) { STATE_ON } else { STATE_OFF }
    }

    /// Enable the slot. No other field changes.
    pub fn turn_on(&mut self) {
        self.enabled = true;
    }

    /// Disable the slot. No other field changes.
    pub fn turn_off(&mut self) {
        self.enabled = false;
    }

    /// Invert the enabled flag.
    pub fn toggle(&mut self) {
        self.enabled = !self.enabled;
    }

    /// Overwrite exactly the fields provided in `params`.
    ///
    /// Callers are expected to re-publish afterwards even when nothing
    /// actually changed value; the registry dispatch does this.
    pub fn set_parameters(&mut self, params: &SlotParameters) {
        if let Some(ref name) = params.name {
            self.name = Some(name.clone());
        }
        if let Some(enabled) = params.enabled {
            self.enabled = enabled;
        }
        if let Some(start) = params.start {
            self.start = start;
        }
        if let Some(end) = params.end {
            self.end = end;
        }
    }

    /// Merge a previously published snapshot into this slot.
    ///
    /// For each of `enabled`, `start`, `end` independently: the snapshot value
    /// wins only when the construction configuration did not explicitly
    /// specify that field. Malformed snapshot times fail closed to midnight
    /// with a warning. Applying the same snapshot twice is a no-op the second
    /// time.
    pub fn restore(&mut self, snapshot: &SlotAttributes) {
        if self.config.enabled.is_none() {
            self.enabled = snapshot.enabled;
        }
        if self.config.start.is_none() {
            self.start = parse_time_or_default(&self.id, "restored start", &snapshot.start);
        }
        if self.config.end.is_none() {
            self.end = parse_time_or_default(&self.id, "restored end", &snapshot.end);
        }
    }

    /// The published attribute set for this slot.
    ///
    /// Matches the shape consumed by [`Timeslot::restore`]; times serialize in
    /// round-trippable "HH:MM:SS" form. The name is display metadata and is
    /// intentionally not part of the attributes.
    pub fn attributes(&self) -> SlotAttributes {
        SlotAttributes {
            editable: true,
            enabled: self.enabled,
            start: self.start.format(TIME_FORMAT).to_string(),
            end: self.end.format(TIME_FORMAT).to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn time(h: u32, m: u32, s: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, s).unwrap()
    }

    fn slot(enabled: bool, start: &str, end: &str) -> Timeslot {
        Timeslot::from_config(
            "test",
            &SlotConfig {
                name: None,
                enabled: Some(enabled),
                start: Some(start.to_string()),
                end: Some(end.to_string()),
            },
        )
    }

    #[test]
    fn test_defaults() {
        let slot = Timeslot::from_config("empty", &SlotConfig::default());
        assert_eq!(slot.id(), "empty");
        assert_eq!(slot.name(), None);
        assert!(!slot.enabled());
        assert_eq!(slot.start(), NaiveTime::MIN);
        assert_eq!(slot.end(), NaiveTime::MIN);
    }

    #[test]
    fn test_disabled_never_active() {
        let slot = slot(false, "08:00:00", "17:00:00");
        assert!(!slot.is_active(time(12, 0, 0)));
        assert!(!slot.is_active(time(8, 0, 0)));
        assert!(!slot.is_active(time(0, 0, 0)));
    }

    #[test]
    fn test_day_window_inclusive_start_exclusive_end() {
        let slot = slot(true, "08:00:00", "17:00:00");
        assert!(slot.is_active(time(8, 0, 0)));
        assert!(slot.is_active(time(12, 30, 0)));
        assert!(slot.is_active(time(16, 59, 59)));
        assert!(!slot.is_active(time(17, 0, 0)));
        assert!(!slot.is_active(time(7, 59, 59)));
        assert!(!slot.is_active(time(23, 0, 0)));
    }

    #[test]
    fn test_night_window_wraps_midnight() {
        let slot = slot(true, "22:00:00", "06:00:00");
        assert!(slot.is_active(time(23, 30, 0)));
        assert!(slot.is_active(time(22, 0, 0)));
        assert!(slot.is_active(time(0, 0, 0)));
        assert!(slot.is_active(time(5, 59, 59)));
        assert!(!slot.is_active(time(6, 0, 0)));
        assert!(!slot.is_active(time(7, 0, 0)));
        assert!(!slot.is_active(time(21, 59, 59)));
    }

    #[test]
    fn test_equal_start_end_is_never_active() {
        // An empty window, not an all-day one. Deliberate.
        let slot = slot(true, "12:00:00", "12:00:00");
        assert!(!slot.is_active(time(12, 0, 0)));
        assert!(!slot.is_active(time(0, 0, 0)));
        assert!(!slot.is_active(time(23, 59, 59)));
    }

    #[test]
    fn test_toggle_twice_is_identity() {
        let mut slot = slot(false, "08:00:00", "17:00:00");
        slot.toggle();
        assert!(slot.enabled());
        slot.toggle();
        assert!(!slot.enabled());
    }

    #[test]
    fn test_turn_on_off_touch_only_enabled() {
        let mut slot = slot(false, "08:00:00", "17:00:00");
        slot.turn_on();
        assert!(slot.enabled());
        assert_eq!(slot.start(), time(8, 0, 0));
        assert_eq!(slot.end(), time(17, 0, 0));
        slot.turn_off();
        assert!(!slot.enabled());
        assert_eq!(slot.start(), time(8, 0, 0));
        assert_eq!(slot.end(), time(17, 0, 0));
    }

    #[test]
    fn test_set_parameters_partial_update() {
        let mut slot = slot(false, "08:00:00", "17:00:00");
        slot.set_parameters(&SlotParameters {
            enabled: Some(true),
            ..Default::default()
        });
        assert!(slot.enabled());
        // Unrelated fields untouched
        assert_eq!(slot.start(), time(8, 0, 0));
        assert_eq!(slot.end(), time(17, 0, 0));
        assert_eq!(slot.name(), None);

        slot.set_parameters(&SlotParameters {
            name: Some("Evening".into()),
            start: Some(time(18, 0, 0)),
            ..Default::default()
        });
        assert_eq!(slot.name(), Some("Evening"));
        assert_eq!(slot.start(), time(18, 0, 0));
        assert_eq!(slot.end(), time(17, 0, 0));
        assert!(slot.enabled());
    }

    #[test]
    fn test_set_parameters_empty_is_noop() {
        let mut slot = slot(true, "08:00:00", "17:00:00");
        let before = slot.attributes();
        let params = SlotParameters::default();
        assert!(params.is_empty());
        slot.set_parameters(&params);
        assert_eq!(slot.attributes(), before);
    }

    #[test]
    fn test_malformed_config_time_fails_closed() {
        crate::logger::Log::set_enabled(false);
        let slot = Timeslot::from_config(
            "broken",
            &SlotConfig {
                name: None,
                enabled: Some(true),
                start: Some("25:99".to_string()),
                end: Some("17:00:00".to_string()),
            },
        );
        crate::logger::Log::set_enabled(true);
        assert_eq!(slot.start(), NaiveTime::MIN);
        assert_eq!(slot.end(), time(17, 0, 0));
    }

    #[test]
    fn test_short_time_form_accepted() {
        let slot = slot(true, "08:30", "17:15");
        assert_eq!(slot.start(), time(8, 30, 0));
        assert_eq!(slot.end(), time(17, 15, 0));
    }

    #[test]
    fn test_restore_respects_config_precedence() {
        // Config specifies enabled, not the times
        let mut slot = Timeslot::from_config(
            "work",
            &SlotConfig {
                name: None,
                enabled: Some(true),
                start: None,
                end: None,
            },
        );

        let snapshot = SlotAttributes {
            editable: true,
            enabled: false,
            start: "09:00:00".to_string(),
            end: "18:00:00".to_string(),
        };
        slot.restore(&snapshot);

        // Configured field wins over snapshot
        assert!(slot.enabled());
        // Unconfigured fields come from the snapshot
        assert_eq!(slot.start(), time(9, 0, 0));
        assert_eq!(slot.end(), time(18, 0, 0));
    }

    #[test]
    fn test_restore_is_idempotent() {
        let mut slot = Timeslot::from_config("work", &SlotConfig::default());
        let snapshot = SlotAttributes {
            editable: true,
            enabled: true,
            start: "09:00:00".to_string(),
            end: "18:00:00".to_string(),
        };

        slot.restore(&snapshot);
        let once = slot.attributes();
        slot.restore(&snapshot);
        assert_eq!(slot.attributes(), once);
    }

    #[test]
    fn test_restore_malformed_time_fails_closed() {
        crate::logger::Log::set_enabled(false);
        let mut slot = Timeslot::from_config("work", &SlotConfig::default());
        slot.restore(&SlotAttributes {
            editable: true,
            enabled: true,
            start: "not-a-time".to_string(),
            end: "18:00:00".to_string(),
        });
        crate::logger::Log::set_enabled(true);
        assert_eq!(slot.start(), NaiveTime::MIN);
        assert_eq!(slot.end(), time(18, 0, 0));
        assert!(slot.enabled());
    }

    #[test]
    fn test_attributes_round_trip() {
        let slot = slot(true, "22:00:00", "06:00:00");
        let attrs = slot.attributes();
        assert!(attrs.editable);
        assert!(attrs.enabled);
        assert_eq!(attrs.start, "22:00:00");
        assert_eq!(attrs.end, "06:00:00");
    }

    #[test]
    fn test_state_strings() {
        let slot = slot(true, "22:00:00", "06:00:00");
        assert_eq!(slot.state(time(23, 30, 0)), "on");
        assert_eq!(slot.state(time(7, 0, 0)), "off");
    }
}
