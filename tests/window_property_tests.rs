use chrono::NaiveTime;
use proptest::prelude::*;

use timeslot::config::SlotConfig;
use timeslot::slot::Timeslot;

/// Generate an arbitrary second-of-day value
fn second_of_day_strategy() -> impl Strategy<Value = u32> {
    0u32..86_400
}

fn time_from_seconds(secs: u32) -> NaiveTime {
    NaiveTime::from_num_seconds_from_midnight_opt(secs, 0).unwrap()
}

fn slot_with_window(enabled: bool, start: u32, end: u32) -> Timeslot {
    let config = SlotConfig {
        name: None,
        enabled: Some(enabled),
        start: Some(time_from_seconds(start).format("%H:%M:%S").to_string()),
        end: Some(time_from_seconds(end).format("%H:%M:%S").to_string()),
    };
    Timeslot::from_config("prop", &config)
}

/// Property tests for window membership
#[cfg(test)]
mod window_membership_tests {
    use super::*;

    proptest! {
        /// A disabled slot is never active, no matter the window or query time
        #[test]
        fn test_disabled_never_active(
            start in second_of_day_strategy(),
            end in second_of_day_strategy(),
            now in second_of_day_strategy()
        ) {
            let slot = slot_with_window(false, start, end);
            prop_assert!(!slot.is_active(time_from_seconds(now)));
        }

        /// An empty window (start == end) is never active even when enabled
        #[test]
        fn test_empty_window_never_active(
            boundary in second_of_day_strategy(),
            now in second_of_day_strategy()
        ) {
            let slot = slot_with_window(true, boundary, boundary);
            prop_assert!(!slot.is_active(time_from_seconds(now)));
        }

        /// The start boundary is inclusive, the end boundary exclusive
        #[test]
        fn test_boundary_inclusivity(
            start in second_of_day_strategy(),
            end in second_of_day_strategy()
        ) {
            prop_assume!(start != end);
            let slot = slot_with_window(true, start, end);
            prop_assert!(slot.is_active(time_from_seconds(start)));
            prop_assert!(!slot.is_active(time_from_seconds(end)));
        }

        /// A wrapped window covers exactly the complement of the unwrapped one,
        /// for the same pair of boundary times
        #[test]
        fn test_wrapped_window_is_complement(
            start in second_of_day_strategy(),
            end in second_of_day_strategy(),
            now in second_of_day_strategy()
        ) {
            prop_assume!(start != end);
            let day = slot_with_window(true, start, end);
            let night = slot_with_window(true, end, start);
            let at = time_from_seconds(now);
            prop_assert_ne!(day.is_active(at), night.is_active(at));
        }

        /// The published state string always agrees with the membership test
        #[test]
        fn test_state_string_matches_membership(
            start in second_of_day_strategy(),
            end in second_of_day_strategy(),
            now in second_of_day_strategy()
        ) {
            let slot = slot_with_window(true, start, end);
            let at = time_from_seconds(now);
            let expected = if slot.is_active(at) { "on" } else { "off" };
            prop_assert_eq!(slot.state(at), expected);
        }

        /// Toggling twice returns the slot to its original enabled state
        #[test]
        fn test_toggle_is_an_involution(
            enabled in any::<bool>(),
            start in second_of_day_strategy(),
            end in second_of_day_strategy()
        ) {
            let mut slot = slot_with_window(enabled, start, end);
            slot.toggle();
            prop_assert_eq!(slot.enabled(), !enabled);
            slot.toggle();
            prop_assert_eq!(slot.enabled(), enabled);
        }

        /// Published attributes round-trip through the restore merge when no
        /// field is pinned by configuration
        #[test]
        fn test_attributes_round_trip_through_restore(
            enabled in any::<bool>(),
            start in second_of_day_strategy(),
            end in second_of_day_strategy()
        ) {
            let published = slot_with_window(enabled, start, end).attributes();

            let mut fresh = Timeslot::from_config("prop", &SlotConfig::default());
            fresh.restore(&published);

            prop_assert_eq!(fresh.enabled(), enabled);
            prop_assert_eq!(fresh.start(), time_from_seconds(start));
            prop_assert_eq!(fresh.end(), time_from_seconds(end));
        }
    }
}
