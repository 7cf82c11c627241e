//! Defaults and limits used throughout timeslot.

/// Default re-publish interval in seconds (one tick per minute).
pub const DEFAULT_TICK_INTERVAL: u64 = 60;

/// Minimum allowed tick interval in seconds.
pub const MINIMUM_TICK_INTERVAL: u64 = 10;

/// Maximum allowed tick interval in seconds.
pub const MAXIMUM_TICK_INTERVAL: u64 = 3600;

/// Round-trippable text form for times of day.
pub const TIME_FORMAT: &str = "%H:%M:%S";

/// Shorter time form accepted on input (seconds default to zero).
pub const TIME_FORMAT_SHORT: &str = "%H:%M";

/// Published state value for an active slot.
pub const STATE_ON: &str = "on";

/// Published state value for an inactive slot.
pub const STATE_OFF: &str = "off";

/// Exit code used when startup cannot proceed.
pub const EXIT_FAILURE: i32 = 1;
