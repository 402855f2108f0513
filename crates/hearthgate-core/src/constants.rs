//! Core constants for the hearthgate controller.
//!
//! These are the factory defaults of the device. Every timing value here is
//! mirrored by a field on [`DeviceConfig`](crate::DeviceConfig) so that a
//! deployment can tune it; the constants exist so that the defaults live in
//! one place and so that tests can refer to them by name.
//!
//! # Timing model
//!
//! The coordinator runs one tick roughly every [`DEFAULT_TICK_MS`]. Nothing
//! inside a tick waits on a timer except the bounded touch sampling window
//! ([`DEFAULT_TOUCH_WINDOW_MS`]) and the authorization request
//! ([`DEFAULT_AUTH_TIMEOUT_MS`]). Every other duration below is compared
//! against recorded timestamps, so a late tick just runs late.
//!
//! ```
//! use hearthgate_core::constants::*;
//!
//! assert!(DEFAULT_TOUCH_WINDOW_MS < DEFAULT_TICK_MS);
//! assert!(DEFAULT_DOOR_SETTLE_MS < DEFAULT_DOOR_HOLD_MS);
//! ```

// ============================================================================
// Scheduling
// ============================================================================

/// Nominal coordinator tick period.
pub const DEFAULT_TICK_MS: u64 = 10;

/// Environmental sensors (temperature, humidity, gas, rain, light level) are
/// sampled on this slower interval.
pub const DEFAULT_ENV_SAMPLE_MS: u64 = 2000;

/// Display refresh period. Also the time the scan screen stays visible.
pub const DEFAULT_DISPLAY_REFRESH_MS: u64 = 1000;

/// Periodic status republish interval (state changes publish immediately).
pub const DEFAULT_STATUS_INTERVAL_MS: u64 = 5000;

// ============================================================================
// Actuators
// ============================================================================

/// Door stays open this long after the last qualifying trigger.
pub const DEFAULT_DOOR_HOLD_MS: u64 = 5000;

/// Door servo travel time assumed for the closing motion.
pub const DEFAULT_DOOR_SETTLE_MS: u64 = 700;

/// Rain cover stays deployed this long after the last rain sample.
pub const DEFAULT_COVER_HOLD_MS: u64 = 60_000;

/// Rain cover travel time.
pub const DEFAULT_COVER_SETTLE_MS: u64 = 1500;

// ============================================================================
// Credentials and backend
// ============================================================================

/// Minimum tag UID length in bytes (ISO 14443).
pub const MIN_UID_LENGTH: usize = 4;

/// Maximum tag UID length in bytes (ISO 14443).
pub const MAX_UID_LENGTH: usize = 10;

/// Minimum spacing between two accepted scans.
pub const DEFAULT_SCAN_REPEAT_MS: u64 = 2000;

/// Hard ceiling on a single authorization request.
pub const DEFAULT_AUTH_TIMEOUT_MS: u64 = 3000;

/// Timeout for access log submissions.
pub const DEFAULT_LOG_TIMEOUT_MS: u64 = 3000;

/// Timeout for the device registration request.
pub const DEFAULT_REGISTRATION_TIMEOUT_MS: u64 = 5000;

/// While offline (or unregistered) the backend is re-checked this often.
pub const DEFAULT_BACKEND_CHECK_MS: u64 = 5000;

/// Consecutive authorization failures before the device reports offline.
pub const DEFAULT_OFFLINE_CEILING: u32 = 2;

/// Capacity of the fire-and-forget access log queue. Events beyond this are
/// dropped, never awaited.
pub const EVENT_LOG_QUEUE_CAPACITY: usize = 16;

/// How long the local control API waits for the coordinator to apply a
/// submitted command.
pub const COMMAND_REPLY_TIMEOUT_MS: u64 = 2000;

// ============================================================================
// Inputs and sensors
// ============================================================================

/// Raw reads taken per touch sample.
pub const DEFAULT_TOUCH_SAMPLES: usize = 8;

/// Active reads needed within one touch sample to report "touched".
/// Deliberately below half the window to favour sensitivity.
pub const DEFAULT_TOUCH_THRESHOLD: usize = 2;

/// Total duration of one touch sampling window.
pub const DEFAULT_TOUCH_WINDOW_MS: u64 = 6;

/// Edges of the exit push-button closer together than this are ignored.
pub const DEFAULT_BUTTON_REFRACTORY_MS: u64 = 120;

/// Raw gas reading above which the gas alarm is raised.
pub const DEFAULT_GAS_ALARM_THRESHOLD: u16 = 2000;

/// Raw light level at or below which an auto channel switches on.
pub const DEFAULT_LIGHT_DARK_THRESHOLD: u16 = 1200;

/// Raw light level at or above which an auto channel switches off.
pub const DEFAULT_LIGHT_BRIGHT_THRESHOLD: u16 = 1800;

// ============================================================================
// Outputs
// ============================================================================

/// Number of relay light channels on the board.
pub const LIGHT_CHANNEL_COUNT: u8 = 4;

/// Number of cyclable display screens (main, climate, rain/gas).
pub const SCREEN_COUNT: u8 = 3;

/// Display width in text columns (128 px panel, 6 px font).
pub const DISPLAY_COLUMNS: usize = 21;

/// Display height in text lines (64 px panel, 8 px font).
pub const DISPLAY_LINES: usize = 8;

/// Firmware version announced at registration.
pub const FIRMWARE_VERSION: &str = "1.0.1";
