//! Core constants for the glove wire format and ingestion pipeline.
//!
//! The glove firmware streams one line of ASCII text per sample over a
//! serial-over-BLE bridge:
//!
//! ```text
//! 12,45,90,120,30\r\n
//! ^^ ^^ ^^ ^^^ ^^
//! thumb .. pinky (degrees, 0-180)
//! ```
//!
//! Bridges are inconsistent about the terminator: some send `\n`, some
//! `\r\n`, and some send fixed packets with no terminator at all. The
//! reassembler in `glovelink-protocol` copes with all three.
//!
//! # Usage
//!
//! ```
//! use glovelink_core::constants::*;
//!
//! let line = "12,45,90,120,30";
//! let fields: Vec<&str> = line.split(FIELD_SEPARATOR).collect();
//! assert_eq!(fields.len(), CHANNEL_COUNT);
//! ```

// ============================================================================
// Wire Format
// ============================================================================

/// Separator between channel values in a frame.
pub const FIELD_SEPARATOR: char = ',';

/// Frame terminator. A preceding `\r` is stripped.
pub const LINE_TERMINATOR: char = '\n';

/// Carriage return optionally sent before [`LINE_TERMINATOR`].
pub const CARRIAGE_RETURN: char = '\r';

/// Number of sensed channels per sample, one per digit.
pub const CHANNEL_COUNT: usize = 5;

// ============================================================================
// Channel Range
// ============================================================================

/// Lowest angle a channel can report, in degrees.
pub const MIN_ANGLE: i32 = 0;

/// Highest angle a channel can report, in degrees.
///
/// # Examples
///
/// ```
/// use glovelink_core::constants::{MAX_ANGLE, MIN_ANGLE};
///
/// let clamp = |v: i32| v.clamp(MIN_ANGLE, MAX_ANGLE);
/// assert_eq!(clamp(200), 180);
/// assert_eq!(clamp(-4), 0);
/// ```
pub const MAX_ANGLE: i32 = 180;

// ============================================================================
// Buffering Limits
// ============================================================================

/// Default reassembly safety threshold in characters.
///
/// A valid frame is at most 19 characters (`180,180,180,180,180`) plus
/// terminator, so 50 characters without a boundary means the stream is
/// garbage and the buffer is dropped.
pub const DEFAULT_REASSEMBLY_LIMIT: usize = 50;

/// Default number of samples kept in the history window.
pub const DEFAULT_HISTORY_CAPACITY: usize = 50;

/// Largest history window accepted by configuration validation.
pub const MAX_HISTORY_CAPACITY: usize = 10_000;

/// Minimum samples in history before a report request can be built.
pub const MIN_REPORT_SAMPLES: usize = 5;

// ============================================================================
// Simulation
// ============================================================================

/// Default cadence of the simulation source in milliseconds.
pub const DEFAULT_SIMULATION_INTERVAL_MS: u64 = 500;

// ============================================================================
// Discovery
// ============================================================================

/// 16-bit alias of the serial bridge service (HM-10 style modules).
pub const SERIAL_SERVICE_ALIAS: u16 = 0xFFE0;

/// 16-bit alias of the notify characteristic carrying the sample stream.
pub const SERIAL_CHARACTERISTIC_ALIAS: u16 = 0xFFE1;

/// Bluetooth base UUID `00000000-0000-1000-8000-00805F9B34FB`.
///
/// A 16-bit alias `xxxx` expands to `0000xxxx-0000-1000-8000-00805F9B34FB`.
pub const BLUETOOTH_BASE_UUID: u128 = 0x0000_0000_0000_1000_8000_0080_5F9B_34FB;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_widest_frame_fits_limit() {
        let widest = vec![MAX_ANGLE.to_string(); CHANNEL_COUNT].join(",");
        assert!(widest.len() + 2 < DEFAULT_REASSEMBLY_LIMIT);
    }

    #[test]
    fn test_history_defaults() {
        assert!(DEFAULT_HISTORY_CAPACITY >= MIN_REPORT_SAMPLES);
        assert!(DEFAULT_HISTORY_CAPACITY <= MAX_HISTORY_CAPACITY);
    }
}
