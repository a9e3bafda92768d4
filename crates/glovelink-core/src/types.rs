use crate::{
    Result,
    constants::{CHANNEL_COUNT, MAX_ANGLE, MIN_ANGLE},
    error::Error,
};
use chrono::{DateTime, Local, Timelike};
use serde::{Deserialize, Serialize};
use std::fmt;

/// One sensed digit of the glove.
///
/// The ordering is fixed and matches the field order on the wire:
/// field 0 is the thumb, field 4 the pinky.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum Channel {
    Thumb = 0,
    Index = 1,
    Middle = 2,
    Ring = 3,
    Pinky = 4,
}

impl Channel {
    /// All channels in wire order.
    pub const ALL: [Channel; CHANNEL_COUNT] = [
        Channel::Thumb,
        Channel::Index,
        Channel::Middle,
        Channel::Ring,
        Channel::Pinky,
    ];

    /// Create a channel from its wire position.
    ///
    /// # Errors
    /// Returns `Error::InvalidChannel` if the index is not 0-4.
    pub fn from_index(index: usize) -> Result<Self> {
        Self::ALL
            .get(index)
            .copied()
            .ok_or_else(|| Error::InvalidChannel(format!("index {index} (expected 0-4)")))
    }

    /// Wire position of this channel.
    #[inline]
    #[must_use]
    pub fn index(self) -> usize {
        self as usize
    }

    /// Human-readable digit name.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Channel::Thumb => "Thumb",
            Channel::Index => "Index",
            Channel::Middle => "Middle",
            Channel::Ring => "Ring",
            Channel::Pinky => "Pinky",
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

impl std::str::FromStr for Channel {
    type Err = Error;

    /// Accepts a digit name (case-insensitive) or a wire index.
    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        if let Ok(index) = s.parse::<usize>() {
            return Channel::from_index(index);
        }
        Channel::ALL
            .into_iter()
            .find(|c| c.label().eq_ignore_ascii_case(s))
            .ok_or_else(|| Error::InvalidChannel(s.to_string()))
    }
}

/// One decoded reading of all five channels.
///
/// Samples are produced by the frame decoder or the simulation source and
/// are never mutated afterwards. The timestamp is the wall-clock time at
/// which the sample was created, truncated to whole seconds; the device
/// payload carries no timing of its own.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sample {
    timestamp: DateTime<Local>,
    channels: [i32; CHANNEL_COUNT],
}

impl Sample {
    /// Create a sample stamped with the current wall-clock second.
    #[must_use]
    pub fn now(channels: [i32; CHANNEL_COUNT]) -> Self {
        Self::at(Local::now(), channels)
    }

    /// Create a sample with an explicit timestamp, truncated to seconds.
    #[must_use]
    pub fn at(timestamp: DateTime<Local>, channels: [i32; CHANNEL_COUNT]) -> Self {
        let timestamp = timestamp.with_nanosecond(0).unwrap_or(timestamp);
        Self {
            timestamp,
            channels,
        }
    }

    /// Wall-clock time the sample was created.
    #[must_use]
    pub fn timestamp(&self) -> &DateTime<Local> {
        &self.timestamp
    }

    /// Timestamp formatted as `HH:MM:SS` for chart axes.
    #[must_use]
    pub fn time_label(&self) -> String {
        self.timestamp.format("%H:%M:%S").to_string()
    }

    /// All channel values in wire order.
    #[must_use]
    pub fn channels(&self) -> &[i32; CHANNEL_COUNT] {
        &self.channels
    }

    /// Value of a single channel.
    #[inline]
    #[must_use]
    pub fn value(&self, channel: Channel) -> i32 {
        self.channels[channel.index()]
    }

    /// Returns `true` if every channel lies in the sensor range.
    #[must_use]
    pub fn is_in_range(&self) -> bool {
        self.channels
            .iter()
            .all(|v| (MIN_ANGLE..=MAX_ANGLE).contains(v))
    }

    /// Check the sensor range, reporting the first offending value.
    ///
    /// # Errors
    /// Returns `Error::ChannelOutOfRange` for the first value outside 0-180.
    pub fn check_range(&self) -> Result<()> {
        match self
            .channels
            .iter()
            .find(|v| !(MIN_ANGLE..=MAX_ANGLE).contains(*v))
        {
            Some(&value) => Err(Error::ChannelOutOfRange {
                value,
                min: MIN_ANGLE,
                max: MAX_ANGLE,
            }),
            None => Ok(()),
        }
    }
}

impl fmt::Display for Sample {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let [a, b, c, d, e] = self.channels;
        write!(f, "[{}] {a},{b},{c},{d},{e}", self.time_label())
    }
}
