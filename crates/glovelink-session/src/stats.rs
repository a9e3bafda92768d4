//! Summary statistics over a window of samples.
//!
//! The summary is what gets handed to the report collaborator: sample count
//! plus, for each selected channel, the rounded mean and the extremes.

use serde::{Deserialize, Serialize};

use glovelink_core::{Channel, Sample};

/// Statistics for one channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelStats {
    pub channel: Channel,

    /// Mean rounded half away from zero.
    pub mean: i32,

    pub min: i32,
    pub max: i32,
}

/// Aggregated statistics for a window of samples.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSummary {
    /// Number of samples summarized.
    pub count: usize,

    /// One entry per requested channel, in request order.
    pub channels: Vec<ChannelStats>,
}

impl SessionSummary {
    /// Statistics for a channel, if it was requested.
    pub fn channel(&self, channel: Channel) -> Option<&ChannelStats> {
        self.channels.iter().find(|s| s.channel == channel)
    }
}

/// Summarize `samples` over the given channels.
///
/// Callers are expected to gate on a minimum sample count before asking
/// for a summary. An empty slice yields `count == 0` and zeroed channel
/// entries rather than a division by zero.
///
/// # Examples
///
/// ```
/// use glovelink_core::{Channel, Sample};
/// use glovelink_session::stats::summarize;
///
/// let samples = vec![
///     Sample::now([10, 0, 0, 0, 0]),
///     Sample::now([11, 0, 0, 0, 0]),
/// ];
///
/// let summary = summarize(&samples, &[Channel::Thumb]);
/// assert_eq!(summary.count, 2);
/// assert_eq!(summary.channels[0].mean, 11); // 10.5 rounds up
/// assert_eq!(summary.channels[0].max, 11);
/// ```
pub fn summarize(samples: &[Sample], channels: &[Channel]) -> SessionSummary {
    summarize_iter(samples.iter(), channels)
}

/// Summarize over any sample iterator, e.g. a history buffer's contents.
pub fn summarize_iter<'a, I>(samples: I, channels: &[Channel]) -> SessionSummary
where
    I: Iterator<Item = &'a Sample> + Clone,
{
    let count = samples.clone().count();

    let channels = channels
        .iter()
        .map(|&channel| {
            let values = samples.clone().map(|s| s.value(channel));
            let sum: i64 = values.clone().map(i64::from).sum();

            ChannelStats {
                channel,
                mean: mean_rounded(sum, count),
                min: values.clone().min().unwrap_or(0),
                max: values.max().unwrap_or(0),
            }
        })
        .collect();

    SessionSummary { count, channels }
}

fn mean_rounded(sum: i64, count: usize) -> i32 {
    if count == 0 {
        return 0;
    }
    (sum as f64 / count as f64).round() as i32
}
