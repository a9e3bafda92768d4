//! Synthetic sample source for running without a glove.
//!
//! Each finger follows a bounded random walk so the curves look like slow
//! flexion and extension. The thumb is redrawn every tick instead: from
//! [0, 20) when its previous value was above 150, otherwise from [20, 60).

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use glovelink_core::constants::{CHANNEL_COUNT, MAX_ANGLE, MIN_ANGLE};
use glovelink_core::{Channel, Sample};

/// Channel driven by the reset rule instead of the random walk.
const RESET_CHANNEL: Channel = Channel::Thumb;

/// Above this angle the reset channel snaps back open.
const RESET_THRESHOLD: i32 = 150;

/// Maximum step per tick, per channel. The reset channel ignores its entry.
const STEP_MAGNITUDES: [i32; CHANNEL_COUNT] = [0, 15, 12, 10, 8];

/// Starting pose: thumb clenched past the reset threshold, fingers half bent.
const INITIAL_POSE: [i32; CHANNEL_COUNT] = [160, 90, 90, 90, 90];

/// Synthetic glove producing one in-range [`Sample`] per tick.
///
/// # Examples
///
/// ```
/// use glovelink_session::SimulationSource;
///
/// let mut source = SimulationSource::with_seed(7);
/// let sample = source.tick();
/// assert!(sample.is_in_range());
/// ```
#[derive(Debug, Clone)]
pub struct SimulationSource {
    rng: StdRng,
    current: [i32; CHANNEL_COUNT],
}

impl SimulationSource {
    /// Create a source seeded from OS entropy.
    pub fn new() -> Self {
        Self::from_rng(StdRng::from_entropy())
    }

    /// Create a reproducible source.
    pub fn with_seed(seed: u64) -> Self {
        Self::from_rng(StdRng::seed_from_u64(seed))
    }

    fn from_rng(rng: StdRng) -> Self {
        Self {
            rng,
            current: INITIAL_POSE,
        }
    }

    /// Produce the next sample, stamped with the current time.
    pub fn tick(&mut self) -> Sample {
        Sample::now(self.advance())
    }

    /// Advance every channel one step and return the new values.
    pub fn advance(&mut self) -> [i32; CHANNEL_COUNT] {
        for channel in Channel::ALL {
            let i = channel.index();
            let previous = self.current[i];

            self.current[i] = if channel == RESET_CHANNEL {
                if previous > RESET_THRESHOLD {
                    self.rng.gen_range(0..20)
                } else {
                    self.rng.gen_range(20..60)
                }
            } else {
                let magnitude = STEP_MAGNITUDES[i];
                let step = self.rng.gen_range(-magnitude..=magnitude);
                (previous + step).clamp(MIN_ANGLE, MAX_ANGLE)
            };
        }

        self.current
    }

    /// Values produced by the last tick (the initial pose before any tick).
    pub fn current(&self) -> &[i32; CHANNEL_COUNT] {
        &self.current
    }
}

impl Default for SimulationSource {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_values_stay_in_range() {
        let mut source = SimulationSource::with_seed(42);

        for _ in 0..5_000 {
            let sample = source.tick();
            assert!(sample.is_in_range(), "out of range: {sample}");
        }
    }

    #[test]
    fn test_walk_steps_are_bounded() {
        let mut source = SimulationSource::with_seed(1);

        for _ in 0..1_000 {
            let before = *source.current();
            let after = source.advance();

            for channel in Channel::ALL.into_iter().filter(|c| *c != RESET_CHANNEL) {
                let i = channel.index();
                assert!((after[i] - before[i]).abs() <= STEP_MAGNITUDES[i]);
            }
        }
    }

    #[test]
    fn test_reset_channel_bands() {
        let mut source = SimulationSource::with_seed(3);

        for _ in 0..1_000 {
            let previous = source.current()[RESET_CHANNEL.index()];
            let value = source.advance()[RESET_CHANNEL.index()];

            if previous > RESET_THRESHOLD {
                assert!((0..20).contains(&value));
            } else {
                assert!((20..60).contains(&value));
            }
        }
    }

    #[test]
    fn test_same_seed_same_sequence() {
        let mut a = SimulationSource::with_seed(99);
        let mut b = SimulationSource::with_seed(99);

        for _ in 0..50 {
            assert_eq!(a.advance(), b.advance());
        }
    }
}
