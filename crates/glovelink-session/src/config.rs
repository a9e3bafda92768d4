//! Session configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use glovelink_core::constants::{
    DEFAULT_HISTORY_CAPACITY, DEFAULT_REASSEMBLY_LIMIT, DEFAULT_SIMULATION_INTERVAL_MS,
    MAX_HISTORY_CAPACITY, MIN_REPORT_SAMPLES,
};
use glovelink_core::{Error, Result};
use glovelink_transport::BleUuid;

/// Configuration for a [`ConnectionSession`](crate::ConnectionSession).
///
/// Deserializable so a host can embed it in its own config file; missing
/// fields take their defaults.
///
/// # Examples
///
/// ```
/// use glovelink_session::SessionConfig;
///
/// let config = SessionConfig::default()
///     .history_capacity(60)
///     .simulation_seed(7);
///
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Samples kept in the history window.
    pub history_capacity: usize,

    /// Characters the reassembler may hold without a frame boundary.
    pub reassembly_limit: usize,

    /// Samples required before a report request can be built.
    pub min_report_samples: usize,

    /// Simulation cadence in milliseconds.
    pub simulation_interval_ms: u64,

    /// Service UUIDs to try, in order.
    pub service_candidates: Vec<BleUuid>,

    /// Characteristic UUIDs to try, in order.
    pub characteristic_candidates: Vec<BleUuid>,

    /// Fixed seed for the simulation source; `None` seeds from entropy.
    pub simulation_seed: Option<u64>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            history_capacity: DEFAULT_HISTORY_CAPACITY,
            reassembly_limit: DEFAULT_REASSEMBLY_LIMIT,
            min_report_samples: MIN_REPORT_SAMPLES,
            simulation_interval_ms: DEFAULT_SIMULATION_INTERVAL_MS,
            service_candidates: BleUuid::serial_service(),
            characteristic_candidates: BleUuid::serial_characteristic(),
            simulation_seed: None,
        }
    }
}

impl SessionConfig {
    /// Set the history window size
    pub fn history_capacity(mut self, capacity: usize) -> Self {
        self.history_capacity = capacity;
        self
    }

    /// Set the reassembly safety threshold
    pub fn reassembly_limit(mut self, limit: usize) -> Self {
        self.reassembly_limit = limit;
        self
    }

    /// Set the minimum sample count for reports
    pub fn min_report_samples(mut self, count: usize) -> Self {
        self.min_report_samples = count;
        self
    }

    /// Set the simulation cadence
    pub fn simulation_interval(mut self, interval: Duration) -> Self {
        self.simulation_interval_ms = interval.as_millis().try_into().unwrap_or(u64::MAX);
        self
    }

    /// Set the service UUID candidates
    pub fn service_candidates(mut self, candidates: Vec<BleUuid>) -> Self {
        self.service_candidates = candidates;
        self
    }

    /// Set the characteristic UUID candidates
    pub fn characteristic_candidates(mut self, candidates: Vec<BleUuid>) -> Self {
        self.characteristic_candidates = candidates;
        self
    }

    /// Seed the simulation source for reproducible runs
    pub fn simulation_seed(mut self, seed: u64) -> Self {
        self.simulation_seed = Some(seed);
        self
    }

    /// The simulation cadence as a `Duration`.
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.simulation_interval_ms)
    }

    /// Check that the configuration can drive a session.
    ///
    /// Discovery tries the primary UUID and at most one alternate, so each
    /// candidate list must hold one or two entries.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidCapacity` for an unusable history size and
    /// `Error::Config` for the other fields.
    pub fn validate(&self) -> Result<()> {
        if self.history_capacity == 0 || self.history_capacity > MAX_HISTORY_CAPACITY {
            return Err(Error::InvalidCapacity(format!(
                "history capacity must be 1-{MAX_HISTORY_CAPACITY}, got {}",
                self.history_capacity
            )));
        }

        if self.reassembly_limit == 0 {
            return Err(Error::Config("reassembly limit must be positive".into()));
        }

        if self.min_report_samples == 0 || self.min_report_samples > self.history_capacity {
            return Err(Error::Config(format!(
                "min report samples must be 1-{}, got {}",
                self.history_capacity, self.min_report_samples
            )));
        }

        if self.simulation_interval_ms == 0 {
            return Err(Error::Config("simulation interval must be positive".into()));
        }

        for (name, candidates) in [
            ("service", &self.service_candidates),
            ("characteristic", &self.characteristic_candidates),
        ] {
            if !(1..=2).contains(&candidates.len()) {
                return Err(Error::Config(format!(
                    "{name} candidates must list 1 or 2 UUIDs, got {}",
                    candidates.len()
                )));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_default_config_is_valid() {
        let config = SessionConfig::default();

        assert!(config.validate().is_ok());
        assert_eq!(config.history_capacity, 50);
        assert_eq!(config.interval(), Duration::from_millis(500));
        assert_eq!(config.service_candidates[0], BleUuid::Alias(0xFFE0));
        assert_eq!(config.characteristic_candidates[0], BleUuid::Alias(0xFFE1));
    }

    #[rstest]
    #[case(SessionConfig::default().history_capacity(0))]
    #[case(SessionConfig::default().reassembly_limit(0))]
    #[case(SessionConfig::default().min_report_samples(0))]
    #[case(SessionConfig::default().history_capacity(3))]
    #[case(SessionConfig::default().simulation_interval(Duration::ZERO))]
    #[case(SessionConfig::default().service_candidates(vec![]))]
    #[case(SessionConfig::default().characteristic_candidates(vec![
        BleUuid::Alias(1), BleUuid::Alias(2), BleUuid::Alias(3),
    ]))]
    fn test_invalid_configs(#[case] config: SessionConfig) {
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_deserialize_partial() {
        let config: SessionConfig = serde_json::from_str(
            r#"{ "history_capacity": 60, "service_candidates": [65504] }"#,
        )
        .unwrap();

        assert_eq!(config.history_capacity, 60);
        assert_eq!(config.service_candidates, vec![BleUuid::Alias(0xFFE0)]);
        assert_eq!(config.reassembly_limit, 50);
        assert!(config.validate().is_ok());
    }
}
