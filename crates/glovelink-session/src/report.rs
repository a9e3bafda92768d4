//! Report and export collaborator interfaces.
//!
//! The session never writes reports itself. It builds a [`ReportRequest`]
//! from the current history once enough samples have been collected, and
//! hands it to whatever [`ReportGenerator`] and [`ExportSink`] the host
//! plugs in.

#![allow(async_fn_in_trait)]

use serde::{Deserialize, Serialize};

use glovelink_core::Channel;

use crate::error::SessionError;
use crate::history::HistoryBuffer;
use crate::stats::{SessionSummary, summarize_iter};

/// Errors raised by report collaborators.
#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    /// The generator could not produce a report.
    #[error("Report generation failed: {0}")]
    Generation(String),

    /// The export sink failed to write.
    #[error("Export failed: {0}")]
    Export(#[from] std::io::Error),
}

/// Everything a report generator receives.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportRequest {
    pub patient_label: String,
    pub device_label: String,
    pub summary: SessionSummary,
}

impl ReportRequest {
    /// Build a request from the history window, summarizing every channel.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::InsufficientSamples` when the history holds
    /// fewer than `min_samples` samples.
    pub fn from_history(
        history: &HistoryBuffer,
        patient_label: impl Into<String>,
        device_label: impl Into<String>,
        min_samples: usize,
    ) -> Result<Self, SessionError> {
        if history.len() < min_samples {
            return Err(SessionError::InsufficientSamples {
                have: history.len(),
                need: min_samples,
            });
        }

        Ok(Self {
            patient_label: patient_label.into(),
            device_label: device_label.into(),
            summary: summarize_iter(history.iter(), &Channel::ALL),
        })
    }
}

/// Turns aggregated statistics into report text.
pub trait ReportGenerator {
    async fn generate(&self, request: &ReportRequest) -> Result<String, ReportError>;
}

/// Consumes a finished report.
pub trait ExportSink {
    fn export(&mut self, request: &ReportRequest, report: &str) -> Result<(), ReportError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use glovelink_core::Sample;

    fn history_with(n: usize) -> HistoryBuffer {
        let mut history = HistoryBuffer::default();
        for i in 0..n {
            history.append(Sample::now([i as i32; 5]));
        }
        history
    }

    #[test]
    fn test_request_requires_min_samples() {
        let result = ReportRequest::from_history(&history_with(4), "P-1", "GloveLink-01", 5);

        assert!(matches!(
            result,
            Err(SessionError::InsufficientSamples { have: 4, need: 5 })
        ));
    }

    #[test]
    fn test_request_from_history() {
        let request =
            ReportRequest::from_history(&history_with(5), "P-1", "GloveLink-01", 5).unwrap();

        assert_eq!(request.patient_label, "P-1");
        assert_eq!(request.summary.count, 5);
        assert_eq!(request.summary.channels.len(), 5);
        assert_eq!(request.summary.channels[0].max, 4);
        assert_eq!(request.summary.channels[0].mean, 2);
    }

    struct Echo;

    impl ReportGenerator for Echo {
        async fn generate(&self, request: &ReportRequest) -> Result<String, ReportError> {
            Ok(format!("{} samples", request.summary.count))
        }
    }

    #[derive(Default)]
    struct Collect(Vec<String>);

    impl ExportSink for Collect {
        fn export(&mut self, _request: &ReportRequest, report: &str) -> Result<(), ReportError> {
            self.0.push(report.to_string());
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_collaborators() {
        let request =
            ReportRequest::from_history(&history_with(6), "P-2", "GloveLink-02", 5).unwrap();
        let mut sink = Collect::default();

        let report = Echo.generate(&request).await.unwrap();
        sink.export(&request, &report).unwrap();

        assert_eq!(sink.0, vec!["6 samples".to_string()]);
    }
}
