//! Report text and JSON export used by the runner.

use std::io::Write;

use serde::Serialize;

use glovelink_session::{
    ExportSink, IngestStats, ReportError, ReportGenerator, ReportRequest, SessionSummary,
};

/// Plain-text report: one line per channel.
#[derive(Debug, Default, Clone, Copy)]
pub struct SummaryReport;

impl ReportGenerator for SummaryReport {
    async fn generate(&self, request: &ReportRequest) -> Result<String, ReportError> {
        if request.summary.count == 0 {
            return Err(ReportError::Generation("summary has no samples".into()));
        }

        let mut text = format!(
            "Patient {} on {}: {} readings\n",
            request.patient_label, request.device_label, request.summary.count
        );
        for stats in &request.summary.channels {
            text.push_str(&format!(
                "  {:<6} mean {:>3}  range {:>3}-{:<3}\n",
                stats.channel.label(),
                stats.mean,
                stats.min,
                stats.max
            ));
        }
        Ok(text)
    }
}

#[derive(Serialize)]
struct ExportDocument<'a> {
    patient: &'a str,
    device: &'a str,
    summary: &'a SessionSummary,
    report: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    ingest: Option<IngestStats>,
}

/// Writes the request and report as one JSON document.
pub struct JsonExport<W: Write> {
    writer: W,
    compact: bool,
    stats: Option<IngestStats>,
}

impl<W: Write> JsonExport<W> {
    pub fn new(writer: W, compact: bool) -> Self {
        Self {
            writer,
            compact,
            stats: None,
        }
    }

    /// Include ingest counters in the exported document.
    pub fn with_stats(mut self, stats: IngestStats) -> Self {
        self.stats = Some(stats);
        self
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> ExportSink for JsonExport<W> {
    fn export(&mut self, request: &ReportRequest, report: &str) -> Result<(), ReportError> {
        let document = ExportDocument {
            patient: &request.patient_label,
            device: &request.device_label,
            summary: &request.summary,
            report,
            ingest: self.stats,
        };

        let json = if self.compact {
            serde_json::to_string(&document)
        } else {
            serde_json::to_string_pretty(&document)
        }
        .map_err(|e| ReportError::Generation(format!("JSON serialization failed: {e}")))?;

        self.writer.write_all(json.as_bytes())?;
        self.writer.write_all(b"\n")?;
        self.writer.flush()?;
        Ok(())
    }
}
