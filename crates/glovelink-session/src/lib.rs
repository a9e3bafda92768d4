//! Glove ingestion session.
//!
//! This crate ties the pipeline together: the connection state machine, the
//! bounded history window, the synthetic source, summary statistics and the
//! interfaces to the report collaborators, all driven by
//! [`ConnectionSession`].

pub mod config;
pub mod error;
pub mod history;
pub mod report;
pub mod session;
pub mod simulation;
pub mod state_machine;
pub mod stats;

pub use config::SessionConfig;
pub use error::{Result, SessionError};
pub use history::HistoryBuffer;
pub use report::{ExportSink, ReportError, ReportGenerator, ReportRequest};
pub use session::{ConnectionSession, DisconnectHandle, EndReason, IngestStats, SessionEvent};
pub use simulation::SimulationSource;
pub use state_machine::{SessionState, SessionStateMachine, StateTransition};
pub use stats::{ChannelStats, SessionSummary, summarize};
