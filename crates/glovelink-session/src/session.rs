//! Connection session.
//!
//! [`ConnectionSession`] owns everything one glove session needs: the
//! transport, the state machine, the reassembly buffer, the history window
//! and the active data source. All mutation goes through `&mut self`, so a
//! host that shares a session between tasks wraps it in a single
//! `tokio::sync::Mutex`.
//!
//! # Lifecycle
//!
//! ```text
//! connect() ──► Scanning ► Connecting ► DiscoveringService ► DiscoveringCharacteristic
//!                                                              ► Subscribing ► Streaming
//! next_event() loop: chunk ► reassemble ► decode ► history
//! disconnect() / transport drop / DisconnectHandle ──► Disconnected
//! ```
//!
//! A simulated session skips the transport entirely: `start_simulation()`
//! makes `next_event()` produce one synthetic sample per interval instead.
//! Only one source may be active at a time.
//!
//! # Examples
//!
//! ```no_run
//! use glovelink_session::{ConnectionSession, SessionConfig, SessionEvent};
//! use glovelink_transport::mock::MockTransport;
//!
//! # async fn example() -> glovelink_session::Result<()> {
//! let (transport, _device) = MockTransport::new();
//! let mut session = ConnectionSession::new(transport, SessionConfig::default())?;
//!
//! session.connect().await?;
//! while let Some(event) = session.next_event().await {
//!     if let SessionEvent::Ended(reason) = event {
//!         println!("session ended: {reason:?}");
//!     }
//! }
//! # Ok(())
//! # }
//! ```

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use bytes::Bytes;
use serde::Serialize;
use tokio::sync::watch;
use tokio::time::{Interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};

use glovelink_core::{Channel, Sample};
use glovelink_protocol::{FrameReassembler, decode};
use glovelink_transport::{
    CharacteristicHandle, ChunkStream, DeviceHandle, LinkHandle, ServiceHandle, Transport,
};

use crate::config::SessionConfig;
use crate::error::{Result, SessionError};
use crate::history::HistoryBuffer;
use crate::report::{ReportGenerator, ReportRequest};
use crate::simulation::SimulationSource;
use crate::state_machine::{SessionState, SessionStateMachine, StateTransition};
use crate::stats::{SessionSummary, summarize_iter};

/// Counters describing what happened to incoming data.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct IngestStats {
    /// Chunks delivered to the session, whatever happened to them.
    pub chunks_received: u64,

    /// Frames that decoded into samples.
    pub frames_decoded: u64,

    /// Frames rejected by the decoder.
    pub malformed_frames: u64,

    /// Reassembly buffer resets by the safety valve.
    pub buffer_overflows: u64,

    /// Samples produced by the simulation source.
    pub samples_simulated: u64,

    /// Chunks or ticks discarded because the session was paused.
    pub dropped_while_paused: u64,

    /// Times the transport ended the chunk stream on its own.
    pub transport_drops: u64,
}

/// What a call to [`ConnectionSession::next_event`] produced.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    /// A device chunk was processed, appending this many samples.
    Chunk { samples: usize },

    /// The simulation produced a sample.
    Simulated(Sample),

    /// Input arrived while paused and was discarded.
    Dropped,

    /// The source ended and the session is back in `Disconnected`.
    Ended(EndReason),
}

/// Why a streaming source ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndReason {
    TransportDropped,
    DisconnectRequested,
}

/// Cloneable handle for requesting a disconnect from outside the session.
///
/// A request cancels a pending [`connect`](ConnectionSession::connect) or
/// ends the current stream at the next [`next_event`]
/// (ConnectionSession::next_event) await point. Requests made while nothing
/// is pending have no effect on the next connect.
#[derive(Debug, Clone)]
pub struct DisconnectHandle {
    token: Arc<Mutex<CancellationToken>>,
}

impl DisconnectHandle {
    fn new() -> Self {
        Self {
            token: Arc::new(Mutex::new(CancellationToken::new())),
        }
    }

    /// Ask the session to disconnect.
    pub fn request_disconnect(&self) {
        self.current().cancel();
    }

    fn current(&self) -> CancellationToken {
        self.token
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn renew(&self) -> CancellationToken {
        let mut token = self.token.lock().unwrap_or_else(PoisonError::into_inner);
        *token = CancellationToken::new();
        token.clone()
    }
}

#[derive(Debug)]
struct SimulationDriver {
    source: SimulationSource,

    /// Created on first use so `start_simulation` works outside a runtime.
    interval: Option<Interval>,

    paused: bool,
}

#[derive(Debug)]
enum Source {
    Idle,

    /// `chunks` is `None` until the subscription succeeds.
    Device {
        link: LinkHandle,
        chunks: Option<ChunkStream>,
    },

    Simulation(SimulationDriver),
}

enum Incoming {
    Chunk(Bytes),
    Tick,
    Dropped,
    Cancelled,
}

/// One glove session over a transport.
#[derive(Debug)]
pub struct ConnectionSession<T: Transport> {
    transport: T,
    config: SessionConfig,
    machine: SessionStateMachine,
    state_tx: watch::Sender<SessionState>,
    reassembler: FrameReassembler,
    history: HistoryBuffer,
    source: Source,
    stats: IngestStats,
    disconnect: DisconnectHandle,
}

impl<T: Transport> ConnectionSession<T> {
    /// Create a disconnected session.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Config` if the configuration does not validate.
    pub fn new(transport: T, config: SessionConfig) -> Result<Self> {
        config.validate()?;

        let machine = SessionStateMachine::new();
        let (state_tx, _) = watch::channel(machine.current_state());

        Ok(Self {
            transport,
            reassembler: FrameReassembler::with_limit(config.reassembly_limit),
            history: HistoryBuffer::new(config.history_capacity)?,
            config,
            machine,
            state_tx,
            source: Source::Idle,
            stats: IngestStats::default(),
            disconnect: DisconnectHandle::new(),
        })
    }

    /// Run the connection sequence up to `Streaming(active)`.
    ///
    /// Each discovery step tries the configured UUID candidates in order,
    /// so the alternate form gets exactly one retry. A disconnect request
    /// through a [`DisconnectHandle`] abandons the sequence at whatever step
    /// is pending.
    ///
    /// On any failure the session releases what it acquired and returns to
    /// `Disconnected`. History is kept.
    ///
    /// # Errors
    ///
    /// - `SourceBusy` if a device or simulation is already active
    /// - `UserCancelled`, `TransportUnavailable`, `PermissionDenied` from the transport
    /// - `ServiceNotFound` / `CharacteristicNotFound` once candidates are exhausted
    /// - `Cancelled` if a disconnect was requested while pending
    pub async fn connect(&mut self) -> Result<DeviceHandle> {
        if !matches!(self.source, Source::Idle) || self.state() != SessionState::Disconnected {
            return Err(SessionError::SourceBusy);
        }

        let cancel = self.disconnect.renew();
        info!(transport = self.transport.name(), "connecting");

        let outcome = tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(SessionError::Cancelled),
            result = self.establish() => result,
        };

        match outcome {
            Ok(device) => {
                info!(device = %device, "glove streaming");
                Ok(device)
            }
            Err(e) => {
                warn!(state = %self.state(), error = %e, "connect failed");
                self.teardown().await;
                Err(e)
            }
        }
    }

    async fn establish(&mut self) -> Result<DeviceHandle> {
        self.transition(SessionState::Scanning)?;
        let device = self.transport.scan().await?;
        debug!(device = %device, "device selected");

        self.transition(SessionState::Connecting)?;
        let link = self.transport.connect(&device).await?;
        self.source = Source::Device {
            link: link.clone(),
            chunks: None,
        };

        self.transition(SessionState::DiscoveringService)?;
        let service = self.find_service(&link).await?;

        self.transition(SessionState::DiscoveringCharacteristic)?;
        let characteristic = self.find_characteristic(&service).await?;

        self.transition(SessionState::Subscribing)?;
        let stream = self.transport.subscribe(&characteristic).await?;
        if let Source::Device { chunks, .. } = &mut self.source {
            *chunks = Some(stream);
        }

        self.reassembler.clear();
        self.transition(SessionState::Streaming { paused: false })?;
        Ok(device)
    }

    async fn find_service(&mut self, link: &LinkHandle) -> Result<ServiceHandle> {
        let candidates = self.config.service_candidates.clone();

        for (attempt, uuid) in candidates.iter().copied().enumerate() {
            if attempt > 0 {
                info!(%uuid, "retrying service discovery with alternate UUID");
                self.transition(SessionState::DiscoveringService)?;
            }

            match self.transport.discover_service(link, uuid).await {
                Ok(service) => return Ok(service),
                Err(e) if e.is_not_found() => debug!(%uuid, "service not found"),
                Err(e) => return Err(e.into()),
            }
        }

        Err(SessionError::ServiceNotFound { tried: candidates })
    }

    async fn find_characteristic(
        &mut self,
        service: &ServiceHandle,
    ) -> Result<CharacteristicHandle> {
        let candidates = self.config.characteristic_candidates.clone();

        for (attempt, uuid) in candidates.iter().copied().enumerate() {
            if attempt > 0 {
                info!(%uuid, "retrying characteristic discovery with alternate UUID");
                self.transition(SessionState::DiscoveringCharacteristic)?;
            }

            match self.transport.discover_characteristic(service, uuid).await {
                Ok(characteristic) => return Ok(characteristic),
                Err(e) if e.is_not_found() => debug!(%uuid, "characteristic not found"),
                Err(e) => return Err(e.into()),
            }
        }

        Err(SessionError::CharacteristicNotFound { tried: candidates })
    }

    /// End the active source and return to `Disconnected`.
    ///
    /// Releases the transport link and clears the reassembly buffer. History
    /// survives. Calling this while already disconnected does nothing.
    pub async fn disconnect(&mut self) {
        if matches!(self.source, Source::Idle) && self.state() == SessionState::Disconnected {
            return;
        }

        info!("disconnect requested");
        self.teardown().await;
    }

    async fn teardown(&mut self) {
        match std::mem::replace(&mut self.source, Source::Idle) {
            Source::Device { link, chunks } => {
                drop(chunks);
                if let Err(e) = self.transport.disconnect(&link).await {
                    warn!(error = %e, "transport disconnect failed");
                }
            }
            Source::Simulation(_) => debug!("simulation stopped"),
            Source::Idle => {}
        }

        self.reassembler.clear();

        if let Some(transition) = self.machine.reset() {
            self.publish(&transition);
        }
    }

    /// Stop feeding incoming data into the pipeline without disconnecting.
    ///
    /// # Errors
    ///
    /// Returns `NotStreaming` if neither a device stream nor a simulation is
    /// active.
    pub fn pause(&mut self) -> Result<()> {
        self.set_paused(true)
    }

    /// Resume feeding incoming data into the pipeline.
    pub fn resume(&mut self) -> Result<()> {
        self.set_paused(false)
    }

    fn set_paused(&mut self, paused: bool) -> Result<()> {
        if let Source::Simulation(driver) = &mut self.source {
            driver.paused = paused;
            info!(paused, "simulation pause toggled");
            return Ok(());
        }

        match self.state() {
            SessionState::Streaming { paused: current } if current == paused => Ok(()),
            SessionState::Streaming { .. } => self.transition(SessionState::Streaming { paused }),
            _ => Err(SessionError::NotStreaming),
        }
    }

    /// Feed one raw chunk through reassembly and decoding.
    ///
    /// Only `Streaming(active)` touches the reassembler and history; in any
    /// other state the chunk is discarded. Returns the number of samples
    /// appended to history.
    pub fn ingest_chunk(&mut self, chunk: &[u8]) -> usize {
        self.stats.chunks_received += 1;

        let state = self.state();
        if !state.accepts_chunks() {
            if state.is_streaming() {
                self.stats.dropped_while_paused += 1;
                trace!(len = chunk.len(), "chunk dropped while paused");
            } else {
                trace!(%state, "chunk ignored outside streaming");
            }
            return 0;
        }

        let mut appended = 0;
        for frame in self.reassembler.push_bytes(chunk) {
            match decode(&frame) {
                Ok(sample) => {
                    self.history.append(sample);
                    self.stats.frames_decoded += 1;
                    appended += 1;
                }
                Err(e) => {
                    self.stats.malformed_frames += 1;
                    debug!(error = %e, "dropping malformed frame");
                }
            }
        }
        appended
    }

    /// Switch to the synthetic source.
    ///
    /// # Errors
    ///
    /// Returns `SourceBusy` if a device connection or another simulation is
    /// active.
    pub fn start_simulation(&mut self) -> Result<()> {
        if !matches!(self.source, Source::Idle) || self.state() != SessionState::Disconnected {
            return Err(SessionError::SourceBusy);
        }

        let source = match self.config.simulation_seed {
            Some(seed) => SimulationSource::with_seed(seed),
            None => SimulationSource::new(),
        };

        self.disconnect.renew();
        self.source = Source::Simulation(SimulationDriver {
            source,
            interval: None,
            paused: false,
        });

        info!(
            interval_ms = self.config.simulation_interval_ms,
            "simulation started"
        );
        Ok(())
    }

    /// Stop the synthetic source. History is kept.
    ///
    /// # Errors
    ///
    /// Returns `NotStreaming` if no simulation is running.
    pub fn stop_simulation(&mut self) -> Result<()> {
        if !matches!(self.source, Source::Simulation(_)) {
            return Err(SessionError::NotStreaming);
        }

        self.source = Source::Idle;
        info!("simulation stopped");
        Ok(())
    }

    /// Produce one simulated sample immediately, outside the interval.
    ///
    /// Returns `None` if no simulation is running or it is paused.
    pub fn tick_simulation(&mut self) -> Option<Sample> {
        let Source::Simulation(driver) = &mut self.source else {
            return None;
        };

        if driver.paused {
            self.stats.dropped_while_paused += 1;
            return None;
        }

        let sample = driver.source.tick();
        self.history.append(sample.clone());
        self.stats.samples_simulated += 1;
        trace!(%sample, "simulated sample");
        Some(sample)
    }

    /// Wait for the next input from the active source and process it.
    ///
    /// Returns `None` when no source is active, which makes this usable as a
    /// `while let` loop condition.
    pub async fn next_event(&mut self) -> Option<SessionEvent> {
        let cancel = self.disconnect.current();
        let period = self.config.interval();

        let incoming = match &mut self.source {
            Source::Idle | Source::Device { chunks: None, .. } => return None,
            Source::Device {
                chunks: Some(chunks),
                ..
            } => tokio::select! {
                biased;
                _ = cancel.cancelled() => Incoming::Cancelled,
                chunk = chunks.recv() => chunk.map_or(Incoming::Dropped, Incoming::Chunk),
            },
            Source::Simulation(driver) => {
                let interval = driver.interval.get_or_insert_with(|| {
                    let mut interval = tokio::time::interval(period);
                    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
                    interval
                });
                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => Incoming::Cancelled,
                    _ = interval.tick() => Incoming::Tick,
                }
            }
        };

        let event = match incoming {
            Incoming::Chunk(chunk) => {
                let paused = !self.state().accepts_chunks();
                let samples = self.ingest_chunk(&chunk);
                if paused {
                    SessionEvent::Dropped
                } else {
                    SessionEvent::Chunk { samples }
                }
            }
            Incoming::Tick => match self.tick_simulation() {
                Some(sample) => SessionEvent::Simulated(sample),
                None => SessionEvent::Dropped,
            },
            Incoming::Dropped => {
                self.stats.transport_drops += 1;
                warn!("transport ended the chunk stream");
                self.teardown().await;
                SessionEvent::Ended(EndReason::TransportDropped)
            }
            Incoming::Cancelled => {
                info!("disconnect requested");
                self.teardown().await;
                SessionEvent::Ended(EndReason::DisconnectRequested)
            }
        };

        Some(event)
    }

    /// Clear the history window. The only way history is ever emptied.
    pub fn reset_history(&mut self) {
        self.history.clear();
        debug!("history cleared");
    }

    /// Copy of the history window, oldest first.
    pub fn snapshot(&self) -> Vec<Sample> {
        self.history.snapshot()
    }

    /// Summary statistics over the current history.
    pub fn summarize(&self, channels: &[Channel]) -> SessionSummary {
        summarize_iter(self.history.iter(), channels)
    }

    /// Build a report request if enough samples have been collected.
    pub fn report_request(
        &self,
        patient_label: impl Into<String>,
        device_label: impl Into<String>,
    ) -> Result<ReportRequest> {
        ReportRequest::from_history(
            &self.history,
            patient_label,
            device_label,
            self.config.min_report_samples,
        )
    }

    /// Build a report request and pass it to a generator.
    pub async fn generate_report<G: ReportGenerator>(
        &self,
        generator: &G,
        patient_label: impl Into<String>,
        device_label: impl Into<String>,
    ) -> Result<(ReportRequest, String)> {
        let request = self.report_request(patient_label, device_label)?;
        let report = generator.generate(&request).await?;
        Ok((request, report))
    }

    pub fn state(&self) -> SessionState {
        self.machine.current_state()
    }

    /// Receiver that observes every state change.
    pub fn state_updates(&self) -> watch::Receiver<SessionState> {
        self.state_tx.subscribe()
    }

    /// Recent state transitions, oldest first.
    pub fn transitions(&self) -> &VecDeque<StateTransition> {
        self.machine.history()
    }

    /// How long the session has been in its current state.
    pub fn time_in_state(&self) -> Duration {
        self.machine.time_in_current_state()
    }

    pub fn disconnect_handle(&self) -> DisconnectHandle {
        self.disconnect.clone()
    }

    pub fn history(&self) -> &HistoryBuffer {
        &self.history
    }

    pub fn stats(&self) -> IngestStats {
        IngestStats {
            buffer_overflows: self.reassembler.overflow_count(),
            ..self.stats
        }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn is_simulating(&self) -> bool {
        matches!(self.source, Source::Simulation(_))
    }

    pub fn is_paused(&self) -> bool {
        match &self.source {
            Source::Simulation(driver) => driver.paused,
            _ => self.state() == SessionState::Streaming { paused: true },
        }
    }

    fn transition(&mut self, to: SessionState) -> Result<()> {
        let transition = self.machine.transition_to(to)?;
        self.publish(&transition);
        Ok(())
    }

    fn publish(&self, transition: &StateTransition) {
        match transition.to {
            SessionState::Disconnected | SessionState::Streaming { .. } => {
                info!(from = %transition.from, to = %transition.to, "session state changed")
            }
            _ => debug!(from = %transition.from, to = %transition.to, "session state changed"),
        }
        self.state_tx.send_replace(transition.to);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glovelink_transport::mock::MockTransport;

    fn session() -> ConnectionSession<MockTransport> {
        let (transport, _handle) = MockTransport::new();
        ConnectionSession::new(transport, SessionConfig::default().simulation_seed(5)).unwrap()
    }

    #[test]
    fn test_new_session_is_idle() {
        let session = session();

        assert_eq!(session.state(), SessionState::Disconnected);
        assert!(session.history().is_empty());
        assert!(!session.is_simulating());
        assert_eq!(session.stats(), IngestStats::default());
    }

    #[test]
    fn test_invalid_config_rejected() {
        let (transport, _handle) = MockTransport::new();
        let result = ConnectionSession::new(transport, SessionConfig::default().history_capacity(0));

        assert!(matches!(result, Err(SessionError::Config(_))));
    }

    #[test]
    fn test_chunks_ignored_while_disconnected() {
        let mut session = session();

        assert_eq!(session.ingest_chunk(b"1,2,3,4,5\n"), 0);
        assert!(session.history().is_empty());
        assert_eq!(session.stats().dropped_while_paused, 0);
        assert_eq!(session.stats().chunks_received, 1);
    }

    #[test]
    fn test_pause_requires_source() {
        let mut session = session();
        assert!(matches!(session.pause(), Err(SessionError::NotStreaming)));
    }

    #[test]
    fn test_simulation_ticks_without_runtime() {
        let mut session = session();
        session.start_simulation().unwrap();

        for _ in 0..3 {
            assert!(session.tick_simulation().unwrap().is_in_range());
        }

        session.pause().unwrap();
        assert!(session.is_paused());
        assert!(session.tick_simulation().is_none());

        assert_eq!(session.history().len(), 3);
        assert_eq!(session.stats().samples_simulated, 3);
        assert_eq!(session.stats().dropped_while_paused, 1);
    }

    #[test]
    fn test_sources_are_exclusive() {
        let mut session = session();
        session.start_simulation().unwrap();

        assert!(matches!(
            session.start_simulation(),
            Err(SessionError::SourceBusy)
        ));

        session.stop_simulation().unwrap();
        assert!(matches!(
            session.stop_simulation(),
            Err(SessionError::NotStreaming)
        ));
    }
}
