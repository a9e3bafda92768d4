//! Connection state machine.
//!
//! This module tracks where a glove session is in its lifecycle, from the
//! idle `Disconnected` state through device selection and GATT discovery to
//! streaming, and enforces that only legal transitions happen.
//!
//! # States
//!
//! - `Disconnected`: no link, initial and terminal state
//! - `Scanning`: waiting for the user to pick a device
//! - `Connecting`: opening the link
//! - `DiscoveringService`: looking up the serial bridge service
//! - `DiscoveringCharacteristic`: looking up the notify characteristic
//! - `Subscribing`: enabling notifications
//! - `Streaming { paused }`: receiving chunks; only the active variant
//!   feeds the pipeline
//!
//! # Valid Transitions
//!
//! - Disconnected → Scanning → Connecting → DiscoveringService
//! - DiscoveringService → DiscoveringService (alternate UUID form) → DiscoveringCharacteristic
//! - DiscoveringCharacteristic → DiscoveringCharacteristic (alternate UUID form) → Subscribing
//! - Subscribing → Streaming(active) ⇄ Streaming(paused)
//! - any state except Disconnected → Disconnected
//!
//! # Examples
//!
//! ```
//! use glovelink_session::{SessionState, SessionStateMachine};
//!
//! let mut machine = SessionStateMachine::new();
//! assert_eq!(machine.current_state(), SessionState::Disconnected);
//!
//! machine.transition_to(SessionState::Scanning).unwrap();
//! assert!(machine.transition_to(SessionState::Subscribing).is_err());
//! ```

use std::collections::VecDeque;
use std::fmt;
use std::time::{Duration, Instant};

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

use glovelink_core::{Error, Result};

/// Maximum number of state transitions to keep in history.
///
/// A clean connect is seven transitions, so this holds roughly a dozen
/// complete connect/disconnect cycles.
const MAX_HISTORY_SIZE: usize = 100;

/// Lifecycle state of a glove session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    /// No link. Initial state, and where every failure ends up.
    Disconnected,

    /// Waiting for device selection.
    Scanning,

    /// Opening the link to the selected device.
    Connecting,

    /// Looking up the serial bridge service.
    DiscoveringService,

    /// Looking up the notify characteristic.
    DiscoveringCharacteristic,

    /// Enabling notifications.
    Subscribing,

    /// Notifications enabled. While paused, chunks are dropped without
    /// touching the reassembly buffer or history.
    Streaming { paused: bool },
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state_str = match self {
            SessionState::Disconnected => "Disconnected",
            SessionState::Scanning => "Scanning",
            SessionState::Connecting => "Connecting",
            SessionState::DiscoveringService => "DiscoveringService",
            SessionState::DiscoveringCharacteristic => "DiscoveringCharacteristic",
            SessionState::Subscribing => "Subscribing",
            SessionState::Streaming { paused: false } => "Streaming(active)",
            SessionState::Streaming { paused: true } => "Streaming(paused)",
        };
        write!(f, "{}", state_str)
    }
}

impl SessionState {
    /// Check if transition to target state is valid from this state.
    ///
    /// # Examples
    ///
    /// ```
    /// use glovelink_session::SessionState;
    ///
    /// assert!(SessionState::Disconnected.can_transition_to(&SessionState::Scanning));
    /// assert!(SessionState::DiscoveringService.can_transition_to(&SessionState::Disconnected));
    /// assert!(!SessionState::Disconnected.can_transition_to(&SessionState::Disconnected));
    /// assert!(!SessionState::DiscoveringService.can_transition_to(&SessionState::Subscribing));
    /// ```
    pub fn can_transition_to(&self, target: &SessionState) -> bool {
        use SessionState::*;

        matches!(
            (self, target),
            (Disconnected, Scanning)
            | (Scanning, Connecting)
            | (Connecting, DiscoveringService)
            // Self-loops are the one-retry with the alternate UUID form
            | (DiscoveringService, DiscoveringService | DiscoveringCharacteristic)
            | (DiscoveringCharacteristic, DiscoveringCharacteristic | Subscribing)
            | (Subscribing, Streaming { paused: false })
            | (Streaming { paused: false }, Streaming { paused: true })
            | (Streaming { paused: true }, Streaming { paused: false })
        ) || (*self != Disconnected && *target == Disconnected)
    }

    /// Whether the session is somewhere between scan and subscription.
    pub fn is_connecting(&self) -> bool {
        matches!(
            self,
            SessionState::Scanning
                | SessionState::Connecting
                | SessionState::DiscoveringService
                | SessionState::DiscoveringCharacteristic
                | SessionState::Subscribing
        )
    }

    /// Whether notifications are enabled, paused or not.
    pub fn is_streaming(&self) -> bool {
        matches!(self, SessionState::Streaming { .. })
    }

    /// Whether incoming chunks are fed into the pipeline.
    pub fn accepts_chunks(&self) -> bool {
        matches!(self, SessionState::Streaming { paused: false })
    }
}

/// A single state transition with wall-clock timestamp.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateTransition {
    /// The state transitioned from.
    pub from: SessionState,

    /// The state transitioned to.
    pub to: SessionState,

    /// When the transition occurred.
    pub timestamp: DateTime<Local>,
}

impl StateTransition {
    /// Create a new state transition record stamped with the current time.
    pub fn new(from: SessionState, to: SessionState) -> Self {
        Self {
            from,
            to,
            timestamp: Local::now(),
        }
    }
}

/// State machine for a glove session.
///
/// Holds the current state and a bounded log of recent transitions. It does
/// not perform any I/O; [`ConnectionSession`](crate::ConnectionSession) drives
/// it between transport calls.
///
/// This struct is not thread-safe. In async contexts, protect access using
/// `tokio::sync::Mutex` or keep it inside a single owning task.
///
/// # Examples
///
/// ```
/// use glovelink_session::{SessionState, SessionStateMachine};
///
/// let mut machine = SessionStateMachine::new();
///
/// machine.transition_to(SessionState::Scanning).unwrap();
/// machine.transition_to(SessionState::Connecting).unwrap();
/// machine.transition_to(SessionState::Disconnected).unwrap();
///
/// assert_eq!(machine.history().len(), 3);
/// ```
#[derive(Debug)]
pub struct SessionStateMachine {
    current_state: SessionState,

    state_entered_at: Instant,

    /// Recent transitions, oldest first (limited to MAX_HISTORY_SIZE).
    history: VecDeque<StateTransition>,
}

impl SessionStateMachine {
    /// Create a new state machine in the `Disconnected` state.
    pub fn new() -> Self {
        Self {
            current_state: SessionState::Disconnected,
            state_entered_at: Instant::now(),
            history: VecDeque::with_capacity(MAX_HISTORY_SIZE),
        }
    }

    /// Get the current state.
    pub fn current_state(&self) -> SessionState {
        self.current_state
    }

    /// Get the time elapsed in the current state.
    pub fn time_in_current_state(&self) -> Duration {
        self.state_entered_at.elapsed()
    }

    /// Recent transitions, ordered from oldest to newest.
    pub fn history(&self) -> &VecDeque<StateTransition> {
        &self.history
    }

    /// Transition to a new state, validating the transition.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidStateTransition` if the transition is not
    /// allowed from the current state. The machine is left unchanged.
    pub fn transition_to(&mut self, new_state: SessionState) -> Result<StateTransition> {
        if !self.current_state.can_transition_to(&new_state) {
            return Err(Error::InvalidStateTransition {
                from: self.current_state.to_string(),
                to: new_state.to_string(),
            });
        }

        let transition = StateTransition::new(self.current_state, new_state);
        self.perform_state_change(new_state, transition.clone());

        Ok(transition)
    }

    /// Force the machine back to `Disconnected`.
    ///
    /// Returns `None` if it was already there.
    pub fn reset(&mut self) -> Option<StateTransition> {
        if self.current_state == SessionState::Disconnected {
            return None;
        }

        let transition = StateTransition::new(self.current_state, SessionState::Disconnected);
        self.perform_state_change(SessionState::Disconnected, transition.clone());
        Some(transition)
    }

    fn perform_state_change(&mut self, new_state: SessionState, transition: StateTransition) {
        self.current_state = new_state;
        self.state_entered_at = Instant::now();

        self.history.push_back(transition);
        if self.history.len() > MAX_HISTORY_SIZE {
            self.history.pop_front();
        }
    }
}

impl Default for SessionStateMachine {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use SessionState::*;

    const ACTIVE: SessionState = Streaming { paused: false };
    const PAUSED: SessionState = Streaming { paused: true };

    fn machine_in(state: SessionState) -> SessionStateMachine {
        SessionStateMachine {
            current_state: state,
            state_entered_at: Instant::now(),
            history: VecDeque::new(),
        }
    }

    fn connect_path() -> [SessionState; 7] {
        [
            Scanning,
            Connecting,
            DiscoveringService,
            DiscoveringCharacteristic,
            Subscribing,
            ACTIVE,
            PAUSED,
        ]
    }

    #[test]
    fn test_new_machine_starts_disconnected() {
        let machine = SessionStateMachine::new();
        assert_eq!(machine.current_state(), Disconnected);
        assert!(machine.history().is_empty());
    }

    #[test]
    fn test_full_connect_path() {
        let mut machine = SessionStateMachine::new();

        for state in connect_path() {
            machine.transition_to(state).unwrap();
        }

        assert_eq!(machine.current_state(), PAUSED);
        assert_eq!(machine.history().len(), 7);
        assert!(machine.history().iter().any(|t| t.to == Subscribing));
    }

    #[rstest]
    #[case(Disconnected, Connecting)]
    #[case(Disconnected, ACTIVE)]
    #[case(Scanning, DiscoveringService)]
    #[case(Connecting, Connecting)]
    #[case(DiscoveringService, Subscribing)]
    #[case(DiscoveringCharacteristic, DiscoveringService)]
    #[case(Subscribing, PAUSED)]
    #[case(ACTIVE, Subscribing)]
    #[case(ACTIVE, ACTIVE)]
    #[case(Disconnected, Disconnected)]
    fn test_invalid_transitions(#[case] from: SessionState, #[case] to: SessionState) {
        let mut machine = machine_in(from);

        let result = machine.transition_to(to);

        assert!(matches!(result, Err(Error::InvalidStateTransition { .. })));
        assert_eq!(machine.current_state(), from);
        assert!(machine.history().is_empty());
    }

    #[rstest]
    #[case(Scanning)]
    #[case(Connecting)]
    #[case(DiscoveringService)]
    #[case(DiscoveringCharacteristic)]
    #[case(Subscribing)]
    #[case(ACTIVE)]
    #[case(PAUSED)]
    fn test_any_state_can_disconnect(#[case] from: SessionState) {
        let mut machine = machine_in(from);

        let transition = machine.transition_to(Disconnected).unwrap();
        assert_eq!(transition.from, from);
        assert_eq!(machine.current_state(), Disconnected);
    }

    #[test]
    fn test_discovery_retry_self_loops() {
        let mut machine = machine_in(DiscoveringService);

        machine.transition_to(DiscoveringService).unwrap();
        machine.transition_to(DiscoveringCharacteristic).unwrap();
        machine.transition_to(DiscoveringCharacteristic).unwrap();
        machine.transition_to(Subscribing).unwrap();

        assert_eq!(machine.history().len(), 4);
    }

    #[test]
    fn test_reset() {
        let mut machine = SessionStateMachine::new();
        assert!(machine.reset().is_none());

        machine.transition_to(Scanning).unwrap();
        let transition = machine.reset().unwrap();

        assert_eq!(transition.from, Scanning);
        assert_eq!(machine.current_state(), Disconnected);
    }

    #[test]
    fn test_history_bounded() {
        let mut machine = SessionStateMachine::new();

        for _ in 0..60 {
            machine.transition_to(Scanning).unwrap();
            machine.transition_to(Disconnected).unwrap();
        }

        assert_eq!(machine.history().len(), MAX_HISTORY_SIZE);
        let mut newest = machine.history().iter().rev();
        assert_eq!(newest.next().unwrap().to, Disconnected);
        assert_eq!(newest.next().unwrap().to, Scanning);
    }

    #[test]
    fn test_time_in_state_restarts_on_transition() {
        let mut machine = SessionStateMachine::new();
        std::thread::sleep(Duration::from_millis(20));
        let before = machine.time_in_current_state();
        assert!(before >= Duration::from_millis(20));

        machine.transition_to(Scanning).unwrap();
        assert!(machine.time_in_current_state() < before);
    }

    #[test]
    fn test_state_predicates() {
        assert!(Scanning.is_connecting());
        assert!(!ACTIVE.is_connecting());
        assert!(PAUSED.is_streaming());
        assert!(!PAUSED.accepts_chunks());
        assert!(ACTIVE.accepts_chunks());
    }

    #[test]
    fn test_display() {
        assert_eq!(ACTIVE.to_string(), "Streaming(active)");
        assert_eq!(PAUSED.to_string(), "Streaming(paused)");
        assert_eq!(DiscoveringService.to_string(), "DiscoveringService");
    }

    #[test]
    fn test_transition_serializes() {
        let transition = StateTransition::new(Subscribing, ACTIVE);
        let json = serde_json::to_string(&transition).unwrap();
        assert!(json.contains("\"subscribing\""));

        let back: StateTransition = serde_json::from_str(&json).unwrap();
        assert_eq!(back, transition);
    }
}
