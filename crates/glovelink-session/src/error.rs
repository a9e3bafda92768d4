//! Session error types.
//!
//! Every connection failure ends the session in `Disconnected` and is
//! returned to the caller as one of these. [`SessionError::user_message`]
//! gives the text a host shows to the person holding the glove.

use glovelink_transport::{BleUuid, TransportError};

use crate::report::ReportError;

/// Result type alias for session operations.
pub type Result<T> = std::result::Result<T, SessionError>;

/// Errors returned by [`ConnectionSession`](crate::ConnectionSession).
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("Device selection cancelled")]
    UserCancelled,

    #[error("Transport unavailable: {0}")]
    TransportUnavailable(String),

    #[error("Service not found (tried {})", join_uuids(.tried))]
    ServiceNotFound { tried: Vec<BleUuid> },

    #[error("Characteristic not found (tried {})", join_uuids(.tried))]
    CharacteristicNotFound { tried: Vec<BleUuid> },

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    /// A disconnect request interrupted a pending connect.
    #[error("Connection cancelled by disconnect request")]
    Cancelled,

    /// Another data source is already active on this session.
    #[error("A data source is already active")]
    SourceBusy,

    #[error("Session is not streaming")]
    NotStreaming,

    #[error("Not enough samples: have {have}, need {need}")]
    InsufficientSamples { have: usize, need: usize },

    #[error("Invalid session state: {0}")]
    InvalidState(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Report(#[from] ReportError),
}

impl SessionError {
    /// Text suitable for showing to the end user.
    pub fn user_message(&self) -> String {
        match self {
            Self::UserCancelled => "No glove was selected.".to_string(),
            Self::TransportUnavailable(_) => {
                "Could not reach the glove. Check that Bluetooth is on and the glove is charged."
                    .to_string()
            }
            Self::ServiceNotFound { .. } | Self::CharacteristicNotFound { .. } => {
                "The selected device does not look like a GloveLink glove.".to_string()
            }
            Self::PermissionDenied(_) => {
                "Bluetooth access was denied. Allow access and try again.".to_string()
            }
            Self::Cancelled => "Connection cancelled.".to_string(),
            Self::SourceBusy => "Disconnect or stop the simulation first.".to_string(),
            Self::NotStreaming => "The glove is not streaming.".to_string(),
            Self::InsufficientSamples { have, need } => {
                format!("Collect at least {need} readings before generating a report ({have} so far).")
            }
            Self::InvalidState(_) | Self::Config(_) | Self::Report(_) => self.to_string(),
        }
    }
}

impl From<TransportError> for SessionError {
    fn from(error: TransportError) -> Self {
        match error {
            TransportError::UserCancelled => Self::UserCancelled,
            TransportError::Unavailable { message } => Self::TransportUnavailable(message),
            TransportError::NotFound { uuid } => {
                Self::TransportUnavailable(format!("{uuid} not found"))
            }
            TransportError::PermissionDenied { message } => Self::PermissionDenied(message),
            TransportError::Disconnected { device } => {
                Self::TransportUnavailable(format!("{device} disconnected"))
            }
        }
    }
}

impl From<glovelink_core::Error> for SessionError {
    fn from(error: glovelink_core::Error) -> Self {
        match &error {
            glovelink_core::Error::InvalidStateTransition { .. } => {
                Self::InvalidState(error.to_string())
            }
            _ => Self::Config(error.to_string()),
        }
    }
}

fn join_uuids(uuids: &[BleUuid]) -> String {
    uuids
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(TransportError::UserCancelled, "Device selection cancelled")]
    #[case(TransportError::unavailable("adapter off"), "Transport unavailable: adapter off")]
    #[case(TransportError::permission_denied("blocked"), "Permission denied: blocked")]
    #[case(
        TransportError::disconnected("GloveLink-01"),
        "Transport unavailable: GloveLink-01 disconnected"
    )]
    fn test_from_transport_error(#[case] error: TransportError, #[case] expected: &str) {
        assert_eq!(SessionError::from(error).to_string(), expected);
    }

    #[test]
    fn test_not_found_lists_candidates() {
        let error = SessionError::ServiceNotFound {
            tried: BleUuid::serial_service(),
        };

        assert_eq!(
            error.to_string(),
            "Service not found (tried 0xffe0, 0000ffe0-0000-1000-8000-00805f9b34fb)"
        );
    }

    #[test]
    fn test_user_messages_are_not_empty() {
        let errors = [
            SessionError::UserCancelled,
            SessionError::Cancelled,
            SessionError::SourceBusy,
            SessionError::InsufficientSamples { have: 2, need: 5 },
            SessionError::CharacteristicNotFound { tried: vec![] },
        ];

        for error in errors {
            assert!(!error.user_message().is_empty());
        }
    }

    #[test]
    fn test_from_core_error() {
        let error = SessionError::from(glovelink_core::Error::InvalidStateTransition {
            from: "Disconnected".into(),
            to: "Subscribing".into(),
        });
        assert!(matches!(error, SessionError::InvalidState(_)));

        let error = SessionError::from(glovelink_core::Error::Config("bad".into()));
        assert!(matches!(error, SessionError::Config(_)));
    }
}
