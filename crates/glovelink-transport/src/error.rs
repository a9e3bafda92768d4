//! Error types for transport operations.
//!
//! These cover the ways a wireless link can fail before or during
//! streaming: the user backing out of device selection, the radio being
//! off, a profile that does not expose the expected service, the platform
//! refusing access, and the link going away underneath us.

/// Result type alias for transport operations.
pub type Result<T> = std::result::Result<T, TransportError>;

/// Errors that can occur while talking to a peripheral.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    /// The user dismissed device selection or no device was chosen.
    #[error("Device selection cancelled")]
    UserCancelled,

    /// The transport could not be reached (adapter off, link refused).
    #[error("Transport unavailable: {message}")]
    Unavailable { message: String },

    /// The requested service or characteristic does not exist on the device.
    #[error("Not found: {uuid}")]
    NotFound { uuid: String },

    /// The platform refused access to the device.
    #[error("Permission denied: {message}")]
    PermissionDenied { message: String },

    /// The device went away or the link was closed.
    #[error("Device disconnected: {device}")]
    Disconnected { device: String },
}

impl TransportError {
    /// Create a new unavailable error.
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable {
            message: message.into(),
        }
    }

    /// Create a new not-found error for a UUID.
    pub fn not_found(uuid: impl ToString) -> Self {
        Self::NotFound {
            uuid: uuid.to_string(),
        }
    }

    /// Create a new permission denied error.
    pub fn permission_denied(message: impl Into<String>) -> Self {
        Self::PermissionDenied {
            message: message.into(),
        }
    }

    /// Create a new disconnected error.
    pub fn disconnected(device: impl Into<String>) -> Self {
        Self::Disconnected {
            device: device.into(),
        }
    }

    /// Whether the failure means "try the next UUID candidate".
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}
