use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    // Wire errors
    #[error("Malformed frame '{frame}': {reason}")]
    MalformedFrame { frame: String, reason: String },

    #[error("Reassembly buffer overflow: {len} characters without a frame boundary (limit {limit})")]
    BufferOverflow { len: usize, limit: usize },

    // Sample errors
    #[error("Channel value {value} out of range {min}-{max}")]
    ChannelOutOfRange { value: i32, min: i32, max: i32 },

    #[error("Invalid channel: {0}")]
    InvalidChannel(String),

    #[error("Invalid capacity: {0}")]
    InvalidCapacity(String),

    // Session errors
    #[error("Invalid state transition from {from} to {to}")]
    InvalidStateTransition { from: String, to: String },

    // IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),
}

impl Error {
    /// Create a malformed frame error.
    pub fn malformed(frame: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::MalformedFrame {
            frame: frame.into(),
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_malformed_display() {
        let error = Error::malformed("a,1", "expected 5 fields, got 2");
        assert_eq!(
            error.to_string(),
            "Malformed frame 'a,1': expected 5 fields, got 2"
        );
    }

    #[test]
    fn test_overflow_display() {
        let error = Error::BufferOverflow { len: 51, limit: 50 };
        assert!(error.to_string().contains("51 characters"));
        assert!(error.to_string().contains("limit 50"));
    }
}
