//! Scriptable in-memory glove for tests and the CLI.
//!
//! [`MockTransport`] plays the peripheral side; the paired
//! [`MockTransportHandle`] decides what the device advertises, where the
//! connection fails, and which chunks it notifies.

pub mod transport;

pub use transport::{MockCall, MockStep, MockTransport, MockTransportHandle};
