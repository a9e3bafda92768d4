//! Transport abstraction for glove peripherals.
//!
//! This crate defines the [`Transport`] trait the ingestion session drives
//! to reach a glove: scan, connect, discover the serial bridge service and
//! characteristic, subscribe to notifications, disconnect. A scriptable
//! [`MockTransport`](mock::MockTransport) stands in for real hardware in
//! development and tests.
//!
//! # Design
//!
//! - **Async-first**: every I/O step is a native `async fn` in the trait
//!   (Rust 1.90 + Edition 2024 RPITIT).
//! - **Step-wise**: discovery is split into separate calls so the caller can
//!   retry a step with an alternate UUID form and cancel between steps.
//! - **Plain handles**: each step returns a small cloneable handle that the
//!   next step consumes.
//!
//! # UUID candidates
//!
//! The serial bridge profile is addressed by 16-bit aliases (`0xFFE0` for
//! the service, `0xFFE1` for the characteristic). [`BleUuid::candidates`]
//! produces the alias followed by its full 128-bit form, which is the order
//! the session tries them in.
//!
//! # Error Handling
//!
//! All operations return [`Result<T>`][error::Result] with a
//! [`TransportError`].

pub mod devices;
pub mod error;
pub mod mock;
pub mod traits;
pub mod types;

// Re-export commonly used types for convenience
pub use devices::AnyTransport;
pub use error::{Result, TransportError};
pub use traits::Transport;
pub use types::{
    BleUuid, CharacteristicHandle, ChunkStream, DeviceHandle, LinkHandle, ServiceHandle,
};
