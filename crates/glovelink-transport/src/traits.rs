//! Transport trait for glove peripherals.
//!
//! The trait mirrors the steps a host goes through to get a notification
//! stream out of a serial-over-BLE bridge: pick a device, open a link, find
//! the service, find the characteristic, subscribe. Each step is a separate
//! method so the session can drive its state machine between them, retry a
//! step with a different UUID form, and abandon the sequence at any await
//! point.
//!
//! All methods are native `async fn` (Edition 2024 RPITIT).
//!
//! **NOTE**: This trait is NOT object-safe because `async fn` methods return
//! `impl Future`. Use generics, or the enum wrapper in [`crate::devices`].
//!
//! # Examples
//!
//! ```no_run
//! use glovelink_transport::{BleUuid, Transport, Result};
//!
//! async fn first_chunk<T: Transport>(transport: &mut T) -> Result<Vec<u8>> {
//!     let device = transport.scan().await?;
//!     let link = transport.connect(&device).await?;
//!     let service = transport
//!         .discover_service(&link, BleUuid::Alias(0xFFE0))
//!         .await?;
//!     let characteristic = transport
//!         .discover_characteristic(&service, BleUuid::Alias(0xFFE1))
//!         .await?;
//!     let mut chunks = transport.subscribe(&characteristic).await?;
//!     Ok(chunks.recv().await.map(|b| b.to_vec()).unwrap_or_default())
//! }
//! ```

#![allow(async_fn_in_trait)]

use crate::error::Result;
use crate::types::{
    BleUuid, CharacteristicHandle, ChunkStream, DeviceHandle, LinkHandle, ServiceHandle,
};

/// A byte transport to a single glove peripheral.
///
/// Implementations must tolerate their futures being dropped mid-step: the
/// session cancels pending steps by dropping them and then calls
/// [`disconnect`](Transport::disconnect) to release whatever was acquired.
pub trait Transport: Send {
    /// Human-readable transport name for logs.
    fn name(&self) -> &str;

    /// Let the user pick a device.
    ///
    /// # Errors
    ///
    /// Returns `UserCancelled` if no device was chosen.
    async fn scan(&mut self) -> Result<DeviceHandle>;

    /// Open a link to a device.
    async fn connect(&mut self, device: &DeviceHandle) -> Result<LinkHandle>;

    /// Look up a primary service by UUID.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the device does not expose the service in the
    /// requested form.
    async fn discover_service(&mut self, link: &LinkHandle, uuid: BleUuid)
    -> Result<ServiceHandle>;

    /// Look up a characteristic within a service.
    async fn discover_characteristic(
        &mut self,
        service: &ServiceHandle,
        uuid: BleUuid,
    ) -> Result<CharacteristicHandle>;

    /// Start notifications on a characteristic.
    ///
    /// The returned stream ends when the link drops.
    async fn subscribe(&mut self, characteristic: &CharacteristicHandle) -> Result<ChunkStream>;

    /// Close a link and release its subscription.
    ///
    /// Disconnecting a link that is already gone is not an error.
    async fn disconnect(&mut self, link: &LinkHandle) -> Result<()>;
}
