//! Enum wrapper for transport dispatch.
//!
//! Native `async fn` in traits is not object-safe, so a host that picks its
//! transport at runtime cannot hold a `Box<dyn Transport>`. [`AnyTransport`]
//! gives it one concrete type to hold instead, dispatching by `match`.
//!
//! # Examples
//!
//! ```
//! use glovelink_transport::devices::AnyTransport;
//! use glovelink_transport::mock::MockTransport;
//! use glovelink_transport::Transport;
//!
//! let (transport, _handle) = MockTransport::new();
//! let any = AnyTransport::Mock(transport);
//! assert_eq!(any.name(), "Mock Transport");
//! ```

use crate::Result;
use crate::mock::MockTransport;
use crate::traits::Transport;
use crate::types::{
    BleUuid, CharacteristicHandle, ChunkStream, DeviceHandle, LinkHandle, ServiceHandle,
};

/// Enum wrapper for transport dispatch.
#[derive(Debug)]
#[non_exhaustive]
pub enum AnyTransport {
    /// Scriptable mock peripheral.
    Mock(MockTransport),
}

impl Transport for AnyTransport {
    fn name(&self) -> &str {
        match self {
            Self::Mock(transport) => transport.name(),
        }
    }

    async fn scan(&mut self) -> Result<DeviceHandle> {
        match self {
            Self::Mock(transport) => transport.scan().await,
        }
    }

    async fn connect(&mut self, device: &DeviceHandle) -> Result<LinkHandle> {
        match self {
            Self::Mock(transport) => transport.connect(device).await,
        }
    }

    async fn discover_service(
        &mut self,
        link: &LinkHandle,
        uuid: BleUuid,
    ) -> Result<ServiceHandle> {
        match self {
            Self::Mock(transport) => transport.discover_service(link, uuid).await,
        }
    }

    async fn discover_characteristic(
        &mut self,
        service: &ServiceHandle,
        uuid: BleUuid,
    ) -> Result<CharacteristicHandle> {
        match self {
            Self::Mock(transport) => transport.discover_characteristic(service, uuid).await,
        }
    }

    async fn subscribe(&mut self, characteristic: &CharacteristicHandle) -> Result<ChunkStream> {
        match self {
            Self::Mock(transport) => transport.subscribe(characteristic).await,
        }
    }

    async fn disconnect(&mut self, link: &LinkHandle) -> Result<()> {
        match self {
            Self::Mock(transport) => transport.disconnect(link).await,
        }
    }
}

impl From<MockTransport> for AnyTransport {
    fn from(transport: MockTransport) -> Self {
        Self::Mock(transport)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_any_transport_mock_dispatch() {
        let (transport, handle) = MockTransport::new();
        let mut any = AnyTransport::from(transport);

        let device = any.scan().await.unwrap();
        let link = any.connect(&device).await.unwrap();
        assert!(handle.is_connected());

        any.disconnect(&link).await.unwrap();
        assert!(!handle.is_connected());
    }
}
