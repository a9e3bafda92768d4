//! Mock glove transport for testing and development.
//!
//! [`MockTransport`] plays the part of a serial-over-BLE bridge. Everything a
//! real peripheral might do to a session (be absent, expose only one UUID
//! form, refuse permission, stall a discovery step, stream fragmented
//! notifications, vanish mid-stream) can be scripted through the paired
//! [`MockTransportHandle`].

use crate::{
    Result, TransportError,
    traits::Transport,
    types::{BleUuid, CharacteristicHandle, ChunkStream, DeviceHandle, LinkHandle, ServiceHandle},
};
use bytes::Bytes;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::{Notify, mpsc};
use tracing::debug;

/// Notification channel depth, in chunks.
const CHUNK_CHANNEL_CAPACITY: usize = 64;

/// A step of the connection sequence, for scripting failures and stalls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MockStep {
    Scan,
    Connect,
    DiscoverService,
    DiscoverCharacteristic,
    Subscribe,
}

/// A call observed by the mock, in the order it was made.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockCall {
    Scan,
    Connect(String),
    DiscoverService(BleUuid),
    DiscoverCharacteristic(BleUuid),
    Subscribe(BleUuid),
    Disconnect(u64),
}

#[derive(Debug)]
struct MockState {
    device: Option<DeviceHandle>,
    services: Vec<BleUuid>,
    characteristics: Vec<BleUuid>,
    failures: HashMap<MockStep, TransportError>,
    held: HashSet<MockStep>,
    calls: Vec<MockCall>,
    next_link_id: u64,
    link: Option<u64>,
    chunk_tx: Option<mpsc::Sender<Bytes>>,
}

#[derive(Debug)]
struct Shared {
    state: Mutex<MockState>,
    release: Notify,
}

impl Shared {
    fn state(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Mock transport for testing and development.
///
/// By default the mock offers one device which exposes the serial bridge
/// service and characteristic under both their alias and full UUID forms.
///
/// # Examples
///
/// ```
/// use glovelink_transport::mock::MockTransport;
/// use glovelink_transport::{BleUuid, Transport};
///
/// #[tokio::main]
/// async fn main() -> glovelink_transport::Result<()> {
///     let (mut transport, handle) = MockTransport::new();
///
///     let device = transport.scan().await?;
///     let link = transport.connect(&device).await?;
///     let service = transport.discover_service(&link, BleUuid::Alias(0xFFE0)).await?;
///     let characteristic = transport
///         .discover_characteristic(&service, BleUuid::Alias(0xFFE1))
///         .await?;
///     let mut chunks = transport.subscribe(&characteristic).await?;
///
///     handle.send_chunk("10,20,30,40,50\n").await?;
///     assert_eq!(&chunks.recv().await.unwrap()[..], b"10,20,30,40,50\n");
///
///     Ok(())
/// }
/// ```
#[derive(Debug)]
pub struct MockTransport {
    name: String,
    shared: Arc<Shared>,
}

impl MockTransport {
    /// Create a new mock transport with the default device.
    ///
    /// Returns a tuple of (MockTransport, MockTransportHandle) where the
    /// handle scripts the device's behaviour.
    pub fn new() -> (Self, MockTransportHandle) {
        Self::with_device(DeviceHandle::new("MOCK-0001", "GloveLink Mock"))
    }

    /// Create a new mock transport offering the given device.
    pub fn with_device(device: DeviceHandle) -> (Self, MockTransportHandle) {
        let shared = Arc::new(Shared {
            state: Mutex::new(MockState {
                device: Some(device),
                services: BleUuid::serial_service(),
                characteristics: BleUuid::serial_characteristic(),
                failures: HashMap::new(),
                held: HashSet::new(),
                calls: Vec::new(),
                next_link_id: 1,
                link: None,
                chunk_tx: None,
            }),
            release: Notify::new(),
        });

        let transport = Self {
            name: "Mock Transport".to_string(),
            shared: Arc::clone(&shared),
        };

        (transport, MockTransportHandle { shared })
    }

    /// Record the call, wait while the step is held, then apply any scripted
    /// failure.
    async fn enter(&self, step: MockStep, call: MockCall) -> Result<()> {
        self.shared.state().calls.push(call);

        loop {
            let released = self.shared.release.notified();
            if !self.shared.state().held.contains(&step) {
                break;
            }
            debug!(?step, "mock step held");
            released.await;
        }

        match self.shared.state().failures.get(&step) {
            Some(error) => Err(error.clone()),
            None => Ok(()),
        }
    }

    fn check_link(state: &MockState, link_id: u64) -> Result<()> {
        if state.link == Some(link_id) {
            Ok(())
        } else {
            Err(TransportError::disconnected(format!("link {link_id}")))
        }
    }
}

impl Default for MockTransport {
    fn default() -> Self {
        Self::new().0
    }
}

impl Transport for MockTransport {
    fn name(&self) -> &str {
        &self.name
    }

    async fn scan(&mut self) -> Result<DeviceHandle> {
        self.enter(MockStep::Scan, MockCall::Scan).await?;
        self.shared
            .state()
            .device
            .clone()
            .ok_or(TransportError::UserCancelled)
    }

    async fn connect(&mut self, device: &DeviceHandle) -> Result<LinkHandle> {
        self.enter(MockStep::Connect, MockCall::Connect(device.id.clone()))
            .await?;

        let mut state = self.shared.state();
        let id = state.next_link_id;
        state.next_link_id += 1;
        state.link = Some(id);

        Ok(LinkHandle {
            id,
            device: device.clone(),
        })
    }

    async fn discover_service(
        &mut self,
        link: &LinkHandle,
        uuid: BleUuid,
    ) -> Result<ServiceHandle> {
        self.enter(MockStep::DiscoverService, MockCall::DiscoverService(uuid))
            .await?;

        let state = self.shared.state();
        Self::check_link(&state, link.id)?;
        if !state.services.contains(&uuid) {
            return Err(TransportError::not_found(uuid));
        }

        Ok(ServiceHandle {
            link_id: link.id,
            uuid,
        })
    }

    async fn discover_characteristic(
        &mut self,
        service: &ServiceHandle,
        uuid: BleUuid,
    ) -> Result<CharacteristicHandle> {
        self.enter(
            MockStep::DiscoverCharacteristic,
            MockCall::DiscoverCharacteristic(uuid),
        )
        .await?;

        let state = self.shared.state();
        Self::check_link(&state, service.link_id)?;
        if !state.characteristics.contains(&uuid) {
            return Err(TransportError::not_found(uuid));
        }

        Ok(CharacteristicHandle {
            link_id: service.link_id,
            service: service.uuid,
            uuid,
        })
    }

    async fn subscribe(&mut self, characteristic: &CharacteristicHandle) -> Result<ChunkStream> {
        self.enter(MockStep::Subscribe, MockCall::Subscribe(characteristic.uuid))
            .await?;

        let mut state = self.shared.state();
        Self::check_link(&state, characteristic.link_id)?;

        let (tx, rx) = mpsc::channel(CHUNK_CHANNEL_CAPACITY);
        state.chunk_tx = Some(tx);
        Ok(rx)
    }

    async fn disconnect(&mut self, link: &LinkHandle) -> Result<()> {
        let mut state = self.shared.state();
        state.calls.push(MockCall::Disconnect(link.id));

        if state.link == Some(link.id) {
            state.link = None;
            state.chunk_tx = None;
        }
        Ok(())
    }
}

/// Handle for scripting a mock transport.
///
/// Cloneable, so a test can keep one copy and move another into a task that
/// plays the device side.
#[derive(Debug, Clone)]
pub struct MockTransportHandle {
    shared: Arc<Shared>,
}

impl MockTransportHandle {
    /// Set the device returned by the next scan. `None` makes the scan end
    /// as if the user dismissed the picker.
    pub fn set_device(&self, device: Option<DeviceHandle>) {
        self.shared.state().device = device;
    }

    /// Set the service UUID forms the device answers to.
    pub fn set_services(&self, services: Vec<BleUuid>) {
        self.shared.state().services = services;
    }

    /// Set the characteristic UUID forms the device answers to.
    pub fn set_characteristics(&self, characteristics: Vec<BleUuid>) {
        self.shared.state().characteristics = characteristics;
    }

    /// Make a step fail with the given error until cleared.
    pub fn fail_at(&self, step: MockStep, error: TransportError) {
        self.shared.state().failures.insert(step, error);
    }

    /// Remove a scripted failure.
    pub fn clear_failure(&self, step: MockStep) {
        self.shared.state().failures.remove(&step);
    }

    /// Stall a step: calls to it stay pending until [`release`](Self::release).
    pub fn hold(&self, step: MockStep) {
        self.shared.state().held.insert(step);
    }

    /// Let a held step proceed.
    pub fn release(&self, step: MockStep) {
        self.shared.state().held.remove(&step);
        self.shared.release.notify_waiters();
    }

    /// Deliver a notification payload to the subscriber.
    ///
    /// # Errors
    ///
    /// Returns `Disconnected` if nothing is subscribed or the subscriber has
    /// gone away.
    pub async fn send_chunk(&self, chunk: impl Into<Bytes>) -> Result<()> {
        let tx = self
            .shared
            .state()
            .chunk_tx
            .clone()
            .ok_or_else(|| TransportError::disconnected("no active subscription"))?;

        tx.send(chunk.into())
            .await
            .map_err(|_| TransportError::disconnected("subscriber dropped"))
    }

    /// Drop the link from the device side. The subscriber's stream ends once
    /// buffered chunks are drained.
    pub fn drop_link(&self) {
        let mut state = self.shared.state();
        state.link = None;
        state.chunk_tx = None;
    }

    /// Calls made so far.
    pub fn calls(&self) -> Vec<MockCall> {
        self.shared.state().calls.clone()
    }

    /// Whether a link is currently open.
    pub fn is_connected(&self) -> bool {
        self.shared.state().link.is_some()
    }

    /// Whether a notification subscription is active.
    pub fn is_subscribed(&self) -> bool {
        self.shared.state().chunk_tx.is_some()
    }
}
