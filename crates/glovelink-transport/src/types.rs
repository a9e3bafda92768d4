//! Handle and identifier types shared by transport implementations.
//!
//! Handles are plain values returned by one discovery step and passed to the
//! next. They carry the identifiers a driver needs to find its own state and
//! nothing else, so they can be cloned and logged freely.

use bytes::Bytes;
use glovelink_core::constants::{
    BLUETOOTH_BASE_UUID, SERIAL_CHARACTERISTIC_ALIAS, SERIAL_SERVICE_ALIAS,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use tokio::sync::mpsc;
use uuid::Uuid;

/// Stream of raw notification payloads from a subscribed characteristic.
///
/// The stream ends (`recv()` returns `None`) when the transport drops the
/// link.
pub type ChunkStream = mpsc::Receiver<Bytes>;

/// A service or characteristic identifier.
///
/// Peripherals advertise the same attribute either by its 16-bit alias or by
/// the full 128-bit UUID derived from the Bluetooth base UUID, and some
/// platform stacks only accept one of the two forms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum BleUuid {
    /// 16-bit assigned alias such as `0xFFE0`.
    Alias(u16),

    /// Full 128-bit UUID.
    Full(Uuid),
}

impl BleUuid {
    /// Expand a 16-bit alias into its canonical 128-bit form.
    ///
    /// # Examples
    ///
    /// ```
    /// use glovelink_transport::BleUuid;
    ///
    /// let full = BleUuid::expand(0xFFE0);
    /// assert_eq!(full.to_string(), "0000ffe0-0000-1000-8000-00805f9b34fb");
    /// ```
    pub const fn expand(alias: u16) -> Uuid {
        Uuid::from_u128(BLUETOOTH_BASE_UUID | ((alias as u128) << 96))
    }

    /// The 128-bit UUID this identifier refers to.
    pub fn to_uuid(self) -> Uuid {
        match self {
            Self::Alias(alias) => Self::expand(alias),
            Self::Full(uuid) => uuid,
        }
    }

    /// Whether two identifiers name the same attribute, whatever their form.
    pub fn same_attribute(self, other: BleUuid) -> bool {
        self.to_uuid() == other.to_uuid()
    }

    /// Ordered candidate list for an alias: the alias first, then its full
    /// canonical form.
    pub fn candidates(alias: u16) -> Vec<BleUuid> {
        vec![Self::Alias(alias), Self::Full(Self::expand(alias))]
    }

    /// Default candidates for the serial-over-BLE bridge service.
    pub fn serial_service() -> Vec<BleUuid> {
        Self::candidates(SERIAL_SERVICE_ALIAS)
    }

    /// Default candidates for the serial-over-BLE bridge characteristic.
    pub fn serial_characteristic() -> Vec<BleUuid> {
        Self::candidates(SERIAL_CHARACTERISTIC_ALIAS)
    }
}

impl fmt::Display for BleUuid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Alias(alias) => write!(f, "0x{alias:04x}"),
            Self::Full(uuid) => write!(f, "{}", uuid.hyphenated()),
        }
    }
}

impl From<u16> for BleUuid {
    fn from(alias: u16) -> Self {
        Self::Alias(alias)
    }
}

impl From<Uuid> for BleUuid {
    fn from(uuid: Uuid) -> Self {
        Self::Full(uuid)
    }
}

/// A peripheral selected during scanning.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceHandle {
    /// Platform identifier of the device.
    pub id: String,

    /// Advertised name.
    pub name: String,
}

impl DeviceHandle {
    /// Create a new device handle.
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

impl fmt::Display for DeviceHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.id)
    }
}

/// An open connection to a peripheral.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkHandle {
    /// Connection identifier, unique per transport instance.
    pub id: u64,

    /// The device this link belongs to.
    pub device: DeviceHandle,
}

/// A discovered primary service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceHandle {
    pub link_id: u64,
    pub uuid: BleUuid,
}

/// A discovered characteristic within a service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CharacteristicHandle {
    pub link_id: u64,
    pub service: BleUuid,
    pub uuid: BleUuid,
}
