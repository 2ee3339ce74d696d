//! Bluetooth Low Energy subsystem.
//!
//! The role engines sit on top of a host stack (SoftDevice, Zephyr host,
//! TrouBLE, ...) reached only through the traits in [`host`]:
//!
//! 1. **Scanner** - filters advertisement reports by complete local name
//!    and opens a connection to the first match (central).
//! 2. **Advertiser** - connectable undirected advertising with the device
//!    name, restarted after every disconnect (peripheral).
//! 3. **Connection Manager** - owns the single active link and the
//!    notification counter, and rejects stale lifecycle events.
//! 4. **Discovery Engine** - walks service → characteristic → CCC
//!    descriptor and produces the subscribe request (central).
//! 5. **Subscription** - checks the notified counter stream (central).
//! 6. **Producer** - parked task that streams counter notifications once
//!    released (peripheral).
//!
//! The host delivers everything it observes as an [`Event`]; each role
//! engine consumes them from an Embassy channel.

pub mod adv;
pub mod advertiser;
pub mod conn;
pub mod discovery;
pub mod host;
pub mod producer;
pub mod scanner;
pub mod subscription;
pub mod uuid;

use crate::config::{ADV_DATA_CAPACITY, NOTIFY_CAPACITY};
use discovery::DiscoveryPhase;
use heapless::Vec;
use uuid::Uuid;

/// Opaque handle to one link, as assigned by the host stack.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ConnHandle(pub u16);

/// BLE address type.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AddressKind {
    Public,
    Random,
}

/// BLE device address (little-endian, as on air).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PeerAddress {
    pub kind: AddressKind,
    pub bytes: [u8; 6],
}

impl PeerAddress {
    pub const fn new(kind: AddressKind, bytes: [u8; 6]) -> Self {
        Self { kind, bytes }
    }
}

/// Which end of the link we are.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Role {
    Central,
    Peripheral,
}

/// LE security mode 1 levels.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SecurityLevel {
    /// No encryption.
    L1,
    /// Encryption, unauthenticated pairing.
    L2,
    /// Encryption, authenticated pairing.
    L3,
    /// Authenticated LE Secure Connections.
    L4,
}

/// The one active link owned by the connection manager.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Connection {
    pub handle: ConnHandle,
    pub peer: PeerAddress,
    pub role: Role,
    /// Negotiated connection interval (1.25 ms units), once known.
    pub interval: Option<u16>,
    pub latency: u16,
    /// Supervision timeout (10 ms units).
    pub timeout: u16,
    pub security: SecurityLevel,
}

impl Connection {
    pub const fn new(handle: ConnHandle, peer: PeerAddress, role: Role) -> Self {
        Self {
            handle,
            peer,
            role,
            interval: None,
            latency: 0,
            timeout: 0,
            security: SecurityLevel::L1,
        }
    }

    /// Negotiated interval in whole milliseconds.
    pub fn interval_ms(&self) -> Option<u32> {
        self.interval.map(interval_to_ms)
    }
}

/// Convert a connection interval from 1.25 ms units to milliseconds.
pub const fn interval_to_ms(interval: u16) -> u32 {
    (interval as u32 * 5) / 4
}

/// Advertising PDU type of a scan report.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AdvType {
    /// Connectable undirected.
    AdvInd,
    /// Connectable directed.
    AdvDirectInd,
    /// Scannable undirected.
    AdvScanInd,
    /// Non-connectable undirected.
    AdvNonconnInd,
    /// Scan response.
    ScanRsp,
}

impl AdvType {
    /// Map the HCI report event type. Unknown values yield `None`.
    pub const fn from_raw(raw: u8) -> Option<Self> {
        match raw {
            0x00 => Some(AdvType::AdvInd),
            0x01 => Some(AdvType::AdvDirectInd),
            0x02 => Some(AdvType::AdvScanInd),
            0x03 => Some(AdvType::AdvNonconnInd),
            0x04 => Some(AdvType::ScanRsp),
            _ => None,
        }
    }

    pub const fn is_connectable(self) -> bool {
        matches!(self, AdvType::AdvInd | AdvType::AdvDirectInd)
    }
}

/// One advertisement report observed while scanning.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct AdvReport {
    pub peer: PeerAddress,
    /// Received Signal Strength Indicator (dBm).
    pub rssi: i8,
    pub kind: AdvType,
    pub data: Vec<u8, ADV_DATA_CAPACITY>,
}

/// An attribute reported by a discovery request.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DiscoveredAttribute {
    /// Handle of the attribute itself (service or characteristic
    /// declaration, or descriptor).
    pub handle: u16,
    pub uuid: Uuid,
    /// For characteristic declarations: handle carrying the value.
    pub value_handle: Option<u16>,
}

impl DiscoveredAttribute {
    pub const fn service(handle: u16, uuid: Uuid) -> Self {
        Self {
            handle,
            uuid,
            value_handle: None,
        }
    }

    pub const fn characteristic(handle: u16, value_handle: u16, uuid: Uuid) -> Self {
        Self {
            handle,
            uuid,
            value_handle: Some(value_handle),
        }
    }

    pub const fn descriptor(handle: u16, uuid: Uuid) -> Self {
        Self {
            handle,
            uuid,
            value_handle: None,
        }
    }
}

/// Everything the host stack reports back to a role engine.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Event {
    /// Scan result.
    Advertisement(AdvReport),
    /// Link established (`status == 0`) or connection attempt failed.
    Connected {
        conn: ConnHandle,
        peer: PeerAddress,
        status: u8,
    },
    /// Link closed.
    Disconnected { conn: ConnHandle, reason: u8 },
    /// Connection parameters updated.
    ParamUpdated {
        conn: ConnHandle,
        interval: u16,
        latency: u16,
        timeout: u16,
    },
    /// Security level changed (`status == 0`) or pairing failed.
    SecurityChanged {
        conn: ConnHandle,
        level: SecurityLevel,
        status: u8,
    },
    /// Pairing aborted by the peer or the stack.
    PairingCancelled { conn: ConnHandle, peer: PeerAddress },
    /// One discovery result for `phase`; `None` ends the stream.
    Discovered {
        conn: ConnHandle,
        phase: DiscoveryPhase,
        attribute: Option<DiscoveredAttribute>,
    },
    /// Notified value; an empty payload means the peer unsubscribed us.
    Notification {
        conn: ConnHandle,
        data: Vec<u8, NOTIFY_CAPACITY>,
    },
}
