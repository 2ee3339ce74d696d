//! Interfaces the role engines consume from the BLE host stack.
//!
//! Every request is submitted synchronously and either rejected on the spot
//! (`Err`) or answered later through an [`Event`](super::Event) on the
//! role's queue.  Implementations wrap a real stack on target and a
//! recording mock in tests.

use super::adv::AdStructure;
use super::discovery::DiscoveryPhase;
use super::uuid::Uuid;
use super::{ConnHandle, PeerAddress, SecurityLevel};
use crate::config;
use crate::error::HostError;

/// Active/passive scan configuration.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ScanParams {
    /// Request scan responses from advertisers.
    pub active: bool,
    /// Report every advertisement, even repeats from the same device.
    pub report_duplicates: bool,
    /// 0.625 ms units.
    pub interval: u16,
    /// 0.625 ms units.
    pub window: u16,
}

impl ScanParams {
    /// Active scanning with the fast GAP window and duplicate filtering
    /// off, so peripherals that change their advertising data mid-scan are
    /// still reported.
    pub const fn active_fast() -> Self {
        Self {
            active: true,
            report_duplicates: true,
            interval: config::SCAN_FAST_INTERVAL,
            window: config::SCAN_FAST_WINDOW,
        }
    }
}

/// Connection parameters requested when initiating a link.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ConnParams {
    pub interval_min: u16,
    pub interval_max: u16,
    pub latency: u16,
    pub timeout: u16,
}

impl Default for ConnParams {
    fn default() -> Self {
        Self {
            interval_min: config::CONN_INTERVAL_MIN,
            interval_max: config::CONN_INTERVAL_MAX,
            latency: config::CONN_LATENCY,
            timeout: config::CONN_SUP_TIMEOUT,
        }
    }
}

/// One GATT discovery request.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DiscoverParams {
    pub uuid: Uuid,
    pub start_handle: u16,
    pub end_handle: u16,
    pub phase: DiscoveryPhase,
}

/// CCC descriptor value written by a subscribe request.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CccValue {
    Notify,
    Indicate,
}

impl CccValue {
    /// Raw descriptor bits.
    pub const fn bits(self) -> u16 {
        match self {
            CccValue::Notify => 0x0001,
            CccValue::Indicate => 0x0002,
        }
    }
}

/// Enable notifications/indications on a discovered characteristic.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SubscribeParams {
    pub value_handle: u16,
    pub ccc_handle: u16,
    pub value: CccValue,
}

/// Advertising mode.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AdvMode {
    ConnectableUndirected,
    NonConnectable,
}

/// Operations common to both roles.
pub trait BleStack {
    /// Bring the stack up. Called once before anything else.
    fn enable(&mut self) -> Result<(), HostError>;

    /// Drop our reference to a link.
    fn release(&mut self, conn: ConnHandle);
}

/// Requests issued by the central role.
pub trait CentralHost: BleStack {
    fn start_scan(&mut self, params: &ScanParams) -> Result<(), HostError>;

    fn stop_scan(&mut self) -> Result<(), HostError>;

    /// Initiate a link; the outcome arrives as `Event::Connected`.
    fn connect(
        &mut self,
        peer: &PeerAddress,
        params: &ConnParams,
    ) -> Result<ConnHandle, HostError>;

    fn set_security(&mut self, conn: ConnHandle, level: SecurityLevel) -> Result<(), HostError>;

    /// Results arrive as `Event::Discovered`.  The first result the engine
    /// accepts ends the request: the host must stop iterating it, since the
    /// engine issues the next phase's request right away.  If nothing
    /// matches, the request ends with a result carrying no attribute.
    fn discover(&mut self, conn: ConnHandle, params: &DiscoverParams) -> Result<(), HostError>;

    /// Values arrive as `Event::Notification`.
    fn subscribe(&mut self, conn: ConnHandle, params: &SubscribeParams) -> Result<(), HostError>;
}

/// Requests issued by the peripheral role.
pub trait PeripheralHost: BleStack {
    fn advertise_start(&mut self, mode: AdvMode, data: &[AdStructure<'_>]) -> Result<(), HostError>;
}

/// Outbound notifications, used from the producer task.
///
/// `notify` may wait for transmit buffers; that back-pressure is what paces
/// the producer to the link's connection events.
#[allow(async_fn_in_trait)]
pub trait NotifySink {
    /// Notify the value of the local characteristic `characteristic`.
    async fn notify(
        &mut self,
        conn: ConnHandle,
        characteristic: Uuid,
        payload: &[u8],
    ) -> Result<(), HostError>;
}
