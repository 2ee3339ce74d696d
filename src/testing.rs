//! Recording host stack for unit tests.

use crate::ble::adv::{self, AdStructure};
use crate::ble::host::{
    AdvMode, BleStack, CentralHost, ConnParams, DiscoverParams, NotifySink, PeripheralHost,
    ScanParams, SubscribeParams,
};
use crate::ble::uuid::Uuid;
use crate::ble::{ConnHandle, PeerAddress, SecurityLevel};
use crate::config::ADV_DATA_CAPACITY;
use crate::error::HostError;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Call {
    Enable,
    Release(ConnHandle),
    StartScan(ScanParams),
    StopScan,
    Connect(PeerAddress, ConnParams),
    SetSecurity(ConnHandle, SecurityLevel),
    Discover(ConnHandle, DiscoverParams),
    Subscribe(ConnHandle, SubscribeParams),
    Advertise(AdvMode, heapless::Vec<u8, ADV_DATA_CAPACITY>),
}

#[derive(Default)]
pub struct MockHost {
    pub calls: Vec<Call>,
    pub fail_enable: Option<HostError>,
    pub fail_scan: Option<HostError>,
    pub fail_connect: Option<HostError>,
    pub fail_security: Option<HostError>,
    pub fail_discover: Option<HostError>,
    pub fail_subscribe: Option<HostError>,
    pub fail_advertise: Option<HostError>,
    handles: u16,
}

impl MockHost {
    pub fn new() -> Self {
        Self::default()
    }

    fn outcome(&mut self, call: Call, fail: Option<HostError>) -> Result<(), HostError> {
        self.calls.push(call);
        fail.map_or(Ok(()), Err)
    }
}

impl BleStack for MockHost {
    fn enable(&mut self) -> Result<(), HostError> {
        self.outcome(Call::Enable, self.fail_enable)
    }

    fn release(&mut self, conn: ConnHandle) {
        self.calls.push(Call::Release(conn));
    }
}

impl CentralHost for MockHost {
    fn start_scan(&mut self, params: &ScanParams) -> Result<(), HostError> {
        self.outcome(Call::StartScan(*params), self.fail_scan)
    }

    fn stop_scan(&mut self) -> Result<(), HostError> {
        self.outcome(Call::StopScan, None)
    }

    fn connect(
        &mut self,
        peer: &PeerAddress,
        params: &ConnParams,
    ) -> Result<ConnHandle, HostError> {
        self.outcome(Call::Connect(*peer, *params), self.fail_connect)?;
        self.handles += 1;
        Ok(ConnHandle(self.handles))
    }

    fn set_security(&mut self, conn: ConnHandle, level: SecurityLevel) -> Result<(), HostError> {
        self.outcome(Call::SetSecurity(conn, level), self.fail_security)
    }

    fn discover(&mut self, conn: ConnHandle, params: &DiscoverParams) -> Result<(), HostError> {
        self.outcome(Call::Discover(conn, *params), self.fail_discover)
    }

    fn subscribe(&mut self, conn: ConnHandle, params: &SubscribeParams) -> Result<(), HostError> {
        self.outcome(Call::Subscribe(conn, *params), self.fail_subscribe)
    }
}

impl PeripheralHost for MockHost {
    fn advertise_start(&mut self, mode: AdvMode, data: &[AdStructure<'_>]) -> Result<(), HostError> {
        let encoded = adv::encode(data)?;
        self.outcome(Call::Advertise(mode, encoded), self.fail_advertise)
    }
}

/// Notification sink that accepts `budget` sends, then fails.
pub struct MockSink {
    pub sent: Vec<(ConnHandle, Uuid, Vec<u8>)>,
    pub budget: usize,
    pub error: HostError,
}

impl MockSink {
    pub fn new(budget: usize) -> Self {
        Self {
            sent: Vec::new(),
            budget,
            error: HostError::NotEnabled,
        }
    }
}

impl NotifySink for MockSink {
    async fn notify(
        &mut self,
        conn: ConnHandle,
        characteristic: Uuid,
        payload: &[u8],
    ) -> Result<(), HostError> {
        if self.sent.len() >= self.budget {
            return Err(self.error);
        }
        self.sent.push((conn, characteristic, payload.to_vec()));
        Ok(())
    }
}
