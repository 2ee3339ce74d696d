//! Peripheral role engine.
//!
//! Advertises, accepts one link, and releases the [`Producer`] on the
//! first parameter update of that link.  After a disconnect any release
//! not yet picked up is dropped, the producer finds the link gone on its
//! next check, and advertising is restarted.
//!
//! [`Producer`]: crate::ble::producer::Producer

use crate::ble::advertiser::Advertiser;
use crate::ble::conn::{ConnectOutcome, ConnectionManager, DisconnectOutcome};
use crate::ble::host::PeripheralHost;
use crate::ble::{interval_to_ms, ConnHandle, Event, PeerAddress, Role, SecurityLevel};
use crate::config;
use crate::error::Error;
use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_sync::channel::Receiver;

pub struct Peripheral<'a, H: PeripheralHost, M: RawMutex> {
    host: H,
    link: &'a ConnectionManager<M>,
    advertiser: Advertiser,
}

impl<'a, H: PeripheralHost, M: RawMutex> Peripheral<'a, H, M> {
    /// Peripheral advertising as [`config::DEVICE_NAME`]. `link` is shared
    /// with the producer task.
    pub fn new(host: H, link: &'a ConnectionManager<M>) -> Self {
        Self::with_name(host, link, config::DEVICE_NAME)
    }

    pub fn with_name(host: H, link: &'a ConnectionManager<M>, name: &'static str) -> Self {
        Self {
            host,
            link,
            advertiser: Advertiser::new(name),
        }
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    pub fn link(&self) -> &ConnectionManager<M> {
        self.link
    }

    /// Enable the stack and start advertising.
    pub fn start(&mut self) -> Result<(), Error> {
        self.host.enable().map_err(|e| {
            error!("Bluetooth init failed: {:?}", e);
            e
        })?;
        info!("Bluetooth initialized");
        self.advertiser.start(&mut self.host)
    }

    /// Consume events forever.
    pub async fn run<R: RawMutex, const N: usize>(&mut self, events: Receiver<'_, R, Event, N>) -> ! {
        loop {
            let event = events.receive().await;
            self.handle(&event);
        }
    }

    /// Apply one host event. Central-only events are ignored.
    pub fn handle(&mut self, event: &Event) {
        match event {
            Event::Connected { conn, peer, status } => self.on_connected(*conn, *peer, *status),
            Event::Disconnected { conn, reason } => self.on_disconnected(*conn, *reason),
            Event::ParamUpdated {
                conn,
                interval,
                latency,
                timeout,
            } => self.on_param_updated(*conn, *interval, *latency, *timeout),
            Event::SecurityChanged {
                conn,
                level,
                status,
            } => self.on_security_changed(*conn, *level, *status),
            Event::PairingCancelled { peer, .. } => warn!("Pairing cancelled: {:?}", peer),
            Event::Advertisement(_) | Event::Discovered { .. } | Event::Notification { .. } => {}
        }
    }

    fn on_connected(&mut self, conn: ConnHandle, peer: PeerAddress, status: u8) {
        match self.link.on_connected(conn, peer, Role::Peripheral, status) {
            ConnectOutcome::Failed { status } => warn!("Connection failed (err {})", status),
            ConnectOutcome::Established(_) => info!("Connected: {:?}", peer),
            ConnectOutcome::Rejected => {
                warn!("Already connected, dropping {:?}", conn);
                self.host.release(conn);
            }
        }
    }

    fn on_disconnected(&mut self, conn: ConnHandle, reason: u8) {
        info!("Disconnected: {:?} (reason {})", conn, reason);
        match self.link.on_disconnected(conn) {
            DisconnectOutcome::Released(conn) => {
                self.host.release(conn);
                // Failure is logged by the advertiser; the link is idle
                // either way.
                let _ = self.advertiser.start(&mut self.host);
            }
            DisconnectOutcome::Stale => debug!("Stale disconnect for {:?}", conn),
        }
    }

    fn on_param_updated(&mut self, conn: ConnHandle, interval: u16, latency: u16, timeout: u16) {
        if self
            .link
            .on_param_updated(conn, interval, latency, timeout)
            .is_none()
        {
            return;
        }
        info!("New conn interval: {} ms", interval_to_ms(interval));
        self.link.release_producer(conn);
    }

    fn on_security_changed(&mut self, conn: ConnHandle, level: SecurityLevel, status: u8) {
        if status != 0 {
            warn!("Security failed: level {:?} err {}", level, status);
        } else if self.link.on_security_changed(conn, level) {
            info!("Security changed: level {:?}", level);
        }
    }
}
