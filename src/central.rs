//! Central role engine.
//!
//! Scanner → Connection Manager → Discovery → Subscription, and back to
//! scanning on disconnect.  Every host event goes through [`Central::handle`],
//! which never fails: problems are logged and the role-specific recovery
//! (re-scan, or abandon discovery and wait for the disconnect) is applied
//! in place.

use crate::ble::conn::{ConnectOutcome, ConnectionManager, DisconnectOutcome, LinkState};
use crate::ble::discovery::{DiscoveryCursor, DiscoveryPhase, DiscoveryStep};
use crate::ble::host::{CentralHost, DiscoverParams, SubscribeParams};
use crate::ble::scanner::{ScanOutcome, Scanner};
use crate::ble::subscription::{NotificationOutcome, Subscription, SubscriptionState};
use crate::ble::{
    interval_to_ms, AdvReport, ConnHandle, DiscoveredAttribute, Event, PeerAddress, Role,
    SecurityLevel,
};
use crate::config;
use crate::error::{Error, HostError, Request};
use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_sync::channel::Receiver;

pub struct Central<H: CentralHost, M: RawMutex> {
    host: H,
    link: ConnectionManager<M>,
    scanner: Scanner,
    discovery: Option<DiscoveryCursor>,
    subscription: Subscription,
    mismatches: u32,
    last_error: Option<Error>,
}

impl<H: CentralHost, M: RawMutex> Central<H, M> {
    /// Central looking for [`config::TARGET_NAME`].
    pub fn new(host: H) -> Self {
        Self::with_target(host, config::TARGET_NAME)
    }

    pub fn with_target(host: H, target: &'static str) -> Self {
        Self {
            host,
            link: ConnectionManager::new(),
            scanner: Scanner::new(target),
            discovery: None,
            subscription: Subscription::new(),
            mismatches: 0,
            last_error: None,
        }
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    pub fn link(&self) -> &ConnectionManager<M> {
        &self.link
    }

    /// Discovery walk in progress, if any.
    pub fn discovery(&self) -> Option<&DiscoveryCursor> {
        self.discovery.as_ref()
    }

    pub fn subscription(&self) -> SubscriptionState {
        SubscriptionState {
            value_handle: self.subscription.value_handle(),
            ccc_handle: self.subscription.ccc_handle(),
            expected: self.link.counter(),
        }
    }

    pub fn is_subscribed(&self) -> bool {
        self.subscription.is_active()
    }

    /// Counter mismatches seen since start-up. Never reset.
    pub fn mismatch_count(&self) -> u32 {
        self.mismatches
    }

    /// Most recent non-fatal outcome, kept until the next one replaces it.
    ///
    /// Besides failed requests this records the benign terminal cases a
    /// run can end in: the peer lacking the service (`ProtocolMismatch`)
    /// and the peer ending the stream (`PeerUnsubscribed`).
    pub fn last_error(&self) -> Option<Error> {
        self.last_error
    }

    /// Enable the stack and start scanning.
    pub fn start(&mut self) -> Result<(), Error> {
        self.host.enable().map_err(|e| {
            error!("Bluetooth init failed: {:?}", e);
            e
        })?;
        info!("Bluetooth initialized");
        self.scanner.start(&mut self.host)
    }

    /// Consume events forever.
    pub async fn run<R: RawMutex, const N: usize>(&mut self, events: Receiver<'_, R, Event, N>) -> ! {
        loop {
            let event = events.receive().await;
            self.handle(&event);
        }
    }

    /// Apply one host event.
    pub fn handle(&mut self, event: &Event) {
        match event {
            Event::Advertisement(report) => self.on_advertisement(report),
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
            Event::Discovered {
                conn,
                phase,
                attribute,
            } => self.on_discovered(*conn, *phase, attribute.as_ref()),
            Event::Notification { conn, data } => self.on_notification(*conn, data),
        }
    }

    fn restart_scan(&mut self) {
        if let Err(e) = self.scanner.start(&mut self.host) {
            self.last_error = Some(e);
        }
    }

    fn on_advertisement(&mut self, report: &AdvReport) {
        if self.link.state() != LinkState::Idle {
            return;
        }
        match self.scanner.on_report(&mut self.host, report) {
            ScanOutcome::Connecting(conn) => {
                self.link.begin_connect(conn);
            }
            ScanOutcome::ConnectFailed(e) => {
                self.last_error = Some(Error::request(Request::Connect, e));
            }
            ScanOutcome::Ignored => {}
        }
    }

    fn on_connected(&mut self, conn: ConnHandle, peer: PeerAddress, status: u8) {
        match self.link.on_connected(conn, peer, Role::Central, status) {
            ConnectOutcome::Failed { status } => {
                warn!("Failed to connect to {:?} ({})", peer, status);
                self.host.release(conn);
                self.restart_scan();
            }
            ConnectOutcome::Established(_) => {
                info!("Connected: {:?}", peer);
                self.subscription.reset();
                let cursor = DiscoveryCursor::new(conn);
                self.discovery = Some(cursor);
                self.issue_discover(conn, &cursor.params());
            }
            ConnectOutcome::Rejected if status == 0 => {
                warn!("Unrequested link {:?}, dropping", conn);
                self.host.release(conn);
            }
            ConnectOutcome::Rejected => {
                debug!("Ignoring connected event for {:?}", conn);
            }
        }
    }

    fn on_disconnected(&mut self, conn: ConnHandle, reason: u8) {
        info!("Disconnected: {:?} (reason {})", conn, reason);
        match self.link.on_disconnected(conn) {
            DisconnectOutcome::Released(conn) => {
                self.host.release(conn);
                self.discovery = None;
                self.subscription.reset();
                self.restart_scan();
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
        if let Err(e) = self.host.set_security(conn, config::CENTRAL_SECURITY) {
            warn!("set_security err: {:?}", e);
            self.last_error = Some(Error::request(Request::SetSecurity, e));
        }
    }

    fn on_security_changed(&mut self, conn: ConnHandle, level: SecurityLevel, status: u8) {
        if status != 0 {
            warn!("Pairing failed with: {}", status);
        } else if self.link.on_security_changed(conn, level) {
            info!("Security changed: {:?}", level);
        }
    }

    fn issue_discover(&mut self, conn: ConnHandle, params: &DiscoverParams) {
        if let Err(e) = self.host.discover(conn, params) {
            error!("Discover failed: {:?}", e);
            self.discovery = None;
            self.last_error = Some(Error::request(Request::Discover, e));
        }
    }

    fn on_discovered(
        &mut self,
        conn: ConnHandle,
        phase: DiscoveryPhase,
        attribute: Option<&DiscoveredAttribute>,
    ) {
        if !self.link.is_current(conn) {
            return;
        }
        let Some(cursor) = self.discovery.as_mut().filter(|c| c.conn() == conn) else {
            return;
        };
        if let Some(attr) = attribute {
            debug!("[ATTRIBUTE] handle {}", attr.handle);
        }

        match cursor.on_discovered(phase, attribute) {
            DiscoveryStep::Discover(params) => self.issue_discover(conn, &params),
            DiscoveryStep::Subscribe(params) => {
                self.discovery = None;
                self.subscribe(conn, &params);
            }
            DiscoveryStep::NotFound(phase) => {
                info!("Discover complete, nothing found in {:?} phase", phase);
                self.discovery = None;
                self.last_error = Some(Error::ProtocolMismatch(phase));
            }
            DiscoveryStep::Ignore => {}
        }
    }

    fn subscribe(&mut self, conn: ConnHandle, params: &SubscribeParams) {
        match self.host.subscribe(conn, params) {
            Ok(()) | Err(HostError::Already) => {
                self.subscription.activate(params);
                info!("[SUBSCRIBED]");
            }
            Err(e) => {
                warn!("Subscribe failed: {:?}", e);
                self.last_error = Some(Error::request(Request::Subscribe, e));
            }
        }
    }

    fn on_notification(&mut self, conn: ConnHandle, data: &[u8]) {
        if !self.link.is_current(conn) {
            return;
        }
        let subscription = &mut self.subscription;
        let outcome = self
            .link
            .with_counter(|counter| subscription.on_notification(counter, data));

        match outcome {
            NotificationOutcome::Mismatch { observed, expected } => {
                self.mismatches = self.mismatches.saturating_add(1);
                warn!("{} != {}", observed, expected);
                self.last_error = Some(Error::CounterMismatch { observed, expected });
            }
            NotificationOutcome::Unsubscribed => {
                info!("[UNSUBSCRIBED]");
                self.last_error = Some(Error::PeerUnsubscribed);
            }
            NotificationOutcome::InOrder(_) | NotificationOutcome::Ignored => {}
        }
    }
}
