//! Connection manager.
//!
//! Owns the single active link and the process-wide notification counter
//! behind one blocking mutex, so the event-delivery context and the
//! peripheral's producer task never hold independent copies.  Also carries
//! the producer's resume gate, which names the link it was opened for and
//! is closed again when that link goes away.
//!
//! Lifecycle per connection attempt:
//!
//! ```text
//! Idle ──begin_connect──▶ Connecting ──connected(0)──▶ Connected
//!  ▲                          │                            │
//!  └──── connected(err) ──────┘◀──────── disconnected ─────┘
//! ```
//!
//! Parameter updates and security changes are recorded on the owned
//! [`Connection`] without leaving `Connected`.

use core::cell::RefCell;

use super::{ConnHandle, Connection, PeerAddress, Role, SecurityLevel};
use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_sync::blocking_mutex::Mutex;
use embassy_sync::signal::Signal;

/// Single-byte notification counter, wrapping modulo 256.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct NotificationCounter(u8);

impl NotificationCounter {
    pub const fn new() -> Self {
        Self(0)
    }

    pub const fn value(&self) -> u8 {
        self.0
    }

    /// Return the current value and step to the next one.
    pub fn advance(&mut self) -> u8 {
        let current = self.0;
        self.0 = self.0.wrapping_add(1);
        current
    }

    pub fn reset(&mut self) {
        self.0 = 0;
    }
}

/// Where the link currently is.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LinkState {
    Idle,
    /// Central only: connect request issued, waiting for `connected`.
    Connecting(ConnHandle),
    Connected(Connection),
}

/// Result of a `connected` event.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConnectOutcome {
    /// We now own this link; the counter is back at 0.
    Established(Connection),
    /// Our attempt failed with the given HCI status.
    Failed { status: u8 },
    /// Not the link we asked for, or one is already owned.
    Rejected,
}

/// Result of a `disconnected` event.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DisconnectOutcome {
    /// Our link went away; ownership released and counter reset.
    Released(ConnHandle),
    /// The event names a link we do not own.
    Stale,
}

struct Inner {
    state: LinkState,
    counter: NotificationCounter,
}

/// Single owner of the connection and counter state.
pub struct ConnectionManager<M: RawMutex> {
    inner: Mutex<M, RefCell<Inner>>,
    producer_gate: Signal<M, ConnHandle>,
}

impl<M: RawMutex> Default for ConnectionManager<M> {
    fn default() -> Self {
        Self::new()
    }
}

impl<M: RawMutex> ConnectionManager<M> {
    pub const fn new() -> Self {
        Self {
            inner: Mutex::new(RefCell::new(Inner {
                state: LinkState::Idle,
                counter: NotificationCounter::new(),
            })),
            producer_gate: Signal::new(),
        }
    }

    fn with<R>(&self, f: impl FnOnce(&mut Inner) -> R) -> R {
        self.inner.lock(|cell| f(&mut cell.borrow_mut()))
    }

    pub fn state(&self) -> LinkState {
        self.with(|inner| inner.state)
    }

    /// The owned link, if connected.
    pub fn connection(&self) -> Option<Connection> {
        self.with(|inner| match inner.state {
            LinkState::Connected(conn) => Some(conn),
            _ => None,
        })
    }

    /// Handle of the owned link, if connected.
    pub fn current(&self) -> Option<ConnHandle> {
        self.connection().map(|c| c.handle)
    }

    pub fn is_current(&self, conn: ConnHandle) -> bool {
        self.current() == Some(conn)
    }

    /// Record an outgoing connect request. Only valid from `Idle`.
    pub fn begin_connect(&self, conn: ConnHandle) -> bool {
        self.with(|inner| match inner.state {
            LinkState::Idle => {
                inner.state = LinkState::Connecting(conn);
                true
            }
            _ => false,
        })
    }

    /// Apply a `connected` event.
    ///
    /// A central only accepts the link it is connecting; a peripheral
    /// accepts any inbound link while idle.
    pub fn on_connected(
        &self,
        conn: ConnHandle,
        peer: PeerAddress,
        role: Role,
        status: u8,
    ) -> ConnectOutcome {
        self.with(|inner| {
            if status != 0 {
                return match (inner.state, role) {
                    (LinkState::Connecting(pending), Role::Central) if pending == conn => {
                        inner.state = LinkState::Idle;
                        ConnectOutcome::Failed { status }
                    }
                    (LinkState::Idle, Role::Peripheral) => ConnectOutcome::Failed { status },
                    _ => ConnectOutcome::Rejected,
                };
            }

            let accept = match (inner.state, role) {
                (LinkState::Connecting(pending), Role::Central) => pending == conn,
                (LinkState::Idle, Role::Peripheral) => true,
                _ => false,
            };
            if !accept {
                return ConnectOutcome::Rejected;
            }

            let connection = Connection::new(conn, peer, role);
            inner.state = LinkState::Connected(connection);
            inner.counter.reset();
            ConnectOutcome::Established(connection)
        })
    }

    /// Apply a `disconnected` event. Events for other links are ignored.
    ///
    /// Releasing the link also drops a producer release the producer has
    /// not picked up yet.
    pub fn on_disconnected(&self, conn: ConnHandle) -> DisconnectOutcome {
        let outcome = self.with(|inner| {
            let owned = match inner.state {
                LinkState::Connected(c) => c.handle == conn,
                LinkState::Connecting(pending) => pending == conn,
                LinkState::Idle => false,
            };
            if !owned {
                return DisconnectOutcome::Stale;
            }
            inner.state = LinkState::Idle;
            inner.counter.reset();
            DisconnectOutcome::Released(conn)
        });
        if let DisconnectOutcome::Released(_) = outcome {
            self.producer_gate.reset();
        }
        outcome
    }

    /// Record new connection parameters. Returns the updated link when
    /// `conn` is the owned one.
    pub fn on_param_updated(
        &self,
        conn: ConnHandle,
        interval: u16,
        latency: u16,
        timeout: u16,
    ) -> Option<Connection> {
        self.with(|inner| match &mut inner.state {
            LinkState::Connected(c) if c.handle == conn => {
                c.interval = Some(interval);
                c.latency = latency;
                c.timeout = timeout;
                Some(*c)
            }
            _ => None,
        })
    }

    /// Record a new security level on the owned link.
    pub fn on_security_changed(&self, conn: ConnHandle, level: SecurityLevel) -> bool {
        self.with(|inner| match &mut inner.state {
            LinkState::Connected(c) if c.handle == conn => {
                c.security = level;
                true
            }
            _ => false,
        })
    }

    pub fn counter(&self) -> u8 {
        self.with(|inner| inner.counter.value())
    }

    /// Run `f` against the counter under the lock.
    pub fn with_counter<R>(&self, f: impl FnOnce(&mut NotificationCounter) -> R) -> R {
        self.with(|inner| f(&mut inner.counter))
    }

    pub fn reset_counter(&self) {
        self.with_counter(NotificationCounter::reset)
    }

    /// Wake the parked producer for `conn`.
    pub fn release_producer(&self, conn: ConnHandle) {
        self.producer_gate.signal(conn);
    }

    /// Park until [`release_producer`](Self::release_producer) is called.
    /// Returns the link the release was issued for.
    pub async fn producer_released(&self) -> ConnHandle {
        self.producer_gate.wait().await
    }

    /// Whether a release is pending that the producer has not consumed.
    pub fn producer_release_pending(&self) -> bool {
        self.producer_gate.signaled()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ble::AddressKind;
    use embassy_sync::blocking_mutex::raw::NoopRawMutex;

    const PEER: PeerAddress = PeerAddress::new(AddressKind::Random, [1, 2, 3, 4, 5, 6]);

    fn manager() -> ConnectionManager<NoopRawMutex> {
        ConnectionManager::new()
    }

    #[test]
    fn counter_wraps_after_256_steps() {
        let mut counter = NotificationCounter::new();
        for expected in 0..=255u8 {
            assert_eq!(counter.advance(), expected);
        }
        assert_eq!(counter.value(), 0);
    }

    #[test]
    fn central_connect_lifecycle() {
        let m = manager();
        assert!(m.begin_connect(ConnHandle(1)));
        assert!(!m.begin_connect(ConnHandle(2)));
        assert_eq!(m.state(), LinkState::Connecting(ConnHandle(1)));

        let outcome = m.on_connected(ConnHandle(1), PEER, Role::Central, 0);
        assert!(matches!(outcome, ConnectOutcome::Established(c) if c.handle == ConnHandle(1)));
        assert_eq!(m.current(), Some(ConnHandle(1)));

        assert_eq!(
            m.on_disconnected(ConnHandle(1)),
            DisconnectOutcome::Released(ConnHandle(1))
        );
        assert_eq!(m.state(), LinkState::Idle);
    }

    #[test]
    fn failed_connect_returns_to_idle() {
        let m = manager();
        m.begin_connect(ConnHandle(3));
        assert_eq!(
            m.on_connected(ConnHandle(3), PEER, Role::Central, 0x3e),
            ConnectOutcome::Failed { status: 0x3e }
        );
        assert_eq!(m.state(), LinkState::Idle);
    }

    #[test]
    fn central_rejects_unrequested_link() {
        let m = manager();
        m.begin_connect(ConnHandle(1));
        assert_eq!(
            m.on_connected(ConnHandle(9), PEER, Role::Central, 0),
            ConnectOutcome::Rejected
        );
        assert_eq!(m.state(), LinkState::Connecting(ConnHandle(1)));
    }

    #[test]
    fn peripheral_keeps_first_link() {
        let m = manager();
        assert!(matches!(
            m.on_connected(ConnHandle(1), PEER, Role::Peripheral, 0),
            ConnectOutcome::Established(_)
        ));
        assert_eq!(
            m.on_connected(ConnHandle(2), PEER, Role::Peripheral, 0),
            ConnectOutcome::Rejected
        );
        assert_eq!(m.current(), Some(ConnHandle(1)));
    }

    #[test]
    fn stale_disconnect_keeps_current_link() {
        let m = manager();
        m.on_connected(ConnHandle(5), PEER, Role::Peripheral, 0);
        m.with_counter(|c| {
            c.advance();
        });

        assert_eq!(m.on_disconnected(ConnHandle(4)), DisconnectOutcome::Stale);
        assert_eq!(m.current(), Some(ConnHandle(5)));
        assert_eq!(m.counter(), 1);
    }

    #[test]
    fn counter_resets_on_connect_and_disconnect() {
        let m = manager();
        m.with_counter(|c| {
            c.advance();
            c.advance();
        });
        m.on_connected(ConnHandle(1), PEER, Role::Peripheral, 0);
        assert_eq!(m.counter(), 0);

        m.with_counter(|c| {
            c.advance();
        });
        m.on_disconnected(ConnHandle(1));
        assert_eq!(m.counter(), 0);
    }

    #[test]
    fn param_and_security_updates_apply_to_owned_link_only() {
        let m = manager();
        m.on_connected(ConnHandle(1), PEER, Role::Peripheral, 0);

        assert!(m.on_param_updated(ConnHandle(2), 6, 0, 400).is_none());
        let updated = m.on_param_updated(ConnHandle(1), 40, 0, 400).unwrap();
        assert_eq!(updated.interval_ms(), Some(50));

        assert!(!m.on_security_changed(ConnHandle(2), SecurityLevel::L2));
        assert!(m.on_security_changed(ConnHandle(1), SecurityLevel::L2));
        assert_eq!(m.connection().unwrap().security, SecurityLevel::L2);
    }

    #[test]
    fn producer_gate_latches_release() {
        let m = manager();
        assert!(!m.producer_release_pending());
        m.release_producer(ConnHandle(3));
        assert!(m.producer_release_pending());
        assert_eq!(embassy_futures::block_on(m.producer_released()), ConnHandle(3));
        assert!(!m.producer_release_pending());
    }

    #[test]
    fn disconnect_drops_pending_release() {
        let m = manager();
        m.on_connected(ConnHandle(1), PEER, Role::Peripheral, 0);
        m.release_producer(ConnHandle(1));
        m.on_disconnected(ConnHandle(1));
        assert!(!m.producer_release_pending());
    }

    #[test]
    fn stale_disconnect_keeps_pending_release() {
        let m = manager();
        m.on_connected(ConnHandle(1), PEER, Role::Peripheral, 0);
        m.release_producer(ConnHandle(1));
        m.on_disconnected(ConnHandle(2));
        assert!(m.producer_release_pending());
    }
}
