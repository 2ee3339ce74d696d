//! Notification producer for the peripheral role.
//!
//! The producer task parks on the connection manager's gate until the
//! event context releases it for a link (on `param_updated`).  It then
//! streams 20-byte notifications carrying the counter on that link as fast
//! as the host accepts them, until the link goes away or a send fails.  A
//! release for a link that is no longer the owned one sends nothing.  Either
//! way the counter goes back to 0 and the task parks again.
//!
//! Payload layout:
//!
//! ```text
//! Byte 0     : counter (wraps at 256)
//! Byte 1..=18: b"-pkt-len-20-ascstr"
//! Byte 19    : 0x00
//! ```

use super::conn::ConnectionManager;
use super::host::NotifySink;
use super::ConnHandle;
use super::uuid::CHARACTERISTIC_UUID;
use crate::config::NOTIFY_PAYLOAD_LEN;
use crate::error::HostError;
use embassy_sync::blocking_mutex::raw::RawMutex;

/// Fixed text following the counter byte.
pub const PAYLOAD_TAIL: &[u8; 18] = b"-pkt-len-20-ascstr";

/// Build the notification for `counter`.
pub fn payload(counter: u8) -> [u8; NOTIFY_PAYLOAD_LEN] {
    let mut buf = [0u8; NOTIFY_PAYLOAD_LEN];
    buf[0] = counter;
    buf[1..1 + PAYLOAD_TAIL.len()].copy_from_slice(PAYLOAD_TAIL);
    buf
}

/// Why a burst ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Suspend {
    /// The released link is not (or no longer) the owned one.
    NoConnection,
    /// The host rejected a notification (e.g. the peer has not enabled
    /// them yet).
    SendFailed(HostError),
}

/// Background notification task.
pub struct Producer<'a, M: RawMutex, S: NotifySink> {
    link: &'a ConnectionManager<M>,
    sink: S,
}

impl<'a, M: RawMutex, S: NotifySink> Producer<'a, M, S> {
    /// Created parked; nothing is sent until the first release.
    pub fn new(link: &'a ConnectionManager<M>, sink: S) -> Self {
        Self { link, sink }
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Park, stream, repeat.
    pub async fn run(&mut self) -> ! {
        loop {
            let conn = self.link.producer_released().await;
            info!("spam_start");
            let reason = self.burst(conn).await;
            info!("suspending spam task: {:?}", reason);
        }
    }

    /// Stream notifications on `conn` until it drops or a send fails.
    pub async fn burst(&mut self, conn: ConnHandle) -> Suspend {
        loop {
            if !self.link.is_current(conn) {
                self.link.reset_counter();
                return Suspend::NoConnection;
            }

            let packet = payload(self.link.with_counter(|c| c.advance()));
            if let Err(e) = self.sink.notify(conn, CHARACTERISTIC_UUID, &packet).await {
                warn!("notify err: {:?}", e);
                self.link.reset_counter();
                return Suspend::SendFailed(e);
            }
        }
    }
}
