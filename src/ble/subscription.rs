//! Notification consumer for the central role.
//!
//! Each notified payload starts with the peripheral's counter byte.  The
//! consumer compares it with the expected value, reports gaps, and always
//! steps the expectation by one - it never resynchronises to what it saw.
//! An empty payload is the server ending the stream.

use super::conn::NotificationCounter;
use super::host::SubscribeParams;

/// Outcome of one inbound notification.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum NotificationOutcome {
    /// Counter matched.
    InOrder(u8),
    /// Counter differs from the expected value; the stream continues.
    Mismatch { observed: u8, expected: u8 },
    /// Empty payload: the peer unsubscribed us.
    Unsubscribed,
    /// No active subscription to deliver to.
    Ignored,
}

/// Snapshot of the subscription for inspection.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SubscriptionState {
    pub value_handle: u16,
    pub ccc_handle: u16,
    pub expected: u8,
}

/// Handles of the subscribed characteristic. A zero value handle means
/// "unsubscribed".
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Subscription {
    value_handle: u16,
    ccc_handle: u16,
}

impl Subscription {
    pub const fn new() -> Self {
        Self {
            value_handle: 0,
            ccc_handle: 0,
        }
    }

    /// Record a subscribe request the host accepted.
    pub fn activate(&mut self, params: &SubscribeParams) {
        self.value_handle = params.value_handle;
        self.ccc_handle = params.ccc_handle;
    }

    pub fn reset(&mut self) {
        *self = Self::new();
    }

    pub const fn is_active(&self) -> bool {
        self.value_handle != 0
    }

    pub const fn value_handle(&self) -> u16 {
        self.value_handle
    }

    pub const fn ccc_handle(&self) -> u16 {
        self.ccc_handle
    }

    /// Check one notified payload against `counter`.
    pub fn on_notification(
        &mut self,
        counter: &mut NotificationCounter,
        data: &[u8],
    ) -> NotificationOutcome {
        if !self.is_active() {
            return NotificationOutcome::Ignored;
        }

        let Some(&observed) = data.first() else {
            self.value_handle = 0;
            return NotificationOutcome::Unsubscribed;
        };

        let expected = counter.advance();
        if observed == expected {
            NotificationOutcome::InOrder(observed)
        } else {
            NotificationOutcome::Mismatch { observed, expected }
        }
    }
}
