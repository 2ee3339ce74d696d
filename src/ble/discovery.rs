//! GATT discovery walk for the central role.
//!
//! After the link comes up the cursor walks three phases, one outstanding
//! request at a time:
//!
//! 1. Primary service with [`SERVICE_UUID`] over the full handle range.
//! 2. Characteristic [`CHARACTERISTIC_UUID`] after the service handle; the
//!    characteristic's value handle is kept for the subscription.
//! 3. CCC descriptor two handles past the declaration (skipping the value
//!    attribute), which yields the subscribe request.
//!
//! A phase ends either with the first matching attribute (the cursor stops
//! iterating and hands out the next request) or with the host's empty
//! result.  Results tagged with a phase the cursor has already left are
//! dropped, so late traffic from an earlier request can never advance it.

use super::host::{CccValue, DiscoverParams, SubscribeParams};
use super::uuid::{Uuid, CCC_UUID, CHARACTERISTIC_UUID, SERVICE_UUID};
use super::{ConnHandle, DiscoveredAttribute};
use crate::config::{DISCOVER_END_HANDLE, DISCOVER_START_HANDLE};

/// Which kind of attribute the current request looks for.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DiscoveryPhase {
    Primary,
    Characteristic,
    Descriptor,
    Done,
}

/// What the central should do after feeding a result to the cursor.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DiscoveryStep {
    /// Issue this discovery request next.
    Discover(DiscoverParams),
    /// The CCC descriptor was found; issue this subscribe request.
    Subscribe(SubscribeParams),
    /// The phase finished without a match. The walk is over.
    NotFound(DiscoveryPhase),
    /// Nothing to do (stale phase, foreign UUID, or walk already over).
    Ignore,
}

/// In-progress discovery state for one connection.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DiscoveryCursor {
    conn: ConnHandle,
    phase: DiscoveryPhase,
    uuid: Uuid,
    start_handle: u16,
    end_handle: u16,
    value_handle: Option<u16>,
}

impl DiscoveryCursor {
    /// Cursor positioned at the primary-service search.
    pub const fn new(conn: ConnHandle) -> Self {
        Self {
            conn,
            phase: DiscoveryPhase::Primary,
            uuid: SERVICE_UUID,
            start_handle: DISCOVER_START_HANDLE,
            end_handle: DISCOVER_END_HANDLE,
            value_handle: None,
        }
    }

    pub const fn conn(&self) -> ConnHandle {
        self.conn
    }

    pub const fn phase(&self) -> DiscoveryPhase {
        self.phase
    }

    /// Value handle recorded during the characteristic phase.
    pub const fn value_handle(&self) -> Option<u16> {
        self.value_handle
    }

    /// The request for the current phase.
    pub const fn params(&self) -> DiscoverParams {
        DiscoverParams {
            uuid: self.uuid,
            start_handle: self.start_handle,
            end_handle: self.end_handle,
            phase: self.phase,
        }
    }

    /// Feed one discovery result.
    pub fn on_discovered(
        &mut self,
        phase: DiscoveryPhase,
        attribute: Option<&DiscoveredAttribute>,
    ) -> DiscoveryStep {
        if phase != self.phase || self.phase == DiscoveryPhase::Done {
            return DiscoveryStep::Ignore;
        }

        let Some(attr) = attribute else {
            let missed = self.phase;
            self.phase = DiscoveryPhase::Done;
            return DiscoveryStep::NotFound(missed);
        };

        if attr.uuid != self.uuid {
            return DiscoveryStep::Ignore;
        }

        match self.phase {
            DiscoveryPhase::Primary => {
                self.phase = DiscoveryPhase::Characteristic;
                self.uuid = CHARACTERISTIC_UUID;
                self.start_handle = attr.handle.saturating_add(1);
                DiscoveryStep::Discover(self.params())
            }
            DiscoveryPhase::Characteristic => {
                self.value_handle = Some(
                    attr.value_handle
                        .unwrap_or_else(|| attr.handle.saturating_add(1)),
                );
                self.phase = DiscoveryPhase::Descriptor;
                self.uuid = CCC_UUID;
                self.start_handle = attr.handle.saturating_add(2);
                DiscoveryStep::Discover(self.params())
            }
            DiscoveryPhase::Descriptor => {
                self.phase = DiscoveryPhase::Done;
                DiscoveryStep::Subscribe(SubscribeParams {
                    value_handle: self.value_handle.unwrap_or(0),
                    ccc_handle: attr.handle,
                    value: CccValue::Notify,
                })
            }
            DiscoveryPhase::Done => DiscoveryStep::Ignore,
        }
    }
}
