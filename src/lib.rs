//! iSpam: two-role BLE notification demo.
//!
//! The **central** scans for a peripheral advertising the complete name
//! `iSpam`, connects, raises security once the link parameters settle,
//! discovers service → characteristic → CCC descriptor, subscribes, and
//! checks that the notified counter increments by one each time.
//!
//! The **peripheral** advertises, accepts one link, and streams 20-byte
//! notifications carrying a wrapping counter from a producer task that
//! stays parked until the link's first parameter update.
//!
//! The host stack is an outside collaborator reached through the traits in
//! [`ble::host`]; it feeds [`ble::Event`]s into an Embassy channel.  Wiring
//! for the peripheral:
//!
//! ```ignore
//! static LINK: ConnectionManager<CriticalSectionRawMutex> = ConnectionManager::new();
//! static EVENTS: Channel<CriticalSectionRawMutex, Event, EVENT_QUEUE_DEPTH> = Channel::new();
//!
//! let mut peripheral = Peripheral::new(host, &LINK);
//! peripheral.start()?;
//! join(
//!     Producer::new(&LINK, sink).run(),
//!     peripheral.run(EVENTS.receiver()),
//! )
//! .await;
//! ```
//!
//! Builds `no_std`; the library is unit-tested on the host.

#![cfg_attr(not(test), no_std)]

// Must come first so the logging macros are visible to every module.
#[macro_use]
mod fmt;

pub mod ble;
pub mod central;
pub mod config;
pub mod error;
pub mod peripheral;

#[cfg(test)]
mod testing;

pub use ble::conn::ConnectionManager;
pub use ble::producer::Producer;
pub use ble::Event;
pub use central::Central;
pub use error::{Error, HostError};
pub use peripheral::Peripheral;
