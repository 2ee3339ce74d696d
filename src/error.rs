//! Unified error type for ispam.
//!
//! We avoid `alloc` - all error variants carry only fixed-size data.
//! Implements `defmt::Format` (behind the `defmt` feature) for efficient
//! on-target logging.

use crate::ble::discovery::DiscoveryPhase;

/// Top-level error type used across the role engines.
///
/// Only [`Error::Startup`] is returned as fatal; the central records the
/// rest, benign terminal outcomes included, and keeps running.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error {
    /// The BLE stack could not be enabled. Fatal for the role.
    Startup(HostError),

    /// A request was rejected synchronously by the host stack.
    Request { op: Request, cause: HostError },

    /// Discovery finished without finding the attribute the phase looked for.
    /// A legitimate end of the run rather than a fault: it is recorded, not
    /// retried.
    ProtocolMismatch(DiscoveryPhase),

    /// A notification carried a counter other than the expected one.
    CounterMismatch { observed: u8, expected: u8 },

    /// The peer signalled the end of the notification stream.
    PeerUnsubscribed,
}

impl Error {
    /// Build a [`Error::Request`] for the given operation.
    pub const fn request(op: Request, cause: HostError) -> Self {
        Error::Request { op, cause }
    }
}

/// Which host call a [`Error::Request`] refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Request {
    StartScan,
    Connect,
    SetSecurity,
    Discover,
    Subscribe,
    Advertise,
}

/// Subset of host-stack errors we propagate (keeps the enum `Copy`-friendly).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum HostError {
    /// Operation already in progress (e.g. subscribing twice).
    Already,
    /// The connection handle no longer refers to a live link.
    NotConnected,
    /// The peer has not enabled notifications on the attribute.
    NotEnabled,
    /// No buffers or slots left for the request.
    NoResources,
    /// Raw stack error code.
    Code(i32),
}

// Convenience conversions

/// Only stack bring-up propagates a bare `HostError` with `?`.
impl From<HostError> for Error {
    fn from(e: HostError) -> Self {
        Error::Startup(e)
    }
}
