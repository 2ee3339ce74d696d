//! Application-wide constants and compile-time configuration.
//!
//! All naming, timing parameters, and protocol constants live here so
//! they can be tuned in one place.

use crate::ble::SecurityLevel;

// Naming

/// Complete local name the central looks for in advertisement reports.
pub const TARGET_NAME: &str = "iSpam";

/// Complete local name the peripheral advertises.
pub const DEVICE_NAME: &str = "iSpam";

// Scanning

/// Scan interval (in 0.625 ms units). 0x60 = 60 ms, the GAP "fast" interval.
pub const SCAN_FAST_INTERVAL: u16 = 0x0060;

/// Scan window (in 0.625 ms units). 0x30 = 30 ms.
pub const SCAN_FAST_WINDOW: u16 = 0x0030;

// Connection

/// Default connection interval range (in 1.25 ms units).
/// 24 = 30 ms, 40 = 50 ms.
pub const CONN_INTERVAL_MIN: u16 = 24;
pub const CONN_INTERVAL_MAX: u16 = 40;

/// Peripheral latency (number of connection events the peripheral can skip).
pub const CONN_LATENCY: u16 = 0;

/// Supervision timeout (in 10 ms units). 400 = 4 s.
pub const CONN_SUP_TIMEOUT: u16 = 400;

/// Security level the central requests once connection parameters settle.
pub const CENTRAL_SECURITY: SecurityLevel = SecurityLevel::L2;

// GATT

/// First attribute handle of a full-range discovery.
pub const DISCOVER_START_HANDLE: u16 = 0x0001;

/// Last attribute handle of a full-range discovery.
pub const DISCOVER_END_HANDLE: u16 = 0xFFFF;

/// Size of each notification the peripheral sends (default ATT MTU - 3).
pub const NOTIFY_PAYLOAD_LEN: usize = 20;

/// Largest notification payload the central buffers per event.
pub const NOTIFY_CAPACITY: usize = 64;

// Advertising

/// Legacy advertising payload limit.
pub const ADV_DATA_CAPACITY: usize = 31;

// Event delivery

/// Depth of each role's inbound event queue.
pub const EVENT_QUEUE_DEPTH: usize = 8;
