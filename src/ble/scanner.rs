//! BLE GAP scanner - finds the target peripheral and opens the link.
//!
//! Scanning is active with duplicate filtering off.  Only connectable
//! reports are parsed; the first one whose complete local name equals the
//! target stops the scan and triggers a connect with default parameters.
//! There is no scan timeout: without a match the scan simply keeps going.

use super::adv;
use super::host::{CentralHost, ConnParams, ScanParams};
use super::{AdvReport, ConnHandle};
use crate::error::{Error, HostError, Request};

/// What a single advertisement report led to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ScanOutcome {
    /// Not connectable, or not the device we look for.
    Ignored,
    /// Target found; connect request accepted by the host.
    Connecting(ConnHandle),
    /// Target found but the connect request was rejected; scanning was
    /// restarted.
    ConnectFailed(HostError),
}

/// Name-filtering scanner.
pub struct Scanner {
    target: &'static str,
    params: ScanParams,
}

impl Scanner {
    pub const fn new(target: &'static str) -> Self {
        Self {
            target,
            params: ScanParams::active_fast(),
        }
    }

    pub const fn target(&self) -> &'static str {
        self.target
    }

    /// Start scanning. Failure is reported, never retried here.
    pub fn start<H: CentralHost>(&self, host: &mut H) -> Result<(), Error> {
        match host.start_scan(&self.params) {
            Ok(()) => {
                info!("Scanning successfully started");
                Ok(())
            }
            Err(e) => {
                error!("Scanning failed to start: {:?}", e);
                Err(Error::request(Request::StartScan, e))
            }
        }
    }

    /// Process one advertisement report.
    pub fn on_report<H: CentralHost>(&self, host: &mut H, report: &AdvReport) -> ScanOutcome {
        debug!(
            "[DEVICE]: {:?}, AD evt type {:?}, AD data len {}, RSSI {}",
            report.peer,
            report.kind,
            report.data.len(),
            report.rssi
        );

        if !report.kind.is_connectable() {
            return ScanOutcome::Ignored;
        }
        if !adv::has_complete_name(&report.data, self.target) {
            return ScanOutcome::Ignored;
        }

        info!("Found {} at {:?} (RSSI {})", self.target, report.peer, report.rssi);

        if let Err(e) = host.stop_scan() {
            warn!("Stopping scan failed: {:?}", e);
        }

        match host.connect(&report.peer, &ConnParams::default()) {
            Ok(conn) => ScanOutcome::Connecting(conn),
            Err(e) => {
                warn!("Create conn failed: {:?}", e);
                // Best effort; a failure here is already logged by `start`.
                let _ = self.start(host);
                ScanOutcome::ConnectFailed(e)
            }
        }
    }
}
