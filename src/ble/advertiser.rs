//! Connectable advertising for the peripheral role.

use super::adv::{AdStructure, BR_EDR_NOT_SUPPORTED, LE_GENERAL_DISCOVERABLE};
use super::host::{AdvMode, PeripheralHost};
use crate::error::{Error, Request};

/// Advertises general-discoverable, LE-only flags and the complete name.
pub struct Advertiser {
    name: &'static str,
}

impl Advertiser {
    pub const fn new(name: &'static str) -> Self {
        Self { name }
    }

    /// Advertising payload structures.
    pub fn payload(&self) -> [AdStructure<'static>; 2] {
        [
            AdStructure::Flags(LE_GENERAL_DISCOVERABLE | BR_EDR_NOT_SUPPORTED),
            AdStructure::CompleteName(self.name),
        ]
    }

    /// Start connectable undirected advertising. Failure is reported, not
    /// retried.
    pub fn start<H: PeripheralHost>(&self, host: &mut H) -> Result<(), Error> {
        match host.advertise_start(AdvMode::ConnectableUndirected, &self.payload()) {
            Ok(()) => {
                info!("Advertising successfully started");
                Ok(())
            }
            Err(e) => {
                error!("Advertising failed to start: {:?}", e);
                Err(Error::request(Request::Advertise, e))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::HostError;
    use crate::testing::{Call, MockHost};

    #[test]
    fn advertises_flags_and_name() {
        let mut host = MockHost::new();
        Advertiser::new("iSpam").start(&mut host).unwrap();
        let [Call::Advertise(mode, data)] = host.calls.as_slice() else {
            panic!("unexpected calls: {:?}", host.calls);
        };
        assert_eq!(*mode, AdvMode::ConnectableUndirected);
        assert_eq!(
            data.as_slice(),
            &[0x02, 0x01, 0x06, 0x06, 0x09, b'i', b'S', b'p', b'a', b'm']
        );
    }

    #[test]
    fn start_failure_is_reported() {
        let mut host = MockHost::new();
        host.fail_advertise = Some(HostError::Code(-12));
        assert_eq!(
            Advertiser::new("iSpam").start(&mut host),
            Err(Error::request(Request::Advertise, HostError::Code(-12)))
        );
    }
}
