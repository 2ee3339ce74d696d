//! Service / characteristic UUID catalogue.

/// A GATT UUID, 16-bit SIG-assigned or full 128-bit.
///
/// 128-bit values are stored little-endian, the order they travel on air.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Uuid {
    Uuid16(u16),
    Uuid128([u8; 16]),
}

/// Custom service `12345678-1234-5678-1234-56789abcdef0`.
pub const SERVICE_UUID: Uuid = Uuid::Uuid128([
    0xf0, 0xde, 0xbc, 0x9a, 0x78, 0x56, 0x34, 0x12, 0x78, 0x56, 0x34, 0x12, 0x78, 0x56, 0x34, 0x12,
]);

/// Custom notify characteristic `12345678-1234-5678-1234-56789abcdef1`.
pub const CHARACTERISTIC_UUID: Uuid = Uuid::Uuid128([
    0xf1, 0xde, 0xbc, 0x9a, 0x78, 0x56, 0x34, 0x12, 0x78, 0x56, 0x34, 0x12, 0x78, 0x56, 0x34, 0x12,
]);

/// Client Characteristic Configuration descriptor (0x2902).
pub const CCC_UUID: Uuid = Uuid::Uuid16(0x2902);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn service_and_characteristic_differ_only_in_last_byte() {
        let (Uuid::Uuid128(svc), Uuid::Uuid128(chr)) = (SERVICE_UUID, CHARACTERISTIC_UUID) else {
            panic!("custom UUIDs must be 128-bit");
        };
        assert_eq!(svc[1..], chr[1..]);
        assert_ne!(svc[0], chr[0]);
        assert_ne!(SERVICE_UUID, CHARACTERISTIC_UUID);
    }

    #[test]
    fn ccc_is_sig_assigned() {
        assert_eq!(CCC_UUID, Uuid::Uuid16(0x2902));
        assert!(matches!(CCC_UUID, Uuid::Uuid16(_)));
    }
}
