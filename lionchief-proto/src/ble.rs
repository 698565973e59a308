//! BLE GATT Protocol Constants for LionChief Trains
//!
//! The service UUID is what a train advertises; the write characteristic is
//! where command frames go once connected.

/// Service UUID advertised by every LionChief locomotive
pub const SERVICE_UUID: &str = "e20a39f4-73f5-4bc4-a12f-17d1ad07a961";

/// Command Characteristic UUID (write)
pub const WRITE_CHARACTERISTIC_UUID: &str = "08590f7e-db05-467e-8757-72f6faeb13d4";

/// Client configuration descriptor of the notify characteristic (read/notify)
pub const READ_CHARACTERISTIC_UUID: &str = "00002902-0000-1000-8000-00805f9b34fb";

/// Same constants as 128-bit integers, for `Uuid::from_u128`
pub mod raw {
    pub const SERVICE_UUID: u128 = 0xe20a39f4_73f5_4bc4_a12f_17d1ad07a961;
    pub const WRITE_CHARACTERISTIC_UUID: u128 = 0x08590f7e_db05_467e_8757_72f6faeb13d4;
    pub const READ_CHARACTERISTIC_UUID: u128 = 0x00002902_0000_1000_8000_00805f9b34fb;
}

#[cfg(test)]
mod tests {
    fn hyphenated(v: u128) -> String {
        let h = format!("{v:032x}");
        format!("{}-{}-{}-{}-{}", &h[0..8], &h[8..12], &h[12..16], &h[16..20], &h[20..32])
    }

    #[test]
    fn raw_matches_strings() {
        assert_eq!(hyphenated(super::raw::SERVICE_UUID), super::SERVICE_UUID);
        assert_eq!(
            hyphenated(super::raw::WRITE_CHARACTERISTIC_UUID),
            super::WRITE_CHARACTERISTIC_UUID
        );
        assert_eq!(
            hyphenated(super::raw::READ_CHARACTERISTIC_UUID),
            super::READ_CHARACTERISTIC_UUID
        );
    }
}
