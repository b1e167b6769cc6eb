//! NFC tag emulation capability

use crate::DriverResult;

/// NFC type 2 tag holding NDEF records
pub trait Nfc {
    fn init(&mut self) -> DriverResult<()>;

    fn uninit(&mut self) -> DriverResult<()>;

    /// Append a text record to the pending NDEF message
    fn text_record_set(&mut self, text: &str) -> DriverResult<()>;

    /// Encode the pending records and expose them to readers
    fn data_commit(&mut self) -> DriverResult<()>;
}
