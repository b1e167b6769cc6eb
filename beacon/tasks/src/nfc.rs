//! NFC tag carrying the firmware version

use heapless::String;

use beacon_core::{Error, InitReport, NFC_TEXT_BUFFER_SIZE};
use beacon_hal::Nfc;

pub struct NfcTask<N: Nfc> {
    nfc: N,
}

impl<N: Nfc> NfcTask<N> {
    pub fn new(nfc: N) -> Self {
        Self { nfc }
    }

    /// Bring up the tag and publish a `FW: <version>` text record
    pub fn init(&mut self, fw_version: &str) -> InitReport {
        let mut report = InitReport::new("nfc");
        if report.record("nfc_init", self.nfc.init().map_err(Error::from)).is_err() {
            return report;
        }
        let text = version_text(fw_version);
        let _ = report.record("text_record_set", self.nfc.text_record_set(&text).map_err(Error::from));
        let _ = report.record("data_commit", self.nfc.data_commit().map_err(Error::from));
        report
    }

    pub fn uninit(&mut self) -> beacon_core::Result<()> {
        self.nfc.uninit().map_err(Error::from)
    }

    pub fn nfc(&self) -> &N {
        &self.nfc
    }
}

/// Version record, cut to the tag's text buffer
fn version_text(fw_version: &str) -> String<NFC_TEXT_BUFFER_SIZE> {
    let mut text = String::new();
    for c in "FW: ".chars().chain(fw_version.chars()) {
        if text.push(c).is_err() {
            break;
        }
    }
    text
}
