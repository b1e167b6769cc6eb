//! BLE 4 advertising/scanning radio capability

use core::fmt;
use heapless::Vec;

use crate::DriverResult;

/// Largest legacy advertisement payload
pub const ADV_DATA_MAX: usize = 31;

/// Bytes a [`ScanResult`] occupies when copied into an event payload
pub const SCAN_RESULT_HEADER: usize = 7;

/// 48-bit device address, most significant byte first
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Address(pub [u8; 6]);

impl Address {
    /// Pack the address into the low 48 bits of an integer
    pub fn to_u64(self) -> u64 {
        self.0.iter().fold(0u64, |acc, byte| (acc << 8) | u64::from(*byte))
    }

    /// Unpack the low 48 bits of an integer
    pub fn from_u64(value: u64) -> Self {
        let mut bytes = [0u8; 6];
        for (i, byte) in bytes.iter_mut().enumerate() {
            *byte = (value >> (40 - 8 * i)) as u8;
        }
        Self(bytes)
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let a = &self.0;
        write!(
            f,
            "{:02X}:{:02X}:{:02X}:{:02X}:{:02X}:{:02X}",
            a[0], a[1], a[2], a[3], a[4], a[5]
        )
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for Address {
    fn format(&self, fmt: defmt::Formatter) {
        let a = &self.0;
        defmt::write!(
            fmt,
            "{=u8:02X}:{=u8:02X}:{=u8:02X}:{=u8:02X}:{=u8:02X}:{=u8:02X}",
            a[0], a[1], a[2], a[3], a[4], a[5]
        );
    }
}

/// Advertisement overheard while scanning
///
/// Transient: decoded in the radio interrupt, copied by value into an event
/// payload and consumed by the relay.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanResult {
    pub address: Address,
    pub rssi: i8,
    pub data: Vec<u8, ADV_DATA_MAX>,
}

impl ScanResult {
    /// Build a scan result, rejecting payloads longer than a legacy advertisement
    pub fn new(address: Address, rssi: i8, data: &[u8]) -> Option<Self> {
        Some(Self {
            address,
            rssi,
            data: Vec::from_slice(data).ok()?,
        })
    }

    /// Number of bytes [`encode`](Self::encode) writes
    pub fn encoded_len(&self) -> usize {
        SCAN_RESULT_HEADER + self.data.len()
    }

    /// Copy into an event payload: address, rssi, then the raw advertisement
    pub fn encode(&self, buf: &mut [u8]) -> Option<usize> {
        let len = self.encoded_len();
        let out = buf.get_mut(..len)?;
        out[..6].copy_from_slice(&self.address.0);
        out[6] = self.rssi as u8;
        out[SCAN_RESULT_HEADER..].copy_from_slice(&self.data);
        Some(len)
    }

    /// Rebuild a scan result from an event payload
    pub fn decode(buf: &[u8]) -> Option<Self> {
        if buf.len() < SCAN_RESULT_HEADER {
            return None;
        }
        let mut address = [0u8; 6];
        address.copy_from_slice(&buf[..6]);
        Self::new(Address(address), buf[6] as i8, &buf[SCAN_RESULT_HEADER..])
    }
}

/// Asynchronous radio notification
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RadioEvent {
    /// An advertisement was received while scanning
    Received(ScanResult),
    /// A queued advertisement finished transmitting
    Sent,
    /// Any other driver notification, with its raw code
    Other(u8),
}

/// BLE 4 advertiser/scanner
///
/// The driver reports [`RadioEvent`]s from interrupt context through the
/// board's interrupt glue; it never calls back into application code itself.
pub trait Radio {
    /// Power up the advertising module
    fn advertising_init(&mut self) -> DriverResult<()>;

    /// Release the advertising module
    fn advertising_uninit(&mut self) -> DriverResult<()>;

    /// Request a tx power; the driver writes back the power it applied
    fn tx_power_set(&mut self, dbm: &mut i8) -> DriverResult<()>;

    /// Company identifier placed in manufacturer-specific data
    fn manufacturer_id_set(&mut self, id: u16) -> DriverResult<()>;

    /// Advertising interval
    fn tx_interval_set(&mut self, interval_ms: u32) -> DriverResult<()>;

    /// Receiver duty cycle: `window_ms` of listening every `interval_ms`,
    /// scanning ends after `timeout_ms`
    fn scan_parameters_set(&mut self, interval_ms: u32, window_ms: u32, timeout_ms: u32) -> DriverResult<()>;

    /// Start continuous advertising of the configured data
    fn advertising_start(&mut self) -> DriverResult<()>;

    /// Stop advertising; `InvalidState` when it was not active
    fn advertising_stop(&mut self) -> DriverResult<()>;

    /// Arm the receiver
    fn scan_start(&mut self) -> DriverResult<()>;

    /// Disarm the receiver; `InvalidState` when it was not active
    fn scan_stop(&mut self) -> DriverResult<()>;

    /// Source address used for the next transmissions
    fn address_set(&mut self, address: u64) -> DriverResult<()>;

    /// Transmit a raw advertisement payload unmodified
    fn send_raw(&mut self, data: &[u8]) -> DriverResult<()>;
}
