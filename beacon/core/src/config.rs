//! Static application and board configuration

use log::LevelFilter;

/// Firmware version string written to the NFC record
#[cfg(debug_assertions)]
pub const FW_VERSION: &str = "Beacon relay 0.1.3-DEBUG";
/// Firmware version string written to the NFC record
#[cfg(not(debug_assertions))]
pub const FW_VERSION: &str = "Beacon relay 0.1.3";

/// Advertising interval
pub const ADVERTISING_INTERVAL_MS: u32 = 100;
/// Scan interval
pub const SCAN_INTERVAL_MS: u32 = 3500;
/// Scan window, equal to the interval for continuous listening
pub const SCAN_WINDOW_MS: u32 = SCAN_INTERVAL_MS;
/// Scan timeout
pub const SCAN_TIMEOUT_MS: u32 = 3 * SCAN_INTERVAL_MS;

/// Pending events the scheduler can hold
pub const TASK_QUEUE_MAX_LENGTH: usize = 16;
/// Bytes reserved per queued event; must fit an advertisement plus its sender
pub const TASK_DATA_MAX_SIZE: usize = 64;
/// Software timer instances, allocated statically
pub const TIMER_MAX_INSTANCES: usize = 10;

/// Watchdog interval
#[cfg(debug_assertions)]
pub const WATCHDOG_INTERVAL_MS: u32 = 1_200_000;
/// Watchdog interval
#[cfg(not(debug_assertions))]
pub const WATCHDOG_INTERVAL_MS: u32 = 30_000;

/// Minimum time between battery samples
pub const ADC_SAMPLE_INTERVAL_MS: u32 = 3000;
/// Time between MCU temperature samples
pub const ENVIRONMENTAL_SAMPLE_INTERVAL_MS: u32 = 10_000;
/// Requested ADC resolution in bits
pub const ADC_RESOLUTION_BITS: u8 = 10;
/// Requested DSP parameter for the ADC
pub const ADC_DSP_PARAMETER: u8 = 1;

/// Longest NFC text record
pub const NFC_TEXT_BUFFER_SIZE: usize = 32;

/// Time the status-OK LED stays lit after a clean boot
pub const STATUS_OK_DISPLAY_MS: u32 = 1000;
/// Settling delay after the MCU self-tests
pub const SELF_TEST_SETTLE_MS: u32 = 1000;

/// Per-module enable flags
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Modules {
    pub adc: bool,
    pub environmental_mcu: bool,
    pub advertising: bool,
    pub nfc: bool,
    pub gpio: bool,
    pub power: bool,
    pub watchdog: bool,
    pub low_power_yield: bool,
    pub self_tests: bool,
}

impl Modules {
    /// Module selection of the relay firmware
    pub const DEFAULT: Self = Self {
        adc: true,
        environmental_mcu: true,
        advertising: true,
        nfc: true,
        gpio: true,
        power: true,
        watchdog: true,
        low_power_yield: true,
        self_tests: false,
    };
}

impl Default for Modules {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Board constants consumed as static configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoardConfig {
    pub name: &'static str,
    /// Bluetooth SIG company identifier
    pub manufacturer_id: u16,
    pub tx_power_max_dbm: i8,
    pub nfc_installed: bool,
    pub leds_active_low: bool,
}

impl BoardConfig {
    /// Reference sensor-tag board
    pub const DEFAULT: Self = Self {
        name: "beacon-tag",
        manufacturer_id: 0x0499,
        tx_power_max_dbm: 4,
        nfc_installed: true,
        leds_active_low: true,
    };
}

impl Default for BoardConfig {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Application configuration gathered from the compile-time constants
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub fw_version: &'static str,
    pub advertising_interval_ms: u32,
    pub advertising_power_dbm: i8,
    pub scan_interval_ms: u32,
    pub scan_window_ms: u32,
    pub scan_timeout_ms: u32,
    pub adc_sample_interval_ms: u32,
    pub environmental_sample_interval_ms: u32,
    pub watchdog_interval_ms: u32,
    pub status_ok_display_ms: u32,
    pub self_test_settle_ms: u32,
    pub log_level: LevelFilter,
    pub modules: Modules,
    pub board: BoardConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        let board = BoardConfig::DEFAULT;
        Self {
            fw_version: FW_VERSION,
            advertising_interval_ms: ADVERTISING_INTERVAL_MS,
            advertising_power_dbm: board.tx_power_max_dbm,
            scan_interval_ms: SCAN_INTERVAL_MS,
            scan_window_ms: SCAN_WINDOW_MS,
            scan_timeout_ms: SCAN_TIMEOUT_MS,
            adc_sample_interval_ms: ADC_SAMPLE_INTERVAL_MS,
            environmental_sample_interval_ms: ENVIRONMENTAL_SAMPLE_INTERVAL_MS,
            watchdog_interval_ms: WATCHDOG_INTERVAL_MS,
            status_ok_display_ms: STATUS_OK_DISPLAY_MS,
            self_test_settle_ms: SELF_TEST_SETTLE_MS,
            log_level: LevelFilter::Info,
            modules: Modules::DEFAULT,
            board,
        }
    }
}

impl AppConfig {
    /// Creates a new configuration builder.
    pub fn builder() -> AppConfigBuilder {
        AppConfigBuilder::default()
    }

    /// NFC is only brought up when enabled and fitted on the board.
    pub fn nfc_enabled(&self) -> bool {
        self.modules.nfc && self.board.nfc_installed
    }
}

/// Builder for ergonomic configuration construction.
#[derive(Debug, Clone, Default)]
pub struct AppConfigBuilder {
    config: AppConfig,
}

impl AppConfigBuilder {
    /// Sets the board constants; tx power follows the board maximum.
    pub fn board(mut self, board: BoardConfig) -> Self {
        self.config.board = board;
        self.config.advertising_power_dbm = board.tx_power_max_dbm;
        self
    }

    /// Sets the advertising interval.
    pub fn advertising_interval_ms(mut self, interval: u32) -> Self {
        self.config.advertising_interval_ms = interval;
        self
    }

    /// Sets the advertising tx power.
    pub fn advertising_power_dbm(mut self, dbm: i8) -> Self {
        self.config.advertising_power_dbm = dbm;
        self
    }

    /// Sets the scan interval; window and timeout follow it.
    pub fn scan_interval_ms(mut self, interval: u32) -> Self {
        self.config.scan_interval_ms = interval;
        self.config.scan_window_ms = interval;
        self.config.scan_timeout_ms = 3 * interval;
        self
    }

    /// Sets the battery sampling interval.
    pub fn adc_sample_interval_ms(mut self, interval: u32) -> Self {
        self.config.adc_sample_interval_ms = interval;
        self
    }

    /// Sets the MCU temperature sampling interval.
    pub fn environmental_sample_interval_ms(mut self, interval: u32) -> Self {
        self.config.environmental_sample_interval_ms = interval;
        self
    }

    /// Sets the watchdog interval.
    pub fn watchdog_interval_ms(mut self, interval: u32) -> Self {
        self.config.watchdog_interval_ms = interval;
        self
    }

    /// Sets the boot-time delays (status LED and self-test settling).
    pub fn boot_delays_ms(mut self, status_ok: u32, self_test_settle: u32) -> Self {
        self.config.status_ok_display_ms = status_ok;
        self.config.self_test_settle_ms = self_test_settle;
        self
    }

    /// Sets the log level.
    pub fn log_level(mut self, level: LevelFilter) -> Self {
        self.config.log_level = level;
        self
    }

    /// Sets the module enable flags.
    pub fn modules(mut self, modules: Modules) -> Self {
        self.config.modules = modules;
        self
    }

    /// Builds the configuration.
    pub fn build(self) -> AppConfig {
        self.config
    }
}
