//! Logical radio configuration

use std::fmt;

/// Physical-layer parameters applied by [`Rfm95::configure`](super::Rfm95::configure)
///
/// The chip is the only storage for these values; this struct is a snapshot
/// either about to be written or just read back.
#[derive(Debug, Clone, PartialEq)]
pub struct RadioConfig {
    /// Carrier frequency in MHz
    pub frequency_mhz: f64,
    /// Output power in dBm
    pub tx_power_dbm: i8,
    /// Use the PA_BOOST pin (2..20 dBm) instead of RFO (0..15 dBm)
    pub pa_boost: bool,
    /// Spreading factor (6..12)
    pub spreading_factor: u8,
    /// Signal bandwidth in kHz
    pub bandwidth_khz: f32,
    /// Coding rate denominator (4/5 .. 4/8)
    pub coding_rate: u8,
    /// Preamble length in symbols
    pub preamble_length: u16,
    /// LoRa sync word
    pub sync_word: u8,
}

impl Default for RadioConfig {
    fn default() -> Self {
        Self {
            frequency_mhz: 868.1,
            tx_power_dbm: 17,
            pa_boost: true,
            spreading_factor: 7,
            bandwidth_khz: 125.0,
            coding_rate: 5,
            preamble_length: 8,
            sync_word: 0x12,
        }
    }
}

impl RadioConfig {
    /// Set the carrier frequency
    pub fn with_frequency(mut self, mhz: f64) -> Self {
        self.frequency_mhz = mhz;
        self
    }

    /// Set output power and PA pin
    pub fn with_tx_power(mut self, dbm: i8, pa_boost: bool) -> Self {
        self.tx_power_dbm = dbm;
        self.pa_boost = pa_boost;
        self
    }

    /// Set the spreading factor
    pub fn with_spreading_factor(mut self, sf: u8) -> Self {
        self.spreading_factor = sf;
        self
    }

    /// Set the bandwidth
    pub fn with_bandwidth(mut self, khz: f32) -> Self {
        self.bandwidth_khz = khz;
        self
    }

    /// Set the coding rate denominator
    pub fn with_coding_rate(mut self, denominator: u8) -> Self {
        self.coding_rate = denominator;
        self
    }

    /// Set the preamble length
    pub fn with_preamble_length(mut self, symbols: u16) -> Self {
        self.preamble_length = symbols;
        self
    }

    /// Set the sync word
    pub fn with_sync_word(mut self, sync_word: u8) -> Self {
        self.sync_word = sync_word;
        self
    }
}

impl fmt::Display for RadioConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:.3} MHz, {} dBm ({}), SF{}, {} kHz, CR 4/{}, preamble {}, sync 0x{:02X}",
            self.frequency_mhz,
            self.tx_power_dbm,
            if self.pa_boost { "PA_BOOST" } else { "RFO" },
            self.spreading_factor,
            self.bandwidth_khz,
            self.coding_rate,
            self.preamble_length,
            self.sync_word
        )
    }
}
