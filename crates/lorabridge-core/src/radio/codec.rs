//! Physical-layer parameter codecs
//!
//! Pure conversions between logical radio parameters and register bit
//! fields. Kept free of bus access so they can be checked exhaustively.

use super::registers::PA_BOOST;

/// Crystal oscillator frequency in MHz
pub const FXOSC_MHZ: f64 = 32.0;
/// Synthesizer step divisor (2^19)
pub const FRF_DIVISOR: f64 = 524_288.0;
/// Frequency quantization step in MHz (about 61 Hz)
pub const FSTEP_MHZ: f64 = FXOSC_MHZ / FRF_DIVISOR;

/// Selectable LoRa bandwidths in kHz, indexed by the register code
pub const BANDWIDTHS_KHZ: [f32; 10] = [
    7.8, 10.4, 15.6, 20.8, 31.25, 41.7, 62.5, 125.0, 250.0, 500.0,
];

/// Spreading factor range
pub const SF_MIN: u8 = 6;
/// Spreading factor range
pub const SF_MAX: u8 = 12;

/// Coding rate denominator range (4/5 .. 4/8)
pub const CR_DENOM_MIN: u8 = 5;
/// Coding rate denominator range (4/5 .. 4/8)
pub const CR_DENOM_MAX: u8 = 8;

/// Output power range on the PA_BOOST pin (dBm)
pub const BOOST_POWER_RANGE: (i8, i8) = (2, 20);
/// Output power range on the RFO pin (dBm)
pub const RFO_POWER_RANGE: (i8, i8) = (0, 15);

/// Offset subtracted from the packet RSSI register (HF port)
pub const RSSI_OFFSET: i16 = 137;

/// Frequency in MHz to the 24-bit FRF register value
pub fn frf_from_mhz(freq_mhz: f64) -> u32 {
    let frf = (freq_mhz * FRF_DIVISOR / FXOSC_MHZ).round();
    frf.clamp(0.0, 0x00FF_FFFF as f64) as u32
}

/// 24-bit FRF register value to frequency in MHz
pub fn mhz_from_frf(frf: u32) -> f64 {
    (frf & 0x00FF_FFFF) as f64 * FXOSC_MHZ / FRF_DIVISOR
}

/// Split an FRF value into MSB/MID/LSB register bytes
pub fn frf_to_bytes(frf: u32) -> [u8; 3] {
    [(frf >> 16) as u8, (frf >> 8) as u8, frf as u8]
}

/// Join MSB/MID/LSB register bytes into an FRF value
pub fn frf_from_bytes(bytes: [u8; 3]) -> u32 {
    (bytes[0] as u32) << 16 | (bytes[1] as u32) << 8 | bytes[2] as u32
}

/// Index of the first table bandwidth at or above `khz`
///
/// Requests above 500 kHz saturate to the last entry.
pub fn bandwidth_index(khz: f32) -> u8 {
    BANDWIDTHS_KHZ
        .iter()
        .position(|&bw| khz <= bw)
        .unwrap_or(BANDWIDTHS_KHZ.len() - 1) as u8
}

/// Bandwidth in kHz for a register code; out-of-table codes read as 500
pub fn bandwidth_khz(index: u8) -> f32 {
    let idx = (index as usize).min(BANDWIDTHS_KHZ.len() - 1);
    BANDWIDTHS_KHZ[idx]
}

/// Clamp a spreading factor into the supported range
pub fn clamp_spreading_factor(sf: u8) -> u8 {
    sf.clamp(SF_MIN, SF_MAX)
}

/// Clamp a coding rate denominator and return the 3-bit field value
pub fn coding_rate_field(denominator: u8) -> u8 {
    denominator.clamp(CR_DENOM_MIN, CR_DENOM_MAX) - 4
}

/// Clamp an output power request and encode `REG_PA_CONFIG`
///
/// With PA_BOOST the level is stored as `level - 2` with the boost bit set,
/// otherwise it is stored as-is.
pub fn encode_tx_power(level: i8, pa_boost: bool) -> u8 {
    if pa_boost {
        let level = level.clamp(BOOST_POWER_RANGE.0, BOOST_POWER_RANGE.1);
        PA_BOOST | (level - 2) as u8
    } else {
        level.clamp(RFO_POWER_RANGE.0, RFO_POWER_RANGE.1) as u8
    }
}

/// Decode `REG_PA_CONFIG` into (dBm, PA_BOOST selected)
pub fn decode_tx_power(pa_config: u8) -> (i8, bool) {
    if pa_config & PA_BOOST != 0 {
        (((pa_config & !PA_BOOST) + 2) as i8, true)
    } else {
        ((pa_config & 0x0F) as i8, false)
    }
}

/// Packet RSSI in dBm from `REG_PKT_RSSI_VALUE`
pub fn rssi_dbm(register: u8) -> i16 {
    register as i16 - RSSI_OFFSET
}

/// Packet SNR in dB from `REG_PKT_SNR_VALUE` (two's complement, quarter dB)
pub fn snr_db(register: u8) -> f32 {
    (register as i8) as f32 * 0.25
}

/// Beacon period register value from an interval in milliseconds
///
/// The chip counts whole seconds; the remainder is dropped.
pub fn beacon_period(interval_ms: u32) -> u16 {
    (interval_ms / 1000).min(u16::MAX as u32) as u16
}
