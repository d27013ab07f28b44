//! SX127x / RFM95 register map (LoRa page)
//!
//! Addresses are 7 bits; bit 7 of the address byte on the wire selects a
//! write.

// Allow unused registers - they document the map and are handy in dumps.
// Register names are the documentation.
#![allow(dead_code, missing_docs)]

use bitflags::bitflags;

/// Address bit that turns an access into a write
pub const WRITE_FLAG: u8 = 0x80;
/// Mask applied to addresses for reads
pub const ADDR_MASK: u8 = 0x7F;

pub const REG_FIFO: u8 = 0x00;
pub const REG_OP_MODE: u8 = 0x01;
pub const REG_FRF_MSB: u8 = 0x06;
pub const REG_FRF_MID: u8 = 0x07;
pub const REG_FRF_LSB: u8 = 0x08;
pub const REG_PA_CONFIG: u8 = 0x09;
pub const REG_PA_RAMP: u8 = 0x0A;
pub const REG_OCP: u8 = 0x0B;
pub const REG_LNA: u8 = 0x0C;
pub const REG_FIFO_ADDR_PTR: u8 = 0x0D;
pub const REG_FIFO_TX_BASE_ADDR: u8 = 0x0E;
pub const REG_FIFO_RX_BASE_ADDR: u8 = 0x0F;
pub const REG_FIFO_RX_CURRENT_ADDR: u8 = 0x10;
pub const REG_IRQ_FLAGS_MASK: u8 = 0x11;
pub const REG_IRQ_FLAGS: u8 = 0x12;
pub const REG_RX_NB_BYTES: u8 = 0x13;
pub const REG_PKT_SNR_VALUE: u8 = 0x19;
pub const REG_PKT_RSSI_VALUE: u8 = 0x1A;
pub const REG_MODEM_CONFIG_1: u8 = 0x1D;
pub const REG_MODEM_CONFIG_2: u8 = 0x1E;
pub const REG_PREAMBLE_MSB: u8 = 0x20;
pub const REG_PREAMBLE_LSB: u8 = 0x21;
pub const REG_PAYLOAD_LENGTH: u8 = 0x22;
/// Beacon period, high byte (seconds)
pub const REG_BEACON_PERIOD_MSB: u8 = 0x24;
/// Beacon period, low byte (seconds)
pub const REG_BEACON_PERIOD_LSB: u8 = 0x25;
pub const REG_MODEM_CONFIG_3: u8 = 0x26;
pub const REG_FREQ_ERROR_MSB: u8 = 0x28;
pub const REG_FREQ_ERROR_MID: u8 = 0x29;
pub const REG_FREQ_ERROR_LSB: u8 = 0x2A;
pub const REG_RSSI_WIDEBAND: u8 = 0x2C;
pub const REG_DETECTION_OPTIMIZE: u8 = 0x31;
pub const REG_INVERTIQ: u8 = 0x33;
pub const REG_DETECTION_THRESHOLD: u8 = 0x37;
pub const REG_SYNC_WORD: u8 = 0x39;
pub const REG_INVERTIQ2: u8 = 0x3B;
pub const REG_DIO_MAPPING_1: u8 = 0x40;
pub const REG_DIO_MAPPING_2: u8 = 0x41;
pub const REG_VERSION: u8 = 0x42;
pub const REG_PA_DAC: u8 = 0x4D;

// FSK page registers used by the temperature sensor
/// Temperature calibration offset (FSK page, shares 0x3B with InvertIQ2)
pub const REG_FSK_TEMP_CAL: u8 = 0x3B;
/// Raw temperature reading (FSK page)
pub const REG_FSK_TEMP: u8 = 0x3C;

/// Expected content of `REG_VERSION`
pub const CHIP_VERSION: u8 = 0x12;

/// `REG_OP_MODE` bit selecting LoRa (vs FSK/OOK)
pub const LONG_RANGE_MODE: u8 = 0x80;
/// `REG_OP_MODE` bits holding the mode
pub const MODE_MASK: u8 = 0x07;

/// `REG_PA_CONFIG` bit selecting the PA_BOOST output
pub const PA_BOOST: u8 = 0x80;

/// `REG_MODEM_CONFIG_3` automatic gain control bit
pub const AGC_AUTO_ON: u8 = 0x04;
/// `REG_LNA` boost bits (LnaBoostHf)
pub const LNA_BOOST_HF: u8 = 0x03;
/// `REG_LNA` value used at init and in receive mode (G1, boost on)
pub const LNA_DEFAULT: u8 = 0x23;

/// `REG_INVERTIQ` bit reporting inverted RX IQ
pub const INVERTIQ_RX: u8 = 0x40;
/// `REG_INVERTIQ` / `REG_INVERTIQ2` pairs for normal and inverted IQ
pub const IQ_NORMAL: (u8, u8) = (0x27, 0x1D);
pub const IQ_INVERTED: (u8, u8) = (0x66, 0x19);

/// Detection optimize / threshold pair for SF6
pub const DETECTION_SF6: (u8, u8) = (0xC5, 0x0C);
/// Detection optimize / threshold pair for SF7..SF12
pub const DETECTION_SF7_12: (u8, u8) = (0xC3, 0x0A);

/// DIO mapping codes (2-bit fields in the top bits of the mapping registers)
pub const DIO0_RX_DONE: u8 = 0b00;
pub const DIO0_TX_DONE: u8 = 0b01;
pub const DIO4_TX: u8 = 0b01;
pub const DIO4_RX: u8 = 0b11;

/// Operating mode field of `REG_OP_MODE`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpMode {
    /// Sleep
    Sleep = 0,
    /// Standby
    Standby = 1,
    /// Frequency synthesis TX
    FsTx = 2,
    /// Transmit
    Transmit = 3,
    /// Frequency synthesis RX
    FsRx = 4,
    /// Continuous receive
    RxContinuous = 5,
    /// Single receive
    RxSingle = 6,
    /// Channel activity detection
    Cad = 7,
}

impl OpMode {
    /// Decode the low three bits of `REG_OP_MODE`
    pub fn from_bits(bits: u8) -> Self {
        match bits & MODE_MASK {
            0 => OpMode::Sleep,
            1 => OpMode::Standby,
            2 => OpMode::FsTx,
            3 => OpMode::Transmit,
            4 => OpMode::FsRx,
            5 => OpMode::RxContinuous,
            6 => OpMode::RxSingle,
            _ => OpMode::Cad,
        }
    }

    /// Raw mode bits
    pub fn bits(self) -> u8 {
        self as u8
    }
}

impl std::fmt::Display for OpMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            OpMode::Sleep => "sleep",
            OpMode::Standby => "standby",
            OpMode::FsTx => "fs-tx",
            OpMode::Transmit => "tx",
            OpMode::FsRx => "fs-rx",
            OpMode::RxContinuous => "rx-continuous",
            OpMode::RxSingle => "rx-single",
            OpMode::Cad => "cad",
        };
        f.write_str(name)
    }
}

bitflags! {
    /// Latched event flags in `REG_IRQ_FLAGS`
    ///
    /// Flags are cleared by writing 1 to them; reading never clears.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct IrqFlags: u8 {
        /// RX timeout (single receive)
        const RX_TIMEOUT     = 0x80;
        /// Packet reception complete
        const RX_DONE        = 0x40;
        /// Payload CRC check failed
        const CRC_ERROR      = 0x20;
        /// Valid header received
        const VALID_HEADER   = 0x10;
        /// Transmission complete
        const TX_DONE        = 0x08;
        /// CAD complete
        const CAD_DONE       = 0x04;
        /// FHSS channel change
        const FHSS_CHANGE    = 0x02;
        /// Activity detected during CAD
        const CAD_DETECTED   = 0x01;
    }
}

/// Registers shown by `Rfm95::register_dump`
pub const DUMP_REGISTERS: &[(&str, u8)] = &[
    ("OP_MODE", REG_OP_MODE),
    ("FRF_MSB", REG_FRF_MSB),
    ("FRF_MID", REG_FRF_MID),
    ("FRF_LSB", REG_FRF_LSB),
    ("PA_CONFIG", REG_PA_CONFIG),
    ("LNA", REG_LNA),
    ("IRQ_FLAGS", REG_IRQ_FLAGS),
    ("MODEM_CONFIG_1", REG_MODEM_CONFIG_1),
    ("MODEM_CONFIG_2", REG_MODEM_CONFIG_2),
    ("MODEM_CONFIG_3", REG_MODEM_CONFIG_3),
    ("PREAMBLE_MSB", REG_PREAMBLE_MSB),
    ("PREAMBLE_LSB", REG_PREAMBLE_LSB),
    ("SYNC_WORD", REG_SYNC_WORD),
    ("DIO_MAPPING_1", REG_DIO_MAPPING_1),
    ("DIO_MAPPING_2", REG_DIO_MAPPING_2),
    ("VERSION", REG_VERSION),
];
