//! CLI argument parsing

use clap::{Args, Parser, Subcommand};
use lorabridge_core::radio::RadioConfig;
use std::time::Duration;

/// Parse a string as a hex or decimal u8
fn parse_hex_u8(s: &str) -> Result<u8, String> {
    if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        u8::from_str_radix(hex, 16).map_err(|e| format!("Invalid hex value: {}", e))
    } else {
        s.parse::<u8>().map_err(|e| format!("Invalid number: {}", e))
    }
}

/// Parse a receive timeout in (fractional) seconds
fn parse_timeout(s: &str) -> Result<Duration, String> {
    let secs: f64 = s
        .parse()
        .map_err(|e| format!("Invalid timeout: {}", e))?;
    Duration::try_from_secs_f64(secs).map_err(|e| format!("Invalid timeout {}: {}", s, e))
}

const TRANSPORT_HELP: &str = "Transport to use: ch341a[:index=N,lsb=0|1], \
    linux_spi:dev=/dev/spidevX.Y[,spispeed=<kHz>,mode=<0-3>,gpiochip=<n>], dummy[:rx=<text>]";

#[derive(Parser)]
#[command(name = "lorabridge")]
#[command(author, version, about = "RFM95/SX127x LoRa radio over a USB or spidev bridge", long_about = None)]
pub struct Cli {
    /// Verbosity level (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[arg(short, long, global = true, default_value = "ch341a", help = TRANSPORT_HELP)]
    pub transport: String,

    #[command(flatten)]
    pub radio: RadioArgs,

    #[command(subcommand)]
    pub command: Commands,
}

/// Physical-layer options shared by every radio command
#[derive(Args, Debug, Clone)]
pub struct RadioArgs {
    /// Carrier frequency in MHz
    #[arg(long = "freq", global = true, default_value_t = 868.1)]
    pub frequency: f64,

    /// Output power in dBm
    #[arg(long, global = true, default_value_t = 17, allow_negative_numbers = true)]
    pub power: i8,

    /// Transmit on the RFO pin instead of PA_BOOST
    #[arg(long, global = true)]
    pub no_pa_boost: bool,

    /// Spreading factor (6-12)
    #[arg(long = "sf", global = true, default_value_t = 7)]
    pub spreading_factor: u8,

    /// Signal bandwidth in kHz
    #[arg(long = "bw", global = true, default_value_t = 125.0)]
    pub bandwidth: f32,

    /// Coding rate denominator (5-8 for 4/5 .. 4/8)
    #[arg(long = "cr", global = true, default_value_t = 5)]
    pub coding_rate: u8,

    /// Preamble length in symbols
    #[arg(long, global = true, default_value_t = 8)]
    pub preamble: u16,

    /// Sync word (hex or decimal)
    #[arg(long, global = true, default_value = "0x12", value_parser = parse_hex_u8)]
    pub sync_word: u8,

    /// Invert I/Q for transmit and receive
    #[arg(long, global = true)]
    pub invert_iq: bool,
}

impl RadioArgs {
    /// Fold the options into a radio configuration
    pub fn to_config(&self) -> RadioConfig {
        RadioConfig::default()
            .with_frequency(self.frequency)
            .with_tx_power(self.power, !self.no_pa_boost)
            .with_spreading_factor(self.spreading_factor)
            .with_bandwidth(self.bandwidth)
            .with_coding_rate(self.coding_rate)
            .with_preamble_length(self.preamble)
            .with_sync_word(self.sync_word)
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Transmit one packet
    Tx {
        /// Payload text
        message: String,
    },

    /// Receive packets and print them
    Rx {
        /// Seconds to wait for each packet
        #[arg(long, default_value = "10", value_parser = parse_timeout)]
        timeout: Duration,

        /// Stop after this many packets (or at the first timeout)
        #[arg(long)]
        count: Option<usize>,
    },

    /// Show radio state, registers and temperature
    Info,

    /// Start the hardware beacon
    Beacon {
        /// Beacon period in milliseconds
        #[arg(long, default_value_t = 5000)]
        interval_ms: u32,

        /// Payload text
        message: String,
    },

    /// Stop the hardware beacon
    BeaconStop,

    /// List supported transports
    ListTransports,

    /// List attached CH341 bridges
    ListDevices,
}
