//! lorabridge - Drive an RFM95/SX127x LoRa transceiver from a host
//!
//! The radio sits behind an SPI bus reached either through a CH341 USB
//! bridge or a Linux spidev device.
//!
//! # Architecture
//!
//! Every transport implements `lorabridge_core::transport::SpiTransport`;
//! the register-level driver `Rfm95` is generic over it, so the commands
//! below run unchanged over:
//! - **ch341a** - CH341 in its UIO/SPI stream mode, interrupts emulated by
//!   polling the INT# input
//! - **linux_spi** - spidev plus GPIO character device lines
//! - **dummy** - an in-memory emulation of the chip

mod cli;
mod commands;
mod transports;

use clap::Parser;
use cli::{Cli, Commands};
use lorabridge_core::radio::Rfm95;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logger
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    // Set log level based on verbosity
    match cli.verbose {
        0 => {} // default (info)
        1 => log::set_max_level(log::LevelFilter::Debug),
        _ => log::set_max_level(log::LevelFilter::Trace),
    }

    // Commands that never touch the radio
    match &cli.command {
        Commands::ListTransports => {
            commands::list_transports();
            return Ok(());
        }
        Commands::ListDevices => return commands::list_devices(),
        _ => {}
    }

    let transport = transports::open_transport(&cli.transport)?;
    let mut radio = Rfm95::new(transport);
    radio
        .begin()
        .map_err(|e| format!("Failed to start radio on {}: {}", cli.transport, e))?;

    let config = cli.radio.to_config();
    radio.configure(&config)?;
    log::info!("Radio configured: {}", config);

    let invert_iq = cli.radio.invert_iq;
    let result = match cli.command {
        Commands::Tx { message } => commands::tx::run(&mut radio, message.as_bytes(), invert_iq),
        Commands::Rx { timeout, count } => commands::rx::run(&mut radio, timeout, count, invert_iq),
        Commands::Info => commands::info::run(&mut radio),
        Commands::Beacon {
            interval_ms,
            message,
        } => commands::beacon::run_start(&mut radio, message.as_bytes(), interval_ms),
        Commands::BeaconStop => commands::beacon::run_stop(&mut radio),
        Commands::ListTransports | Commands::ListDevices => Ok(()),
    };

    radio.end();
    result
}
