//! SX127x / RFM95 LoRa radio
//!
//! - [`registers`]: register map, mode codes, IRQ flags
//! - [`codec`]: pure parameter <-> bit-field conversions
//! - [`Rfm95`]: the driver, generic over any [`SpiTransport`](crate::transport::SpiTransport)

pub mod codec;
mod config;
mod driver;
pub mod registers;

pub use config::RadioConfig;
pub use driver::{Rfm95, MAX_PAYLOAD};
pub use registers::{IrqFlags, OpMode};
