//! lorabridge-ch341a - CH341 USB bridge transport
//!
//! The CH341 (VID 0x1A86, PID 0x5512) exposes a clocked serial bus and six
//! general purpose pins through two bulk endpoints. There is no native SPI
//! engine with chip-select: chip-select is an ordinary output pin toggled
//! with `UIO_STREAM` commands, and every clocked byte is a separate
//! `SPI_STREAM` command answered by a one byte echo.
//!
//! # Protocol Overview
//!
//! A transfer is, in this exact order:
//!
//! 1. `UIO_STREAM` with chip-select low
//! 2. for each byte to write: `[SPI_STREAM, byte]`, read and discard the echo
//! 3. for each byte to read: `[SPI_STREAM, 0xFF]`, keep the echo
//! 4. `UIO_STREAM` with chip-select high
//!
//! The bridge clocks LSB first; bytes are bit-reversed on the host only when
//! [`Ch341aConfig::lsb_first`] is set.
//!
//! # Example
//!
//! ```no_run
//! use lorabridge_ch341a::{Ch341a, Ch341aConfig};
//! use lorabridge_core::radio::Rfm95;
//!
//! let bridge = Ch341a::new(Ch341aConfig::default().with_index(0));
//! let mut radio = Rfm95::new(bridge);
//! radio.begin()?;
//! println!("version 0x{:02X}", radio.version()?);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

mod bus;
mod device;
mod error;
mod pipe;
mod protocol;

pub use device::{Ch341a, Ch341aConfig, Ch341aDeviceInfo};
pub use error::{Ch341aError, Result};
pub use pipe::{BulkPipe, UsbPipe};
pub use protocol::{CH341_USB_PRODUCT, CH341_USB_VENDOR, PIN_CS, PIN_INT};
