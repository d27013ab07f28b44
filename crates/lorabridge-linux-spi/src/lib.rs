//! lorabridge-linux-spi - Linux spidev transport
//!
//! Transfers go through a `/dev/spidevX.Y` character device, which handles
//! chip-select in the kernel. Auxiliary pins (reset, DIO0) are lines on a
//! GPIO character device (`/dev/gpiochipN`), requested through gpiocdev.
//!
//! # Example
//!
//! ```no_run
//! use lorabridge_linux_spi::{LinuxSpi, LinuxSpiConfig};
//! use lorabridge_core::radio::Rfm95;
//!
//! let config = LinuxSpiConfig::new("/dev/spidev0.0")
//!     .with_speed(1_000_000)
//!     .with_mode(0);
//! let mut radio = Rfm95::new(LinuxSpi::new(config));
//! radio.begin()?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! # Usage with the lorabridge CLI
//!
//! ```bash
//! lorabridge -t linux_spi:dev=/dev/spidev0.0 info
//! lorabridge -t linux_spi:dev=/dev/spidev0.1,spispeed=500,mode=0,gpiochip=1 rx
//! ```
//!
//! # System Requirements
//!
//! - Kernel with `CONFIG_SPI_SPIDEV` and `CONFIG_GPIO_CDEV`
//! - Read/write access to the spidev and gpiochip nodes

pub mod device;
pub mod error;
pub mod gpio;

pub use device::{mode, parse_options, LinuxSpi, LinuxSpiConfig};
pub use error::{LinuxSpiError, Result};
pub use gpio::{GpioLines, LineSetting, DEFAULT_GPIO_CHIP};
