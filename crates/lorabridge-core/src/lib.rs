//! lorabridge-core - Transport contract and radio register driver
//!
//! This crate holds everything that does not depend on a particular bus
//! adapter:
//!
//! - [`transport::SpiTransport`], the capability set every bus adapter
//!   implements (CH341 USB bridge, Linux spidev, in-memory dummy)
//! - [`interrupt::InterruptWorker`], the polling thread used to emulate an
//!   interrupt line on adapters that have none
//! - [`radio::Rfm95`], the SX127x/RFM95 LoRa register driver with its
//!   parameter codecs and packet state machines
//!
//! # Example
//!
//! ```ignore
//! use lorabridge_core::radio::{RadioConfig, Rfm95};
//! use std::time::Duration;
//!
//! fn ping<T: lorabridge_core::transport::SpiTransport>(spi: T) -> lorabridge_core::Result<()> {
//!     let mut radio = Rfm95::new(spi);
//!     radio.begin()?;
//!     radio.configure(&RadioConfig::default())?;
//!     radio.send(b"Hello", false)?;
//!     let reply = radio.receive(Duration::from_secs(3), false)?;
//!     println!("got {} bytes", reply.len());
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

pub mod error;
pub mod interrupt;
pub mod radio;
pub mod transport;

pub use error::{Error, Result};
