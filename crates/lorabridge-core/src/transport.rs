//! Transport trait definitions
//!
//! A transport is anything that can run a chip-selected SPI transaction and
//! drive a handful of auxiliary digital pins. The radio driver only ever
//! talks to this trait, so the CH341 USB bridge, a Linux spidev node and the
//! in-memory dummy chip are interchangeable.

use std::sync::Arc;

use crate::error::Result;

/// Callback invoked when an (emulated) interrupt edge is detected
///
/// The callback runs on the transport's interrupt worker thread, not on the
/// thread that registered it.
pub type InterruptCallback = Arc<dyn Fn() + Send + Sync>;

/// Direction/pull configuration for a digital pin
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PinMode {
    /// High-impedance input
    #[default]
    Input,
    /// Push-pull output
    Output,
    /// Input with pull-up (treated as plain input where unsupported)
    InputPullUp,
}

impl PinMode {
    /// True for modes that configure the pin as an input
    pub fn is_input(self) -> bool {
        !matches!(self, PinMode::Output)
    }
}

/// SPI transport capability set
///
/// Implementations must be driven from one thread at a time: a transfer is a
/// multi-step sequence (chip-select, clocking, chip-select) and interleaving
/// two of them corrupts both. `&mut self` receivers enforce this for
/// foreground callers; implementations that run an interrupt worker must
/// serialize it against foreground transfers internally.
///
/// Pin identifiers are transport-specific: the CH341 bridge uses bit masks
/// `0x01..=0x20`, the Linux transport uses GPIO line numbers.
pub trait SpiTransport: Send {
    /// Open the underlying device and bring the bus to its idle state
    fn open(&mut self) -> Result<()>;

    /// Release the device; calling it on a closed transport is a no-op
    fn close(&mut self);

    /// Run one chip-selected transaction
    ///
    /// Clocks out `write`, then clocks in `read_len` bytes, all under a single
    /// chip-select assertion. On success the returned vector holds exactly
    /// `read_len` bytes.
    fn transfer(&mut self, write: &[u8], read_len: usize) -> Result<Vec<u8>>;

    /// Drive a pin high or low (configuring it as output)
    fn digital_write(&mut self, pin: u8, high: bool) -> Result<()>;

    /// Sample a pin (configuring it as input)
    fn digital_read(&mut self, pin: u8) -> Result<bool>;

    /// Configure the direction of a pin
    fn pin_mode(&mut self, pin: u8, mode: PinMode) -> Result<()>;

    /// Select or deselect the pin used as interrupt source
    fn configure_interrupt(&mut self, pin: u8, enable: bool) -> Result<()>;

    /// Register the callback invoked on a detected interrupt edge
    fn set_interrupt_callback(&mut self, callback: InterruptCallback) -> Result<()>;

    /// Start or stop interrupt emulation
    fn enable_interrupt(&mut self, enable: bool) -> Result<()>;

    /// True while the device is open
    fn is_active(&self) -> bool;
}

// Boxed transports so the driver can wrap one picked at runtime
impl SpiTransport for Box<dyn SpiTransport> {
    fn open(&mut self) -> Result<()> {
        (**self).open()
    }

    fn close(&mut self) {
        (**self).close()
    }

    fn transfer(&mut self, write: &[u8], read_len: usize) -> Result<Vec<u8>> {
        (**self).transfer(write, read_len)
    }

    fn digital_write(&mut self, pin: u8, high: bool) -> Result<()> {
        (**self).digital_write(pin, high)
    }

    fn digital_read(&mut self, pin: u8) -> Result<bool> {
        (**self).digital_read(pin)
    }

    fn pin_mode(&mut self, pin: u8, mode: PinMode) -> Result<()> {
        (**self).pin_mode(pin, mode)
    }

    fn configure_interrupt(&mut self, pin: u8, enable: bool) -> Result<()> {
        (**self).configure_interrupt(pin, enable)
    }

    fn set_interrupt_callback(&mut self, callback: InterruptCallback) -> Result<()> {
        (**self).set_interrupt_callback(callback)
    }

    fn enable_interrupt(&mut self, enable: bool) -> Result<()> {
        (**self).enable_interrupt(enable)
    }

    fn is_active(&self) -> bool {
        (**self).is_active()
    }
}
