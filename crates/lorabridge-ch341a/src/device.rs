//! CH341 device implementation
//!
//! [`Ch341a`] owns the bus session behind a mutex shared with the interrupt
//! worker, so a sampled INT# read can never land in the middle of a
//! chip-selected transfer.

use std::sync::Arc;
use std::time::Duration;

use lorabridge_core::interrupt::{Edge, InterruptWorker, DEFAULT_POLL_INTERVAL};
use lorabridge_core::transport::{InterruptCallback, PinMode, SpiTransport};
use lorabridge_core::{Error as CoreError, Result as CoreResult};
use parking_lot::Mutex;

use crate::bus::BusSession;
use crate::error::{Ch341aError, Result};
use crate::pipe::{matching_devices, UsbPipe};
use crate::protocol::*;

type SharedSession = Arc<Mutex<Option<BusSession<UsbPipe>>>>;

/// CH341 bridge configuration
#[derive(Debug, Clone)]
pub struct Ch341aConfig {
    /// Which attached CH341 to use (0-based enumeration order)
    pub index: usize,
    /// Bit-reverse every byte on the host side
    pub lsb_first: bool,
    /// Timeout for a single bulk transfer
    pub timeout: Duration,
}

impl Default for Ch341aConfig {
    fn default() -> Self {
        Self {
            index: 0,
            lsb_first: false,
            timeout: USB_TIMEOUT,
        }
    }
}

impl Ch341aConfig {
    /// Select the device ordinal
    pub fn with_index(mut self, index: usize) -> Self {
        self.index = index;
        self
    }

    /// Set the host-side bit order
    pub fn with_lsb_first(mut self, lsb_first: bool) -> Self {
        self.lsb_first = lsb_first;
        self
    }

    /// Set the bulk transfer timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Information about an attached CH341
#[derive(Debug, Clone)]
pub struct Ch341aDeviceInfo {
    /// Enumeration ordinal, usable as `index`
    pub index: usize,
    /// Platform bus identifier
    pub bus: String,
    /// USB device address
    pub address: u8,
}

impl std::fmt::Display for Ch341aDeviceInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "CH341 #{} at bus {} address {}",
            self.index, self.bus, self.address
        )
    }
}

/// CH341 USB bridge transport
pub struct Ch341a {
    config: Ch341aConfig,
    session: SharedSession,
    irq_pin: u8,
    callback: Option<InterruptCallback>,
    worker: Option<InterruptWorker>,
}

impl Ch341a {
    /// Create a closed transport; [`SpiTransport::open`] claims the device
    pub fn new(config: Ch341aConfig) -> Self {
        Self {
            config,
            session: Arc::new(Mutex::new(None)),
            irq_pin: PIN_INT,
            callback: None,
            worker: None,
        }
    }

    /// List attached CH341 devices
    pub fn list_devices() -> Result<Vec<Ch341aDeviceInfo>> {
        Ok(matching_devices()?
            .iter()
            .enumerate()
            .map(|(index, d)| Ch341aDeviceInfo {
                index,
                bus: d.bus_id().to_string(),
                address: d.device_address(),
            })
            .collect())
    }

    /// Active configuration
    pub fn config(&self) -> &Ch341aConfig {
        &self.config
    }

    fn open_session(&mut self) -> Result<()> {
        let mut guard = self.session.lock();
        if guard.is_some() {
            return Ok(());
        }

        let pipe = UsbPipe::open(self.config.index, self.config.timeout)?;
        *guard = Some(BusSession::started(pipe, self.config.lsb_first)?);

        log::info!("CH341 #{} ready", self.config.index);
        Ok(())
    }

    fn with_session<R>(
        &self,
        f: impl FnOnce(&mut BusSession<UsbPipe>) -> Result<R>,
    ) -> Result<R> {
        let mut guard = self.session.lock();
        let session = guard.as_mut().ok_or(Ch341aError::NotOpen)?;
        f(session)
    }

    fn stop_worker(&mut self) {
        if let Some(mut worker) = self.worker.take() {
            worker.stop();
        }
    }
}

impl SpiTransport for Ch341a {
    fn open(&mut self) -> CoreResult<()> {
        Ok(self.open_session()?)
    }

    fn close(&mut self) {
        // The worker locks the session; stop it before tearing down
        self.stop_worker();

        if let Some(mut session) = self.session.lock().take() {
            if let Err(e) = session.shutdown() {
                log::warn!("Failed to disable pins on close: {}", e);
            }
            log::info!("CH341 #{} closed", self.config.index);
        }
    }

    fn transfer(&mut self, write: &[u8], read_len: usize) -> CoreResult<Vec<u8>> {
        Ok(self.with_session(|s| s.transfer(write, read_len))?)
    }

    fn digital_write(&mut self, pin: u8, high: bool) -> CoreResult<()> {
        Ok(self.with_session(|s| s.digital_write(pin, high))?)
    }

    fn digital_read(&mut self, pin: u8) -> CoreResult<bool> {
        Ok(self.with_session(|s| s.digital_read(pin))?)
    }

    fn pin_mode(&mut self, pin: u8, mode: PinMode) -> CoreResult<()> {
        Ok(self.with_session(|s| s.pin_mode(pin, mode))?)
    }

    fn configure_interrupt(&mut self, pin: u8, enable: bool) -> CoreResult<()> {
        if pin == 0 {
            return Err(CoreError::InvalidPin(pin));
        }
        if enable {
            self.irq_pin = pin;
        } else if self.irq_pin == pin {
            self.stop_worker();
            self.irq_pin = PIN_INT;
        }
        Ok(())
    }

    fn set_interrupt_callback(&mut self, callback: InterruptCallback) -> CoreResult<()> {
        self.callback = Some(callback);
        Ok(())
    }

    fn enable_interrupt(&mut self, enable: bool) -> CoreResult<()> {
        self.stop_worker();
        if !enable {
            return Ok(());
        }

        let callback = self
            .callback
            .clone()
            .ok_or(CoreError::InterruptUnsupported("no callback registered"))?;
        if self.session.lock().is_none() {
            return Err(CoreError::NotOpen);
        }

        let session = Arc::clone(&self.session);
        let pin = self.irq_pin;
        let sample = move || -> CoreResult<bool> {
            let mut guard = session.lock();
            let s = guard.as_mut().ok_or(CoreError::NotOpen)?;
            Ok(s.read_input()? & pin != 0)
        };

        // INT# is active low
        self.worker = Some(InterruptWorker::spawn(
            sample,
            Edge::Falling,
            DEFAULT_POLL_INTERVAL,
            callback,
        )?);
        Ok(())
    }

    fn is_active(&self) -> bool {
        self.session.lock().is_some()
    }
}

impl Drop for Ch341a {
    fn drop(&mut self) {
        self.close();
    }
}
