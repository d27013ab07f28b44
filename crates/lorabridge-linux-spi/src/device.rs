//! Linux SPI device implementation
//!
//! This module provides the `LinuxSpi` struct that implements the
//! `SpiTransport` trait using Linux's spidev interface for transfers and
//! GPIO character device lines for the auxiliary pins.

use crate::error::{LinuxSpiError, Result};
use crate::gpio::{self, GpioLines, LineSetting, DEFAULT_GPIO_CHIP};

use lorabridge_core::interrupt::{Edge, InterruptWorker, DEFAULT_POLL_INTERVAL};
use lorabridge_core::transport::{InterruptCallback, PinMode, SpiTransport};
use lorabridge_core::{Error as CoreError, Result as CoreResult};

use std::fs::{File, OpenOptions};
use std::os::unix::io::AsRawFd;

/// Default SPI clock speed in Hz (1 MHz)
const DEFAULT_SPEED_HZ: u32 = 1_000_000;

/// SPI mode constants
pub mod mode {
    /// SPI mode 0: CPOL=0, CPHA=0
    pub const MODE_0: u8 = 0;
    /// SPI mode 1: CPOL=0, CPHA=1
    pub const MODE_1: u8 = 1;
    /// SPI mode 2: CPOL=1, CPHA=0
    pub const MODE_2: u8 = 2;
    /// SPI mode 3: CPOL=1, CPHA=1
    pub const MODE_3: u8 = 3;
}

/// Linux spidev ioctl constants
mod ioctl {
    use nix::ioctl_write_ptr;

    const SPI_IOC_MAGIC: u8 = b'k';

    const SPI_IOC_TYPE_MODE: u8 = 1;
    const SPI_IOC_TYPE_BITS_PER_WORD: u8 = 3;
    const SPI_IOC_TYPE_MAX_SPEED_HZ: u8 = 4;

    ioctl_write_ptr!(spi_ioc_wr_mode, SPI_IOC_MAGIC, SPI_IOC_TYPE_MODE, u8);
    ioctl_write_ptr!(
        spi_ioc_wr_bits_per_word,
        SPI_IOC_MAGIC,
        SPI_IOC_TYPE_BITS_PER_WORD,
        u8
    );
    ioctl_write_ptr!(
        spi_ioc_wr_max_speed_hz,
        SPI_IOC_MAGIC,
        SPI_IOC_TYPE_MAX_SPEED_HZ,
        u32
    );

    /// Size of struct spi_ioc_transfer
    pub const SPI_IOC_TRANSFER_SIZE: usize = 32;

    /// SPI_IOC_MESSAGE(n) = _IOW(SPI_IOC_MAGIC, 0, char[n * 32])
    pub fn spi_ioc_message(n: u8) -> libc::c_ulong {
        let size = (n as usize) * SPI_IOC_TRANSFER_SIZE;
        ((1u32 << 30) | ((size as u32) << 16) | ((SPI_IOC_MAGIC as u32) << 8)) as libc::c_ulong
    }
}

/// SPI transfer structure for ioctl
/// This must match the kernel's struct spi_ioc_transfer layout
#[repr(C)]
#[derive(Debug, Default, Clone)]
struct SpiIocTransfer {
    tx_buf: u64,
    rx_buf: u64,
    len: u32,
    speed_hz: u32,
    delay_usecs: u16,
    bits_per_word: u8,
    cs_change: u8,
    tx_nbits: u8,
    rx_nbits: u8,
    word_delay_usecs: u8,
    _pad: u8,
}

impl SpiIocTransfer {
    fn segment(tx: Option<&[u8]>, rx: Option<&mut [u8]>, speed_hz: u32) -> Self {
        let (tx_buf, tx_len) = tx.map_or((0, 0), |b| (b.as_ptr() as u64, b.len()));
        let (rx_buf, rx_len) = rx.map_or((0, 0), |b| (b.as_mut_ptr() as u64, b.len()));
        Self {
            tx_buf,
            rx_buf,
            len: tx_len.max(rx_len) as u32,
            speed_hz,
            bits_per_word: 8,
            ..Default::default()
        }
    }
}

/// Configuration for opening a Linux SPI device
#[derive(Debug, Clone)]
pub struct LinuxSpiConfig {
    /// Device path (e.g., "/dev/spidev0.0")
    pub device: String,
    /// SPI clock speed in Hz (default: 1 MHz)
    pub speed_hz: u32,
    /// SPI mode (0-3, default: 0)
    pub mode: u8,
    /// GPIO chip holding the auxiliary lines (default: /dev/gpiochip0)
    pub gpiochip: String,
}

impl Default for LinuxSpiConfig {
    fn default() -> Self {
        Self {
            device: String::new(),
            speed_hz: DEFAULT_SPEED_HZ,
            mode: mode::MODE_0,
            gpiochip: DEFAULT_GPIO_CHIP.to_string(),
        }
    }
}

impl LinuxSpiConfig {
    /// Create a new configuration with the given device path
    pub fn new(device: impl Into<String>) -> Self {
        Self {
            device: device.into(),
            ..Default::default()
        }
    }

    /// Set the SPI clock speed in Hz
    pub fn with_speed(mut self, speed_hz: u32) -> Self {
        self.speed_hz = speed_hz;
        self
    }

    /// Set the SPI mode (0-3)
    pub fn with_mode(mut self, mode: u8) -> Self {
        self.mode = mode;
        self
    }

    /// Set the GPIO chip used for digital pins and the interrupt line
    pub fn with_gpio_chip(mut self, chip: impl Into<String>) -> Self {
        self.gpiochip = chip.into();
        self
    }
}

/// spidev transport with GPIO character device pins
pub struct LinuxSpi {
    config: LinuxSpiConfig,
    /// File handle for spidev device, present while open
    file: Option<File>,
    gpio: GpioLines,
    irq_pin: Option<u8>,
    callback: Option<InterruptCallback>,
    worker: Option<InterruptWorker>,
}

impl LinuxSpi {
    /// Create a closed transport
    pub fn new(config: LinuxSpiConfig) -> Self {
        let gpio = GpioLines::new(config.gpiochip.clone());
        Self {
            config,
            file: None,
            gpio,
            irq_pin: None,
            callback: None,
            worker: None,
        }
    }

    /// Active configuration
    pub fn config(&self) -> &LinuxSpiConfig {
        &self.config
    }

    fn open_device_file(&mut self) -> Result<()> {
        if self.file.is_some() {
            return Ok(());
        }
        let config = &self.config;
        if config.device.is_empty() {
            return Err(LinuxSpiError::NoDevice);
        }

        log::debug!("linux_spi: Opening device {}", config.device);

        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .open(&config.device)
            .map_err(|e| LinuxSpiError::OpenFailed {
                path: config.device.clone(),
                source: e,
            })?;

        let fd = file.as_raw_fd();

        let mode = config.mode;
        unsafe {
            ioctl::spi_ioc_wr_mode(fd, &mode).map_err(|e| LinuxSpiError::SetModeFailed {
                mode,
                source: std::io::Error::from_raw_os_error(e as i32),
            })?;
        }

        let bits: u8 = 8;
        unsafe {
            ioctl::spi_ioc_wr_bits_per_word(fd, &bits).map_err(|e| {
                LinuxSpiError::SetBitsPerWordFailed {
                    bits,
                    source: std::io::Error::from_raw_os_error(e as i32),
                }
            })?;
        }

        let speed = config.speed_hz;
        unsafe {
            ioctl::spi_ioc_wr_max_speed_hz(fd, &speed).map_err(|e| {
                LinuxSpiError::SetSpeedFailed {
                    speed,
                    source: std::io::Error::from_raw_os_error(e as i32),
                }
            })?;
        }

        log::info!(
            "linux_spi: Opened {} (mode={}, speed={} kHz)",
            config.device,
            mode,
            speed / 1000
        );

        self.file = Some(file);
        Ok(())
    }

    /// Write then read under one chip-select assertion
    ///
    /// One SPI_IOC_MESSAGE with up to two segments: transmit-only followed by
    /// receive-only. Empty segments are left out.
    fn spi_transfer(&mut self, write_data: &[u8], read_len: usize) -> Result<Vec<u8>> {
        let fd = self.file.as_ref().ok_or(LinuxSpiError::NotOpen)?.as_raw_fd();
        let speed_hz = self.config.speed_hz;
        let mut read_buf = vec![0u8; read_len];

        let mut transfers = Vec::with_capacity(2);
        if !write_data.is_empty() {
            transfers.push(SpiIocTransfer::segment(Some(write_data), None, speed_hz));
        }
        if read_len > 0 {
            transfers.push(SpiIocTransfer::segment(
                None,
                Some(read_buf.as_mut_slice()),
                speed_hz,
            ));
        }
        if transfers.is_empty() {
            return Ok(read_buf);
        }

        let ioctl_num = ioctl::spi_ioc_message(transfers.len() as u8);
        let ret = unsafe { libc::ioctl(fd, ioctl_num, transfers.as_ptr()) };

        if ret < 0 {
            return Err(LinuxSpiError::TransferFailed(
                std::io::Error::last_os_error(),
            ));
        }

        log::trace!(
            "linux_spi: {:02X?} -> {:02X?}",
            write_data,
            read_buf.as_slice()
        );
        Ok(read_buf)
    }

    fn stop_worker(&mut self) {
        if let Some(mut worker) = self.worker.take() {
            worker.stop();
        }
    }
}

impl SpiTransport for LinuxSpi {
    fn open(&mut self) -> CoreResult<()> {
        Ok(self.open_device_file()?)
    }

    fn close(&mut self) {
        self.stop_worker();
        self.gpio.release_all();
        if self.file.take().is_some() {
            log::info!("linux_spi: Closed {}", self.config.device);
        }
    }

    fn transfer(&mut self, write: &[u8], read_len: usize) -> CoreResult<Vec<u8>> {
        Ok(self.spi_transfer(write, read_len)?)
    }

    fn digital_write(&mut self, pin: u8, high: bool) -> CoreResult<()> {
        Ok(self.gpio.write(pin as u32, high)?)
    }

    fn digital_read(&mut self, pin: u8) -> CoreResult<bool> {
        Ok(self.gpio.read(pin as u32)?)
    }

    fn pin_mode(&mut self, pin: u8, mode: PinMode) -> CoreResult<()> {
        let offset = pin as u32;
        let setting = match mode {
            PinMode::Input => LineSetting::Input,
            PinMode::InputPullUp => LineSetting::InputPullUp,
            PinMode::Output => match self.gpio.setting(offset) {
                Some(current @ LineSetting::Output(_)) => current,
                _ => LineSetting::Output(false),
            },
        };
        Ok(self.gpio.configure(offset, setting)?)
    }

    fn configure_interrupt(&mut self, pin: u8, enable: bool) -> CoreResult<()> {
        if enable {
            self.gpio.configure(pin as u32, LineSetting::RisingEdge)?;
            self.irq_pin = Some(pin);
        } else if self.irq_pin == Some(pin) {
            self.stop_worker();
            self.gpio.configure(pin as u32, LineSetting::Input)?;
            self.irq_pin = None;
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

        let pin = self
            .irq_pin
            .ok_or(CoreError::InterruptUnsupported("no interrupt pin configured"))?;
        let callback = self
            .callback
            .clone()
            .ok_or(CoreError::InterruptUnsupported("no callback registered"))?;

        let offset = pin as u32;
        let request = self
            .gpio
            .handle(offset)
            .ok_or(CoreError::InterruptUnsupported("interrupt line not requested"))?;
        let sample = move || -> CoreResult<bool> { Ok(gpio::sample(&request, offset)?) };

        self.worker = Some(InterruptWorker::spawn(
            sample,
            Edge::Rising,
            DEFAULT_POLL_INTERVAL,
            callback,
        )?);
        Ok(())
    }

    fn is_active(&self) -> bool {
        self.file.is_some()
    }
}

impl Drop for LinuxSpi {
    fn drop(&mut self) {
        self.close();
    }
}

/// Parse transport options from a list of key-value pairs
pub fn parse_options(options: &[(&str, &str)]) -> std::result::Result<LinuxSpiConfig, String> {
    let mut config = LinuxSpiConfig::default();

    for (key, value) in options {
        match *key {
            "dev" => {
                config.device = value.to_string();
            }
            "spispeed" => {
                // Parse speed in kHz
                let speed_khz: u32 = value
                    .parse()
                    .map_err(|_| format!("Invalid spispeed value: {}", value))?;
                if speed_khz == 0 {
                    return Err("spispeed must be non-zero".to_string());
                }
                config.speed_hz = speed_khz.saturating_mul(1000);
            }
            "mode" => {
                let mode: u8 = value
                    .parse()
                    .map_err(|_| format!("Invalid mode value: {}", value))?;
                if mode > mode::MODE_3 {
                    return Err(format!("Invalid SPI mode: {} (must be 0-3)", mode));
                }
                config.mode = mode;
            }
            "gpiochip" => {
                config.gpiochip = gpio::chip_path(value)?;
            }
            _ => {
                log::warn!("linux_spi: Unknown option: {}={}", key, value);
            }
        }
    }

    if config.device.is_empty() {
        return Err("No device specified. Use dev=/dev/spidevX.Y".to_string());
    }

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test]
    fn test_transfer_struct_layout() {
        assert_eq!(
            std::mem::size_of::<SpiIocTransfer>(),
            ioctl::SPI_IOC_TRANSFER_SIZE
        );
    }

    #[test]
    fn test_ioctl_message_numbers() {
        // Values of SPI_IOC_MESSAGE(1) and (2) from <linux/spi/spidev.h>
        assert_eq!(ioctl::spi_ioc_message(1), 0x4020_6B00);
        assert_eq!(ioctl::spi_ioc_message(2), 0x4040_6B00);
    }

    #[test]
    fn test_parse_defaults() {
        let config = parse_options(&[("dev", "/dev/spidev0.0")]).unwrap();
        assert_eq!(config.device, "/dev/spidev0.0");
        assert_eq!(config.speed_hz, 1_000_000);
        assert_eq!(config.mode, 0);
        assert_eq!(config.gpiochip, "/dev/gpiochip0");
    }

    #[test]
    fn test_parse_all_options() {
        let config = parse_options(&[
            ("dev", "/dev/spidev1.1"),
            ("spispeed", "500"),
            ("mode", "3"),
            ("gpiochip", "1"),
        ])
        .unwrap();
        assert_eq!(config.device, "/dev/spidev1.1");
        assert_eq!(config.speed_hz, 500_000);
        assert_eq!(config.mode, 3);
        assert_eq!(config.gpiochip, "/dev/gpiochip1");
    }

    #[test_case(&[] ; "missing device")]
    #[test_case(&[("dev", "/dev/spidev0.0"), ("mode", "4")] ; "mode out of range")]
    #[test_case(&[("dev", "/dev/spidev0.0"), ("spispeed", "fast")] ; "speed not a number")]
    #[test_case(&[("dev", "/dev/spidev0.0"), ("spispeed", "0")] ; "zero speed")]
    #[test_case(&[("dev", "/dev/spidev0.0"), ("gpiochip", "first")] ; "gpiochip not a number")]
    fn test_parse_rejects(options: &[(&str, &str)]) {
        assert!(parse_options(options).is_err());
    }

    #[test]
    fn test_closed_transport() {
        let mut spi = LinuxSpi::new(LinuxSpiConfig::new("/dev/spidev9.9"));
        assert!(!spi.is_active());
        assert!(matches!(spi.transfer(&[0x42], 1), Err(CoreError::NotOpen)));
        assert!(matches!(
            spi.enable_interrupt(true),
            Err(CoreError::InterruptUnsupported(_))
        ));
        spi.close();
    }

    #[test]
    fn test_pins_on_missing_chip_fail() {
        let config =
            LinuxSpiConfig::new("/dev/spidev9.9").with_gpio_chip("/nonexistent/gpiochip9");
        let mut spi = LinuxSpi::new(config);
        assert!(matches!(
            spi.digital_write(17, true),
            Err(CoreError::Transport(_))
        ));
        assert!(spi.configure_interrupt(25, true).is_err());
        assert!(matches!(
            spi.enable_interrupt(true),
            Err(CoreError::InterruptUnsupported(_))
        ));
    }

    #[test]
    fn test_open_missing_device_fails() {
        let mut spi = LinuxSpi::new(LinuxSpiConfig::new("/nonexistent/spidev0.0"));
        assert!(spi.open().is_err());
        assert!(!spi.is_active());
    }
}
