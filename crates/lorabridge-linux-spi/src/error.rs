//! Error types for Linux SPI operations

use lorabridge_core::Error as CoreError;
use thiserror::Error;

/// Linux SPI specific errors
#[derive(Debug, Error)]
pub enum LinuxSpiError {
    /// Failed to open device
    #[error("Failed to open {path}: {source}")]
    OpenFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Failed to set SPI mode
    #[error("Failed to set SPI mode to {mode}: {source}")]
    SetModeFailed {
        mode: u8,
        #[source]
        source: std::io::Error,
    },

    /// Failed to set bits per word
    #[error("Failed to set bits per word to {bits}: {source}")]
    SetBitsPerWordFailed {
        bits: u8,
        #[source]
        source: std::io::Error,
    },

    /// Failed to set clock speed
    #[error("Failed to set clock speed to {speed} Hz: {source}")]
    SetSpeedFailed {
        speed: u32,
        #[source]
        source: std::io::Error,
    },

    /// SPI transfer failed
    #[error("SPI transfer failed: {0}")]
    TransferFailed(#[source] std::io::Error),

    /// Failed to request a GPIO line
    #[error("Failed to request GPIO line {line}: {source}")]
    LineRequestFailed {
        line: u32,
        #[source]
        source: gpiocdev::Error,
    },

    /// Failed to reconfigure a GPIO line
    #[error("Failed to reconfigure GPIO line {line}: {source}")]
    ReconfigureFailed {
        line: u32,
        #[source]
        source: gpiocdev::Error,
    },

    /// Failed to drive a GPIO line
    #[error("Failed to set GPIO line {line}: {source}")]
    SetValueFailed {
        line: u32,
        #[source]
        source: gpiocdev::Error,
    },

    /// Failed to sample a GPIO line
    #[error("Failed to get GPIO line {line}: {source}")]
    GetValueFailed {
        line: u32,
        #[source]
        source: gpiocdev::Error,
    },

    /// Device not specified
    #[error("No device specified. Use dev=/dev/spidevX.Y")]
    NoDevice,

    /// Operation needs an open device
    #[error("spidev device is not open")]
    NotOpen,
}

/// Result type for Linux SPI operations
pub type Result<T> = std::result::Result<T, LinuxSpiError>;

impl From<LinuxSpiError> for CoreError {
    fn from(e: LinuxSpiError) -> Self {
        match e {
            LinuxSpiError::NotOpen => CoreError::NotOpen,
            LinuxSpiError::TransferFailed(source) => {
                log::debug!("linux_spi: transfer failed: {}", source);
                CoreError::TransferFailed
            }
            LinuxSpiError::OpenFailed { source, .. } => CoreError::Io(source),
            other => CoreError::Transport(other.to_string()),
        }
    }
}
