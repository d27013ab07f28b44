//! Error types for the CH341 transport

use lorabridge_core::Error as CoreError;
use thiserror::Error;

/// Result type for CH341 operations
pub type Result<T> = std::result::Result<T, Ch341aError>;

/// Errors that can occur when driving the CH341 bridge
#[derive(Debug, Error)]
pub enum Ch341aError {
    /// No device with the CH341 VID/PID is attached
    #[error("CH341 device not found (VID:1a86 PID:5512)")]
    DeviceNotFound,
    /// Fewer matching devices than the requested index
    #[error("CH341 index {index} out of range, {found} device(s) attached")]
    IndexOutOfRange {
        /// Requested ordinal
        index: usize,
        /// Matching devices
        found: usize,
    },
    /// Failed to open the device or select its configuration
    #[error("failed to open CH341: {0}")]
    OpenFailed(String),
    /// Failed to claim the interface or its endpoints
    #[error("failed to claim interface: {0}")]
    ClaimFailed(String),
    /// A bulk transfer reported an error
    #[error("USB transfer failed: {0}")]
    TransferFailed(String),
    /// A bulk transfer did not complete in time
    #[error("USB transfer timed out")]
    Timeout,
    /// The device answered with fewer bytes than expected
    #[error("short read: expected {expected} byte(s), got {got}")]
    ShortRead {
        /// Bytes expected
        expected: usize,
        /// Bytes received
        got: usize,
    },
    /// Pin mask is not one of the bridge pins
    #[error("invalid pin mask {0:#04x}")]
    InvalidPin(u8),
    /// No session is open
    #[error("CH341 is not open")]
    NotOpen,
}

impl From<Ch341aError> for CoreError {
    fn from(e: Ch341aError) -> Self {
        match e {
            Ch341aError::DeviceNotFound => CoreError::NoDeviceFound,
            Ch341aError::IndexOutOfRange { index, found } => {
                CoreError::IndexOutOfRange { index, found }
            }
            Ch341aError::ShortRead { expected, got } => CoreError::ShortRead { expected, got },
            Ch341aError::InvalidPin(pin) => CoreError::InvalidPin(pin),
            Ch341aError::NotOpen => CoreError::NotOpen,
            Ch341aError::TransferFailed(msg) => {
                log::debug!("ch341a: transfer failed: {}", msg);
                CoreError::TransferFailed
            }
            Ch341aError::Timeout => {
                log::debug!("ch341a: transfer timed out");
                CoreError::TransferFailed
            }
            other => CoreError::Transport(other.to_string()),
        }
    }
}
