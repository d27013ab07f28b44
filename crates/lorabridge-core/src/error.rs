//! Error types for lorabridge-core
//!
//! Transport crates keep their own detailed error enums and convert into
//! this one at the [`SpiTransport`](crate::transport::SpiTransport) boundary.

use thiserror::Error;

/// Core error type shared by the driver and every transport
#[derive(Debug, Error)]
pub enum Error {
    // Enumeration / open errors
    /// No USB device or bus node matched
    #[error("no matching device found")]
    NoDeviceFound,
    /// The requested device ordinal exceeds the number of matches
    #[error("device index {index} out of range, only {found} device(s) found")]
    IndexOutOfRange {
        /// Requested ordinal
        index: usize,
        /// Number of matching devices
        found: usize,
    },
    /// Operation needs an open session
    #[error("transport is not open")]
    NotOpen,

    // Bus errors
    /// A bus transfer failed part-way
    #[error("bus transfer failed")]
    TransferFailed,
    /// Fewer bytes came back than were requested
    #[error("short read: expected {expected} byte(s), got {got}")]
    ShortRead {
        /// Bytes requested
        expected: usize,
        /// Bytes received
        got: usize,
    },
    /// Pin identifier is not valid for this transport
    #[error("invalid pin {0:#04x}")]
    InvalidPin(u8),
    /// Transport cannot provide (emulated) interrupts in its current state
    #[error("interrupts not supported: {0}")]
    InterruptUnsupported(&'static str),

    // Radio errors
    /// Payload exceeds the 255-byte FIFO limit
    #[error("payload of {0} bytes exceeds the 255 byte limit")]
    PayloadTooLarge(usize),
    /// TX-done flag did not appear in time
    #[error("transmit timed out")]
    TxTimeout,
    /// Version register did not hold the expected silicon revision
    #[error("unexpected chip version {found:#04x} (expected 0x12)")]
    UnexpectedVersion {
        /// Value read from the version register
        found: u8,
    },
    /// Operating mode read back differs from the one just written
    #[error("mode change failed: wanted {expected:#04x}, read back {found:#04x}")]
    ModeChangeFailed {
        /// Mode bits written
        expected: u8,
        /// Mode bits read back
        found: u8,
    },

    // Host errors
    /// Host I/O error (device nodes)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// Transport-specific failure with detail
    #[error("transport error: {0}")]
    Transport(String),
}

/// Result type alias using the core Error type
pub type Result<T> = std::result::Result<T, Error>;
