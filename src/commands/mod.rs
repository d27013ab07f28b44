//! CLI command implementations
//!
//! Radio commands take an `Rfm95` that has already been started and
//! configured, and are generic over the transport so the dummy emulator
//! can drive them in tests.

pub mod beacon;
pub mod info;
mod list;
pub mod rx;
pub mod tx;

pub use list::{list_devices, list_transports};

/// Render a payload as text when it is printable, hex otherwise
pub fn format_payload(data: &[u8]) -> String {
    match std::str::from_utf8(data) {
        Ok(text) if text.chars().all(|c| !c.is_control() || c == '\n' || c == '\t') => {
            format!("\"{}\"", text)
        }
        _ => data
            .iter()
            .map(|b| format!("{:02X}", b))
            .collect::<Vec<_>>()
            .join(" "),
    }
}
