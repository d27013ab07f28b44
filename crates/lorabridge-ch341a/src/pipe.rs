//! Bulk endpoint pair
//!
//! [`BulkPipe`] is the only thing the bus layer needs from USB: push a
//! command buffer out, pull N bytes in. [`UsbPipe`] is the nusb-backed
//! implementation; tests substitute a recording pipe.

use std::time::Duration;

use nusb::transfer::{Buffer, Bulk, In, Out};
use nusb::{DeviceInfo, Endpoint, Interface, MaybeFuture};

use crate::error::{Ch341aError, Result};
use crate::protocol::*;

/// Byte-stream access to the bridge's two bulk endpoints
pub trait BulkPipe: Send {
    /// Send one command buffer on the OUT endpoint
    fn write(&mut self, data: &[u8]) -> Result<()>;

    /// Receive exactly `len` bytes from the IN endpoint
    fn read(&mut self, len: usize) -> Result<Vec<u8>>;
}

/// Attached CH341 devices in enumeration order
pub(crate) fn matching_devices() -> Result<Vec<DeviceInfo>> {
    let devices = nusb::list_devices()
        .wait()
        .map_err(|e| Ch341aError::OpenFailed(e.to_string()))?
        .filter(|d| d.vendor_id() == CH341_USB_VENDOR && d.product_id() == CH341_USB_PRODUCT)
        .collect();
    Ok(devices)
}

/// Pick the `index`th entry of an enumeration
pub(crate) fn select<T>(devices: Vec<T>, index: usize) -> Result<T> {
    if devices.is_empty() {
        return Err(Ch341aError::DeviceNotFound);
    }
    let found = devices.len();
    devices
        .into_iter()
        .nth(index)
        .ok_or(Ch341aError::IndexOutOfRange { index, found })
}

/// nusb bulk endpoints of a claimed CH341
pub struct UsbPipe {
    /// Keeps the interface claimed for the lifetime of the pipe
    _interface: Interface,
    out_ep: Endpoint<Bulk, Out>,
    in_ep: Endpoint<Bulk, In>,
    timeout: Duration,
}

impl UsbPipe {
    /// Open the `index`th attached CH341 (0-based)
    ///
    /// Selects configuration 1 and claims interface 0.
    pub fn open(index: usize, timeout: Duration) -> Result<Self> {
        let info = select(matching_devices()?, index)?;

        log::info!(
            "Opening CH341 #{} at bus {} address {}",
            index,
            info.bus_id(),
            info.device_address()
        );

        let device = info
            .open()
            .wait()
            .map_err(|e| Ch341aError::OpenFailed(e.to_string()))?;

        device
            .set_configuration(1)
            .wait()
            .map_err(|e| Ch341aError::OpenFailed(format!("set configuration: {}", e)))?;

        let interface = device
            .claim_interface(0)
            .wait()
            .map_err(|e| Ch341aError::ClaimFailed(e.to_string()))?;

        let out_ep = interface
            .endpoint::<Bulk, Out>(WRITE_EP)
            .map_err(|e| Ch341aError::ClaimFailed(e.to_string()))?;
        let in_ep = interface
            .endpoint::<Bulk, In>(READ_EP)
            .map_err(|e| Ch341aError::ClaimFailed(e.to_string()))?;

        Ok(Self {
            _interface: interface,
            out_ep,
            in_ep,
            timeout,
        })
    }

    /// Cancel and reap anything still in flight on both endpoints
    fn drain_all_pending(&mut self) {
        self.out_ep.cancel_all();
        while self.out_ep.pending() > 0 {
            let _ = self.out_ep.wait_next_complete(self.timeout);
        }
        self.in_ep.cancel_all();
        while self.in_ep.pending() > 0 {
            let _ = self.in_ep.wait_next_complete(self.timeout);
        }
    }
}

impl BulkPipe for UsbPipe {
    fn write(&mut self, data: &[u8]) -> Result<()> {
        self.out_ep.submit(Buffer::from(data.to_vec()));

        let Some(completion) = self.out_ep.wait_next_complete(self.timeout) else {
            self.drain_all_pending();
            return Err(Ch341aError::Timeout);
        };
        completion
            .status
            .map_err(|e| Ch341aError::TransferFailed(e.to_string()))?;

        log::trace!("USB write {:02X?}", data);
        Ok(())
    }

    fn read(&mut self, len: usize) -> Result<Vec<u8>> {
        // IN requests must be a whole number of packets
        let mps = self.in_ep.max_packet_size().max(1);
        let request = len.div_ceil(mps).max(1) * mps;
        self.in_ep.submit(Buffer::new(request));

        let Some(completion) = self.in_ep.wait_next_complete(self.timeout) else {
            self.drain_all_pending();
            return Err(Ch341aError::Timeout);
        };
        completion
            .status
            .map_err(|e| Ch341aError::TransferFailed(e.to_string()))?;

        if completion.actual_len < len {
            return Err(Ch341aError::ShortRead {
                expected: len,
                got: completion.actual_len,
            });
        }

        let data = completion.buffer[..len].to_vec();
        log::trace!("USB read {:02X?}", data);
        Ok(data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test]
    fn test_select_without_devices() {
        assert!(matches!(
            select(Vec::<u8>::new(), 0),
            Err(Ch341aError::DeviceNotFound)
        ));
    }

    #[test_case(2, 2; "one past the end")]
    #[test_case(7, 2; "far past the end")]
    fn test_select_out_of_range(index: usize, found: usize) {
        assert!(matches!(
            select(vec!["a", "b"], index),
            Err(Ch341aError::IndexOutOfRange { index: i, found: f }) if i == index && f == found
        ));
    }

    #[test_case(0, "a"; "first")]
    #[test_case(1, "b"; "last")]
    fn test_select_by_index(index: usize, expected: &str) {
        assert_eq!(select(vec!["a", "b"], index).unwrap(), expected);
    }
}
