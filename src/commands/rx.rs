//! Receive command

use std::time::Duration;

use lorabridge_core::radio::Rfm95;
use lorabridge_core::transport::SpiTransport;

use super::format_payload;

/// Receive packets, printing payload and link quality
///
/// Without `count` the loop runs until the process is interrupted; with it,
/// the loop ends after `count` packets or at the first timeout.
pub fn run<T: SpiTransport>(
    radio: &mut Rfm95<T>,
    timeout: Duration,
    count: Option<usize>,
    invert_iq: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let received = receive_packets(radio, timeout, count, invert_iq)?;
    log::info!(
        "Received {} packet(s), {} dropped with CRC errors",
        received,
        radio.crc_error_count()
    );
    Ok(())
}

fn receive_packets<T: SpiTransport>(
    radio: &mut Rfm95<T>,
    timeout: Duration,
    count: Option<usize>,
    invert_iq: bool,
) -> Result<usize, Box<dyn std::error::Error>> {
    let mut received = 0usize;
    println!("Listening (timeout {:?} per packet)...", timeout);

    while count.map_or(true, |n| received < n) {
        let data = radio.receive(timeout, invert_iq)?;
        if data.is_empty() {
            println!("No packet within {:?}", timeout);
            if count.is_some() {
                break;
            }
            continue;
        }

        received += 1;
        let rssi = radio.packet_rssi()?;
        let snr = radio.packet_snr()?;
        println!(
            "[{}] {} byte(s), RSSI {} dBm, SNR {:.2} dB: {}",
            received,
            data.len(),
            rssi,
            snr,
            format_payload(&data)
        );
    }

    Ok(received)
}

#[cfg(all(test, feature = "dummy"))]
mod tests {
    use super::*;
    use lorabridge_dummy::DummyRadio;

    #[test]
    fn test_rx_stops_after_count() {
        let mut dummy = DummyRadio::new_default();
        dummy.queue_packet(b"one");
        dummy.queue_packet(b"two");
        dummy.queue_packet(b"three");

        let mut radio = Rfm95::new(dummy);
        radio.begin().unwrap();
        let received =
            receive_packets(&mut radio, Duration::from_millis(100), Some(2), false).unwrap();
        assert_eq!(received, 2);
        assert_eq!(radio.transport().pending_packets(), 1);
    }

    #[test]
    fn test_rx_timeout_ends_counted_loop() {
        let mut dummy = DummyRadio::new_default();
        dummy.queue_corrupt_packet(b"bad");
        dummy.queue_packet(b"good");

        let mut radio = Rfm95::new(dummy);
        radio.begin().unwrap();
        let received =
            receive_packets(&mut radio, Duration::from_millis(30), Some(5), false).unwrap();
        assert_eq!(received, 1);
        assert_eq!(radio.crc_error_count(), 1);
    }
}
