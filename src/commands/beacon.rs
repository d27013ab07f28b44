//! Beacon commands

use lorabridge_core::radio::codec::beacon_period;
use lorabridge_core::radio::Rfm95;
use lorabridge_core::transport::SpiTransport;

use super::format_payload;

/// Load a beacon payload and start the chip's periodic transmitter
pub fn run_start<T: SpiTransport>(
    radio: &mut Rfm95<T>,
    payload: &[u8],
    interval_ms: u32,
) -> Result<(), Box<dyn std::error::Error>> {
    let period = beacon_period(interval_ms);
    if period == 0 {
        log::warn!(
            "Interval {} ms is below the 1 s beacon resolution",
            interval_ms
        );
    }

    radio.start_beacon(payload, interval_ms)?;
    println!(
        "Beacon started: {} every {} s",
        format_payload(payload),
        period
    );
    Ok(())
}

/// Stop the beacon
pub fn run_stop<T: SpiTransport>(radio: &mut Rfm95<T>) -> Result<(), Box<dyn std::error::Error>> {
    radio.stop_beacon()?;
    println!("Beacon stopped");
    Ok(())
}

#[cfg(all(test, feature = "dummy"))]
mod tests {
    use super::*;
    use lorabridge_core::radio::registers::{REG_BEACON_PERIOD_LSB, REG_BEACON_PERIOD_MSB};
    use lorabridge_core::radio::OpMode;
    use lorabridge_dummy::DummyRadio;

    #[test]
    fn test_beacon_start_and_stop() {
        let mut radio = Rfm95::new(DummyRadio::new_default());
        radio.begin().unwrap();

        run_start(&mut radio, b"id", 10_000).unwrap();
        assert_eq!(radio.transport().register(REG_BEACON_PERIOD_MSB), 0);
        assert_eq!(radio.transport().register(REG_BEACON_PERIOD_LSB), 10);
        assert_eq!(radio.operating_mode().unwrap(), (true, OpMode::Transmit));

        run_stop(&mut radio).unwrap();
        assert_eq!(radio.operating_mode().unwrap(), (true, OpMode::Standby));
    }
}
