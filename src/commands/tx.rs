//! Transmit command

use lorabridge_core::radio::Rfm95;
use lorabridge_core::transport::SpiTransport;

use super::format_payload;

/// Send one packet and wait for TX_DONE
pub fn run<T: SpiTransport>(
    radio: &mut Rfm95<T>,
    payload: &[u8],
    invert_iq: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    radio.send(payload, invert_iq)?;
    println!("Sent {} byte(s): {}", payload.len(), format_payload(payload));
    Ok(())
}

#[cfg(all(test, feature = "dummy"))]
mod tests {
    use super::*;
    use lorabridge_core::Error;
    use lorabridge_dummy::{DummyConfig, DummyRadio};

    #[test]
    fn test_tx_reaches_the_air() {
        let mut radio = Rfm95::new(DummyRadio::new_default());
        radio.begin().unwrap();
        run(&mut radio, b"ping", false).unwrap();
        assert_eq!(radio.transport().transmitted(), &[b"ping".to_vec()]);
    }

    #[test]
    fn test_tx_rejects_oversized_payload() {
        let mut radio = Rfm95::new(DummyRadio::new(DummyConfig::default()));
        radio.begin().unwrap();
        let err = run(&mut radio, &[0u8; 300], false).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<Error>(),
            Some(Error::PayloadTooLarge(300))
        ));
        assert!(radio.transport().transmitted().is_empty());
    }
}
