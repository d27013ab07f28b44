//! Radio information command

use lorabridge_core::radio::{IrqFlags, Rfm95};
use lorabridge_core::transport::SpiTransport;

/// Comma-separated names of the set flags, or `none`
pub fn describe_irq_flags(flags: IrqFlags) -> String {
    if flags.is_empty() {
        return "none".to_string();
    }
    flags
        .iter_names()
        .map(|(name, _)| name)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Print communication status, mode, flags, configuration and registers
pub fn run<T: SpiTransport>(radio: &mut Rfm95<T>) -> Result<(), Box<dyn std::error::Error>> {
    let version = radio.version()?;
    let link_ok = radio.test_communication()?;
    let (lora, mode) = radio.operating_mode()?;
    let flags = radio.irq_flags()?;
    let config = radio.read_config()?;
    let invert_iq = radio.invert_iq()?;
    let temperature = radio.read_temperature()?;

    println!("Radio Information");
    println!("=================");
    println!();
    println!("Version:         0x{:02X}", version);
    println!(
        "Communication:   {}",
        if link_ok { "OK" } else { "FAILED (register write did not read back)" }
    );
    println!(
        "Mode:            {} ({})",
        mode,
        if lora { "LoRa" } else { "FSK/OOK" }
    );
    println!(
        "IRQ flags:       0x{:02X} [{}]",
        flags.bits(),
        describe_irq_flags(flags)
    );
    println!("Temperature:     {:.0} C (uncalibrated sensor)", temperature);
    println!();
    println!("Configuration:   {}", config);
    println!("Invert IQ:       {}", if invert_iq { "yes" } else { "no" });
    println!("CRC errors:      {}", radio.crc_error_count());
    println!();
    println!("Registers:");
    for (name, addr, value) in radio.register_dump()? {
        println!("  0x{:02X} {:16} 0x{:02X}", addr, name, value);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_describe_irq_flags() {
        assert_eq!(describe_irq_flags(IrqFlags::empty()), "none");
        assert_eq!(
            describe_irq_flags(IrqFlags::RX_DONE | IrqFlags::CRC_ERROR),
            "RX_DONE, CRC_ERROR"
        );
        assert_eq!(describe_irq_flags(IrqFlags::TX_DONE), "TX_DONE");
    }

    #[cfg(feature = "dummy")]
    #[test]
    fn test_info_runs_against_emulator() {
        use lorabridge_core::radio::OpMode;
        use lorabridge_dummy::DummyRadio;

        let mut radio = Rfm95::new(DummyRadio::new_default());
        radio.begin().unwrap();
        run(&mut radio).unwrap();
        // The temperature read restores the mode it found
        assert_eq!(radio.operating_mode().unwrap(), (true, OpMode::Standby));
        assert_eq!(radio.sync_word().unwrap(), 0x12);
    }
}
