//! lorabridge-dummy - In-memory RFM95 emulator for testing
//!
//! This crate provides a transport that answers register transactions the
//! way an SX127x does: a 128-byte register file, a 256-byte FIFO with an
//! auto-incrementing pointer, write-one-to-clear IRQ flags, a transmitter
//! that finishes after a configurable number of flag polls and a receiver
//! that delivers queued packets. It is useful for testing and development
//! without real hardware.

use std::collections::{BTreeMap, VecDeque};

use lorabridge_core::radio::registers::*;
use lorabridge_core::radio::MAX_PAYLOAD;
use lorabridge_core::transport::{InterruptCallback, PinMode, SpiTransport};
use lorabridge_core::{Error, Result};

/// Configuration for the dummy radio
#[derive(Debug, Clone)]
pub struct DummyConfig {
    /// Content of the version register
    pub version: u8,
    /// IRQ flag reads after entering TX before TX_DONE latches
    /// (`None`: never)
    pub tx_polls: Option<u32>,
    /// Raw temperature register value (FSK page)
    pub temperature: i8,
    /// Packet RSSI register value reported with received packets
    pub rssi_register: u8,
    /// Packet SNR register value reported with received packets
    pub snr_register: u8,
}

impl Default for DummyConfig {
    fn default() -> Self {
        Self {
            version: CHIP_VERSION,
            tx_polls: Some(1),
            temperature: 20,
            rssi_register: 37,
            snr_register: 40,
        }
    }
}

impl DummyConfig {
    /// Set the version register content
    pub fn with_version(mut self, version: u8) -> Self {
        self.version = version;
        self
    }

    /// Set how many flag polls a transmission takes (`None`: never ends)
    pub fn with_tx_polls(mut self, polls: Option<u32>) -> Self {
        self.tx_polls = polls;
        self
    }

    /// Set the raw temperature reading
    pub fn with_temperature(mut self, raw: i8) -> Self {
        self.temperature = raw;
        self
    }
}

/// A packet waiting to be "received"
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RxPacket {
    /// Payload bytes
    pub payload: Vec<u8>,
    /// Deliver with the CRC error flag set
    pub crc_error: bool,
}

/// Dummy radio transport
///
/// Emulates an RFM95 behind a chip-select for testing purposes. Interrupt
/// callbacks run synchronously on the thread whose transfer latched the
/// flag.
pub struct DummyRadio {
    config: DummyConfig,
    open: bool,
    regs: [u8; 128],
    fifo: [u8; 256],
    fsk_temp_cal: u8,
    rx_queue: VecDeque<RxPacket>,
    tx_countdown: Option<u32>,
    transmitted: Vec<Vec<u8>>,
    transfers: usize,
    pins: BTreeMap<u8, bool>,
    pin_modes: BTreeMap<u8, PinMode>,
    irq_pin: Option<u8>,
    irq_enabled: bool,
    callback: Option<InterruptCallback>,
}

impl DummyRadio {
    /// Create a new dummy radio with the given configuration
    pub fn new(config: DummyConfig) -> Self {
        let mut regs = [0u8; 128];
        // Power-on values that matter to the driver
        regs[REG_OP_MODE as usize] = 0x09;
        regs[REG_FRF_MSB as usize] = 0x6C;
        regs[REG_FRF_MID as usize] = 0x80;
        regs[REG_PA_CONFIG as usize] = 0x4F;
        regs[REG_LNA as usize] = 0x20;
        regs[REG_FIFO_TX_BASE_ADDR as usize] = 0x80;
        regs[REG_MODEM_CONFIG_1 as usize] = 0x72;
        regs[REG_MODEM_CONFIG_2 as usize] = 0x70;
        regs[REG_PREAMBLE_LSB as usize] = 0x08;
        regs[REG_PAYLOAD_LENGTH as usize] = 0x01;
        regs[REG_DETECTION_OPTIMIZE as usize] = 0xC3;
        regs[REG_INVERTIQ as usize] = IQ_NORMAL.0;
        regs[REG_DETECTION_THRESHOLD as usize] = 0x0A;
        regs[REG_SYNC_WORD as usize] = 0x12;
        regs[REG_INVERTIQ2 as usize] = IQ_NORMAL.1;
        regs[REG_VERSION as usize] = config.version;
        regs[REG_PA_DAC as usize] = 0x84;

        Self {
            config,
            open: false,
            regs,
            fifo: [0u8; 256],
            fsk_temp_cal: 0,
            rx_queue: VecDeque::new(),
            tx_countdown: None,
            transmitted: Vec::new(),
            transfers: 0,
            pins: BTreeMap::new(),
            pin_modes: BTreeMap::new(),
            irq_pin: None,
            irq_enabled: false,
            callback: None,
        }
    }

    /// Create a new dummy radio with default configuration
    pub fn new_default() -> Self {
        Self::new(DummyConfig::default())
    }

    /// Get the configuration
    pub fn config(&self) -> &DummyConfig {
        &self.config
    }

    /// Queue a packet for reception
    pub fn queue_packet(&mut self, payload: &[u8]) {
        self.rx_queue.push_back(RxPacket {
            payload: payload.to_vec(),
            crc_error: false,
        });
    }

    /// Queue a packet that fails the CRC check
    pub fn queue_corrupt_packet(&mut self, payload: &[u8]) {
        self.rx_queue.push_back(RxPacket {
            payload: payload.to_vec(),
            crc_error: true,
        });
    }

    /// Packets not yet delivered
    pub fn pending_packets(&self) -> usize {
        self.rx_queue.len()
    }

    /// Payloads of every completed transmission, oldest first
    pub fn transmitted(&self) -> &[Vec<u8>] {
        &self.transmitted
    }

    /// Raw register content (LoRa page)
    pub fn register(&self, addr: u8) -> u8 {
        self.regs[(addr & ADDR_MASK) as usize]
    }

    /// Overwrite a register without side effects
    pub fn set_register(&mut self, addr: u8, value: u8) {
        self.regs[(addr & ADDR_MASK) as usize] = value;
    }

    /// Number of transfers handled so far
    pub fn transfer_count(&self) -> usize {
        self.transfers
    }

    /// Last level driven on a pin
    pub fn pin_level(&self, pin: u8) -> Option<bool> {
        self.pins.get(&pin).copied()
    }

    fn lora(&self) -> bool {
        self.regs[REG_OP_MODE as usize] & LONG_RANGE_MODE != 0
    }

    fn mode(&self) -> OpMode {
        OpMode::from_bits(self.regs[REG_OP_MODE as usize])
    }

    fn fifo_ptr(&self) -> u8 {
        self.regs[REG_FIFO_ADDR_PTR as usize]
    }

    fn advance_fifo_ptr(&mut self) {
        let ptr = self.fifo_ptr().wrapping_add(1);
        self.regs[REG_FIFO_ADDR_PTR as usize] = ptr;
    }

    fn latch(&mut self, flags: IrqFlags) {
        self.regs[REG_IRQ_FLAGS as usize] |= flags.bits();
        if self.irq_enabled && self.irq_pin.is_some() {
            if let Some(callback) = self.callback.clone() {
                callback();
            }
        }
    }

    fn set_mode_bits(&mut self, mode: OpMode) {
        let reg = &mut self.regs[REG_OP_MODE as usize];
        *reg = (*reg & !MODE_MASK) | mode.bits();
    }

    fn write_reg(&mut self, addr: u8, value: u8) {
        match addr {
            REG_FIFO => {
                let ptr = self.fifo_ptr();
                self.fifo[ptr as usize] = value;
                self.advance_fifo_ptr();
            }
            REG_IRQ_FLAGS => {
                self.regs[REG_IRQ_FLAGS as usize] &= !value;
            }
            REG_VERSION => {}
            REG_FSK_TEMP_CAL if !self.lora() => {
                self.fsk_temp_cal = value;
            }
            REG_FSK_TEMP if !self.lora() => {}
            REG_OP_MODE => {
                self.regs[REG_OP_MODE as usize] = value;
                self.on_mode_change();
            }
            _ => {
                self.regs[addr as usize] = value;
            }
        }
    }

    fn on_mode_change(&mut self) {
        if self.lora() && self.mode() == OpMode::Transmit {
            self.tx_countdown = self.config.tx_polls;
            log::debug!("dummy: TX started");
        } else {
            self.tx_countdown = None;
        }
    }

    fn read_reg(&mut self, addr: u8) -> u8 {
        match addr {
            REG_FIFO => {
                let value = self.fifo[self.fifo_ptr() as usize];
                self.advance_fifo_ptr();
                value
            }
            REG_IRQ_FLAGS => {
                self.poll_events();
                self.regs[REG_IRQ_FLAGS as usize]
            }
            REG_FSK_TEMP_CAL if !self.lora() => self.fsk_temp_cal,
            REG_FSK_TEMP if !self.lora() => self.config.temperature as u8,
            _ => self.regs[addr as usize],
        }
    }

    /// Advance the transmitter and receiver by one flag poll
    fn poll_events(&mut self) {
        if let Some(remaining) = self.tx_countdown {
            if remaining <= 1 {
                self.finish_tx();
            } else {
                self.tx_countdown = Some(remaining - 1);
            }
        }

        let receiving = matches!(self.mode(), OpMode::RxContinuous | OpMode::RxSingle);
        let pending = IrqFlags::from_bits_retain(self.regs[REG_IRQ_FLAGS as usize])
            .contains(IrqFlags::RX_DONE);
        if self.lora() && receiving && !pending {
            if let Some(packet) = self.rx_queue.pop_front() {
                self.deliver(packet);
            }
        }
    }

    fn finish_tx(&mut self) {
        self.tx_countdown = None;
        let base = self.regs[REG_FIFO_TX_BASE_ADDR as usize];
        let len = self.regs[REG_PAYLOAD_LENGTH as usize];
        let payload = (0..len)
            .map(|i| self.fifo[base.wrapping_add(i) as usize])
            .collect::<Vec<_>>();
        log::debug!("dummy: transmitted {} byte(s)", payload.len());
        self.transmitted.push(payload);
        self.set_mode_bits(OpMode::Standby);
        self.latch(IrqFlags::TX_DONE);
    }

    fn deliver(&mut self, packet: RxPacket) {
        let base = self.regs[REG_FIFO_RX_BASE_ADDR as usize];
        let len = packet.payload.len().min(MAX_PAYLOAD);
        for (i, &b) in packet.payload[..len].iter().enumerate() {
            self.fifo[base.wrapping_add(i as u8) as usize] = b;
        }
        self.regs[REG_FIFO_RX_CURRENT_ADDR as usize] = base;
        self.regs[REG_RX_NB_BYTES as usize] = len as u8;
        self.regs[REG_PKT_RSSI_VALUE as usize] = self.config.rssi_register;
        self.regs[REG_PKT_SNR_VALUE as usize] = self.config.snr_register;

        let mut flags = IrqFlags::RX_DONE | IrqFlags::VALID_HEADER;
        if packet.crc_error {
            flags |= IrqFlags::CRC_ERROR;
        }
        log::debug!(
            "dummy: delivering {} byte(s){}",
            len,
            if packet.crc_error { " with CRC error" } else { "" }
        );
        if self.mode() == OpMode::RxSingle {
            self.set_mode_bits(OpMode::Standby);
        }
        self.latch(flags);
    }
}

impl SpiTransport for DummyRadio {
    fn open(&mut self) -> Result<()> {
        self.open = true;
        log::info!("dummy: radio opened");
        Ok(())
    }

    fn close(&mut self) {
        if self.open {
            self.open = false;
            self.irq_enabled = false;
            log::info!("dummy: radio closed");
        }
    }

    fn transfer(&mut self, write: &[u8], read_len: usize) -> Result<Vec<u8>> {
        if !self.open {
            return Err(Error::NotOpen);
        }
        let Some((&first, data)) = write.split_first() else {
            return Ok(vec![0xFF; read_len]);
        };
        self.transfers += 1;

        // Burst accesses auto-increment the address, except on the FIFO
        let mut addr = first & ADDR_MASK;
        let step = |addr: u8| {
            if addr == REG_FIFO {
                addr
            } else {
                (addr + 1) & ADDR_MASK
            }
        };

        if first & WRITE_FLAG != 0 {
            for &b in data {
                self.write_reg(addr, b);
                addr = step(addr);
            }
            Ok(vec![0xFF; read_len])
        } else {
            let mut out = Vec::with_capacity(read_len);
            for _ in 0..read_len {
                out.push(self.read_reg(addr));
                addr = step(addr);
            }
            Ok(out)
        }
    }

    fn digital_write(&mut self, pin: u8, high: bool) -> Result<()> {
        self.pin_modes.insert(pin, PinMode::Output);
        self.pins.insert(pin, high);
        Ok(())
    }

    fn digital_read(&mut self, pin: u8) -> Result<bool> {
        if Some(pin) == self.irq_pin {
            let flags = self.regs[REG_IRQ_FLAGS as usize];
            return Ok(flags & (IrqFlags::RX_DONE | IrqFlags::TX_DONE).bits() != 0);
        }
        Ok(self.pins.get(&pin).copied().unwrap_or(false))
    }

    fn pin_mode(&mut self, pin: u8, mode: PinMode) -> Result<()> {
        self.pin_modes.insert(pin, mode);
        Ok(())
    }

    fn configure_interrupt(&mut self, pin: u8, enable: bool) -> Result<()> {
        if enable {
            self.irq_pin = Some(pin);
        } else if self.irq_pin == Some(pin) {
            self.irq_pin = None;
        }
        Ok(())
    }

    fn set_interrupt_callback(&mut self, callback: InterruptCallback) -> Result<()> {
        self.callback = Some(callback);
        Ok(())
    }

    fn enable_interrupt(&mut self, enable: bool) -> Result<()> {
        if enable && self.callback.is_none() {
            return Err(Error::InterruptUnsupported("no callback registered"));
        }
        self.irq_enabled = enable;
        Ok(())
    }

    fn is_active(&self) -> bool {
        self.open
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lorabridge_core::radio::{codec, RadioConfig, Rfm95};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::{Duration, Instant};
    use test_case::test_case;

    fn radio_with(config: DummyConfig) -> Rfm95<DummyRadio> {
        let mut radio = Rfm95::new(DummyRadio::new(config));
        radio.begin().unwrap();
        radio
    }

    fn radio() -> Rfm95<DummyRadio> {
        radio_with(DummyConfig::default())
    }

    #[test]
    fn test_begin_initializes_lora_standby() {
        let mut radio = radio();
        assert_eq!(radio.operating_mode().unwrap(), (true, OpMode::Standby));
        assert_eq!(radio.version().unwrap(), CHIP_VERSION);
        let chip = radio.transport();
        assert_eq!(chip.register(REG_PA_CONFIG), 0x8F);
        assert_eq!(chip.register(REG_PA_DAC), 0x87);
        assert_eq!(chip.register(REG_LNA), 0x23);
        assert_eq!(chip.register(REG_FIFO_TX_BASE_ADDR), 0);
        assert_eq!(chip.register(REG_MODEM_CONFIG_3), 0x04);
    }

    #[test]
    fn test_begin_rejects_wrong_version() {
        let mut radio = Rfm95::new(DummyRadio::new(DummyConfig::default().with_version(0x22)));
        assert!(matches!(
            radio.begin(),
            Err(Error::UnexpectedVersion { found: 0x22 })
        ));
    }

    #[test]
    fn test_closed_transport_refuses_transfers() {
        let mut radio = Rfm95::new(DummyRadio::new_default());
        assert!(matches!(radio.version(), Err(Error::NotOpen)));
    }

    #[test]
    fn test_send_hello() {
        let mut radio = radio();
        radio.send(b"Hello", false).unwrap();

        assert_eq!(radio.transport().transmitted(), &[b"Hello".to_vec()]);
        assert_eq!(radio.operating_mode().unwrap(), (true, OpMode::Standby));
        assert!(radio.irq_flags().unwrap().is_empty());
    }

    #[test]
    fn test_send_inverted_iq_is_restored() {
        let mut radio = radio();
        radio.send(&[0x01, 0x02], true).unwrap();
        assert!(!radio.invert_iq().unwrap());
        assert_eq!(radio.transport().register(REG_INVERTIQ2), IQ_NORMAL.1);
    }

    #[test]
    fn test_send_max_payload() {
        let mut radio = radio();
        let payload: Vec<u8> = (0..=254u8).collect();
        radio.send(&payload, false).unwrap();
        assert_eq!(radio.transport().transmitted()[0], payload);
    }

    #[test]
    fn test_send_times_out() {
        let mut radio = radio_with(DummyConfig::default().with_tx_polls(None));
        let start = Instant::now();
        assert!(matches!(radio.send(b"x", false), Err(Error::TxTimeout)));
        assert!(start.elapsed() >= Duration::from_secs(2));
        assert!(radio.transport().transmitted().is_empty());
    }

    #[test]
    fn test_receive_timeout_returns_empty() {
        let mut radio = radio();
        let start = Instant::now();
        let data = radio.receive(Duration::from_millis(50), false).unwrap();
        let elapsed = start.elapsed();

        assert!(data.is_empty());
        assert!(elapsed >= Duration::from_millis(50));
        assert!(elapsed < Duration::from_millis(150), "took {:?}", elapsed);
    }

    #[test]
    fn test_receive_packet() {
        let mut radio = radio();
        radio.transport_mut().queue_packet(b"ping");

        let data = radio.receive(Duration::from_secs(1), false).unwrap();
        assert_eq!(data, b"ping");
        assert_eq!(radio.packet_rssi().unwrap(), -100);
        assert_eq!(radio.packet_snr().unwrap(), 10.0);
        assert!(radio.irq_flags().unwrap().is_empty());
    }

    #[test]
    fn test_receive_skips_crc_error() {
        let mut radio = radio();
        radio.transport_mut().queue_corrupt_packet(b"bad");
        radio.transport_mut().queue_packet(b"good");

        let data = radio.receive(Duration::from_secs(1), false).unwrap();
        assert_eq!(data, b"good");
        assert_eq!(radio.crc_error_count(), 1);
        assert_eq!(radio.transport().pending_packets(), 0);
    }

    #[test]
    fn test_receive_skips_empty_packet() {
        let mut radio = radio();
        radio.transport_mut().queue_packet(b"");
        radio.transport_mut().queue_packet(b"after");

        let data = radio.receive(Duration::from_secs(1), false).unwrap();
        assert_eq!(data, b"after");
    }

    #[test]
    fn test_receive_inverted_iq_is_restored() {
        let mut radio = radio();
        radio.transport_mut().queue_packet(b"iq");
        assert_eq!(radio.receive(Duration::from_secs(1), true).unwrap(), b"iq");
        assert!(!radio.invert_iq().unwrap());
    }

    #[test]
    fn test_temperature_calibration() {
        let mut radio = radio_with(DummyConfig::default().with_temperature(20));
        assert_eq!(radio.read_temperature().unwrap(), 20.0);

        radio.calibrate_temperature(5.0).unwrap();
        assert_eq!(radio.read_temperature().unwrap(), 25.0);

        // The LoRa page is untouched and the mode is restored
        assert_eq!(radio.transport().register(REG_INVERTIQ2), IQ_NORMAL.1);
        assert_eq!(radio.operating_mode().unwrap(), (true, OpMode::Standby));
    }

    #[test]
    fn test_beacon() {
        let mut radio = radio();
        radio.start_beacon(b"beacon", 3_999).unwrap();
        {
            let chip = radio.transport();
            assert_eq!(chip.register(REG_BEACON_PERIOD_MSB), 0);
            assert_eq!(chip.register(REG_BEACON_PERIOD_LSB), 3);
            assert_eq!(chip.register(REG_PAYLOAD_LENGTH), 6);
        }
        assert_eq!(radio.operating_mode().unwrap(), (true, OpMode::Transmit));

        radio.stop_beacon().unwrap();
        assert_eq!(radio.operating_mode().unwrap(), (true, OpMode::Standby));
    }

    #[test]
    fn test_configure_round_trip() {
        let mut radio = radio();
        let config = RadioConfig::default()
            .with_frequency(915.0)
            .with_tx_power(14, false)
            .with_spreading_factor(10)
            .with_bandwidth(250.0)
            .with_coding_rate(7)
            .with_preamble_length(12)
            .with_sync_word(0x34);
        radio.configure(&config).unwrap();

        let back = radio.read_config().unwrap();
        assert!((back.frequency_mhz - 915.0).abs() <= codec::FSTEP_MHZ);
        assert_eq!(back.tx_power_dbm, 14);
        assert!(!back.pa_boost);
        assert_eq!(back.spreading_factor, 10);
        assert_eq!(back.bandwidth_khz, 250.0);
        assert_eq!(back.coding_rate, 7);
        assert_eq!(back.preamble_length, 12);
        assert_eq!(back.sync_word, 0x34);
    }

    #[test_case(20, true, 20, true)]
    #[test_case(25, true, 20, true)]
    #[test_case(0, true, 2, true)]
    #[test_case(15, false, 15, false)]
    #[test_case(18, false, 15, false)]
    fn test_tx_power_on_chip(level: i8, boost: bool, expected: i8, expected_boost: bool) {
        let mut radio = radio();
        radio.set_tx_power(level, boost).unwrap();
        assert_eq!(radio.tx_power().unwrap(), (expected, expected_boost));
    }

    #[test]
    fn test_continuous_receive_mode() {
        let mut radio = radio();
        radio.set_continuous_receive().unwrap();
        assert_eq!(
            radio.operating_mode().unwrap(),
            (true, OpMode::RxContinuous)
        );

        radio.receive_mode().unwrap();
        assert_eq!(radio.lna().unwrap(), LNA_DEFAULT);
        radio.standby().unwrap();
        assert_eq!(radio.operating_mode().unwrap(), (true, OpMode::Standby));
    }

    #[test]
    fn test_set_lora_mode() {
        let mut radio = radio();
        radio.set_lora_mode(false).unwrap();
        assert_eq!(radio.operating_mode().unwrap(), (false, OpMode::Sleep));
        radio.set_lora_mode(true).unwrap();
        assert_eq!(radio.operating_mode().unwrap(), (true, OpMode::Sleep));
    }

    #[test]
    fn test_irq_helpers() {
        let mut radio = radio();
        radio
            .transport_mut()
            .set_register(REG_IRQ_FLAGS, (IrqFlags::RX_DONE | IrqFlags::VALID_HEADER).bits());
        assert_eq!(
            radio.irq_flags().unwrap(),
            IrqFlags::RX_DONE | IrqFlags::VALID_HEADER
        );
        radio.clear_irq(IrqFlags::RX_DONE).unwrap();
        assert_eq!(radio.irq_flags().unwrap(), IrqFlags::VALID_HEADER);
        radio.clear_irq_flags().unwrap();
        assert!(radio.irq_flags().unwrap().is_empty());
    }

    #[test]
    fn test_dio_mapping() {
        let mut radio = radio();
        radio.transport_mut().set_register(REG_DIO_MAPPING_1, 0x0F);
        radio.set_dio_mapping(0b01, 0b11).unwrap();
        let chip = radio.transport();
        assert_eq!(chip.register(REG_DIO_MAPPING_1), 0x4F);
        assert_eq!(chip.register(REG_DIO_MAPPING_2) & 0xC0, 0xC0);
        assert_eq!(chip.register(REG_IRQ_FLAGS_MASK), 0x00);
    }

    #[test]
    fn test_fifo_helpers() {
        let mut radio = radio();
        radio.transport_mut().queue_packet(b"fifo");
        radio.set_continuous_receive().unwrap();
        assert!(radio.irq_flags().unwrap().contains(IrqFlags::RX_DONE));
        assert_eq!(radio.rx_nb_bytes().unwrap(), 4);
        assert_eq!(radio.fifo_rx_current_addr().unwrap(), 0);
        assert_eq!(radio.read_payload().unwrap(), b"fifo");
        radio.reset_rx_pointer().unwrap();
        assert_eq!(radio.transport().register(REG_FIFO_ADDR_PTR), 0);
    }

    #[test]
    fn test_diagnostics() {
        let mut radio = radio();
        assert!(radio.test_communication().unwrap());
        assert_eq!(radio.sync_word().unwrap(), 0x12);

        let dump = radio.register_dump().unwrap();
        let op_mode = dump.iter().find(|(name, _, _)| *name == "OP_MODE").unwrap();
        assert_eq!(op_mode.2, LONG_RANGE_MODE | OpMode::Standby.bits());
    }

    #[test]
    fn test_interrupt_callback_on_rx_done() {
        let count = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&count);

        let mut radio = radio();
        {
            let chip = radio.transport_mut();
            chip.configure_interrupt(0x40, true).unwrap();
            chip.set_interrupt_callback(Arc::new(move || {
                seen.fetch_add(1, Ordering::SeqCst);
            }))
            .unwrap();
            chip.enable_interrupt(true).unwrap();
            chip.queue_packet(b"irq");
        }

        radio.receive(Duration::from_secs(1), false).unwrap();
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_pins() {
        let mut chip = DummyRadio::new_default();
        chip.digital_write(3, true).unwrap();
        assert_eq!(chip.pin_level(3), Some(true));
        assert!(chip.digital_read(3).unwrap());
        assert!(!chip.digital_read(4).unwrap());
        assert!(chip.enable_interrupt(true).is_err());
    }
}
