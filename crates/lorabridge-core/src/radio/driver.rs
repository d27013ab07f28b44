//! RFM95 register driver
//!
//! Every operation is a sequence of single-register transactions on the
//! owned transport. Nothing is cached: getters always read the chip.

use std::thread;
use std::time::{Duration, Instant};

use super::codec;
use super::config::RadioConfig;
use super::registers::*;
use crate::error::{Error, Result};
use crate::transport::SpiTransport;

/// Largest payload the 256-byte FIFO accepts in one packet
pub const MAX_PAYLOAD: usize = 255;

/// Settle time after sleep / LoRa mode / standby changes during init
const MODE_SETTLE: Duration = Duration::from_millis(10);
/// Upper bound on waiting for TX_DONE
const TX_TIMEOUT: Duration = Duration::from_secs(2);
/// Interval between IRQ flag polls
const POLL_INTERVAL: Duration = Duration::from_millis(1);
/// Settle time around the FSK detour used for the temperature sensor
const TEMP_SETTLE: Duration = Duration::from_millis(100);

/// Value written to the sync word by [`Rfm95::test_communication`]
const SCRATCH_SYNC_WORD: u8 = 0x42;

/// SX127x / RFM95 LoRa driver over any [`SpiTransport`]
pub struct Rfm95<T: SpiTransport> {
    spi: T,
    crc_errors: u32,
}

impl<T: SpiTransport> Rfm95<T> {
    /// Wrap a transport; the transport is opened by [`begin`](Self::begin)
    pub fn new(spi: T) -> Self {
        Self { spi, crc_errors: 0 }
    }

    /// Borrow the underlying transport
    pub fn transport(&self) -> &T {
        &self.spi
    }

    /// Mutably borrow the underlying transport
    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.spi
    }

    /// Give back the transport
    pub fn into_inner(self) -> T {
        self.spi
    }

    /// Open the transport and put the chip into a known LoRa state
    pub fn begin(&mut self) -> Result<()> {
        self.spi.open()?;

        self.sleep()?;
        thread::sleep(MODE_SETTLE);

        let version = self.version()?;
        if version != CHIP_VERSION {
            log::warn!("rfm95: unexpected version 0x{:02X}", version);
            return Err(Error::UnexpectedVersion { found: version });
        }

        self.write_register(REG_OP_MODE, LONG_RANGE_MODE)?;
        thread::sleep(MODE_SETTLE);

        self.write_register(REG_FIFO_TX_BASE_ADDR, 0)?;
        self.write_register(REG_FIFO_RX_BASE_ADDR, 0)?;
        // BW 125 kHz, CR 4/5, explicit header / SF7, CRC off / AGC on
        self.write_register(REG_MODEM_CONFIG_1, 0x72)?;
        self.write_register(REG_MODEM_CONFIG_2, 0x70)?;
        self.write_register(REG_MODEM_CONFIG_3, AGC_AUTO_ON)?;
        self.write_register(REG_PA_CONFIG, 0x8F)?;
        self.write_register(REG_PA_DAC, 0x87)?;
        self.write_register(REG_LNA, LNA_DEFAULT)?;
        self.write_register(REG_FIFO_ADDR_PTR, 0)?;

        self.standby()?;
        thread::sleep(MODE_SETTLE);

        log::info!("rfm95: initialized (version 0x{:02X})", version);
        Ok(())
    }

    /// Close the transport
    pub fn end(&mut self) {
        self.spi.close();
    }

    // ---------------------------------------------------------------------
    // Register access
    // ---------------------------------------------------------------------

    /// Read one register
    pub fn read_register(&mut self, addr: u8) -> Result<u8> {
        let data = self.spi.transfer(&[addr & ADDR_MASK], 1)?;
        let value = data.first().copied().ok_or(Error::ShortRead {
            expected: 1,
            got: 0,
        })?;
        log::trace!("rfm95: read  0x{:02X} -> 0x{:02X}", addr, value);
        Ok(value)
    }

    /// Write one register
    pub fn write_register(&mut self, addr: u8, value: u8) -> Result<()> {
        log::trace!("rfm95: write 0x{:02X} <- 0x{:02X}", addr, value);
        self.spi.transfer(&[addr | WRITE_FLAG, value], 0)?;
        Ok(())
    }

    /// Read `len` bytes from one register in a single burst
    fn read_burst(&mut self, addr: u8, len: usize) -> Result<Vec<u8>> {
        let data = self.spi.transfer(&[addr & ADDR_MASK], len)?;
        if data.len() != len {
            return Err(Error::ShortRead {
                expected: len,
                got: data.len(),
            });
        }
        Ok(data)
    }

    /// Write `data` to one register in a single burst
    fn write_burst(&mut self, addr: u8, data: &[u8]) -> Result<()> {
        let mut frame = Vec::with_capacity(data.len() + 1);
        frame.push(addr | WRITE_FLAG);
        frame.extend_from_slice(data);
        self.spi.transfer(&frame, 0)?;
        Ok(())
    }

    fn update_register(&mut self, addr: u8, mask: u8, bits: u8) -> Result<()> {
        let current = self.read_register(addr)?;
        self.write_register(addr, (current & !mask) | (bits & mask))
    }

    // ---------------------------------------------------------------------
    // Physical layer parameters
    // ---------------------------------------------------------------------

    /// Set the carrier frequency in MHz
    pub fn set_frequency(&mut self, mhz: f64) -> Result<()> {
        let frf = codec::frf_from_mhz(mhz);
        let [msb, mid, lsb] = codec::frf_to_bytes(frf);
        self.write_register(REG_FRF_MSB, msb)?;
        self.write_register(REG_FRF_MID, mid)?;
        self.write_register(REG_FRF_LSB, lsb)?;
        log::debug!("rfm95: frequency {:.6} MHz (frf 0x{:06X})", mhz, frf);
        Ok(())
    }

    /// Carrier frequency in MHz
    pub fn frequency(&mut self) -> Result<f64> {
        let bytes = [
            self.read_register(REG_FRF_MSB)?,
            self.read_register(REG_FRF_MID)?,
            self.read_register(REG_FRF_LSB)?,
        ];
        Ok(codec::mhz_from_frf(codec::frf_from_bytes(bytes)))
    }

    /// Set output power in dBm on the PA_BOOST or RFO pin
    ///
    /// Out-of-range levels are clamped (2..20 with PA_BOOST, 0..15 without).
    pub fn set_tx_power(&mut self, dbm: i8, pa_boost: bool) -> Result<()> {
        let reg = codec::encode_tx_power(dbm, pa_boost);
        self.write_register(REG_PA_CONFIG, reg)?;
        log::debug!("rfm95: tx power {} dBm, pa_boost={}", dbm, pa_boost);
        Ok(())
    }

    /// Output power in dBm and whether PA_BOOST is selected
    pub fn tx_power(&mut self) -> Result<(i8, bool)> {
        let reg = self.read_register(REG_PA_CONFIG)?;
        Ok(codec::decode_tx_power(reg))
    }

    /// Set the spreading factor (clamped to 6..12)
    ///
    /// Also programs the detection optimize/threshold pair, which differs
    /// for SF6.
    pub fn set_spreading_factor(&mut self, sf: u8) -> Result<()> {
        let sf = codec::clamp_spreading_factor(sf);
        let (optimize, threshold) = if sf == 6 {
            DETECTION_SF6
        } else {
            DETECTION_SF7_12
        };
        self.write_register(REG_DETECTION_OPTIMIZE, optimize)?;
        self.write_register(REG_DETECTION_THRESHOLD, threshold)?;
        self.update_register(REG_MODEM_CONFIG_2, 0xF0, sf << 4)?;
        log::debug!("rfm95: spreading factor {}", sf);
        Ok(())
    }

    /// Spreading factor
    pub fn spreading_factor(&mut self) -> Result<u8> {
        Ok(self.read_register(REG_MODEM_CONFIG_2)? >> 4)
    }

    /// Set the signal bandwidth to the first supported value >= `khz`
    pub fn set_bandwidth(&mut self, khz: f32) -> Result<()> {
        let idx = codec::bandwidth_index(khz);
        self.update_register(REG_MODEM_CONFIG_1, 0xF0, idx << 4)?;
        log::debug!(
            "rfm95: bandwidth {} kHz (requested {})",
            codec::bandwidth_khz(idx),
            khz
        );
        Ok(())
    }

    /// Signal bandwidth in kHz
    pub fn bandwidth(&mut self) -> Result<f32> {
        let idx = self.read_register(REG_MODEM_CONFIG_1)? >> 4;
        Ok(codec::bandwidth_khz(idx))
    }

    /// Set the coding rate denominator (clamped to 5..8, i.e. 4/5..4/8)
    pub fn set_coding_rate(&mut self, denominator: u8) -> Result<()> {
        let field = codec::coding_rate_field(denominator);
        self.update_register(REG_MODEM_CONFIG_1, 0x0E, field << 1)?;
        log::debug!("rfm95: coding rate 4/{}", field + 4);
        Ok(())
    }

    /// Coding rate denominator
    pub fn coding_rate(&mut self) -> Result<u8> {
        let field = (self.read_register(REG_MODEM_CONFIG_1)? >> 1) & 0x07;
        Ok(field + 4)
    }

    /// Set the preamble length in symbols
    pub fn set_preamble_length(&mut self, symbols: u16) -> Result<()> {
        let [msb, lsb] = symbols.to_be_bytes();
        self.write_register(REG_PREAMBLE_MSB, msb)?;
        self.write_register(REG_PREAMBLE_LSB, lsb)
    }

    /// Preamble length in symbols
    pub fn preamble_length(&mut self) -> Result<u16> {
        let msb = self.read_register(REG_PREAMBLE_MSB)?;
        let lsb = self.read_register(REG_PREAMBLE_LSB)?;
        Ok(u16::from_be_bytes([msb, lsb]))
    }

    /// Set the sync word
    pub fn set_sync_word(&mut self, sync_word: u8) -> Result<()> {
        self.write_register(REG_SYNC_WORD, sync_word)
    }

    /// Sync word
    pub fn sync_word(&mut self) -> Result<u8> {
        self.read_register(REG_SYNC_WORD)
    }

    /// Select inverted or normal I/Q
    pub fn set_invert_iq(&mut self, invert: bool) -> Result<()> {
        let (iq, iq2) = if invert { IQ_INVERTED } else { IQ_NORMAL };
        self.write_register(REG_INVERTIQ, iq)?;
        self.write_register(REG_INVERTIQ2, iq2)
    }

    /// True if RX I/Q is inverted
    pub fn invert_iq(&mut self) -> Result<bool> {
        Ok(self.read_register(REG_INVERTIQ)? & INVERTIQ_RX != 0)
    }

    /// Configure the LNA
    ///
    /// `gain` of `None` hands gain control to the AGC; `Some(1..=6)` fixes
    /// the gain (G1 is highest) and turns the AGC off.
    pub fn set_lna(&mut self, gain: Option<u8>, boost: bool) -> Result<()> {
        self.set_agc(gain.is_none())?;

        let mut lna = self.read_register(REG_LNA)?;
        if let Some(gain) = gain {
            lna = (lna & 0x1F) | (gain.clamp(1, 6) << 5);
        }
        if boost {
            lna |= LNA_BOOST_HF;
        } else {
            lna &= !LNA_BOOST_HF;
        }
        self.write_register(REG_LNA, lna)
    }

    /// Raw LNA register
    pub fn lna(&mut self) -> Result<u8> {
        self.read_register(REG_LNA)
    }

    /// Enable or disable automatic gain control
    pub fn set_agc(&mut self, enable: bool) -> Result<()> {
        let bits = if enable { AGC_AUTO_ON } else { 0 };
        self.update_register(REG_MODEM_CONFIG_3, AGC_AUTO_ON, bits)
    }

    /// True if automatic gain control is on
    pub fn agc(&mut self) -> Result<bool> {
        Ok(self.read_register(REG_MODEM_CONFIG_3)? & AGC_AUTO_ON != 0)
    }

    /// Apply a whole configuration
    pub fn configure(&mut self, config: &RadioConfig) -> Result<()> {
        self.set_frequency(config.frequency_mhz)?;
        self.set_tx_power(config.tx_power_dbm, config.pa_boost)?;
        self.set_spreading_factor(config.spreading_factor)?;
        self.set_bandwidth(config.bandwidth_khz)?;
        self.set_coding_rate(config.coding_rate)?;
        self.set_preamble_length(config.preamble_length)?;
        self.set_sync_word(config.sync_word)?;
        log::info!("rfm95: configured {}", config);
        Ok(())
    }

    /// Read the configuration back from the chip
    pub fn read_config(&mut self) -> Result<RadioConfig> {
        let (tx_power_dbm, pa_boost) = self.tx_power()?;
        Ok(RadioConfig {
            frequency_mhz: self.frequency()?,
            tx_power_dbm,
            pa_boost,
            spreading_factor: self.spreading_factor()?,
            bandwidth_khz: self.bandwidth()?,
            coding_rate: self.coding_rate()?,
            preamble_length: self.preamble_length()?,
            sync_word: self.sync_word()?,
        })
    }

    // ---------------------------------------------------------------------
    // Operating modes
    // ---------------------------------------------------------------------

    fn set_mode(&mut self, mode: OpMode) -> Result<()> {
        log::debug!("rfm95: mode -> {}", mode);
        self.write_register(REG_OP_MODE, LONG_RANGE_MODE | mode.bits())
    }

    /// Enter sleep, keeping the modem selection
    pub fn sleep(&mut self) -> Result<()> {
        self.update_register(REG_OP_MODE, MODE_MASK, OpMode::Sleep.bits())?;
        thread::sleep(MODE_SETTLE);
        Ok(())
    }

    /// Enter LoRa standby
    pub fn standby(&mut self) -> Result<()> {
        self.set_mode(OpMode::Standby)
    }

    /// Select the LoRa (true) or FSK (false) modem
    ///
    /// The chip only accepts this change in sleep, so sleep is entered first.
    pub fn set_lora_mode(&mut self, lora: bool) -> Result<()> {
        self.sleep()?;
        let bits = if lora { LONG_RANGE_MODE } else { 0 };
        self.update_register(REG_OP_MODE, LONG_RANGE_MODE, bits)?;
        thread::sleep(MODE_SETTLE);
        Ok(())
    }

    /// Current modem selection (true for LoRa) and operating mode
    pub fn operating_mode(&mut self) -> Result<(bool, OpMode)> {
        let reg = self.read_register(REG_OP_MODE)?;
        Ok((reg & LONG_RANGE_MODE != 0, OpMode::from_bits(reg)))
    }

    /// Prepare the FIFO and DIO0 for reception and enter continuous RX
    ///
    /// Reads the mode back and fails if the chip did not switch.
    pub fn set_continuous_receive(&mut self) -> Result<()> {
        self.standby()?;

        let rx_base = self.read_register(REG_FIFO_RX_BASE_ADDR)?;
        self.write_register(REG_FIFO_ADDR_PTR, rx_base)?;
        self.update_register(REG_DIO_MAPPING_1, 0xC0, DIO0_RX_DONE << 6)?;
        self.clear_irq_flags()?;

        self.update_register(REG_OP_MODE, MODE_MASK, OpMode::RxContinuous.bits())?;

        let found = self.read_register(REG_OP_MODE)? & MODE_MASK;
        if found != OpMode::RxContinuous.bits() {
            log::warn!("rfm95: could not enter continuous receive (mode {})", found);
            return Err(Error::ModeChangeFailed {
                expected: OpMode::RxContinuous.bits(),
                found,
            });
        }
        Ok(())
    }

    /// Enter continuous RX with the default LNA and SF7..12 detection
    pub fn receive_mode(&mut self) -> Result<()> {
        self.write_register(REG_FIFO_ADDR_PTR, 0)?;
        self.clear_irq_flags()?;
        self.write_register(REG_LNA, LNA_DEFAULT)?;
        let (optimize, threshold) = DETECTION_SF7_12;
        self.write_register(REG_DETECTION_OPTIMIZE, optimize)?;
        self.write_register(REG_DETECTION_THRESHOLD, threshold)?;
        self.set_mode(OpMode::RxContinuous)
    }

    // ---------------------------------------------------------------------
    // IRQ flags, DIO mapping, FIFO
    // ---------------------------------------------------------------------

    /// Latched IRQ flags
    pub fn irq_flags(&mut self) -> Result<IrqFlags> {
        Ok(IrqFlags::from_bits_retain(
            self.read_register(REG_IRQ_FLAGS)?,
        ))
    }

    /// Clear every IRQ flag
    pub fn clear_irq_flags(&mut self) -> Result<()> {
        self.clear_irq(IrqFlags::all())
    }

    /// Clear the given IRQ flags
    pub fn clear_irq(&mut self, flags: IrqFlags) -> Result<()> {
        self.write_register(REG_IRQ_FLAGS, flags.bits())
    }

    /// Map DIO0 and DIO4 (2-bit codes), unmask all IRQs and clear flags
    pub fn set_dio_mapping(&mut self, dio0: u8, dio4: u8) -> Result<()> {
        self.update_register(REG_DIO_MAPPING_1, 0xC0, dio0 << 6)?;
        self.update_register(REG_DIO_MAPPING_2, 0xC0, dio4 << 6)?;
        self.write_register(REG_IRQ_FLAGS_MASK, 0x00)?;
        self.clear_irq_flags()
    }

    /// Point the FIFO at address 0
    pub fn reset_rx_pointer(&mut self) -> Result<()> {
        self.write_register(REG_FIFO_ADDR_PTR, 0)
    }

    /// FIFO address of the last received packet
    pub fn fifo_rx_current_addr(&mut self) -> Result<u8> {
        self.read_register(REG_FIFO_RX_CURRENT_ADDR)
    }

    /// Length of the last received packet
    pub fn rx_nb_bytes(&mut self) -> Result<u8> {
        self.read_register(REG_RX_NB_BYTES)
    }

    /// Read the last received packet out of the FIFO
    pub fn read_payload(&mut self) -> Result<Vec<u8>> {
        let len = self.rx_nb_bytes()? as usize;
        let addr = self.fifo_rx_current_addr()?;
        self.write_register(REG_FIFO_ADDR_PTR, addr)?;
        if len == 0 {
            return Ok(Vec::new());
        }
        self.read_burst(REG_FIFO, len)
    }

    /// RSSI of the last packet in dBm
    pub fn packet_rssi(&mut self) -> Result<i16> {
        Ok(codec::rssi_dbm(self.read_register(REG_PKT_RSSI_VALUE)?))
    }

    /// SNR of the last packet in dB
    pub fn packet_snr(&mut self) -> Result<f32> {
        Ok(codec::snr_db(self.read_register(REG_PKT_SNR_VALUE)?))
    }

    // ---------------------------------------------------------------------
    // Packet state machines
    // ---------------------------------------------------------------------

    /// Transmit one packet and wait for TX_DONE
    ///
    /// Payloads over 255 bytes are rejected before any bus activity. Gives up
    /// with [`Error::TxTimeout`] after 2 s. Normal I/Q is restored afterwards
    /// if `invert_iq` was set.
    pub fn send(&mut self, data: &[u8], invert_iq: bool) -> Result<()> {
        if data.len() > MAX_PAYLOAD {
            return Err(Error::PayloadTooLarge(data.len()));
        }

        self.set_invert_iq(invert_iq)?;
        self.set_dio_mapping(DIO0_TX_DONE, DIO4_TX)?;
        self.standby()?;
        thread::sleep(POLL_INTERVAL);
        self.clear_irq_flags()?;

        self.write_register(REG_FIFO_ADDR_PTR, 0)?;
        self.write_burst(REG_FIFO, data)?;
        self.write_register(REG_PAYLOAD_LENGTH, data.len() as u8)?;

        self.set_mode(OpMode::Transmit)?;

        let start = Instant::now();
        loop {
            let flags = self.irq_flags()?;
            if flags.contains(IrqFlags::TX_DONE) {
                self.clear_irq_flags()?;
                self.standby()?;
                if invert_iq {
                    self.set_invert_iq(false)?;
                }
                log::info!("rfm95: sent {} byte(s)", data.len());
                return Ok(());
            }

            if start.elapsed() > TX_TIMEOUT {
                if invert_iq {
                    self.set_invert_iq(false)?;
                }
                log::warn!("rfm95: no TX_DONE after {:?}", TX_TIMEOUT);
                return Err(Error::TxTimeout);
            }

            thread::sleep(POLL_INTERVAL);
        }
    }

    /// Listen in continuous RX until a packet arrives or `timeout` elapses
    ///
    /// Returns the payload, or an empty vector on timeout. Packets failing
    /// the CRC are dropped (see [`crc_error_count`](Self::crc_error_count))
    /// and listening continues within the same deadline, as do zero-length
    /// packets.
    pub fn receive(&mut self, timeout: Duration, invert_iq: bool) -> Result<Vec<u8>> {
        self.set_invert_iq(invert_iq)?;
        self.set_mode(OpMode::RxContinuous)?;
        self.set_dio_mapping(DIO0_RX_DONE, DIO4_RX)?;
        self.clear_irq_flags()?;

        let start = Instant::now();
        loop {
            let flags = self.irq_flags()?;

            if flags.contains(IrqFlags::RX_DONE) {
                if flags.contains(IrqFlags::CRC_ERROR) {
                    self.crc_errors = self.crc_errors.wrapping_add(1);
                    log::debug!("rfm95: dropped packet with CRC error");
                    self.clear_irq_flags()?;
                } else {
                    let data = self.read_payload()?;
                    self.clear_irq_flags()?;
                    if !data.is_empty() {
                        if invert_iq {
                            self.set_invert_iq(false)?;
                        }
                        log::info!("rfm95: received {} byte(s)", data.len());
                        return Ok(data);
                    }
                    log::debug!("rfm95: ignored zero-length packet");
                }
            }

            if start.elapsed() > timeout {
                self.clear_irq_flags()?;
                if invert_iq {
                    self.set_invert_iq(false)?;
                }
                log::debug!("rfm95: receive timed out after {:?}", timeout);
                return Ok(Vec::new());
            }

            thread::sleep(POLL_INTERVAL);
        }
    }

    /// Packets dropped by [`receive`](Self::receive) because of CRC errors
    pub fn crc_error_count(&self) -> u32 {
        self.crc_errors
    }

    // ---------------------------------------------------------------------
    // Temperature sensor
    // ---------------------------------------------------------------------

    /// Run `f` with the chip in FSK sleep, restoring the previous mode
    ///
    /// The restore is attempted even if `f` fails; the first error wins.
    fn with_fsk_page<R>(&mut self, f: impl FnOnce(&mut Self) -> Result<R>) -> Result<R> {
        let saved = self.read_register(REG_OP_MODE)?;
        self.write_register(REG_OP_MODE, 0x00)?;
        thread::sleep(TEMP_SETTLE);

        let result = f(self);

        let restored = self.write_register(REG_OP_MODE, saved);
        thread::sleep(TEMP_SETTLE);
        if let Err(e) = &restored {
            log::warn!("rfm95: failed to restore mode 0x{:02X}: {}", saved, e);
        }

        let value = result?;
        restored?;
        Ok(value)
    }

    /// Read the on-die temperature sensor, offset by the stored calibration
    pub fn read_temperature(&mut self) -> Result<f32> {
        self.with_fsk_page(|radio| {
            let cal = radio.read_register(REG_FSK_TEMP_CAL)? as i8;
            let raw = radio.read_register(REG_FSK_TEMP)? as i8;
            Ok(raw as f32 + cal as f32)
        })
    }

    /// Store a calibration offset for [`read_temperature`](Self::read_temperature)
    pub fn calibrate_temperature(&mut self, offset: f32) -> Result<()> {
        let cal = offset.round().clamp(i8::MIN as f32, i8::MAX as f32) as i8;
        self.with_fsk_page(|radio| radio.write_register(REG_FSK_TEMP_CAL, cal as u8))?;
        log::debug!("rfm95: temperature calibration {}", cal);
        Ok(())
    }

    // ---------------------------------------------------------------------
    // Beacon
    // ---------------------------------------------------------------------

    /// Load `payload` and let the chip transmit it every `interval_ms`
    ///
    /// The chip counts whole seconds, so the interval is truncated.
    pub fn start_beacon(&mut self, payload: &[u8], interval_ms: u32) -> Result<()> {
        if payload.len() > MAX_PAYLOAD {
            return Err(Error::PayloadTooLarge(payload.len()));
        }

        self.set_dio_mapping(DIO0_TX_DONE, DIO4_TX)?;
        self.write_register(REG_FIFO_TX_BASE_ADDR, 0)?;
        self.write_register(REG_FIFO_ADDR_PTR, 0)?;
        self.write_burst(REG_FIFO, payload)?;
        self.write_register(REG_PAYLOAD_LENGTH, payload.len() as u8)?;

        let [msb, lsb] = codec::beacon_period(interval_ms).to_be_bytes();
        self.write_register(REG_BEACON_PERIOD_MSB, msb)?;
        self.write_register(REG_BEACON_PERIOD_LSB, lsb)?;

        let mode = self.read_register(REG_OP_MODE)? | LONG_RANGE_MODE;
        self.write_register(REG_OP_MODE, (mode & !MODE_MASK) | OpMode::Transmit.bits())?;

        log::info!(
            "rfm95: beacon of {} byte(s) every {} s",
            payload.len(),
            interval_ms / 1000
        );
        Ok(())
    }

    /// Stop beaconing by returning to standby
    pub fn stop_beacon(&mut self) -> Result<()> {
        self.standby()
    }

    // ---------------------------------------------------------------------
    // Diagnostics
    // ---------------------------------------------------------------------

    /// Silicon revision (0x12 for SX1276/RFM95)
    pub fn version(&mut self) -> Result<u8> {
        self.read_register(REG_VERSION)
    }

    /// Check that a register write reads back
    ///
    /// Writes a scratch value to the sync word and restores the old value.
    pub fn test_communication(&mut self) -> Result<bool> {
        let saved = self.read_register(REG_SYNC_WORD)?;
        self.write_register(REG_SYNC_WORD, SCRATCH_SYNC_WORD)?;
        let readback = self.read_register(REG_SYNC_WORD)?;
        self.write_register(REG_SYNC_WORD, saved)?;
        Ok(readback == SCRATCH_SYNC_WORD)
    }

    /// Named snapshot of the key registers
    pub fn register_dump(&mut self) -> Result<Vec<(&'static str, u8, u8)>> {
        DUMP_REGISTERS
            .iter()
            .map(|&(name, addr)| Ok((name, addr, self.read_register(addr)?)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::{InterruptCallback, PinMode};

    /// Register-file stub: every transfer is logged, registers are plain
    /// memory and the FIFO register is a byte sink.
    #[derive(Default)]
    struct StubSpi {
        regs: Vec<u8>,
        fifo: Vec<u8>,
        log: Vec<(Vec<u8>, usize)>,
    }

    impl StubSpi {
        fn new() -> Self {
            let mut regs = vec![0u8; 128];
            regs[REG_VERSION as usize] = CHIP_VERSION;
            Self {
                regs,
                ..Default::default()
            }
        }
    }

    impl SpiTransport for StubSpi {
        fn open(&mut self) -> Result<()> {
            Ok(())
        }

        fn close(&mut self) {}

        fn transfer(&mut self, write: &[u8], read_len: usize) -> Result<Vec<u8>> {
            self.log.push((write.to_vec(), read_len));
            let addr = write[0] & ADDR_MASK;
            if write[0] & WRITE_FLAG != 0 {
                if addr == REG_FIFO {
                    self.fifo.extend_from_slice(&write[1..]);
                } else if let Some(&v) = write.get(1) {
                    self.regs[addr as usize] = v;
                }
                Ok(Vec::new())
            } else {
                Ok(vec![self.regs[addr as usize]; read_len])
            }
        }

        fn digital_write(&mut self, _pin: u8, _high: bool) -> Result<()> {
            Ok(())
        }

        fn digital_read(&mut self, _pin: u8) -> Result<bool> {
            Ok(false)
        }

        fn pin_mode(&mut self, _pin: u8, _mode: PinMode) -> Result<()> {
            Ok(())
        }

        fn configure_interrupt(&mut self, _pin: u8, _enable: bool) -> Result<()> {
            Ok(())
        }

        fn set_interrupt_callback(&mut self, _callback: InterruptCallback) -> Result<()> {
            Ok(())
        }

        fn enable_interrupt(&mut self, _enable: bool) -> Result<()> {
            Ok(())
        }

        fn is_active(&self) -> bool {
            true
        }
    }

    #[test]
    fn test_register_wire_format() {
        let mut radio = Rfm95::new(StubSpi::new());
        radio.write_register(0x39, 0x34).unwrap();
        assert_eq!(radio.read_register(0x39).unwrap(), 0x34);

        let log = &radio.transport().log;
        assert_eq!(log[0], (vec![0xB9, 0x34], 0));
        assert_eq!(log[1], (vec![0x39], 1));
    }

    #[test]
    fn test_read_of_write_flagged_address_is_masked() {
        let mut radio = Rfm95::new(StubSpi::new());
        radio.read_register(0x80 | REG_VERSION).unwrap();
        assert_eq!(radio.transport().log[0].0, vec![REG_VERSION]);
    }

    #[test]
    fn test_oversized_payload_touches_nothing() {
        let mut radio = Rfm95::new(StubSpi::new());
        let err = radio.send(&[0u8; 256], false).unwrap_err();
        assert!(matches!(err, Error::PayloadTooLarge(256)));
        let err = radio.start_beacon(&[0u8; 300], 1000).unwrap_err();
        assert!(matches!(err, Error::PayloadTooLarge(300)));
        assert!(radio.transport().log.is_empty());
    }

    #[test]
    fn test_parameter_registers() {
        let mut radio = Rfm95::new(StubSpi::new());
        radio.configure(&RadioConfig::default()).unwrap();

        let regs = &radio.transport().regs;
        assert_eq!(
            &regs[REG_FRF_MSB as usize..=REG_FRF_LSB as usize],
            &[0xD9, 0x06, 0x66]
        );
        assert_eq!(regs[REG_PA_CONFIG as usize], 0x8F);
        assert_eq!(regs[REG_MODEM_CONFIG_1 as usize], 0x72);
        assert_eq!(regs[REG_MODEM_CONFIG_2 as usize] >> 4, 7);
        assert_eq!(regs[REG_DETECTION_OPTIMIZE as usize], 0xC3);
        assert_eq!(regs[REG_DETECTION_THRESHOLD as usize], 0x0A);
        assert_eq!(regs[REG_PREAMBLE_LSB as usize], 8);
        assert_eq!(regs[REG_SYNC_WORD as usize], 0x12);

        let back = radio.read_config().unwrap();
        assert_eq!(back.tx_power_dbm, 17);
        assert!(back.pa_boost);
        assert_eq!(back.spreading_factor, 7);
        assert_eq!(back.bandwidth_khz, 125.0);
        assert_eq!(back.coding_rate, 5);
        assert_eq!(back.preamble_length, 8);
        assert!((back.frequency_mhz - 868.1).abs() <= codec::FSTEP_MHZ);
    }

    #[test]
    fn test_sf6_uses_its_own_detection_pair() {
        let mut radio = Rfm95::new(StubSpi::new());
        radio.set_spreading_factor(3).unwrap();
        assert_eq!(radio.spreading_factor().unwrap(), 6);
        let regs = &radio.transport().regs;
        assert_eq!(regs[REG_DETECTION_OPTIMIZE as usize], 0xC5);
        assert_eq!(regs[REG_DETECTION_THRESHOLD as usize], 0x0C);
    }

    #[test]
    fn test_coding_rate_keeps_other_bits() {
        let mut radio = Rfm95::new(StubSpi::new());
        radio.write_register(REG_MODEM_CONFIG_1, 0x73).unwrap();
        radio.set_coding_rate(8).unwrap();
        assert_eq!(radio.read_register(REG_MODEM_CONFIG_1).unwrap(), 0x79);
        assert_eq!(radio.coding_rate().unwrap(), 8);
    }

    #[test]
    fn test_invert_iq_and_lna() {
        let mut radio = Rfm95::new(StubSpi::new());
        radio.set_invert_iq(true).unwrap();
        assert!(radio.invert_iq().unwrap());
        radio.set_invert_iq(false).unwrap();
        assert!(!radio.invert_iq().unwrap());

        radio.write_register(REG_MODEM_CONFIG_3, AGC_AUTO_ON).unwrap();
        radio.set_lna(Some(2), false).unwrap();
        assert!(!radio.agc().unwrap());
        assert_eq!(radio.lna().unwrap(), 0x40);
        radio.set_lna(None, true).unwrap();
        assert!(radio.agc().unwrap());
        assert_eq!(radio.lna().unwrap(), 0x43);
    }

    #[test]
    fn test_send_writes_payload_as_one_burst() {
        let mut stub = StubSpi::new();
        // TX_DONE already latched; the first poll after entering TX sees it
        stub.regs[REG_IRQ_FLAGS as usize] = IrqFlags::TX_DONE.bits();
        let mut radio = Rfm95::new(stub);

        // The stub does not clear flags on write-1, it stores 0xFF instead,
        // which still contains TX_DONE.
        radio.send(b"Hello", false).unwrap();

        let spi = radio.transport();
        assert_eq!(spi.fifo, b"Hello");
        assert_eq!(spi.regs[REG_PAYLOAD_LENGTH as usize], 5);
        let bursts: Vec<_> = spi
            .log
            .iter()
            .filter(|(w, _)| w[0] == REG_FIFO | WRITE_FLAG)
            .collect();
        assert_eq!(bursts.len(), 1);
        assert_eq!(
            spi.regs[REG_OP_MODE as usize],
            LONG_RANGE_MODE | OpMode::Standby.bits()
        );
    }

    #[test]
    fn test_beacon_registers() {
        let mut radio = Rfm95::new(StubSpi::new());
        radio.write_register(REG_OP_MODE, 0x01).unwrap();
        radio.start_beacon(b"beep", 5500).unwrap();

        let regs = &radio.transport().regs;
        assert_eq!(regs[REG_BEACON_PERIOD_MSB as usize], 0);
        assert_eq!(regs[REG_BEACON_PERIOD_LSB as usize], 5);
        assert_eq!(regs[REG_PAYLOAD_LENGTH as usize], 4);
        assert_eq!(regs[REG_OP_MODE as usize], 0x83);
        assert_eq!(radio.transport().fifo, b"beep");

        radio.stop_beacon().unwrap();
        assert_eq!(radio.operating_mode().unwrap(), (true, OpMode::Standby));
    }

    #[test]
    fn test_communication_probe_restores_sync_word() {
        let mut radio = Rfm95::new(StubSpi::new());
        radio.set_sync_word(0x34).unwrap();
        assert!(radio.test_communication().unwrap());
        assert_eq!(radio.sync_word().unwrap(), 0x34);
    }

    #[test]
    fn test_register_dump_names() {
        let mut radio = Rfm95::new(StubSpi::new());
        let dump = radio.register_dump().unwrap();
        assert_eq!(dump.len(), DUMP_REGISTERS.len());
        let version = dump.iter().find(|(name, _, _)| *name == "VERSION").unwrap();
        assert_eq!(version.2, CHIP_VERSION);
    }
}
