//! Bus session: framing and shadow pin state
//!
//! The bridge keeps no pin state of its own that we can query, so the last
//! direction and output masks written are kept here and re-sent in full with
//! every pin command.

use std::thread;
use std::time::Duration;

use lorabridge_core::transport::PinMode;

use crate::error::{Ch341aError, Result};
use crate::pipe::BulkPipe;
use crate::protocol::*;

/// Settle time after enabling the pin drivers
const PIN_ENABLE_SETTLE: Duration = Duration::from_millis(10);

/// An open bridge: pipe plus shadow pin masks
pub(crate) struct BusSession<P> {
    pipe: P,
    lsb_first: bool,
    output: u8,
    direction: u8,
}

impl<P: BulkPipe> BusSession<P> {
    pub fn new(pipe: P, lsb_first: bool) -> Self {
        Self {
            pipe,
            lsb_first,
            output: OUTPUT_IDLE,
            direction: DIR_ALL_OUTPUT,
        }
    }

    /// Build a session and run [`BusSession::start`] on it
    pub fn started(pipe: P, lsb_first: bool) -> Result<Self> {
        let mut session = Self::new(pipe, lsb_first);
        session.start()?;
        Ok(session)
    }

    /// Configure the stream speed and drive all pins to idle
    pub fn start(&mut self) -> Result<()> {
        self.pipe.write(&speed_command(STM_SPEED_100K))?;
        self.pipe.write(&enable_pins_command(true))?;
        self.output = OUTPUT_IDLE;
        self.direction = DIR_ALL_OUTPUT;
        thread::sleep(PIN_ENABLE_SETTLE);
        log::debug!("CH341 pins enabled");
        Ok(())
    }

    /// Release every pin
    pub fn shutdown(&mut self) -> Result<()> {
        self.pipe.write(&enable_pins_command(false))?;
        self.direction = DIR_ALL_INPUT;
        log::debug!("CH341 pins disabled");
        Ok(())
    }

    #[inline]
    fn order(&self, b: u8) -> u8 {
        if self.lsb_first {
            reverse_byte(b)
        } else {
            b
        }
    }

    fn set_cs(&mut self, high: bool) -> Result<()> {
        let out = if high {
            self.output | PIN_CS
        } else {
            self.output & !PIN_CS
        };
        self.pipe.write(&output_command(out))
    }

    /// Clock one byte out and return the echoed byte
    fn clock(&mut self, byte: u8) -> Result<u8> {
        self.pipe.write(&spi_byte_command(self.order(byte)))?;
        let echo = self.pipe.read(1)?;
        let b = echo
            .first()
            .copied()
            .ok_or(Ch341aError::ShortRead { expected: 1, got: 0 })?;
        Ok(self.order(b))
    }

    fn clock_all(&mut self, write: &[u8], read_len: usize) -> Result<Vec<u8>> {
        for &b in write {
            self.clock(b)?;
        }
        let mut data = Vec::with_capacity(read_len);
        for _ in 0..read_len {
            data.push(self.clock(READ_FILLER)?);
        }
        Ok(data)
    }

    /// One chip-selected transaction: write `write`, then read `read_len`
    ///
    /// Chip-select is released even if clocking fails.
    pub fn transfer(&mut self, write: &[u8], read_len: usize) -> Result<Vec<u8>> {
        self.set_cs(false)?;
        let result = self.clock_all(write, read_len);
        let released = self.set_cs(true);

        let data = result?;
        released?;
        Ok(data)
    }

    fn send_pin_state(&mut self) -> Result<()> {
        self.pipe
            .write(&pin_state_command(self.output, self.direction))
    }

    fn check_output_pin(pin: u8) -> Result<()> {
        if pin == 0 || pin & !OUTPUT_PINS != 0 {
            return Err(Ch341aError::InvalidPin(pin));
        }
        Ok(())
    }

    pub fn digital_write(&mut self, pin: u8, high: bool) -> Result<()> {
        Self::check_output_pin(pin)?;
        self.direction |= pin;
        if high {
            self.output |= pin;
        } else {
            self.output &= !pin;
        }
        self.send_pin_state()
    }

    pub fn pin_mode(&mut self, pin: u8, mode: PinMode) -> Result<()> {
        Self::check_output_pin(pin)?;
        if mode.is_input() {
            self.direction &= !pin;
        } else {
            self.direction |= pin;
        }
        self.send_pin_state()
    }

    /// Current input levels of all eight lines
    pub fn read_input(&mut self) -> Result<u8> {
        self.pipe.write(&read_pins_command())?;
        let data = self.pipe.read(1)?;
        data.first()
            .copied()
            .ok_or(Ch341aError::ShortRead { expected: 1, got: 0 })
    }

    /// Sample one line; output-capable pins are switched to input first
    pub fn digital_read(&mut self, pin: u8) -> Result<bool> {
        if pin == 0 {
            return Err(Ch341aError::InvalidPin(pin));
        }
        self.direction &= !(pin & OUTPUT_PINS);
        self.send_pin_state()?;
        Ok(self.read_input()? & pin != 0)
    }
}
