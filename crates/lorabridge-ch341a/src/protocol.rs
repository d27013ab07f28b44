//! CH341 protocol constants and command builders

// Allow unused constants - they document the command vocabulary
#![allow(dead_code)]

use std::time::Duration;

/// CH341 USB Vendor ID
pub const CH341_USB_VENDOR: u16 = 0x1A86;
/// CH341 USB Product ID (serial bus / parallel mode)
pub const CH341_USB_PRODUCT: u16 = 0x5512;

/// Bulk OUT endpoint
pub const WRITE_EP: u8 = 0x02;
/// Bulk IN endpoint
pub const READ_EP: u8 = 0x82;

/// Default timeout for a single bulk transfer
pub const USB_TIMEOUT: Duration = Duration::from_millis(1000);

// Command opcodes
pub const CMD_SPI_STREAM: u8 = 0xA8;
pub const CMD_I2C_STREAM: u8 = 0xAA;
pub const CMD_UIO_STREAM: u8 = 0xAB;

// I2C stream sub-commands
pub const CMD_I2C_STM_SET: u8 = 0x60;
pub const CMD_I2C_STM_END: u8 = 0x00;

// UIO stream sub-commands
pub const CMD_UIO_STM_IN: u8 = 0x00;
pub const CMD_UIO_STM_DIR: u8 = 0x40;
pub const CMD_UIO_STM_OUT: u8 = 0x80;
pub const CMD_UIO_STM_END: u8 = 0x20;

/// Stream speed code for 100 kHz
pub const STM_SPEED_100K: u8 = 0x01;

/// D0 drives chip-select
pub const PIN_CS: u8 = 0x01;
/// D3 is the serial clock
pub const PIN_SCK: u8 = 0x08;
/// Input bit carrying the radio's active-low INT# line
pub const PIN_INT: u8 = 0x40;

/// Pins usable as outputs (D0..D5)
pub const OUTPUT_PINS: u8 = 0x3F;
/// Idle output pattern: chip-select high, clock low, data high
pub const OUTPUT_IDLE: u8 = 0x37;
/// Direction with all six pins driven
pub const DIR_ALL_OUTPUT: u8 = 0x3F;
/// Direction with every pin released
pub const DIR_ALL_INPUT: u8 = 0x00;

/// Dummy byte clocked out while reading
pub const READ_FILLER: u8 = 0xFF;

/// Reverse the bit order of a byte
#[inline]
pub fn reverse_byte(b: u8) -> u8 {
    b.reverse_bits()
}

/// Stream speed configuration
pub fn speed_command(speed: u8) -> [u8; 3] {
    [
        CMD_I2C_STREAM,
        CMD_I2C_STM_SET | (speed & 0x07),
        CMD_I2C_STM_END,
    ]
}

/// Output-only pin update, used for chip-select toggling
pub fn output_command(output: u8) -> [u8; 3] {
    [
        CMD_UIO_STREAM,
        CMD_UIO_STM_OUT | (output & OUTPUT_PINS),
        CMD_UIO_STM_END,
    ]
}

/// Full pin state update: output levels and directions
pub fn pin_state_command(output: u8, direction: u8) -> [u8; 4] {
    [
        CMD_UIO_STREAM,
        CMD_UIO_STM_OUT | (output & OUTPUT_PINS),
        CMD_UIO_STM_DIR | (direction & OUTPUT_PINS),
        CMD_UIO_STM_END,
    ]
}

/// Pin enable/disable sequence sent at open and close
///
/// The idle pattern is repeated to give the lines time to settle before the
/// direction change.
pub fn enable_pins_command(enable: bool) -> [u8; 6] {
    let dir = if enable { DIR_ALL_OUTPUT } else { DIR_ALL_INPUT };
    [
        CMD_UIO_STREAM,
        CMD_UIO_STM_OUT | OUTPUT_IDLE,
        CMD_UIO_STM_OUT | OUTPUT_IDLE,
        CMD_UIO_STM_OUT | OUTPUT_IDLE,
        CMD_UIO_STM_DIR | dir,
        CMD_UIO_STM_END,
    ]
}

/// Request the current input levels (answered with one byte)
pub fn read_pins_command() -> [u8; 3] {
    [CMD_UIO_STREAM, CMD_UIO_STM_IN, CMD_UIO_STM_END]
}

/// Clock one byte
pub fn spi_byte_command(byte: u8) -> [u8; 2] {
    [CMD_SPI_STREAM, byte]
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case(0x00, 0x00; "zero")]
    #[test_case(0xFF, 0xFF; "ones")]
    #[test_case(0x01, 0x80; "low bit")]
    #[test_case(0x80, 0x01; "high bit")]
    #[test_case(0x0F, 0xF0; "nibble")]
    #[test_case(0x42, 0x42; "palindrome")]
    #[test_case(0x12, 0x48; "version")]
    fn test_reverse_byte_known_values(input: u8, expected: u8) {
        assert_eq!(reverse_byte(input), expected);
    }

    #[test]
    fn test_reverse_byte_is_involution() {
        for b in 0..=255u8 {
            assert_eq!(reverse_byte(reverse_byte(b)), b);
        }
    }

    #[test]
    fn test_command_encoding() {
        assert_eq!(speed_command(STM_SPEED_100K), [0xAA, 0x61, 0x00]);
        assert_eq!(output_command(0x36), [0xAB, 0xB6, 0x20]);
        assert_eq!(pin_state_command(0x37, 0x3F), [0xAB, 0xB7, 0x7F, 0x20]);
        assert_eq!(
            enable_pins_command(true),
            [0xAB, 0xB7, 0xB7, 0xB7, 0x7F, 0x20]
        );
        assert_eq!(
            enable_pins_command(false),
            [0xAB, 0xB7, 0xB7, 0xB7, 0x40, 0x20]
        );
        assert_eq!(read_pins_command(), [0xAB, 0x00, 0x20]);
        assert_eq!(spi_byte_command(0x42), [0xA8, 0x42]);
    }
}
