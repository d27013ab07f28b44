//! GPIO lines through the character device interface
//!
//! Each line is requested from the chip on first use and held until
//! [`GpioLines::release_all`]. Direction changes reconfigure the existing
//! request instead of dropping it, so an output keeps its level until the
//! new configuration is applied.

use std::collections::BTreeMap;
use std::sync::Arc;

use gpiocdev::line::{Bias, EdgeDetection, Offset, Value};
use gpiocdev::request::{Config, Request};

use crate::error::{LinuxSpiError, Result};

/// Default GPIO chip
pub const DEFAULT_GPIO_CHIP: &str = "/dev/gpiochip0";

/// Consumer label shown by `gpioinfo`
const CONSUMER: &str = "lorabridge";

/// How a requested line is configured
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineSetting {
    /// Driven output with its current level
    Output(bool),
    /// Plain input
    Input,
    /// Input with the pull-up bias enabled
    InputPullUp,
    /// Input latching rising edges
    RisingEdge,
}

impl LineSetting {
    /// Whether the line is driven by us
    pub fn is_output(self) -> bool {
        matches!(self, LineSetting::Output(_))
    }

    fn config(self, offset: Offset) -> Config {
        let mut cfg = Config::default();
        let line = cfg.with_line(offset);
        match self {
            LineSetting::Output(high) => {
                line.as_output(level_value(high));
            }
            LineSetting::Input => {
                line.as_input();
            }
            LineSetting::InputPullUp => {
                line.as_input().with_bias(Bias::PullUp);
            }
            LineSetting::RisingEdge => {
                line.as_input().with_edge_detection(EdgeDetection::RisingEdge);
            }
        }
        cfg
    }
}

/// Map a logic level onto a line value
pub fn level_value(high: bool) -> Value {
    if high {
        Value::Active
    } else {
        Value::Inactive
    }
}

/// Map a line value onto a logic level
pub fn value_level(value: Value) -> bool {
    value == Value::Active
}

/// Resolve a `gpiochip=` option: a chip number or a device path
pub fn chip_path(value: &str) -> std::result::Result<String, String> {
    if value.starts_with('/') {
        return Ok(value.to_string());
    }
    let n: u32 = value
        .parse()
        .map_err(|_| format!("Invalid gpiochip value: {}", value))?;
    Ok(format!("/dev/gpiochip{}", n))
}

struct Line {
    request: Arc<Request>,
    setting: LineSetting,
}

/// Lines requested from one GPIO chip
pub struct GpioLines {
    chip: String,
    lines: BTreeMap<Offset, Line>,
}

impl Default for GpioLines {
    fn default() -> Self {
        Self::new(DEFAULT_GPIO_CHIP)
    }
}

impl GpioLines {
    /// Handle on `chip` with no lines requested yet
    pub fn new(chip: impl Into<String>) -> Self {
        Self {
            chip: chip.into(),
            lines: BTreeMap::new(),
        }
    }

    /// Chip device path
    pub fn chip(&self) -> &str {
        &self.chip
    }

    /// Current setting of a requested line
    pub fn setting(&self, offset: Offset) -> Option<LineSetting> {
        self.lines.get(&offset).map(|l| l.setting)
    }

    /// Request `offset` with `setting`, or reconfigure it if already held
    pub fn configure(&mut self, offset: Offset, setting: LineSetting) -> Result<()> {
        if let Some(line) = self.lines.get_mut(&offset) {
            if line.setting == setting {
                return Ok(());
            }
            line.request
                .reconfigure(&setting.config(offset))
                .map_err(|source| LinuxSpiError::ReconfigureFailed {
                    line: offset,
                    source,
                })?;
            line.setting = setting;
            log::debug!("linux_spi: GPIO {} now {:?}", offset, setting);
            return Ok(());
        }

        let request = Request::from_config(setting.config(offset))
            .on_chip(&self.chip)
            .with_consumer(CONSUMER)
            .request()
            .map_err(|source| LinuxSpiError::LineRequestFailed {
                line: offset,
                source,
            })?;
        log::debug!(
            "linux_spi: requested GPIO {} on {} as {:?}",
            offset,
            self.chip,
            setting
        );
        self.lines.insert(
            offset,
            Line {
                request: Arc::new(request),
                setting,
            },
        );
        Ok(())
    }

    /// Drive a line, turning it into an output if needed
    pub fn write(&mut self, offset: Offset, high: bool) -> Result<()> {
        match self.lines.get_mut(&offset) {
            Some(line) if line.setting.is_output() => {
                line.request
                    .set_value(offset, level_value(high))
                    .map_err(|source| LinuxSpiError::SetValueFailed {
                        line: offset,
                        source,
                    })?;
                line.setting = LineSetting::Output(high);
                Ok(())
            }
            _ => self.configure(offset, LineSetting::Output(high)),
        }
    }

    /// Sample a line, requesting it as an input if it is not held yet
    pub fn read(&mut self, offset: Offset) -> Result<bool> {
        if !self.lines.contains_key(&offset) {
            self.configure(offset, LineSetting::Input)?;
        }
        let request = self.handle(offset).ok_or(LinuxSpiError::NotOpen)?;
        sample(&request, offset)
    }

    /// Shared request handle for sampling from another thread
    pub fn handle(&self, offset: Offset) -> Option<Arc<Request>> {
        self.lines.get(&offset).map(|l| Arc::clone(&l.request))
    }

    /// Give a single line back to the kernel
    pub fn release(&mut self, offset: Offset) {
        if self.lines.remove(&offset).is_some() {
            log::debug!("linux_spi: released GPIO {}", offset);
        }
    }

    /// Give every line back to the kernel
    pub fn release_all(&mut self) {
        let count = self.lines.len();
        self.lines.clear();
        if count > 0 {
            log::debug!("linux_spi: released {} GPIO line(s)", count);
        }
    }
}

/// Read the level of `offset` through `request`
pub fn sample(request: &Request, offset: Offset) -> Result<bool> {
    request
        .value(offset)
        .map(value_level)
        .map_err(|source| LinuxSpiError::GetValueFailed {
            line: offset,
            source,
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case("0", "/dev/gpiochip0"; "number")]
    #[test_case("4", "/dev/gpiochip4"; "other number")]
    #[test_case("/dev/gpiochip2", "/dev/gpiochip2"; "path")]
    fn test_chip_path(value: &str, expected: &str) {
        assert_eq!(chip_path(value).unwrap(), expected);
    }

    #[test]
    fn test_chip_path_rejects_garbage() {
        assert!(chip_path("gpiochip0").is_err());
        assert!(chip_path("-1").is_err());
    }

    #[test]
    fn test_level_mapping() {
        assert_eq!(level_value(true), Value::Active);
        assert_eq!(level_value(false), Value::Inactive);
        assert!(value_level(Value::Active));
        assert!(!value_level(Value::Inactive));
    }

    #[test]
    fn test_setting_direction() {
        assert!(LineSetting::Output(false).is_output());
        assert!(!LineSetting::Input.is_output());
        assert!(!LineSetting::InputPullUp.is_output());
        assert!(!LineSetting::RisingEdge.is_output());
    }

    #[test]
    fn test_missing_chip_fails_without_holding_the_line() {
        let mut gpio = GpioLines::new("/nonexistent/gpiochip0");
        assert!(matches!(
            gpio.write(17, true),
            Err(LinuxSpiError::LineRequestFailed { line: 17, .. })
        ));
        assert!(matches!(
            gpio.read(4),
            Err(LinuxSpiError::LineRequestFailed { line: 4, .. })
        ));
        assert!(gpio.setting(17).is_none());
        assert!(gpio.handle(4).is_none());
        gpio.release_all();
    }
}
