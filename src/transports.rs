//! Transport registration and dispatch
//!
//! This module provides a centralized registry for all transports, with
//! support for feature-gated inclusion and dynamic help text generation.

use lorabridge_core::transport::SpiTransport;

/// Information about a transport
pub struct TransportInfo {
    /// Primary name (used for matching)
    pub name: &'static str,
    /// Alternative names/aliases
    pub aliases: &'static [&'static str],
    /// Short description
    pub description: &'static str,
}

/// Get information about all available transports (enabled at compile time)
#[allow(unused_mut, clippy::vec_init_then_push)]
pub fn available_transports() -> Vec<TransportInfo> {
    let mut transports = Vec::new();

    #[cfg(feature = "dummy")]
    transports.push(TransportInfo {
        name: "dummy",
        aliases: &[],
        description: "In-memory radio emulator for testing (rx=<text> queues a packet)",
    });

    #[cfg(feature = "ch341a")]
    transports.push(TransportInfo {
        name: "ch341a",
        aliases: &["ch341a_spi", "ch341"],
        description: "CH341 USB bridge (VID:1a86 PID:5512) (index=<n>,lsb=<0|1>)",
    });

    #[cfg(feature = "linux-spi")]
    transports.push(TransportInfo {
        name: "linux_spi",
        aliases: &["linux-spi", "spidev"],
        description: "Linux spidev interface (dev=/dev/spidevX.Y,spispeed=<kHz>,mode=<0-3>,gpiochip=<n>)",
    });

    transports
}

/// Generate help text listing all available transports
pub fn transport_help() -> String {
    let transports = available_transports();

    if transports.is_empty() {
        return "No transports available (recompile with transport features enabled)".to_string();
    }

    let mut help = String::from("Available transports:\n");
    for t in &transports {
        help.push_str(&format!("  {:10} - {}\n", t.name, t.description));
    }
    help
}

/// Resolve a name or alias to the canonical transport name
pub fn find_transport(name: &str) -> Option<&'static str> {
    available_transports()
        .into_iter()
        .find(|t| t.name == name || t.aliases.contains(&name))
        .map(|t| t.name)
}

/// Parse a transport string into name and options
///
/// Format: "name" or "name:option1=value1,option2=value2"
pub fn parse_transport_string(s: &str) -> (&str, Vec<(&str, &str)>) {
    if let Some((name, opts)) = s.split_once(':') {
        let options: Vec<_> = opts
            .split(',')
            .filter_map(|opt| opt.split_once('='))
            .collect();
        (name, options)
    } else {
        (s, Vec::new())
    }
}

/// Parse a boolean option value (`1`/`0`, `yes`/`no`, `true`/`false`)
#[cfg_attr(not(feature = "ch341a"), allow(dead_code))]
fn parse_flag(key: &str, value: &str) -> Result<bool, String> {
    match value {
        "1" | "yes" | "true" | "on" => Ok(true),
        "0" | "no" | "false" | "off" => Ok(false),
        _ => Err(format!("Invalid {} value: {}", key, value)),
    }
}

/// Build the transport named by `selector`
///
/// The transport is returned closed; the radio driver opens it in
/// `begin()`.
#[allow(unused_variables)]
pub fn open_transport(selector: &str) -> Result<Box<dyn SpiTransport>, Box<dyn std::error::Error>> {
    let (name, options) = parse_transport_string(selector);

    let canonical_name = match find_transport(name) {
        Some(n) => n,
        None => return Err(unknown_transport_error(name)),
    };

    match canonical_name {
        #[cfg(feature = "dummy")]
        "dummy" => {
            let mut radio = lorabridge_dummy::DummyRadio::new_default();
            for (key, value) in &options {
                match *key {
                    "rx" => radio.queue_packet(value.as_bytes()),
                    _ => log::warn!("dummy: Unknown option: {}={}", key, value),
                }
            }
            Ok(Box::new(radio))
        }

        #[cfg(feature = "ch341a")]
        "ch341a" => {
            use lorabridge_ch341a::{Ch341a, Ch341aConfig};

            let mut config = Ch341aConfig::default();
            for (key, value) in &options {
                match *key {
                    "index" => {
                        let index = value
                            .parse()
                            .map_err(|_| format!("Invalid index value: {}", value))?;
                        config = config.with_index(index);
                    }
                    "lsb" => config = config.with_lsb_first(parse_flag(key, value)?),
                    _ => log::warn!("ch341a: Unknown option: {}={}", key, value),
                }
            }

            log::info!("Using CH341 #{}", config.index);
            Ok(Box::new(Ch341a::new(config)))
        }

        #[cfg(feature = "linux-spi")]
        "linux_spi" => {
            use lorabridge_linux_spi::{parse_options, LinuxSpi};

            let config = parse_options(&options)
                .map_err(|e| format!("Invalid linux_spi parameters: {}", e))?;
            log::info!("Using {}", config.device);
            Ok(Box::new(LinuxSpi::new(config)))
        }

        _ => Err(unknown_transport_error(name)),
    }
}

fn unknown_transport_error(name: &str) -> Box<dyn std::error::Error> {
    let mut msg = format!("Unknown transport: {}\n\n", name);
    msg.push_str(&transport_help());
    msg.push_str("\nUse 'lorabridge list-transports' for more details");
    msg.into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test]
    fn test_parse_transport_string() {
        assert_eq!(parse_transport_string("dummy"), ("dummy", vec![]));
        assert_eq!(
            parse_transport_string("ch341a:index=1,lsb=1"),
            ("ch341a", vec![("index", "1"), ("lsb", "1")])
        );
        assert_eq!(
            parse_transport_string("linux_spi:dev=/dev/spidev0.0,junk"),
            ("linux_spi", vec![("dev", "/dev/spidev0.0")])
        );
    }

    #[test_case("1", Ok(true); "one")]
    #[test_case("yes", Ok(true); "yes")]
    #[test_case("0", Ok(false); "zero")]
    #[test_case("off", Ok(false); "off")]
    #[test_case("maybe", Err(()); "invalid")]
    fn test_parse_flag(value: &str, expected: Result<bool, ()>) {
        assert_eq!(parse_flag("lsb", value).map_err(|_| ()), expected);
    }

    #[test]
    fn test_unknown_transport() {
        assert!(find_transport("serprog").is_none());
        let err = open_transport("serprog").err().unwrap();
        assert!(err.to_string().contains("Unknown transport: serprog"));
    }

    #[cfg(feature = "ch341a")]
    #[test_case("ch341a"; "name")]
    #[test_case("ch341a_spi"; "alias spi")]
    #[test_case("ch341"; "alias short")]
    fn test_ch341a_aliases(name: &str) {
        assert_eq!(find_transport(name), Some("ch341a"));
    }

    #[cfg(feature = "ch341a")]
    #[test]
    fn test_ch341a_bad_index() {
        assert!(open_transport("ch341a:index=abc").is_err());
        assert!(open_transport("ch341a:lsb=2").is_err());
    }

    #[cfg(feature = "ch341a")]
    #[test]
    fn test_ch341a_is_built_closed() {
        let transport = open_transport("ch341a:index=3,lsb=1").unwrap();
        assert!(!transport.is_active());
    }

    #[cfg(feature = "linux-spi")]
    #[test]
    fn test_linux_spi_requires_device() {
        assert_eq!(find_transport("spidev"), Some("linux_spi"));
        let err = open_transport("linux_spi").err().unwrap();
        assert!(err.to_string().contains("No device specified"));
    }

    #[cfg(feature = "dummy")]
    #[test]
    fn test_dummy_delivers_queued_packets() {
        use lorabridge_core::radio::Rfm95;
        use std::time::Duration;

        let transport = open_transport("dummy:rx=hello,rx=world").unwrap();
        let mut radio = Rfm95::new(transport);
        radio.begin().unwrap();
        assert_eq!(
            radio.receive(Duration::from_millis(100), false).unwrap(),
            b"hello"
        );
        assert_eq!(
            radio.receive(Duration::from_millis(100), false).unwrap(),
            b"world"
        );
        assert!(radio
            .receive(Duration::from_millis(20), false)
            .unwrap()
            .is_empty());
    }
}
