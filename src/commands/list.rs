//! List commands implementation

use crate::transports;

/// List all transports compiled into this binary
pub fn list_transports() {
    println!("Supported transports:");
    println!();
    for t in transports::available_transports() {
        println!("  {:10} - {}", t.name, t.description);
        if !t.aliases.is_empty() {
            println!("  {:10}   aliases: {}", "", t.aliases.join(", "));
        }
    }
}

/// List attached CH341 bridges
#[cfg(feature = "ch341a")]
pub fn list_devices() -> Result<(), Box<dyn std::error::Error>> {
    let devices = lorabridge_ch341a::Ch341a::list_devices()?;
    if devices.is_empty() {
        println!("No CH341 devices found");
        return Ok(());
    }

    println!("{:<6} {:<12} {:>8}", "Index", "Bus", "Address");
    println!("{}", "-".repeat(28));
    for d in &devices {
        println!("{:<6} {:<12} {:>8}", d.index, d.bus, d.address);
    }
    Ok(())
}

/// List attached CH341 bridges
#[cfg(not(feature = "ch341a"))]
pub fn list_devices() -> Result<(), Box<dyn std::error::Error>> {
    Err("CH341 support not compiled in (enable the ch341a feature)".into())
}
