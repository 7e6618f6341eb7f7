//! List commands implementation

/// List the bus backends compiled into this binary
pub fn list_buses() {
    println!("Available buses:");
    println!();
    for bus in railctl_bus::available_buses() {
        let aliases = if bus.aliases.is_empty() {
            String::new()
        } else {
            format!(" (aliases: {})", bus.aliases.join(", "))
        };
        println!("  {:<10} - {}{}", bus.name, bus.description, aliases);
    }
}
