//! Scan and inventory commands

use railctl_core::access::RegisterAccess;
use railctl_core::inventory::{self, Inventory};
use std::error::Error;

/// List responding addresses
pub fn cmd_scan<A: RegisterAccess + ?Sized>(access: &mut A) -> Result<(), Box<dyn Error>> {
    let found = access.enumerate();
    if let Some(e) = found.probe_error {
        return Err(format!("Bus scan failed: {}", e).into());
    }

    if found.addresses.is_empty() {
        println!("No devices found");
        return Ok(());
    }
    println!("Found {} device(s):", found.addresses.len());
    for address in &found.addresses {
        println!("  {}", address);
    }
    Ok(())
}

/// Scan and print every board's identification record
pub fn cmd_inventory<A: RegisterAccess + ?Sized>(
    access: &mut A,
    as_toml: bool,
) -> Result<(), Box<dyn Error>> {
    let found = access.enumerate();
    if let Some(e) = found.probe_error {
        return Err(format!("Bus scan failed: {}", e).into());
    }

    let inventory = inventory::collect_inventory(access, &found.addresses);
    if as_toml {
        print!("{}", inventory_toml(&inventory)?);
    } else {
        print_table(&inventory);
    }
    Ok(())
}

fn inventory_toml(inventory: &Inventory) -> Result<String, Box<dyn Error>> {
    Ok(toml::to_string_pretty(inventory)?)
}

fn print_table(inventory: &Inventory) {
    if inventory.is_empty() {
        println!("No devices found");
        return;
    }

    println!(
        "{:<18} {:>7} {:<10} {:>5} {:>5} {:<10} {:<10} {:<10}",
        "Description", "Address", "Type", "HW", "Inv", "Comm", "Inv SW", "App"
    );
    println!("{}", "-".repeat(82));

    for entry in inventory {
        let info = &entry.info;
        let description = if info.is_unknown() {
            "(unrecognised)"
        } else {
            info.description.as_str()
        };
        println!(
            "{:<18} {:>7} {:<10} {:>5} {:>5} {:<10} {:<10} {:<10}",
            description,
            entry.address.to_string(),
            info.board_type.to_string(),
            info.board_version,
            info.inventory_version,
            info.comm_version,
            info.inventory_sw_version,
            info.app_version
        );
    }
}
