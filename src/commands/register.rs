//! Register read/write commands

use railctl_core::access::RegisterAccess;
use railctl_core::bus::DeviceAddress;
use railctl_core::inventory::decode_text;
use std::error::Error;

fn hex(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|b| format!("{:02x}", b))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Read `length` data bytes from a register
pub fn cmd_read<A: RegisterAccess + ?Sized>(
    access: &mut A,
    address: DeviceAddress,
    register: u8,
    length: usize,
    text: bool,
    raw: bool,
) -> Result<(), Box<dyn Error>> {
    if raw {
        let bytes = access.read_raw(address, register, length)?;
        println!("{} register {} (raw): {}", address, register, hex(&bytes));
        return Ok(());
    }

    let frame = access.read_register(address, register, length)?;
    if frame.register != register {
        log::warn!(
            "{} echoed register {} for a read of {}",
            address,
            frame.register,
            register
        );
    }
    if text {
        println!("{} register {}: \"{}\"", address, register, decode_text(&frame.payload));
    } else {
        println!("{} register {}: {}", address, register, hex(&frame.payload));
    }
    Ok(())
}

/// Write data bytes to a register
pub fn cmd_write<A: RegisterAccess + ?Sized>(
    access: &mut A,
    address: DeviceAddress,
    register: u8,
    data: &[u8],
    verify: bool,
) -> Result<(), Box<dyn Error>> {
    if !verify {
        access.write_register(address, register, data)?;
        println!("Sent {} byte(s) to {} register {}", data.len(), address, register);
        return Ok(());
    }

    let report = access.write_register_verify(address, register, data)?;
    println!(
        "{} register {}: {} attempt(s), {} write / {} read exceptions, {} mismatches",
        address,
        register,
        report.attempts,
        report.write_exceptions,
        report.read_exceptions,
        report.data_mismatches
    );
    report.into_result(address, register)?;
    println!("Write confirmed");
    Ok(())
}
