//! CLI command implementations
//!
//! Every command opens its own session from the `--bus` options, runs, and
//! drops the bus on return. Commands that act on one kind of board accept an
//! explicit `--address`; without it they scan and take the first board of
//! that kind from the inventory.

pub mod diag;
mod list;
pub mod lights;
pub mod register;
pub mod scan;
pub mod throttle;
pub mod turnout;

pub use list::list_buses;

use crate::cli::BusArgs;
use railctl_bus::BoxedBus;
use railctl_core::access::RegisterAccess;
use railctl_core::bus::DeviceAddress;
use railctl_core::frame::EchoCheck;
use railctl_core::inventory::{self, BoardType};
use railctl_core::protocol::{ReadPolicy, RetryPolicy};
use railctl_core::session::BusSession;
use std::error::Error;

/// Protocol policy selected on the command line
pub fn read_policy(args: &BusArgs) -> ReadPolicy {
    ReadPolicy {
        retry: RetryPolicy::new(args.attempts).with_delay_us(args.retry_delay_us),
        echo: if args.ignore_echo {
            EchoCheck::Ignore
        } else {
            EchoCheck::Enforce
        },
    }
}

/// Open the bus named on the command line
pub fn open(args: &BusArgs) -> Result<BusSession<BoxedBus>, Box<dyn Error>> {
    railctl_bus::open_session(&args.bus, read_policy(args))
}

/// Use `explicit` or find the first board of `kind` on the bus
pub fn resolve_board<A: RegisterAccess + ?Sized>(
    access: &mut A,
    explicit: Option<DeviceAddress>,
    kind: BoardType,
) -> Result<DeviceAddress, Box<dyn Error>> {
    if let Some(address) = explicit {
        return Ok(address);
    }

    let found = access.enumerate();
    if let Some(e) = &found.probe_error {
        return Err(format!("Bus scan failed: {}", e).into());
    }
    let inventory = inventory::collect_inventory(access, &found.addresses);
    let entry = inventory
        .first_of(kind)
        .ok_or_else(|| format!("No {} board found on the bus (use --address)", kind))?;
    log::info!("Using {} board at {}", kind, entry.address);
    Ok(entry.address)
}
