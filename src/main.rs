//! railctl - Model railroad layout bus controller
//!
//! Talks to the throttle, lighting and track switch boards of a layout over
//! a shared I2C bus using a small register protocol: checksummed frames,
//! bounded retries, and sequence-numbered writes confirmed by read-back.
//!
//! # Architecture
//!
//! Every command opens a bus by name (`-b linux_i2c:bus=1`, `-b dummy`)
//! through `railctl-bus` and then works purely in terms of registers:
//! - **scan / inventory** - enumerate the bus and read identification registers
//! - **read / write** - single register access, with or without confirmation
//! - **test** - read, write and loopback stress runs with fault counters
//! - **lights / throttle / turnout** - board-level helpers

mod cli;
mod commands;

use clap::Parser;
use cli::{Cli, Commands, LightsArgs, LightsCommands, TestCommands, ThrottleArgs, ThrottleCommands};
use commands::diag::TestKind;
use commands::lights::LightsAction;
use railctl_bus::BoxedBus;
use railctl_core::inventory::BoardType;
use railctl_core::session::BusSession;
use railctl_core::throttle::Throttle;
use railctl_core::turnout::TurnoutBoard;
use std::time::Duration;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logger
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    // Set log level based on verbosity
    match cli.verbose {
        0 => {} // default (info)
        1 => log::set_max_level(log::LevelFilter::Debug),
        _ => log::set_max_level(log::LevelFilter::Trace),
    }

    match cli.command {
        Commands::Scan { bus } => {
            let mut session = commands::open(&bus)?;
            commands::scan::cmd_scan(&mut session)
        }
        Commands::Inventory { bus, toml } => {
            let mut session = commands::open(&bus)?;
            commands::scan::cmd_inventory(&mut session, toml)
        }
        Commands::Read {
            bus,
            address,
            register,
            length,
            text,
            raw,
        } => {
            let mut session = commands::open(&bus)?;
            commands::register::cmd_read(&mut session, address, register, length, text, raw)
        }
        Commands::Write {
            bus,
            address,
            register,
            data,
            no_verify,
        } => {
            let mut session = commands::open(&bus)?;
            commands::register::cmd_write(&mut session, address, register, &data, !no_verify)
        }
        Commands::Test(subcmd) => {
            let (args, kind) = match subcmd {
                TestCommands::Read { args, register } => (args, TestKind::Read { register }),
                TestCommands::Write { args, register } => (args, TestKind::Write { register }),
                TestCommands::Loopback { args } => (args, TestKind::Loopback),
            };
            let mut session = commands::open(&args.bus)?;
            commands::diag::cmd_test(&mut session, &args, kind)
        }
        Commands::Lights(subcmd) => match subcmd {
            LightsCommands::List { config } => commands::lights::cmd_list(&config),
            LightsCommands::On {
                args,
                switch,
                presses,
            } => run_lights(&args, |session, panel| {
                commands::lights::cmd_switch(session, panel, &switch, LightsAction::On(presses))
            }),
            LightsCommands::Off { args, switch } => run_lights(&args, |session, panel| {
                commands::lights::cmd_switch(session, panel, &switch, LightsAction::Off)
            }),
            LightsCommands::Set {
                args,
                switch,
                setting,
            } => run_lights(&args, |session, panel| {
                commands::lights::cmd_switch(session, panel, &switch, LightsAction::Set(setting))
            }),
            LightsCommands::Level {
                args,
                switch,
                level,
            } => run_lights(&args, |session, panel| {
                commands::lights::cmd_switch(session, panel, &switch, LightsAction::Level(level))
            }),
            LightsCommands::AllOn { args } => run_lights(&args, |session, panel| {
                commands::lights::cmd_all(session, panel, true)
            }),
            LightsCommands::AllOff { args } => run_lights(&args, |session, panel| {
                commands::lights::cmd_all(session, panel, false)
            }),
        },
        Commands::Throttle(subcmd) => match subcmd {
            ThrottleCommands::Power {
                args,
                channel,
                percent,
            } => run_throttle(&args, |session, throttle| {
                commands::throttle::cmd_power(session, throttle, channel, percent)
            }),
            ThrottleCommands::Direction {
                args,
                channel,
                direction,
            } => run_throttle(&args, |session, throttle| {
                commands::throttle::cmd_direction(session, throttle, channel, direction)
            }),
            ThrottleCommands::Momentum {
                args,
                channel,
                enabled,
            } => run_throttle(&args, |session, throttle| {
                commands::throttle::cmd_momentum(session, throttle, channel, enabled)
            }),
            ThrottleCommands::Speed { args } => run_throttle(&args, |session, throttle| {
                commands::throttle::cmd_speed(session, throttle)
            }),
            ThrottleCommands::Poll {
                args,
                interval_ms,
                count,
            } => {
                let mut session = commands::open(&args.bus)?;
                let address =
                    commands::resolve_board(&mut session, args.address, BoardType::Throttle)?;
                commands::throttle::cmd_poll(
                    railctl_bus::SharedSession::new(session),
                    Throttle::new(address),
                    Duration::from_millis(interval_ms),
                    count,
                )
            }
        },
        Commands::Turnout {
            bus,
            address,
            id,
            position,
        } => {
            let mut session = commands::open(&bus)?;
            let address = commands::resolve_board(&mut session, address, BoardType::Switches)?;
            commands::turnout::cmd_turnout(&mut session, TurnoutBoard::new(address), id, position)
        }
        Commands::ListBuses => {
            commands::list_buses();
            Ok(())
        }
    }
}

type Session = BusSession<BoxedBus>;

/// Open the bus, locate the lights board and run `f` on a fresh panel
fn run_lights<F>(args: &LightsArgs, f: F) -> Result<(), Box<dyn std::error::Error>>
where
    F: FnOnce(&mut Session, &mut railctl_core::lights::LightsPanel) -> Result<(), Box<dyn std::error::Error>>,
{
    let mut session = commands::open(&args.bus)?;
    let address = commands::resolve_board(&mut session, args.address, BoardType::Lights)?;
    let mut panel = commands::lights::load_panel(&args.config, address)?;
    f(&mut session, &mut panel)
}

/// Open the bus, locate the throttle board and run `f` on it
fn run_throttle<F>(args: &ThrottleArgs, f: F) -> Result<(), Box<dyn std::error::Error>>
where
    F: FnOnce(&mut Session, Throttle) -> Result<(), Box<dyn std::error::Error>>,
{
    let mut session = commands::open(&args.bus)?;
    let address = commands::resolve_board(&mut session, args.address, BoardType::Throttle)?;
    f(&mut session, Throttle::new(address))
}
