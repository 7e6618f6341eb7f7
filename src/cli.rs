//! CLI argument parsing

use clap::{Parser, Subcommand};
use railctl_core::bus::DeviceAddress;
use railctl_core::lights::Setting;
use railctl_core::throttle::{Channel, Direction};
use railctl_core::turnout::Position;
use std::path::PathBuf;

/// Parse a string as a hex or decimal u8
pub fn parse_hex_u8(s: &str) -> Result<u8, String> {
    if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        u8::from_str_radix(hex, 16).map_err(|e| format!("Invalid hex value: {}", e))
    } else {
        s.parse::<u8>().map_err(|e| format!("Invalid number: {}", e))
    }
}

/// Generate dynamic help text for the bus argument
fn bus_help() -> String {
    format!(
        "Bus to use, as name[:key=value,...] [available: {}]",
        railctl_bus::bus_names_short()
    )
}

#[derive(Parser)]
#[command(name = "railctl")]
#[command(author, version, about = "Model railroad layout bus controller", long_about = None)]
pub struct Cli {
    /// Verbosity level (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

/// Bus options shared across commands
#[derive(clap::Args, Debug, Clone)]
pub struct BusArgs {
    #[arg(short, long, default_value = "linux_i2c:bus=1", help = bus_help())]
    pub bus: String,

    /// Accept read frames whose echoed register id does not match
    #[arg(long)]
    pub ignore_echo: bool,

    /// Attempts per read or verified write
    #[arg(long, default_value_t = 4, value_parser = clap::value_parser!(u8).range(1..))]
    pub attempts: u8,

    /// Delay between attempts in microseconds
    #[arg(long, default_value_t = 0)]
    pub retry_delay_us: u32,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Scan the bus for responding devices
    Scan {
        #[command(flatten)]
        bus: BusArgs,
    },

    /// Scan the bus and read every board's identification registers
    Inventory {
        #[command(flatten)]
        bus: BusArgs,

        /// Print the inventory as TOML instead of a table
        #[arg(long)]
        toml: bool,
    },

    /// Read a register
    Read {
        #[command(flatten)]
        bus: BusArgs,

        /// Device address (e.g. 0x09)
        #[arg(short, long)]
        address: DeviceAddress,

        /// Register number
        #[arg(short, long, value_parser = parse_hex_u8)]
        register: u8,

        /// Data bytes to read
        #[arg(short, long, default_value_t = 1)]
        length: usize,

        /// Print the data as text
        #[arg(long)]
        text: bool,

        /// Read raw bytes without framing checks or retries
        #[arg(long)]
        raw: bool,
    },

    /// Write a register
    Write {
        #[command(flatten)]
        bus: BusArgs,

        /// Device address (e.g. 0x09)
        #[arg(short, long)]
        address: DeviceAddress,

        /// Register number
        #[arg(short, long, value_parser = parse_hex_u8)]
        register: u8,

        /// Data bytes, comma separated (hex or decimal)
        #[arg(short, long, value_delimiter = ',', value_parser = parse_hex_u8, required = true)]
        data: Vec<u8>,

        /// Send once without the sequence number and read-back confirmation
        #[arg(long)]
        no_verify: bool,
    },

    /// Bus diagnostics
    ///
    /// Each run stops after its iteration count. There is no early stop from
    /// the command line; interrupting the process ends it.
    #[command(subcommand)]
    Test(TestCommands),

    /// Lighting board control
    #[command(subcommand)]
    Lights(LightsCommands),

    /// Throttle board control
    #[command(subcommand)]
    Throttle(ThrottleCommands),

    /// Set a track switch
    Turnout {
        #[command(flatten)]
        bus: BusArgs,

        /// Switch board address (default: first switch board found)
        #[arg(short, long)]
        address: Option<DeviceAddress>,

        /// Turnout number on the board
        #[arg(long, value_parser = parse_hex_u8)]
        id: u8,

        /// normal or reverse
        position: Position,
    },

    /// List available buses
    ListBuses,
}

/// Options shared by the diagnostic runners
#[derive(clap::Args, Debug, Clone)]
pub struct TestArgs {
    #[command(flatten)]
    pub bus: BusArgs,

    /// Device to test (default: every device found by a scan)
    #[arg(short, long)]
    pub address: Option<DeviceAddress>,

    /// Number of iterations
    #[arg(short = 'n', long, default_value_t = 100)]
    pub iterations: u32,

    /// Pause between iterations in microseconds
    #[arg(long, default_value_t = railctl_core::diag::DEFAULT_PAUSE_US)]
    pub pause_us: u32,
}

/// Diagnostic subcommands
#[derive(Subcommand)]
pub enum TestCommands {
    /// Repeated single-attempt block reads, counting each fault class
    Read {
        #[command(flatten)]
        args: TestArgs,

        /// Register to read
        #[arg(short, long, value_parser = parse_hex_u8, default_value = "100")]
        register: u8,
    },

    /// Repeated verified block writes
    Write {
        #[command(flatten)]
        args: TestArgs,

        /// Register to write
        #[arg(short, long, value_parser = parse_hex_u8, default_value = "100")]
        register: u8,
    },

    /// Raw reads of the loopback register
    Loopback {
        #[command(flatten)]
        args: TestArgs,
    },
}

/// Options shared by the lighting subcommands
#[derive(clap::Args, Debug, Clone)]
pub struct LightsArgs {
    #[command(flatten)]
    pub bus: BusArgs,

    /// Light switch configuration (TOML format)
    #[arg(short, long)]
    pub config: PathBuf,

    /// Lighting board address (default: first lighting board found)
    #[arg(short, long)]
    pub address: Option<DeviceAddress>,
}

/// Lighting subcommands
#[derive(Subcommand)]
pub enum LightsCommands {
    /// Show the configured switches
    List {
        /// Light switch configuration (TOML format)
        #[arg(short, long)]
        config: PathBuf,
    },

    /// Press a switch's "on" side
    On {
        #[command(flatten)]
        args: LightsArgs,

        /// Switch text as in the configuration
        switch: String,

        /// Number of presses (four-way switches step once per press)
        #[arg(long, default_value_t = 1)]
        presses: u32,
    },

    /// Press a switch's "off" side
    Off {
        #[command(flatten)]
        args: LightsArgs,

        /// Switch text as in the configuration
        switch: String,
    },

    /// Jump a switch to a named setting
    Set {
        #[command(flatten)]
        args: LightsArgs,

        /// Switch text as in the configuration
        switch: String,

        /// off, low, medium or full
        setting: Setting,
    },

    /// Move a slider to a level
    Level {
        #[command(flatten)]
        args: LightsArgs,

        /// Switch text as in the configuration
        switch: String,

        /// Level, 0 to 100
        #[arg(value_parser = clap::value_parser!(u8).range(0..=100))]
        level: u8,
    },

    /// Turn every switch on
    AllOn {
        #[command(flatten)]
        args: LightsArgs,
    },

    /// Turn every switch off
    AllOff {
        #[command(flatten)]
        args: LightsArgs,
    },
}

/// Options shared by the throttle subcommands
#[derive(clap::Args, Debug, Clone)]
pub struct ThrottleArgs {
    #[command(flatten)]
    pub bus: BusArgs,

    /// Throttle board address (default: first throttle board found)
    #[arg(short, long)]
    pub address: Option<DeviceAddress>,
}

/// Throttle subcommands
#[derive(Subcommand)]
pub enum ThrottleCommands {
    /// Set the power level of a channel
    Power {
        #[command(flatten)]
        args: ThrottleArgs,

        /// Channel, A or B
        channel: Channel,

        /// Power, 0 to 100
        #[arg(value_parser = clap::value_parser!(u8).range(0..=100))]
        percent: u8,
    },

    /// Set the direction of travel
    Direction {
        #[command(flatten)]
        args: ThrottleArgs,

        /// Channel, A or B
        channel: Channel,

        /// forward or reverse
        direction: Direction,
    },

    /// Enable or disable simulated momentum
    Momentum {
        #[command(flatten)]
        args: ThrottleArgs,

        /// Channel, A or B
        channel: Channel,

        /// on or off
        #[arg(action = clap::ArgAction::Set, value_parser = clap::builder::BoolishValueParser::new())]
        enabled: bool,
    },

    /// Read the measured speed of both channels
    Speed {
        #[command(flatten)]
        args: ThrottleArgs,
    },

    /// Poll the measured speed in the background and print each reading
    ///
    /// Ends after --count readings per channel, or as many failed reads.
    Poll {
        #[command(flatten)]
        args: ThrottleArgs,

        /// Poll interval in milliseconds
        #[arg(long, default_value_t = 250)]
        interval_ms: u64,

        /// Stop after this many readings per channel
        #[arg(long, default_value_t = 20)]
        count: u32,
    },
}
