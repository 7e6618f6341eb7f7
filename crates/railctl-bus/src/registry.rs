//! Bus registry
//!
//! Opens bus backends by name from a `name:key=value,...` string and wraps
//! them into sessions. Callers never name a backend type directly.

use crate::shared::SharedSession;
use railctl_core::bus::RegisterBus;
use railctl_core::protocol::ReadPolicy;
use railctl_core::session::BusSession;
use std::collections::HashMap;

/// Type-erased bus handle
pub type BoxedBus = Box<dyn RegisterBus + Send>;

/// Parsed bus parameters
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BusParams {
    /// Backend name as given
    pub name: String,
    /// Key-value parameters
    pub params: HashMap<String, String>,
}

impl BusParams {
    /// Parameters as borrowed pairs, the form backend `parse_options` takes
    pub fn options(&self) -> Vec<(&str, &str)> {
        self.params
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
            .collect()
    }
}

/// Parse a bus string into name and parameters
///
/// Format: "name" or "name:key1=value1,key2=value2"
///
/// # Example
/// ```
/// use railctl_bus::parse_bus_params;
///
/// let params = parse_bus_params("linux_i2c:bus=1").unwrap();
/// assert_eq!(params.name, "linux_i2c");
/// assert_eq!(params.params.get("bus"), Some(&"1".to_string()));
/// ```
pub fn parse_bus_params(s: &str) -> Result<BusParams, Box<dyn std::error::Error>> {
    let (name, opts_str) = s.split_once(':').unwrap_or((s, ""));
    if name.trim().is_empty() {
        return Err("Empty bus name".into());
    }

    let mut params = HashMap::new();
    if !opts_str.is_empty() {
        for opt in opts_str.split(',') {
            if let Some((key, value)) = opt.split_once('=') {
                params.insert(key.trim().to_string(), value.trim().to_string());
            } else {
                return Err(
                    format!("Invalid parameter format: '{}' (expected key=value)", opt).into(),
                );
            }
        }
    }

    Ok(BusParams {
        name: name.trim().to_string(),
        params,
    })
}

/// Open a bus backend
///
/// # Arguments
/// * `bus` - Bus specification (e.g. "dummy:faults=5" or "linux_i2c:bus=1")
///
/// # Example
/// ```ignore
/// let bus = open_bus("linux_i2c:bus=1")?;
/// let mut session = BusSession::new(bus);
/// ```
pub fn open_bus(bus: &str) -> Result<BoxedBus, Box<dyn std::error::Error>> {
    let params = parse_bus_params(bus)?;

    match params.name.as_str() {
        #[cfg(feature = "dummy")]
        "dummy" => open_dummy(&params),

        #[cfg(feature = "linux-i2c")]
        "linux_i2c" | "linux-i2c" | "i2c" => open_linux_i2c(&params),

        _ => Err(format!(
            "Unknown bus: {} (available: {})",
            params.name,
            bus_names_short()
        )
        .into()),
    }
}

/// Open a bus and wrap it in an exclusively owned session
pub fn open_session(
    bus: &str,
    policy: ReadPolicy,
) -> Result<BusSession<BoxedBus>, Box<dyn std::error::Error>> {
    let bus = open_bus(bus)?;
    Ok(BusSession::with_policy(bus, policy))
}

/// Open a bus and wrap it in a session that can be shared between threads
pub fn open_shared(
    bus: &str,
    policy: ReadPolicy,
) -> Result<SharedSession, Box<dyn std::error::Error>> {
    Ok(SharedSession::new(open_session(bus, policy)?))
}

#[cfg(feature = "dummy")]
fn open_dummy(params: &BusParams) -> Result<BoxedBus, Box<dyn std::error::Error>> {
    log::info!("Opening dummy bus...");

    let options = params.options();
    let config = railctl_dummy::parse_options(&options)
        .map_err(|e| format!("Invalid dummy parameters: {}", e))?;
    Ok(Box::new(railctl_dummy::DummyBus::new(config)))
}

#[cfg(feature = "linux-i2c")]
fn open_linux_i2c(params: &BusParams) -> Result<BoxedBus, Box<dyn std::error::Error>> {
    use railctl_linux_i2c::{parse_options, LinuxI2c};

    log::info!("Opening Linux I2C bus...");

    let options = params.options();
    let config =
        parse_options(&options).map_err(|e| format!("Invalid linux_i2c parameters: {}", e))?;

    let bus = LinuxI2c::open(&config).map_err(|e| {
        format!(
            "Failed to open Linux I2C device: {}\n\
             Make sure the device exists and you have read/write permissions.\n\
             You may need to: sudo usermod -aG i2c $USER",
            e
        )
    })?;

    Ok(Box::new(bus))
}

/// Information about a bus backend
#[derive(Debug, Clone)]
pub struct BusInfo {
    /// Primary name (used for matching)
    pub name: &'static str,
    /// Alternative names
    pub aliases: &'static [&'static str],
    /// Short description
    pub description: &'static str,
}

/// Get information about all bus backends enabled at compile time
#[allow(unused_mut, clippy::vec_init_then_push)]
pub fn available_buses() -> Vec<BusInfo> {
    let mut buses = Vec::new();

    #[cfg(feature = "dummy")]
    buses.push(BusInfo {
        name: "dummy",
        aliases: &[],
        description: "Simulated layout with emulated boards (faults=<n>,boards=<a+b>,scan=fail)",
    });

    #[cfg(feature = "linux-i2c")]
    buses.push(BusInfo {
        name: "linux_i2c",
        aliases: &["linux-i2c", "i2c"],
        description: "Linux i2c-dev bus (bus=<n> or dev=/dev/i2c-N, settle=<ms>, i2cdetect=<path>)",
    });

    buses
}

/// Generate a short list of bus names for CLI help
pub fn bus_names_short() -> String {
    let buses = available_buses();
    if buses.is_empty() {
        return "none (recompile with features)".to_string();
    }
    let names: Vec<&str> = buses.iter().map(|b| b.name).collect();
    names.join(", ")
}
