//! Lighting board commands

use railctl_core::access::RegisterAccess;
use railctl_core::bus::DeviceAddress;
use railctl_core::lights::{LightsConfig, LightsPanel, Setting, SwitchKind};
use railctl_core::protocol::WriteReport;
use std::error::Error;
use std::path::Path;

/// Requested switch action
#[derive(Debug, Clone, Copy)]
pub enum LightsAction {
    /// Press "on" this many times
    On(u32),
    /// Press "off"
    Off,
    /// Jump to a setting
    Set(Setting),
    /// Move a slider
    Level(u8),
}

fn kind_name(kind: SwitchKind) -> &'static str {
    match kind {
        SwitchKind::Simple => "simple",
        SwitchKind::FourWay => "fourway",
        SwitchKind::Slider => "slider",
    }
}

/// Print the configured switches
pub fn cmd_list(config: &Path) -> Result<(), Box<dyn Error>> {
    let config = LightsConfig::from_toml_file(config)?;
    if config.switches.is_empty() {
        println!("No switches configured");
        return Ok(());
    }

    println!(
        "{:<24} {:<8} {:<12} {:>4} {:>4} {:>4} {:>4}",
        "Switch", "Kind", "Pins", "Off", "Low", "Med", "Full"
    );
    println!("{}", "-".repeat(68));
    for spec in &config.switches {
        let pins = spec
            .pins
            .iter()
            .map(u8::to_string)
            .collect::<Vec<_>>()
            .join(",");
        println!(
            "{:<24} {:<8} {:<12} {:>4} {:>4} {:>4} {:>4}",
            spec.text,
            kind_name(spec.kind),
            pins,
            spec.levels.off,
            spec.levels.low,
            spec.levels.medium,
            spec.levels.full
        );
    }
    Ok(())
}

/// Load the configuration and build a panel for `address`
pub fn load_panel(config: &Path, address: DeviceAddress) -> Result<LightsPanel, Box<dyn Error>> {
    let config = LightsConfig::from_toml_file(config)?;
    log::info!(
        "Loaded {} light switch(es), lights board at {}",
        config.switches.len(),
        address
    );
    Ok(LightsPanel::new(address, config))
}

fn summarize(reports: &[WriteReport]) -> Result<(), Box<dyn Error>> {
    let unconfirmed = reports.iter().filter(|r| !r.is_confirmed()).count();
    let retries: u32 = reports
        .iter()
        .map(|r| u32::from(r.attempts.saturating_sub(1)))
        .sum();
    println!(
        "{} pin write(s), {} retried attempt(s), {} unconfirmed",
        reports.len(),
        retries,
        unconfirmed
    );
    if unconfirmed > 0 {
        return Err(format!("{} pin write(s) were not confirmed", unconfirmed).into());
    }
    Ok(())
}

/// Operate one switch
pub fn cmd_switch<A: RegisterAccess + ?Sized>(
    access: &mut A,
    panel: &mut LightsPanel,
    switch: &str,
    action: LightsAction,
) -> Result<(), Box<dyn Error>> {
    let index = panel
        .position(switch)
        .ok_or_else(|| format!("No switch named '{}' in the configuration", switch))?;

    let mut reports = Vec::new();
    match action {
        LightsAction::On(presses) => {
            for _ in 0..presses.max(1) {
                reports.extend(panel.switch_on(access, index)?);
            }
        }
        LightsAction::Off => reports.extend(panel.switch_off(access, index)?),
        LightsAction::Set(setting) => reports.extend(panel.select(access, index, setting)?),
        LightsAction::Level(level) => reports.extend(panel.set_level(access, index, level)?),
    }

    let sw = &panel.switches()[index];
    println!(
        "{}: {} (level {})",
        sw.spec().text,
        sw.setting(),
        sw.level()
    );
    summarize(&reports)
}

/// Turn every switch on or off
pub fn cmd_all<A: RegisterAccess + ?Sized>(
    access: &mut A,
    panel: &mut LightsPanel,
    on: bool,
) -> Result<(), Box<dyn Error>> {
    let reports = if on {
        panel.all_on(access)?
    } else {
        panel.all_off(access)?
    };
    for sw in panel.switches() {
        println!("{:<24} {} (level {})", sw.spec().text, sw.setting(), sw.level());
    }
    summarize(&reports)
}
