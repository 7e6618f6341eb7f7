//! Lighting control
//!
//! Light switches are defined in a TOML file and drive pins on the lights
//! board. Every level change is a verified write of `[pin, level]` to
//! [`crate::registers::LIGHT_POWER_LEVEL`].

mod config;
mod panel;
mod switch;

pub use config::{Levels, LightsConfig, SwitchKind, SwitchSpec, MAX_LEVEL};
pub use panel::{LightsPanel, ALL_SWITCH_PAUSE_US};
pub use switch::{LightSwitch, Setting};
