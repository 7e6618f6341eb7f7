//! Light switch configuration file
//!
//! ```toml
//! [[switch]]
//! text = "Station platform"
//! type = "fourway"
//! pins = [4, 5]
//! off_setting = 0
//! low_setting = 20
//! medium_setting = 50
//! full_setting = 100
//!
//! [[switch]]
//! text = "Engine shed"
//! type = "simple"
//! pins = "7"
//! full_setting = 80
//! ```

use crate::error::{Error, Result};
use std::fs;
use std::path::Path;

/// Highest power level a board accepts
pub const MAX_LEVEL: u8 = 100;

/// How a switch is operated
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwitchKind {
    /// On/off
    Simple,
    /// Cycles through low, medium and full
    FourWay,
    /// Any level from 0 to 100
    Slider,
}

impl SwitchKind {
    fn from_name(name: &str) -> Option<Self> {
        match name {
            "simple" => Some(Self::Simple),
            "fourway" => Some(Self::FourWay),
            "slider" => Some(Self::Slider),
            _ => None,
        }
    }
}

/// Power levels for each setting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Levels {
    /// Off
    pub off: u8,
    /// Low
    pub low: u8,
    /// Medium
    pub medium: u8,
    /// Full
    pub full: u8,
}

/// One configured switch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwitchSpec {
    /// Label
    pub text: String,
    /// Operating mode
    pub kind: SwitchKind,
    /// Board pins driven together
    pub pins: Vec<u8>,
    /// Level table
    pub levels: Levels,
}

/// Parsed light switch configuration
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LightsConfig {
    /// Switches in file order
    pub switches: Vec<SwitchSpec>,
}

#[derive(Debug, serde::Deserialize)]
struct TomlLightsFile {
    #[serde(default)]
    switch: Vec<TomlSwitch>,
}

#[derive(Debug, serde::Deserialize)]
struct TomlSwitch {
    text: String,
    #[serde(rename = "type", alias = "kind")]
    kind: String,
    pins: PinList,
    #[serde(default)]
    off_setting: u8,
    low_setting: Option<u8>,
    medium_setting: Option<u8>,
    full_setting: u8,
}

/// Pins as a TOML array or as a comma separated string
#[derive(Debug, serde::Deserialize)]
#[serde(untagged)]
enum PinList {
    List(Vec<u8>),
    Str(String),
}

impl PinList {
    fn into_pins(self) -> std::result::Result<Vec<u8>, String> {
        match self {
            PinList::List(pins) => Ok(pins),
            PinList::Str(s) => s
                .split(',')
                .map(|p| {
                    p.trim()
                        .parse::<u8>()
                        .map_err(|e| format!("invalid pin {:?}: {}", p.trim(), e))
                })
                .collect(),
        }
    }
}

impl TomlSwitch {
    fn into_spec(self, kind: SwitchKind) -> Result<SwitchSpec> {
        let text = self.text;
        let err = |msg: String| Error::Config(format!("switch {:?}: {}", text, msg));

        let pins = self.pins.into_pins().map_err(err)?;
        if pins.is_empty() {
            return Err(err("no pins".into()));
        }

        let levels = match kind {
            SwitchKind::Simple => Levels {
                off: self.off_setting,
                low: self.full_setting,
                medium: self.full_setting,
                full: self.full_setting,
            },
            SwitchKind::FourWay | SwitchKind::Slider => {
                let (Some(low), Some(medium)) = (self.low_setting, self.medium_setting) else {
                    return Err(err("low_setting and medium_setting are required".into()));
                };
                Levels {
                    off: self.off_setting,
                    low,
                    medium,
                    full: self.full_setting,
                }
            }
        };

        if levels.full > MAX_LEVEL {
            return Err(err(format!("level {} above {}", levels.full, MAX_LEVEL)));
        }
        if !(levels.off <= levels.low && levels.low <= levels.medium && levels.medium <= levels.full) {
            return Err(err("levels must not decrease from off to full".into()));
        }

        Ok(SwitchSpec {
            text,
            kind,
            pins,
            levels,
        })
    }
}

impl LightsConfig {
    /// Load a configuration from a TOML file
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))?;
        Self::from_toml_str(&content)
    }

    /// Parse a configuration from a TOML string
    ///
    /// Entries with an unknown `type` are skipped with a warning.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let file: TomlLightsFile =
            toml::from_str(content).map_err(|e| Error::Config(e.to_string()))?;

        let mut switches = Vec::with_capacity(file.switch.len());
        for entry in file.switch {
            match SwitchKind::from_name(&entry.kind) {
                Some(kind) => switches.push(entry.into_spec(kind)?),
                None => log::warn!("Unknown switch type {:?} for {:?}, skipping", entry.kind, entry.text),
            }
        }
        Ok(Self { switches })
    }

    /// Find a switch by label, ignoring case
    pub fn position(&self, text: &str) -> Option<usize> {
        self.switches
            .iter()
            .position(|s| s.text.eq_ignore_ascii_case(text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
[[switch]]
text = "Station platform"
type = "fourway"
pins = [4, 5]
low_setting = 20
medium_setting = 50
full_setting = 100

[[switch]]
text = "Engine shed"
type = "simple"
pins = "7, 8"
full_setting = 80

[[switch]]
text = "Street lamps"
type = "slider"
pins = [2]
off_setting = 5
low_setting = 30
medium_setting = 60
full_setting = 90

[[switch]]
text = "Disco"
type = "strobe"
pins = [9]
full_setting = 100
"#;

    #[test]
    fn test_parse_sample() {
        let config = LightsConfig::from_toml_str(SAMPLE).unwrap();
        assert_eq!(config.switches.len(), 3);

        let platform = &config.switches[0];
        assert_eq!(platform.kind, SwitchKind::FourWay);
        assert_eq!(platform.pins, vec![4, 5]);
        assert_eq!(
            platform.levels,
            Levels {
                off: 0,
                low: 20,
                medium: 50,
                full: 100
            }
        );

        let shed = &config.switches[1];
        assert_eq!(shed.kind, SwitchKind::Simple);
        assert_eq!(shed.pins, vec![7, 8]);
        assert_eq!(shed.levels.full, 80);

        assert_eq!(config.position("street LAMPS"), Some(2));
        assert_eq!(config.position("Disco"), None);
    }

    #[test]
    fn test_fourway_requires_intermediate_levels() {
        let text = r#"
[[switch]]
text = "Yard"
type = "fourway"
pins = [1]
full_setting = 100
"#;
        assert!(matches!(LightsConfig::from_toml_str(text), Err(Error::Config(_))));
    }

    #[test]
    fn test_level_limits() {
        let text = r#"
[[switch]]
text = "Yard"
type = "simple"
pins = [1]
full_setting = 150
"#;
        assert!(LightsConfig::from_toml_str(text).is_err());

        let text = r#"
[[switch]]
text = "Yard"
type = "slider"
pins = [1]
low_setting = 60
medium_setting = 40
full_setting = 100
"#;
        assert!(LightsConfig::from_toml_str(text).is_err());
    }

    #[test]
    fn test_bad_pin_string() {
        let text = r#"
[[switch]]
text = "Yard"
type = "simple"
pins = "1,x"
full_setting = 100
"#;
        assert!(LightsConfig::from_toml_str(text).is_err());
    }

    #[test]
    fn test_empty_file() {
        assert!(LightsConfig::from_toml_str("").unwrap().switches.is_empty());
    }
}
