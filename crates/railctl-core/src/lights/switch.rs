//! Switch state machines

use super::config::{Levels, SwitchKind, SwitchSpec, MAX_LEVEL};
use core::fmt;
use core::str::FromStr;

/// Named light setting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Setting {
    /// Off
    Off,
    /// Low
    Low,
    /// Medium
    Medium,
    /// Full
    Full,
}

impl Setting {
    /// Level configured for this setting
    pub fn level(self, levels: &Levels) -> u8 {
        match self {
            Self::Off => levels.off,
            Self::Low => levels.low,
            Self::Medium => levels.medium,
            Self::Full => levels.full,
        }
    }

    /// Band a raw level falls into
    pub fn band(level: u8, levels: &Levels) -> Self {
        if level <= levels.off {
            Self::Off
        } else if level <= levels.low {
            Self::Low
        } else if level <= levels.medium {
            Self::Medium
        } else {
            Self::Full
        }
    }
}

impl fmt::Display for Setting {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Off => "off",
            Self::Low => "low",
            Self::Medium => "medium",
            Self::Full => "full",
        };
        f.write_str(name)
    }
}

impl FromStr for Setting {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "off" => Ok(Self::Off),
            "low" => Ok(Self::Low),
            "medium" | "med" => Ok(Self::Medium),
            "full" | "on" => Ok(Self::Full),
            other => Err(format!("unknown setting '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Simple { on: bool },
    FourWay { setting: Setting, upward: bool },
    Slider { level: u8 },
}

/// A configured switch and its current position
///
/// Button presses return the level to send to every pin, or `None` when
/// the press does not change anything.
#[derive(Debug, Clone)]
pub struct LightSwitch {
    spec: SwitchSpec,
    state: State,
}

impl LightSwitch {
    /// A switch in its off position
    pub fn new(spec: SwitchSpec) -> Self {
        let state = match spec.kind {
            SwitchKind::Simple => State::Simple { on: false },
            SwitchKind::FourWay => State::FourWay {
                setting: Setting::Off,
                upward: true,
            },
            SwitchKind::Slider => State::Slider { level: 0 },
        };
        Self { spec, state }
    }

    /// Configuration
    pub fn spec(&self) -> &SwitchSpec {
        &self.spec
    }

    /// Current setting
    pub fn setting(&self) -> Setting {
        match self.state {
            State::Simple { on: true } => Setting::Full,
            State::Simple { on: false } => Setting::Off,
            State::FourWay { setting, .. } => setting,
            State::Slider { level } => Setting::band(level, &self.spec.levels),
        }
    }

    /// Level currently applied
    pub fn level(&self) -> u8 {
        match self.state {
            State::Slider { level } => level,
            _ => self.setting().level(&self.spec.levels),
        }
    }

    /// "On" press
    ///
    /// A four-way switch steps low, medium, full and then back down through
    /// medium to low. A slider jumps to the next band.
    pub fn press_on(&mut self) -> Option<u8> {
        let levels = self.spec.levels;
        match &mut self.state {
            State::Simple { on } => {
                if *on {
                    return None;
                }
                *on = true;
                Some(levels.full)
            }
            State::FourWay { setting, upward } => {
                let next = match (*setting, *upward) {
                    (Setting::Off, _) => Setting::Low,
                    (Setting::Low, _) => {
                        *upward = true;
                        Setting::Medium
                    }
                    (Setting::Medium, true) => Setting::Full,
                    (Setting::Medium, false) => Setting::Low,
                    (Setting::Full, _) => {
                        *upward = false;
                        Setting::Medium
                    }
                };
                *setting = next;
                Some(next.level(&levels))
            }
            State::Slider { level } => {
                let next = match Setting::band(*level, &levels) {
                    Setting::Off => levels.low,
                    Setting::Low => levels.medium,
                    Setting::Medium => levels.full,
                    Setting::Full => *level,
                };
                *level = next;
                Some(next)
            }
        }
    }

    /// "Off" press
    ///
    /// A four-way switch also resets to stepping upward.
    pub fn press_off(&mut self) -> Option<u8> {
        let levels = self.spec.levels;
        match &mut self.state {
            State::Simple { on } => {
                if !*on {
                    return None;
                }
                *on = false;
                Some(levels.off)
            }
            State::FourWay { setting, upward } => {
                if *setting == Setting::Off {
                    return None;
                }
                *setting = Setting::Off;
                *upward = true;
                Some(levels.off)
            }
            State::Slider { level } => {
                *level = 0;
                Some(0)
            }
        }
    }

    /// Jump straight to a named setting
    pub fn select(&mut self, setting: Setting) -> u8 {
        let levels = self.spec.levels;
        match &mut self.state {
            State::Simple { on } => {
                *on = setting != Setting::Off;
            }
            State::FourWay {
                setting: current,
                upward,
            } => {
                *current = setting;
                match setting {
                    Setting::Off | Setting::Low => *upward = true,
                    Setting::Full => *upward = false,
                    Setting::Medium => {}
                }
            }
            State::Slider { level } => *level = setting.level(&levels),
        }
        self.level()
    }

    /// Move a slider to `level`, clamped to the board maximum
    ///
    /// Other switch kinds snap to the band the level falls into.
    pub fn set_level(&mut self, level: u8) -> u8 {
        let level = level.min(MAX_LEVEL);
        match &mut self.state {
            State::Slider { level: current } => {
                *current = level;
                level
            }
            _ => {
                let band = Setting::band(level, &self.spec.levels);
                self.select(band)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec(kind: SwitchKind) -> SwitchSpec {
        SwitchSpec {
            text: "Yard".into(),
            kind,
            pins: vec![3],
            levels: Levels {
                off: 0,
                low: 20,
                medium: 50,
                full: 100,
            },
        }
    }

    #[test]
    fn test_simple_switch() {
        let mut sw = LightSwitch::new(spec(SwitchKind::Simple));
        assert_eq!(sw.press_off(), None);
        assert_eq!(sw.press_on(), Some(100));
        assert_eq!(sw.press_on(), None);
        assert_eq!(sw.press_off(), Some(0));
    }

    #[test]
    fn test_fourway_cycle() {
        let mut sw = LightSwitch::new(spec(SwitchKind::FourWay));
        let presses: Vec<Option<u8>> = (0..7).map(|_| sw.press_on()).collect();
        // low, medium, full, medium, low, medium, full
        assert_eq!(
            presses,
            vec![Some(20), Some(50), Some(100), Some(50), Some(20), Some(50), Some(100)]
        );
    }

    #[test]
    fn test_fourway_off_resets_direction() {
        let mut sw = LightSwitch::new(spec(SwitchKind::FourWay));
        sw.press_on();
        sw.press_on();
        sw.press_on();
        sw.press_on();
        assert_eq!(sw.setting(), Setting::Medium);

        assert_eq!(sw.press_off(), Some(0));
        assert_eq!(sw.press_off(), None);
        assert_eq!(sw.press_on(), Some(20));
        assert_eq!(sw.press_on(), Some(50));
        assert_eq!(sw.press_on(), Some(100));
    }

    #[test]
    fn test_slider_bands() {
        let mut sw = LightSwitch::new(spec(SwitchKind::Slider));
        assert_eq!(sw.press_on(), Some(20));
        assert_eq!(sw.press_on(), Some(50));
        assert_eq!(sw.press_on(), Some(100));
        assert_eq!(sw.press_on(), Some(100));

        assert_eq!(sw.set_level(35), 35);
        assert_eq!(sw.setting(), Setting::Medium);
        assert_eq!(sw.press_on(), Some(100));
        assert_eq!(sw.press_off(), Some(0));
        assert_eq!(sw.set_level(200), 100);
    }

    #[test]
    fn test_select_and_snap() {
        let mut sw = LightSwitch::new(spec(SwitchKind::FourWay));
        assert_eq!(sw.select(Setting::Full), 100);
        assert_eq!(sw.press_on(), Some(50));
        assert_eq!(sw.press_on(), Some(20));

        let mut sw = LightSwitch::new(spec(SwitchKind::Simple));
        assert_eq!(sw.set_level(60), 100);
        assert_eq!(sw.set_level(0), 0);
    }

    #[test]
    fn test_setting_names() {
        assert_eq!("MED".parse::<Setting>().unwrap(), Setting::Medium);
        assert_eq!("on".parse::<Setting>().unwrap(), Setting::Full);
        assert!("dim".parse::<Setting>().is_err());
    }
}
