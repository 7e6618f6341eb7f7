//! Bus scan through `i2cdetect`

use crate::error::{LinuxI2cError, Result};
use std::process::Command;

/// Run `<command> -y <bus>` and return its standard output
///
/// Fails when the command cannot be started or exits non-zero. There is no
/// retry.
pub fn run_detect(command: &str, bus: u32) -> Result<String> {
    let bus_arg = bus.to_string();
    log::debug!("linux_i2c: Running {} -y {}", command, bus_arg);

    let output = Command::new(command)
        .args(["-y", bus_arg.as_str()])
        .output()
        .map_err(|e| LinuxI2cError::ProbeFailed {
            command: command.to_string(),
            reason: e.to_string(),
        })?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        let reason = match stderr.trim() {
            "" => output.status.to_string(),
            msg => msg.to_string(),
        };
        return Err(LinuxI2cError::ProbeFailed {
            command: command.to_string(),
            reason,
        });
    }

    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_command() {
        let err = run_detect("railctl-no-such-i2cdetect", 1).unwrap_err();
        assert!(matches!(err, LinuxI2cError::ProbeFailed { .. }));
    }

    #[test]
    fn test_failing_command() {
        assert!(run_detect("false", 1).is_err());
    }

    #[test]
    fn test_successful_command() {
        assert_eq!(run_detect("true", 1).unwrap(), "");
    }
}
