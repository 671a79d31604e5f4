//! Linux monitor control through the `ddcutil` tool
//!
//! Requirements:
//! - `ddcutil` on PATH
//! - the `i2c-dev` module loaded and read/write access to `/dev/i2c-*`

use std::process::{Command, Output};

use super::{DisplayBackend, MonitorError, MonitorResult};

const DDCUTIL: &str = "ddcutil";

/// A display number as reported by `ddcutil detect`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DdcutilDisplay(pub u32);

/// Monitor control by running `ddcutil`
#[derive(Debug, Clone)]
pub struct DdcutilDisplayBackend {
    program: String,
}

impl DdcutilDisplayBackend {
    pub fn new() -> Self {
        Self {
            program: DDCUTIL.to_string(),
        }
    }

    fn run(&self, args: &[&str]) -> MonitorResult<Output> {
        tracing::debug!("Running {} {}", self.program, args.join(" "));
        Ok(Command::new(&self.program).args(args).output()?)
    }
}

impl Default for DdcutilDisplayBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl DisplayBackend for DdcutilDisplayBackend {
    type Handle = DdcutilDisplay;

    fn list_controllable_monitors(&self) -> MonitorResult<Vec<DdcutilDisplay>> {
        let output = self
            .run(&["detect", "--terse"])
            .map_err(|e| MonitorError::Enumeration(e.to_string()))?;

        if !output.status.success() {
            return Err(MonitorError::Enumeration(
                String::from_utf8_lossy(&output.stderr).trim().to_string(),
            ));
        }

        Ok(parse_detect_output(&String::from_utf8_lossy(&output.stdout)))
    }

    fn send_feature_command(
        &self,
        display: &DdcutilDisplay,
        feature: u8,
        value: u32,
    ) -> MonitorResult<()> {
        let display_arg = display.0.to_string();
        let feature_arg = format!("{:02x}", feature);
        let value_arg = format!("{:#04x}", value);

        let output = self.run(&[
            "--display",
            &display_arg,
            "setvcp",
            &feature_arg,
            &value_arg,
        ])?;

        if !output.status.success() {
            return Err(MonitorError::Command(format!(
                "display {}: {}",
                display.0,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        Ok(())
    }
}

/// Pick the `Display N` entries out of `ddcutil detect --terse`.
///
/// Entries listed as `Invalid display` have no usable DDC channel and are
/// skipped.
fn parse_detect_output(stdout: &str) -> Vec<DdcutilDisplay> {
    stdout
        .lines()
        .filter_map(|line| line.strip_prefix("Display "))
        .filter_map(|number| number.trim().parse().ok())
        .map(DdcutilDisplay)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_detect_output() {
        let stdout = "\
Display 1
   I2C bus:  /dev/i2c-4
   Monitor:  DEL:DELL U2719D:ABC123

Invalid display
   I2C bus:  /dev/i2c-6
   Monitor:  BOE::

Display 2
   I2C bus:  /dev/i2c-7
   Monitor:  GSM:LG HDR 4K:
";
        assert_eq!(
            parse_detect_output(stdout),
            vec![DdcutilDisplay(1), DdcutilDisplay(2)]
        );
    }

    #[test]
    fn test_parse_no_displays() {
        assert!(parse_detect_output("No displays found.\n").is_empty());
    }

    #[test]
    fn test_missing_program_is_enumeration_error() {
        let backend = DdcutilDisplayBackend {
            program: "/nonexistent/ddcutil".to_string(),
        };
        assert!(matches!(
            backend.list_controllable_monitors(),
            Err(MonitorError::Enumeration(_))
        ));
    }
}
