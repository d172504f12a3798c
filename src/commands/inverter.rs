//! # Inverter control command.
//!
//! Carries the voltage/current setpoint and charge direction for the
//! inverter controller. JSON population is field-by-field: absent fields
//! leave the current value untouched, so a partial document acts as a
//! partial update.

use std::fmt;

use serde_json::Value;
use tracing::debug;

use super::PayloadError;

/// Charge direction requested from the inverter.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum InverterMode {
    /// Energy flows into the battery.
    #[default]
    Charging,
    /// Energy flows out of the battery.
    Discharging,
}

impl fmt::Display for InverterMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InverterMode::Charging => f.write_str("Charging"),
            InverterMode::Discharging => f.write_str("Discharging"),
        }
    }
}

/// Inverter setpoint command.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct InverterCommand {
    /// Charge direction.
    pub mode: InverterMode,
    /// Voltage setpoint in volts.
    pub voltage_v: f64,
    /// Current setpoint in amperes.
    pub current_a: f64,
}

impl InverterCommand {
    /// Creates a fully specified setpoint.
    pub fn new(mode: InverterMode, voltage_v: f64, current_a: f64) -> Self {
        Self {
            mode,
            voltage_v,
            current_a,
        }
    }

    /// Applies fields from a JSON document.
    ///
    /// Recognized fields:
    /// - `"voltage"`, `"current"`: numbers, copied verbatim;
    /// - `"command"`: `"StartCharging"` or `"StartDischarging"`; any other
    ///   string is rejected with [`PayloadError::InvalidField`].
    ///
    /// Fields that are absent (or present with a non-numeric value where a
    /// number is expected) are skipped.
    pub fn apply_json(&mut self, parameters: &str) -> Result<(), PayloadError> {
        let doc: Value = serde_json::from_str(parameters)?;

        if let Some(current) = doc.get("current").and_then(Value::as_f64) {
            self.current_a = current;
            debug!(target: "commands", current_a = current, "inverter current set");
        }
        if let Some(voltage) = doc.get("voltage").and_then(Value::as_f64) {
            self.voltage_v = voltage;
            debug!(target: "commands", voltage_v = voltage, "inverter voltage set");
        }
        if let Some(command) = doc.get("command").and_then(Value::as_str) {
            self.mode = match command {
                "StartCharging" => InverterMode::Charging,
                "StartDischarging" => InverterMode::Discharging,
                other => {
                    return Err(PayloadError::InvalidField {
                        field: "command",
                        value: other.to_string(),
                    });
                }
            };
            debug!(target: "commands", mode = %self.mode, "inverter mode set");
        }
        Ok(())
    }
}

impl fmt::Display for InverterCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "inverter {}: {} V, {} A",
            self.mode, self.voltage_v, self.current_a
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apply_json_full_document() {
        let mut cmd = InverterCommand::default();
        cmd.apply_json(r#"{"voltage": 54.6, "current": 10.0, "command": "StartDischarging"}"#)
            .expect("valid document");
        assert_eq!(cmd.voltage_v, 54.6);
        assert_eq!(cmd.current_a, 10.0);
        assert_eq!(cmd.mode, InverterMode::Discharging);
    }

    #[test]
    fn test_apply_json_partial_update_keeps_other_fields() {
        let mut cmd = InverterCommand::new(InverterMode::Discharging, 48.0, 5.0);
        cmd.apply_json(r#"{"current": 7.5}"#).expect("valid document");
        assert_eq!(cmd.current_a, 7.5);
        assert_eq!(cmd.voltage_v, 48.0);
        assert_eq!(cmd.mode, InverterMode::Discharging);
    }

    #[test]
    fn test_apply_json_rejects_unknown_command_value() {
        let mut cmd = InverterCommand::default();
        let err = cmd
            .apply_json(r#"{"command": "SelfDestruct"}"#)
            .expect_err("unknown command must be rejected");
        assert!(matches!(
            err,
            PayloadError::InvalidField { field: "command", .. }
        ));
    }

    #[test]
    fn test_apply_json_rejects_invalid_json() {
        let mut cmd = InverterCommand::default();
        let err = cmd.apply_json("{not json").expect_err("must fail");
        assert_eq!(err.as_label(), "payload_malformed");
    }
}
