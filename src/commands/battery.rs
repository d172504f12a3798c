//! # Aggregated battery state.
//!
//! Snapshot of a battery bank built from per-cube telemetry: cube counts,
//! voltage and state-of-charge aggregates, current and temperature extremes.
//! Getters clamp into the plausible operating range of the pack so one
//! corrupted telemetry frame cannot push an out-of-range value into control
//! decisions; the raw fields keep whatever was reported.

use std::fmt;

use serde_json::Value;
use tracing::debug;

use super::PayloadError;

/// Pack voltage floor in millivolts (48 V nominal system).
const VOLTAGE_FLOOR_MV: u16 = 48_000;
/// Pack voltage ceiling in millivolts.
const VOLTAGE_CEILING_MV: u16 = 57_000;
/// State-of-charge ceiling, in 0.01 % units (100 %).
const SOC_CEILING: u16 = 10_000;
/// Values below this SOC are treated as sensor noise and reported as 3 %.
const SOC_NOISE_FLOOR: u16 = 50;
/// SOC reported when the raw value sits below the noise floor.
const SOC_FALLBACK: u16 = 300;

/// Aggregated battery bank state.
///
/// Min/max fields start at the opposite extreme so that folding telemetry in
/// with `min`/`max` works from the first sample.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BatteryStateCommand {
    cube_count: u8,
    ready_cubes: u8,
    voltage_min_mv: u16,
    voltage_max_mv: u16,
    soc_min: u16,
    soc_max: u16,
    soc_mean: u32,
    current_sum_ma: i32,
    current_mean_ma: i32,
    current_min_ma: i32,
    current_max_ma: i32,
    temperature_min: i16,
    temperature_max: i16,
}

impl Default for BatteryStateCommand {
    fn default() -> Self {
        Self {
            cube_count: 0,
            ready_cubes: 0,
            voltage_min_mv: u16::MAX,
            voltage_max_mv: u16::MIN,
            soc_min: u16::MAX,
            soc_max: u16::MIN,
            soc_mean: 0,
            current_sum_ma: 0,
            current_mean_ma: 0,
            current_min_ma: i32::MAX,
            current_max_ma: i32::MIN,
            temperature_min: i16::MAX,
            temperature_max: i16::MIN,
        }
    }
}

impl BatteryStateCommand {
    /// Total number of battery cubes in the bank.
    pub fn cube_count(&self) -> u8 {
        self.cube_count
    }

    /// Number of cubes ready for operation.
    pub fn ready_cubes(&self) -> u8 {
        self.ready_cubes
    }

    /// Minimum cube voltage, clamped to the pack floor of 48 000 mV.
    pub fn voltage_min_mv(&self) -> u16 {
        self.voltage_min_mv.max(VOLTAGE_FLOOR_MV)
    }

    /// Maximum cube voltage, clamped to the pack ceiling of 57 000 mV.
    pub fn voltage_max_mv(&self) -> u16 {
        self.voltage_max_mv.min(VOLTAGE_CEILING_MV)
    }

    /// Midpoint of the clamped voltage extremes.
    pub fn voltage_mean_mv(&self) -> u16 {
        let sum = u32::from(self.voltage_min_mv()) + u32::from(self.voltage_max_mv());
        (sum / 2) as u16
    }

    /// Minimum state of charge in 0.01 % units, clamped into 300..=10000.
    pub fn soc_min(&self) -> u16 {
        clamp_soc(self.soc_min)
    }

    /// Maximum state of charge in 0.01 % units, clamped into 300..=10000.
    pub fn soc_max(&self) -> u16 {
        clamp_soc(self.soc_max)
    }

    /// Mean state of charge in 0.01 % units, clamped into 300..=10000.
    pub fn soc_mean(&self) -> u16 {
        if self.soc_mean > u32::from(SOC_CEILING) {
            return SOC_CEILING;
        }
        clamp_soc(self.soc_mean as u16)
    }

    /// Sum of cube currents in milliamperes.
    pub fn current_sum_ma(&self) -> i32 {
        self.current_sum_ma
    }

    /// Mean cube current in milliamperes.
    pub fn current_mean_ma(&self) -> i32 {
        self.current_mean_ma
    }

    /// Minimum cube current in milliamperes.
    pub fn current_min_ma(&self) -> i32 {
        self.current_min_ma
    }

    /// Maximum cube current in milliamperes.
    pub fn current_max_ma(&self) -> i32 {
        self.current_max_ma
    }

    /// Minimum cube temperature.
    pub fn temperature_min(&self) -> i16 {
        self.temperature_min
    }

    /// Maximum cube temperature.
    pub fn temperature_max(&self) -> i16 {
        self.temperature_max
    }

    pub fn set_cube_count(&mut self, n: u8) {
        self.cube_count = n;
    }

    pub fn set_ready_cubes(&mut self, n: u8) {
        self.ready_cubes = n;
    }

    pub fn set_voltage_min_mv(&mut self, mv: u16) {
        self.voltage_min_mv = mv;
    }

    pub fn set_voltage_max_mv(&mut self, mv: u16) {
        self.voltage_max_mv = mv;
    }

    pub fn set_soc_mean(&mut self, soc: u32) {
        self.soc_mean = soc;
    }

    pub fn set_current_extremes_ma(&mut self, min: i32, max: i32) {
        self.current_min_ma = min;
        self.current_max_ma = max;
    }

    pub fn set_temperature_extremes(&mut self, min: i16, max: i16) {
        self.temperature_min = min;
        self.temperature_max = max;
    }

    /// Applies fields from a JSON telemetry document.
    ///
    /// Recognized fields: `"Cube_Num"`, `"Cube_OP"` (unsigned integers),
    /// `"Voltage": {"MIN", "MAX"}` (millivolts) and `"SOC": {"AVG"}`
    /// (0.01 % units). Absent fields are skipped; values out of the target
    /// integer range are rejected with [`PayloadError::InvalidField`].
    pub fn apply_json(&mut self, parameters: &str) -> Result<(), PayloadError> {
        let doc: Value = serde_json::from_str(parameters)?;

        if let Some(n) = doc.get("Cube_Num").and_then(Value::as_u64) {
            self.cube_count = narrow::<u8>("Cube_Num", n)?;
            debug!(target: "commands", cubes = self.cube_count, "battery cube count set");
        }
        if let Some(n) = doc.get("Cube_OP").and_then(Value::as_u64) {
            self.ready_cubes = narrow::<u8>("Cube_OP", n)?;
            debug!(target: "commands", ready = self.ready_cubes, "battery ready cubes set");
        }
        if let Some(voltage) = doc.get("Voltage") {
            if let Some(mv) = voltage.get("MIN").and_then(Value::as_u64) {
                self.voltage_min_mv = narrow::<u16>("Voltage.MIN", mv)?;
            }
            if let Some(mv) = voltage.get("MAX").and_then(Value::as_u64) {
                self.voltage_max_mv = narrow::<u16>("Voltage.MAX", mv)?;
            }
        }
        if let Some(avg) = doc.get("SOC").and_then(|soc| soc.get("AVG")).and_then(Value::as_u64) {
            self.soc_mean = narrow::<u32>("SOC.AVG", avg)?;
        }
        Ok(())
    }
}

fn clamp_soc(raw: u16) -> u16 {
    if raw > SOC_CEILING {
        SOC_CEILING
    } else if raw < SOC_NOISE_FLOOR {
        SOC_FALLBACK
    } else {
        raw
    }
}

fn narrow<T: TryFrom<u64>>(field: &'static str, value: u64) -> Result<T, PayloadError> {
    T::try_from(value).map_err(|_| PayloadError::InvalidField {
        field,
        value: value.to_string(),
    })
}

impl fmt::Display for BatteryStateCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "battery {}/{} cubes ready, {}..{} mV, soc {}",
            self.ready_cubes(),
            self.cube_count(),
            self.voltage_min_mv(),
            self.voltage_max_mv(),
            self.soc_mean(),
        )
    }
}
