//! Conversion from device codes to volts.

use serde::Serialize;

/// Microvolts represented by one device code.
pub const MICROVOLTS_PER_CODE: f64 = 118.0;

pub fn to_voltage(raw: i32) -> f64 {
    MICROVOLTS_PER_CODE * f64::from(raw) / 1_000_000.0
}

/// Voltages in acquisition order, one per raw sample.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VoltageSeries {
    volts: Vec<f64>,
}

impl VoltageSeries {
    pub fn from_raw(raw: &[i32]) -> Self {
        Self {
            volts: raw.iter().copied().map(to_voltage).collect(),
        }
    }

    pub fn values(&self) -> &[f64] {
        &self.volts
    }

    pub fn len(&self) -> usize {
        self.volts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.volts.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = f64> + '_ {
        self.volts.iter().copied()
    }
}
