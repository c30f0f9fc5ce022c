//! Sample decoding: binary frames, text lines and unit conversion.

pub mod frame;
pub mod text;
pub mod units;

pub use frame::{decode_frames, FRAME_END, FRAME_LEN, FRAME_START};
pub use text::{decode_line, parse_line, ParsedLine};
pub use units::{to_voltage, VoltageSeries};

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Wire encoding the device uses for its samples.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SampleEncoding {
    /// `<`, low byte, high byte, `>` per sample.
    Binary,
    /// One decimal integer per newline-terminated line.
    #[default]
    Text,
}

impl std::str::FromStr for SampleEncoding {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "binary" | "bin" | "raw" => Ok(Self::Binary),
            "text" | "ascii" => Ok(Self::Text),
            other => Err(format!("unknown encoding {other:?}, expected binary or text")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SampleRate(pub f64); // Hz

impl SampleRate {
    pub fn from_count(samples: usize, elapsed: Duration) -> Self {
        Self(samples as f64 / elapsed.as_secs_f64())
    }

    pub fn hz(&self) -> f64 {
        self.0
    }
}
