use anyhow::{Context, Result};
use measerial_core::{AcquireOptions, CancelToken, SampleEncoding, SerialConfig};
use serde::{Deserialize, Serialize};
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::args::Args;

/// Defaults read from `settings.json`; command-line flags win.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub port: Option<String>,
    pub baud_rate: u32,
    pub reset_delay_ms: u64,
    pub encoding: SampleEncoding,
    /// File stem; the extension is always `.dat`.
    pub output: String,
    /// `null` waits for binary data forever.
    pub stall_timeout_ms: Option<u64>,
    pub line_timeout_ms: u64,
    pub poll_interval_ms: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            port: None,
            baud_rate: 115_200,
            reset_delay_ms: 2000,
            encoding: SampleEncoding::Text,
            output: "test".to_string(),
            stall_timeout_ms: Some(5000),
            line_timeout_ms: 1000,
            poll_interval_ms: 10,
        }
    }
}

impl Settings {
    pub fn path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("measerial").join("settings.json"))
    }

    pub fn load() -> Result<Self> {
        match Self::path() {
            Some(path) => Self::load_from(&path),
            None => Ok(Self::default()),
        }
    }

    /// A missing file yields the defaults; an unreadable or malformed one
    /// is an error.
    pub fn load_from(path: &Path) -> Result<Self> {
        let text = match std::fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(e) => {
                return Err(e).with_context(|| format!("failed to read {}", path.display()));
            }
        };
        serde_json::from_str(&text)
            .with_context(|| format!("invalid settings in {}", path.display()))
    }

    pub fn apply(&mut self, args: &Args) {
        if let Some(port) = &args.port {
            self.port = Some(port.clone());
        }
        if let Some(baud) = args.baud_rate {
            self.baud_rate = baud;
        }
        if let Some(delay) = args.reset_delay_ms {
            self.reset_delay_ms = delay;
        }
        if let Some(encoding) = args.selected_encoding() {
            self.encoding = encoding;
        }
        if let Some(output) = &args.output {
            self.output = output.clone();
        }
    }

    pub fn serial_config(&self) -> Result<SerialConfig> {
        let port_name = self
            .port
            .clone()
            .context("no serial port given (use -p or set \"port\" in settings)")?;
        Ok(SerialConfig {
            port_name,
            baud_rate: self.baud_rate,
            poll_interval: Duration::from_millis(self.poll_interval_ms),
            ..Default::default()
        })
    }

    pub fn acquire_options(
        &self,
        keep_raw: bool,
        time_limit: Option<Duration>,
    ) -> AcquireOptions {
        AcquireOptions {
            stall_timeout: self.stall_timeout_ms.map(Duration::from_millis),
            line_timeout: Duration::from_millis(self.line_timeout_ms),
            keep_raw,
            cancel: time_limit.map(CancelToken::after),
            ..Default::default()
        }
    }

    pub fn reset_delay(&self) -> Duration {
        Duration::from_millis(self.reset_delay_ms)
    }
}
