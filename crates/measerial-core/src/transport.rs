use log::{debug, info};
use serialport::{ClearBuffer, SerialPort, SerialPortInfo};
use std::io::{self, Read};
use std::time::{Duration, Instant};

use crate::error::TransportError;

#[derive(Debug, Clone)]
pub struct PortInfo {
    pub port_name: String,
    pub port_type: String,
    pub vid: Option<u16>,
    pub pid: Option<u16>,
    pub serial_number: Option<String>,
    pub manufacturer: Option<String>,
    pub product: Option<String>,
}

impl From<SerialPortInfo> for PortInfo {
    fn from(info: SerialPortInfo) -> Self {
        let (port_type, vid, pid, serial_number, manufacturer, product) = match info.port_type
        {
            serialport::SerialPortType::UsbPort(usb) => (
                "USB".to_string(),
                Some(usb.vid),
                Some(usb.pid),
                usb.serial_number,
                usb.manufacturer,
                usb.product,
            ),
            serialport::SerialPortType::PciPort => {
                ("PCI".to_string(), None, None, None, None, None)
            }
            serialport::SerialPortType::BluetoothPort => {
                ("Bluetooth".to_string(), None, None, None, None, None)
            }
            serialport::SerialPortType::Unknown => {
                ("Unknown".to_string(), None, None, None, None, None)
            }
        };
        Self {
            port_name: info.port_name,
            port_type,
            vid,
            pid,
            serial_number,
            manufacturer,
            product,
        }
    }
}

pub fn list_ports() -> Result<Vec<PortInfo>, TransportError> {
    let ports = serialport::available_ports().map_err(TransportError::Enumerate)?;
    Ok(ports.into_iter().map(PortInfo::from).collect())
}

#[derive(Debug, Clone)]
pub struct SerialConfig {
    pub port_name: String,
    pub baud_rate: u32,
    pub data_bits: serialport::DataBits,
    pub parity: serialport::Parity,
    pub stop_bits: serialport::StopBits,
    pub flow_control: serialport::FlowControl,
    /// Upper bound on a single read call before it reports zero bytes.
    pub poll_interval: Duration,
}

impl Default for SerialConfig {
    fn default() -> Self {
        Self {
            port_name: String::new(),
            baud_rate: 115_200,
            data_bits: serialport::DataBits::Eight,
            parity: serialport::Parity::None,
            stop_bits: serialport::StopBits::One,
            flow_control: serialport::FlowControl::None,
            poll_interval: Duration::from_millis(10),
        }
    }
}

/// Why a line read returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineEnd {
    Delimiter,
    Full,
    Timeout,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineRead {
    /// Received bytes, including the delimiter when `end` is `Delimiter`.
    pub bytes: Vec<u8>,
    pub end: LineEnd,
}

/// Half-duplex byte stream the acquisition loop reads from.
pub trait Transport {
    /// Discards whatever the device sent before the run started.
    fn flush_input(&mut self) -> Result<(), TransportError>;

    /// One read attempt. `Ok(None)` means nothing arrived this time.
    fn read_byte(&mut self) -> Result<Option<u8>, TransportError>;

    /// Reads until `delimiter`, until `capacity - 1` bytes are held, or until
    /// `timeout` passes, whichever comes first. A timed out read returns the
    /// partial line rather than an error.
    fn read_line_until(
        &mut self,
        delimiter: u8,
        capacity: usize,
        timeout: Duration,
    ) -> Result<LineRead, TransportError> {
        let deadline = Instant::now() + timeout;
        let limit = capacity.saturating_sub(1);
        let mut bytes = Vec::with_capacity(limit);
        loop {
            if bytes.len() >= limit {
                return Ok(LineRead { bytes, end: LineEnd::Full });
            }
            match self.read_byte()? {
                Some(byte) => {
                    bytes.push(byte);
                    if byte == delimiter {
                        return Ok(LineRead { bytes, end: LineEnd::Delimiter });
                    }
                }
                None if Instant::now() >= deadline => {
                    return Ok(LineRead { bytes, end: LineEnd::Timeout });
                }
                None => {}
            }
        }
    }
}

/// [`Transport`] over a local serial device.
pub struct SerialTransport {
    port: Box<dyn SerialPort>,
    name: String,
}

impl SerialTransport {
    pub fn open(cfg: &SerialConfig) -> Result<Self, TransportError> {
        let port = serialport::new(&cfg.port_name, cfg.baud_rate)
            .data_bits(cfg.data_bits)
            .parity(cfg.parity)
            .stop_bits(cfg.stop_bits)
            .flow_control(cfg.flow_control)
            .timeout(cfg.poll_interval)
            .open()
            .map_err(|source| TransportError::Open {
                port: cfg.port_name.clone(),
                source,
            })?;
        info!("opened {} at {} baud", cfg.port_name, cfg.baud_rate);
        Ok(Self {
            port,
            name: cfg.port_name.clone(),
        })
    }

    pub fn close(self) {
        info!("closed {}", self.name);
    }
}

impl Transport for SerialTransport {
    fn flush_input(&mut self) -> Result<(), TransportError> {
        debug!("{}: {}", self.name, pending_summary(self.port.bytes_to_read()));
        self.port
            .clear(ClearBuffer::Input)
            .map_err(TransportError::Configure)
    }

    fn read_byte(&mut self) -> Result<Option<u8>, TransportError> {
        let mut buf = [0u8; 1];
        match self.port.read(&mut buf) {
            Ok(0) => Ok(None),
            Ok(_) => Ok(Some(buf[0])),
            Err(e) if is_empty_read(&e) => Ok(None),
            Err(e) => Err(TransportError::Io(e)),
        }
    }
}

fn pending_summary(pending: serialport::Result<u32>) -> String {
    match pending {
        Ok(count) => format!("discarding {count} stale bytes"),
        Err(e) => format!("pending byte count unavailable: {e}"),
    }
}

fn is_empty_read(e: &io::Error) -> bool {
    matches!(
        e.kind(),
        io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock | io::ErrorKind::Interrupted
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;

    /// Replays a script of read outcomes, then reports empty reads forever.
    struct Scripted {
        reads: VecDeque<Option<u8>>,
    }

    impl Scripted {
        fn new(reads: impl IntoIterator<Item = Option<u8>>) -> Self {
            Self {
                reads: reads.into_iter().collect(),
            }
        }

        fn bytes(data: &[u8]) -> Self {
            Self::new(data.iter().copied().map(Some))
        }
    }

    impl Transport for Scripted {
        fn flush_input(&mut self) -> Result<(), TransportError> {
            Ok(())
        }

        fn read_byte(&mut self) -> Result<Option<u8>, TransportError> {
            Ok(self.reads.pop_front().flatten())
        }
    }

    const LONG: Duration = Duration::from_secs(5);

    #[test]
    fn line_stops_at_delimiter() {
        let mut t = Scripted::bytes(b"100\n200\n");
        let line = t.read_line_until(b'\n', 32, LONG).unwrap();
        assert_eq!(line, LineRead { bytes: b"100\n".to_vec(), end: LineEnd::Delimiter });
        let line = t.read_line_until(b'\n', 32, LONG).unwrap();
        assert_eq!(line.bytes, b"200\n");
    }

    #[test]
    fn empty_reads_inside_a_line_are_retried() {
        let mut t = Scripted::new([Some(b'4'), None, None, Some(b'2'), None, Some(b'\n')]);
        let line = t.read_line_until(b'\n', 32, LONG).unwrap();
        assert_eq!(line.bytes, b"42\n");
        assert_eq!(line.end, LineEnd::Delimiter);
    }

    #[test]
    fn line_capacity_reserves_terminator_slot() {
        let mut t = Scripted::bytes(b"123456789\n");
        let line = t.read_line_until(b'\n', 5, LONG).unwrap();
        assert_eq!(line, LineRead { bytes: b"1234".to_vec(), end: LineEnd::Full });
    }

    #[test]
    fn silent_line_times_out_with_partial_data() {
        let mut t = Scripted::bytes(b"12");
        let started = Instant::now();
        let line = t.read_line_until(b'\n', 32, Duration::from_millis(20)).unwrap();
        assert!(started.elapsed() >= Duration::from_millis(20));
        assert_eq!(line, LineRead { bytes: b"12".to_vec(), end: LineEnd::Timeout });
    }

    #[test]
    fn read_timeouts_are_empty_reads() {
        assert!(is_empty_read(&io::Error::from(io::ErrorKind::TimedOut)));
        assert!(is_empty_read(&io::Error::from(io::ErrorKind::WouldBlock)));
        assert!(!is_empty_read(&io::Error::from(io::ErrorKind::BrokenPipe)));
    }

    #[test]
    fn pending_count_failure_is_reported_not_zeroed() {
        assert_eq!(pending_summary(Ok(3)), "discarding 3 stale bytes");
        let err = serialport::Error::new(serialport::ErrorKind::NoDevice, "unplugged");
        let summary = pending_summary(Err(err));
        assert!(summary.contains("unavailable"));
        assert!(summary.contains("unplugged"));
        assert!(!summary.contains('0'));
    }

    #[test]
    fn default_config_is_8n1() {
        let cfg = SerialConfig::default();
        assert_eq!(cfg.baud_rate, 115_200);
        assert_eq!(cfg.data_bits, serialport::DataBits::Eight);
        assert_eq!(cfg.parity, serialport::Parity::None);
        assert_eq!(cfg.stop_bits, serialport::StopBits::One);
        assert_eq!(cfg.flow_control, serialport::FlowControl::None);
    }

    #[test]
    fn opening_a_missing_port_is_a_transport_error() {
        let cfg = SerialConfig {
            port_name: "/dev/measerial-does-not-exist".to_string(),
            ..Default::default()
        };
        match SerialTransport::open(&cfg) {
            Err(TransportError::Open { port, .. }) => assert_eq!(port, cfg.port_name),
            Err(other) => panic!("unexpected error: {other}"),
            Ok(_) => panic!("port unexpectedly opened"),
        }
    }
}
