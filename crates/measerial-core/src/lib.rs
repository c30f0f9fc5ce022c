//! Core functionalities: serial transport, acquisition loop, errors.

pub mod acquisition;
pub mod cancel;
pub mod error;
pub mod transport;

pub use acquisition::{
    acquire, convert_to_voltage, run_acquisition, AcquireOptions, AcquisitionStats,
    MeasurementResult,
};
pub use cancel::{cancel_pair, CancelHandle, CancelToken};
pub use error::{AcquireError, TransportError};
pub use transport::{
    list_ports, LineEnd, LineRead, PortInfo, SerialConfig, SerialTransport, Transport,
};

pub use measerial_decode::{SampleEncoding, SampleRate, VoltageSeries};
