use std::time::Duration;
use thiserror::Error;

/// Failure of the byte stream itself. Always fatal to a run.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("failed to open {port}: {source}")]
    Open {
        port: String,
        #[source]
        source: serialport::Error,
    },
    #[error("failed to configure port: {0}")]
    Configure(#[source] serialport::Error),
    #[error("failed to enumerate ports: {0}")]
    Enumerate(#[source] serialport::Error),
    #[error("serial I/O error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Error)]
pub enum AcquireError {
    #[error(transparent)]
    Transport(#[from] TransportError),
    #[error("requested zero samples")]
    EmptyRequest,
    #[error("cannot buffer {requested} samples")]
    RequestTooLarge { requested: usize },
    #[error("decoded {decoded} of {requested} requested samples")]
    Shortfall { requested: usize, decoded: usize },
    #[error("no data for {waited:?}: received {received} of {expected} bytes")]
    Stalled {
        received: usize,
        expected: usize,
        waited: Duration,
    },
    #[error("acquisition cancelled after {received} bytes")]
    Cancelled { received: usize },
}
