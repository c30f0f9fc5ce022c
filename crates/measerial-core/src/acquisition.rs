//! The acquisition loop: flush, read, decode, time.

use log::{debug, warn};
use measerial_decode::{
    decode_frames, parse_line, SampleEncoding, SampleRate, VoltageSeries, FRAME_LEN,
};
use std::time::{Duration, Instant};

use crate::cancel::CancelToken;
use crate::error::AcquireError;
use crate::transport::{LineEnd, Transport};

/// Upper bound on what is reserved before any data arrives; buffers grow
/// past it as bytes come in.
const MAX_PREALLOC: usize = 64 * 1024;

#[derive(Debug, Clone)]
pub struct AcquireOptions {
    /// Longest silence tolerated in binary mode. `None` waits forever.
    pub stall_timeout: Option<Duration>,
    /// Per-line limit in text mode.
    pub line_timeout: Duration,
    /// Line buffer size in text mode, one slot reserved for the terminator.
    pub line_capacity: usize,
    /// Keep the received bytes on the result for echoing.
    pub keep_raw: bool,
    pub cancel: Option<CancelToken>,
}

impl Default for AcquireOptions {
    fn default() -> Self {
        Self {
            stall_timeout: Some(Duration::from_secs(5)),
            line_timeout: Duration::from_millis(1000),
            line_capacity: 32,
            keep_raw: false,
            cancel: None,
        }
    }
}

/// Data-quality counters for one run. Nonzero values do not fail the run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AcquisitionStats {
    /// Lines without a leading integer, recorded as 0.
    pub soft_failures: usize,
    pub line_timeouts: usize,
    /// Lines cut at the buffer capacity before the newline arrived.
    pub truncated_lines: usize,
    /// Frames decoded beyond the requested count and dropped.
    pub surplus_frames: usize,
}

impl AcquisitionStats {
    pub fn is_clean(&self) -> bool {
        *self == Self::default()
    }
}

/// Samples of one run in acquisition order, plus timing.
#[derive(Debug, Clone)]
pub struct MeasurementResult {
    samples: Vec<i32>,
    elapsed: Duration,
    encoding: SampleEncoding,
    stats: AcquisitionStats,
    raw: Option<Vec<u8>>,
}

impl MeasurementResult {
    pub fn samples(&self) -> &[i32] {
        &self.samples
    }

    pub fn get(&self, index: usize) -> Option<i32> {
        self.samples.get(index).copied()
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    pub fn throughput(&self) -> SampleRate {
        SampleRate::from_count(self.samples.len(), self.elapsed)
    }

    pub fn encoding(&self) -> SampleEncoding {
        self.encoding
    }

    pub fn stats(&self) -> AcquisitionStats {
        self.stats
    }

    /// Bytes as received, when [`AcquireOptions::keep_raw`] was set.
    pub fn raw_bytes(&self) -> Option<&[u8]> {
        self.raw.as_deref()
    }
}

/// Converts every sample of a finished run to volts.
pub fn convert_to_voltage(result: MeasurementResult) -> VoltageSeries {
    VoltageSeries::from_raw(&result.samples)
}

/// [`acquire`] with default options.
pub fn run_acquisition<T: Transport + ?Sized>(
    transport: &mut T,
    sample_count: usize,
    encoding: SampleEncoding,
) -> Result<MeasurementResult, AcquireError> {
    acquire(transport, sample_count, encoding, &AcquireOptions::default())
}

/// Reads exactly `sample_count` samples from `transport`.
///
/// Timing starts just before the input flush and stops once the last byte
/// or line is in; decoding is not timed.
pub fn acquire<T: Transport + ?Sized>(
    transport: &mut T,
    sample_count: usize,
    encoding: SampleEncoding,
    opts: &AcquireOptions,
) -> Result<MeasurementResult, AcquireError> {
    if sample_count == 0 {
        return Err(AcquireError::EmptyRequest);
    }
    debug!("acquiring {sample_count} samples ({encoding:?})");

    let started = Instant::now();
    transport.flush_input()?;

    let collected = match encoding {
        SampleEncoding::Binary => collect_frames(transport, sample_count, opts)?,
        SampleEncoding::Text => collect_lines(transport, sample_count, opts)?,
    };
    let elapsed = collected.stopped.duration_since(started);
    debug!("acquired {} samples in {elapsed:?}", collected.samples.len());

    Ok(MeasurementResult {
        samples: collected.samples,
        elapsed,
        encoding,
        stats: collected.stats,
        raw: collected.raw,
    })
}

struct Collected {
    samples: Vec<i32>,
    stats: AcquisitionStats,
    raw: Option<Vec<u8>>,
    stopped: Instant,
}

fn cancelled(opts: &AcquireOptions) -> bool {
    opts.cancel.as_ref().is_some_and(CancelToken::is_cancelled)
}

fn collect_frames<T: Transport + ?Sized>(
    transport: &mut T,
    n: usize,
    opts: &AcquireOptions,
) -> Result<Collected, AcquireError> {
    let expected = n
        .checked_mul(FRAME_LEN)
        .ok_or(AcquireError::RequestTooLarge { requested: n })?;
    let mut buffer = Vec::with_capacity(expected.min(MAX_PREALLOC));
    let mut last_byte = Instant::now();

    while buffer.len() < expected {
        if cancelled(opts) {
            return Err(AcquireError::Cancelled {
                received: buffer.len(),
            });
        }
        match transport.read_byte()? {
            Some(byte) => {
                buffer.push(byte);
                last_byte = Instant::now();
            }
            None => {
                let waited = last_byte.elapsed();
                if opts.stall_timeout.is_some_and(|limit| waited >= limit) {
                    return Err(stalled(&buffer, n, expected, waited));
                }
            }
        }
    }
    let stopped = Instant::now();

    let mut samples: Vec<i32> = decode_frames(&buffer).into_iter().map(i32::from).collect();
    if samples.len() < n {
        return Err(AcquireError::Shortfall {
            requested: n,
            decoded: samples.len(),
        });
    }

    let mut stats = AcquisitionStats::default();
    if samples.len() > n {
        stats.surplus_frames = samples.len() - n;
        warn!(
            "{} spurious frame matches in {expected} bytes; keeping the first {n}",
            stats.surplus_frames
        );
        samples.truncate(n);
    }

    Ok(Collected {
        samples,
        stats,
        raw: opts.keep_raw.then_some(buffer),
        stopped,
    })
}

// A stalled stream cannot hold `n` frames unless stray markers matched, so
// the usual outcome is a shortfall over what did arrive.
fn stalled(buffer: &[u8], n: usize, expected: usize, waited: Duration) -> AcquireError {
    warn!(
        "no data for {waited:?} after {} of {expected} bytes",
        buffer.len()
    );
    let decoded = decode_frames(buffer).len();
    if decoded < n {
        AcquireError::Shortfall {
            requested: n,
            decoded,
        }
    } else {
        AcquireError::Stalled {
            received: buffer.len(),
            expected,
            waited,
        }
    }
}

fn collect_lines<T: Transport + ?Sized>(
    transport: &mut T,
    n: usize,
    opts: &AcquireOptions,
) -> Result<Collected, AcquireError> {
    let mut samples = Vec::with_capacity(n.min(MAX_PREALLOC));
    let mut stats = AcquisitionStats::default();
    let mut raw = Vec::new();
    let mut received = 0usize;

    for index in 0..n {
        if cancelled(opts) {
            return Err(AcquireError::Cancelled { received });
        }
        let line = transport.read_line_until(b'\n', opts.line_capacity, opts.line_timeout)?;
        received += line.bytes.len();

        match line.end {
            LineEnd::Delimiter => {}
            LineEnd::Full => stats.truncated_lines += 1,
            LineEnd::Timeout => {
                stats.line_timeouts += 1;
                warn!("line {index}: timed out after {:?}", opts.line_timeout);
            }
        }

        let parsed = parse_line(&line.bytes);
        if !parsed.parsed {
            stats.soft_failures += 1;
            warn!(
                "line {index}: no integer in {:?}, recording 0",
                String::from_utf8_lossy(&line.bytes)
            );
        }
        samples.push(parsed.value);

        if opts.keep_raw {
            raw.extend_from_slice(&line.bytes);
        }
    }

    Ok(Collected {
        samples,
        stats,
        raw: opts.keep_raw.then_some(raw),
        stopped: Instant::now(),
    })
}
