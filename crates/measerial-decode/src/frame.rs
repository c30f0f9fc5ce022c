//! Binary frame decoding.
//!
//! A frame is four bytes: [`FRAME_START`], the low byte, the high byte and
//! [`FRAME_END`]. The stream carries no length or checksum, so frames are
//! found by pattern alone.

pub const FRAME_START: u8 = b'<';
pub const FRAME_END: u8 = b'>';
pub const FRAME_LEN: usize = 4;

/// Extracts every sample whose markers line up in `buffer`, in scan order.
///
/// The scan advances one byte at a time, also past a matched frame, so a
/// payload byte equal to a marker can start or end a second match. Missing
/// or malformed frames are skipped silently; callers compare the returned
/// length with the count they expect.
pub fn decode_frames(buffer: &[u8]) -> Vec<i16> {
    buffer.windows(FRAME_LEN).filter_map(frame_value).collect()
}

fn frame_value(window: &[u8]) -> Option<i16> {
    match *window {
        [FRAME_START, low, high, FRAME_END] => Some(combine(low, high)),
        _ => None,
    }
}

/// Joins the payload bytes, low byte first, as a two's-complement `i16`.
pub fn combine(low: u8, high: u8) -> i16 {
    i16::from_le_bytes([low, high])
}
