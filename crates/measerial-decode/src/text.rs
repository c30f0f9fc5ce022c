//! Line decoding for devices that print one integer per line.

/// Outcome of parsing one line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParsedLine {
    pub value: i32,
    /// `false` when the line held no leading integer and `value` is the
    /// zero placeholder.
    pub parsed: bool,
}

/// Parses the leading integer of `line`, yielding 0 when there is none.
pub fn decode_line(line: impl AsRef<[u8]>) -> i32 {
    parse_line(line).value
}

/// Permissive integer parse.
///
/// Skips leading whitespace, accepts one optional sign and then consumes
/// decimal digits up to the first other byte. Values outside the `i32`
/// range saturate.
pub fn parse_line(line: impl AsRef<[u8]>) -> ParsedLine {
    let bytes = line.as_ref();
    let mut pos = bytes.iter().take_while(|&&b| is_space(b)).count();

    let negative = match bytes.get(pos) {
        Some(b'-') => {
            pos += 1;
            true
        }
        Some(b'+') => {
            pos += 1;
            false
        }
        _ => false,
    };

    let mut magnitude: i64 = 0;
    let mut digits = 0usize;
    for &b in bytes[pos..].iter().take_while(|b| b.is_ascii_digit()) {
        magnitude = magnitude
            .saturating_mul(10)
            .saturating_add(i64::from(b - b'0'));
        digits += 1;
    }

    if digits == 0 {
        return ParsedLine {
            value: 0,
            parsed: false,
        };
    }

    let signed = if negative { -magnitude } else { magnitude };
    let value = signed.clamp(i64::from(i32::MIN), i64::from(i32::MAX)) as i32;
    ParsedLine {
        value,
        parsed: true,
    }
}

// Same set as C `isspace` in the "C" locale.
fn is_space(b: u8) -> bool {
    matches!(b, b' ' | b'\t' | b'\n' | 0x0B | 0x0C | b'\r')
}
