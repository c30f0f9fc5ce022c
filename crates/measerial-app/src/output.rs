use anyhow::{Context, Result};
use measerial_core::{SampleEncoding, VoltageSeries};
use measerial_decode::FRAME_LEN;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

pub fn dat_path(stem: &str) -> PathBuf {
    PathBuf::from(format!("{stem}.dat"))
}

/// One voltage per line, in acquisition order.
pub fn write_voltages<W: Write>(out: W, series: &VoltageSeries) -> io::Result<()> {
    let mut out = BufWriter::new(out);
    for volts in series.iter() {
        writeln!(out, "{volts}")?;
    }
    out.flush()
}

pub fn save(path: &Path, series: &VoltageSeries) -> Result<()> {
    let file = File::create(path).with_context(|| format!("failed to create {}", path.display()))?;
    write_voltages(file, series).with_context(|| format!("failed to write {}", path.display()))
}

/// Dumps received bytes: one hex frame per line for binary runs, the
/// lines as sent for text runs.
pub fn echo_raw<W: Write>(out: &mut W, raw: &[u8], encoding: SampleEncoding) -> io::Result<()> {
    match encoding {
        SampleEncoding::Binary => {
            for chunk in raw.chunks(FRAME_LEN) {
                writeln!(out, "{}", hex::encode(chunk))?;
            }
        }
        SampleEncoding::Text => {
            let text = String::from_utf8_lossy(raw);
            out.write_all(text.as_bytes())?;
            if !text.is_empty() && !text.ends_with('\n') {
                writeln!(out)?;
            }
        }
    }
    Ok(())
}

pub fn echo_samples<W: Write>(out: &mut W, samples: &[i32]) -> io::Result<()> {
    for sample in samples {
        writeln!(out, "{sample}")?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dat_name() {
        assert_eq!(dat_path("test"), PathBuf::from("test.dat"));
        assert_eq!(dat_path("runs/scan1"), PathBuf::from("runs/scan1.dat"));
    }

    #[test]
    fn voltages_one_per_line() {
        let series = VoltageSeries::from_raw(&[1, 2, -1_000_000]);
        let mut buf = Vec::new();
        write_voltages(&mut buf, &series).unwrap();
        assert_eq!(String::from_utf8(buf).unwrap(), "0.000118\n0.000236\n-118\n");
    }

    #[test]
    fn save_writes_file() {
        let path = std::env::temp_dir().join(format!("measerial-{}-save.dat", std::process::id()));
        save(&path, &VoltageSeries::from_raw(&[0, 1_000_000])).unwrap();
        let written = std::fs::read_to_string(&path).unwrap();
        std::fs::remove_file(&path).unwrap();
        assert_eq!(written, "0\n118\n");
    }

    #[test]
    fn binary_echo_is_hex_per_frame() {
        let mut buf = Vec::new();
        echo_raw(&mut buf, &[b'<', 0x34, 0x12, b'>', b'<', 0xff], SampleEncoding::Binary).unwrap();
        assert_eq!(String::from_utf8(buf).unwrap(), "3c34123e\n3cff\n");
    }

    #[test]
    fn text_echo_ends_with_newline() {
        let mut buf = Vec::new();
        echo_raw(&mut buf, b"10\n2", SampleEncoding::Text).unwrap();
        assert_eq!(String::from_utf8(buf).unwrap(), "10\n2\n");
    }

    #[test]
    fn samples_echo() {
        let mut buf = Vec::new();
        echo_samples(&mut buf, &[5, -6]).unwrap();
        assert_eq!(buf, b"5\n-6\n");
    }
}
