use clap::Parser;
use measerial_decode::SampleEncoding;

/// Acquire a batch of samples from a microcontroller over a serial port and
/// write them as voltages.
///
/// Unset options fall back to the settings file.
#[derive(Parser, Debug, Default, PartialEq)]
#[command(name = "measerial", version, about, long_about = None)]
pub struct Args {
    /// Serial device, e.g. /dev/ttyACM0
    #[arg(short, long)]
    pub port: Option<String>,

    /// Baud rate
    #[arg(short = 'b', long = "baud")]
    pub baud_rate: Option<u32>,

    /// Milliseconds to wait after opening the port while the board resets
    #[arg(short = 'd', long = "delay")]
    pub reset_delay_ms: Option<u64>,

    /// Number of samples to acquire
    #[arg(short = 'n', long)]
    pub count: Option<usize>,

    /// Binary frames instead of text lines (same as `-e binary`)
    #[arg(short = 'r', long = "raw", conflicts_with = "encoding")]
    pub binary: bool,

    /// Wire encoding: binary or text
    #[arg(short, long)]
    pub encoding: Option<SampleEncoding>,

    /// Echo received data and raw integers
    #[arg(short = 'o', long)]
    pub echo: bool,

    /// Write voltages to <OUTPUT>.dat
    #[arg(short = 'f', long)]
    pub output: Option<String>,

    /// Give up after this many seconds
    #[arg(short = 't', long = "time-limit", value_parser = positive_seconds)]
    pub time_limit_s: Option<f64>,

    /// List serial ports and exit
    #[arg(short, long)]
    pub list: bool,
}

impl Args {
    /// Encoding chosen on the command line, if any.
    pub fn selected_encoding(&self) -> Option<SampleEncoding> {
        if self.binary {
            Some(SampleEncoding::Binary)
        } else {
            self.encoding
        }
    }
}

fn positive_seconds(s: &str) -> Result<f64, String> {
    let seconds: f64 = s.parse().map_err(|e| format!("{e}"))?;
    if seconds.is_finite() && seconds > 0.0 {
        Ok(seconds)
    } else {
        Err(format!("expected a positive number of seconds, got {s}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::error::ErrorKind;

    fn parse_str(line: &str) -> Result<Args, clap::Error> {
        Args::try_parse_from(std::iter::once("measerial").chain(line.split_whitespace()))
    }

    #[test]
    fn original_flag_set() {
        let args = parse_str("-p /dev/ttyACM0 -b 115200 -d 2000 -n 500 -o -r").unwrap();
        assert_eq!(
            args,
            Args {
                port: Some("/dev/ttyACM0".into()),
                baud_rate: Some(115_200),
                reset_delay_ms: Some(2000),
                count: Some(500),
                binary: true,
                echo: true,
                ..Default::default()
            }
        );
        assert_eq!(args.selected_encoding(), Some(SampleEncoding::Binary));
    }

    #[test]
    fn grouped_and_attached_values() {
        let args = parse_str("-orn100 -fscan -t2.5").unwrap();
        assert!(args.echo && args.binary);
        assert_eq!(args.count, Some(100));
        assert_eq!(args.output.as_deref(), Some("scan"));
        assert_eq!(args.time_limit_s, Some(2.5));
    }

    #[test]
    fn empty_command_line_is_all_defaults() {
        let args = parse_str("").unwrap();
        assert_eq!(args, Args::default());
        assert_eq!(args.selected_encoding(), None);
    }

    #[test]
    fn encoding_flag_selects_either_mode() {
        let args = parse_str("-e text").unwrap();
        assert_eq!(args.selected_encoding(), Some(SampleEncoding::Text));
        let args = parse_str("--encoding binary").unwrap();
        assert_eq!(args.selected_encoding(), Some(SampleEncoding::Binary));
        assert!(parse_str("-e hex").is_err());
        assert!(parse_str("-r -e text").is_err());
    }

    #[test]
    fn errors() {
        assert!(parse_str("-n").is_err());
        assert!(parse_str("-n ten").is_err());
        assert!(parse_str("-x").is_err());
        assert!(parse_str("stray").is_err());
        assert!(parse_str("-t 0").is_err());
        assert!(parse_str("-t inf").is_err());
        assert!(parse_str("-b -5").is_err());
    }

    #[test]
    fn help_and_list() {
        let err = parse_str("-h").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DisplayHelp);
        assert!(parse_str("-l").unwrap().list);
    }
}
