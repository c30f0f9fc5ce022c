mod args;
mod output;
mod settings;

use anyhow::{Context, Result};
use clap::Parser;
use log::{info, warn};
use measerial_core::{acquire, convert_to_voltage, list_ports, SerialTransport};
use std::io::{self, Write};
use std::time::Duration;

use args::Args;
use settings::Settings;

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    if args.list {
        return print_ports();
    }

    let mut settings = Settings::load()?;
    settings.apply(&args);
    let count = args.count.context("sample count is required (-n)")?;

    let mut transport = SerialTransport::open(&settings.serial_config()?)?;

    // Opening the port resets most Arduino-style boards.
    println!("sleep {} millisecs", settings.reset_delay_ms);
    std::thread::sleep(settings.reset_delay());
    println!("n = {count}\n");

    let time_limit = args.time_limit_s.map(Duration::from_secs_f64);
    let opts = settings.acquire_options(args.echo, time_limit);
    let result = acquire(&mut transport, count, settings.encoding, &opts);
    transport.close();
    let result = result.context("acquisition failed")?;

    println!("Time taken: {:.6}", result.elapsed().as_secs_f64());
    println!("SPS: {:.6}", result.throughput().hz());

    let stats = result.stats();
    if !stats.is_clean() {
        warn!(
            "data quality: {} unparsable lines, {} line timeouts, {} truncated lines, \
             {} surplus frames",
            stats.soft_failures,
            stats.line_timeouts,
            stats.truncated_lines,
            stats.surplus_frames
        );
    }

    if args.echo {
        let mut out = io::stdout().lock();
        if let Some(raw) = result.raw_bytes() {
            output::echo_raw(&mut out, raw, result.encoding())?;
        }
        output::echo_samples(&mut out, result.samples())?;
        out.flush()?;
    }

    let series = convert_to_voltage(result);
    let path = output::dat_path(&settings.output);
    output::save(&path, &series)?;
    info!("wrote {} voltages to {}", series.len(), path.display());
    Ok(())
}

fn print_ports() -> Result<()> {
    let ports = list_ports()?;
    if ports.is_empty() {
        println!("no serial ports found");
    }
    for port in ports {
        let mut line = format!("{} [{}]", port.port_name, port.port_type);
        if let (Some(vid), Some(pid)) = (port.vid, port.pid) {
            line.push_str(&format!(" {vid:04X}:{pid:04X}"));
        }
        if let Some(product) = port.product.or(port.manufacturer) {
            line.push_str(&format!(" {product}"));
        }
        println!("{line}");
    }
    Ok(())
}
