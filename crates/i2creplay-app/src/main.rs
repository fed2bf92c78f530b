use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use i2creplay_core::{
    run, LineSource, OutputFormat, ReaderSource, SerialConfig, SerialService, TextEncoding,
    TraceEmitter, ValueRadix,
};
use i2creplay_decode::{I2cDecoder, PinMap};
use log::info;
use std::io::{self, BufWriter};
use tracing_subscriber::EnvFilter;

/// Annotate logic analyser samples with the I2C activity they carry.
///
/// Reads analyser output on stdin (or a serial port) and writes each sample
/// back as `row, delta, levels, trace, event`, tab separated. Lines that do
/// not start with a digit are copied through unchanged.
#[derive(Parser, Debug)]
#[command(name = "i2creplay", version)]
struct Args {
    /// Bit number (0..7) of the clock line, SCL
    #[arg(value_parser = clap::value_parser!(u8).range(0..=7))]
    clk: u8,

    /// Bit number (0..7) of the data line, SDA
    #[arg(value_parser = clap::value_parser!(u8).range(0..=7))]
    sda: u8,

    /// Output record format
    #[arg(long, value_enum, default_value_t = Format::Tsv)]
    format: Format,

    /// Show addresses and data bytes in hexadecimal
    #[arg(long)]
    hex: bool,

    /// Re-encode trace text from this character set (UTF-8, ASCII, GBK, GB2312; anything
    /// else auto-detects). Without it TSV output keeps the trace bytes as captured.
    #[arg(long)]
    encoding: Option<String>,

    /// Read from this serial port instead of stdin
    #[arg(long)]
    port: Option<String>,

    /// Serial baud rate
    #[arg(long, default_value_t = 115_200)]
    baud: u32,

    /// Diagnostic log level on stderr; RUST_LOG takes precedence
    #[arg(long, default_value = "warn")]
    log_level: String,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Format {
    Tsv,
    Json,
}

impl From<Format> for OutputFormat {
    fn from(f: Format) -> Self {
        match f {
            Format::Tsv => OutputFormat::Tsv,
            Format::Json => OutputFormat::Json,
        }
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&args.log_level))
        .unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();

    let pins = PinMap::new(args.clk, args.sda).context("invalid pin assignment")?;
    let encoding: Option<TextEncoding> =
        args.encoding.as_deref().map(|name| name.parse().unwrap_or_default());
    let radix = if args.hex { ValueRadix::Hex } else { ValueRadix::Decimal };
    info!("SCL on bit {}, SDA on bit {}, trace text {:?}", pins.clk(), pins.sda(), encoding);

    let stdin = io::stdin();
    let mut source: Box<dyn LineSource> = match &args.port {
        Some(port) => Box::new(SerialService::open(SerialConfig {
            port_name: port.clone(),
            baud_rate: args.baud,
            ..Default::default()
        })),
        None => Box::new(ReaderSource::new(stdin.lock())),
    };

    let stdout = io::stdout();
    let mut emitter = TraceEmitter::new(BufWriter::new(stdout.lock()), args.format.into(), radix)
        .with_encoding(encoding)
        .with_flush_each(args.port.is_some());
    let mut decoder = I2cDecoder::new(pins);

    match run(source.as_mut(), &mut decoder, &mut emitter) {
        Err(e) if e.is_broken_pipe() => {
            info!("output closed, stopping");
            Ok(())
        }
        other => other.map(|_| ()).context("replay failed"),
    }
}
