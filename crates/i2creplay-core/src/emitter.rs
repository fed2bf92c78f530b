//! Output side of a replay: one annotated record per sample, header lines
//! copied through verbatim.

use crate::encoding::TextEncoding;
use crate::error::Result;
use crate::sample::Sample;
use i2creplay_decode::{Acknowledged, Event};
use serde::Serialize;
use std::io::Write;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// `row\tdelta\tlevels\ttrace\tlabel`
    #[default]
    Tsv,
    /// One JSON object per sample.
    Json,
}

/// How byte values are written inside event labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ValueRadix {
    #[default]
    Decimal,
    Hex,
}

impl ValueRadix {
    fn render(&self, byte: u8) -> String {
        match self {
            ValueRadix::Decimal => byte.to_string(),
            ValueRadix::Hex => format!("0x{}", hex::encode_upper([byte])),
        }
    }
}

/// Text label for an event; empty when nothing was recognized.
pub fn label(event: Option<&Event>, radix: ValueRadix) -> String {
    let Some(event) = event else {
        return String::new();
    };
    match event {
        Event::Start => "START".to_string(),
        Event::Stop => "STOP".to_string(),
        Event::Bit(bit) => bit.to_string(),
        Event::Ack(ack) => format!("Ack {}", acknowledged(ack, radix)),
        Event::Nack(ack) => format!("Nack {}", acknowledged(ack, radix)),
    }
}

fn acknowledged(ack: &Acknowledged, radix: ValueRadix) -> String {
    match ack {
        Acknowledged::Address { address, direction } => {
            format!("adrs:{} {}", radix.render(*address), direction.as_str())
        }
        Acknowledged::Data { value } => format!("data:{}", radix.render(*value)),
    }
}

#[derive(Serialize)]
struct JsonRecord<'a> {
    row: u64,
    delta: u64,
    levels: u32,
    trace: &'a str,
    label: &'a str,
    event: Option<&'a Event>,
}

pub struct TraceEmitter<W: Write> {
    out: W,
    format: OutputFormat,
    radix: ValueRadix,
    encoding: Option<TextEncoding>,
    flush_each: bool,
}

impl<W: Write> TraceEmitter<W> {
    pub fn new(out: W, format: OutputFormat, radix: ValueRadix) -> Self {
        Self {
            out,
            format,
            radix,
            encoding: None,
            flush_each: false,
        }
    }

    /// Re-encode trace text to UTF-8 from the given character set.
    ///
    /// Without this, TSV records carry the trace bytes exactly as captured
    /// and JSON records auto-detect the character set.
    pub fn with_encoding(mut self, encoding: Option<TextEncoding>) -> Self {
        self.encoding = encoding;
        self
    }

    /// Flush after every record, for live captures watched as they arrive.
    pub fn with_flush_each(mut self, flush_each: bool) -> Self {
        self.flush_each = flush_each;
        self
    }

    pub fn sample(&mut self, sample: &Sample, event: Option<&Event>) -> Result<()> {
        let label = label(event, self.radix);
        match self.format {
            OutputFormat::Tsv => {
                write!(self.out, "{}\t{}\t{}\t", sample.row, sample.delta, sample.levels)?;
                match self.encoding {
                    Some(encoding) => {
                        self.out.write_all(encoding.decode(&sample.trace).as_bytes())?
                    }
                    None => self.out.write_all(&sample.trace)?,
                }
                writeln!(self.out, "\t{label}")?;
            }
            OutputFormat::Json => {
                let trace = self.encoding.unwrap_or_default().decode(&sample.trace);
                let record = JsonRecord {
                    row: sample.row,
                    delta: sample.delta,
                    levels: sample.levels,
                    trace: &trace,
                    label: &label,
                    event,
                };
                serde_json::to_writer(&mut self.out, &record)?;
                self.out.write_all(b"\n")?;
            }
        }
        self.after_record()
    }

    pub fn passthrough(&mut self, raw: &[u8]) -> Result<()> {
        self.out.write_all(raw)?;
        self.after_record()
    }

    pub fn flush(&mut self) -> Result<()> {
        self.out.flush()?;
        Ok(())
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn after_record(&mut self) -> Result<()> {
        if self.flush_each {
            self.out.flush()?;
        }
        Ok(())
    }
}
