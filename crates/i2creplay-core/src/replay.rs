use crate::emitter::TraceEmitter;
use crate::error::Result;
use crate::sample::Line;
use crate::source::LineSource;
use i2creplay_decode::{DecodeStats, I2cDecoder};
use log::info;
use std::io::Write;

/// Stream every line of `source` through the decoder into `emitter`.
///
/// Only one line is held at a time, so captures of any length are fine.
/// Output is flushed before returning.
pub fn run<S, W>(
    source: &mut S,
    decoder: &mut I2cDecoder,
    emitter: &mut TraceEmitter<W>,
) -> Result<DecodeStats>
where
    S: LineSource + ?Sized,
    W: Write,
{
    let mut buf = Vec::new();
    let mut passthrough = 0u64;

    while source.read_line(&mut buf)? {
        match Line::parse(&buf) {
            Line::Sample(sample) => {
                let event = decoder.feed(sample.levels);
                emitter.sample(&sample, event.as_ref())?;
            }
            Line::Passthrough(raw) => {
                passthrough += 1;
                emitter.passthrough(raw)?;
            }
        }
    }
    emitter.flush()?;

    let stats = *decoder.stats();
    info!(
        "{} samples ({} passthrough lines): {} START, {} STOP, {} bits, {} ACK, {} NACK, {} glitches",
        stats.samples,
        passthrough,
        stats.starts,
        stats.stops,
        stats.bits,
        stats.acks,
        stats.nacks,
        stats.glitches
    );
    Ok(stats)
}
