//! Tokenizer for logic analyzer output lines.
//!
//! A sample line starts with a decimal digit and reads
//! `row delta levels trace...`. Everything else is a header or comment
//! and is passed through untouched.

/// One captured instant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sample {
    pub row: u64,
    /// Analyzer ticks since the previous sample.
    pub delta: u64,
    /// Pin levels, one bit per probe.
    pub levels: u32,
    /// Decorative waveform text as captured, never interpreted.
    pub trace: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Line<'a> {
    Sample(Sample),
    /// Raw line bytes, terminator included.
    Passthrough(&'a [u8]),
}

impl<'a> Line<'a> {
    pub fn parse(raw: &'a [u8]) -> Self {
        match raw.first() {
            Some(b) if b.is_ascii_digit() => Line::Sample(Sample::parse(raw)),
            _ => Line::Passthrough(raw),
        }
    }
}

impl Sample {
    /// Parse a sample line. Missing numbers read as zero, oversized ones
    /// saturate; the remainder after the third number is the trace.
    pub fn parse(raw: &[u8]) -> Self {
        let body = strip_terminator(raw);
        let (row, rest) = scan_number(body);
        let (delta, rest) = scan_number(skip_whitespace(rest));
        let (levels, rest) = scan_number(skip_whitespace(rest));
        let trace = skip_whitespace(rest);

        Self {
            row,
            delta,
            levels: u32::try_from(levels).unwrap_or(u32::MAX),
            trace: trace.to_vec(),
        }
    }
}

fn strip_terminator(raw: &[u8]) -> &[u8] {
    let raw = raw.strip_suffix(b"\n").unwrap_or(raw);
    raw.strip_suffix(b"\r").unwrap_or(raw)
}

fn skip_whitespace(bytes: &[u8]) -> &[u8] {
    let n = bytes.iter().take_while(|b| b.is_ascii_whitespace()).count();
    &bytes[n..]
}

fn scan_number(bytes: &[u8]) -> (u64, &[u8]) {
    let n = bytes.iter().take_while(|b| b.is_ascii_digit()).count();
    let value = bytes[..n].iter().fold(0u64, |acc, b| {
        acc.saturating_mul(10).saturating_add(u64::from(b - b'0'))
    });
    (value, &bytes[n..])
}
