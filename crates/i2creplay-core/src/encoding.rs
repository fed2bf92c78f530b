use encoding_rs::{GBK, UTF_8};
use std::borrow::Cow;

/// Character set of the decorative trace text in sample lines.
///
/// Only ASCII-compatible sets are offered: line splitting and the numeric
/// fields are read byte-wise before any decoding happens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TextEncoding {
    #[default]
    Auto,
    Utf8,
    Ascii,
    Gbk,
    Gb2312,
}

impl std::str::FromStr for TextEncoding {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.to_ascii_uppercase().as_str() {
            "UTF-8" | "UTF8" => Self::Utf8,
            "ASCII" => Self::Ascii,
            "GBK" => Self::Gbk,
            "GB2312" => Self::Gb2312,
            _ => Self::Auto,
        })
    }
}

impl TextEncoding {
    pub fn decode<'a>(&self, bytes: &'a [u8]) -> Cow<'a, str> {
        match self {
            Self::Auto => detect_and_decode(bytes),
            Self::Utf8 => UTF_8.decode_without_bom_handling(bytes).0,
            Self::Ascii if bytes.is_ascii() => Cow::Borrowed(ascii_str(bytes)),
            Self::Ascii => bytes
                .iter()
                .map(|&b| if b.is_ascii() { b as char } else { '?' })
                .collect::<String>()
                .into(),
            Self::Gbk | Self::Gb2312 => GBK.decode_without_bom_handling(bytes).0,
        }
    }
}

fn ascii_str(bytes: &[u8]) -> &str {
    // ASCII is always valid UTF-8.
    std::str::from_utf8(bytes).unwrap_or_default()
}

fn detect_and_decode(bytes: &[u8]) -> Cow<'_, str> {
    if let Ok(s) = std::str::from_utf8(bytes) {
        return Cow::Borrowed(s);
    }

    let mut detector = chardetng::EncodingDetector::new();
    detector.feed(bytes, true);
    let encoding = detector.guess(None, true);
    log::debug!("trace text is not UTF-8, decoding as {}", encoding.name());

    encoding.decode_without_bom_handling(bytes).0
}
