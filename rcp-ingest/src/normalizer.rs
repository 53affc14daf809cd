//! Text normalization for uploaded files
//!
//! Upstream tools that export recipe files disagree about text encoding, so
//! bytes are decoded against an ordered list of strict candidates and the
//! first clean decode wins. A lossy Latin-1 pass terminates the chain, which
//! makes [`decode`] total: it never fails for any input.

use serde::Serialize;
use std::fmt;
use tracing::debug;

/// Encoding that produced a decoded text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum TextEncoding {
    #[serde(rename = "utf8")]
    Utf8,
    #[serde(rename = "windows1252")]
    Windows1252,
    #[serde(rename = "latin1")]
    Latin1,
    #[serde(rename = "iso8859_1")]
    Iso8859_1,
    #[serde(rename = "lossy_latin1")]
    LossyLatin1,
}

/// Strict candidates, in the order they are attempted
pub const CANDIDATES: [TextEncoding; 4] = [
    TextEncoding::Utf8,
    TextEncoding::Windows1252,
    TextEncoding::Latin1,
    TextEncoding::Iso8859_1,
];

impl TextEncoding {
    pub fn label(self) -> &'static str {
        match self {
            TextEncoding::Utf8 => "utf8",
            TextEncoding::Windows1252 => "windows1252",
            TextEncoding::Latin1 => "latin1",
            TextEncoding::Iso8859_1 => "iso8859_1",
            TextEncoding::LossyLatin1 => "lossy_latin1",
        }
    }

    /// Decode without substitution; `None` on the first invalid byte
    pub fn decode_strict(self, raw: &[u8]) -> Option<String> {
        match self {
            TextEncoding::Utf8 => std::str::from_utf8(raw).ok().map(str::to_owned),
            TextEncoding::Windows1252 => raw.iter().map(|&b| windows1252_char(b)).collect(),
            TextEncoding::Latin1 | TextEncoding::Iso8859_1 => {
                Some(raw.iter().map(|&b| char::from(b)).collect())
            }
            TextEncoding::LossyLatin1 => Some(decode_lossy(raw)),
        }
    }
}

impl fmt::Display for TextEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Decoded text plus the encoding that produced it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decoded {
    pub text: String,
    pub encoding: TextEncoding,
}

/// Decode bytes using the first strict candidate that accepts them
///
/// Falls back to [`decode_lossy`] when every candidate rejects the input.
pub fn decode(raw: &[u8]) -> Decoded {
    for encoding in CANDIDATES {
        if let Some(text) = encoding.decode_strict(raw) {
            if encoding != TextEncoding::Utf8 {
                debug!(%encoding, bytes = raw.len(), "Decoded with fallback encoding");
            }
            return Decoded { text, encoding };
        }
    }

    debug!(bytes = raw.len(), "All strict encodings rejected input, decoding lossily");
    Decoded {
        text: decode_lossy(raw),
        encoding: TextEncoding::LossyLatin1,
    }
}

/// Latin-1 decode that substitutes U+FFFD for undecodable bytes
///
/// Every byte has a Latin-1 code point, so in practice no substitution occurs;
/// the function exists as the infallible end of the fallback chain.
pub fn decode_lossy(raw: &[u8]) -> String {
    raw.iter()
        .map(|&b| latin1_char(b).unwrap_or(char::REPLACEMENT_CHARACTER))
        .collect()
}

fn latin1_char(byte: u8) -> Option<char> {
    char::from_u32(u32::from(byte))
}

/// Windows-1252 code points for 0x80..=0x9F; `None` marks the five bytes the
/// code page leaves undefined.
#[rustfmt::skip]
const WINDOWS_1252_HIGH: [Option<char>; 32] = [
    Some('\u{20AC}'), None,             Some('\u{201A}'), Some('\u{0192}'),
    Some('\u{201E}'), Some('\u{2026}'), Some('\u{2020}'), Some('\u{2021}'),
    Some('\u{02C6}'), Some('\u{2030}'), Some('\u{0160}'), Some('\u{2039}'),
    Some('\u{0152}'), None,             Some('\u{017D}'), None,
    None,             Some('\u{2018}'), Some('\u{2019}'), Some('\u{201C}'),
    Some('\u{201D}'), Some('\u{2022}'), Some('\u{2013}'), Some('\u{2014}'),
    Some('\u{02DC}'), Some('\u{2122}'), Some('\u{0161}'), Some('\u{203A}'),
    Some('\u{0153}'), None,             Some('\u{017E}'), Some('\u{0178}'),
];

fn windows1252_char(byte: u8) -> Option<char> {
    match byte {
        0x80..=0x9F => WINDOWS_1252_HIGH[usize::from(byte - 0x80)],
        _ => Some(char::from(byte)),
    }
}
