//! Text decoding with an encoding fallback chain.
//!
//! Instrument exports arrive as UTF-8 or as one of the Western single-byte
//! code pages (Latin-1, ISO-8859-1, CP1252). UTF-8 is tried first; anything
//! that is not valid UTF-8 is decoded as windows-1252, which is the superset
//! that web-compatible decoders use for all three single-byte labels.

use std::path::Path;

use encoding_rs::{Encoding, UTF_8, WINDOWS_1252};
use serde::{Deserialize, Serialize};

use crate::error::{IngestError, Result};

/// Encoding a table was decoded with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TextEncoding {
    #[default]
    Utf8,
    /// Latin-1 / ISO-8859-1 / CP1252.
    Windows1252,
}

impl TextEncoding {
    /// The fallback chain, in order.
    pub const CHAIN: [TextEncoding; 2] = [Self::Utf8, Self::Windows1252];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Utf8 => "UTF-8",
            Self::Windows1252 => "windows-1252",
        }
    }

    fn encoding(self) -> &'static Encoding {
        match self {
            Self::Utf8 => UTF_8,
            Self::Windows1252 => WINDOWS_1252,
        }
    }

    /// Strict decode; `None` if the bytes are not valid in this encoding.
    fn decode(self, bytes: &[u8]) -> Option<String> {
        self.encoding()
            .decode_without_bom_handling_and_without_replacement(bytes)
            .map(std::borrow::Cow::into_owned)
    }
}

/// Decodes raw file bytes, returning the text and the encoding that worked.
///
/// A UTF-8 byte order mark is stripped. UTF-16 byte order marks are rejected.
pub fn decode_bytes(bytes: &[u8], path: &Path) -> Result<(String, TextEncoding)> {
    let mut body = bytes;
    if let Some((encoding, bom_len)) = Encoding::for_bom(bytes) {
        if encoding != UTF_8 {
            return Err(IngestError::UnsupportedEncoding {
                path: path.to_path_buf(),
                encoding: encoding.name(),
            });
        }
        body = &bytes[bom_len..];
    }

    for candidate in TextEncoding::CHAIN {
        if let Some(text) = candidate.decode(body) {
            tracing::debug!(
                path = %path.display(),
                encoding = candidate.as_str(),
                "decoded input"
            );
            return Ok((text, candidate));
        }
    }

    // windows-1252 maps every byte, so this is not reached in practice.
    let (text, _, _) = WINDOWS_1252.decode(body);
    Ok((text.into_owned(), TextEncoding::Windows1252))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn path() -> &'static Path {
        Path::new("input.csv")
    }

    #[test]
    fn test_utf8_with_bom() {
        let bytes = b"\xEF\xBB\xBFSample,Count\n";
        let (text, encoding) = decode_bytes(bytes, path()).unwrap();
        assert_eq!(text, "Sample,Count\n");
        assert_eq!(encoding, TextEncoding::Utf8);
    }

    #[test]
    fn test_latin1_fallback() {
        // "Cell µ" with a Latin-1 micro sign.
        let bytes = b"Cell \xB5\n";
        let (text, encoding) = decode_bytes(bytes, path()).unwrap();
        assert_eq!(text, "Cell \u{b5}\n");
        assert_eq!(encoding, TextEncoding::Windows1252);
    }

    #[test]
    fn test_cp1252_specific_byte() {
        let bytes = b"\x80 total";
        let (text, _) = decode_bytes(bytes, path()).unwrap();
        assert_eq!(text, "\u{20ac} total");
    }

    #[test]
    fn test_utf16_rejected() {
        let bytes = b"\xFF\xFEa\x00";
        assert!(matches!(
            decode_bytes(bytes, path()),
            Err(IngestError::UnsupportedEncoding { .. })
        ));
    }
}
