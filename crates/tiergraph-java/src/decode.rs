//! Source decoding over an ordered list of candidate encodings

use std::path::Path;
use tiergraph_parser_api::{ParserError, ParserResult, SourceEncoding};

/// Decoded file text and the encoding that produced it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedSource {
    pub text: String,
    pub encoding: SourceEncoding,
}

/// Decode `bytes` with the first encoding in `encodings` that accepts them.
///
/// Latin-1 maps every byte, so a list that contains it never fails.
pub fn decode_bytes(
    bytes: &[u8],
    encodings: &[SourceEncoding],
    path: &Path,
) -> ParserResult<DecodedSource> {
    for &encoding in encodings {
        if let Some(text) = try_decode(bytes, encoding) {
            return Ok(DecodedSource { text, encoding });
        }
        log::trace!("{} is not valid {}", path.display(), encoding);
    }

    Err(ParserError::UnsupportedEncoding(
        path.to_path_buf(),
        encodings.iter().map(|e| e.label().to_string()).collect(),
    ))
}

fn try_decode(bytes: &[u8], encoding: SourceEncoding) -> Option<String> {
    match encoding {
        SourceEncoding::Utf8 => std::str::from_utf8(bytes)
            .ok()
            .map(|s| s.strip_prefix('\u{feff}').unwrap_or(s).to_string()),
        // encoding_rs implements EUC-KR as its windows-949 superset
        SourceEncoding::EucKr | SourceEncoding::Cp949 => encoding_rs::EUC_KR
            .decode_without_bom_handling_and_without_replacement(bytes)
            .map(|text| text.into_owned()),
        SourceEncoding::Latin1 | SourceEncoding::Iso8859_1 => {
            Some(bytes.iter().map(|&b| char::from(b)).collect())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn default_encodings() -> Vec<SourceEncoding> {
        tiergraph_parser_api::ParserConfig::default().encodings
    }

    #[test]
    fn test_utf8_first() {
        let decoded = decode_bytes(
            "class Caf\u{e9} {}".as_bytes(),
            &default_encodings(),
            Path::new("A.java"),
        )
        .unwrap();
        assert_eq!(decoded.encoding, SourceEncoding::Utf8);
        assert_eq!(decoded.text, "class Caf\u{e9} {}");
    }

    #[test]
    fn test_bom_is_stripped() {
        let decoded =
            decode_bytes(b"\xEF\xBB\xBFclass A {}", &[SourceEncoding::Utf8], Path::new("A.java"))
                .unwrap();
        assert_eq!(decoded.text, "class A {}");
    }

    #[test]
    fn test_euc_kr_fallback() {
        // "// 주문" in EUC-KR
        let bytes = [0x2F, 0x2F, 0x20, 0xC1, 0xD6, 0xB9, 0xAE];
        let decoded =
            decode_bytes(&bytes, &default_encodings(), Path::new("K.java")).unwrap();
        assert_eq!(decoded.encoding, SourceEncoding::EucKr);
        assert_eq!(decoded.text, "// \u{c8fc}\u{bb38}");
    }

    #[test]
    fn test_latin1_accepts_anything() {
        let bytes = [0x41, 0xFF, 0x80];
        let decoded = decode_bytes(
            &bytes,
            &[SourceEncoding::Utf8, SourceEncoding::Latin1],
            Path::new("L.java"),
        )
        .unwrap();
        assert_eq!(decoded.encoding, SourceEncoding::Latin1);
        assert_eq!(decoded.text.chars().count(), 3);
    }

    #[test]
    fn test_no_encoding_matches() {
        let err = decode_bytes(&[0xFF, 0xFE, 0xFD], &[SourceEncoding::Utf8], Path::new("X.java"))
            .unwrap_err();
        match err {
            ParserError::UnsupportedEncoding(path, tried) => {
                assert_eq!(path, Path::new("X.java"));
                assert_eq!(tried, vec!["utf-8".to_string()]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
