//! Text decoding for documents read from disk.

use std::borrow::Cow;

/// Decode bytes to a string, handling various encodings.
///
/// This function:
/// 1. First tries UTF-8 (handles BOM automatically via encoding_rs)
/// 2. If malformed, tries the hint encoding (from `<meta charset>`)
/// 3. Falls back to Windows-1252
///
/// Uses `Cow<str>` to avoid allocation when the input is valid UTF-8.
pub fn decode_text<'a>(bytes: &'a [u8], hint_encoding: Option<&str>) -> Cow<'a, str> {
    let (result, _encoding, malformed) = encoding_rs::UTF_8.decode(bytes);

    if !malformed {
        return result;
    }

    if let Some(name) = hint_encoding
        && let Some(encoding) = encoding_rs::Encoding::for_label(name.as_bytes())
    {
        let (result, _, _) = encoding.decode(bytes);
        return result;
    }

    let (result, _, _) = encoding_rs::WINDOWS_1252.decode(bytes);
    result
}

/// Find a `charset=` declaration in the head of an HTML document.
///
/// Only the first 1024 bytes are examined, as browsers do when prescanning.
pub fn sniff_charset(bytes: &[u8]) -> Option<String> {
    let head = &bytes[..bytes.len().min(1024)];
    let lower = head.to_ascii_lowercase();
    let needle = b"charset=";
    let at = lower.windows(needle.len()).position(|w| w == needle)? + needle.len();
    let value: String = lower[at..]
        .iter()
        .skip_while(|&&b| b == b'"' || b == b'\'')
        .take_while(|&&b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_')
        .map(|&b| b as char)
        .collect();
    (!value.is_empty()).then_some(value)
}

/// Decode an HTML document using its declared charset as the hint.
pub fn decode_html(bytes: &[u8]) -> Cow<'_, str> {
    let hint = sniff_charset(bytes);
    decode_text(bytes, hint.as_deref())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_utf8() {
        assert_eq!(decode_text("Ünïcödé".as_bytes(), None), "Ünïcödé");
    }

    #[test]
    fn test_decode_falls_back_to_windows_1252() {
        // 0x93/0x94 are curly quotes in CP1252 and invalid UTF-8
        assert_eq!(decode_text(b"\x93hi\x94", None), "\u{201c}hi\u{201d}");
    }

    #[test]
    fn test_decode_uses_hint() {
        // 0xE9 is é in Latin-1 and the hint wins over CP1252
        assert_eq!(decode_text(b"caf\xe9", Some("iso-8859-15")), "café");
    }

    #[test]
    fn test_sniff_charset() {
        assert_eq!(
            sniff_charset(b"<html><head><meta charset=\"ISO-8859-1\">").as_deref(),
            Some("iso-8859-1")
        );
        assert_eq!(
            sniff_charset(b"<meta http-equiv=\"Content-Type\" content=\"text/html; charset=windows-1252\">")
                .as_deref(),
            Some("windows-1252")
        );
        assert_eq!(sniff_charset(b"<html></html>"), None);
    }

    #[test]
    fn test_decode_html_with_declared_charset() {
        let doc = b"<meta charset=\"iso-8859-15\"><p>\xa4</p>";
        // 0xA4 is the euro sign in ISO-8859-15 but a currency sign in CP1252
        assert!(decode_html(doc).contains('\u{20ac}'));
    }
}
