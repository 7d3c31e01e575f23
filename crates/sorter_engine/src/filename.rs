//! Filename handling for downloaded artifacts.

use percent_encoding::percent_decode_str;

const MAX_STEM_LEN: usize = 120;

/// Picks the on-disk name for a download: the server-supplied name when
/// usable, otherwise `fallback`.
pub fn artifact_filename(server_name: Option<&str>, fallback: &str) -> String {
    server_name
        .and_then(sanitize_filename)
        .or_else(|| sanitize_filename(fallback))
        .unwrap_or_else(|| "artifact.docx".to_string())
}

/// Reads the filename out of a `Content-Disposition` header value.
/// `filename*=` (RFC 5987) wins over plain `filename=`.
pub fn disposition_filename(header: &str) -> Option<String> {
    let mut plain = None;
    let mut extended = None;
    for param in header.split(';').skip(1) {
        let Some((key, value)) = param.split_once('=') else {
            continue;
        };
        let key = key.trim().to_ascii_lowercase();
        let value = value.trim();
        match key.as_str() {
            "filename*" => extended = decode_extended(value),
            "filename" => plain = Some(value.trim_matches('"').to_string()),
            _ => {}
        }
    }
    extended.or(plain).filter(|name| !name.trim().is_empty())
}

fn decode_extended(value: &str) -> Option<String> {
    // charset'language'percent-encoded
    let mut parts = value.splitn(3, '\'');
    let charset = parts.next()?;
    let _language = parts.next()?;
    let encoded = parts.next()?;
    if !charset.eq_ignore_ascii_case("utf-8") || !is_well_formed_escapes(encoded) {
        return None;
    }
    percent_decode_str(encoded)
        .decode_utf8()
        .ok()
        .map(|name| name.into_owned())
}

/// Every `%` must start a two-hex-digit escape; the decoder would pass
/// malformed ones through verbatim.
fn is_well_formed_escapes(encoded: &str) -> bool {
    let bytes = encoded.as_bytes();
    bytes.iter().enumerate().all(|(i, byte)| {
        *byte != b'%'
            || bytes
                .get(i + 1..i + 3)
                .is_some_and(|hex| hex.iter().all(u8::is_ascii_hexdigit))
    })
}

/// Windows-safe single path component, or `None` when nothing usable is left.
/// Directory parts are dropped so a server name can never escape the output dir.
pub fn sanitize_filename(input: &str) -> Option<String> {
    let base = input.rsplit(['/', '\\']).next().unwrap_or(input);
    let cleaned: String = base
        .chars()
        .map(|c| if is_forbidden(c) { '_' } else { c })
        .collect();
    let cleaned = cleaned.trim_matches(&['_', ' ', '.'][..]);
    if cleaned.is_empty() {
        return None;
    }

    let mut compacted = String::with_capacity(cleaned.len());
    let mut prev_underscore = false;
    for c in cleaned.chars() {
        if c == '_' && prev_underscore {
            continue;
        }
        prev_underscore = c == '_';
        compacted.push(c);
    }

    let (stem, ext) = match compacted.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => (stem.to_string(), Some(ext.to_string())),
        _ => (compacted.clone(), None),
    };
    let mut stem: String = stem.chars().take(MAX_STEM_LEN).collect();
    if is_reserved_windows_name(&stem) {
        stem.push('_');
    }
    Some(match ext {
        Some(ext) => format!("{stem}.{ext}"),
        None => stem,
    })
}

fn is_forbidden(c: char) -> bool {
    matches!(c,
        '\\' | '/' | ':' | '*' | '?' | '"' | '<' | '>' | '|' | '\0'..='\u{1F}'
    )
}

fn is_reserved_windows_name(name: &str) -> bool {
    const RESERVED: &[&str] = &[
        "CON", "PRN", "AUX", "NUL", "COM1", "COM2", "COM3", "COM4", "COM5", "COM6", "COM7", "COM8",
        "COM9", "LPT1", "LPT2", "LPT3", "LPT4", "LPT5", "LPT6", "LPT7", "LPT8", "LPT9",
    ];
    RESERVED.iter().any(|r| r.eq_ignore_ascii_case(name))
}
