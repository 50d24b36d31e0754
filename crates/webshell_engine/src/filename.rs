use std::borrow::Cow;

use percent_encoding::percent_decode_str;
use sha2::{Digest, Sha256};
use url::Url;

const MAX_FILENAME_BYTES: usize = 120;

/// Portable name for a downloaded artifact.
///
/// Preference order: `filename*` / `filename` from `Content-Disposition`,
/// the last URL path segment, then `download--{short_hash(url)}`.
pub fn download_filename(content_disposition: Option<&str>, url: &Url) -> String {
    content_disposition
        .and_then(disposition_filename)
        .or_else(|| url_filename(url))
        .map(|name| sanitize_filename(&name))
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| format!("download--{}", short_hash(url.as_str())))
}

fn disposition_filename(value: &str) -> Option<String> {
    let mut plain = None;
    let mut extended = None;
    for param in split_params(value).into_iter().skip(1) {
        let Some((key, raw)) = param.split_once('=') else {
            continue;
        };
        let raw = raw.trim();
        match key.trim().to_ascii_lowercase().as_str() {
            "filename*" => extended = decode_ext_value(raw),
            "filename" => plain = Some(unquote(raw)),
            _ => {}
        }
    }
    extended.or(plain).filter(|name| !name.trim().is_empty())
}

/// Splits header parameters on `;` outside quoted-strings.
fn split_params(value: &str) -> Vec<&str> {
    let mut params = Vec::new();
    let mut start = 0;
    let mut in_quotes = false;
    let mut escaped = false;
    for (index, c) in value.char_indices() {
        match c {
            _ if escaped => escaped = false,
            '\\' if in_quotes => escaped = true,
            '"' => in_quotes = !in_quotes,
            ';' if !in_quotes => {
                params.push(&value[start..index]);
                start = index + 1;
            }
            _ => {}
        }
    }
    params.push(&value[start..]);
    params
}

/// Strips the quotes of a quoted-string and resolves `\` escapes.
fn unquote(raw: &str) -> String {
    let Some(inner) = raw
        .strip_prefix('"')
        .map(|rest| rest.strip_suffix('"').unwrap_or(rest))
    else {
        return raw.to_string();
    };
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            if let Some(next) = chars.next() {
                out.push(next);
            }
        } else {
            out.push(c);
        }
    }
    out
}

/// RFC 5987 `charset'lang'pct-encoded`; only UTF-8 payloads are accepted.
fn decode_ext_value(raw: &str) -> Option<String> {
    let (charset, rest) = raw.split_once('\'')?;
    let (_, encoded) = rest.split_once('\'')?;
    if !charset.eq_ignore_ascii_case("utf-8") {
        return None;
    }
    percent_decode(encoded)
}

fn url_filename(url: &Url) -> Option<String> {
    let segment = url.path_segments()?.next_back()?;
    if segment.is_empty() {
        return None;
    }
    percent_decode(segment)
}

/// `None` when the decoded bytes are not UTF-8.
fn percent_decode(input: &str) -> Option<String> {
    percent_decode_str(input)
        .decode_utf8()
        .ok()
        .map(Cow::into_owned)
}

fn sanitize_filename(input: &str) -> String {
    let cleaned: String = input
        .chars()
        .map(|c| if is_forbidden(c) { '_' } else { c })
        .collect();
    let cleaned = cleaned.trim_matches(&['_', ' ', '.'][..]);

    // Collapse multiple underscores
    let mut compacted = String::with_capacity(cleaned.len());
    let mut prev_underscore = false;
    for c in cleaned.chars() {
        if c == '_' {
            if !prev_underscore {
                compacted.push(c);
            }
            prev_underscore = true;
        } else {
            compacted.push(c);
            prev_underscore = false;
        }
    }

    let mut name = truncate_keeping_extension(compacted);
    let stem = name.split('.').next().unwrap_or(&name);
    if is_reserved_windows_name(stem) {
        name.insert(stem.len(), '_');
    }
    name
}

fn truncate_keeping_extension(name: String) -> String {
    if name.len() <= MAX_FILENAME_BYTES {
        return name;
    }
    let (stem, ext) = match name.rsplit_once('.') {
        Some((stem, ext)) if ext.len() < 16 => (stem, format!(".{ext}")),
        _ => (name.as_str(), String::new()),
    };
    let mut end = MAX_FILENAME_BYTES.saturating_sub(ext.len()).min(stem.len());
    while end > 0 && !stem.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}{ext}", &stem[..end])
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

fn short_hash(input: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(input.as_bytes());
    let digest = hasher.finalize();
    let mut hex = String::with_capacity(8);
    for byte in digest.iter().take(4) {
        use std::fmt::Write;
        let _ = write!(&mut hex, "{byte:02x}");
    }
    hex
}

#[cfg(test)]
mod tests {
    use super::{download_filename, percent_decode, sanitize_filename, MAX_FILENAME_BYTES};
    use url::Url;

    fn url(raw: &str) -> Url {
        Url::parse(raw).unwrap()
    }

    #[test]
    fn quoted_disposition_filename_is_used() {
        let name = download_filename(
            Some("attachment; filename=\"x.zip\""),
            &url("https://site.example/get?id=1"),
        );
        assert_eq!(name, "x.zip");
    }

    #[test]
    fn extended_filename_wins_over_plain() {
        let name = download_filename(
            Some("attachment; filename=\"fallback.txt\"; filename*=UTF-8''r%C3%A9sum%C3%A9.pdf"),
            &url("https://site.example/get"),
        );
        assert_eq!(name, "résumé.pdf");
    }

    #[test]
    fn url_segment_is_the_fallback() {
        let name = download_filename(Some("attachment"), &url("https://site.example/files/a%20b.zip"));
        assert_eq!(name, "a b.zip");
    }

    #[test]
    fn hash_is_the_last_resort() {
        let name = download_filename(None, &url("https://site.example/"));
        assert!(name.starts_with("download--"));
        assert_eq!(name.len(), "download--".len() + 8);
        assert_eq!(name, download_filename(None, &url("https://site.example/")));
    }

    #[test]
    fn path_separators_cannot_escape_the_directory() {
        let name = download_filename(
            Some("attachment; filename=\"../../etc/passwd\""),
            &url("https://site.example/"),
        );
        assert!(!name.contains('/'));
        assert_eq!(name, "etc_passwd");
    }

    #[test]
    fn reserved_device_names_are_suffixed() {
        assert_eq!(sanitize_filename("con.txt"), "con_.txt");
        assert_eq!(sanitize_filename("NUL"), "NUL_");
    }

    #[test]
    fn long_names_keep_their_extension() {
        let long = format!("{}.pdf", "é".repeat(100));
        let name = sanitize_filename(&long);
        assert!(name.len() <= MAX_FILENAME_BYTES);
        assert!(name.ends_with(".pdf"));
    }

    #[test]
    fn non_utf8_escapes_are_rejected() {
        assert_eq!(percent_decode("caf%E9.txt"), None);
        assert_eq!(percent_decode("100%"), Some("100%".to_string()));
    }

    #[test]
    fn semicolons_inside_quotes_belong_to_the_name() {
        let name = download_filename(
            Some("attachment; filename=\"report;final.pdf\"; size=12"),
            &url("https://site.example/get"),
        );
        assert_eq!(name, "report;final.pdf");
    }

    #[test]
    fn escaped_quotes_do_not_end_the_name() {
        let name = download_filename(
            Some(r#"attachment; filename="a \"b\"; c.txt""#),
            &url("https://site.example/get"),
        );
        assert_eq!(name, "a _b_; c.txt");
    }
}
