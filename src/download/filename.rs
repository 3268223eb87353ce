//! Filename resolution for downloaded beatmap-set archives.
//!
//! Resolution order: Content-Disposition filename field, then the last
//! path segment of the URL. The `.osz` extension is appended when the
//! resolved name lacks it, case-insensitively.

use url::Url;

/// Archive extension carried by beatmap-set files.
pub const ARCHIVE_EXTENSION: &str = ".osz";

/// Appends [`ARCHIVE_EXTENSION`] unless the name already ends with it.
///
/// The check is case-insensitive and the operation is idempotent:
/// `"abc.osz"` and `"abc.OSZ"` both pass through unchanged.
#[must_use]
pub fn ensure_archive_extension(name: &str) -> String {
    if name.to_ascii_lowercase().ends_with(ARCHIVE_EXTENSION) {
        name.to_string()
    } else {
        format!("{name}{ARCHIVE_EXTENSION}")
    }
}

/// Parses a Content-Disposition header to extract the filename.
///
/// Handles:
/// - `attachment; filename="example.osz"`
/// - `attachment; filename=example.osz`
/// - `attachment; filename*=UTF-8''example.osz` (RFC 5987)
pub(crate) fn parse_content_disposition(header: &str) -> Option<String> {
    // filename*= first (RFC 5987 encoded)
    if let Some(pos) = header.find("filename*=") {
        let value = header[pos + 10..].trim();
        if let Some(quote_pos) = value.find("''") {
            let encoded = &value[quote_pos + 2..];
            let end = encoded.find(';').unwrap_or(encoded.len());
            let encoded_name = encoded[..end].trim();
            if let Ok(decoded) = urlencoding::decode(encoded_name) {
                return Some(decoded.into_owned());
            }
        }
    }

    if let Some(pos) = header.find("filename=") {
        let value = header[pos + 9..].trim();

        if let Some(stripped) = value.strip_prefix('"') {
            if let Some(end) = stripped.find('"') {
                return Some(stripped[..end].to_string());
            }
        } else {
            let end = value.find(';').unwrap_or(value.len());
            let filename = value[..end].trim();
            if !filename.is_empty() {
                return Some(filename.to_string());
            }
        }
    }

    None
}

/// Replaces characters that are invalid on common filesystems.
pub(crate) fn sanitize_filename(name: &str) -> String {
    let sanitized: String = name
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();

    if sanitized.trim_matches(['_', '.']).is_empty() {
        "download".to_string()
    } else {
        sanitized
    }
}

/// Last URL path segment, percent-decoded; `"download"` when the path is bare.
pub(crate) fn filename_from_url(url: &Url) -> String {
    if let Some(mut segments) = url.path_segments() {
        if let Some(last) = segments.next_back() {
            if !last.is_empty() {
                let decoded = urlencoding::decode(last).unwrap_or_else(|_| last.into());
                return sanitize_filename(&decoded);
            }
        }
    }
    "download".to_string()
}
