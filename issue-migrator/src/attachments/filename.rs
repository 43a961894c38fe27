//! Upload filename resolution.

use super::reference::AttachmentReference;
use super::scanner::ALT_ATTRIBUTE;
use super::sniffer::sniff_extension;

/// Name used when nothing better can be derived.
const FALLBACK_NAME: &str = "attachment";

/// Extensions guessed from URL substrings when the bytes give no answer.
const URL_EXTENSION_HINTS: &[(&str, &str)] = &[
    ("jpeg", ".jpeg"),
    ("jpg", ".jpg"),
    ("png", ".png"),
    ("gif", ".gif"),
    ("pdf", ".pdf"),
    ("docx", ".docx"),
    ("doc", ".doc"),
    ("zip", ".zip"),
];

/// Picks the filename used when re-uploading an attachment.
///
/// The name comes from the URL path, or from the image alt text for opaque
/// GitHub asset URLs. When it has no extension (or is GitLab's generic
/// `image` name) the downloaded bytes are sniffed for one.
#[must_use]
pub fn resolve_filename(reference: &AttachmentReference, data: &[u8]) -> String {
    let name = base_name(reference);

    if has_extension(&name) && !is_generic_image_name(&name) {
        return name;
    }

    let stem = if is_generic_image_name(&name) {
        "image".to_string()
    } else {
        name
    };

    let sniffed = sniff_extension(data);
    if !sniffed.is_empty() {
        return format!("{stem}{sniffed}");
    }

    match guess_extension(&reference.source_url) {
        Some(ext) => format!("{stem}{ext}"),
        None => stem,
    }
}

/// Returns the MIME type used when uploading a file with this name.
#[must_use]
pub fn content_type_for(filename: &str) -> String {
    mime_guess::from_path(filename)
        .first_raw()
        .unwrap_or("application/octet-stream")
        .to_string()
}

fn base_name(reference: &AttachmentReference) -> String {
    let url = &reference.source_url;

    if url.contains("github.com/user-attachments/") {
        let alt = ALT_ATTRIBUTE
            .captures(&reference.original_markup)
            .map(|caps| caps[1].trim().to_string())
            .filter(|alt| !alt.is_empty());
        return match alt {
            Some(alt) => sanitize_filename(&alt),
            None => FALLBACK_NAME.to_string(),
        };
    }

    let path = url.split(['?', '#']).next().unwrap_or(url);
    match path.rsplit('/').next() {
        Some(last) if !last.is_empty() => sanitize_filename(&decode_percent(last)),
        _ => FALLBACK_NAME.to_string(),
    }
}

/// Replaces spaces and drops characters that are unsafe in upload names.
#[must_use]
pub fn sanitize_filename(name: &str) -> String {
    let cleaned: String = name
        .replace(' ', "_")
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(*c, '_' | '-' | '.'))
        .collect();

    if cleaned.is_empty() || cleaned.chars().all(|c| c == '.') {
        "file".to_string()
    } else {
        cleaned
    }
}

fn has_extension(name: &str) -> bool {
    match name.rsplit_once('.') {
        Some((stem, ext)) => !stem.is_empty() && !ext.is_empty(),
        None => false,
    }
}

fn is_generic_image_name(name: &str) -> bool {
    name.eq_ignore_ascii_case("image")
}

fn guess_extension(url: &str) -> Option<&'static str> {
    let lower = url.to_lowercase();
    URL_EXTENSION_HINTS
        .iter()
        .find(|(hint, _)| lower.contains(hint))
        .map(|(_, ext)| *ext)
}

fn decode_percent(segment: &str) -> String {
    urlencoding::decode(segment)
        .map(|decoded| decoded.into_owned())
        .unwrap_or_else(|_| segment.to_string())
}
