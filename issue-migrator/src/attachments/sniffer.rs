//! File type detection from leading bytes.
//!
//! Source URLs frequently carry opaque hashes instead of filenames, so the
//! destination would otherwise receive files without an extension and serve
//! them with the wrong content type.

/// Number of leading bytes inspected by the SVG text probe.
const SVG_PROBE_LEN: usize = 200;

/// Size of the BMP file header (`BM`, file size, two reserved words, pixel offset).
const BMP_FILE_HEADER_LEN: usize = 14;

/// Extensions reported by `infer` that are kept, with the name used on upload.
const KNOWN_EXTENSIONS: &[(&str, &str)] = &[
    // Images
    ("jpg", ".jpg"),
    ("png", ".png"),
    ("gif", ".gif"),
    ("webp", ".webp"),
    ("bmp", ".bmp"),
    ("ico", ".ico"),
    ("tif", ".tiff"),
    ("avif", ".avif"),
    ("heif", ".heif"),
    ("psd", ".psd"),
    // Video and audio
    ("mp4", ".mp4"),
    ("m4v", ".m4v"),
    ("mov", ".mov"),
    ("avi", ".avi"),
    ("webm", ".webm"),
    ("mkv", ".mkv"),
    ("mp3", ".mp3"),
    ("wav", ".wav"),
    ("ogg", ".ogg"),
    ("flac", ".flac"),
    // Documents
    ("pdf", ".pdf"),
    ("docx", ".docx"),
    ("xlsx", ".xlsx"),
    ("pptx", ".pptx"),
    ("epub", ".epub"),
    // Archives
    ("zip", ".zip"),
    ("gz", ".gz"),
    ("tar", ".tar"),
    ("rar", ".rar"),
    ("7z", ".7z"),
];

/// Returns a best-guess extension (with leading dot) for the given bytes.
///
/// Returns an empty string when no known signature matches.
#[must_use]
pub fn sniff_extension(data: &[u8]) -> &'static str {
    if let Some(extension) = heif_extension(data) {
        return extension;
    }

    if let Some(kind) = infer::get(data) {
        let extension = kind.extension();
        let plausible = extension != "bmp" || is_bmp_header(data);
        let known = KNOWN_EXTENSIONS
            .iter()
            .find(|(name, _)| *name == extension)
            .map(|(_, dotted)| *dotted);

        if let Some(dotted) = known.filter(|_| plausible) {
            return dotted;
        }
    }

    if is_svg(data) {
        ".svg"
    } else {
        ""
    }
}

/// Splits HEIC from generic HEIF by the `ftyp` major brand.
fn heif_extension(data: &[u8]) -> Option<&'static str> {
    if data.len() < 12 || &data[4..8] != b"ftyp" {
        return None;
    }

    match &data[8..12] {
        b"heic" | b"heix" | b"hevc" | b"heim" | b"heis" => Some(".heic"),
        b"mif1" | b"msf1" => Some(".heif"),
        _ => None,
    }
}

/// A `BM` signature followed by a full file header with zeroed reserved words.
fn is_bmp_header(data: &[u8]) -> bool {
    data.len() >= BMP_FILE_HEADER_LEN
        && data.starts_with(b"BM")
        && data[6..10].iter().all(|&byte| byte == 0)
}

fn is_svg(data: &[u8]) -> bool {
    let head = &data[..data.len().min(SVG_PROBE_LEN)];
    let text = String::from_utf8_lossy(head).to_lowercase();
    text.contains("<svg") || (text.contains("<?xml") && text.contains("svg"))
}

#[cfg(test)]
mod tests {
    use super::*;

    /// A complete `ftyp` box whose declared size matches its length.
    fn ftyp_box(major: &[u8; 4], compatible: &[u8; 4]) -> Vec<u8> {
        let mut data = vec![0x00, 0x00, 0x00, 0x18];
        data.extend_from_slice(b"ftyp");
        data.extend_from_slice(major);
        data.extend_from_slice(&[0x00, 0x00, 0x00, 0x00]);
        data.extend_from_slice(major);
        data.extend_from_slice(compatible);
        data
    }

    #[test]
    fn can_detect_png() {
        let data = [0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0x00];
        assert_eq!(sniff_extension(&data), ".png");
    }

    #[test]
    fn can_detect_jpeg() {
        assert_eq!(sniff_extension(&[0xFF, 0xD8, 0xFF]), ".jpg");
        assert_eq!(sniff_extension(&[0xFF, 0xD8, 0xFF, 0xE0, 0x00]), ".jpg");
    }

    #[test]
    fn empty_input_has_no_classification() {
        assert_eq!(sniff_extension(&[]), "");
    }

    #[test]
    fn unknown_bytes_have_no_classification() {
        assert_eq!(sniff_extension(b"just some plain text"), "");
    }

    #[test]
    fn can_detect_riff_containers() {
        assert_eq!(sniff_extension(b"RIFF\x10\x00\x00\x00WEBPVP8 "), ".webp");
        assert_eq!(sniff_extension(b"RIFF\x10\x00\x00\x00AVI LIST"), ".avi");
    }

    #[test]
    fn tiff_is_named_with_full_extension() {
        let mut little_endian = vec![0x49, 0x49, 0x2A, 0x00, 0x08, 0x00, 0x00, 0x00];
        little_endian.resize(16, 0x00);
        assert_eq!(sniff_extension(&little_endian), ".tiff");

        let mut big_endian = vec![0x4D, 0x4D, 0x00, 0x2A, 0x00, 0x00, 0x00, 0x08];
        big_endian.resize(16, 0x00);
        assert_eq!(sniff_extension(&big_endian), ".tiff");
    }

    #[test]
    fn heic_and_heif_are_told_apart_by_brand() {
        assert_eq!(sniff_extension(&ftyp_box(b"heic", b"mif1")), ".heic");
        assert_eq!(sniff_extension(&ftyp_box(b"mif1", b"miaf")), ".heif");
    }

    #[test]
    fn can_detect_other_iso_media() {
        assert_eq!(sniff_extension(&ftyp_box(b"avif", b"mif1")), ".avif");
        assert_eq!(sniff_extension(&ftyp_box(b"isom", b"iso2")), ".mp4");
    }

    #[test]
    fn can_detect_documents_and_archives() {
        assert_eq!(sniff_extension(b"%PDF-1.7\n"), ".pdf");
        assert_eq!(sniff_extension(&[0x50, 0x4B, 0x03, 0x04, 0x14]), ".zip");
        assert_eq!(sniff_extension(b"GIF89a\x01\x00"), ".gif");
        assert_eq!(sniff_extension(&[0x00, 0x00, 0x01, 0x00, 0x01]), ".ico");
    }

    #[test]
    fn can_detect_bmp_with_valid_header() {
        let header = b"BM\x46\x00\x00\x00\x00\x00\x00\x00\x36\x00\x00\x00\x28\x00\x00\x00";
        assert_eq!(sniff_extension(header), ".bmp");
    }

    #[test]
    fn text_starting_with_bm_is_not_bmp() {
        assert_eq!(sniff_extension(b"BMW service log"), "");
        assert_eq!(sniff_extension(b"BM"), "");
    }

    #[test]
    fn can_detect_svg_text() {
        let svg = br#"<svg xmlns="http://www.w3.org/2000/svg" width="10" height="10"></svg>"#;
        assert_eq!(sniff_extension(svg), ".svg");

        let xml = br#"<?xml version="1.0"?><!DOCTYPE svg PUBLIC "-//W3C//DTD SVG 1.1//EN">"#;
        assert_eq!(sniff_extension(xml), ".svg");

        assert_eq!(sniff_extension(b"<?xml version=\"1.0\"?><feed/>"), "");
    }
}
