//! Attachment discovery in Markdown and HTML bodies.

use super::reference::AttachmentReference;
use regex::Regex;
use std::collections::HashSet;
use std::sync::LazyLock;
use tracing::debug;
use url::Url;

/// `<img ... src="URL" ...>`
pub(crate) static HTML_IMAGE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"<img[^>]*\ssrc=["']([^"']+)["'][^>]*>"#).expect("valid HTML image pattern")
});

/// `![alt](URL)`
pub(crate) static MARKDOWN_IMAGE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"!\[([^\]]*)\]\(([^)\s]+)\)").expect("valid Markdown image pattern")
});

/// `<a ... href="URL" ...>text</a>`
pub(crate) static HTML_LINK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"<a[^>]*\shref=["']([^"']+)["'][^>]*>([^<]*)</a>"#)
        .expect("valid HTML link pattern")
});

/// `[text](URL)`, with the preceding `!` captured so images can be told apart.
pub(crate) static MARKDOWN_LINK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(!?)\[([^\]]*)\]\(([^)\s]+)\)").expect("valid Markdown link pattern")
});

/// `alt="text"` inside an HTML tag.
pub(crate) static ALT_ATTRIBUTE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"\salt=["']([^"']*)["']"#).expect("valid alt attribute pattern")
});

/// Extensions that mark a linked URL as a downloadable file.
const FILE_EXTENSIONS: &[&str] = &[
    // Images
    ".png", ".jpg", ".jpeg", ".gif", ".webp", ".svg", ".bmp",
    // Documents
    ".pdf", ".doc", ".docx", ".xls", ".xlsx", ".ppt", ".pptx", ".txt", ".rtf", ".odt", ".ods",
    ".odp",
    // Archives
    ".zip", ".tar", ".gz", ".rar", ".7z",
    // Source and text
    ".js", ".ts", ".py", ".go", ".java", ".c", ".cpp", ".h", ".rs", ".json", ".xml", ".yaml",
    ".yml", ".toml", ".ini", ".conf",
    // Other
    ".csv", ".log", ".sql", ".sh", ".bat", ".exe", ".dmg", ".deb", ".rpm",
];

/// Path fragments used by platforms to host uploaded files.
const FILE_HOST_PATTERNS: &[&str] = &[
    "github.com/user-attachments/assets",
    "github.com/user-attachments/files",
    "githubusercontent.com",
    "gitlab.com/uploads",
];

/// Returns true if the URL is an absolute http(s) URL.
#[must_use]
pub fn is_absolute_url(url: &str) -> bool {
    url.starts_with("http://") || url.starts_with("https://")
}

/// Returns true if a linked URL looks like a downloadable file.
///
/// Checks a fixed extension allow-list against the last path segment and a
/// set of known platform upload paths. Host names never count as extensions.
#[must_use]
pub fn is_file_url(url: &str) -> bool {
    let lower = url.to_lowercase();

    if last_path_segment(&lower).is_some_and(|segment| {
        FILE_EXTENSIONS
            .iter()
            .any(|ext| segment.len() > ext.len() && segment.ends_with(ext))
    }) {
        return true;
    }

    if lower.contains("/uploads/") && lower.contains("/-/project/") {
        return true;
    }

    FILE_HOST_PATTERNS
        .iter()
        .any(|pattern| lower.contains(pattern))
}

fn last_path_segment(url: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    let segment = parsed.path_segments()?.next_back()?;
    Some(segment.to_string())
}

/// Scans a body for attachment references.
///
/// Patterns are applied in precedence order: HTML images, Markdown images,
/// HTML file links, Markdown file links. Each URL is reported once; the first
/// pattern that finds it decides whether it is an image.
#[must_use]
pub fn scan_attachments(body: &str) -> Vec<AttachmentReference> {
    let mut scan = Scan::default();

    for caps in HTML_IMAGE.captures_iter(body) {
        scan.push(&caps[1], true, &caps[0]);
    }

    for caps in MARKDOWN_IMAGE.captures_iter(body) {
        scan.push(&caps[2], true, &caps[0]);
    }

    for caps in HTML_LINK.captures_iter(body) {
        if is_file_url(&caps[1]) {
            scan.push(&caps[1], false, &caps[0]);
        }
    }

    for caps in MARKDOWN_LINK.captures_iter(body) {
        if caps[1].is_empty() && !caps[2].is_empty() && is_file_url(&caps[3]) {
            scan.push(&caps[3], false, &caps[0]);
        }
    }

    debug!(count = scan.found.len(), "Scanned body for attachments");
    scan.found
}

#[derive(Default)]
struct Scan {
    seen: HashSet<String>,
    found: Vec<AttachmentReference>,
}

impl Scan {
    fn push(&mut self, url: &str, is_image: bool, markup: &str) {
        if !is_absolute_url(url) || !self.seen.insert(url.to_string()) {
            return;
        }
        self.found.push(AttachmentReference {
            source_url: url.to_string(),
            is_image,
            original_markup: markup.to_string(),
        });
    }
}
