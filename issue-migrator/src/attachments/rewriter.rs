//! Rewrites attachment links to point at their migrated copies.

use super::reference::{LinkStyle, UploadedAsset};
use super::scanner::{ALT_ATTRIBUTE, HTML_IMAGE, HTML_LINK, MARKDOWN_LINK};
use regex::Captures;
use std::collections::HashMap;

/// Alt text used when an HTML image has none.
const DEFAULT_ALT: &str = "Image";

/// Link text used when an HTML file link has none.
const DEFAULT_LINK_TEXT: &str = "Download";

/// Rewrites every reference to a migrated URL in `body`.
///
/// HTML images and file links become their Markdown equivalents, Markdown
/// constructs keep their shape, and any remaining bare occurrence of a
/// migrated URL is substituted. URLs without an uploaded asset are left
/// untouched.
#[must_use]
pub fn rewrite_body(body: &str, assets: &[UploadedAsset], style: LinkStyle) -> String {
    if assets.is_empty() || body.is_empty() {
        return body.to_string();
    }

    let mapping: HashMap<&str, String> = assets
        .iter()
        .map(|asset| {
            (
                asset.source_url.as_str(),
                style.apply(&asset.destination_url),
            )
        })
        .collect();

    let rewritten = HTML_IMAGE.replace_all(body, |caps: &Captures| {
        match mapping.get(&caps[1]) {
            Some(destination) => {
                let alt = ALT_ATTRIBUTE
                    .captures(&caps[0])
                    .map(|alt| alt[1].to_string())
                    .filter(|alt| !alt.is_empty())
                    .unwrap_or_else(|| DEFAULT_ALT.to_string());
                format!("![{alt}]({destination})")
            }
            None => caps[0].to_string(),
        }
    });

    let rewritten = HTML_LINK.replace_all(&rewritten, |caps: &Captures| {
        match mapping.get(&caps[1]) {
            Some(destination) => {
                let text = match caps[2].trim() {
                    "" => DEFAULT_LINK_TEXT,
                    text => text,
                };
                format!("[{text}]({destination})")
            }
            None => caps[0].to_string(),
        }
    });

    let rewritten = MARKDOWN_LINK.replace_all(&rewritten, |caps: &Captures| {
        match mapping.get(&caps[3]) {
            Some(destination) => format!("{}[{}]({destination})", &caps[1], &caps[2]),
            None => caps[0].to_string(),
        }
    });

    let mut result = rewritten.into_owned();
    for asset in assets {
        if let Some(destination) = mapping.get(asset.source_url.as_str()) {
            result = replace_bare_url(&result, &asset.source_url, destination);
        }
    }
    result
}

/// Replaces standalone occurrences of `url`, skipping ones that are only a
/// prefix of a longer URL.
fn replace_bare_url(text: &str, url: &str, replacement: &str) -> String {
    let mut output = String::with_capacity(text.len());
    let mut rest = text;

    while let Some(index) = rest.find(url) {
        let after = &rest[index + url.len()..];
        output.push_str(&rest[..index]);
        if continues_url(after) {
            output.push_str(url);
        } else {
            output.push_str(replacement);
        }
        rest = after;
    }

    output.push_str(rest);
    output
}

fn continues_url(after: &str) -> bool {
    let mut chars = after.chars();
    match chars.next() {
        None => false,
        Some('.' | ',') => chars.next().is_some_and(|c| c.is_ascii_alphanumeric()),
        Some(c) => c.is_ascii_alphanumeric() || "-_~/?#%&=+@:;$*".contains(c),
    }
}
