//! Attachment reference types.

/// One attachment discovered in an issue or comment body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttachmentReference {
    /// Absolute http(s) URL of the attachment on the source platform.
    pub source_url: String,

    /// Whether the attachment was embedded as an image.
    pub is_image: bool,

    /// Exact markup the URL was found in (HTML tag or Markdown construct).
    pub original_markup: String,
}

impl AttachmentReference {
    /// Returns true if the reference was found in an HTML tag.
    #[must_use]
    pub fn is_html(&self) -> bool {
        self.original_markup.starts_with('<')
    }
}

/// An attachment that was re-uploaded to the destination platform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedAsset {
    /// URL on the source platform.
    pub source_url: String,

    /// URL returned by the destination platform.
    pub destination_url: String,

    /// Whether the attachment was embedded as an image.
    pub is_image: bool,
}

/// How destination URLs are written into rewritten bodies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LinkStyle {
    /// Keep the absolute URL returned by the uploader.
    #[default]
    Absolute,

    /// Reduce `.../uploads/<hash>/<file>` to `/uploads/<hash>/<file>` so the
    /// link survives a change of the destination's base domain.
    RelativeUploads,
}

impl LinkStyle {
    /// Applies the style to a destination URL.
    #[must_use]
    pub fn apply(self, destination_url: &str) -> String {
        match self {
            Self::Absolute => destination_url.to_string(),
            Self::RelativeUploads => match destination_url.split_once("/uploads/") {
                Some((_, rest)) => format!("/uploads/{rest}"),
                None => destination_url.to_string(),
            },
        }
    }
}
