//! Attachment migration pipeline.
//!
//! A body is scanned for embedded images and file links, each referenced file
//! is downloaded from the source platform and re-uploaded to the destination,
//! and the body is rewritten to point at the new copies. Every attachment is
//! best effort: a failed download or upload leaves that URL untouched.

mod error;
mod fetcher;
mod filename;
mod reference;
mod rewriter;
mod scanner;
mod sniffer;

pub use error::DownloadError;
pub use fetcher::{AttachmentFetcher, DownloadedFile, SourceCredentials};
pub(crate) use fetcher::authority_of;
pub use filename::{content_type_for, resolve_filename, sanitize_filename};
pub use reference::{AttachmentReference, LinkStyle, UploadedAsset};
pub use rewriter::rewrite_body;
pub use scanner::{is_absolute_url, is_file_url, scan_attachments};
pub use sniffer::sniff_extension;

use crate::uploads::AttachmentUploader;
use tracing::{debug, info, warn};

/// A body after attachment migration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigratedBody {
    /// Rewritten body.
    pub body: String,

    /// Attachments that now live on the destination.
    pub uploaded: Vec<UploadedAsset>,

    /// Number of attachments left on the source.
    pub failed: usize,
}

/// Moves every attachment referenced in `body` to the destination.
///
/// Attachments are processed one at a time in discovery order.
pub async fn migrate_attachments(
    body: &str,
    fetcher: &AttachmentFetcher,
    uploader: &dyn AttachmentUploader,
) -> MigratedBody {
    let references = scan_attachments(body);
    if references.is_empty() {
        return MigratedBody {
            body: body.to_string(),
            uploaded: Vec::new(),
            failed: 0,
        };
    }

    if !uploader.is_available() {
        warn!(
            count = references.len(),
            "Destination cannot accept uploads, leaving attachments on the source platform"
        );
        return MigratedBody {
            body: body.to_string(),
            uploaded: Vec::new(),
            failed: references.len(),
        };
    }

    info!(count = references.len(), "Migrating attachments");

    let mut uploaded = Vec::with_capacity(references.len());
    let mut failed = 0;
    for reference in &references {
        match migrate_one(reference, fetcher, uploader).await {
            Some(asset) => uploaded.push(asset),
            None => failed += 1,
        }
    }

    if failed > 0 {
        warn!(
            migrated = uploaded.len(),
            failed, "Some attachments were left on the source platform"
        );
    }

    MigratedBody {
        body: rewrite_body(body, &uploaded, uploader.link_style()),
        uploaded,
        failed,
    }
}

async fn migrate_one(
    reference: &AttachmentReference,
    fetcher: &AttachmentFetcher,
    uploader: &dyn AttachmentUploader,
) -> Option<UploadedAsset> {
    let url = reference.source_url.as_str();

    let file = match fetcher.fetch(url).await {
        Ok(file) => file,
        Err(e) => {
            warn!(url, error = %e, "Failed to download attachment, keeping original URL");
            return None;
        }
    };

    let filename = resolve_filename(reference, &file.data);
    debug!(
        url,
        filename = %filename,
        content_type = ?file.content_type,
        "Resolved attachment filename"
    );

    match uploader.upload(&file.data, &filename).await {
        Ok(destination_url) => Some(UploadedAsset {
            source_url: reference.source_url.clone(),
            destination_url,
            is_image: reference.is_image,
        }),
        Err(e) => {
            warn!(url, error = %e, "Failed to upload attachment, keeping original URL");
            None
        }
    }
}
