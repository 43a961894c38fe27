//! Provenance and comment headers prepended to migrated content.

mod error;
mod renderer;

pub use error::TemplateError;
pub use renderer::{create_handlebars_registry, TemplateRenderer};

use chrono::{DateTime, Utc};

/// Header placed above a migrated issue body.
pub const PROVENANCE_TEMPLATE: &str = "### 🔄 Migrated from {{platform}}

**Original Issue:** {{url}}
**Original Author:** @{{author}}
**Created:** {{created_at}}
**Last Updated:** {{updated_at}}
{{#if closed_at}}**Closed:** {{closed_at}}
{{/if}}**State:** {{state}}

---

";

/// Line placed above a migrated comment body.
pub const COMMENT_TEMPLATE: &str =
    "**@{{author}}** commented on {{created_at}}{{#if edited_at}} _(edited {{edited_at}})_{{/if}}

{{body}}";

/// Formats a timestamp the way headers show it.
///
/// Format: "2006-01-02 15:04:05 UTC"
#[must_use]
pub fn format_timestamp(timestamp: &DateTime<Utc>) -> String {
    timestamp.format("%Y-%m-%d %H:%M:%S UTC").to_string()
}
