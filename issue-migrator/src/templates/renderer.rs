//! Template renderer.

use super::{format_timestamp, TemplateError, COMMENT_TEMPLATE, PROVENANCE_TEMPLATE};
use crate::trackers::{IssueState, Platform, TrackerComment, TrackerIssue};
use handlebars::{no_escape, Handlebars};
use serde_json::{json, Value};

const PROVENANCE: &str = "provenance";
const COMMENT: &str = "comment";

/// Creates a configured Handlebars registry.
///
/// The registry is configured with:
/// - No HTML escaping (for markdown output)
/// - Strict mode (catches missing variables)
#[must_use]
pub fn create_handlebars_registry() -> Handlebars<'static> {
    let mut hbs = Handlebars::new();
    hbs.register_escape_fn(no_escape);
    hbs.set_strict_mode(true);
    hbs
}

/// Renders migration headers.
pub struct TemplateRenderer {
    handlebars: Handlebars<'static>,
}

impl TemplateRenderer {
    /// Creates a renderer with the built-in header templates.
    ///
    /// # Errors
    ///
    /// Returns an error if a template fails to compile.
    pub fn new() -> Result<Self, TemplateError> {
        Self::with_templates(PROVENANCE_TEMPLATE, COMMENT_TEMPLATE)
    }

    /// Creates a renderer with custom header templates.
    ///
    /// # Errors
    ///
    /// Returns an error if a template fails to compile.
    pub fn with_templates(provenance: &str, comment: &str) -> Result<Self, TemplateError> {
        let mut handlebars = create_handlebars_registry();
        handlebars.register_template_string(PROVENANCE, provenance)?;
        handlebars.register_template_string(COMMENT, comment)?;
        Ok(Self { handlebars })
    }

    /// Renders the provenance header for an issue from `platform`.
    ///
    /// # Errors
    ///
    /// Returns an error if template rendering fails.
    pub fn render_provenance(
        &self,
        platform: Platform,
        issue: &TrackerIssue,
    ) -> Result<String, TemplateError> {
        let closed_at = match issue.state {
            IssueState::Closed => issue.closed_at.as_ref().map(format_timestamp),
            IssueState::Open => None,
        };

        let data = json!({
            "platform": platform.display_name(),
            "url": issue.url,
            "author": issue.author,
            "created_at": format_timestamp(&issue.created_at),
            "updated_at": format_timestamp(&issue.updated_at),
            "closed_at": closed_at.unwrap_or_default(),
            "state": issue.state.as_str(),
        });

        self.render(PROVENANCE, &data)
    }

    /// Renders a comment with its author line.
    ///
    /// # Errors
    ///
    /// Returns an error if template rendering fails.
    pub fn render_comment(
        &self,
        comment: &TrackerComment,
        body: &str,
    ) -> Result<String, TemplateError> {
        let edited_at = comment
            .updated_at
            .filter(|updated| *updated > comment.created_at)
            .map(|updated| format_timestamp(&updated));

        let data = json!({
            "author": comment.author,
            "created_at": format_timestamp(&comment.created_at),
            "edited_at": edited_at.unwrap_or_default(),
            "body": body,
        });

        self.render(COMMENT, &data)
    }

    fn render(&self, name: &str, data: &Value) -> Result<String, TemplateError> {
        Ok(self.handlebars.render(name, data)?)
    }
}
