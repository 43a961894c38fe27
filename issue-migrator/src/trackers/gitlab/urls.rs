//! GitLab upload link normalisation.

/// Attribute and Markdown prefixes a relative link can follow.
const LINK_PREFIXES: &[&str] = &["](", "=\"", "='"];

/// Rewrites GitLab upload links in `body` to absolute project upload URLs.
///
/// GitLab stores attachments as `/uploads/<hash>/<file>` relative to the
/// project, which the attachment scanner cannot download. Relative links and
/// absolute `{base}/uploads/...` links both become
/// `{base}/-/project/{id}/uploads/...`. Project paths (`group/app`) are used
/// as `{base}/group/app/uploads/...` instead.
#[must_use]
pub fn absolutize_upload_links(body: &str, base_url: &str, project_id: &str) -> String {
    let base = base_url.trim_end_matches('/');
    let project_path = if project_id.chars().all(|c| c.is_ascii_digit()) {
        format!("/-/project/{project_id}")
    } else {
        format!("/{}", project_id.trim_matches('/'))
    };

    let mut result = body.to_string();
    for prefix in LINK_PREFIXES {
        result = result.replace(
            &format!("{prefix}/uploads/"),
            &format!("{prefix}{base}{project_path}/uploads/"),
        );
    }

    result = result.replace(
        &format!("{base}/uploads/"),
        &format!("{base}{project_path}/uploads/"),
    );

    for prefix in LINK_PREFIXES {
        result = result.replace(
            &format!("{prefix}/-/project/"),
            &format!("{prefix}{base}/-/project/"),
        );
    }

    result
}
