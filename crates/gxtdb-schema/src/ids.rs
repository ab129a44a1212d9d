//! Tool identifier helpers.
//!
//! Tools installed from a tool shed carry ids of the form
//! `host/repos/owner/repository/tool/version`. The database keys those
//! tools by the id without the trailing version segment.

/// Strip the trailing version segment from a tool-shed id.
///
/// Ids without a `repos` segment (built-in tools) are returned unchanged.
pub fn versionless_tool_id(tool_id: &str) -> &str {
    if !is_tool_shed_id(tool_id) {
        return tool_id;
    }
    match tool_id.rsplit_once('/') {
        Some((prefix, _)) => prefix,
        None => tool_id,
    }
}

/// The version segment of a tool-shed id, if any.
pub fn id_to_version(tool_id: &str) -> Option<&str> {
    if !is_tool_shed_id(tool_id) {
        return None;
    }
    tool_id
        .rsplit_once('/')
        .map(|(_, version)| version)
        .filter(|v| !v.is_empty())
}

/// Drop the last `/` segment unconditionally.
///
/// Used as a lookup fallback for ids that embed a version.
pub fn strip_last_segment(tool_id: &str) -> Option<&str> {
    tool_id.rsplit_once('/').map(|(prefix, _)| prefix)
}

fn is_tool_shed_id(tool_id: &str) -> bool {
    tool_id.split('/').any(|segment| segment == "repos")
}

#[cfg(test)]
mod tests {
    use super::*;

    const SHED_ID: &str = "toolshed.g2.bx.psu.edu/repos/devteam/bwa/bwa_mem/0.7.17.2";

    #[test]
    fn versionless_strips_version() {
        assert_eq!(
            versionless_tool_id(SHED_ID),
            "toolshed.g2.bx.psu.edu/repos/devteam/bwa/bwa_mem"
        );
    }

    #[test]
    fn versionless_keeps_builtin_ids() {
        assert_eq!(versionless_tool_id("cat1"), "cat1");
        assert_eq!(versionless_tool_id("__FILTER_FAILED_DATASETS__"), "__FILTER_FAILED_DATASETS__");
    }

    #[test]
    fn version_extraction() {
        assert_eq!(id_to_version(SHED_ID), Some("0.7.17.2"));
        assert_eq!(id_to_version("cat1"), None);
    }

    #[test]
    fn strip_last_segment_handles_plain_ids() {
        assert_eq!(strip_last_segment("a/b/c"), Some("a/b"));
        assert_eq!(strip_last_segment("cat1"), None);
    }
}
