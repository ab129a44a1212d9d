//! Selection of tool entries by repository and curator labels.

use gxtdb_schema::tool::ToolMetadata;

/// Criteria a tool entry must satisfy to be walked.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FilterCriteria {
    /// Only tools installed from some tool shed.
    pub require_repository: bool,
    /// Only tools installed from the main tool shed.
    pub require_main_shed: bool,
    /// Every one of these labels must be present.
    pub require_labels: Vec<String>,
    /// None of these labels may be present.
    pub exclude_labels: Vec<String>,
}

impl FilterCriteria {
    pub fn new() -> Self {
        Self::default()
    }

    /// Criteria used for install manifests.
    pub fn installable() -> Self {
        Self {
            require_repository: true,
            require_main_shed: true,
            ..Self::default()
        }
    }

    pub fn with_required_labels(mut self, labels: impl IntoIterator<Item = String>) -> Self {
        self.require_labels.extend(labels);
        self
    }

    pub fn with_excluded_labels(mut self, labels: impl IntoIterator<Item = String>) -> Self {
        self.exclude_labels.extend(labels);
        self
    }

    pub fn matches(&self, tool: &ToolMetadata) -> bool {
        if self.require_repository && tool.tool_shed_repository.is_none() {
            return false;
        }

        if self.require_main_shed && !tool.is_on_main_shed() {
            return false;
        }

        if !self.require_labels.iter().all(|label| tool.has_label(label)) {
            return false;
        }

        if self.exclude_labels.iter().any(|label| tool.has_label(label)) {
            return false;
        }

        true
    }
}
