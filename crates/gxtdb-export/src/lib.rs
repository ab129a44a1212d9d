//! Reports derived from the tool metadata database.
//!
//! Spreadsheet reports are returned as rows of cells and written by the
//! caller with `gxtdb_io::write_table`. YAML reports are serializable
//! structs shaped like the files Galaxy tooling consumes.

use std::collections::BTreeSet;

pub mod coverage;
pub mod install;
pub mod panel_view;

pub use coverage::{CoverageOptions, coverage_rows, coverage_versions_rows};
pub use install::{InstallEntry, InstallManifest, install_manifest};
pub use panel_view::{
    ExcludedTool, PanelView, PanelViewDefinition, PanelViewItem, SectionItem, panel_view,
    sections_tools,
};

pub const COLUMN_TOOL_ID: &str = "Tool ID";
pub const COLUMN_TOOL_VERSION: &str = "Tool Version";
pub const COLUMN_LATEST_VERSION: &str = "Latest Version";

/// A set of names given explicitly, or everything the database knows.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Selection {
    All,
    Only(Vec<String>),
}

impl Default for Selection {
    fn default() -> Self {
        Selection::Only(Vec::new())
    }
}

impl Selection {
    pub fn resolve(&self, known: impl FnOnce() -> BTreeSet<String>) -> Vec<String> {
        match self {
            Selection::All => known().into_iter().collect(),
            Selection::Only(names) => names.clone(),
        }
    }
}

/// Spreadsheet booleans.
pub fn cell_bool(value: bool) -> String {
    if value { "1" } else { "0" }.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn selection_resolves() {
        let known = || BTreeSet::from(["b".to_string(), "a".to_string()]);
        assert_eq!(Selection::All.resolve(known), vec!["a", "b"]);
        assert_eq!(
            Selection::Only(vec!["z".into()]).resolve(known),
            vec!["z".to_string()]
        );
        assert!(Selection::default().resolve(known).is_empty());
    }

    #[test]
    fn bools_are_digits() {
        assert_eq!(cell_bool(true), "1");
        assert_eq!(cell_bool(false), "0");
    }
}
