//! Property tests for gxtdb-export
//!
//! Shape invariants of the spreadsheet reports.

use gxtdb_export::{CoverageOptions, Selection, coverage_rows, coverage_versions_rows};
use gxtdb_store::MetadataStore;
use gxtdb_testkit::proptest::strategy_tool_database;
use proptest::prelude::*;

// ============================================================================
// Row Shape
// ============================================================================

proptest! {
    /// Every coverage row is as wide as the header, one row per tool.
    #[test]
    fn prop_coverage_rows_rectangular(db in strategy_tool_database()) {
        let store = MetadataStore::from_database("db.yml", db.clone());
        let options = CoverageOptions {
            coverage: Selection::All,
            tests: Selection::All,
            labels: Selection::All,
            include_name: true,
            include_training_topics: true,
            ..CoverageOptions::default()
        };
        let rows = coverage_rows(&store, &options);
        prop_assert_eq!(rows.len(), db.tools.len() + 1);
        for row in &rows {
            prop_assert_eq!(row.len(), rows[0].len());
        }
    }

    /// The versions report has one row per tool version.
    #[test]
    fn prop_versions_rows_per_version(db in strategy_tool_database()) {
        let store = MetadataStore::from_database("db.yml", db.clone());
        let rows = coverage_versions_rows(&store);
        let versions: usize = db.tools.values().map(|t| t.versions.len()).sum();
        prop_assert_eq!(rows.len(), versions + 1);
        for row in &rows {
            prop_assert_eq!(row.len(), rows[0].len());
        }
    }

    /// Exactly one version per tool is flagged latest.
    #[test]
    fn prop_one_latest_per_tool(db in strategy_tool_database()) {
        let store = MetadataStore::from_database("db.yml", db.clone());
        let rows = coverage_versions_rows(&store);
        for tool_id in db.tools.iter().filter(|(_, t)| !t.versions.is_empty()).map(|(id, _)| id) {
            let latest = rows[1..]
                .iter()
                .filter(|row| &row[0] == tool_id && row[3] == "1")
                .count();
            prop_assert_eq!(latest, 1);
        }
    }
}
