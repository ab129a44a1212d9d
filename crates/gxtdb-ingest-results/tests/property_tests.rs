//! Property tests for gxtdb-ingest-results
//!
//! Timestamp parsing and grouping of report entries into result sets.

use gxtdb_ingest_results::{ExecutionReport, parse_create_time};
use gxtdb_testkit::proptest::{strategy_datetime, strategy_status, strategy_version};
use gxtdb_testkit::{report, report_entry};
use proptest::prelude::*;

const SHED_TOOL: &str = "toolshed.g2.bx.psu.edu/repos/devteam/bwa/bwa_mem";

// ============================================================================
// Timestamps
// ============================================================================

proptest! {
    /// Galaxy's naive ISO 8601 form parses back to the same instant.
    #[test]
    fn prop_create_time_round_trip(time in strategy_datetime()) {
        let raw = time.format("%Y-%m-%dT%H:%M:%S%.6f").to_string();
        prop_assert_eq!(parse_create_time(&raw), Some(time));
    }
}

// ============================================================================
// Grouping
// ============================================================================

proptest! {
    /// Entries for one tool version land in one set under the versionless id,
    /// indexed by position when the report carries no test_index.
    #[test]
    fn prop_entries_group_by_versionless_id(
        version in strategy_version(),
        entries in proptest::collection::vec(
            (strategy_status(), proptest::option::of(strategy_datetime())),
            1..8,
        ),
    ) {
        let tests = entries
            .iter()
            .map(|(status, time)| {
                let time = time.map(|t| t.format("%Y-%m-%dT%H:%M:%S%.6f").to_string());
                report_entry(&format!("{SHED_TOOL}/{version}"), &version, status, None, time.as_deref())
            })
            .collect();
        let parsed = ExecutionReport::from_json(&report(tests)).unwrap();
        let sets = parsed.result_sets();

        prop_assert_eq!(sets.len(), 1);
        prop_assert_eq!(sets[0].tool_id.as_str(), SHED_TOOL);
        prop_assert_eq!(&sets[0].version, &version);
        let indices: Vec<u32> = sets[0].results.indices().collect();
        prop_assert_eq!(indices, (0..entries.len() as u32).collect::<Vec<_>>());
        for (index, (status, time)) in entries.iter().enumerate() {
            let result = sets[0].results.get(index as u32).unwrap();
            prop_assert_eq!(&result.status, status);
            prop_assert_eq!(result.execution_time, *time);
        }
    }
}
