use chrono::{NaiveDate, NaiveDateTime};
use gxtdb_merge::MergeStrategy;
use gxtdb_schema::results::{TestResult, TestResults};
use gxtdb_schema::tool::{ToolDatabase, ToolMetadata, ToolVersionMetadata};
use proptest::prelude::*;
use std::collections::BTreeMap;

// ============================================================================
// Base Strategies
// ============================================================================

/// Timestamps between 2020 and roughly 2030 with microsecond precision.
pub fn strategy_datetime() -> impl Strategy<Value = NaiveDateTime> {
    (0u64..4000, 0u32..86_400, 0u32..1_000_000).prop_map(|(days, secs, micros)| {
        NaiveDate::from_ymd_opt(2020, 1, 1)
            .unwrap()
            .checked_add_days(chrono::Days::new(days))
            .unwrap()
            .and_hms_micro_opt(secs / 3600, (secs / 60) % 60, secs % 60, micros)
            .unwrap()
    })
}

pub fn strategy_status() -> impl Strategy<Value = String> {
    prop_oneof![
        3 => Just("success".to_string()),
        2 => Just("failed".to_string()),
        1 => Just("error".to_string()),
        1 => Just("skipped".to_string()),
    ]
}

pub fn strategy_merge_strategy() -> impl Strategy<Value = MergeStrategy> {
    proptest::sample::select(MergeStrategy::ALL.to_vec())
}

pub fn strategy_tool_id() -> impl Strategy<Value = String> {
    prop_oneof![
        "[a-z][a-z0-9_]{2,12}",
        "toolshed\\.g2\\.bx\\.psu\\.edu/repos/[a-z]{3,8}/[a-z_]{3,10}/[a-z_]{3,10}",
    ]
}

pub fn strategy_version() -> impl Strategy<Value = String> {
    (
        proptest::collection::vec(0u32..20, 1..4),
        proptest::option::of(0u32..4),
    )
        .prop_map(|(release, galaxy)| {
            let mut version = release
                .iter()
                .map(|n| n.to_string())
                .collect::<Vec<_>>()
                .join(".");
            if let Some(g) = galaxy {
                version.push_str(&format!("+galaxy{g}"));
            }
            version
        })
}

// ============================================================================
// Result Strategies
// ============================================================================

pub fn strategy_test_result() -> impl Strategy<Value = TestResult> {
    (strategy_status(), proptest::option::of(strategy_datetime()))
        .prop_map(|(status, time)| TestResult::new(status, time))
}

/// Result sets with indices drawn from `0..max_index`.
pub fn strategy_test_results(max_index: u32) -> impl Strategy<Value = TestResults> {
    proptest::collection::btree_map(0..max_index.max(1), strategy_test_result(), 0..8)
        .prop_map(TestResults::from)
}

/// Two result sets over a shared small index range, so they overlap often.
pub fn strategy_overlapping_pair() -> impl Strategy<Value = (TestResults, TestResults)> {
    (strategy_test_results(6), strategy_test_results(6))
}

// ============================================================================
// Database Strategies
// ============================================================================

fn strategy_version_metadata() -> impl Strategy<Value = ToolVersionMetadata> {
    (
        proptest::collection::btree_map("[a-z]{2,6}", strategy_test_results(5), 0..3),
        proptest::option::of("[A-Za-z ]{1,20}"),
    )
        .prop_map(|(test_results, name)| ToolVersionMetadata {
            test_results,
            name,
            ..ToolVersionMetadata::default()
        })
}

pub fn strategy_tool_metadata() -> impl Strategy<Value = ToolMetadata> {
    (
        proptest::collection::btree_map(strategy_version(), strategy_version_metadata(), 0..4),
        proptest::collection::btree_set("[a-z]{3,8}", 0..3),
    )
        .prop_map(|(versions, labels)| ToolMetadata {
            versions,
            external_labels: labels.into_iter().collect(),
            ..ToolMetadata::default()
        })
}

pub fn strategy_tool_database() -> impl Strategy<Value = ToolDatabase> {
    proptest::collection::btree_map(strategy_tool_id(), strategy_tool_metadata(), 0..5).prop_map(
        |tools: BTreeMap<String, ToolMetadata>| ToolDatabase {
            tools,
            ..ToolDatabase::default()
        },
    )
}
