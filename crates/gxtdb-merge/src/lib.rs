//! Merging utilities for reconciling test results.
//!
//! When new results arrive for a (tool, version, test target) slot that
//! already holds results, one of six strategies decides what the slot ends up
//! holding. Whole-set strategies pick one side outright. Index-wise strategies
//! resolve each test index on its own and cover the union of both sides.
//!
//! Merging is pure: neither input is modified and the outcome depends only on
//! the two sets and the strategy.

use gxtdb_schema::results::{TestResult, TestResults};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::trace;

/// Policy for combining existing results with newly ingested ones.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MergeStrategy {
    /// Keep the incoming set.
    LatestAdded,
    /// Keep whichever set ran more recently.
    LatestExecuted,
    /// Keep the set with more passes, then more tests, then more timestamps.
    Best,
    /// Per index, prefer incoming.
    LatestAddedIndexwise,
    /// Per index, prefer the more recently executed result.
    LatestExecutedIndexwise,
    /// Per index, prefer the better result.
    BestIndexwise,
}

impl MergeStrategy {
    pub const ALL: [MergeStrategy; 6] = [
        MergeStrategy::LatestAdded,
        MergeStrategy::LatestExecuted,
        MergeStrategy::Best,
        MergeStrategy::LatestAddedIndexwise,
        MergeStrategy::LatestExecutedIndexwise,
        MergeStrategy::BestIndexwise,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            MergeStrategy::LatestAdded => "latest_added",
            MergeStrategy::LatestExecuted => "latest_executed",
            MergeStrategy::Best => "best",
            MergeStrategy::LatestAddedIndexwise => "latest_added_indexwise",
            MergeStrategy::LatestExecutedIndexwise => "latest_executed_indexwise",
            MergeStrategy::BestIndexwise => "best_indexwise",
        }
    }

    pub fn is_indexwise(self) -> bool {
        matches!(
            self,
            MergeStrategy::LatestAddedIndexwise
                | MergeStrategy::LatestExecutedIndexwise
                | MergeStrategy::BestIndexwise
        )
    }
}

impl fmt::Display for MergeStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MergeStrategy {
    type Err = ParseStrategyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        MergeStrategy::ALL
            .into_iter()
            .find(|strategy| strategy.as_str() == s)
            .ok_or_else(|| ParseStrategyError(s.to_string()))
    }
}

/// An unrecognised merge strategy name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseStrategyError(pub String);

impl fmt::Display for ParseStrategyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let known = MergeStrategy::ALL.map(MergeStrategy::as_str).join(", ");
        write!(f, "Unknown merge strategy {:?} (expected one of: {known})", self.0)
    }
}

impl std::error::Error for ParseStrategyError {}

/// Combine `existing` results with `incoming` ones under `strategy`.
pub fn merge(existing: &TestResults, incoming: &TestResults, strategy: MergeStrategy) -> TestResults {
    match strategy {
        MergeStrategy::LatestAdded => incoming.clone(),
        MergeStrategy::LatestExecuted => pick(strategy, existing, incoming, latest_executed),
        MergeStrategy::Best => pick(strategy, existing, incoming, best),
        MergeStrategy::LatestAddedIndexwise => merge_indexwise(existing, incoming, |_, new| new),
        MergeStrategy::LatestExecutedIndexwise => {
            merge_indexwise(existing, incoming, later_executed)
        }
        MergeStrategy::BestIndexwise => {
            merge_indexwise(existing, incoming, |old, new| old.better_than(new))
        }
    }
}

fn pick(
    strategy: MergeStrategy,
    existing: &TestResults,
    incoming: &TestResults,
    choose: for<'a> fn(&'a TestResults, &'a TestResults) -> &'a TestResults,
) -> TestResults {
    let chosen = choose(existing, incoming);
    let kept = if std::ptr::eq(chosen, incoming) {
        "incoming"
    } else {
        "existing"
    };
    trace!(%strategy, kept, "whole-set merge");
    chosen.clone()
}

/// The set with the later recency signal. A set without one never wins
/// against a set that has one; with neither, or a tie, `existing` stays.
fn latest_executed<'a>(existing: &'a TestResults, incoming: &'a TestResults) -> &'a TestResults {
    match (existing.recency_signal(), incoming.recency_signal()) {
        (Some(old), Some(new)) if new > old => incoming,
        (None, Some(_)) => incoming,
        _ => existing,
    }
}

/// Compare by (success count, total count, timestamped count). A full tie
/// resolves to `incoming`.
fn best<'a>(existing: &'a TestResults, incoming: &'a TestResults) -> &'a TestResults {
    let score = |results: &TestResults| {
        (
            results.success_count(),
            results.total_count(),
            results.timestamped_count(),
        )
    };
    if score(existing) > score(incoming) {
        existing
    } else {
        incoming
    }
}

fn later_executed<'a>(existing: &'a TestResult, incoming: &'a TestResult) -> &'a TestResult {
    match (existing.execution_time, incoming.execution_time) {
        (Some(old), Some(new)) if new > old => incoming,
        (None, Some(_)) => incoming,
        _ => existing,
    }
}

fn merge_indexwise<F>(existing: &TestResults, incoming: &TestResults, resolve: F) -> TestResults
where
    F: for<'a> Fn(&'a TestResult, &'a TestResult) -> &'a TestResult,
{
    existing
        .union_of_indices(incoming)
        .into_iter()
        .filter_map(|index| {
            let chosen = match (existing.get(index), incoming.get(index)) {
                (Some(old), Some(new)) => resolve(old, new),
                (Some(only), None) | (None, Some(only)) => only,
                (None, None) => return None,
            };
            Some((index, chosen.clone()))
        })
        .collect()
}
