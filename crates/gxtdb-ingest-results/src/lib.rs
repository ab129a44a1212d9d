//! Test execution report ingestion.
//!
//! A report is JSON with a top-level `tests` array. Entries without
//! `has_data`, without a `data` payload, or without a tool id are dropped.
//! The rest are grouped by tool id and then turned into one
//! [`TestResults`] per (versionless tool id, version).

use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDateTime};
use gxtdb_io::walk::has_extension;
use gxtdb_io::{is_url, read_uri, walk_files};
use gxtdb_ports::{ResultCollection, ResultIngestor, ToolVersionResults};
use gxtdb_schema::ids::{strip_last_segment, versionless_tool_id};
use gxtdb_schema::report::{RawTestData, RawTestEntry};
use gxtdb_schema::results::{TestResult, TestResults};
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::path::Path;
use tracing::{debug, warn};

/// Structural problems that make a whole report unusable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReportError {
    NotAnObject,
    MissingTests,
}

impl fmt::Display for ReportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReportError::NotAnObject => write!(f, "test report is not a JSON object"),
            ReportError::MissingTests => write!(f, "test report has no `tests` array"),
        }
    }
}

impl std::error::Error for ReportError {}

/// Usable report entries grouped by the tool id they name.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ExecutionReport {
    by_tool_id: BTreeMap<String, Vec<RawTestData>>,
}

impl ExecutionReport {
    pub fn from_json(value: &Value) -> Result<Self, ReportError> {
        let object = value.as_object().ok_or(ReportError::NotAnObject)?;
        let tests = object
            .get("tests")
            .and_then(Value::as_array)
            .ok_or(ReportError::MissingTests)?;

        let mut by_tool_id: BTreeMap<String, Vec<RawTestData>> = BTreeMap::new();
        for (position, raw) in tests.iter().enumerate() {
            let Ok(entry) = serde_json::from_value::<RawTestEntry>(raw.clone()) else {
                debug!(position, "skipping malformed report entry");
                continue;
            };
            if !entry.has_data {
                continue;
            }
            let Some(data) = entry.data else {
                debug!(position, "skipping report entry without data");
                continue;
            };
            let Some(tool_id) = data.tool_id.clone() else {
                debug!(position, "skipping report entry without tool_id");
                continue;
            };
            by_tool_id.entry(tool_id).or_default().push(data);
        }
        Ok(Self { by_tool_id })
    }

    pub fn parse(text: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(text).context("parse test report JSON")?;
        Ok(Self::from_json(&value)?)
    }

    pub fn tool_ids(&self) -> impl Iterator<Item = &str> {
        self.by_tool_id.keys().map(String::as_str)
    }

    /// Entries for `tool_id`, falling back to the id without its last segment.
    pub fn results_for_tool_id(&self, tool_id: &str) -> Option<&[RawTestData]> {
        self.by_tool_id
            .get(tool_id)
            .or_else(|| strip_last_segment(tool_id).and_then(|id| self.by_tool_id.get(id)))
            .map(Vec::as_slice)
    }

    /// One result set per (versionless tool id, version).
    ///
    /// The index of each result is its `test_index`. Entries without one take
    /// the lowest index no other entry of the same tool version uses.
    /// Duplicate indices keep the later entry and log a warning.
    pub fn result_sets(&self) -> Vec<ToolVersionResults> {
        let mut groups: BTreeMap<(&str, &str), Vec<&RawTestData>> = BTreeMap::new();
        for (tool_id, entries) in &self.by_tool_id {
            let tool_id = versionless_tool_id(tool_id);
            for data in entries {
                let Some(version) = data.tool_version.as_deref() else {
                    warn!(tool_id, "skipping test result without tool_version");
                    continue;
                };
                groups.entry((tool_id, version)).or_default().push(data);
            }
        }

        groups
            .into_iter()
            .map(|((tool_id, version), entries)| ToolVersionResults {
                tool_id: tool_id.to_string(),
                version: version.to_string(),
                results: index_results(tool_id, version, &entries),
            })
            .collect()
    }
}

fn index_results(tool_id: &str, version: &str, entries: &[&RawTestData]) -> TestResults {
    let explicit: BTreeSet<u32> = entries.iter().filter_map(|d| d.test_index).collect();
    let mut next_free = 0u32;
    let mut results = BTreeMap::new();
    for data in entries {
        let index = match data.test_index {
            Some(index) => index,
            None => {
                while explicit.contains(&next_free) {
                    next_free += 1;
                }
                let index = next_free;
                next_free += 1;
                index
            }
        };
        let Some(result) = to_result(tool_id, data) else {
            continue;
        };
        if results.insert(index, result).is_some() {
            warn!(tool_id, version, index, "duplicate test index, keeping the later entry");
        }
    }
    TestResults::from(results)
}

fn to_result(tool_id: &str, data: &RawTestData) -> Option<TestResult> {
    let Some(status) = data.status.as_deref() else {
        warn!(tool_id, "skipping test result without status");
        return None;
    };
    let execution_time = match data.create_time() {
        None => None,
        Some(raw) => match parse_create_time(raw) {
            Some(time) => Some(time),
            None => {
                warn!(tool_id, create_time = raw, "skipping test result with unparsable create_time");
                return None;
            }
        },
    };
    Some(TestResult::new(status, execution_time))
}

/// Parse a job `create_time`.
///
/// Galaxy writes naive ISO 8601 timestamps; offset-qualified RFC 3339 values
/// are accepted and normalised to UTC.
pub fn parse_create_time(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f"))
        .ok()
        .or_else(|| DateTime::parse_from_rfc3339(raw).ok().map(|t| t.naive_utc()))
}

/// Read the report(s) behind `source`.
///
/// A URL or a file yields one collection and any problem with it is an
/// error. A directory is walked for `.json` files that carry a `tests`
/// array; anything else found there is skipped.
pub fn result_collections(source: &str) -> Result<Vec<ResultCollection>> {
    if is_url(source) || !Path::new(source).is_dir() {
        let text = read_uri(source)?;
        let report = ExecutionReport::parse(&text)
            .with_context(|| format!("read test report {source}"))?;
        return Ok(vec![collection(source.to_string(), &report)]);
    }

    let mut collections = Vec::new();
    for path in walk_files(Path::new(source), |p| has_extension(p, &["json"])) {
        let uri = path.display().to_string();
        let text = match std::fs::read_to_string(&path) {
            Ok(text) => text,
            Err(err) => {
                warn!(path = %uri, error = %err, "skipping unreadable file");
                continue;
            }
        };
        let value: Value = match serde_json::from_str(&text) {
            Ok(value) => value,
            Err(err) => {
                warn!(path = %uri, error = %err, "skipping file that is not JSON");
                continue;
            }
        };
        match ExecutionReport::from_json(&value) {
            Ok(report) => collections.push(collection(uri, &report)),
            Err(err) => debug!(path = %uri, %err, "not a test report"),
        }
    }
    Ok(collections)
}

fn collection(uri: String, report: &ExecutionReport) -> ResultCollection {
    ResultCollection {
        uri,
        results: report.result_sets(),
    }
}

/// Ingests every report found at a path, URL, or directory.
#[derive(Clone, Debug)]
pub struct ReportIngestor {
    pub source: String,
}

impl ReportIngestor {
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
        }
    }
}

impl ResultIngestor for ReportIngestor {
    fn ingest(&self) -> Result<Vec<ResultCollection>> {
        result_collections(&self.source)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gxtdb_testkit::{BWA_MEM, report, report_entry, ts, write_file};
    use serde_json::json;
    use tempfile::TempDir;

    const T0: &str = "2021-06-29T04:29:32.110891";

    #[test]
    fn missing_tests_is_fatal() {
        assert_eq!(
            ExecutionReport::from_json(&json!({"results": {}})),
            Err(ReportError::MissingTests)
        );
        assert_eq!(
            ExecutionReport::from_json(&json!([1, 2])),
            Err(ReportError::NotAnObject)
        );
    }

    #[test]
    fn skips_entries_without_data_or_tool_id() {
        let value = json!({"tests": [
            {"has_data": false, "data": {"tool_id": "cat1", "tool_version": "1.0", "status": "success"}},
            {"has_data": true},
            {"has_data": true, "data": {"tool_version": "1.0", "status": "success"}},
            {"has_data": true, "data": {"tool_id": 7}},
            "not an object",
            {"has_data": true, "data": {"tool_id": "cat1", "tool_version": "1.0", "status": "failed"}},
        ]});
        let report = ExecutionReport::from_json(&value).unwrap();
        assert_eq!(report.tool_ids().collect::<Vec<_>>(), vec!["cat1"]);
        assert_eq!(report.results_for_tool_id("cat1").unwrap().len(), 1);
    }

    #[test]
    fn lookup_falls_back_to_versionless_id() {
        let value = report(vec![report_entry(BWA_MEM, "0.7.17.2", "success", None, None)]);
        let report = ExecutionReport::from_json(&value).unwrap();
        let versioned = format!("{BWA_MEM}/0.7.17.2");
        assert!(report.results_for_tool_id(&versioned).is_some());
        assert!(report.results_for_tool_id("other").is_none());
    }

    #[test]
    fn result_sets_group_by_versionless_id_and_version() {
        let versioned = format!("{BWA_MEM}/0.7.17.2");
        let value = report(vec![
            report_entry(&versioned, "0.7.17.2", "success", Some(0), Some(T0)),
            report_entry(&versioned, "0.7.17.2", "failed", Some(1), None),
            report_entry("cat1", "1.0.0", "success", None, None),
            report_entry("cat1", "1.0.0", "error", None, None),
            report_entry("cat1", "1.0.1", "success", None, None),
        ]);
        let sets = ExecutionReport::from_json(&value).unwrap().result_sets();
        assert_eq!(sets.len(), 3);

        let bwa = sets.iter().find(|s| s.tool_id == BWA_MEM).unwrap();
        assert_eq!(bwa.version, "0.7.17.2");
        assert_eq!(bwa.results.get(0).unwrap().execution_time, Some(ts(T0)));
        assert_eq!(bwa.results.get(1).unwrap().execution_time, None);

        let cat = sets
            .iter()
            .find(|s| s.tool_id == "cat1" && s.version == "1.0.0")
            .unwrap();
        assert_eq!(cat.results.indices().collect::<Vec<_>>(), vec![0, 1]);
        assert_eq!(cat.results.get(1).unwrap().status, "error");

        let cat_next = sets
            .iter()
            .find(|s| s.tool_id == "cat1" && s.version == "1.0.1")
            .unwrap();
        assert_eq!(cat_next.results.indices().collect::<Vec<_>>(), vec![0]);
    }

    #[test]
    fn positional_indices_skip_explicit_ones() {
        let value = report(vec![
            report_entry("cat1", "1.0", "success", Some(1), None),
            report_entry("cat1", "1.0", "failed", None, None),
            report_entry("cat1", "1.0", "error", None, None),
        ]);
        let sets = ExecutionReport::from_json(&value).unwrap().result_sets();
        let results = &sets[0].results;
        assert_eq!(results.indices().collect::<Vec<_>>(), vec![0, 1, 2]);
        assert_eq!(results.get(0).unwrap().status, "failed");
        assert_eq!(results.get(1).unwrap().status, "success");
        assert_eq!(results.get(2).unwrap().status, "error");
    }

    #[test]
    fn duplicate_index_keeps_later_entry() {
        let value = report(vec![
            report_entry("cat1", "1.0", "failed", Some(0), None),
            report_entry("cat1", "1.0", "success", Some(0), Some(T0)),
        ]);
        let sets = ExecutionReport::from_json(&value).unwrap().result_sets();
        assert_eq!(sets[0].results.len(), 1);
        assert_eq!(sets[0].results.get(0).unwrap().status, "success");
    }

    #[test]
    fn versioned_ids_share_one_index_space() {
        let value = report(vec![
            report_entry(&format!("{BWA_MEM}/0.7.17.2"), "0.7.17.2", "success", None, None),
            report_entry(BWA_MEM, "0.7.17.2", "failed", None, None),
        ]);
        let sets = ExecutionReport::from_json(&value).unwrap().result_sets();
        assert_eq!(sets.len(), 1);
        assert_eq!(sets[0].results.len(), 2);
    }

    #[test]
    fn unparsable_create_time_skips_entry() {
        let value = report(vec![
            report_entry("cat1", "1.0.0", "success", Some(0), Some("yesterday")),
            report_entry("cat1", "1.0.0", "success", Some(1), Some(T0)),
        ]);
        let sets = ExecutionReport::from_json(&value).unwrap().result_sets();
        assert_eq!(sets[0].results.indices().collect::<Vec<_>>(), vec![1]);
    }

    #[test]
    fn create_time_formats() {
        assert_eq!(parse_create_time(T0), Some(ts(T0)));
        assert_eq!(
            parse_create_time("2021-06-29T04:29:32"),
            Some(ts("2021-06-29T04:29:32"))
        );
        assert_eq!(
            parse_create_time("2021-06-29T06:29:32+02:00"),
            Some(ts("2021-06-29T04:29:32"))
        );
        assert_eq!(parse_create_time("2021-06-29"), None);
    }

    #[test]
    fn single_file_collection() {
        let dir = TempDir::new().unwrap();
        let value = report(vec![report_entry("cat1", "1.0.0", "success", None, None)]);
        let path = write_file(dir.path(), "run.json", &value.to_string());

        let collections = result_collections(path.to_str().unwrap()).unwrap();
        assert_eq!(collections.len(), 1);
        assert_eq!(collections[0].results.len(), 1);
    }

    #[test]
    fn single_file_without_tests_is_an_error() {
        let dir = TempDir::new().unwrap();
        let path = write_file(dir.path(), "run.json", r#"{"other": 1}"#);
        let err = result_collections(path.to_str().unwrap()).unwrap_err();
        assert!(format!("{err:#}").contains("tests"));
    }

    #[test]
    fn directory_walk_keeps_only_reports() {
        let dir = TempDir::new().unwrap();
        let value = report(vec![report_entry("cat1", "1.0.0", "success", None, None)]);
        write_file(dir.path(), "a/run1.json", &value.to_string());
        write_file(dir.path(), "b/run2.json", &value.to_string());
        write_file(dir.path(), "b/package.json", r#"{"name": "x"}"#);
        write_file(dir.path(), "b/broken.json", "{");
        write_file(dir.path(), ".cache/run3.json", &value.to_string());
        write_file(dir.path(), "notes.txt", "tests");

        let ingestor = ReportIngestor::new(dir.path().to_str().unwrap());
        let collections = ingestor.ingest().unwrap();
        assert_eq!(collections.len(), 2);
        assert!(collections.iter().all(|c| c.uri.ends_with(".json")));
    }
}
