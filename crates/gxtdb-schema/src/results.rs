use chrono::NaiveDateTime;
use serde::de::{self, Unexpected, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;

/// Status literal that marks a successful test execution.
pub const STATUS_SUCCESS: &str = "success";

/// How a status string counts towards pass/fail totals.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Outcome {
    Passed,
    Failed,
    /// Anything other than `success`, `failed` or `error`.
    Unrecognized,
}

/// Outcome of a single test execution.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct TestResult {
    pub status: String,
    /// When the job backing this test was created. Absent when the report
    /// carried no job metadata.
    #[serde(
        rename = "job_create_time",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub execution_time: Option<NaiveDateTime>,
}

impl TestResult {
    pub fn new(status: impl Into<String>, execution_time: Option<NaiveDateTime>) -> Self {
        Self {
            status: status.into(),
            execution_time,
        }
    }

    pub fn is_successful(&self) -> bool {
        self.status == STATUS_SUCCESS
    }

    pub fn outcome(&self) -> Outcome {
        match self.status.as_str() {
            STATUS_SUCCESS => Outcome::Passed,
            "failed" | "error" => Outcome::Failed,
            _ => Outcome::Unrecognized,
        }
    }

    /// Pick the preferable of `self` and `other`.
    ///
    /// Success beats failure. Between equally successful results a timestamp
    /// beats none and the more recent timestamp wins. Anything left tied
    /// resolves to `other`.
    pub fn better_than<'a>(&'a self, other: &'a TestResult) -> &'a TestResult {
        if self.is_successful() != other.is_successful() {
            return if self.is_successful() { self } else { other };
        }
        match (self.execution_time, other.execution_time) {
            (Some(mine), Some(theirs)) if mine > theirs => self,
            (Some(_), None) => self,
            _ => other,
        }
    }
}

/// Test results for one (tool, version, target) slot, keyed by test index.
///
/// Iteration is in ascending index order. Persisted as a mapping from the
/// string-encoded index; integer keys are accepted on read too.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TestResults(BTreeMap<u32, TestResult>);

impl TestResults {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, index: u32) -> Option<&TestResult> {
        self.0.get(&index)
    }

    pub fn has_index(&self, index: u32) -> bool {
        self.0.contains_key(&index)
    }

    pub fn iter(&self) -> impl Iterator<Item = (u32, &TestResult)> {
        self.0.iter().map(|(index, result)| (*index, result))
    }

    pub fn indices(&self) -> impl Iterator<Item = u32> + '_ {
        self.0.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn total_count(&self) -> usize {
        self.0.len()
    }

    pub fn success_count(&self) -> usize {
        self.0.values().filter(|r| r.is_successful()).count()
    }

    pub fn failed_count(&self) -> usize {
        self.0
            .values()
            .filter(|r| r.outcome() == Outcome::Failed)
            .count()
    }

    pub fn timestamped_count(&self) -> usize {
        self.0
            .values()
            .filter(|r| r.execution_time.is_some())
            .count()
    }

    /// Timestamp of the first result (by index) that has one.
    ///
    /// This is not the maximum: a set whose lowest timestamped index is old
    /// reports that old time even if later indices ran more recently.
    pub fn recency_signal(&self) -> Option<NaiveDateTime> {
        self.0.values().find_map(|r| r.execution_time)
    }

    /// Sorted union of the indices present in `self` or `other`.
    pub fn union_of_indices(&self, other: &TestResults) -> Vec<u32> {
        let mut indices: Vec<u32> = self.0.keys().chain(other.0.keys()).copied().collect();
        indices.sort_unstable();
        indices.dedup();
        indices
    }
}

impl FromIterator<(u32, TestResult)> for TestResults {
    fn from_iter<T: IntoIterator<Item = (u32, TestResult)>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl From<BTreeMap<u32, TestResult>> for TestResults {
    fn from(map: BTreeMap<u32, TestResult>) -> Self {
        Self(map)
    }
}

impl Serialize for TestResults {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_map(self.0.iter().map(|(index, result)| (index.to_string(), result)))
    }
}

impl<'de> Deserialize<'de> for TestResults {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let keyed = BTreeMap::<IndexKey, TestResult>::deserialize(deserializer)?;
        Ok(keyed.into_iter().map(|(IndexKey(index), result)| (index, result)).collect())
    }
}

#[derive(PartialEq, Eq, PartialOrd, Ord)]
struct IndexKey(u32);

impl<'de> Deserialize<'de> for IndexKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(IndexKeyVisitor)
    }
}

struct IndexKeyVisitor;

impl Visitor<'_> for IndexKeyVisitor {
    type Value = IndexKey;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a test index as an integer or numeric string")
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<IndexKey, E> {
        u32::try_from(v)
            .map(IndexKey)
            .map_err(|_| E::invalid_value(Unexpected::Unsigned(v), &self))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<IndexKey, E> {
        u32::try_from(v)
            .map(IndexKey)
            .map_err(|_| E::invalid_value(Unexpected::Signed(v), &self))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<IndexKey, E> {
        v.trim()
            .parse()
            .map(IndexKey)
            .map_err(|_| E::invalid_value(Unexpected::Str(v), &self))
    }
}

impl IntoIterator for TestResults {
    type Item = (u32, TestResult);
    type IntoIter = std::collections::btree_map::IntoIter<u32, TestResult>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}
