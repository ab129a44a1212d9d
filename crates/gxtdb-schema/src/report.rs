//! Wire shape of a test execution report entry.
//!
//! Reports are a JSON object with a `tests` array. Each entry is parsed on its
//! own so that one malformed entry does not take the file down with it.

use serde::Deserialize;

/// One entry of the `tests` array.
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
pub struct RawTestEntry {
    #[serde(default)]
    pub has_data: bool,
    #[serde(default)]
    pub data: Option<RawTestData>,
}

/// The payload of a report entry.
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
pub struct RawTestData {
    #[serde(default)]
    pub tool_id: Option<String>,
    #[serde(default)]
    pub tool_version: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub test_index: Option<u32>,
    #[serde(default)]
    pub job: Option<RawJob>,
}

impl RawTestData {
    pub fn create_time(&self) -> Option<&str> {
        self.job.as_ref().and_then(|job| job.create_time.as_deref())
    }
}

#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
pub struct RawJob {
    #[serde(default)]
    pub create_time: Option<String>,
}
