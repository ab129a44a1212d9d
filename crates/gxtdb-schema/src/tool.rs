use crate::panel::PanelSkeleton;
use crate::results::TestResults;
use gxtdb_version::{latest_version, version_sorted};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Schema version written to and required from the database file.
pub const DATABASE_VERSION: &str = "1.0";

/// The tool shed install manifests are generated for.
pub const MAIN_TOOL_SHED: &str = "toolshed.g2.bx.psu.edu";

/// The whole persisted database.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ToolDatabase {
    pub version: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub tools: BTreeMap<String, ToolMetadata>,
    /// Server label to that server's panel layout.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub integrated_panels: BTreeMap<String, PanelSkeleton>,
}

impl Default for ToolDatabase {
    fn default() -> Self {
        Self {
            version: DATABASE_VERSION.to_string(),
            tools: BTreeMap::new(),
            integrated_panels: BTreeMap::new(),
        }
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct SectionRef {
    pub name: String,
}

/// What one server reports about a tool.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ServerToolMetadata {
    /// Panel section id to section name.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub sections: BTreeMap<String, SectionRef>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub versions: Vec<String>,
}

impl ServerToolMetadata {
    pub fn latest_version(&self) -> Option<String> {
        latest_version(&self.versions)
    }

    pub fn first_section(&self) -> Option<&SectionRef> {
        self.sections.values().next()
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ToolShedRepository {
    pub name: String,
    pub owner: String,
    pub tool_shed: String,
}

/// Labels a server attaches to one installed version.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ServerVersionMetadata {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub labels: Vec<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Training {
    pub topic: String,
    pub tutorial: String,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Xref {
    #[serde(default)]
    pub value: String,
    #[serde(default)]
    pub reftype: String,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct ToolVersionMetadata {
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub servers: BTreeMap<String, ServerVersionMetadata>,
    /// Test target to the results recorded against it.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub test_results: BTreeMap<String, TestResults>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub trainings: Vec<Training>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub xrefs: Vec<Xref>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub edam_operations: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub edam_topics: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_class: Option<String>,
}

impl ToolVersionMetadata {
    /// Record a training, ignoring exact duplicates.
    pub fn add_training(&mut self, training: Training) -> bool {
        if self.trainings.contains(&training) {
            return false;
        }
        self.trainings.push(training);
        true
    }
}

/// Everything known about one tool id.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct ToolMetadata {
    /// Server label to what that server reports.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub servers: BTreeMap<String, ServerToolMetadata>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub versions: BTreeMap<String, ToolVersionMetadata>,
    /// Curator labels applied from spreadsheets and workflow lists.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub external_labels: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_shed_repository: Option<ToolShedRepository>,
}

/// The newest version of a tool that has results for a given target.
#[derive(Clone, Copy, Debug)]
pub struct LatestTestResults<'a> {
    pub version: &'a str,
    pub results: &'a TestResults,
}

impl ToolMetadata {
    pub fn latest_version(&self) -> Option<String> {
        latest_version(self.versions.keys())
    }

    /// Version entries, newest first.
    pub fn versions_newest_first(&self) -> Vec<(&str, &ToolVersionMetadata)> {
        version_sorted(self.versions.keys())
            .into_iter()
            .filter_map(|v| self.versions.get_key_value(&v))
            .map(|(k, meta)| (k.as_str(), meta))
            .collect()
    }

    pub fn version_mut(&mut self, version: &str) -> &mut ToolVersionMetadata {
        self.versions.entry(version.to_string()).or_default()
    }

    pub fn server_mut(&mut self, server: &str) -> &mut ServerToolMetadata {
        self.servers.entry(server.to_string()).or_default()
    }

    pub fn has_label(&self, label: &str) -> bool {
        self.external_labels.iter().any(|l| l == label)
    }

    /// Apply or remove a curator label. Returns whether anything changed.
    pub fn set_label(&mut self, label: &str, present: bool) -> bool {
        if present {
            if self.has_label(label) {
                return false;
            }
            self.external_labels.push(label.to_string());
            true
        } else {
            let before = self.external_labels.len();
            self.external_labels.retain(|l| l != label);
            before != self.external_labels.len()
        }
    }

    /// Per test target, the newest version holding results for it.
    pub fn latest_test_results(&self) -> BTreeMap<&str, LatestTestResults<'_>> {
        let mut latest = BTreeMap::new();
        for (version, meta) in self.versions_newest_first() {
            for (target, results) in &meta.test_results {
                latest
                    .entry(target.as_str())
                    .or_insert(LatestTestResults { version, results });
            }
        }
        latest
    }

    pub fn name(&self) -> Option<&str> {
        self.newest_with(|v| v.name.as_deref())
    }

    pub fn description(&self) -> Option<&str> {
        self.newest_with(|v| v.description.as_deref())
    }

    pub fn model_class(&self) -> Option<&str> {
        self.newest_with(|v| v.model_class.as_deref())
    }

    fn newest_with<'a>(
        &'a self,
        field: impl Fn(&'a ToolVersionMetadata) -> Option<&'a str>,
    ) -> Option<&'a str> {
        self.versions_newest_first()
            .into_iter()
            .filter_map(|(_, meta)| field(meta))
            .find(|value| !value.is_empty())
    }

    /// Trainings across every version, deduplicated and sorted.
    pub fn trainings(&self) -> BTreeSet<&Training> {
        self.versions
            .values()
            .flat_map(|v| v.trainings.iter())
            .collect()
    }

    pub fn training_topics(&self) -> BTreeSet<&str> {
        self.trainings()
            .into_iter()
            .map(|t| t.topic.as_str())
            .collect()
    }

    pub fn training_tutorials(&self) -> BTreeSet<&str> {
        self.trainings()
            .into_iter()
            .map(|t| t.tutorial.as_str())
            .collect()
    }

    pub fn is_on_main_shed(&self) -> bool {
        self.tool_shed_repository
            .as_ref()
            .is_some_and(|repo| repo.tool_shed == MAIN_TOOL_SHED)
    }
}
