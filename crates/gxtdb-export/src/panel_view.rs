//! Galaxy panel view definitions built on a server's panel skeleton.

use anyhow::{Result, anyhow};
use gxtdb_schema::panel::PanelSkeletonItem;
use gxtdb_store::{FilterCriteria, MetadataStore};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;

/// Parameters of one exported panel view.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PanelViewDefinition {
    pub id: String,
    pub view_type: String,
    /// Display name; the id when unset.
    pub name: Option<String>,
    pub description: Option<String>,
    pub require_labels: Vec<String>,
    pub exclude_labels: Vec<String>,
    pub output: Option<PathBuf>,
}

impl PanelViewDefinition {
    pub fn new(id: impl Into<String>, view_type: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            view_type: view_type.into(),
            name: None,
            description: None,
            require_labels: Vec::new(),
            exclude_labels: Vec::new(),
            output: None,
        }
    }

    /// `<id>.yml` unless an output was given.
    pub fn effective_output(&self) -> PathBuf {
        self.output
            .clone()
            .unwrap_or_else(|| PathBuf::from(format!("{}.yml", self.id)))
    }

    fn criteria(&self) -> FilterCriteria {
        FilterCriteria::new()
            .with_required_labels(self.require_labels.iter().cloned())
            .with_excluded_labels(self.exclude_labels.iter().cloned())
    }
}

#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
pub struct PanelView {
    pub id: String,
    #[serde(rename = "type")]
    pub view_type: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub items: Vec<PanelViewItem>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub excludes: Option<Vec<ExcludedTool>>,
}

#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum PanelViewItem {
    Label {
        id: String,
        text: String,
    },
    Section {
        id: String,
        name: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        items: Option<Vec<SectionItem>>,
    },
}

#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum SectionItem {
    Tool { id: String },
}

#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
pub struct ExcludedTool {
    pub tool_id: String,
}

/// Build the view for `server` from its recorded panel skeleton.
///
/// Sections without a matching tool on that server are dropped. Sections
/// list their tools explicitly only when labels are required; otherwise the
/// view relies on `excludes`, which names tools absent from the server that
/// carry an excluded label.
pub fn panel_view(
    store: &MetadataStore,
    server: &str,
    definition: &PanelViewDefinition,
) -> Result<PanelView> {
    let skeleton = store
        .panel_skeleton(server)
        .ok_or_else(|| anyhow!("No panel skeleton bootstrapped for {server}"))?;

    let criteria = definition.criteria();
    let sections = sections_tools(store, server, &criteria);
    let mut items = Vec::new();
    for entry in skeleton {
        match entry {
            PanelSkeletonItem::ToolSectionLabel { id, text } => items.push(PanelViewItem::Label {
                id: id.clone(),
                text: text.clone(),
            }),
            PanelSkeletonItem::ToolSection { id, name } => {
                let Some(tools) = sections.get(id.as_str()).filter(|t| !t.is_empty()) else {
                    continue;
                };
                let section_items = (!definition.require_labels.is_empty()).then(|| {
                    tools
                        .iter()
                        .map(|tool_id| SectionItem::Tool {
                            id: tool_id.to_string(),
                        })
                        .collect()
                });
                items.push(PanelViewItem::Section {
                    id: id.clone(),
                    name: name.clone(),
                    items: section_items,
                });
            }
        }
    }

    let excludes = (!definition.exclude_labels.is_empty()).then(|| {
        let everything = FilterCriteria::new();
        store
            .entries(&everything)
            .filter(|(_, tool)| !tool.servers.contains_key(server))
            .filter(|(_, tool)| definition.exclude_labels.iter().any(|l| tool.has_label(l)))
            .map(|(tool_id, _)| ExcludedTool {
                tool_id: tool_id.to_string(),
            })
            .collect()
    });

    Ok(PanelView {
        id: definition.id.clone(),
        view_type: definition.view_type.clone(),
        name: definition
            .name
            .clone()
            .unwrap_or_else(|| definition.id.clone()),
        description: definition.description.clone().filter(|d| !d.is_empty()),
        items,
        excludes,
    })
}

/// Section id to the ids of matching tools placed in it on `server`.
pub fn sections_tools<'a>(
    store: &'a MetadataStore,
    server: &str,
    criteria: &FilterCriteria,
) -> BTreeMap<&'a str, BTreeSet<&'a str>> {
    let mut sections: BTreeMap<&str, BTreeSet<&str>> = BTreeMap::new();
    for (tool_id, tool) in store.entries(criteria) {
        let Some(on_server) = tool.servers.get(server) else {
            continue;
        };
        for section_id in on_server.sections.keys() {
            sections.entry(section_id.as_str()).or_default().insert(tool_id);
        }
    }
    sections
}

#[cfg(test)]
mod tests {
    use super::*;
    use gxtdb_testkit::{BWA_MEM, CAT, sample_database};

    fn store() -> MetadataStore {
        let mut db = sample_database();
        db.tools.get_mut(BWA_MEM).unwrap().set_label("covid19", true);
        db.tools.get_mut(CAT).unwrap().set_label("deprecated", true);
        MetadataStore::from_database("db.yml", db)
    }

    #[test]
    fn missing_skeleton_is_an_error() {
        let definition = PanelViewDefinition::new("covid", "generic");
        let err = panel_view(&store(), "eu", &definition).unwrap_err();
        assert!(err.to_string().contains("No panel skeleton bootstrapped for eu"));
    }

    #[test]
    fn unfiltered_view_keeps_labels_and_populated_sections() {
        let definition = PanelViewDefinition::new("everything", "generic");
        let view = panel_view(&store(), "main", &definition).unwrap();
        assert_eq!(view.name, "everything");
        assert!(view.excludes.is_none());
        assert_eq!(
            view.items,
            vec![
                PanelViewItem::Label {
                    id: "ngs_label".into(),
                    text: "NGS".into()
                },
                PanelViewItem::Section {
                    id: "mapping".into(),
                    name: "Mapping".into(),
                    items: None
                },
            ]
        );
    }

    #[test]
    fn required_labels_list_tools() {
        let definition = PanelViewDefinition {
            require_labels: vec!["covid19".into()],
            description: Some("COVID-19 analysis".into()),
            ..PanelViewDefinition::new("covid", "activity")
        };
        let view = panel_view(&store(), "main", &definition).unwrap();
        assert_eq!(
            view.items[1],
            PanelViewItem::Section {
                id: "mapping".into(),
                name: "Mapping".into(),
                items: Some(vec![SectionItem::Tool { id: BWA_MEM.into() }]),
            }
        );

        let yaml = serde_yaml::to_string(&view).unwrap();
        assert!(yaml.contains("type: activity"));
        assert!(yaml.contains("description: COVID-19 analysis"));
        assert!(yaml.contains("type: tool"));
        assert!(yaml.contains("type: label"));
    }

    #[test]
    fn section_map_outlives_criteria() {
        let store = store();
        let sections = {
            let criteria = FilterCriteria::new().with_required_labels(["covid19".to_string()]);
            sections_tools(&store, "main", &criteria)
        };
        assert_eq!(sections["mapping"], BTreeSet::from([BWA_MEM]));
        assert_eq!(sections.len(), 1);
    }

    #[test]
    fn excluded_labels_list_off_server_tools() {
        let definition = PanelViewDefinition {
            exclude_labels: vec!["deprecated".into()],
            ..PanelViewDefinition::new("clean", "generic")
        };
        let view = panel_view(&store(), "main", &definition).unwrap();
        assert_eq!(
            view.excludes,
            Some(vec![ExcludedTool {
                tool_id: CAT.into()
            }])
        );
    }

    #[test]
    fn output_defaults_to_id() {
        let definition = PanelViewDefinition::new("covid", "generic");
        assert_eq!(definition.effective_output(), PathBuf::from("covid.yml"));
    }
}
