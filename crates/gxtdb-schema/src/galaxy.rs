//! Shapes returned by a Galaxy server's `/api/tools` endpoint.
//!
//! Only the fields gxtdb reads are modelled. Galaxy sends `null` for many
//! optional lists, so those are `Option`s.

use crate::tool::{ToolShedRepository, Xref};
use serde::Deserialize;

/// A tool, section, or section label from the tool listing.
///
/// With `in_panel=false` the listing is a flat array of tools. With
/// `in_panel=true` it is the panel: labels, sections with their tools in
/// `elems`, and tools placed outside any section.
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct ApiPanelElement {
    pub model_class: String,
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub labels: Option<Vec<String>>,
    #[serde(default)]
    pub tool_shed_repository: Option<ApiToolShedRepository>,
    #[serde(default)]
    pub xrefs: Option<Vec<Xref>>,
    #[serde(default)]
    pub edam_operations: Option<Vec<String>>,
    #[serde(default)]
    pub edam_topics: Option<Vec<String>>,
    #[serde(default)]
    pub elems: Option<Vec<ApiPanelElement>>,
}

impl ApiPanelElement {
    /// `Tool`, `DataManagerTool` and friends.
    pub fn is_tool(&self) -> bool {
        self.model_class.ends_with("Tool")
    }

    pub fn is_section(&self) -> bool {
        self.model_class == "ToolSection"
    }

    pub fn is_label(&self) -> bool {
        self.model_class == "ToolSectionLabel"
    }

    pub fn children(&self) -> &[ApiPanelElement] {
        self.elems.as_deref().unwrap_or_default()
    }
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct ApiToolShedRepository {
    pub name: String,
    pub owner: String,
    pub tool_shed: String,
}

impl From<ApiToolShedRepository> for ToolShedRepository {
    fn from(repo: ApiToolShedRepository) -> Self {
        ToolShedRepository {
            name: repo.name,
            owner: repo.owner,
            tool_shed: repo.tool_shed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_tool_with_nulls() {
        let json = r#"{
            "model_class": "Tool",
            "id": "toolshed.g2.bx.psu.edu/repos/devteam/bwa/bwa_mem/0.7.17.2",
            "name": "Map with BWA-MEM",
            "version": "0.7.17.2",
            "description": null,
            "labels": null,
            "xrefs": [{"value": "bwa", "reftype": "bio.tools"}],
            "edam_operations": ["operation_3198"],
            "tool_shed_repository": {
                "name": "bwa",
                "owner": "devteam",
                "tool_shed": "toolshed.g2.bx.psu.edu",
                "changeset_revision": "abc"
            },
            "panel_section_id": "mapping"
        }"#;
        let tool: ApiPanelElement = serde_json::from_str(json).unwrap();
        assert!(tool.is_tool());
        assert_eq!(tool.labels, None);
        assert_eq!(tool.xrefs.as_ref().unwrap()[0].reftype, "bio.tools");
        assert_eq!(tool.tool_shed_repository.as_ref().unwrap().owner, "devteam");
        assert!(tool.children().is_empty());
    }

    #[test]
    fn parses_section_with_elems() {
        let json = r#"{
            "model_class": "ToolSection",
            "id": "getext",
            "name": "Get Data",
            "elems": [{"model_class": "Tool", "id": "upload1", "version": "1.1.7"}]
        }"#;
        let section: ApiPanelElement = serde_json::from_str(json).unwrap();
        assert!(section.is_section());
        assert_eq!(section.children().len(), 1);
        assert_eq!(section.children()[0].id, "upload1");
    }

    #[test]
    fn data_manager_tools_count_as_tools() {
        let json = r#"{"model_class": "DataManagerTool", "id": "dm"}"#;
        let tool: ApiPanelElement = serde_json::from_str(json).unwrap();
        assert!(tool.is_tool());
        assert!(!tool.is_label());
    }
}
