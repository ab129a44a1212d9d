use crate::MetadataStore;
use gxtdb_schema::galaxy::ApiPanelElement;
use gxtdb_schema::panel::{PanelSkeleton, PanelSkeletonItem};
use gxtdb_schema::tool::SectionRef;
use tracing::{info, warn};

/// Counts reported after recording one server's listing.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BootstrapSummary {
    pub tools: usize,
    pub sections: usize,
    pub skeleton_items: usize,
}

impl MetadataStore {
    /// Record a server's flat tool listing and panel under `server`.
    ///
    /// `tools` is the `in_panel=false` listing, `panel` the `in_panel=true`
    /// one. The server's panel skeleton is replaced; everything else is
    /// merged into existing entries.
    pub fn bootstrap_server(
        &mut self,
        server: &str,
        tools: &[ApiPanelElement],
        panel: &[ApiPanelElement],
    ) -> BootstrapSummary {
        let mut summary = BootstrapSummary::default();

        for tool in tools.iter().filter(|t| t.is_tool()) {
            if self.record_server_tool(server, tool) {
                summary.tools += 1;
            }
        }

        for section in panel.iter().filter(|e| e.is_section()) {
            let name = section.name.clone().unwrap_or_default();
            for elem in section.children().iter().filter(|e| e.model_class == "Tool") {
                self.record_section(server, &elem.id, &section.id, &name);
                summary.sections += 1;
            }
        }

        let skeleton = skeleton_from_panel(panel);
        summary.skeleton_items = skeleton.len();
        self.record_panel_skeleton(server, skeleton);

        info!(
            server,
            tools = summary.tools,
            placements = summary.sections,
            skeleton = summary.skeleton_items,
            "bootstrapped server"
        );
        summary
    }

    /// Record one tool from a server's listing. Returns false when the
    /// element carries no version.
    pub fn record_server_tool(&mut self, server: &str, tool: &ApiPanelElement) -> bool {
        let Some(version) = tool.version.as_deref().filter(|v| !v.is_empty()) else {
            warn!(server, tool_id = %tool.id, "tool listed without a version, skipping");
            return false;
        };

        let entry = self.entry_for_raw_id(&tool.id);
        {
            let server_meta = entry.server_mut(server);
            if !server_meta.versions.iter().any(|v| v == version) {
                server_meta.versions.push(version.to_string());
            }
        }
        if let Some(repo) = &tool.tool_shed_repository {
            entry.tool_shed_repository = Some(repo.clone().into());
        }

        let version_meta = entry.version_mut(version);
        version_meta
            .servers
            .entry(server.to_string())
            .or_default()
            .labels = tool.labels.clone().unwrap_or_default();

        if let Some(name) = &tool.name {
            version_meta.name = Some(name.clone());
        }
        if let Some(description) = tool.description.as_ref().filter(|d| !d.is_empty()) {
            version_meta.description = Some(description.clone());
        }
        if let Some(xrefs) = tool.xrefs.as_ref().filter(|x| !x.is_empty()) {
            version_meta.xrefs = xrefs.clone();
        }
        if let Some(ops) = tool.edam_operations.as_ref().filter(|x| !x.is_empty()) {
            version_meta.edam_operations = ops.clone();
        }
        if let Some(topics) = tool.edam_topics.as_ref().filter(|x| !x.is_empty()) {
            version_meta.edam_topics = topics.clone();
        }
        if !tool.model_class.is_empty() {
            version_meta.model_class = Some(tool.model_class.clone());
        }
        true
    }

    /// Note that the tool with `raw_tool_id` sits in section `section_id`
    /// on `server`.
    pub fn record_section(&mut self, server: &str, raw_tool_id: &str, section_id: &str, name: &str) {
        self.entry_for_raw_id(raw_tool_id).server_mut(server).sections.insert(
            section_id.to_string(),
            SectionRef {
                name: name.to_string(),
            },
        );
    }
}

/// Labels and sections of a panel listing, in panel order.
pub fn skeleton_from_panel(panel: &[ApiPanelElement]) -> PanelSkeleton {
    panel
        .iter()
        .filter_map(|entry| {
            if entry.is_label() {
                Some(PanelSkeletonItem::ToolSectionLabel {
                    id: entry.id.clone(),
                    text: entry.text.clone().unwrap_or_default(),
                })
            } else if entry.is_section() {
                Some(PanelSkeletonItem::ToolSection {
                    id: entry.id.clone(),
                    name: entry.name.clone().unwrap_or_default(),
                })
            } else {
                None
            }
        })
        .collect()
}
