//! Tool install manifests (`tools.yaml`) for Ephemeris and ansible-galaxy-tools.

use gxtdb_schema::tool::{ServerToolMetadata, ToolMetadata};
use gxtdb_store::{FilterCriteria, MetadataStore};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use tracing::warn;

#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct InstallManifest {
    pub tools: Vec<InstallEntry>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct InstallEntry {
    pub owner: String,
    pub name: String,
    pub tool_panel_section_label: String,
}

/// One entry per main-shed repository matching `labels`.
///
/// The section label comes from the first server holding a section for one
/// of the repository's tools. When `servers` is non-empty only those servers
/// are consulted, in the given order.
pub fn install_manifest(
    store: &MetadataStore,
    servers: &[String],
    labels: &FilterCriteria,
) -> InstallManifest {
    let criteria = FilterCriteria {
        require_labels: labels.require_labels.clone(),
        exclude_labels: labels.exclude_labels.clone(),
        ..FilterCriteria::installable()
    };

    let mut seen = BTreeSet::new();
    let mut manifest = InstallManifest::default();
    for (_, tool) in store.entries(&criteria) {
        let Some(repo) = &tool.tool_shed_repository else {
            continue;
        };
        let key = (repo.owner.as_str(), repo.name.as_str());
        if seen.contains(&key) {
            continue;
        }

        let Some(section) = candidate_servers(tool, servers)
            .into_iter()
            .find_map(|server| server.first_section())
        else {
            warn!(
                owner = %repo.owner,
                name = %repo.name,
                "no section label found, skipping install entry"
            );
            continue;
        };

        manifest.tools.push(InstallEntry {
            owner: repo.owner.clone(),
            name: repo.name.clone(),
            tool_panel_section_label: section.name.clone(),
        });
        seen.insert(key);
    }
    manifest
}

fn candidate_servers<'a>(tool: &'a ToolMetadata, servers: &[String]) -> Vec<&'a ServerToolMetadata> {
    if servers.is_empty() {
        tool.servers.values().collect()
    } else {
        servers
            .iter()
            .filter_map(|label| tool.servers.get(label))
            .collect()
    }
}
