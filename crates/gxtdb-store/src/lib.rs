//! The tool metadata database file.
//!
//! [`MetadataStore`] owns one [`ToolDatabase`] and the path it came from.
//! Commands open the store, apply mutations, and call [`MetadataStore::write`]
//! once at the end. Writes go to a temporary file next to the target and are
//! renamed into place, so a failed serialization never truncates the database.

use anyhow::{Context, Result, bail};
use gxtdb_merge::{MergeStrategy, merge};
use gxtdb_schema::ids::versionless_tool_id;
use gxtdb_schema::panel::PanelSkeleton;
use gxtdb_schema::results::TestResults;
use gxtdb_schema::tool::{DATABASE_VERSION, ToolDatabase, ToolMetadata, Training};
use std::collections::BTreeSet;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

mod bootstrap;
pub mod filter;

pub use bootstrap::{BootstrapSummary, skeleton_from_panel};
pub use filter::FilterCriteria;

#[derive(Debug)]
pub struct MetadataStore {
    path: PathBuf,
    db: ToolDatabase,
}

impl MetadataStore {
    /// Load the database at `path`. A missing file yields an empty database.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let db = if path.exists() {
            let text = std::fs::read_to_string(&path)
                .with_context(|| format!("read tool metadata from {path:?}"))?;
            if text.trim().is_empty() {
                ToolDatabase::default()
            } else {
                serde_yaml::from_str(&text)
                    .with_context(|| format!("parse tool metadata yaml {path:?}"))?
            }
        } else {
            debug!(path = %path.display(), "no database yet, starting empty");
            ToolDatabase::default()
        };
        let store = Self { path, db };
        store.validate()?;
        Ok(store)
    }

    pub fn from_database(path: impl Into<PathBuf>, db: ToolDatabase) -> Self {
        Self {
            path: path.into(),
            db,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn database(&self) -> &ToolDatabase {
        &self.db
    }

    pub fn into_database(self) -> ToolDatabase {
        self.db
    }

    pub fn validate(&self) -> Result<()> {
        if self.db.version != DATABASE_VERSION {
            bail!(
                "unsupported tool metadata version {:?} in {:?} (expected {DATABASE_VERSION:?})",
                self.db.version,
                self.path
            );
        }
        Ok(())
    }

    /// Validate and atomically replace the database file.
    pub fn write(&self) -> Result<()> {
        self.validate()?;
        let yaml = serde_yaml::to_string(&self.db).context("serialize tool metadata")?;

        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        std::fs::create_dir_all(&dir).with_context(|| format!("create directory {dir:?}"))?;

        let mut tmp = tempfile::NamedTempFile::new_in(&dir)
            .with_context(|| format!("create temporary file in {dir:?}"))?;
        tmp.write_all(yaml.as_bytes())
            .with_context(|| format!("write temporary file for {:?}", self.path))?;
        // The temporary file is created owner-only; keep the database's mode.
        if let Ok(existing) = std::fs::metadata(&self.path) {
            tmp.as_file()
                .set_permissions(existing.permissions())
                .with_context(|| format!("copy permissions of {:?}", self.path))?;
        }
        tmp.persist(&self.path)
            .with_context(|| format!("replace tool metadata at {:?}", self.path))?;

        info!(path = %self.path.display(), tools = self.db.tools.len(), "wrote tool metadata");
        Ok(())
    }

    pub fn tool(&self, tool_id: &str) -> Option<&ToolMetadata> {
        self.db.tools.get(tool_id)
    }

    pub fn contains_tool(&self, tool_id: &str) -> bool {
        self.db.tools.contains_key(tool_id)
    }

    /// Every server label attached to a tool or one of its versions.
    pub fn known_servers(&self) -> BTreeSet<String> {
        let mut servers = BTreeSet::new();
        for tool in self.db.tools.values() {
            servers.extend(tool.servers.keys().cloned());
            for version in tool.versions.values() {
                servers.extend(version.servers.keys().cloned());
            }
        }
        servers
    }

    /// Every test target holding results.
    pub fn test_keys(&self) -> BTreeSet<String> {
        self.db
            .tools
            .values()
            .flat_map(|tool| tool.versions.values())
            .flat_map(|version| version.test_results.keys().cloned())
            .collect()
    }

    /// Every curator label in use.
    pub fn known_labels(&self) -> BTreeSet<String> {
        self.db
            .tools
            .values()
            .flat_map(|tool| tool.external_labels.iter().cloned())
            .collect()
    }

    /// Tool entries matching `criteria`, ordered by tool id.
    pub fn entries<'a, 'c>(
        &'a self,
        criteria: &'c FilterCriteria,
    ) -> impl Iterator<Item = (&'a str, &'a ToolMetadata)> + use<'a, 'c> {
        self.db
            .tools
            .iter()
            .filter(move |(_, tool)| criteria.matches(tool))
            .map(|(id, tool)| (id.as_str(), tool))
    }

    pub fn tool_ids_with_label(&self, label: &str) -> Vec<&str> {
        self.db
            .tools
            .iter()
            .filter(|(_, tool)| tool.has_label(label))
            .map(|(id, _)| id.as_str())
            .collect()
    }

    pub fn panel_skeleton(&self, server: &str) -> Option<&PanelSkeleton> {
        self.db.integrated_panels.get(server)
    }

    /// The entry for an already-normalized `tool_id`, created if absent.
    pub fn entry_for(&mut self, tool_id: &str) -> &mut ToolMetadata {
        self.db.tools.entry(tool_id.to_string()).or_default()
    }

    /// The entry for an id as a server or workflow reports it. Tool-shed ids
    /// are keyed without their trailing version segment.
    pub fn entry_for_raw_id(&mut self, raw_tool_id: &str) -> &mut ToolMetadata {
        self.entry_for(versionless_tool_id(raw_tool_id))
    }

    pub fn record_panel_skeleton(&mut self, server: &str, skeleton: PanelSkeleton) {
        self.db
            .integrated_panels
            .insert(server.to_string(), skeleton);
    }

    /// Apply or remove a label, creating the entry when needed.
    pub fn set_label(&mut self, tool_id: &str, label: &str, present: bool) -> bool {
        self.entry_for(tool_id).set_label(label, present)
    }

    /// Apply a label only when the tool is already known.
    pub fn label_existing(&mut self, tool_id: &str, label: &str) -> bool {
        match self.db.tools.get_mut(tool_id) {
            Some(tool) => tool.set_label(label, true),
            None => false,
        }
    }

    /// Remove `label` from every tool. Returns how many tools carried it.
    pub fn clear_label(&mut self, label: &str) -> usize {
        let cleared = self
            .db
            .tools
            .values_mut()
            .map(|tool| tool.set_label(label, false))
            .filter(|removed| *removed)
            .count();
        info!(label, cleared, "cleared label");
        cleared
    }

    /// Drop every result set recorded against `target`. Returns how many
    /// tool versions lost results.
    pub fn clear_test_results(&mut self, target: &str) -> usize {
        let cleared = self
            .db
            .tools
            .values_mut()
            .flat_map(|tool| tool.versions.values_mut())
            .filter_map(|version| version.test_results.remove(target))
            .count();
        info!(test_target = target, cleared, "cleared test results");
        cleared
    }

    /// Store `incoming` for one tool version and target, merging with any
    /// results already recorded there.
    pub fn record_test_results(
        &mut self,
        tool_id: &str,
        version: &str,
        target: &str,
        incoming: &TestResults,
        strategy: MergeStrategy,
    ) {
        let entry = self.entry_for(tool_id).version_mut(version);
        let merged = match entry.test_results.get(target) {
            Some(existing) if !existing.is_empty() => {
                let merged = merge(existing, incoming, strategy);
                debug!(
                    tool_id,
                    version,
                    test_target = target,
                    %strategy,
                    existing = existing.len(),
                    incoming = incoming.len(),
                    merged = merged.len(),
                    "merged test results"
                );
                merged
            }
            _ => {
                debug!(tool_id, version, test_target = target, count = incoming.len(), "recorded test results");
                incoming.clone()
            }
        };
        entry.test_results.insert(target.to_string(), merged);
    }

    pub fn record_training(&mut self, tool_id: &str, version: &str, training: Training) -> bool {
        self.entry_for(tool_id)
            .version_mut(version)
            .add_training(training)
    }
}
