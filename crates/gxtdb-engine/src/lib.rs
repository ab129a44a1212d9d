//! Orchestration engine for gxtdb commands.
//!
//! Each command opens the metadata store, drives one adapter or exporter
//! against it, and writes the store back when it changed. This is the
//! coordination layer between the CLI and the microcrates.

use anyhow::{Context, Result, bail};
use gxtdb_export::{
    CoverageOptions, PanelViewDefinition, coverage_rows, coverage_versions_rows,
    install_manifest, panel_view,
};
use gxtdb_io::table::{Delimiter, Table, parse_rows};
use gxtdb_io::{read_uri, write_table};
use gxtdb_merge::MergeStrategy;
use gxtdb_ports::{ResultIngestor, ToolCatalog};
use gxtdb_schema::ids::{id_to_version, versionless_tool_id};
use gxtdb_schema::tool::Training;
use gxtdb_store::{BootstrapSummary, FilterCriteria, MetadataStore};
use gxtdb_workflows::{parse_tool_ids, parse_tools};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Column identifying the tool in imported spreadsheets.
pub const COLUMN_TOOL_ID: &str = gxtdb_export::COLUMN_TOOL_ID;

pub struct Engine {
    /// The YAML database every command reads and writes.
    pub tools_metadata: PathBuf,
    /// Strategy used when a command does not name one.
    pub merge_strategy: MergeStrategy,
}

/// Counts from one `import-tests` run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TestImportSummary {
    pub reports: usize,
    pub result_sets: usize,
}

impl Engine {
    pub fn new(tools_metadata: impl Into<PathBuf>, merge_strategy: MergeStrategy) -> Self {
        Self {
            tools_metadata: tools_metadata.into(),
            merge_strategy,
        }
    }

    pub fn open_store(&self) -> Result<MetadataStore> {
        MetadataStore::open(&self.tools_metadata)
    }

    fn update<T>(&self, apply: impl FnOnce(&mut MetadataStore) -> Result<T>) -> Result<T> {
        let mut store = self.open_store()?;
        let outcome = apply(&mut store)?;
        store.write()?;
        Ok(outcome)
    }

    /// Record one server's tools, sections and panel skeleton.
    pub fn import_server(&self, catalog: &dyn ToolCatalog) -> Result<BootstrapSummary> {
        let label = catalog.label().to_string();
        let tools = catalog
            .tools()
            .with_context(|| format!("fetch tool listing from {label}"))?;
        let panel = catalog
            .panel()
            .with_context(|| format!("fetch tool panel from {label}"))?;
        self.update(|store| Ok(store.bootstrap_server(&label, &tools, &panel)))
    }

    /// Bootstrap from each catalog in turn; the database is written after each.
    pub fn import_servers(&self, catalogs: &[&dyn ToolCatalog]) -> Result<Vec<BootstrapSummary>> {
        catalogs
            .iter()
            .map(|catalog| self.import_server(*catalog))
            .collect()
    }

    /// Merge every result set from `ingestor` into `target`.
    pub fn import_tests(
        &self,
        ingestor: &dyn ResultIngestor,
        target: &str,
        strategy: Option<MergeStrategy>,
    ) -> Result<TestImportSummary> {
        let strategy = strategy.unwrap_or(self.merge_strategy);
        let collections = ingestor.ingest()?;
        self.update(|store| {
            let mut summary = TestImportSummary::default();
            for collection in &collections {
                summary.reports += 1;
                for set in &collection.results {
                    store.record_test_results(
                        &set.tool_id,
                        &set.version,
                        target,
                        &set.results,
                        strategy,
                    );
                    summary.result_sets += 1;
                }
                info!(uri = %collection.uri, sets = collection.results.len(), "imported report");
            }
            info!(test_target = target, %strategy, reports = summary.reports, sets = summary.result_sets, "imported tests");
            Ok(summary)
        })
    }

    pub fn clear_tests(&self, target: &str) -> Result<usize> {
        self.update(|store| Ok(store.clear_test_results(target)))
    }

    /// Set or unset `labels` from same-named spreadsheet columns.
    ///
    /// `1`/`true` set a label; `0`/`false`/`none`/`null`/empty unset it.
    /// Any other value is an error and nothing is written.
    pub fn import_tabular(&self, input: &str, labels: &[String]) -> Result<usize> {
        let table = Table::from_rows(read_rows(input)?);
        let id_column = table
            .column(COLUMN_TOOL_ID)
            .with_context(|| format!("no {COLUMN_TOOL_ID:?} column in {input}"))?;
        let label_columns = labels
            .iter()
            .map(|label| {
                table
                    .column(label)
                    .map(|column| (label.as_str(), column))
                    .with_context(|| format!("no {label:?} column in {input}"))
            })
            .collect::<Result<Vec<_>>>()?;

        self.update(|store| {
            let mut rows = 0;
            for row in &table.rows {
                let tool_id = Table::cell(row, id_column).trim();
                if tool_id.is_empty() {
                    continue;
                }
                for (label, column) in &label_columns {
                    let present = parse_label_value(Table::cell(row, *column))
                        .with_context(|| format!("label {label:?} for {tool_id}"))?;
                    store.set_label(tool_id, label, present);
                }
                rows += 1;
            }
            Ok(rows)
        })
    }

    /// Apply labels from a two-column `tool id, label` file to known tools.
    pub fn import_labels(&self, input: &str) -> Result<usize> {
        let pairs = read_rows(input)?
            .into_iter()
            .map(|row| match row.as_slice() {
                [tool_id, label, ..] => Ok((tool_id.trim().to_string(), label.trim().to_string())),
                _ => bail!("invalid label row in {input}: {row:?}"),
            })
            .collect::<Result<Vec<_>>>()?;
        self.apply_labels(&pairs)
    }

    /// Apply `label` to every known tool listed one per line in `input`.
    pub fn import_label(&self, input: &str, label: &str) -> Result<usize> {
        let text = read_uri(input)?;
        let pairs: Vec<_> = text
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(|tool_id| (tool_id.to_string(), label.to_string()))
            .collect();
        self.apply_labels(&pairs)
    }

    fn apply_labels(&self, pairs: &[(String, String)]) -> Result<usize> {
        self.update(|store| {
            let mut applied = 0;
            for (tool_id, label) in pairs {
                if !store.contains_tool(tool_id) {
                    warn!(tool_id = %tool_id, label = %label, "unknown tool, label not applied");
                    continue;
                }
                if store.label_existing(tool_id, label) {
                    applied += 1;
                }
            }
            Ok(applied)
        })
    }

    /// Write the ids of tools carrying `label`, one per line.
    pub fn export_label(&self, output: &Path, label: &str) -> Result<usize> {
        let store = self.open_store()?;
        let ids = store.tool_ids_with_label(label);
        std::fs::write(output, ids.join("\n"))
            .with_context(|| format!("write label list {}", output.display()))?;
        Ok(ids.len())
    }

    pub fn clear_label(&self, label: &str) -> Result<usize> {
        self.update(|store| Ok(store.clear_label(label)))
    }

    /// Label every tool used by the workflow(s) at `input`.
    pub fn label_workflow_tools(&self, input: &Path, labels: &[String]) -> Result<usize> {
        let tool_ids = parse_tool_ids(input)?;
        self.update(|store| {
            for raw_tool_id in &tool_ids {
                let tool_id = versionless_tool_id(raw_tool_id);
                if !store.contains_tool(tool_id) {
                    warn!(tool_id, "no entry for workflow tool, creating one");
                }
                for label in labels {
                    store.set_label(tool_id, label, true);
                }
            }
            Ok(tool_ids.len())
        })
    }

    /// Record a training for every tool used by a tutorial workflow under
    /// `<dir>/topics/<topic>/tutorials/<tutorial>`.
    pub fn import_trainings(&self, dir: &Path) -> Result<usize> {
        let topics_dir = dir.join("topics");
        let tutorials = training_tutorials(&topics_dir)?;
        self.update(|store| {
            let mut recorded = 0;
            for (topic, tutorial, tutorial_dir) in &tutorials {
                let tools = match parse_tools(tutorial_dir) {
                    Ok(tools) => tools,
                    Err(err) => {
                        warn!(path = %tutorial_dir.display(), error = %format!("{err:#}"), "skipping tutorial");
                        continue;
                    }
                };
                for tool in tools {
                    let tool_id = versionless_tool_id(&tool.tool_id);
                    let Some(version) = tool
                        .tool_version
                        .as_deref()
                        .or_else(|| id_to_version(&tool.tool_id))
                    else {
                        warn!(tool_id, topic = %topic, tutorial = %tutorial, "no tool version in workflow, skipping training entry");
                        continue;
                    };
                    let training = Training {
                        topic: topic.clone(),
                        tutorial: tutorial.clone(),
                    };
                    if store.record_training(tool_id, version, training) {
                        recorded += 1;
                    }
                }
            }
            Ok(recorded)
        })
    }

    /// Write the coverage spreadsheet. Returns the number of tool rows.
    pub fn export_tabular(&self, output: &Path, options: &CoverageOptions) -> Result<usize> {
        let store = self.open_store()?;
        let rows = coverage_rows(&store, options);
        write_table(output, &rows)?;
        Ok(rows.len().saturating_sub(1))
    }

    pub fn export_coverage_versions(&self, output: &Path) -> Result<usize> {
        let store = self.open_store()?;
        let rows = coverage_versions_rows(&store);
        write_table(output, &rows)?;
        Ok(rows.len().saturating_sub(1))
    }

    pub fn export_install_yaml(
        &self,
        output: &Path,
        servers: &[String],
        filter: &FilterCriteria,
    ) -> Result<usize> {
        let store = self.open_store()?;
        let manifest = install_manifest(&store, servers, filter);
        write_yaml(output, &manifest)?;
        Ok(manifest.tools.len())
    }

    /// Write a panel view for `server`. Returns the path written.
    pub fn export_panel_view(
        &self,
        server: &str,
        definition: &PanelViewDefinition,
    ) -> Result<PathBuf> {
        let store = self.open_store()?;
        let view = panel_view(&store, server, definition)?;
        let output = definition.effective_output();
        write_yaml(&output, &view)?;
        Ok(output)
    }
}

/// Rows of a local or remote delimited file, delimiter picked from its name.
fn read_rows(input: &str) -> Result<Vec<Vec<String>>> {
    let text = read_uri(input)?;
    Ok(parse_rows(&text, Delimiter::for_path(Path::new(input))))
}

fn parse_label_value(raw: &str) -> Result<bool> {
    match raw.trim().to_lowercase().as_str() {
        "1" | "true" => Ok(true),
        "0" | "false" | "none" | "null" | "" => Ok(false),
        other => bail!("do not know how to process label value {other:?} from spreadsheet"),
    }
}

/// `(topic, tutorial, tutorial directory)` for every tutorial, sorted.
fn training_tutorials(topics_dir: &Path) -> Result<Vec<(String, String, PathBuf)>> {
    let mut tutorials = Vec::new();
    for topic_dir in sorted_subdirs(topics_dir)? {
        let tutorials_dir = topic_dir.join("tutorials");
        if !tutorials_dir.is_dir() {
            continue;
        }
        let topic = dir_name(&topic_dir);
        for tutorial_dir in sorted_subdirs(&tutorials_dir)? {
            tutorials.push((topic.clone(), dir_name(&tutorial_dir), tutorial_dir));
        }
    }
    Ok(tutorials)
}

fn sorted_subdirs(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut dirs = Vec::new();
    for entry in std::fs::read_dir(dir).with_context(|| format!("read directory {}", dir.display()))? {
        let path = entry
            .with_context(|| format!("read directory {}", dir.display()))?
            .path();
        if path.is_dir() {
            dirs.push(path);
        }
    }
    dirs.sort();
    Ok(dirs)
}

fn dir_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

fn write_yaml<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let yaml = serde_yaml::to_string(value).context("serialize yaml")?;
    std::fs::write(path, yaml).with_context(|| format!("write {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn label_values() {
        for raw in ["1", "true", "TRUE", " True "] {
            assert!(parse_label_value(raw).unwrap(), "{raw}");
        }
        for raw in ["0", "false", "None", "null", "", "  "] {
            assert!(!parse_label_value(raw).unwrap(), "{raw}");
        }
        assert!(parse_label_value("maybe").is_err());
        assert!(parse_label_value("2").is_err());
    }
}
