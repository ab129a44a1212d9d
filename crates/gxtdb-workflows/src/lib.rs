//! Tool extraction from Galaxy workflows.
//!
//! Native workflows (`.ga`) are JSON with `steps` keyed by step number.
//! Format2 workflows (`.yml`/`.yaml`) are YAML with `steps` as a list or a
//! map keyed by label. Either kind may embed subworkflows (`subworkflow` in
//! native files, `run` in Format2), which are searched as well.

use anyhow::{Context, Result, bail};
use gxtdb_io::walk::{has_extension, walk_files};
use serde_json::Value;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use tracing::warn;

/// File names that share workflow extensions but never hold workflows.
const IGNORED_FILE_NAMES: [&str; 3] = ["data-library.yaml", "data-manager.yaml", "tools.yaml"];

/// A tool referenced by a workflow step.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct WorkflowTool {
    pub tool_id: String,
    pub tool_version: Option<String>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WorkflowFormat {
    Native,
    Format2,
}

impl WorkflowFormat {
    pub fn for_path(path: &Path) -> Self {
        if has_extension(path, &["ga"]) {
            WorkflowFormat::Native
        } else {
            WorkflowFormat::Format2
        }
    }
}

/// Parse one workflow document.
pub fn parse_workflow(text: &str, format: WorkflowFormat) -> Result<BTreeSet<WorkflowTool>> {
    let document: Value = match format {
        WorkflowFormat::Native => serde_json::from_str(text).context("parse workflow JSON")?,
        WorkflowFormat::Format2 => {
            let yaml: serde_yaml::Value =
                serde_yaml::from_str(text).context("parse workflow YAML")?;
            serde_json::to_value(yaml).context("convert workflow YAML")?
        }
    };
    if !document.is_object() {
        bail!("workflow document is not a mapping");
    }
    let mut tools = BTreeSet::new();
    collect_steps(&document, &mut tools);
    Ok(tools)
}

fn collect_steps(workflow: &Value, tools: &mut BTreeSet<WorkflowTool>) {
    let steps: Vec<&Value> = match workflow.get("steps") {
        Some(Value::Array(steps)) => steps.iter().collect(),
        Some(Value::Object(steps)) => steps.values().collect(),
        _ => return,
    };
    for step in steps {
        let step_type = step.get("type").and_then(Value::as_str).unwrap_or("tool");
        let nested = step.get("run").or_else(|| step.get("subworkflow"));
        if step_type != "tool" && nested.is_none() {
            continue;
        }
        match step.get("tool_id").and_then(Value::as_str) {
            Some(tool_id) if !tool_id.is_empty() => {
                tools.insert(WorkflowTool {
                    tool_id: tool_id.to_string(),
                    tool_version: step.get("tool_version").and_then(scalar_string),
                });
            }
            _ => {
                if let Some(nested) = nested.filter(|n| n.is_object()) {
                    collect_steps(nested, tools);
                }
            }
        }
    }
}

fn scalar_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

pub fn parse_workflow_file(path: &Path) -> Result<BTreeSet<WorkflowTool>> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("read workflow {}", path.display()))?;
    parse_workflow(&text, WorkflowFormat::for_path(path))
        .with_context(|| format!("parse workflow {}", path.display()))
}

/// Candidate workflow files under `dir`.
pub fn workflow_files(dir: &Path) -> Vec<PathBuf> {
    walk_files(dir, |path| {
        has_extension(path, &["yml", "yaml", "ga"]) && !is_ignored(path)
    })
}

fn is_ignored(path: &Path) -> bool {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy())
        .unwrap_or_default();
    IGNORED_FILE_NAMES.contains(&&*name) || name.contains("test.") || name.contains("tests.")
}

/// Tools used by a workflow file or by every workflow under a directory.
///
/// A single file that fails to parse is an error. In a directory walk such
/// files are skipped with a warning.
pub fn parse_tools(path: &Path) -> Result<BTreeSet<WorkflowTool>> {
    if !path.is_dir() {
        return parse_workflow_file(path);
    }
    let mut tools = BTreeSet::new();
    for file in workflow_files(path) {
        match parse_workflow_file(&file) {
            Ok(found) => tools.extend(found),
            Err(err) => warn!(path = %file.display(), error = %format!("{err:#}"), "skipping workflow"),
        }
    }
    Ok(tools)
}

/// Distinct tool ids used by the workflow(s) at `path`.
pub fn parse_tool_ids(path: &Path) -> Result<BTreeSet<String>> {
    Ok(parse_tools(path)?.into_iter().map(|t| t.tool_id).collect())
}
