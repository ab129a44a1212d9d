use chrono::NaiveDateTime;
use gxtdb_schema::panel::PanelSkeletonItem;
use gxtdb_schema::results::{TestResult, TestResults};
use gxtdb_schema::tool::{
    MAIN_TOOL_SHED, SectionRef, ToolDatabase, ToolMetadata, ToolShedRepository,
};
use serde_json::{Value, json};
use std::path::{Path, PathBuf};

pub mod proptest;

/// Small helpers for building fixtures in tests.
///
/// Keeping these in a microcrate avoids copy-paste across merge/store/export tests.
pub fn ts(raw: &str) -> NaiveDateTime {
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f").unwrap()
}

pub fn result(status: &str, time: Option<&str>) -> TestResult {
    TestResult::new(status, time.map(ts))
}

/// Build a result set from `(index, status, timestamp)` triples.
pub fn results(entries: &[(u32, &str, Option<&str>)]) -> TestResults {
    entries
        .iter()
        .map(|(index, status, time)| (*index, result(status, *time)))
        .collect()
}

/// One `tests` entry of an execution report.
pub fn report_entry(
    tool_id: &str,
    tool_version: &str,
    status: &str,
    test_index: Option<u32>,
    create_time: Option<&str>,
) -> Value {
    let mut data = json!({
        "tool_id": tool_id,
        "tool_version": tool_version,
        "status": status,
    });
    if let Some(index) = test_index {
        data["test_index"] = json!(index);
    }
    if let Some(time) = create_time {
        data["job"] = json!({ "create_time": time });
    }
    json!({ "id": format!("{tool_id}-{}", test_index.unwrap_or(0)), "has_data": true, "data": data })
}

pub fn report(entries: Vec<Value>) -> Value {
    json!({ "version": "0.1", "tests": entries, "results": {} })
}

pub fn write_file(dir: &Path, name: &str, contents: &str) -> PathBuf {
    let path = dir.join(name);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(&path, contents).unwrap();
    path
}

pub const BWA_MEM: &str = "toolshed.g2.bx.psu.edu/repos/devteam/bwa/bwa_mem";
pub const CAT: &str = "cat1";

/// A tool-shed tool present on `main` (section "mapping") at two versions.
pub fn bwa_tool() -> ToolMetadata {
    let mut tool = ToolMetadata {
        tool_shed_repository: Some(ToolShedRepository {
            name: "bwa".into(),
            owner: "devteam".into(),
            tool_shed: MAIN_TOOL_SHED.into(),
        }),
        ..ToolMetadata::default()
    };
    let server = tool.server_mut("main");
    server.versions = vec!["0.7.17.1".into(), "0.7.17.2".into()];
    server.sections.insert(
        "mapping".into(),
        SectionRef {
            name: "Mapping".into(),
        },
    );
    tool.version_mut("0.7.17.1")
        .servers
        .insert("main".into(), Default::default());
    let latest = tool.version_mut("0.7.17.2");
    latest.servers.insert("main".into(), Default::default());
    latest.name = Some("Map with BWA-MEM".into());
    tool
}

/// A built-in tool present on `eu` only.
pub fn cat_tool() -> ToolMetadata {
    let mut tool = ToolMetadata::default();
    tool.server_mut("eu").versions = vec!["1.0.0".into()];
    tool.server_mut("eu").sections.insert(
        "textutil".into(),
        SectionRef {
            name: "Text Manipulation".into(),
        },
    );
    tool.version_mut("1.0.0")
        .servers
        .insert("eu".into(), Default::default());
    tool
}

/// A database holding [`bwa_tool`] and [`cat_tool`] plus a `main` panel.
pub fn sample_database() -> ToolDatabase {
    let mut db = ToolDatabase::default();
    db.tools.insert(BWA_MEM.into(), bwa_tool());
    db.tools.insert(CAT.into(), cat_tool());
    db.integrated_panels.insert(
        "main".into(),
        vec![
            PanelSkeletonItem::ToolSectionLabel {
                id: "ngs_label".into(),
                text: "NGS".into(),
            },
            PanelSkeletonItem::ToolSection {
                id: "mapping".into(),
                name: "Mapping".into(),
            },
            PanelSkeletonItem::ToolSection {
                id: "textutil".into(),
                name: "Text Manipulation".into(),
            },
        ],
    );
    db
}
