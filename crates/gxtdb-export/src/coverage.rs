//! Coverage spreadsheets.

use crate::{COLUMN_LATEST_VERSION, COLUMN_TOOL_ID, COLUMN_TOOL_VERSION, Selection, cell_bool};
use gxtdb_schema::results::{Outcome, TestResults};
use gxtdb_schema::tool::ToolMetadata;
use gxtdb_store::{FilterCriteria, MetadataStore};
use tracing::warn;

/// What `export-tabular` puts in the spreadsheet.
#[derive(Clone, Debug, Default)]
pub struct CoverageOptions {
    /// Servers to report installed versions for.
    pub coverage: Selection,
    /// Test targets to summarize.
    pub tests: Selection,
    /// Curator labels to report as 0/1 columns.
    pub labels: Selection,
    pub filter: FilterCriteria,
    pub include_name: bool,
    pub include_description: bool,
    pub include_model_class: bool,
    pub include_tool_shed: bool,
    pub include_repository_owner: bool,
    pub include_repository_name: bool,
    pub include_training_topics: bool,
    pub include_training_tutorials: bool,
}

/// One row per tool: header row first.
pub fn coverage_rows(store: &MetadataStore, options: &CoverageOptions) -> Vec<Vec<String>> {
    let servers = options.coverage.resolve(|| store.known_servers());
    let targets = options.tests.resolve(|| store.test_keys());
    let labels = options.labels.resolve(|| store.known_labels());

    let mut header = vec![COLUMN_TOOL_ID.to_string(), COLUMN_LATEST_VERSION.to_string()];
    for server in &servers {
        header.push(format!("{server} Latest Version"));
        header.push(format!("{server} Is Latest"));
    }
    for target in &targets {
        header.push(format!("{target} Latest Version Tested"));
        header.push(format!("{target} Is Latest Version Tested"));
        header.push(format!("{target} Test Count"));
        header.push(format!("{target} Tests Passed"));
        header.push(format!("{target} Tests Failed"));
        header.push(format!("{target} Any Tests Passed"));
    }
    for (include, column) in optional_columns(options) {
        if include {
            header.push(column.to_string());
        }
    }
    header.extend(labels.iter().cloned());

    let mut rows = vec![header];
    for (tool_id, tool) in store.entries(&options.filter) {
        let latest = tool.latest_version();
        let mut row = vec![tool_id.to_string(), latest.clone().unwrap_or_default()];

        for server in &servers {
            let server_latest = tool.servers.get(server).and_then(|s| s.latest_version());
            let is_latest = server_latest.is_some() && server_latest == latest;
            row.push(server_latest.unwrap_or_default());
            row.push(cell_bool(is_latest));
        }

        let latest_results = tool.latest_test_results();
        for target in &targets {
            match latest_results.get(target.as_str()) {
                Some(found) if !found.results.is_empty() => {
                    let (passed, failed) = tally(tool_id, found.results);
                    row.push(found.version.to_string());
                    row.push(cell_bool(Some(found.version) == latest.as_deref()));
                    row.push(found.results.len().to_string());
                    row.push(passed.to_string());
                    row.push(failed.to_string());
                    row.push(cell_bool(passed > 0));
                }
                _ => {
                    row.extend(["", "0", "0", "0", "", "0"].map(String::from));
                }
            }
        }

        row.extend(optional_cells(tool, options));
        for label in &labels {
            row.push(cell_bool(tool.has_label(label)));
        }
        rows.push(row);
    }
    rows
}

fn tally(tool_id: &str, results: &TestResults) -> (usize, usize) {
    for (index, result) in results.iter() {
        if result.outcome() == Outcome::Unrecognized {
            warn!(tool_id, index, status = %result.status, "unknown test result status");
        }
    }
    (results.success_count(), results.failed_count())
}

fn optional_columns(options: &CoverageOptions) -> [(bool, &'static str); 8] {
    [
        (options.include_name, "Name"),
        (options.include_description, "Description"),
        (options.include_model_class, "Model Class"),
        (options.include_tool_shed, "Tool Shed"),
        (options.include_repository_owner, "Repository Owner"),
        (options.include_repository_name, "Repository Name"),
        (options.include_training_topics, "Training Topics"),
        (options.include_training_tutorials, "Training Tutorials"),
    ]
}

fn optional_cells(tool: &ToolMetadata, options: &CoverageOptions) -> Vec<String> {
    let repo = tool.tool_shed_repository.as_ref();
    let values = [
        tool.name().unwrap_or_default().to_string(),
        tool.description().unwrap_or_default().to_string(),
        tool.model_class().unwrap_or_default().to_string(),
        repo.map(|r| r.tool_shed.clone()).unwrap_or_default(),
        repo.map(|r| r.owner.clone()).unwrap_or_default(),
        repo.map(|r| r.name.clone()).unwrap_or_default(),
        join(tool.training_topics()),
        join(tool.training_tutorials()),
    ];
    optional_columns(options)
        .into_iter()
        .zip(values)
        .filter(|((include, _), _)| *include)
        .map(|(_, value)| value)
        .collect()
}

fn join<'a>(values: impl IntoIterator<Item = &'a str>) -> String {
    values.into_iter().collect::<Vec<_>>().join(", ")
}

/// One row per tool version, with a 0/1 column per known server.
pub fn coverage_versions_rows(store: &MetadataStore) -> Vec<Vec<String>> {
    let servers: Vec<String> = store.known_servers().into_iter().collect();

    let mut header = vec![
        COLUMN_TOOL_ID.to_string(),
        COLUMN_TOOL_VERSION.to_string(),
        COLUMN_LATEST_VERSION.to_string(),
        "Is Latest Version".to_string(),
    ];
    header.extend(servers.iter().map(|s| format!("{s} Has Version")));

    let mut rows = vec![header];
    let all = FilterCriteria::new();
    for (tool_id, tool) in store.entries(&all) {
        let latest = tool.latest_version().unwrap_or_default();
        for (version, meta) in tool.versions_newest_first() {
            let mut row = vec![
                tool_id.to_string(),
                version.to_string(),
                latest.clone(),
                cell_bool(version == latest),
            ];
            row.extend(
                servers
                    .iter()
                    .map(|server| cell_bool(meta.servers.contains_key(server))),
            );
            rows.push(row);
        }
    }
    rows
}

#[cfg(test)]
mod tests {
    use super::*;
    use gxtdb_testkit::{BWA_MEM, CAT, results, sample_database};

    fn store() -> MetadataStore {
        let mut db = sample_database();
        {
            let bwa = db.tools.get_mut(BWA_MEM).unwrap();
            bwa.set_label("covid19", true);
            bwa.version_mut("0.7.17.1").test_results.insert(
                "main".into(),
                results(&[(0, "success", None), (1, "failed", None)]),
            );
            bwa.version_mut("0.7.17.2").test_results.insert(
                "local".into(),
                results(&[(0, "success", None), (1, "error", None), (2, "skipped", None)]),
            );
        }
        MetadataStore::from_database("db.yml", db)
    }

    fn column<'a>(rows: &'a [Vec<String>], row: usize, name: &str) -> &'a str {
        let index = rows[0].iter().position(|h| h == name).unwrap();
        &rows[row][index]
    }

    #[test]
    fn minimal_report_has_id_and_latest() {
        let rows = coverage_rows(&store(), &CoverageOptions::default());
        assert_eq!(rows[0], vec!["Tool ID", "Latest Version"]);
        assert_eq!(rows[1], vec![CAT, "1.0.0"]);
        assert_eq!(rows[2], vec![BWA_MEM, "0.7.17.2"]);
    }

    #[test]
    fn server_and_test_columns() {
        let options = CoverageOptions {
            coverage: Selection::All,
            tests: Selection::All,
            ..CoverageOptions::default()
        };
        let rows = coverage_rows(&store(), &options);
        assert_eq!(column(&rows, 2, "main Latest Version"), "0.7.17.2");
        assert_eq!(column(&rows, 2, "main Is Latest"), "1");
        assert_eq!(column(&rows, 2, "eu Latest Version"), "");
        assert_eq!(column(&rows, 2, "eu Is Latest"), "0");
        assert_eq!(column(&rows, 1, "eu Is Latest"), "1");

        assert_eq!(column(&rows, 2, "main Latest Version Tested"), "0.7.17.1");
        assert_eq!(column(&rows, 2, "main Is Latest Version Tested"), "0");
        assert_eq!(column(&rows, 2, "main Test Count"), "2");
        assert_eq!(column(&rows, 2, "main Tests Passed"), "1");
        assert_eq!(column(&rows, 2, "main Tests Failed"), "1");
        assert_eq!(column(&rows, 2, "main Any Tests Passed"), "1");

        assert_eq!(column(&rows, 2, "local Is Latest Version Tested"), "1");
        assert_eq!(column(&rows, 2, "local Test Count"), "3");
        assert_eq!(column(&rows, 2, "local Tests Failed"), "1");

        let untested: Vec<_> = rows[0]
            .iter()
            .zip(&rows[1])
            .filter(|(h, _)| h.starts_with("local "))
            .map(|(_, v)| v.as_str())
            .collect();
        assert_eq!(untested, vec!["", "0", "0", "0", "", "0"]);
    }

    #[test]
    fn optional_and_label_columns() {
        let options = CoverageOptions {
            labels: Selection::All,
            include_name: true,
            include_repository_owner: true,
            include_training_topics: true,
            ..CoverageOptions::default()
        };
        let rows = coverage_rows(&store(), &options);
        assert_eq!(
            rows[0],
            vec![
                "Tool ID",
                "Latest Version",
                "Name",
                "Repository Owner",
                "Training Topics",
                "covid19"
            ]
        );
        assert_eq!(rows[2][2..], ["Map with BWA-MEM", "devteam", "", "1"]);
        assert_eq!(rows[1][2..], ["", "", "", "0"]);
    }

    #[test]
    fn filter_limits_rows() {
        let options = CoverageOptions {
            filter: FilterCriteria::new().with_required_labels(["covid19".to_string()]),
            ..CoverageOptions::default()
        };
        let rows = coverage_rows(&store(), &options);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1][0], BWA_MEM);
    }

    #[test]
    fn versions_report_marks_servers() {
        let rows = coverage_versions_rows(&store());
        assert_eq!(
            rows[0],
            vec![
                "Tool ID",
                "Tool Version",
                "Latest Version",
                "Is Latest Version",
                "eu Has Version",
                "main Has Version"
            ]
        );
        assert_eq!(rows[1], vec![CAT, "1.0.0", "1.0.0", "1", "1", "0"]);
        assert_eq!(rows[2], vec![BWA_MEM, "0.7.17.2", "0.7.17.2", "1", "0", "1"]);
        assert_eq!(rows[3], vec![BWA_MEM, "0.7.17.1", "0.7.17.2", "0", "0", "1"]);
    }
}
