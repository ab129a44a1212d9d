use anyhow::Result;
use gxtdb_schema::galaxy::ApiPanelElement;
use gxtdb_schema::results::TestResults;

/// Results for one tool version, as read from a single report.
#[derive(Clone, Debug, PartialEq)]
pub struct ToolVersionResults {
    /// Versionless tool id.
    pub tool_id: String,
    pub version: String,
    pub results: TestResults,
}

/// Everything usable from one report file or URL.
#[derive(Clone, Debug, PartialEq)]
pub struct ResultCollection {
    pub uri: String,
    pub results: Vec<ToolVersionResults>,
}

/// Source of test execution results.
///
/// Adapters live in `gxtdb-ingest-*` crates.
pub trait ResultIngestor {
    fn ingest(&self) -> Result<Vec<ResultCollection>>;
}

/// A server's tool listing.
///
/// This is a port so the engine can be driven from fixtures instead of a
/// live Galaxy server.
pub trait ToolCatalog {
    /// Label the server's data is recorded under.
    fn label(&self) -> &str;

    /// Every installed tool, flat.
    fn tools(&self) -> Result<Vec<ApiPanelElement>>;

    /// The tool panel: labels, sections with their tools, loose tools.
    fn panel(&self) -> Result<Vec<ApiPanelElement>>;
}
