//! Configuration management and loading for gxtdb.
//!
//! Every value here has a built-in default. A config file (YAML or JSON,
//! chosen by extension) overrides those defaults and command-line flags
//! override the file.

use anyhow::Context;
use gxtdb_logging::LoggingConfig;
use gxtdb_merge::MergeStrategy;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const DEFAULT_DATABASE_PATH: &str = "tools_metadata.yml";
pub const DEFAULT_SERVER_URL: &str = "https://usegalaxy.org";
pub const DEFAULT_PANEL_VIEW_TYPE: &str = "generic";
pub const DEFAULT_COVERAGE_OUTPUT: &str = "gxtdb_output.tsv";
pub const DEFAULT_COVERAGE_VERSIONS_OUTPUT: &str = "gxtdb_coverage_versions.tsv";
pub const DEFAULT_INSTALL_OUTPUT: &str = "tools.yaml";

/// Configuration format types supported
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfigFormat {
    Json,
    #[default]
    Yaml,
}

impl ConfigFormat {
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => ConfigFormat::Json,
            _ => ConfigFormat::Yaml,
        }
    }
}

/// A Galaxy server known by a short label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerConfig {
    pub label: String,
    pub url: String,
    /// Included by `import-server-all`.
    #[serde(default)]
    pub public: bool,
}

impl ServerConfig {
    fn new(label: &str, url: &str, public: bool) -> Self {
        Self {
            label: label.to_string(),
            url: url.to_string(),
            public,
        }
    }
}

/// Main gxtdb configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GxtdbConfig {
    /// Path of the YAML tool database.
    #[serde(default = "default_tools_metadata")]
    pub tools_metadata: PathBuf,

    /// Strategy used by `import-tests` when none is given.
    #[serde(default = "default_merge_strategy")]
    pub merge_strategy: MergeStrategy,

    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default = "default_servers")]
    pub servers: Vec<ServerConfig>,

    #[serde(default = "default_panel_view_type")]
    pub panel_view_type: String,
}

fn default_tools_metadata() -> PathBuf {
    PathBuf::from(DEFAULT_DATABASE_PATH)
}

fn default_merge_strategy() -> MergeStrategy {
    MergeStrategy::LatestExecuted
}

fn default_panel_view_type() -> String {
    DEFAULT_PANEL_VIEW_TYPE.to_string()
}

fn default_servers() -> Vec<ServerConfig> {
    let mut servers = vec![
        ServerConfig::new("main", DEFAULT_SERVER_URL, true),
        ServerConfig::new("test", "https://test.galaxyproject.org", true),
        ServerConfig::new("eu", "https://usegalaxy.eu", true),
        ServerConfig::new("au", "https://usegalaxy.org.au", true),
    ];
    let eu_subdomains = [
        ("clipseq", "cliqseq_eu"),
        ("humancellatlas", "humancellatlas_eu"),
        ("metabolomics", "metabolomics_eu"),
        ("ml", "ml_eu"),
        ("proteomics", "proteomics_eu"),
        ("annotation", "annotation_eu"),
        ("cheminformatics", "cheminformatics_eu"),
        ("covid19", "covid19_eu"),
        ("graphclust", "graphclust_eu"),
        ("imaging", "imaging_eu"),
        ("metagenomics", "metagenomics_eu"),
        ("nanopore", "nanopore_eu"),
        ("rna", "rna_eu"),
        ("assembly", "assembly_eu"),
        ("climate", "climate_eu"),
        ("ecology", "ecology_eu"),
        ("hicexplorer", "hicexplorer_eu"),
        ("microbiome", "microbiome_eu"),
        ("plants", "plants_eu"),
        ("singlecell", "singlecell_eu"),
    ];
    servers.extend(eu_subdomains.iter().map(|(subdomain, label)| {
        ServerConfig::new(label, &format!("https://{subdomain}.usegalaxy.eu/"), false)
    }));
    servers
}

impl Default for GxtdbConfig {
    fn default() -> Self {
        Self {
            tools_metadata: default_tools_metadata(),
            merge_strategy: default_merge_strategy(),
            logging: LoggingConfig::default(),
            servers: default_servers(),
            panel_view_type: default_panel_view_type(),
        }
    }
}

impl GxtdbConfig {
    /// The label a server URL is recorded under. Unknown URLs label themselves.
    pub fn server_label(&self, url: &str) -> String {
        let wanted = url.trim_end_matches('/');
        self.servers
            .iter()
            .find(|s| s.url.trim_end_matches('/') == wanted)
            .map(|s| s.label.clone())
            .unwrap_or_else(|| url.to_string())
    }

    pub fn server_url(&self, label: &str) -> Option<&str> {
        self.servers
            .iter()
            .find(|s| s.label == label)
            .map(|s| s.url.as_str())
    }

    pub fn public_servers(&self) -> impl Iterator<Item = &ServerConfig> {
        self.servers.iter().filter(|s| s.public)
    }
}

/// Load configuration from a file
pub fn load_config<P: AsRef<Path>>(path: P) -> anyhow::Result<GxtdbConfig> {
    let path = path.as_ref();
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("read config {}", path.display()))?;

    match ConfigFormat::from_path(path) {
        ConfigFormat::Json => serde_json::from_str(&contents)
            .with_context(|| format!("parse JSON config {}", path.display())),
        ConfigFormat::Yaml => serde_yaml::from_str(&contents)
            .with_context(|| format!("parse YAML config {}", path.display())),
    }
}

/// Load `path` when given, otherwise the built-in defaults.
pub fn load_or_default(path: Option<&Path>) -> anyhow::Result<GxtdbConfig> {
    match path {
        Some(path) => load_config(path),
        None => Ok(GxtdbConfig::default()),
    }
}

/// Save configuration to a file
pub fn save_config<P: AsRef<Path>>(config: &GxtdbConfig, path: P) -> anyhow::Result<()> {
    let path = path.as_ref();
    let contents = match ConfigFormat::from_path(path) {
        ConfigFormat::Json => {
            serde_json::to_string_pretty(config).context("serialize JSON config")?
        }
        ConfigFormat::Yaml => serde_yaml::to_string(config).context("serialize YAML config")?,
    };

    std::fs::write(path, contents).with_context(|| format!("write config {}", path.display()))
}
