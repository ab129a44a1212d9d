use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use gxtdb_config::{
    DEFAULT_COVERAGE_OUTPUT, DEFAULT_COVERAGE_VERSIONS_OUTPUT, DEFAULT_INSTALL_OUTPUT,
    DEFAULT_SERVER_URL, GxtdbConfig, load_or_default,
};
use gxtdb_engine::Engine;
use gxtdb_export::{CoverageOptions, PanelViewDefinition, Selection};
use gxtdb_ingest_results::ReportIngestor;
use gxtdb_ingest_server::GalaxyCatalog;
use gxtdb_logging::LogLevel;
use gxtdb_merge::MergeStrategy;
use gxtdb_ports::ToolCatalog;
use gxtdb_store::FilterCriteria;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "gxtdb", version)]
#[command(about = "Track Galaxy tool versions, labels and test results across servers.", long_about = None)]
struct Cli {
    /// Tool metadata database (YAML).
    #[arg(long, global = true)]
    tools_metadata: Option<PathBuf>,
    /// Config file (YAML or JSON).
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Debug logging.
    #[arg(short, long, global = true)]
    verbose: bool,
    /// Only log errors.
    #[arg(short, long, global = true)]
    quiet: bool,
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Record tools, sections and the panel of one Galaxy server.
    ImportServer {
        /// Server root URL.
        #[arg(long)]
        url: Option<String>,
        /// Galaxy API key (or set GALAXY_API_KEY).
        #[arg(long)]
        api_key: Option<String>,
    },

    /// Run import-server against every public server.
    ImportServerAll,

    /// Merge test results from execution report(s) into a test target.
    ImportTests {
        /// Report file, URL, or directory of reports.
        input: String,
        /// Label the results are recorded under.
        target: String,
        #[arg(long)]
        merge_strategy: Option<MergeStrategy>,
    },

    /// Drop every result recorded for a test target.
    ClearTests { target: String },

    /// Set or unset labels from same-named spreadsheet columns.
    ImportTabular {
        input: String,
        #[arg(long = "label", required = true)]
        labels: Vec<String>,
    },

    /// Apply labels from a two-column tool id / label file.
    ImportLabels { input: String },

    /// Apply one label to the tool ids listed one per line.
    ImportLabel { input: String, label: String },

    /// Write the ids of tools carrying a label.
    ExportLabel { output: PathBuf, label: String },

    /// Remove a label from every tool.
    ClearLabel { label: String },

    /// Label every tool used by a workflow or directory of workflows.
    LabelWorkflowTools {
        input: PathBuf,
        #[arg(long = "label", required = true)]
        labels: Vec<String>,
    },

    /// Record training topics and tutorials from a training-material checkout.
    ImportTrainings { dir: PathBuf },

    /// Write the coverage spreadsheet.
    ExportTabular(ExportTabularArgs),

    /// Write one spreadsheet row per tool version.
    ExportCoverageVersions {
        #[arg(long, default_value = DEFAULT_COVERAGE_VERSIONS_OUTPUT)]
        output: PathBuf,
    },

    /// Write a tools.yaml install manifest.
    ExportInstallYaml {
        #[arg(long, default_value = DEFAULT_INSTALL_OUTPUT)]
        output: PathBuf,
        /// Servers consulted for section labels, in order (default: all).
        #[arg(long = "server")]
        servers: Vec<String>,
        #[command(flatten)]
        filter: LabelFilter,
    },

    /// Write a panel view for one server.
    ExportPanelView {
        id: String,
        server: String,
        /// Defaults to `<id>.yml`.
        #[arg(long)]
        output: Option<PathBuf>,
        #[arg(long)]
        view_type: Option<String>,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        description: Option<String>,
        #[command(flatten)]
        filter: LabelFilter,
    },
}

#[derive(Args, Debug)]
struct ExportTabularArgs {
    #[arg(long, default_value = DEFAULT_COVERAGE_OUTPUT)]
    output: PathBuf,
    /// Server to report installed versions for.
    #[arg(long = "coverage")]
    coverage: Vec<String>,
    #[arg(long, conflicts_with = "coverage")]
    all_coverage: bool,
    /// Test target to summarize.
    #[arg(long = "test")]
    tests: Vec<String>,
    #[arg(long, conflicts_with = "tests")]
    all_tests: bool,
    /// Label to report as a 0/1 column.
    #[arg(long = "label")]
    labels: Vec<String>,
    #[arg(long, conflicts_with = "labels")]
    all_labels: bool,
    #[arg(long)]
    name: bool,
    #[arg(long)]
    description: bool,
    #[arg(long)]
    model_class: bool,
    #[arg(long)]
    tool_shed: bool,
    #[arg(long)]
    repository_owner: bool,
    #[arg(long)]
    repository_name: bool,
    #[arg(long)]
    training_topics: bool,
    #[arg(long)]
    training_tutorials: bool,
    #[command(flatten)]
    filter: LabelFilter,
}

#[derive(Args, Debug)]
struct LabelFilter {
    /// Only tools carrying this label.
    #[arg(long = "require-label")]
    require_labels: Vec<String>,
    /// Skip tools carrying this label.
    #[arg(long = "exclude-label")]
    exclude_labels: Vec<String>,
}

impl LabelFilter {
    fn criteria(&self) -> FilterCriteria {
        FilterCriteria::new()
            .with_required_labels(self.require_labels.iter().cloned())
            .with_excluded_labels(self.exclude_labels.iter().cloned())
    }
}

impl ExportTabularArgs {
    fn options(&self) -> CoverageOptions {
        CoverageOptions {
            coverage: selection(self.all_coverage, &self.coverage),
            tests: selection(self.all_tests, &self.tests),
            labels: selection(self.all_labels, &self.labels),
            filter: self.filter.criteria(),
            include_name: self.name,
            include_description: self.description,
            include_model_class: self.model_class,
            include_tool_shed: self.tool_shed,
            include_repository_owner: self.repository_owner,
            include_repository_name: self.repository_name,
            include_training_topics: self.training_topics,
            include_training_tutorials: self.training_tutorials,
        }
    }
}

fn selection(all: bool, names: &[String]) -> Selection {
    if all {
        Selection::All
    } else {
        Selection::Only(names.to_vec())
    }
}

fn catalog(config: &GxtdbConfig, url: &str, api_key: Option<String>) -> GalaxyCatalog {
    GalaxyCatalog::new(url, config.server_label(url)).with_api_key(api_key)
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = load_or_default(cli.config.as_deref())?;

    let level = LogLevel::from_flags(config.logging.level, cli.verbose, cli.quiet);
    gxtdb_logging::init(&config.logging.clone().with_level(level))?;

    let tools_metadata = cli
        .tools_metadata
        .clone()
        .unwrap_or_else(|| config.tools_metadata.clone());
    let engine = Engine::new(tools_metadata, config.merge_strategy);

    match cli.cmd {
        Command::ImportServer { url, api_key } => {
            let url = url.unwrap_or_else(|| DEFAULT_SERVER_URL.to_string());
            let api_key = api_key.or_else(|| std::env::var("GALAXY_API_KEY").ok());
            let catalog = catalog(&config, &url, api_key);
            let summary = engine.import_server(&catalog)?;
            println!(
                "imported {}: {} tools, {} section placements",
                catalog.label, summary.tools, summary.sections
            );
        }

        Command::ImportServerAll => {
            let catalogs: Vec<GalaxyCatalog> = config
                .public_servers()
                .map(|server| GalaxyCatalog::new(&server.url, &server.label))
                .collect();
            let refs: Vec<&dyn ToolCatalog> =
                catalogs.iter().map(|c| c as &dyn ToolCatalog).collect();
            for (catalog, summary) in catalogs.iter().zip(engine.import_servers(&refs)?) {
                println!("imported {}: {} tools", catalog.label, summary.tools);
            }
        }

        Command::ImportTests {
            input,
            target,
            merge_strategy,
        } => {
            let summary = engine.import_tests(&ReportIngestor::new(input), &target, merge_strategy)?;
            println!(
                "imported {} result sets from {} reports into {target}",
                summary.result_sets, summary.reports
            );
        }

        Command::ClearTests { target } => {
            let cleared = engine.clear_tests(&target)?;
            println!("cleared {target} results from {cleared} tool versions");
        }

        Command::ImportTabular { input, labels } => {
            let rows = engine.import_tabular(&input, &labels)?;
            println!("applied labels from {rows} rows");
        }

        Command::ImportLabels { input } => {
            let applied = engine.import_labels(&input)?;
            println!("applied {applied} labels");
        }

        Command::ImportLabel { input, label } => {
            let applied = engine.import_label(&input, &label)?;
            println!("labelled {applied} tools {label}");
        }

        Command::ExportLabel { output, label } => {
            engine.export_label(&output, &label)?;
            println!("wrote: {}", output.display());
        }

        Command::ClearLabel { label } => {
            let cleared = engine.clear_label(&label)?;
            println!("removed {label} from {cleared} tools");
        }

        Command::LabelWorkflowTools { input, labels } => {
            let tools = engine.label_workflow_tools(&input, &labels)?;
            println!("labelled {tools} workflow tools");
        }

        Command::ImportTrainings { dir } => {
            let recorded = engine.import_trainings(&dir)?;
            println!("recorded {recorded} trainings");
        }

        Command::ExportTabular(args) => {
            engine.export_tabular(&args.output, &args.options())?;
            println!("wrote: {}", args.output.display());
        }

        Command::ExportCoverageVersions { output } => {
            engine.export_coverage_versions(&output)?;
            println!("wrote: {}", output.display());
        }

        Command::ExportInstallYaml {
            output,
            servers,
            filter,
        } => {
            engine.export_install_yaml(&output, &servers, &filter.criteria())?;
            println!("wrote: {}", output.display());
        }

        Command::ExportPanelView {
            id,
            server,
            output,
            view_type,
            name,
            description,
            filter,
        } => {
            let definition = PanelViewDefinition {
                name,
                description,
                require_labels: filter.require_labels,
                exclude_labels: filter.exclude_labels,
                output,
                ..PanelViewDefinition::new(
                    id,
                    view_type.unwrap_or_else(|| config.panel_view_type.clone()),
                )
            };
            let written = engine.export_panel_view(&server, &definition)?;
            println!("wrote: {}", written.display());
        }
    }

    Ok(())
}
