//! apispec CLI entrypoint
//! Parses command-line arguments and dispatches to the core generators.

// Internal imports (std, crate)
use std::path::{Path, PathBuf};

// External imports (alphabetized)
use anyhow::Context;
use apispec_core::{
    openapi::{self, Server},
    writer, Config, FieldDescriptor, Format, SnapshotSet,
};
use clap::Parser;
use tokio::fs;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "apispec")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable debug logging
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(clap::Subcommand, Debug)]
pub enum Commands {
    /// Aggregate captured snapshots into an OpenAPI 3 document
    Openapi3 {
        /// Configuration file (YAML, or TOML with a .toml extension)
        #[arg(long)]
        config: Option<PathBuf>,
        /// Directory holding the captured resource.json snapshots
        #[arg(long)]
        snippets_dir: Option<PathBuf>,
        /// Output directory for the generated document
        #[arg(long)]
        output_dir: Option<PathBuf>,
        /// Output format
        #[arg(long, value_enum)]
        format: Option<Format>,
        /// API title
        #[arg(long)]
        title: Option<String>,
        /// API description
        #[arg(long)]
        description: Option<String>,
        /// API version
        #[arg(long)]
        api_version: Option<String>,
        /// Server URL, may be repeated
        ///
        /// Example: --server https://api.example.com --server /v1
        #[arg(long = "server")]
        servers: Vec<String>,
        /// Also write a document without private resources
        #[arg(long)]
        separate_public_api: bool,
    },
    /// Build a JSON Schema from a file of field descriptors
    Schema {
        /// JSON file holding an array of field descriptors
        #[arg(long)]
        fields: PathBuf,
        /// Schema title
        #[arg(long)]
        title: Option<String>,
        /// Output format
        #[arg(long, value_enum, default_value = "json")]
        format: Format,
        /// Output file, stdout when omitted
        #[arg(long)]
        output: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Openapi3 {
            config,
            snippets_dir,
            output_dir,
            format,
            title,
            description,
            api_version,
            servers,
            separate_public_api,
        } => {
            let mut config = match config {
                Some(path) => Config::from_file(&path)
                    .await
                    .with_context(|| format!("Failed to load configuration {}", path.display()))?,
                None => Config::default(),
            };

            // Command-line flags win over the configuration file
            if let Some(dir) = snippets_dir {
                config.snippets_dir = dir;
            }
            if let Some(dir) = output_dir {
                config.output_dir = dir;
            }
            if let Some(format) = format {
                config.format = format;
            }
            if let Some(title) = title {
                config.title = title;
            }
            if description.is_some() {
                config.description = description;
            }
            if let Some(version) = api_version {
                config.version = version;
            }
            if !servers.is_empty() {
                config.servers = servers.into_iter().map(Server::new).collect();
            }
            config.separate_public_api |= separate_public_api;

            run_openapi3(&config).await
        }
        Commands::Schema {
            fields,
            title,
            format,
            output,
        } => run_schema(&fields, title.as_deref(), format, output.as_deref()).await,
    }
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn run_openapi3(config: &Config) -> anyhow::Result<()> {
    debug!("Reading snapshots from {}", config.snippets_dir.display());
    let snapshots = SnapshotSet::from_dir(&config.snippets_dir)
        .await
        .context("Failed to load resource snapshots")?;
    let metadata = config.metadata().await.context("Invalid configuration")?;

    fs::create_dir_all(&config.output_dir).await.with_context(|| {
        format!(
            "Failed to create output directory {}",
            config.output_dir.display()
        )
    })?;

    let document = openapi::generate(snapshots.resources(), &metadata)?;
    if let Err(e) = openapi::validate(&document) {
        warn!("{e}");
    }
    let path = config.output_path(false);
    write_output(&path, &writer::serialize(&document, config.format)?).await?;
    info!(
        "Wrote {} operations from {} snapshots to {}",
        count_operations(&document),
        snapshots.len(),
        path.display()
    );

    if config.separate_public_api {
        let document = openapi::generate(&snapshots.public_resources(), &metadata)?;
        let path = config.output_path(true);
        write_output(&path, &writer::serialize(&document, config.format)?).await?;
        info!("Wrote public document to {}", path.display());
    }
    Ok(())
}

async fn run_schema(
    fields: &Path,
    title: Option<&str>,
    format: Format,
    output: Option<&Path>,
) -> anyhow::Result<()> {
    let content = fs::read_to_string(fields)
        .await
        .with_context(|| format!("Failed to read {}", fields.display()))?;
    let descriptors: Vec<FieldDescriptor> = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse field descriptors in {}", fields.display()))?;

    let schema = writer::generate_schema(&descriptors, title, format)?;
    match output {
        Some(path) => write_output(path, &schema).await?,
        None => println!("{schema}"),
    }
    Ok(())
}

async fn write_output(path: &Path, content: &str) -> anyhow::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).await?;
    }
    fs::write(path, content)
        .await
        .with_context(|| format!("Failed to write {}", path.display()))
}

fn count_operations(document: &openapi::OpenApi) -> usize {
    document
        .paths
        .values()
        .map(|item| item.operations().count())
        .sum()
}
