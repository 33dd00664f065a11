//! sqlshape CLI - compile selection graphs and query descriptions to SQL
//!
//! Usage:
//!   sqlshape levels --root <Entity> [--metadata <entities.toml>]
//!   sqlshape compile --request <request.json> --query <query.json> [--metadata <entities.toml>]
//!
//! Examples:
//!   sqlshape levels --metadata entities.toml --root Hospital
//!   sqlshape compile --request request.json --query hospitals.json --output verbose

use clap::{Parser, Subcommand, ValueEnum};
use sqlshape::compiler::{QueryCompiler, QuerySpec};
use sqlshape::config::{Settings, SettingsError};
use sqlshape::error::QueryError;
use sqlshape::graph::SelectionGraph;
use sqlshape::metadata::{MetadataError, MetadataStore};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "sqlshape")]
#[command(about = "sqlshape - compile request-shaped selections to SQL")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the graph levels reachable from a root entity
    Levels {
        /// Root entity name
        #[arg(short, long)]
        root: String,

        /// Entity metadata file (defaults to [metadata] path in the config)
        #[arg(short, long)]
        metadata: Option<PathBuf>,
    },

    /// Compile a query description against a selection graph
    Compile {
        /// Selection graph JSON
        #[arg(long)]
        request: PathBuf,

        /// Query description JSON ({"kind": "simple" | "join" | "native", "query": {...}})
        #[arg(short, long)]
        query: PathBuf,

        /// Entity metadata file (defaults to [metadata] path in the config)
        #[arg(short, long)]
        metadata: Option<PathBuf>,

        /// Output format
        #[arg(short, long, default_value = "sql")]
        output: OutputFormat,
    },
}

#[derive(Clone, ValueEnum)]
enum OutputFormat {
    /// Output SQL only
    Sql,
    /// Output SQL with comments
    Verbose,
}

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error(transparent)]
    Settings(#[from] SettingsError),

    #[error(transparent)]
    Metadata(#[from] MetadataError),

    #[error(transparent)]
    Query(#[from] QueryError),

    #[error("Error reading file '{path}': {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Error parsing '{path}': {source}")]
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("No metadata file given; pass --metadata or set [metadata] path in sqlshape.toml")]
    NoMetadata,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // A broken config only fails when metadata discovery needs it.
    let settings = Settings::load();
    init_logging(settings.as_ref().ok());

    let result = match cli.command {
        Commands::Levels { root, metadata } => cmd_levels(settings, metadata, &root),
        Commands::Compile {
            request,
            query,
            metadata,
            output,
        } => cmd_compile(settings, metadata, &request, &query, output),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn init_logging(settings: Option<&Settings>) {
    let level = match settings.map(|s| s.logging.level_filter()) {
        Some(Ok(level)) => level,
        Some(Err(e)) => {
            eprintln!("Warning: {}; using warn", e);
            log::LevelFilter::Warn
        }
        None => log::LevelFilter::Warn,
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();
}

fn load_metadata(
    settings: Result<Settings, SettingsError>,
    explicit: Option<PathBuf>,
) -> Result<MetadataStore, CliError> {
    let path = match (explicit, settings) {
        (Some(path), Err(e)) => {
            log::warn!("Ignoring configuration: {}", e);
            path
        }
        (Some(path), Ok(_)) => path,
        (None, settings) => settings?
            .metadata
            .resolved_path()?
            .ok_or(CliError::NoMetadata)?,
    };
    log::info!("Loading metadata from {}", path.display());
    Ok(MetadataStore::from_file(&path)?)
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, CliError> {
    let content = fs::read_to_string(path).map_err(|source| CliError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&content).map_err(|source| CliError::Json {
        path: path.to_path_buf(),
        source,
    })
}

fn cmd_levels(
    settings: Result<Settings, SettingsError>,
    metadata: Option<PathBuf>,
    root: &str,
) -> Result<(), CliError> {
    let store = load_metadata(settings, metadata)?;
    let levels = store.root_graph_map(root)?;

    println!("Graph levels for {}:", root);
    for (level, entity) in levels {
        println!("  {:<32} {}", level, entity);
    }
    Ok(())
}

fn cmd_compile(
    settings: Result<Settings, SettingsError>,
    metadata: Option<PathBuf>,
    request: &Path,
    query: &Path,
    output: OutputFormat,
) -> Result<(), CliError> {
    let store = load_metadata(settings, metadata)?;
    let graph: SelectionGraph = read_json(request)?;
    let spec: QuerySpec = read_json(query)?;

    let sql = QueryCompiler::new(&store).compile(&graph, &spec)?;

    match output {
        OutputFormat::Sql => println!("{}", sql),
        OutputFormat::Verbose => {
            println!("-- sqlshape compiled SQL");
            println!("-- Request: {}", request.display());
            println!("-- Query: {}", query.display());
            println!("-- Root entity: {}", graph.root_entity());
            println!();
            if sql.is_empty() {
                println!("-- (no columns selected)");
            } else {
                println!("{}", sql);
            }
        }
    }
    Ok(())
}
