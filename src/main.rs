//! CLI entry point for complaint clustering.
//!
//! Reads complaint snapshots as JSON, runs clustering or similarity search
//! through [`ComplaintClusteringService`] and prints tables or JSON.

use anyhow::Context;
use civitas::display::{THEME, create_cluster_table, create_similarity_table, with_spinner};
use civitas::error::{ClusteringError, EmbeddingError, SearchError};
use civitas::io::{
    ExitCode, InputError, JsonResponse, OutputFormat, ResponseMeta, read_complaints, read_corpus,
};
use civitas::types::{ComplaintId, EmbeddingVector};
use civitas::{ClusteringMethod, ComplaintClusteringService, Settings};
use clap::{
    ArgAction, Parser, Subcommand,
    builder::styling::{AnsiColor, Effects, Styles},
};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::Level;

fn clap_cargo_style() -> Styles {
    Styles::styled()
        .header(AnsiColor::Cyan.on_default() | Effects::BOLD)
        .usage(AnsiColor::Cyan.on_default() | Effects::BOLD)
        .literal(AnsiColor::Green.on_default())
        .placeholder(AnsiColor::Green.on_default())
}

/// Civic complaint clustering
#[derive(Parser)]
#[command(
    name = "civitas",
    version = env!("CARGO_PKG_VERSION"),
    about = "Group citizen complaints into labelled clusters and find similar complaints",
    next_line_help = true,
    styles = clap_cargo_style()
)]
struct Cli {
    /// Path to custom settings.toml file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write .civitas/settings.toml with default configuration
    Init {
        /// Force overwrite existing configuration
        #[arg(short, long)]
        force: bool,
    },

    /// Display active settings
    Config,

    /// Cluster a batch of complaints
    #[command(
        after_help = "Examples:\n  civitas cluster -i complaints.json\n  civitas cluster -i complaints.json -m topics --json\n  civitas cluster -i complaints.json -k 8 -o clusters.json"
    )]
    Cluster {
        /// JSON array of {id, title, description} ('-' for stdin)
        #[arg(short, long)]
        input: PathBuf,

        /// kmeans or topics (bertopic accepted)
        #[arg(short, long)]
        method: Option<ClusteringMethod>,

        /// Number of clusters for kmeans
        #[arg(short = 'k', long)]
        clusters: Option<usize>,

        /// Save the full result as JSON
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },

    /// Find stored complaints similar to a text
    Similar {
        /// Corpus entries or a saved clustering result
        #[arg(long)]
        corpus: PathBuf,

        /// Complaint text to match
        #[arg(short, long)]
        query: String,

        /// Number of matches
        #[arg(short = 'k', long)]
        top_k: Option<usize>,

        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },

    /// Compute embeddings for a batch of complaints
    Embed {
        /// JSON array of {id, title, description} ('-' for stdin)
        #[arg(short, long)]
        input: PathBuf,

        /// Write embeddings here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

/// Row written by `embed`.
#[derive(Debug, Serialize)]
struct EmbeddingRecord {
    complaint_id: ComplaintId,
    embedding: EmbeddingVector,
}

fn main() -> std::process::ExitCode {
    let cli = Cli::parse();

    let settings = match load_settings(cli.config.as_deref()) {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("{}", THEME.error_with_icon(&format!("{e:#}")));
            return ExitCode::ConfigError.into();
        }
    };

    init_tracing(&settings.logging.level, cli.verbose);

    if cli.config.is_none() && !matches!(cli.command, Commands::Init { .. }) {
        if let Err(reason) = Settings::check_init() {
            tracing::debug!(%reason, "using default configuration");
        }
    }

    match run(cli.command, settings) {
        Ok(code) => code.into(),
        Err(e) => {
            eprintln!("{}", THEME.error_with_icon(&format!("{e:#}")));
            if let Some(clustering) = e.downcast_ref::<ClusteringError>() {
                for suggestion in clustering.recovery_suggestions() {
                    eprintln!("  {}", THEME.apply(&THEME.dim, suggestion));
                }
            }
            exit_code_for(&e).into()
        }
    }
}

fn load_settings(path: Option<&Path>) -> anyhow::Result<Settings> {
    match path {
        Some(path) => Settings::load_from(path)
            .with_context(|| format!("Configuration error loading from {}", path.display())),
        None => Settings::load().context("Configuration error"),
    }
}

fn init_tracing(level: &str, verbose: u8) {
    let level = match verbose {
        0 => level.parse().unwrap_or(Level::INFO),
        1 => Level::DEBUG,
        _ => Level::TRACE,
    };

    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn run(command: Commands, settings: Settings) -> anyhow::Result<ExitCode> {
    match command {
        Commands::Init { force } => {
            let path = Settings::init_config_file(force).map_err(|e| anyhow::anyhow!("{e}"))?;
            println!(
                "{}",
                THEME.success_with_icon(&format!(
                    "Created configuration file at: {}",
                    path.display()
                ))
            );
            Ok(ExitCode::Success)
        }

        Commands::Config => {
            println!("{}", THEME.apply(&THEME.header, "Current Configuration:"));
            println!("{}", "=".repeat(50));
            println!("{}", toml::to_string_pretty(&settings)?);
            Ok(ExitCode::Success)
        }

        Commands::Cluster {
            input,
            method,
            clusters,
            output,
            json,
        } => run_cluster(
            &settings,
            &input,
            method.unwrap_or(settings.clustering.default_method),
            clusters,
            output.as_deref(),
            OutputFormat::from_json_flag(json),
        ),

        Commands::Similar {
            corpus,
            query,
            top_k,
            json,
        } => run_similar(
            &settings,
            &corpus,
            &query,
            top_k.unwrap_or(settings.similarity.top_k),
            OutputFormat::from_json_flag(json),
        ),

        Commands::Embed { input, output } => run_embed(&settings, &input, output.as_deref()),
    }
}

fn load_service(settings: &Settings) -> anyhow::Result<ComplaintClusteringService> {
    let service = with_spinner("Loading embedding model", || {
        ComplaintClusteringService::from_settings(settings)
    })?;
    Ok(service)
}

fn run_cluster(
    settings: &Settings,
    input: &Path,
    method: ClusteringMethod,
    clusters: Option<usize>,
    output: Option<&Path>,
    format: OutputFormat,
) -> anyhow::Result<ExitCode> {
    let records = read_complaints(input)?;
    let service = load_service(settings)?;

    let start = Instant::now();
    let outcome = with_spinner(&format!("Clustering {} complaints", records.len()), || {
        service.cluster(&records, method, clusters)
    });

    let result = match outcome {
        Ok(result) => result,
        Err(e) if format.is_json() => {
            let response = JsonResponse::from_error(&e);
            println!("{}", serde_json::to_string_pretty(&response)?);
            return Ok(ExitCode::from_error(&e));
        }
        Err(e) => return Err(e.into()),
    };

    if let Some(path) = output {
        write_json(path, &result)?;
    }

    if format.is_json() {
        let response = JsonResponse::success(&result)
            .with_message(format!("{} clusters", result.total_clusters))
            .with_meta(ResponseMeta::new(start.elapsed()));
        println!("{}", serde_json::to_string_pretty(&response)?);
    } else {
        println!(
            "{}",
            THEME.run_summary(
                result.method.as_str(),
                result.total_clusters,
                result.total_complaints,
                result.outliers
            )
        );
        if result.method != method {
            println!(
                "{}",
                THEME.warning_with_icon("Topic discovery fell back to k-means")
            );
        }
        println!("{}", create_cluster_table(&result));
        if let Some(path) = output {
            println!(
                "{}",
                THEME.success_with_icon(&format!(
                    "Saved result to {}",
                    THEME.apply(&THEME.path, path.display())
                ))
            );
        }
    }

    Ok(ExitCode::Success)
}

fn run_similar(
    settings: &Settings,
    corpus: &Path,
    query: &str,
    top_k: usize,
    format: OutputFormat,
) -> anyhow::Result<ExitCode> {
    let corpus = read_corpus(corpus)?;
    let service = load_service(settings)?;
    let matches = service.try_find_similar(query, &corpus, top_k)?;

    if format.is_json() {
        if matches.is_empty() {
            let response = JsonResponse::not_found("similar complaints");
            println!("{}", serde_json::to_string_pretty(&response)?);
        } else {
            let response = JsonResponse::success(&matches)
                .with_message(format!("{} similar complaints", matches.len()));
            println!("{}", serde_json::to_string_pretty(&response)?);
        }
    } else if matches.is_empty() {
        println!("{}", THEME.warning_with_icon("No similar complaints found"));
    } else {
        println!("{}", create_similarity_table(&matches));
    }

    Ok(ExitCode::from_matches(&matches))
}

fn run_embed(settings: &Settings, input: &Path, output: Option<&Path>) -> anyhow::Result<ExitCode> {
    let records = read_complaints(input)?;
    let service = load_service(settings)?;

    let documents: Vec<String> = records.iter().map(|r| r.document()).collect();
    let texts: Vec<&str> = documents.iter().map(String::as_str).collect();
    let embeddings = with_spinner(&format!("Embedding {} complaints", texts.len()), || {
        service.generate_embeddings(&texts)
    })?;

    let rows: Vec<EmbeddingRecord> = records
        .iter()
        .zip(embeddings)
        .map(|(record, embedding)| EmbeddingRecord {
            complaint_id: record.id,
            embedding,
        })
        .collect();

    match output {
        Some(path) => {
            write_json(path, &rows)?;
            eprintln!(
                "{}",
                THEME.success_with_icon(&format!(
                    "Wrote {} embeddings to {}",
                    rows.len(),
                    path.display()
                ))
            );
        }
        None => println!("{}", serde_json::to_string(&rows)?),
    }

    Ok(ExitCode::Success)
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    std::fs::write(path, json).with_context(|| format!("Failed to write {}", path.display()))
}

fn exit_code_for(error: &anyhow::Error) -> ExitCode {
    if let Some(e) = error.downcast_ref::<ClusteringError>() {
        ExitCode::from_error(e)
    } else if let Some(e) = error.downcast_ref::<InputError>() {
        e.exit_code()
    } else if let Some(e) = error.downcast_ref::<EmbeddingError>() {
        ExitCode::from_embedding_error(e)
    } else if let Some(e) = error.downcast_ref::<SearchError>() {
        match e {
            SearchError::EmptyQuery => ExitCode::InvalidInput,
            SearchError::Embedding(inner) => ExitCode::from_embedding_error(inner),
        }
    } else if error.downcast_ref::<std::io::Error>().is_some() {
        ExitCode::IoError
    } else {
        ExitCode::GeneralError
    }
}
