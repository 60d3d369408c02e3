use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use signalgeo_common::{Config, PipelineConfig, SeedRegistry, Signal};
use signalgeo_graph::{export_all, load_co_occurrence_or_empty, save_co_occurrence, Pipeline};
use signalgeo_scout::{collect_signals, JsonFileSource, RawPostFileSource, SignalSource};

#[derive(Parser)]
#[command(name = "signalgeo")]
#[command(about = "Signal propagation graph engine")]
#[command(version)]
struct Cli {
    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the full pipeline over collected signal files
    Run {
        /// JSON files holding arrays of signal records
        #[arg(short, long, num_args = 1..)]
        input: Vec<PathBuf>,

        /// JSON files holding arrays of raw forum, microblog or news posts
        #[arg(long, num_args = 1..)]
        posts: Vec<PathBuf>,

        /// Output directory (defaults to <data dir>/output)
        #[arg(short, long)]
        out: Option<PathBuf>,

        /// Seed node list (JSON); the built-in registry otherwise
        #[arg(long)]
        seeds: Option<PathBuf>,

        /// Pipeline tuning (TOML)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Co-occurrence memory read before and written after the run
        #[arg(long)]
        co_memory: Option<PathBuf>,
    },

    /// Print the JSON Schema of an input signal file
    Schema,

    /// Print the built-in seed registry as JSON
    Seeds,
}

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();

    let filter = EnvFilter::from_default_env().add_directive("signalgeo=info".parse()?);
    if cli.json_logs {
        tracing_subscriber::fmt().json().with_env_filter(filter).init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }

    match cli.command {
        Commands::Run {
            input,
            posts,
            out,
            seeds,
            config,
            co_memory,
        } => run(input, posts, out, seeds, config, co_memory).await,
        Commands::Schema => {
            let schema = schemars::schema_for!(Vec<Signal>);
            println!("{}", serde_json::to_string_pretty(&schema)?);
            Ok(())
        }
        Commands::Seeds => {
            let registry = SeedRegistry::default();
            println!("{}", serde_json::to_string_pretty(registry.nodes())?);
            Ok(())
        }
    }
}

async fn run(
    input: Vec<PathBuf>,
    posts: Vec<PathBuf>,
    out: Option<PathBuf>,
    seeds: Option<PathBuf>,
    config_path: Option<PathBuf>,
    co_memory: Option<PathBuf>,
) -> Result<()> {
    if input.is_empty() && posts.is_empty() {
        bail!("Nothing to run: pass --input or --posts");
    }
    info!("Signal Geometry starting...");

    let config = Config::from_env();
    config.log();

    let pipeline_config = match config_path.or(config.config_path.clone()) {
        Some(path) => PipelineConfig::load(&path)
            .with_context(|| format!("Failed to load pipeline config {}", path.display()))?,
        None => PipelineConfig::default(),
    };

    let registry = match seeds {
        Some(path) => SeedRegistry::load(&path)
            .with_context(|| format!("Failed to load seed nodes {}", path.display()))?,
        None => SeedRegistry::default(),
    };
    info!(nodes = registry.len(), "Seed registry ready");

    let mut sources: Vec<Box<dyn SignalSource>> = Vec::new();
    for path in input {
        sources.push(Box::new(JsonFileSource::new(path)));
    }
    for path in posts {
        sources.push(Box::new(RawPostFileSource::new(path)));
    }
    let (signals, collect_stats) = collect_signals(&sources).await;
    info!(?collect_stats, "Signals collected");

    let co_memory_path = co_memory.unwrap_or_else(|| config.co_memory_path.clone());
    let memory = load_co_occurrence_or_empty(&co_memory_path);

    let pipeline = Pipeline::new(pipeline_config, &registry)?;
    let output = pipeline.run(signals, memory)?;

    let out_dir = out.unwrap_or_else(|| config.data_dir.join("output"));
    export_all(&out_dir, &output)
        .with_context(|| format!("Failed to export run to {}", out_dir.display()))?;
    save_co_occurrence(&co_memory_path, &output.co_occurrence)
        .context("Failed to persist co-occurrence memory")?;

    info!("Signal run complete. {}", output.stats);
    Ok(())
}
