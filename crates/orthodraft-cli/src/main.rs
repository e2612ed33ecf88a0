//! orthodraft CLI - compose technical-drawing views from a TOML description.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use orthodraft::taxonomy::kind_counts;
use orthodraft::{project_shape, DrawingConfig};
use serde::Serialize;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "orthodraft")]
#[command(about = "Project shapes into laid-out technical-drawing views", long_about = None)]
struct Cli {
    /// Log at debug level
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compose the primary and secondary views and lay them out
    Compose {
        /// Drawing description (.toml)
        input: PathBuf,
        /// Output JSON file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Indent the JSON output
        #[arg(long)]
        pretty: bool,
    },
    /// Project the shape onto the primary view only
    Project {
        /// Drawing description (.toml)
        input: PathBuf,
        /// Output JSON file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Indent the JSON output
        #[arg(long)]
        pretty: bool,
    },
    /// Display statistics about the described shape
    Info {
        /// Drawing description (.toml)
        input: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::WARN
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(level.into()))
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Compose {
            input,
            output,
            pretty,
        } => {
            let config = load(&input)?;
            let drawing = config.compose()?;
            info!(views = drawing.views.len(), "composed drawing");
            write_json(&drawing, output.as_deref(), pretty)?;
        }
        Commands::Project {
            input,
            output,
            pretty,
        } => {
            let config = load(&input)?;
            let shape = Arc::new(config.shape.build()?);
            let view = project_shape(shape, &config.primary, &config.settings)?;
            write_json(&view, output.as_deref(), pretty)?;
        }
        Commands::Info { input } => {
            show_info(&input)?;
        }
    }

    Ok(())
}

fn load(path: &Path) -> Result<DrawingConfig> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let config = DrawingConfig::from_toml_str(&text)
        .with_context(|| format!("invalid drawing description {}", path.display()))?;
    Ok(config)
}

fn write_json<T: Serialize>(value: &T, output: Option<&Path>, pretty: bool) -> Result<()> {
    let json = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    match output {
        Some(path) => {
            fs::write(path, json)?;
            eprintln!("Wrote {}", path.display());
        }
        None => println!("{json}"),
    }
    Ok(())
}

fn show_info(path: &Path) -> Result<()> {
    let config = load(path)?;
    let shape = config.shape.build()?;
    let stats = shape.stats();
    let (min, max) = shape.bounds();

    println!("File: {}", path.display());
    println!("Bodies: {}", stats.bodies);
    println!("Faces: {}", stats.faces);
    println!("Edges: {}", stats.edges);
    println!("Vertices: {}", stats.vertices);
    println!(
        "Bounds: [{:.3}, {:.3}, {:.3}] - [{:.3}, {:.3}, {:.3}]",
        min.x, min.y, min.z, max.x, max.y, max.z
    );
    println!();
    println!("Edge kinds:");
    for (kind, count) in kind_counts(&shape, &config.settings) {
        println!("  {kind:?}: {count}");
    }
    Ok(())
}
