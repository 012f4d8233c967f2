//! Risk matrix CLI - score, combine and render inherent/residual risk matrices

#![deny(warnings)]

// Global invariants enforced:
// - Deterministic output ordering
// - Identical input yields byte-for-byte identical output

use anyhow::Context;
use clap::{Parser, Subcommand};
use riskmatrix_core::observation::{load_inherent, load_residual, ResidualObservation};
use riskmatrix_core::report::render_heat_map_text;
use riskmatrix_core::{config, normalize, risk};
use riskmatrix_core::{analyze, render_csv, render_json, render_text, ResolvedConfig};
use std::path::{Path, PathBuf};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "riskmatrix")]
#[command(about = "Probability x impact risk scoring for inherent and residual risk views")]
#[command(version)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Combine inherent and residual observations into one record per risk
    Combine {
        #[command(flatten)]
        sources: Sources,

        /// Output format
        #[arg(long, default_value = "text")]
        format: OutputFormat,

        /// Pairing strategy for residual observations (overrides config file)
        #[arg(long)]
        join: Option<JoinArg>,
    },
    /// Render the heat-map occupancy for one view
    Matrix {
        #[command(flatten)]
        sources: Sources,

        /// Which observations to place on the grid
        #[arg(long, default_value = "inherent")]
        view: View,

        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: OutputFormat,
    },
    /// Band distribution and inherent-to-residual movement as JSON
    Summary {
        #[command(flatten)]
        sources: Sources,
    },
    /// Score a single probability/impact pair (1-based levels)
    Score {
        #[arg(allow_hyphen_values = true)]
        probability: i64,
        #[arg(allow_hyphen_values = true)]
        impact: i64,
    },
    /// Validate or show a configuration file
    #[command(name = "config")]
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(clap::Args)]
struct Sources {
    /// JSON file with inherent observations
    #[arg(long)]
    inherent: PathBuf,

    /// JSON file with residual observations
    #[arg(long)]
    residual: Option<PathBuf>,

    /// Path to config file (default: auto-discover)
    #[arg(long)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Validate a config file
    Validate {
        /// Path to config file (default: auto-discover from current directory)
        #[arg(long)]
        path: Option<PathBuf>,
    },
    /// Show the resolved configuration (merged defaults + config file)
    Show {
        /// Path to config file (default: auto-discover from current directory)
        #[arg(long)]
        path: Option<PathBuf>,
    },
}

#[derive(Clone, Copy, clap::ValueEnum)]
enum OutputFormat {
    Text,
    Json,
    Csv,
}

#[derive(Clone, Copy, clap::ValueEnum)]
enum View {
    Inherent,
    Residual,
}

#[derive(Clone, Copy, clap::ValueEnum)]
enum JoinArg {
    Positional,
    EventId,
}

impl From<JoinArg> for riskmatrix_core::JoinStrategy {
    fn from(arg: JoinArg) -> Self {
        match arg {
            JoinArg::Positional => riskmatrix_core::JoinStrategy::Positional,
            JoinArg::EventId => riskmatrix_core::JoinStrategy::EventId,
        }
    }
}

fn init_tracing(verbose: u8) {
    let filter = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Combine {
            sources,
            format,
            join,
        } => {
            let mut resolved_config = resolve_config(sources.config.as_deref())?;
            // CLI flags override config file values
            if let Some(join) = join {
                resolved_config.join = join.into();
            }
            let (inherent, residual) = load_sources(&sources)?;
            let view = analyze(&inherent, &residual, &resolved_config);

            for diagnostic in &view.diagnostics {
                eprintln!(
                    "warning: {}",
                    serde_json::to_string(diagnostic).context("failed to encode diagnostic")?
                );
            }

            match format {
                OutputFormat::Text => print!("{}", render_text(&view.records)),
                OutputFormat::Json => println!("{}", render_json(&view.records)),
                OutputFormat::Csv => print!("{}", render_csv(&view.records)),
            }
        }
        Commands::Matrix {
            sources,
            view,
            format,
        } => {
            let resolved_config = resolve_config(sources.config.as_deref())?;
            let (inherent, residual) = load_sources(&sources)?;
            let result = analyze(&inherent, &residual, &resolved_config);
            let cells = match view {
                View::Inherent => &result.inherent_heat_map,
                View::Residual => &result.residual_heat_map,
            };

            match format {
                OutputFormat::Text => print!("{}", render_heat_map_text(cells)),
                OutputFormat::Json => println!(
                    "{}",
                    serde_json::to_string_pretty(cells).context("failed to encode heat map")?
                ),
                OutputFormat::Csv => anyhow::bail!("--format csv is not supported for matrix"),
            }
        }
        Commands::Summary { sources } => {
            let resolved_config = resolve_config(sources.config.as_deref())?;
            let (inherent, residual) = load_sources(&sources)?;
            let view = analyze(&inherent, &residual, &resolved_config);
            println!(
                "{}",
                serde_json::to_string_pretty(&view.aggregates)
                    .context("failed to encode summary")?
            );
        }
        Commands::Score {
            probability,
            impact,
        } => {
            let resolved_config = resolve_config(None)?;
            let p = normalize::normalize(probability);
            let i = normalize::normalize(impact);
            match risk::assess(p, i, &resolved_config.thresholds) {
                Some(score) => println!(
                    "{} x {} -> {} ({})",
                    resolved_config.labels.probability_label(p),
                    resolved_config.labels.impact_label(i),
                    score.value,
                    score.band.label()
                ),
                None => {
                    println!("N/A");
                    eprintln!("warning: levels must be non-negative integers");
                }
            }
        }
        Commands::Config { action } => handle_config(action)?,
    }

    Ok(())
}

/// Resolve configuration from an explicit path or the current directory
fn resolve_config(config_path: Option<&Path>) -> anyhow::Result<ResolvedConfig> {
    let project_root = std::env::current_dir()?;
    let resolved = config::load_and_resolve(&project_root, config_path)
        .context("failed to load configuration")?;
    if let Some(path) = &resolved.config_path {
        tracing::info!(path = %path.display(), "using config");
    }
    Ok(resolved)
}

fn load_sources(
    sources: &Sources,
) -> anyhow::Result<(
    Vec<riskmatrix_core::InherentObservation>,
    Vec<ResidualObservation>,
)> {
    let inherent = load_inherent(&sources.inherent)?;
    let residual = match &sources.residual {
        Some(path) => load_residual(path)?,
        None => Vec::new(),
    };
    tracing::info!(
        inherent = inherent.len(),
        residual = residual.len(),
        "loaded observations"
    );
    Ok((inherent, residual))
}

fn handle_config(action: ConfigAction) -> anyhow::Result<()> {
    match action {
        ConfigAction::Validate { path } => {
            let project_root = std::env::current_dir()?;
            match path {
                Some(p) => {
                    config::load_config_file(&p)?;
                    println!("Config valid: {}", p.display());
                }
                None => match config::discover_config(&project_root)? {
                    Some((_, p)) => println!("Config valid: {}", p.display()),
                    None => println!("No config file found (using defaults)"),
                },
            }
        }
        ConfigAction::Show { path } => {
            let resolved = resolve_config(path.as_deref())?;
            match &resolved.config_path {
                Some(p) => println!("Config file: {}", p.display()),
                None => println!("Config file: (none, using defaults)"),
            }
            println!();
            println!("Band thresholds:");
            println!("  medium:   {}", resolved.thresholds.medium);
            println!("  high:     {}", resolved.thresholds.high);
            println!("  critical: {}", resolved.thresholds.critical);
            println!();
            println!("Probability labels: {}", resolved.labels.probability.join(", "));
            println!("Impact labels:      {}", resolved.labels.impact.join(", "));
            println!();
            println!("Join:             {}", resolved.join.as_str());
            println!("Placeholder name: {}", resolved.placeholder_name);
        }
    }
    Ok(())
}
