//! Headless reactor classifier
//!
//! Loads a layout file, classifies it, and prints the result as text or JSON.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, ValueEnum};
use reactorsim_core::{RunResult, SimError, classify};
use reactorsim_data::{DataLoadError, format_device, format_layout, load_layout};
use tracing::info;

/// Headless reactor classifier
#[derive(Parser, Debug)]
#[command(name = "reactorsim")]
#[command(about = "Simulate a reactor layout and rate how long it survives")]
struct Args {
    /// Layout file (.grid, .txt, .ron, .toml, or .json)
    layout: PathBuf,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,

    /// Print the layout with per-cell heat after the first tick
    #[arg(long)]
    dump: bool,

    /// Override ticks per fuel cycle
    #[arg(long)]
    fuel_ticks: Option<u32>,

    /// Override the absolute tick cap for every run
    #[arg(long)]
    timeout_ticks: Option<u32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("failed to load {path}: {source}")]
    Load {
        path: PathBuf,
        #[source]
        source: DataLoadError,
    },

    #[error(transparent)]
    Simulation(#[from] SimError),

    #[error("failed to encode result: {0}")]
    Json(#[from] serde_json::Error),
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("reactorsim=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args) -> Result<(), CliError> {
    let load_error = |source| CliError::Load {
        path: args.layout.clone(),
        source,
    };

    let mut loaded = load_layout(&args.layout).map_err(load_error)?;
    if let Some(fuel_ticks) = args.fuel_ticks {
        loaded.limits.fuel_ticks = fuel_ticks;
    }
    if let Some(timeout_ticks) = args.timeout_ticks {
        loaded.limits.timeout_ticks = timeout_ticks;
    }
    let device = loaded.to_device().map_err(load_error)?;

    info!(
        layout = %args.layout.display(),
        width = device.width(),
        fuel_ticks = loaded.limits.fuel_ticks,
        "classifying"
    );
    let result = classify(&device)?;

    match args.format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&result)?),
        OutputFormat::Text => {
            print!("{}", format_layout(&loaded.layout));
            println!();
            print!("{}", render_text(&result));
        }
    }

    if args.dump {
        let mut preview = device.clone();
        preview.initialize_simulation();
        preview.run_tick();
        println!();
        print!("{}", format_device(&preview));
    }
    Ok(())
}

fn render_text(r: &RunResult) -> String {
    let opt = |v: Option<u32>| v.map_or_else(|| "-".to_string(), |v| v.to_string());
    let mark = r.mark.map_or_else(|| "-".to_string(), |m| m.to_string());
    format!(
        "mark: {mark}\n\
         efficiency: {:.2}\n\
         total EU per cycle: {}\n\
         EU per tick: {}\n\
         overall EU per tick: {}\n\
         uses single-use coolant: {}\n\
         timed out: {}\n\
         cooldown ticks: {}\n\
         cycle ticks: {}\n\
         iterations before failure: {}\n\
         ticks until meltdown: {}\n\
         ticks until component failure: {}\n\
         total cost: {}\n",
        r.efficiency,
        r.total_eu_per_cycle,
        r.eu_per_tick,
        r.overall_eu_per_tick,
        r.uses_single_use_coolant,
        r.timed_out,
        r.cooldown_ticks,
        opt(r.cycle_ticks),
        opt(r.num_iterations_before_failure),
        opt(r.ticks_until_meltdown),
        opt(r.ticks_until_component_failure),
        r.total_cost,
    )
}
