//! sgds: per-variant GLMM score tests.
//!
//! CLI entry point using clap for argument parsing.

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "sgds",
    version,
    about = "Single-variant GLMM score tests with saddle-point calibration",
    long_about = "Tests genotype dosages against a fitted generalized linear mixed null model.\n\
                   Supports quantitative and binary traits; binary results are recalibrated\n\
                   with a saddle-point approximation."
)]
struct Cli {
    /// Number of threads to use
    #[arg(long, default_value = "1", global = true)]
    threads: usize,

    /// Verbosity level (can be repeated: -v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build a model file from a fitted null model table
    Prepare(commands::prepare::PrepareArgs),

    /// Run single-variant score tests over a dosage file
    Test(commands::assoc_test::AssocTestArgs),

    /// Print a model file's summary
    Summary(commands::summary::SummaryArgs),
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_target(false)
        .init();

    rayon::ThreadPoolBuilder::new()
        .num_threads(cli.threads)
        .build_global()
        .ok();

    tracing::info!("sgds v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!("Using {} threads", cli.threads);

    match cli.command {
        Commands::Prepare(args) => commands::prepare::run(args),
        Commands::Test(args) => commands::assoc_test::run(args),
        Commands::Summary(args) => commands::summary::run(args),
    }
}
