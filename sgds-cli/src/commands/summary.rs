//! Print a prepared model's summary.
//!
//! sgds summary --model-file ...

use std::path::Path;

use anyhow::{Context, Result};
use clap::Args;

use sgds_core::model::serialization::{load_model, model_summary};

#[derive(Args)]
pub struct SummaryArgs {
    /// Model file from `sgds prepare` (.sgds.model)
    #[arg(long)]
    model_file: String,
}

pub fn run(args: SummaryArgs) -> Result<()> {
    let model = load_model(Path::new(&args.model_file))
        .with_context(|| format!("Failed to load model {}", args.model_file))?;

    println!("Model: {}", args.model_file);
    println!("{}", model_summary(&model));

    Ok(())
}
