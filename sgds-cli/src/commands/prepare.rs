//! Prepare a model file from a fitted null model.
//!
//! sgds prepare --fit-file ... --trait-type binary --tau 1,0.3 --output-prefix ...

use std::path::Path;

use anyhow::{bail, Context, Result};
use clap::Args;
use tracing::{info, warn};

use sgds_core::model::serialization::{model_summary, save_model, save_model_json};
use sgds_core::model::{ModelBundle, ModelContext, TraitType};
use sgds_geno::{parse_null_fit_table, NullFitColumns};
use sgds_linalg::DenseMatrix;

#[derive(Args)]
pub struct PrepareArgs {
    /// Null-fit table: one row per sample with ID, outcome, fitted mean and covariates
    #[arg(long)]
    fit_file: String,

    /// Sample ID column name
    #[arg(long, default_value = "IID")]
    sample_id_col: String,

    /// Outcome column name
    #[arg(long, default_value = "y")]
    y_col: String,

    /// Fitted mean column name
    #[arg(long, default_value = "mu")]
    mu_col: String,

    /// Covariate column names (comma-separated); an intercept is always added
    #[arg(long, default_value = "")]
    covar_cols: String,

    /// Trait type: binary or quantitative
    #[arg(long, default_value = "binary")]
    trait_type: String,

    /// Variance components tau_e,tau_g
    #[arg(long, value_delimiter = ',', default_values_t = [1.0, 0.0])]
    tau: Vec<f64>,

    /// Variance ratio
    #[arg(long, default_value = "1.0")]
    variance_ratio: f64,

    /// Minimum MAF (NaN disables)
    #[arg(long, default_value = "NaN")]
    min_maf: f64,

    /// Minimum MAC (NaN disables)
    #[arg(long, default_value = "0.5")]
    min_mac: f64,

    /// Output file prefix; writes <prefix>.sgds.model
    #[arg(long)]
    output_prefix: String,

    /// Also write a JSON copy of the model
    #[arg(long, default_value = "false")]
    json: bool,
}

pub fn run(args: PrepareArgs) -> Result<()> {
    info!("=== sgds prepare ===");

    let trait_type: TraitType = args.trait_type.parse()?;
    let tau = match args.tau.as_slice() {
        &[tau_e, tau_g] => [tau_e, tau_g],
        other => bail!("--tau needs two values, got {}", other.len()),
    };

    let covar_cols: Vec<String> = args
        .covar_cols
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect();
    let cols = NullFitColumns {
        sample_id: &args.sample_id_col,
        y: &args.y_col,
        mu: &args.mu_col,
        covariates: &covar_cols,
    };
    let table = parse_null_fit_table(Path::new(&args.fit_file), &cols)?;

    let rows = table.complete_rows();
    if rows.len() < table.n_samples() {
        warn!(
            "Dropping {} of {} samples with missing values",
            table.n_samples() - rows.len(),
            table.n_samples()
        );
    }
    let table = table.subset(&rows);
    if trait_type == TraitType::Binary {
        if let Some(bad) = table.mu.iter().find(|&&m| m <= 0.0 || m >= 1.0) {
            bail!("Binary trait needs fitted means in (0, 1), found {}", bad);
        }
    }

    let (xdata, n, p) = table.design_matrix();
    let x = DenseMatrix::from_col_major(n, p, &xdata)?;
    info!("Design matrix: {} samples x {} columns", n, p);

    let bundle = ModelBundle::from_null_fit(
        trait_type,
        table.sample_ids.clone(),
        &x,
        &table.y,
        &table.mu,
        tau,
        args.variance_ratio,
        args.min_maf,
        args.min_mac,
    )
    .context("Failed to prepare model")?;

    // validate before writing
    ModelContext::new(bundle.clone()).context("Prepared model is invalid")?;

    let model_path = format!("{}.sgds.model", args.output_prefix);
    save_model(&bundle, Path::new(&model_path))
        .with_context(|| format!("Failed to write {}", model_path))?;
    info!("Model saved to {}", model_path);

    if args.json {
        let json_path = format!("{}.json", model_path);
        save_model_json(&bundle, Path::new(&json_path))
            .with_context(|| format!("Failed to write {}", json_path))?;
        info!("JSON copy saved to {}", json_path);
    }

    println!("{}", model_summary(&bundle));
    Ok(())
}
