//! Model serialization and deserialization.
//!
//! Binary files are bincode-encoded [`ModelBundle`]s whose first fields
//! are the magic bytes (SGDS) and a format version. A pretty JSON sidecar
//! can be written next to them for human inspection.

use std::path::Path;

use super::bundle::ModelBundle;
use super::ModelError;

/// Save a model bundle to a binary file (.sgds.model).
pub fn save_model(bundle: &ModelBundle, path: &Path) -> Result<(), ModelError> {
    let encoded = bincode::serialize(bundle)?;
    std::fs::write(path, encoded)?;
    Ok(())
}

/// Load a model bundle from a binary file, checking magic bytes and version.
pub fn load_model(path: &Path) -> Result<ModelBundle, ModelError> {
    let data = std::fs::read(path)?;
    let bundle: ModelBundle = bincode::deserialize(&data)?;

    if bundle.magic != ModelBundle::MAGIC {
        return Err(ModelError::BadMagic {
            expected: ModelBundle::MAGIC,
            got: bundle.magic,
        });
    }
    if bundle.version != ModelBundle::VERSION {
        return Err(ModelError::UnsupportedVersion(bundle.version));
    }

    Ok(bundle)
}

/// Save a JSON sidecar for debugging (.sgds.model.json).
pub fn save_model_json(bundle: &ModelBundle, path: &Path) -> Result<(), ModelError> {
    let json = serde_json::to_string_pretty(bundle)?;
    std::fs::write(path, json)?;
    Ok(())
}

/// Summary of a model bundle (for display).
pub fn model_summary(bundle: &ModelBundle) -> String {
    format!(
        "sgds null model v{}\n\
         Trait type: {:?}\n\
         Samples: {}\n\
         Coefficients: {}\n\
         Tau: [{:.6}, {:.6}]\n\
         Variance ratio: {:.4}\n\
         N_eff: {:.1}\n\
         MAF filter: {}\n\
         MAC filter: {}",
        bundle.version,
        bundle.trait_type,
        bundle.n_samples(),
        bundle.n_coeff,
        bundle.tau[0],
        bundle.tau[1],
        bundle.var_ratio,
        bundle.n_eff(),
        describe_threshold(bundle.maf),
        describe_threshold(bundle.mac),
    )
}

fn describe_threshold(t: f64) -> String {
    if t < 0.0 {
        "off".to_string()
    } else {
        format!(">= {}", t)
    }
}
