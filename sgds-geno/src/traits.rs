//! Core traits for dosage reading.

use std::collections::HashMap;

use anyhow::{bail, Result};

/// Dosages of one variant across the selected samples.
#[derive(Debug, Clone)]
pub struct VariantDosages {
    /// Variant ID as given in the file.
    pub id: String,
    /// Alt-allele dosages in `[0, 2]`. Missing values are NaN.
    pub dosages: Vec<f64>,
}

/// Sequential source of per-variant dosage vectors.
///
/// Readers hand out raw dosages; imputation and allele flipping happen in
/// the score tests.
pub trait DosageReader: Send {
    /// Sample IDs of the file, in file order.
    fn sample_ids(&self) -> &[String];

    /// Restrict and reorder subsequent reads to these samples. Every ID
    /// must be present in the file.
    fn set_sample_subset(&mut self, ids: &[String]) -> Result<()>;

    /// Number of samples in each returned dosage vector.
    fn n_samples(&self) -> usize;

    /// Next variant, or `None` at end of input.
    fn next_variant(&mut self) -> Result<Option<VariantDosages>>;
}

/// Column index in `file_ids` of each requested sample.
pub fn sample_order(file_ids: &[String], wanted: &[String]) -> Result<Vec<usize>> {
    let lookup: HashMap<&str, usize> = file_ids
        .iter()
        .enumerate()
        .map(|(i, id)| (id.as_str(), i))
        .collect();
    if lookup.len() != file_ids.len() {
        bail!("Dosage file has duplicate sample IDs");
    }

    let mut order = Vec::with_capacity(wanted.len());
    let mut missing = Vec::new();
    for id in wanted {
        match lookup.get(id.as_str()) {
            Some(&i) => order.push(i),
            None => missing.push(id.as_str()),
        }
    }
    if !missing.is_empty() {
        bail!(
            "{} sample(s) not found in dosage file, first: {}",
            missing.len(),
            missing[0]
        );
    }
    Ok(order)
}
