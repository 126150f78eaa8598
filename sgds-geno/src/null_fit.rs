//! Fitted null-model table parser.
//!
//! Reads a tab/space-delimited file with one row per sample: sample ID,
//! outcome, fitted mean and covariate columns. The null model itself is
//! fitted elsewhere; this only ingests its output.

use std::path::Path;

use anyhow::{anyhow, bail, Context, Result};

/// Per-sample columns of a fitted null model.
#[derive(Debug, Clone)]
pub struct NullFitTable {
    /// Sample IDs in file order.
    pub sample_ids: Vec<String>,
    /// Outcome values (NaN for missing).
    pub y: Vec<f64>,
    /// Fitted means (NaN for missing).
    pub mu: Vec<f64>,
    /// Covariates: covariates[i][j] = sample i, covariate j.
    pub covariates: Vec<Vec<f64>>,
    /// Covariate column names.
    pub covariate_names: Vec<String>,
}

/// Column names to pick out of a null-fit table.
#[derive(Debug, Clone)]
pub struct NullFitColumns<'a> {
    pub sample_id: &'a str,
    pub y: &'a str,
    pub mu: &'a str,
    pub covariates: &'a [String],
}

/// Parse a null-fit table.
///
/// The delimiter is tab when the header contains one, otherwise runs of
/// spaces. Missing values (`NA`, `.`, empty) become NaN.
pub fn parse_null_fit_table(path: &Path, cols: &NullFitColumns<'_>) -> Result<NullFitTable> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read null-fit table: {}", path.display()))?;

    let mut lines = contents.lines();
    let header_line = lines
        .next()
        .ok_or_else(|| anyhow!("Empty null-fit table"))?;
    let tab = header_line.contains('\t');
    let split = |line: &str| -> Vec<String> {
        if tab {
            line.split('\t').map(|s| s.trim().to_string()).collect()
        } else {
            line.split_whitespace().map(str::to_string).collect()
        }
    };

    let headers = split(header_line);
    let find = |name: &str| -> Result<usize> {
        headers
            .iter()
            .position(|h| h == name)
            .ok_or_else(|| anyhow!("Column '{}' not found in header", name))
    };

    let id_idx = find(cols.sample_id)?;
    let y_idx = find(cols.y)?;
    let mu_idx = find(cols.mu)?;
    let covar_indices = cols
        .covariates
        .iter()
        .map(|name| find(name.as_str()))
        .collect::<Result<Vec<_>>>()?;
    let min_fields = covar_indices
        .iter()
        .copied()
        .chain([id_idx, y_idx, mu_idx])
        .max()
        .unwrap_or(0)
        + 1;

    let mut table = NullFitTable {
        sample_ids: Vec::new(),
        y: Vec::new(),
        mu: Vec::new(),
        covariates: Vec::new(),
        covariate_names: cols.covariates.to_vec(),
    };

    for (line_num, line) in lines.enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let fields = split(line);
        if fields.len() < min_fields {
            bail!(
                "Line {} has {} fields, expected at least {}",
                line_num + 2,
                fields.len(),
                min_fields
            );
        }

        table.sample_ids.push(fields[id_idx].clone());
        table.y.push(parse_value(&fields[y_idx]));
        table.mu.push(parse_value(&fields[mu_idx]));
        table
            .covariates
            .push(covar_indices.iter().map(|&ci| parse_value(&fields[ci])).collect());
    }

    if table.sample_ids.is_empty() {
        bail!("Null-fit table {} has no samples", path.display());
    }

    Ok(table)
}

/// Parse a string value to f64, treating NA/missing as NaN.
pub(crate) fn parse_value(s: &str) -> f64 {
    match s {
        "NA" | "na" | "Na" | "." | "" | "-" | "NaN" | "nan" => f64::NAN,
        _ => s.parse().unwrap_or(f64::NAN),
    }
}

impl NullFitTable {
    pub fn n_samples(&self) -> usize {
        self.sample_ids.len()
    }

    /// Indices of samples with finite outcome, fitted mean and covariates.
    pub fn complete_rows(&self) -> Vec<usize> {
        (0..self.n_samples())
            .filter(|&i| {
                self.y[i].is_finite()
                    && self.mu[i].is_finite()
                    && self.covariates[i].iter().all(|v| v.is_finite())
            })
            .collect()
    }

    /// Keep only the given rows, in the given order.
    pub fn subset(&self, rows: &[usize]) -> NullFitTable {
        NullFitTable {
            sample_ids: rows.iter().map(|&i| self.sample_ids[i].clone()).collect(),
            y: rows.iter().map(|&i| self.y[i]).collect(),
            mu: rows.iter().map(|&i| self.mu[i]).collect(),
            covariates: rows.iter().map(|&i| self.covariates[i].clone()).collect(),
            covariate_names: self.covariate_names.clone(),
        }
    }

    /// Design matrix (intercept + covariates) as a flat column-major vector.
    /// Returns (data, n_samples, n_covariates + 1).
    pub fn design_matrix(&self) -> (Vec<f64>, usize, usize) {
        let n = self.n_samples();
        let p = self.covariate_names.len() + 1;
        let mut x = vec![1.0; n * p];
        for (i, row) in self.covariates.iter().enumerate() {
            for (j, &v) in row.iter().enumerate() {
                x[(j + 1) * n + i] = v;
            }
        }
        (x, n, p)
    }
}
