//! Tab-separated result lines.

use std::io::{self, Write};

use super::VariantResult;
use crate::model::TraitType;

/// Header line for results of the given trait type.
pub fn write_results_header(writer: &mut impl Write, trait_type: TraitType) -> io::Result<()> {
    match trait_type {
        TraitType::Quantitative => writeln!(
            writer,
            "MarkerID\tAC_Allele2\tAF_Allele2\tN\tBETA\tSE\tp.value"
        ),
        TraitType::Binary => writeln!(
            writer,
            "MarkerID\tAC_Allele2\tAF_Allele2\tN\tBETA\tSE\tp.value\tp.value.NA\tIs.SPA.converge"
        ),
    }
}

/// Write a single result line. Non-finite values are written as `NA`.
pub fn write_result_line(
    writer: &mut impl Write,
    marker_id: &str,
    result: &VariantResult,
) -> io::Result<()> {
    match result {
        VariantResult::Quantitative(r) => writeln!(
            writer,
            "{}\t{}\t{}\t{}\t{}\t{}\t{}",
            marker_id,
            fmt_value(r.ac),
            fmt_value(r.af),
            r.n,
            fmt_value(r.beta),
            fmt_value(r.se),
            fmt_value(r.pvalue),
        ),
        VariantResult::Binary(r) => writeln!(
            writer,
            "{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}",
            marker_id,
            fmt_value(r.ac),
            fmt_value(r.af),
            r.n,
            fmt_value(r.beta),
            fmt_value(r.se),
            fmt_value(r.pvalue),
            fmt_value(r.pvalue_noadj),
            if r.converged { 1 } else { 0 },
        ),
    }
}

fn fmt_value(v: f64) -> String {
    if v.is_finite() {
        format!("{}", v)
    } else {
        "NA".to_string()
    }
}
