//! sgds-geno: input readers for sgds
//!
//! Provides the DosageReader trait with a plain-text implementation, and
//! the parser for fitted null-model tables.

pub mod null_fit;
pub mod text;
pub mod traits;

pub use null_fit::{parse_null_fit_table, NullFitColumns, NullFitTable};
pub use text::TextDosageReader;
pub use traits::{DosageReader, VariantDosages};
