//! Plain-text dosage matrix reader.
//!
//! Format: a header line `ID<TAB>sample1<TAB>sample2...` followed by one
//! line per variant, `variant_id<TAB>d1<TAB>d2...`. Lines starting with
//! `##` are comments. Missing dosages are `NA` or `.`. Whitespace other
//! than tabs is accepted as a delimiter when the header has no tab.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use anyhow::{anyhow, bail, Context, Result};
use tracing::debug;

use crate::null_fit::parse_value;
use crate::traits::{sample_order, DosageReader, VariantDosages};

/// Streaming reader for text dosage matrices.
pub struct TextDosageReader<R> {
    input: R,
    sample_ids: Vec<String>,
    /// File columns to emit, in output order.
    sample_subset: Option<Vec<usize>>,
    tab: bool,
    line_num: usize,
    line: String,
}

impl TextDosageReader<BufReader<File>> {
    /// Open a dosage file and read its header.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)
            .with_context(|| format!("Failed to open dosage file: {}", path.display()))?;
        Self::new(BufReader::new(file))
    }
}

impl<R: BufRead> TextDosageReader<R> {
    pub fn new(mut input: R) -> Result<Self> {
        let mut line = String::new();
        let mut line_num = 0;
        loop {
            line.clear();
            if input.read_line(&mut line)? == 0 {
                bail!("Dosage file has no header line");
            }
            line_num += 1;
            if !line.starts_with("##") && !line.trim().is_empty() {
                break;
            }
        }

        let tab = line.contains('\t');
        let mut fields = split_fields(line.trim_end_matches(['\n', '\r']), tab);
        if fields.next().is_none() {
            bail!("Dosage file header is empty");
        }
        let sample_ids: Vec<String> = fields.map(str::to_string).collect();
        debug!("Dosage file header: {} samples", sample_ids.len());

        Ok(Self {
            input,
            sample_ids,
            sample_subset: None,
            tab,
            line_num,
            line: String::new(),
        })
    }

    fn parse_line(&self) -> Result<VariantDosages> {
        let mut fields = split_fields(self.line.trim_end_matches(['\n', '\r']), self.tab);
        let id = fields
            .next()
            .ok_or_else(|| anyhow!("Line {}: missing variant ID", self.line_num))?
            .to_string();
        let values: Vec<f64> = fields.map(parse_value).collect();
        if values.len() != self.sample_ids.len() {
            bail!(
                "Line {} (variant {}): {} dosages, header has {} samples",
                self.line_num,
                id,
                values.len(),
                self.sample_ids.len()
            );
        }

        let dosages = match &self.sample_subset {
            Some(order) => order.iter().map(|&i| values[i]).collect(),
            None => values,
        };
        Ok(VariantDosages { id, dosages })
    }
}

impl<R: BufRead + Send> DosageReader for TextDosageReader<R> {
    fn sample_ids(&self) -> &[String] {
        &self.sample_ids
    }

    fn set_sample_subset(&mut self, ids: &[String]) -> Result<()> {
        self.sample_subset = Some(sample_order(&self.sample_ids, ids)?);
        Ok(())
    }

    fn n_samples(&self) -> usize {
        self.sample_subset
            .as_ref()
            .map_or(self.sample_ids.len(), Vec::len)
    }

    fn next_variant(&mut self) -> Result<Option<VariantDosages>> {
        loop {
            self.line.clear();
            if self.input.read_line(&mut self.line)? == 0 {
                return Ok(None);
            }
            self.line_num += 1;
            if self.line.starts_with("##") || self.line.trim().is_empty() {
                continue;
            }
            return self.parse_line().map(Some);
        }
    }
}

fn split_fields(line: &str, tab: bool) -> Box<dyn Iterator<Item = &str> + '_> {
    if tab {
        Box::new(line.split('\t').map(str::trim))
    } else {
        Box::new(line.split_whitespace())
    }
}
