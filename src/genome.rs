//! Chromosome ordering for merge comparison.
//!
//! The default table ranks the human autosomes numerically, then X, then Y.
//! A custom order can be loaded from a genome or `.fai` file (first column
//! is the chromosome name; ranking follows file order).

use rustc_hash::FxHashMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use crate::tsv::MetalError;

/// Maps chromosome names to their rank in the merge order.
#[derive(Debug, Clone)]
pub struct ChromOrder {
    /// Name (without any `chr` prefix) to 1-based ordinal
    ordinals: FxHashMap<String, u32>,
    /// Names in rank order
    order: Vec<String>,
}

impl Default for ChromOrder {
    fn default() -> Self {
        Self::human()
    }
}

impl ChromOrder {
    /// The standard table: "1".."22" -> 1..22, "X" -> 23, "Y" -> 24.
    pub fn human() -> Self {
        let names = (1..=22)
            .map(|n: u32| n.to_string())
            .chain(["X".to_string(), "Y".to_string()]);
        Self::from_names(names)
    }

    /// Build an order from names given in rank order. Duplicates keep their first rank.
    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut ordinals = FxHashMap::default();
        let mut order = Vec::new();
        for name in names {
            let name = name.into();
            let key = strip_chr(&name).to_string();
            if ordinals.contains_key(&key) {
                continue;
            }
            order.push(name);
            ordinals.insert(key, order.len() as u32);
        }
        Self { ordinals, order }
    }

    /// Load an order from a genome/fai-style file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, MetalError> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| MetalError::io(e, path))?;
        let reader = BufReader::new(file);
        let mut names = Vec::new();

        for (line_num, line_result) in reader.lines().enumerate() {
            let line = line_result?;
            let line = line.trim();

            // Skip empty lines and comments
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let name = line.split('\t').next().unwrap_or("").trim();
            if name.is_empty() {
                return Err(MetalError::Parse {
                    line: line_num + 1,
                    message: "Genome file line has no chromosome name".to_string(),
                });
            }
            names.push(name.to_string());
        }

        if names.is_empty() {
            return Err(MetalError::Config(format!(
                "genome file {} lists no chromosomes",
                path.display()
            )));
        }

        Ok(Self::from_names(names))
    }

    /// Rank of a chromosome. Names not in the table rank after every known one.
    #[inline]
    pub fn ordinal(&self, chrom: &str) -> u32 {
        self.ordinals
            .get(strip_chr(chrom))
            .copied()
            .unwrap_or(self.unknown_ordinal())
    }

    /// Ordinal shared by all chromosomes missing from the table.
    #[inline]
    pub fn unknown_ordinal(&self) -> u32 {
        self.order.len() as u32 + 1
    }

    /// Check if a chromosome is in the table.
    #[inline]
    pub fn has_chrom(&self, chrom: &str) -> bool {
        self.ordinals.contains_key(strip_chr(chrom))
    }

    /// Get all chromosome names in order.
    pub fn chromosomes(&self) -> impl Iterator<Item = &String> {
        self.order.iter()
    }

    /// Get number of chromosomes.
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Check if empty.
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

#[inline]
fn strip_chr(name: &str) -> &str {
    name.strip_prefix("chr").unwrap_or(name)
}
