//! Sort validation for breakpoint streams.
//!
//! The correlation engine assumes every source is non-decreasing in
//! `(chromosome ordinal, position)`. Nothing checks this by default; a
//! violation silently skews correlation. Sources can opt in to an inline
//! check that turns the violation into an error at the offending record.

use crate::genome::ChromOrder;
use crate::tsv::MetalError;

/// Inline sort validator for use within streaming loops.
///
/// Validates that:
/// 1. Chromosomes appear in non-decreasing ordinal order
/// 2. Within a chromosome, positions are non-decreasing
///
/// Chromosomes that share an ordinal (names missing from the table) are
/// treated as one group, matching how the merge scheduler orders them.
#[derive(Debug, Default)]
pub struct SortValidator {
    prev_key: Option<(u32, u64)>,
    prev_chrom: String,
    record_count: usize,
}

impl SortValidator {
    /// Create a new sort validator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate that the given record maintains sort order.
    #[inline]
    pub fn validate(
        &mut self,
        order: &ChromOrder,
        chrom: &str,
        pos: u64,
        source: &str,
    ) -> Result<(), MetalError> {
        self.record_count += 1;
        let key = (order.ordinal(chrom), pos);

        if let Some(prev) = self.prev_key {
            if key < prev {
                let detail = if key.0 < prev.0 {
                    format!(
                        "chromosome '{}' at record {} comes after '{}'",
                        chrom, self.record_count, self.prev_chrom
                    )
                } else {
                    format!(
                        "position {} at record {} comes after {} on {}",
                        pos, self.record_count, prev.1, chrom
                    )
                };
                return Err(MetalError::Unsorted {
                    source_name: source.to_string(),
                    detail,
                });
            }
        }

        self.prev_key = Some(key);
        if self.prev_chrom != chrom {
            self.prev_chrom.clear();
            self.prev_chrom.push_str(chrom);
        }

        Ok(())
    }

    /// Reset validator state (when the source is rewound).
    pub fn reset(&mut self) {
        self.prev_key = None;
        self.prev_chrom.clear();
        self.record_count = 0;
    }

    /// Get the number of records validated.
    pub fn record_count(&self) -> usize {
        self.record_count
    }
}
