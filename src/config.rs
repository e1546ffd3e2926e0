//! Correlation parameters.
//!
//! Everything the engine treats as a constant (distance threshold, caller
//! set, pass order, chromosome table) lives here and is passed in, so tests
//! can run against synthetic caller sets.

use crate::breakpoint::{CallerId, IndelType};
use crate::genome::ChromOrder;
use crate::tsv::MetalError;
use rustc_hash::FxHashSet;

/// Default distance threshold. Positions must differ by strictly less.
pub const DEFAULT_DISTANCE: u64 = 3;

/// A variant-calling tool taking part in correlation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallerSpec {
    pub name: String,
    /// Low-specificity callers cannot corroborate each other's insertions.
    pub low_specificity: bool,
}

impl CallerSpec {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            low_specificity: false,
        }
    }

    /// Mark as low-specificity (builder pattern).
    pub fn low_specificity(mut self) -> Self {
        self.low_specificity = true;
        self
    }
}

/// Ordered set of callers. Order fixes `CallerId`s and merge tie-breaks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallerSet {
    callers: Vec<CallerSpec>,
}

impl Default for CallerSet {
    fn default() -> Self {
        Self::standard()
    }
}

impl CallerSet {
    pub fn new(callers: Vec<CallerSpec>) -> Self {
        Self { callers }
    }

    /// Scotch, DeepVariant, GATK-HC, VarScan and Pindel-L; Scotch and
    /// Pindel-L are low-specificity.
    pub fn standard() -> Self {
        Self::new(vec![
            CallerSpec::new("Scotch").low_specificity(),
            CallerSpec::new("DeepVariant"),
            CallerSpec::new("GATK-HC"),
            CallerSpec::new("VarScan"),
            CallerSpec::new("Pindel-L").low_specificity(),
        ])
    }

    #[inline]
    pub fn get(&self, id: CallerId) -> Option<&CallerSpec> {
        self.callers.get(id.index())
    }

    /// Caller name, or `?` for an id outside the set.
    #[inline]
    pub fn name(&self, id: CallerId) -> &str {
        self.get(id).map(|c| c.name.as_str()).unwrap_or("?")
    }

    #[inline]
    pub fn is_low_specificity(&self, id: CallerId) -> bool {
        self.get(id).is_some_and(|c| c.low_specificity)
    }

    /// Look up a caller by name.
    pub fn id_of(&self, name: &str) -> Option<CallerId> {
        self.callers
            .iter()
            .position(|c| c.name == name)
            .map(CallerId)
    }

    pub fn iter(&self) -> impl Iterator<Item = (CallerId, &CallerSpec)> {
        self.callers
            .iter()
            .enumerate()
            .map(|(i, c)| (CallerId(i), c))
    }

    pub fn len(&self) -> usize {
        self.callers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.callers.is_empty()
    }
}

/// Full engine configuration.
#[derive(Debug, Clone)]
pub struct CorrelateConfig {
    /// Calls correlate when their positions differ by less than this
    pub distance: u64,
    /// Participating callers
    pub callers: CallerSet,
    /// Passes to run, in order
    pub indel_types: Vec<IndelType>,
    /// Chromosome ranking used by the merge scheduler
    pub chrom_order: ChromOrder,
}

impl Default for CorrelateConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl CorrelateConfig {
    pub fn new() -> Self {
        Self {
            distance: DEFAULT_DISTANCE,
            callers: CallerSet::standard(),
            indel_types: IndelType::ALL.to_vec(),
            chrom_order: ChromOrder::human(),
        }
    }

    pub fn with_distance(mut self, distance: u64) -> Self {
        self.distance = distance;
        self
    }

    pub fn with_callers(mut self, callers: CallerSet) -> Self {
        self.callers = callers;
        self
    }

    pub fn with_indel_types(mut self, indel_types: Vec<IndelType>) -> Self {
        self.indel_types = indel_types;
        self
    }

    pub fn with_chrom_order(mut self, chrom_order: ChromOrder) -> Self {
        self.chrom_order = chrom_order;
        self
    }

    /// Reject configurations the engine cannot run with.
    pub fn validate(&self) -> Result<(), MetalError> {
        if self.distance == 0 {
            return Err(MetalError::Config(
                "distance threshold must be at least 1".to_string(),
            ));
        }
        if self.callers.is_empty() {
            return Err(MetalError::Config("no callers configured".to_string()));
        }
        let mut seen = FxHashSet::default();
        for (_, caller) in self.callers.iter() {
            if caller.name.is_empty() || caller.name.contains(',') {
                return Err(MetalError::Config(format!(
                    "invalid caller name '{}'",
                    caller.name
                )));
            }
            if !seen.insert(caller.name.as_str()) {
                return Err(MetalError::Config(format!(
                    "caller '{}' configured twice",
                    caller.name
                )));
            }
        }
        let mut types = FxHashSet::default();
        for t in &self.indel_types {
            if !types.insert(*t) {
                return Err(MetalError::Config(format!("indel type {} listed twice", t)));
            }
        }
        Ok(())
    }
}
