//! Multi-caller breakpoint correlation.
//!
//! Streams every caller's sorted breakpoint calls side by side and records,
//! for each call, which other callers made a call close enough to
//! corroborate it. Calls with at least one corroborating caller are
//! emitted once, annotated with the full list of callers.
//!
//! Algorithm, run once per indel type:
//! 1. Rewind every source and seed one cursor per caller with its first call
//!    of that type.
//! 2. Seed phase: each cursor in caller order takes a turn as the newest and
//!    is compared against every other cursor.
//! 3. Steady state: pick the non-exhausted cursor with the smallest
//!    (chromosome ordinal, position), ties broken by caller order. Flush its
//!    call if it has correlates, advance it, and compare the new call against
//!    every other live cursor. A cursor that cannot advance is marked
//!    exhausted and the next smallest takes its place.
//! 4. When every cursor is exhausted, flush whatever is still pending.
//!
//! Memory: O(callers). Only the current call of each source is held.
//!
//! REQUIREMENT: each source must be sorted by (chromosome ordinal, position).
//! Unsorted input is not detected unless the source validates it, and
//! silently produces wrong correlations.

use crate::breakpoint::{BreakpointCall, CalledRecord, IndelType};
use crate::config::CorrelateConfig;
use crate::streaming::cursor::ReaderCursor;
use crate::streaming::output::RecordSink;
use crate::streaming::source::BreakpointSource;
use crate::tsv::{MetalError, Result};
use rustc_hash::FxHashSet;

/// Correlation command configuration.
#[derive(Debug, Clone, Default)]
pub struct CorrelateCommand {
    pub config: CorrelateConfig,
}

impl CorrelateCommand {
    pub fn new() -> Self {
        Self {
            config: CorrelateConfig::new(),
        }
    }

    /// Use the given configuration (builder pattern).
    pub fn with_config(mut self, config: CorrelateConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the distance threshold (builder pattern).
    pub fn with_distance(mut self, distance: u64) -> Self {
        self.config.distance = distance;
        self
    }

    /// Run every configured pass, emitting annotated calls into `sink`.
    ///
    /// Passes are independent: sources are rewound before each one and no
    /// cursor state carries over.
    pub fn run<S, K>(&self, sources: &mut [S], sink: &mut K) -> Result<CorrelateStats>
    where
        S: BreakpointSource,
        K: RecordSink + ?Sized,
    {
        self.config.validate()?;
        self.check_sources(sources)?;

        let mut stats = CorrelateStats::default();
        for &indel_type in &self.config.indel_types {
            log::info!("Comparing calls of type {}", indel_type);
            for source in sources.iter_mut() {
                source.rewind()?;
            }
            let pass = self.run_pass(sources, indel_type, sink)?;
            log::info!(
                "Pass {}: {} calls read, {} records emitted",
                indel_type,
                pass.calls_read,
                pass.records_emitted
            );
            stats.add_pass(&pass);
        }
        Ok(stats)
    }

    /// Run every pass and collect the emitted records in memory.
    pub fn run_collect<S: BreakpointSource>(
        &self,
        sources: &mut [S],
    ) -> Result<(Vec<CalledRecord>, CorrelateStats)> {
        let mut records = Vec::new();
        let stats = self.run(sources, &mut records)?;
        Ok((records, stats))
    }

    /// At most one source per caller, and every caller must be configured.
    fn check_sources<S: BreakpointSource>(&self, sources: &[S]) -> Result<()> {
        let mut seen = FxHashSet::default();
        for source in sources {
            let caller = source.caller();
            if self.config.callers.get(caller).is_none() {
                return Err(MetalError::Config(format!(
                    "source {} has caller id {} outside the configured set of {}",
                    source.name(),
                    caller.index(),
                    self.config.callers.len()
                )));
            }
            if !seen.insert(caller) {
                return Err(MetalError::Config(format!(
                    "caller {} has more than one source",
                    self.config.callers.name(caller)
                )));
            }
        }
        Ok(())
    }

    /// One full merge-correlate cycle for a single indel type.
    ///
    /// Sources must already be positioned at their start.
    pub fn run_pass<S, K>(
        &self,
        sources: &mut [S],
        indel_type: IndelType,
        sink: &mut K,
    ) -> Result<PassStats>
    where
        S: BreakpointSource,
        K: RecordSink + ?Sized,
    {
        let mut cursors = sources
            .iter_mut()
            .map(|s| ReaderCursor::open(s, indel_type))
            .collect::<Result<Vec<_>>>()?;
        // caller order decides ties
        cursors.sort_by_key(|c| c.caller());

        let mut stats = PassStats::new(indel_type);

        // Seed phase: every seed value against every other seed value.
        for q in 0..cursors.len() {
            if cursors[q].is_exhausted() {
                continue;
            }
            mark_newest(&mut cursors, q);
            self.compare_newest(&mut cursors, q, &mut stats);
        }

        while let Some(newest) = self.advance_lowest(&mut cursors, sink, &mut stats)? {
            self.compare_newest(&mut cursors, newest, &mut stats);
        }

        stats.calls_read = cursors.iter().map(|c| c.calls_read()).sum();
        Ok(stats)
    }

    /// Advance the lowest non-exhausted cursor.
    ///
    /// Returns the index of the cursor that now holds a fresh call, or
    /// `None` once every cursor is exhausted (after flushing what remains).
    fn advance_lowest<S, K>(
        &self,
        cursors: &mut [ReaderCursor<'_, S>],
        sink: &mut K,
        stats: &mut PassStats,
    ) -> Result<Option<usize>>
    where
        S: BreakpointSource + ?Sized,
        K: RecordSink + ?Sized,
    {
        loop {
            let Some(lowest) = self.select_lowest(cursors) else {
                for cursor in cursors.iter_mut() {
                    self.flush(cursor, sink, stats)?;
                }
                return Ok(None);
            };

            // its value is about to be replaced
            self.flush(&mut cursors[lowest], sink, stats)?;

            if cursors[lowest].advance()? {
                mark_newest(cursors, lowest);
                return Ok(Some(lowest));
            }

            log::debug!(
                "{}: no more {} calls",
                cursors[lowest].source_name(),
                cursors[lowest].filter_for()
            );
        }
    }

    /// Index of the non-exhausted cursor with the smallest merge key.
    fn select_lowest<S>(&self, cursors: &[ReaderCursor<'_, S>]) -> Option<usize>
    where
        S: BreakpointSource + ?Sized,
    {
        cursors
            .iter()
            .enumerate()
            .filter_map(|(i, c)| c.sort_key(&self.config.chrom_order).map(|k| (k, i)))
            .min()
            .map(|(_, i)| i)
    }

    /// Compare the newest cursor's call against every other live cursor,
    /// recording correlates on both sides.
    fn compare_newest<S>(
        &self,
        cursors: &mut [ReaderCursor<'_, S>],
        newest: usize,
        stats: &mut PassStats,
    ) where
        S: BreakpointSource + ?Sized,
    {
        for other in 0..cursors.len() {
            if other == newest || cursors[other].is_exhausted() {
                continue;
            }
            let hit = match (cursors[newest].current(), cursors[other].current()) {
                (Some(query), Some(candidate)) => self.corroborates(query, candidate),
                _ => false,
            };
            if !hit {
                continue;
            }

            let query_caller = cursors[newest].caller();
            let other_caller = cursors[other].caller();
            let added_query = cursors[newest].add_correlate(other_caller);
            let added_other = cursors[other].add_correlate(query_caller);
            if added_query || added_other {
                stats.correlations += 1;
            }
        }
    }

    /// Whether two calls of the same pass corroborate each other.
    ///
    /// Calls must be on the same chromosome and closer than the distance
    /// threshold. Two low-specificity callers never corroborate each other's
    /// insertions; those need an independent caller.
    pub fn corroborates(&self, query: &BreakpointCall, other: &BreakpointCall) -> bool {
        if query.caller == other.caller || query.chrom != other.chrom {
            return false;
        }

        let callers = &self.config.callers;
        if query.indel_type == IndelType::Ins
            && callers.is_low_specificity(query.caller)
            && callers.is_low_specificity(other.caller)
        {
            return false;
        }

        query.pos.abs_diff(other.pos) < self.config.distance
    }

    /// Emit the cursor's current call if it has correlates and was not
    /// emitted before.
    fn flush<S, K>(
        &self,
        cursor: &mut ReaderCursor<'_, S>,
        sink: &mut K,
        stats: &mut PassStats,
    ) -> Result<()>
    where
        S: BreakpointSource + ?Sized,
        K: RecordSink + ?Sized,
    {
        if !cursor.needs_flush() {
            return Ok(());
        }
        let Some(call) = cursor.current() else {
            return Ok(());
        };

        let callers = &self.config.callers;
        let mut called_by = Vec::with_capacity(cursor.correlates().len() + 1);
        called_by.push(callers.name(cursor.caller()).to_string());
        called_by.extend(
            cursor
                .correlates()
                .iter()
                .map(|&c| callers.name(c).to_string()),
        );

        sink.emit(CalledRecord {
            call: call.clone(),
            called_by,
        })?;
        cursor.mark_flushed();
        stats.records_emitted += 1;
        Ok(())
    }
}

/// Exactly one cursor holds the newest flag.
fn mark_newest<S>(cursors: &mut [ReaderCursor<'_, S>], newest: usize)
where
    S: BreakpointSource + ?Sized,
{
    for (i, cursor) in cursors.iter_mut().enumerate() {
        cursor.set_newest(i == newest);
    }
}

/// Statistics for a single indel-type pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PassStats {
    pub indel_type: IndelType,
    /// Calls of this type read across all sources
    pub calls_read: usize,
    /// Annotated records emitted
    pub records_emitted: usize,
    /// Newly linked call pairs
    pub correlations: usize,
}

impl PassStats {
    pub fn new(indel_type: IndelType) -> Self {
        Self {
            indel_type,
            calls_read: 0,
            records_emitted: 0,
            correlations: 0,
        }
    }
}

/// Statistics from a correlation run.
#[derive(Debug, Clone, Default)]
pub struct CorrelateStats {
    /// Passes completed
    pub passes: usize,
    /// Calls read across all passes
    pub calls_read: usize,
    /// Records emitted across all passes
    pub records_emitted: usize,
    /// Newly linked call pairs across all passes
    pub correlations: usize,
    /// Per-pass breakdown in run order
    pub per_pass: Vec<PassStats>,
}

impl CorrelateStats {
    fn add_pass(&mut self, pass: &PassStats) {
        self.passes += 1;
        self.calls_read += pass.calls_read;
        self.records_emitted += pass.records_emitted;
        self.correlations += pass.correlations;
        self.per_pass.push(pass.clone());
    }

    /// Fraction of read calls that were corroborated.
    pub fn corroborated_fraction(&self) -> f64 {
        if self.calls_read == 0 {
            0.0
        } else {
            self.records_emitted as f64 / self.calls_read as f64
        }
    }
}

impl std::fmt::Display for CorrelateStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Passes: {}, Read: {}, Emitted: {}, Correlations: {}, Corroborated: {:.1}%",
            self.passes,
            self.calls_read,
            self.records_emitted,
            self.correlations,
            self.corroborated_fraction() * 100.0
        )
    }
}
