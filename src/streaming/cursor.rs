//! Per-caller read cursor for one indel-type pass.
//!
//! A cursor holds exactly one call from its source (the "current" call)
//! together with the bookkeeping the scheduler needs for it: which other
//! callers corroborate it, and whether it has already been written out.

use crate::breakpoint::{BreakpointCall, CallerId, IndelType};
use crate::genome::ChromOrder;
use crate::streaming::source::BreakpointSource;
use crate::tsv::Result;

/// Stateful wrapper around one source, filtered to a single indel type.
pub struct ReaderCursor<'a, S: BreakpointSource + ?Sized> {
    source: &'a mut S,
    filter_for: IndelType,
    current: Option<BreakpointCall>,
    /// Corroborating callers in the order they were found, no duplicates
    correlates: Vec<CallerId>,
    flushed: bool,
    exhausted: bool,
    is_newest: bool,
    calls_read: usize,
}

impl<'a, S: BreakpointSource + ?Sized> ReaderCursor<'a, S> {
    /// Seed a cursor with the first call of `filter_for` type.
    ///
    /// The source is read from wherever it currently is; rewind it first.
    /// A source with no call of this type yields an already-exhausted cursor.
    pub fn open(source: &'a mut S, filter_for: IndelType) -> Result<Self> {
        let mut cursor = Self {
            source,
            filter_for,
            current: None,
            correlates: Vec::new(),
            flushed: false,
            exhausted: false,
            is_newest: false,
            calls_read: 0,
        };
        match cursor.pull()? {
            Some(call) => cursor.current = Some(call),
            None => cursor.exhausted = true,
        }
        Ok(cursor)
    }

    /// Next call of the filtered type; other types are skipped silently.
    fn pull(&mut self) -> Result<Option<BreakpointCall>> {
        while let Some(call) = self.source.next_call()? {
            if call.indel_type == self.filter_for {
                self.calls_read += 1;
                return Ok(Some(call));
            }
        }
        Ok(None)
    }

    /// Replace the current call with the next one.
    ///
    /// On success the correlate set and flushed flag start over. When the
    /// source has nothing left the cursor is marked exhausted and the stale
    /// current call is left in place.
    pub fn advance(&mut self) -> Result<bool> {
        if self.exhausted {
            return Ok(false);
        }
        match self.pull()? {
            Some(call) => {
                self.current = Some(call);
                self.correlates.clear();
                self.flushed = false;
                Ok(true)
            }
            None => {
                self.exhausted = true;
                Ok(false)
            }
        }
    }

    #[inline]
    pub fn current(&self) -> Option<&BreakpointCall> {
        self.current.as_ref()
    }

    #[inline]
    pub fn caller(&self) -> CallerId {
        self.source.caller()
    }

    #[inline]
    pub fn source_name(&self) -> &str {
        self.source.name()
    }

    #[inline]
    pub fn filter_for(&self) -> IndelType {
        self.filter_for
    }

    /// Merge key of the current call, `None` once exhausted.
    #[inline]
    pub fn sort_key(&self, order: &ChromOrder) -> Option<(u32, u64)> {
        if self.exhausted {
            return None;
        }
        self.current
            .as_ref()
            .map(|c| (order.ordinal(&c.chrom), c.pos))
    }

    /// Record a corroborating caller. Returns false if already present
    /// or if it is this cursor's own caller.
    pub fn add_correlate(&mut self, caller: CallerId) -> bool {
        if caller == self.caller() || self.correlates.contains(&caller) {
            return false;
        }
        self.correlates.push(caller);
        true
    }

    #[inline]
    pub fn correlates(&self) -> &[CallerId] {
        &self.correlates
    }

    #[inline]
    pub fn is_flushed(&self) -> bool {
        self.flushed
    }

    #[inline]
    pub fn mark_flushed(&mut self) {
        self.flushed = true;
    }

    /// True when the current call has correlates and has not been written yet.
    #[inline]
    pub fn needs_flush(&self) -> bool {
        !self.flushed && !self.correlates.is_empty() && self.current.is_some()
    }

    #[inline]
    pub fn is_exhausted(&self) -> bool {
        self.exhausted
    }

    #[inline]
    pub fn is_newest(&self) -> bool {
        self.is_newest
    }

    #[inline]
    pub fn set_newest(&mut self, newest: bool) {
        self.is_newest = newest;
    }

    /// Calls of the filtered type read so far.
    #[inline]
    pub fn calls_read(&self) -> usize {
        self.calls_read
    }
}
