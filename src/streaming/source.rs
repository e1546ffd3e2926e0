//! Rewindable, pull-based breakpoint streams.
//!
//! A source yields one caller's calls in `(chromosome ordinal, position)`
//! order. The engine scans every source once per indel type, rewinding in
//! between, so a source must be able to restart from its first call.

use crate::breakpoint::{BreakpointCall, CallerId};
use crate::tsv::Result;

/// One caller's stream of breakpoint calls.
pub trait BreakpointSource {
    /// Caller that produced every call in this stream.
    fn caller(&self) -> CallerId;

    /// Human-readable name used in log and error messages.
    fn name(&self) -> &str;

    /// Restart the stream at its first call.
    fn rewind(&mut self) -> Result<()>;

    /// Pull the next call, or `None` once the stream is exhausted.
    fn next_call(&mut self) -> Result<Option<BreakpointCall>>;
}

impl<S: BreakpointSource + ?Sized> BreakpointSource for Box<S> {
    fn caller(&self) -> CallerId {
        (**self).caller()
    }

    fn name(&self) -> &str {
        (**self).name()
    }

    fn rewind(&mut self) -> Result<()> {
        (**self).rewind()
    }

    fn next_call(&mut self) -> Result<Option<BreakpointCall>> {
        (**self).next_call()
    }
}

/// In-memory source over a vector of calls.
///
/// Useful for synthetic caller sets; calls are yielded in the order given.
/// Every call is stamped with the source's caller.
#[derive(Debug, Clone)]
pub struct MemorySource {
    caller: CallerId,
    name: String,
    calls: Vec<BreakpointCall>,
    next: usize,
}

impl MemorySource {
    pub fn new(
        caller: CallerId,
        name: impl Into<String>,
        mut calls: Vec<BreakpointCall>,
    ) -> Self {
        for call in &mut calls {
            call.caller = caller;
        }
        Self {
            caller,
            name: name.into(),
            calls,
            next: 0,
        }
    }

    /// Number of calls held.
    pub fn len(&self) -> usize {
        self.calls.len()
    }

    /// Check if empty.
    pub fn is_empty(&self) -> bool {
        self.calls.is_empty()
    }
}

impl BreakpointSource for MemorySource {
    fn caller(&self) -> CallerId {
        self.caller
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn rewind(&mut self) -> Result<()> {
        self.next = 0;
        Ok(())
    }

    fn next_call(&mut self) -> Result<Option<BreakpointCall>> {
        let call = self.calls.get(self.next).cloned();
        if call.is_some() {
            self.next += 1;
        }
        Ok(call)
    }
}
