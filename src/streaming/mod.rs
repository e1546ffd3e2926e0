//! Shared streaming components for the correlation engine.
//!
//! This module provides:
//! - Rewindable breakpoint sources
//! - Per-caller read cursors
//! - Zero-allocation breakpoint parsing
//! - Optional sort validation
//! - Record sinks and TSV output
//!
//! The engine holds one call per source at a time, so memory stays
//! O(callers) regardless of input length.

pub mod cursor;
pub mod output;
pub mod parsing;
pub mod source;
pub mod validation;

pub use cursor::ReaderCursor;
pub use output::{CalledWriter, RecordSink};
pub use parsing::{parse_i64_fast, parse_u64_fast, should_skip_line, split_breakpoint_fields};
pub use source::{BreakpointSource, MemorySource};
pub use validation::SortValidator;
