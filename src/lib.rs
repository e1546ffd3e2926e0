// Clippy allows for the whole crate
#![allow(clippy::too_many_arguments)]

//! METAL: consensus annotation of indel breakpoint calls.
//!
//! Several variant callers report indel breakpoints independently. This
//! library streams their sorted calls side by side, one indel type at a time,
//! and annotates every call that another caller corroborates with the list
//! of callers that made it.
//!
//! # Features
//!
//! - **Streaming**: holds one call per caller, so input length is unbounded
//! - **Deterministic**: fixed distance threshold and eligibility rule
//! - **Configurable**: caller set, threshold and chromosome order are injected
//!
//! # Example
//!
//! ```rust,no_run
//! use metal_indels::prelude::*;
//!
//! let config = CorrelateConfig::default();
//! let mut sources = Vec::new();
//! for (id, name) in ["scotch", "deepvariant", "gatkhc", "varscan", "pindell"]
//!     .iter()
//!     .enumerate()
//! {
//!     let path = format!("{}.breakpoints.tsv", name);
//!     sources.push(TsvSource::from_path(path, CallerId(id)).unwrap());
//! }
//!
//! let cmd = CorrelateCommand::new().with_config(config);
//! let (records, stats) = cmd.run_collect(&mut sources).unwrap();
//! let finalized = FinalizeCommand::new().finalize_records(&records);
//! eprintln!("{} ({} rows after dedup)", stats, finalized.len());
//! ```

pub mod breakpoint;
pub mod commands;
pub mod config;
pub mod genome;
pub mod streaming;
pub mod tsv;

// Re-export commonly used types
pub use breakpoint::{BreakpointCall, CalledRecord, CallerId, IndelType};
pub use config::{CallerSet, CallerSpec, CorrelateConfig};
pub use genome::ChromOrder;
pub use tsv::{MetalError, Result, TsvSource};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::breakpoint::{BreakpointCall, CalledRecord, CallerId, IndelType};
    pub use crate::commands::{CorrelateCommand, FinalizeCommand};
    pub use crate::config::{CallerSet, CallerSpec, CorrelateConfig};
    pub use crate::genome::ChromOrder;
    pub use crate::streaming::{BreakpointSource, CalledWriter, MemorySource, RecordSink};
    pub use crate::tsv::{MetalError, TsvSource};
}
