//! Command implementations for metal.

pub mod correlate;
pub mod finalize;

pub use correlate::{CorrelateCommand, CorrelateStats, PassStats};
pub use finalize::{FinalizeCommand, FinalizeStats};
