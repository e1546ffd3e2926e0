//! Core breakpoint types for indel call representation.

use std::fmt;
use std::str::FromStr;

use crate::tsv::MetalError;

/// Class of indel breakpoint.
///
/// Correlation only ever happens between calls of the same class; each
/// class is processed in its own pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum IndelType {
    /// Deletion start breakpoint.
    DelL,
    /// Deletion end breakpoint.
    DelR,
    /// Insertion breakpoint.
    Ins,
}

impl IndelType {
    /// Pass order used by the correlation engine.
    pub const ALL: [IndelType; 3] = [IndelType::DelL, IndelType::DelR, IndelType::Ins];

    /// Symbolic allele used in breakpoint files.
    #[inline]
    pub fn as_str(&self) -> &'static str {
        match self {
            IndelType::DelL => "<DEL_L>",
            IndelType::DelR => "<DEL_R>",
            IndelType::Ins => "<INS>",
        }
    }

    /// Parse a symbolic allele from raw bytes.
    #[inline]
    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        match bytes {
            b"<DEL_L>" => Some(IndelType::DelL),
            b"<DEL_R>" => Some(IndelType::DelR),
            b"<INS>" => Some(IndelType::Ins),
            _ => None,
        }
    }
}

impl fmt::Display for IndelType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for IndelType {
    type Err = MetalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        IndelType::from_bytes(s.as_bytes())
            .ok_or_else(|| MetalError::MalformedRecord(format!("unexpected indel type {}", s)))
    }
}

/// Index of a caller within the configured caller set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CallerId(pub usize);

impl CallerId {
    #[inline]
    pub fn index(self) -> usize {
        self.0
    }
}

/// A single caller's assertion that an indel breakpoint exists at a position.
///
/// Positions are 1-based. Values are never mutated once produced by a source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BreakpointCall {
    pub chrom: String,
    pub pos: u64,
    pub indel_type: IndelType,
    /// Informational only, not used for correlation.
    pub length: i64,
    pub caller: CallerId,
    /// Trailing columns carried through to the output untouched.
    pub extra: Vec<String>,
}

impl BreakpointCall {
    /// Create a new call without pass-through columns.
    pub fn new(
        chrom: impl Into<String>,
        pos: u64,
        indel_type: IndelType,
        length: i64,
        caller: CallerId,
    ) -> Self {
        Self {
            chrom: chrom.into(),
            pos,
            indel_type,
            length,
            caller,
            extra: Vec::new(),
        }
    }

    /// Attach pass-through columns (builder pattern).
    pub fn with_extra(mut self, extra: Vec<String>) -> Self {
        self.extra = extra;
        self
    }

    /// Key identifying the genomic event, used for output dedup.
    #[inline]
    pub fn site_key(&self) -> (&str, u64, IndelType) {
        (&self.chrom, self.pos, self.indel_type)
    }
}

/// A call annotated with every caller that corroborated it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CalledRecord {
    pub call: BreakpointCall,
    /// The call's own caller first, then correlates in the order they were found.
    pub called_by: Vec<String>,
}

impl CalledRecord {
    /// Comma-joined caller list as written in the output column.
    pub fn called_by_field(&self) -> String {
        self.called_by.join(",")
    }
}

impl fmt::Display for CalledRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}\t{}\t{}\t{}",
            self.call.chrom, self.call.pos, self.call.indel_type, self.call.length
        )?;
        for field in &self.call.extra {
            write!(f, "\t{}", field)?;
        }
        write!(f, "\t{}", self.called_by_field())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_indel_type_round_trip_tokens() {
        for t in IndelType::ALL {
            assert_eq!(t.as_str().parse::<IndelType>().unwrap(), t);
        }
        assert_eq!(IndelType::from_bytes(b"<DUP>"), None);
        assert!("<DEL>".parse::<IndelType>().is_err());
    }

    #[test]
    fn test_pass_order() {
        assert_eq!(
            IndelType::ALL,
            [IndelType::DelL, IndelType::DelR, IndelType::Ins]
        );
    }

    #[test]
    fn test_called_record_display() {
        let call = BreakpointCall::new("7", 1200, IndelType::Ins, 4, CallerId(1))
            .with_extra(vec!["ACGT".to_string()]);
        let rec = CalledRecord {
            call,
            called_by: vec!["DeepVariant".to_string(), "Scotch".to_string()],
        };
        assert_eq!(
            rec.to_string(),
            "7\t1200\t<INS>\t4\tACGT\tDeepVariant,Scotch"
        );
    }

    #[test]
    fn test_site_key_ignores_caller() {
        let a = BreakpointCall::new("1", 10, IndelType::DelL, 3, CallerId(0));
        let b = BreakpointCall::new("1", 10, IndelType::DelL, 5, CallerId(2));
        assert_eq!(a.site_key(), b.site_key());
    }
}
