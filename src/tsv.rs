//! Streaming breakpoint TSV reader.
//!
//! Breakpoint files hold one call per line:
//! `chrom<TAB>pos<TAB><TYPE><TAB>length[<TAB>extra...]`, sorted by
//! chromosome ordinal then position. Blank lines and `#` lines are skipped.

use std::fs::File;
use std::io::{self, BufRead, BufReader, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::breakpoint::{BreakpointCall, CallerId, IndelType};
use crate::genome::ChromOrder;
use crate::streaming::parsing::{
    parse_i64_fast, parse_u64_fast, should_skip_line, split_breakpoint_fields, trim_newline,
};
use crate::streaming::source::BreakpointSource;
use crate::streaming::validation::SortValidator;

/// Errors that can occur while reading, correlating or writing calls.
#[derive(Error, Debug)]
pub enum MetalError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("I/O error: {source} ({})", .path.display())]
    File { source: io::Error, path: PathBuf },

    #[error("Parse error at line {line}: {message}")]
    Parse { line: usize, message: String },

    #[error("Malformed record: {0}")]
    MalformedRecord(String),

    #[error("Input {source_name} is not sorted: {detail}")]
    Unsorted { source_name: String, detail: String },

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Invalid format: {0}")]
    InvalidFormat(String),
}

impl MetalError {
    /// Wrap an `io::Error` with the path it occurred on.
    pub fn io(source: io::Error, path: impl Into<PathBuf>) -> Self {
        Self::File {
            source,
            path: path.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, MetalError>;

/// A rewindable breakpoint TSV source for one caller.
pub struct TsvSource<R: Read + Seek> {
    reader: BufReader<R>,
    caller: CallerId,
    name: String,
    line_number: usize,
    buffer: Vec<u8>,
    validator: Option<(SortValidator, ChromOrder)>,
}

impl TsvSource<File> {
    /// Open a breakpoint file. Failure here is fatal before any pass runs.
    pub fn from_path<P: AsRef<Path>>(path: P, caller: CallerId) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| MetalError::io(e, path))?;
        Ok(Self::new(file, caller, path.display().to_string()))
    }
}

impl<R: Read + Seek> TsvSource<R> {
    /// Create a source from any seekable reader.
    pub fn new(reader: R, caller: CallerId, name: impl Into<String>) -> Self {
        Self::with_capacity(reader, caller, name, 64 * 1024)
    }

    /// Create a source with custom buffer capacity.
    pub fn with_capacity(
        reader: R,
        caller: CallerId,
        name: impl Into<String>,
        capacity: usize,
    ) -> Self {
        Self {
            reader: BufReader::with_capacity(capacity, reader),
            caller,
            name: name.into(),
            line_number: 0,
            buffer: Vec::with_capacity(1024),
            validator: None,
        }
    }

    /// Check sort order while reading (builder pattern).
    pub fn with_validation(mut self, order: ChromOrder) -> Self {
        self.validator = Some((SortValidator::new(), order));
        self
    }

    /// Current 1-based line number.
    pub fn line_number(&self) -> usize {
        self.line_number
    }

    /// Parse a single breakpoint line.
    fn parse_line(&self, line: &[u8]) -> Result<BreakpointCall> {
        let raw = split_breakpoint_fields(line).ok_or_else(|| MetalError::Parse {
            line: self.line_number,
            message: format!(
                "Expected at least 4 fields, got {}",
                line.split(|&b| b == b'\t').count()
            ),
        })?;

        let chrom = self.utf8(raw.chrom, "chromosome")?;
        let pos = parse_u64_fast(raw.pos).ok_or_else(|| MetalError::Parse {
            line: self.line_number,
            message: format!("Invalid position: '{}'", String::from_utf8_lossy(raw.pos)),
        })?;
        let indel_type = IndelType::from_bytes(raw.indel_type).ok_or_else(|| {
            MetalError::MalformedRecord(format!(
                "Variant at {}:{} has unexpected type {} ({} line {})",
                chrom,
                pos,
                String::from_utf8_lossy(raw.indel_type),
                self.name,
                self.line_number
            ))
        })?;
        let length = parse_i64_fast(raw.length).ok_or_else(|| MetalError::Parse {
            line: self.line_number,
            message: format!("Invalid length: '{}'", String::from_utf8_lossy(raw.length)),
        })?;

        let extra = match raw.rest_start {
            Some(start) => self
                .utf8(&line[start..], "pass-through columns")?
                .split('\t')
                .map(str::to_string)
                .collect(),
            None => Vec::new(),
        };

        Ok(BreakpointCall {
            chrom: chrom.to_string(),
            pos,
            indel_type,
            length,
            caller: self.caller,
            extra,
        })
    }

    fn utf8<'a>(&self, bytes: &'a [u8], field: &str) -> Result<&'a str> {
        std::str::from_utf8(bytes).map_err(|_| MetalError::Parse {
            line: self.line_number,
            message: format!("{} is not valid UTF-8", field),
        })
    }
}

impl<R: Read + Seek> BreakpointSource for TsvSource<R> {
    fn caller(&self) -> CallerId {
        self.caller
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn rewind(&mut self) -> Result<()> {
        self.reader
            .seek(SeekFrom::Start(0))
            .map_err(|e| MetalError::io(e, &self.name))?;
        self.line_number = 0;
        if let Some((validator, _)) = self.validator.as_mut() {
            validator.reset();
        }
        Ok(())
    }

    fn next_call(&mut self) -> Result<Option<BreakpointCall>> {
        loop {
            self.buffer.clear();
            let bytes_read = self.reader.read_until(b'\n', &mut self.buffer)?;
            if bytes_read == 0 {
                return Ok(None);
            }
            self.line_number += 1;

            let line = trim_newline(&self.buffer);
            if should_skip_line(line) {
                continue;
            }

            let call = self.parse_line(line)?;
            if let Some((validator, order)) = self.validator.as_mut() {
                validator.validate(order, &call.chrom, call.pos, &self.name)?;
            }
            return Ok(Some(call));
        }
    }
}

/// Read every call from a breakpoint file.
pub fn read_calls<P: AsRef<Path>>(path: P, caller: CallerId) -> Result<Vec<BreakpointCall>> {
    let mut source = TsvSource::from_path(path, caller)?;
    let mut calls = Vec::new();
    while let Some(call) = source.next_call()? {
        calls.push(call);
    }
    Ok(calls)
}

/// Parse calls from a string (useful for testing).
pub fn parse_calls(content: &str, caller: CallerId) -> Result<Vec<BreakpointCall>> {
    let mut source = TsvSource::new(io::Cursor::new(content.as_bytes()), caller, "<string>");
    let mut calls = Vec::new();
    while let Some(call) = source.next_call()? {
        calls.push(call);
    }
    Ok(calls)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Cursor, Write};
    use tempfile::NamedTempFile;

    #[test]
    fn test_parse_basic() {
        let content = "1\t100\t<DEL_L>\t12\n1\t250\t<INS>\t3\n";
        let calls = parse_calls(content, CallerId(2)).unwrap();

        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0].chrom, "1");
        assert_eq!(calls[0].pos, 100);
        assert_eq!(calls[0].indel_type, IndelType::DelL);
        assert_eq!(calls[0].length, 12);
        assert_eq!(calls[0].caller, CallerId(2));
        assert_eq!(calls[1].indel_type, IndelType::Ins);
    }

    #[test]
    fn test_pass_through_columns() {
        let calls = parse_calls("X\t5\t<DEL_R>\t-2\tq=30\tPASS\n", CallerId(0)).unwrap();
        assert_eq!(calls[0].length, -2);
        assert_eq!(calls[0].extra, vec!["q=30".to_string(), "PASS".to_string()]);
    }

    #[test]
    fn test_skip_comments_and_blank_lines() {
        let content = "#chrom\tpos\ttype\tlen\n\n2\t7\t<INS>\t1\r\n";
        let calls = parse_calls(content, CallerId(0)).unwrap();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].length, 1);
    }

    #[test]
    fn test_unknown_indel_type_is_malformed() {
        let err = parse_calls("1\t100\t<DUP>\t5\n", CallerId(0)).unwrap_err();
        assert!(matches!(err, MetalError::MalformedRecord(_)));
        assert!(err.to_string().contains("<DUP>"));
    }

    #[test]
    fn test_missing_columns() {
        let err = parse_calls("1\t100\t<INS>\n", CallerId(0)).unwrap_err();
        assert!(matches!(err, MetalError::Parse { line: 1, .. }));
    }

    #[test]
    fn test_bad_position() {
        let err = parse_calls("1\t100\t<INS>\t1\n1\tabc\t<INS>\t1\n", CallerId(0)).unwrap_err();
        assert!(matches!(err, MetalError::Parse { line: 2, .. }));
    }

    #[test]
    fn test_rewind_restarts_stream() {
        let data = "1\t10\t<INS>\t1\n1\t20\t<INS>\t1\n";
        let mut src = TsvSource::new(Cursor::new(data.as_bytes().to_vec()), CallerId(0), "mem");
        while src.next_call().unwrap().is_some() {}
        assert_eq!(src.line_number(), 2);

        src.rewind().unwrap();
        assert_eq!(src.line_number(), 0);
        assert_eq!(src.next_call().unwrap().unwrap().pos, 10);
    }

    #[test]
    fn test_validation_rejects_unsorted() {
        let data = "2\t10\t<INS>\t1\n1\t20\t<INS>\t1\n";
        let mut src = TsvSource::new(Cursor::new(data.as_bytes().to_vec()), CallerId(0), "mem")
            .with_validation(ChromOrder::human());
        src.next_call().unwrap();
        assert!(matches!(
            src.next_call(),
            Err(MetalError::Unsorted { .. })
        ));

        // rewinding resets the validator
        src.rewind().unwrap();
        assert!(src.next_call().is_ok());
    }

    #[test]
    fn test_read_calls_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "3\t33\t<DEL_L>\t4").unwrap();
        file.flush().unwrap();

        let calls = read_calls(file.path(), CallerId(1)).unwrap();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].pos, 33);
    }

    #[test]
    fn test_missing_file_reports_path() {
        let err = TsvSource::from_path("/nonexistent/metal/calls.tsv", CallerId(0))
            .err()
            .unwrap();
        assert!(err.to_string().contains("/nonexistent/metal/calls.tsv"));
    }
}
