//! Output finalization: collapse duplicate sites and order by position.
//!
//! The correlation passes write records grouped by indel type, and the same
//! site can be reported by several callers. Finalization keeps the first row
//! for each (chromosome, position, indel type) and then orders rows by
//! ascending numeric position, comparing whole lines byte by byte on ties.
//!
//! By default the ordering ignores the chromosome column entirely, the same
//! as `sort -k2,2n`. Set `by_chrom` to order by (chromosome ordinal,
//! position) instead.

use crate::breakpoint::CalledRecord;
use crate::genome::ChromOrder;
use crate::streaming::parsing::{parse_u64_fast, should_skip_line, trim_newline};
use crate::tsv::{MetalError, Result};
use memchr::memchr;
use rustc_hash::FxHashSet;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;
use tempfile::NamedTempFile;

/// Finalization command configuration.
#[derive(Debug, Clone, Default)]
pub struct FinalizeCommand {
    /// Group rows by chromosome before ordering by position
    pub by_chrom: bool,
    /// Chromosome ranking used when `by_chrom` is set
    pub chrom_order: ChromOrder,
}

/// One buffered output row.
#[derive(Debug)]
struct SortRow {
    ordinal: u32,
    pos: u64,
    line: Vec<u8>,
}

impl FinalizeCommand {
    pub fn new() -> Self {
        Self {
            by_chrom: false,
            chrom_order: ChromOrder::human(),
        }
    }

    /// Set by_chrom flag (builder pattern).
    pub fn with_by_chrom(mut self, by_chrom: bool) -> Self {
        self.by_chrom = by_chrom;
        self
    }

    /// Set chromosome ranking (builder pattern).
    pub fn with_chrom_order(mut self, chrom_order: ChromOrder) -> Self {
        self.chrom_order = chrom_order;
        self
    }

    /// Finalize an unsorted file into `output_path`.
    ///
    /// The output is written to a temporary file next to the destination and
    /// moved into place once complete.
    pub fn run<P: AsRef<Path>, Q: AsRef<Path>>(
        &self,
        input_path: P,
        output_path: Q,
    ) -> Result<FinalizeStats> {
        let input_path = input_path.as_ref();
        let output_path = output_path.as_ref();
        let file = File::open(input_path).map_err(|e| MetalError::io(e, input_path))?;

        let dir = match output_path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };
        let mut tmp = NamedTempFile::new_in(dir).map_err(|e| MetalError::io(e, dir))?;
        let stats = self.run_reader(BufReader::new(file), tmp.as_file_mut())?;
        tmp.persist(output_path)
            .map_err(|e| MetalError::io(e.error, output_path))?;
        Ok(stats)
    }

    /// Finalize rows read from `reader`, writing them to `output`.
    pub fn run_reader<R: BufRead, W: Write>(
        &self,
        mut reader: R,
        output: &mut W,
    ) -> Result<FinalizeStats> {
        let mut rows = Vec::new();
        let mut seen: FxHashSet<Vec<u8>> = FxHashSet::default();
        let mut stats = FinalizeStats::default();
        let mut buf = Vec::with_capacity(1024);
        let mut line_num = 0;

        loop {
            buf.clear();
            if reader.read_until(b'\n', &mut buf)? == 0 {
                break;
            }
            line_num += 1;
            let line = trim_newline(&buf);
            if should_skip_line(line) {
                continue;
            }
            stats.rows_read += 1;
            self.push_row(line, line_num, &mut seen, &mut rows, &mut stats)?;
        }

        self.write_rows(rows, output, &mut stats)?;
        Ok(stats)
    }

    /// Finalize in-memory records.
    pub fn finalize_records(&self, records: &[CalledRecord]) -> Vec<CalledRecord> {
        let mut seen = FxHashSet::default();
        let mut keyed = Vec::with_capacity(records.len());
        for record in records {
            let call = &record.call;
            if !seen.insert(call.site_key()) {
                continue;
            }
            let ordinal = if self.by_chrom {
                self.chrom_order.ordinal(&call.chrom)
            } else {
                0
            };
            keyed.push((ordinal, call.pos, record.to_string(), record));
        }
        keyed.sort_by(|a, b| (a.0, a.1, &a.2).cmp(&(b.0, b.1, &b.2)));
        keyed.into_iter().map(|(_, _, _, r)| r.clone()).collect()
    }

    fn push_row(
        &self,
        line: &[u8],
        line_num: usize,
        seen: &mut FxHashSet<Vec<u8>>,
        rows: &mut Vec<SortRow>,
        stats: &mut FinalizeStats,
    ) -> Result<()> {
        let parse_err = |message: &str| MetalError::Parse {
            line: line_num,
            message: message.to_string(),
        };

        // site key is chrom, pos and indel type: everything before the third tab
        let tab1 = memchr(b'\t', line).ok_or_else(|| parse_err("missing position column"))?;
        let tab2 = memchr(b'\t', &line[tab1 + 1..])
            .map(|i| tab1 + 1 + i)
            .ok_or_else(|| parse_err("missing indel type column"))?;
        let key_end = memchr(b'\t', &line[tab2 + 1..])
            .map(|i| tab2 + 1 + i)
            .unwrap_or(line.len());

        let pos = parse_u64_fast(&line[tab1 + 1..tab2])
            .ok_or_else(|| parse_err("position is not a non-negative integer"))?;

        if !seen.insert(line[..key_end].to_vec()) {
            stats.duplicates_removed += 1;
            return Ok(());
        }

        let ordinal = if self.by_chrom {
            let chrom = std::str::from_utf8(&line[..tab1])
                .map_err(|_| parse_err("chromosome is not valid UTF-8"))?;
            self.chrom_order.ordinal(chrom)
        } else {
            0
        };

        rows.push(SortRow {
            ordinal,
            pos,
            line: line.to_vec(),
        });
        Ok(())
    }

    fn write_rows<W: Write>(
        &self,
        mut rows: Vec<SortRow>,
        output: &mut W,
        stats: &mut FinalizeStats,
    ) -> Result<()> {
        rows.sort_unstable_by(|a, b| {
            (a.ordinal, a.pos, &a.line).cmp(&(b.ordinal, b.pos, &b.line))
        });

        let mut writer = BufWriter::with_capacity(256 * 1024, output);
        for row in &rows {
            writer.write_all(&row.line)?;
            writer.write_all(b"\n")?;
        }
        writer.flush()?;
        stats.rows_written = rows.len();
        Ok(())
    }
}

/// Statistics from finalization.
#[derive(Debug, Clone, Default)]
pub struct FinalizeStats {
    /// Non-empty rows read
    pub rows_read: usize,
    /// Rows dropped as repeats of an earlier site
    pub duplicates_removed: usize,
    /// Rows written
    pub rows_written: usize,
}

impl std::fmt::Display for FinalizeStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Read: {}, Duplicates: {}, Written: {}",
            self.rows_read, self.duplicates_removed, self.rows_written
        )
    }
}
