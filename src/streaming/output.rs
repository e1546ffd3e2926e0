//! Output for annotated calls.
//!
//! Records leave the engine through a [`RecordSink`]. The TSV writer uses
//! itoa for integer formatting to avoid allocation in the hot path.

use crate::breakpoint::CalledRecord;
use crate::tsv::{MetalError, Result};
use std::io::{BufWriter, Write};

/// Buffer size for CalledWriter (2MB default).
const DEFAULT_BUFFER_SIZE: usize = 2 * 1024 * 1024;

/// Destination for emitted records. Emission is append-only.
pub trait RecordSink {
    fn emit(&mut self, record: CalledRecord) -> Result<()>;
}

impl RecordSink for Vec<CalledRecord> {
    fn emit(&mut self, record: CalledRecord) -> Result<()> {
        self.push(record);
        Ok(())
    }
}

impl<K: RecordSink + ?Sized> RecordSink for &mut K {
    fn emit(&mut self, record: CalledRecord) -> Result<()> {
        (**self).emit(record)
    }
}

/// Buffered writer producing one TSV row per record:
/// `chrom pos <TYPE> length [extra...] Caller1,Caller2,...`
pub struct CalledWriter<W: Write> {
    writer: BufWriter<W>,
    itoa_buf: itoa::Buffer,
    records_written: usize,
}

impl<W: Write> CalledWriter<W> {
    /// Create a new CalledWriter with default 2MB buffer.
    pub fn new(output: W) -> Self {
        Self::with_capacity(DEFAULT_BUFFER_SIZE, output)
    }

    /// Create a new CalledWriter with specified buffer size.
    pub fn with_capacity(capacity: usize, output: W) -> Self {
        Self {
            writer: BufWriter::with_capacity(capacity, output),
            itoa_buf: itoa::Buffer::new(),
            records_written: 0,
        }
    }

    /// Write one record followed by newline.
    pub fn write_record(&mut self, record: &CalledRecord) -> Result<()> {
        let call = &record.call;
        self.writer.write_all(call.chrom.as_bytes())?;
        self.writer.write_all(b"\t")?;
        self.writer
            .write_all(self.itoa_buf.format(call.pos).as_bytes())?;
        self.writer.write_all(b"\t")?;
        self.writer.write_all(call.indel_type.as_str().as_bytes())?;
        self.writer.write_all(b"\t")?;
        self.writer
            .write_all(self.itoa_buf.format(call.length).as_bytes())?;
        for field in &call.extra {
            self.writer.write_all(b"\t")?;
            self.writer.write_all(field.as_bytes())?;
        }
        self.writer.write_all(b"\t")?;
        for (i, caller) in record.called_by.iter().enumerate() {
            if i > 0 {
                self.writer.write_all(b",")?;
            }
            self.writer.write_all(caller.as_bytes())?;
        }
        self.writer.write_all(b"\n")?;
        self.records_written += 1;
        Ok(())
    }

    /// Number of records written so far.
    pub fn records_written(&self) -> usize {
        self.records_written
    }

    /// Flush the internal buffer.
    pub fn flush(&mut self) -> Result<()> {
        self.writer.flush().map_err(MetalError::Io)
    }

    /// Flush and return the inner writer.
    pub fn into_inner(self) -> Result<W> {
        self.writer
            .into_inner()
            .map_err(|e| MetalError::Io(e.into_error()))
    }
}

impl<W: Write> RecordSink for CalledWriter<W> {
    fn emit(&mut self, record: CalledRecord) -> Result<()> {
        self.write_record(&record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::breakpoint::{BreakpointCall, CallerId, IndelType};

    fn record(pos: u64, called_by: &[&str]) -> CalledRecord {
        CalledRecord {
            call: BreakpointCall::new("1", pos, IndelType::DelL, 7, CallerId(0)),
            called_by: called_by.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn test_write_record() {
        let mut writer = CalledWriter::new(Vec::new());
        writer.write_record(&record(100, &["Scotch", "GATK-HC"])).unwrap();
        let out = writer.into_inner().unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "1\t100\t<DEL_L>\t7\tScotch,GATK-HC\n"
        );
    }

    #[test]
    fn test_writer_matches_display() {
        let mut rec = record(42, &["VarScan", "DeepVariant", "Pindel-L"]);
        rec.call.extra = vec!["a".to_string(), "b".to_string()];
        let mut writer = CalledWriter::new(Vec::new());
        writer.emit(rec.clone()).unwrap();
        assert_eq!(writer.records_written(), 1);
        let out = String::from_utf8(writer.into_inner().unwrap()).unwrap();
        assert_eq!(out, format!("{}\n", rec));
    }

    #[test]
    fn test_vec_sink_appends() {
        let mut sink: Vec<CalledRecord> = Vec::new();
        sink.emit(record(1, &["A", "B"])).unwrap();
        sink.emit(record(2, &["B", "A"])).unwrap();
        assert_eq!(sink.len(), 2);
        assert_eq!(sink[1].call.pos, 2);
    }
}
