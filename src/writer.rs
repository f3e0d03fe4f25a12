//! Buffered appender of fixed-width blocks.
use crate::codec;
use crate::error::{DecodeError, Result};
use crate::layout::RecordLayout;
use crate::record::SalesOrder;
use crate::value::Record;
use std::fs::{self, File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::Path;

/// Write buffer size for record files.
pub const WRITE_BUFFER_BYTES: usize = 1 << 20; // 1 MiB

pub struct RecordWriter<'l, W: Write> {
    out: BufWriter<W>,
    layout: &'l RecordLayout,
    scratch: Vec<u8>,
    written: u64,
}

impl<'l> RecordWriter<'l, File> {
    /// Create (or truncate) `path`, creating missing parent directories.
    pub fn create<P: AsRef<Path>>(path: P, layout: &'l RecordLayout) -> io::Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let file = OpenOptions::new().create(true).write(true).truncate(true).open(path)?;
        Ok(Self::new(file, layout))
    }
}

impl<'l, W: Write> RecordWriter<'l, W> {
    pub fn new(sink: W, layout: &'l RecordLayout) -> Self {
        Self {
            out: BufWriter::with_capacity(WRITE_BUFFER_BYTES, sink),
            layout,
            scratch: vec![0u8; layout.total_size()],
            written: 0,
        }
    }

    /// Encode and append one record. Nothing is written if encoding fails.
    pub fn append(&mut self, record: &Record) -> Result<()> {
        codec::encode_into(self.layout, record, &mut self.scratch)?;
        self.out.write_all(&self.scratch)?;
        self.written += 1;
        Ok(())
    }

    pub fn append_order(&mut self, order: &SalesOrder) -> Result<()> {
        self.append(&order.to_record())
    }

    /// Append an already encoded block.
    pub fn append_block(&mut self, block: &[u8]) -> Result<()> {
        if block.len() != self.layout.total_size() {
            return Err(DecodeError::LengthMismatch { expected: self.layout.total_size(), actual: block.len() }.into());
        }
        self.out.write_all(block)?;
        self.written += 1;
        Ok(())
    }

    pub fn records_written(&self) -> u64 {
        self.written
    }

    /// Flush buffered blocks and hand back the sink.
    pub fn finish(self) -> io::Result<W> {
        self.out.into_inner().map_err(|e| e.into_error())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{EncodeError, Error};
    use crate::record::sales_order_layout;
    use crate::record::tests::sample_order;

    #[test]
    fn appends_fixed_size_blocks() {
        let l = sales_order_layout();
        let mut w = RecordWriter::new(Vec::new(), l);
        for id in 0..3 {
            w.append_order(&sample_order(id)).unwrap();
        }
        assert_eq!(w.records_written(), 3);
        let bytes = w.finish().unwrap();
        assert_eq!(bytes.len(), 3 * 192);
        assert_eq!(SalesOrder::decode(&bytes[192..384]).unwrap(), sample_order(1));
    }

    #[test]
    fn failed_encode_writes_nothing() {
        let l = RecordLayout::builder().u32("id").u8("code").build().unwrap();
        let mut w = RecordWriter::new(Vec::new(), &l);
        w.append(&Record::new().with("id", 1u32).with("code", 1u8)).unwrap();
        let err = w.append(&Record::new().with("id", 2u32)).unwrap_err();
        assert!(matches!(err, Error::Encode(EncodeError::MissingField(ref f)) if f == "code"));
        assert_eq!(w.records_written(), 1);
        assert_eq!(w.finish().unwrap(), vec![1, 0, 0, 0, 1]);
    }

    #[test]
    fn append_block_checks_length() {
        let l = RecordLayout::builder().u32("id").build().unwrap();
        let mut w = RecordWriter::new(Vec::new(), &l);
        w.append_block(&[9, 0, 0, 0]).unwrap();
        assert!(matches!(w.append_block(&[1, 2]), Err(Error::Decode(DecodeError::LengthMismatch { expected: 4, actual: 2 }))));
        assert_eq!(w.finish().unwrap(), vec![9, 0, 0, 0]);
    }

    #[test]
    fn create_makes_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out").join("vendas.bin");
        let l = sales_order_layout();
        let mut w = RecordWriter::create(&path, l).unwrap();
        w.append_order(&sample_order(5)).unwrap();
        w.finish().unwrap();
        assert_eq!(fs::metadata(&path).unwrap().len(), 192);
    }
}
