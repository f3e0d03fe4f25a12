//! Sequential record reader.
//!
//! Reads a byte stream in large chunks and hands out one fixed-size block at
//! a time. Whole records are sliced straight out of the chunk buffer; a
//! partial record at the end of a chunk is carried over to the next read, so
//! sources that return short reads (pipes, sockets) never split a record.
//!
//! At end of stream, trailing bytes shorter than one record are dropped
//! without error. They are counted in [`RecordReader::discarded_bytes`] so
//! the caller can log the incomplete write.
use crate::codec;
use crate::error::{Error, Result};
use crate::layout::RecordLayout;
use crate::record::SalesOrder;
use crate::value::Record;
use std::fs::File;
use std::io::{self, Read, Seek, SeekFrom};
use std::iter::FusedIterator;
use std::path::Path;
use tracing::debug;

/// Records per chunk when no option is given.
pub const DEFAULT_CHUNK_RECORDS: usize = 10_000;

/// Upper bound on the chunk buffer. Larger `chunk_records` values are clamped
/// down to it, but a chunk always holds at least one whole record.
pub const MAX_CHUNK_BYTES: usize = 64 << 20;

#[derive(Debug, Clone, Copy)]
pub struct ReaderOptions {
    /// Whole records fetched per read; `0` is treated as 1 and large values
    /// are clamped to [`MAX_CHUNK_BYTES`].
    pub chunk_records: usize,
}

impl Default for ReaderOptions {
    fn default() -> Self {
        Self { chunk_records: DEFAULT_CHUNK_RECORDS }
    }
}

pub struct RecordReader<R> {
    source: Option<R>,
    record_size: usize,
    buf: Vec<u8>,
    pos: usize,
    len: usize,
    eof: bool,
    records_read: u64,
    discarded: u64,
}

impl RecordReader<File> {
    pub fn open_path<P: AsRef<Path>>(path: P, layout: &RecordLayout) -> io::Result<Self> {
        Ok(Self::open(File::open(path)?, layout))
    }
}

impl<R: Read> RecordReader<R> {
    pub fn open(source: R, layout: &RecordLayout) -> Self {
        Self::with_options(source, layout, ReaderOptions::default())
    }

    pub fn with_options(source: R, layout: &RecordLayout, options: ReaderOptions) -> Self {
        let record_size = layout.total_size();
        let chunk_records = options.chunk_records.clamp(1, (MAX_CHUNK_BYTES / record_size).max(1));
        let chunk = chunk_records * record_size;
        Self {
            source: Some(source),
            record_size,
            buf: vec![0u8; chunk],
            pos: 0,
            len: 0,
            eof: false,
            records_read: 0,
            discarded: 0,
        }
    }

    /// Next whole block, or `None` once the source is exhausted or closed.
    pub fn next_block(&mut self) -> io::Result<Option<&[u8]>> {
        if self.len - self.pos < self.record_size {
            if !self.eof {
                self.fill()?;
            }
            if self.len - self.pos < self.record_size {
                let rest = self.len - self.pos;
                if rest > 0 {
                    self.discarded += rest as u64;
                    debug!(bytes = rest, records = self.records_read, "discarding truncated trailing record");
                }
                self.pos = self.len;
                return Ok(None);
            }
        }
        let start = self.pos;
        self.pos += self.record_size;
        self.records_read += 1;
        Ok(Some(&self.buf[start..self.pos]))
    }

    /// Move the leftover partial record to the front and read until the
    /// buffer is full or the source reports end of data.
    fn fill(&mut self) -> io::Result<()> {
        self.buf.copy_within(self.pos..self.len, 0);
        self.len -= self.pos;
        self.pos = 0;
        let Some(src) = self.source.as_mut() else {
            self.eof = true;
            return Ok(());
        };
        while self.len < self.buf.len() {
            match src.read(&mut self.buf[self.len..]) {
                Ok(0) => {
                    self.eof = true;
                    break;
                }
                Ok(n) => self.len += n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        }
        Ok(())
    }

    /// Iterate fully decoded records. `layout` must be the one the reader was opened with.
    pub fn records<'a>(&'a mut self, layout: &'a RecordLayout) -> Records<'a, R> {
        Records { reader: self, layout, failed: false }
    }

    /// Iterate decoded sales orders.
    pub fn sales_orders(&mut self) -> SalesOrders<'_, R> {
        SalesOrders { reader: self, failed: false }
    }
}

impl<R> RecordReader<R> {
    pub fn record_size(&self) -> usize {
        self.record_size
    }

    pub fn records_read(&self) -> u64 {
        self.records_read
    }

    /// Bytes dropped because they did not make up a whole record at end of stream.
    pub fn discarded_bytes(&self) -> u64 {
        self.discarded
    }

    pub fn is_closed(&self) -> bool {
        self.source.is_none()
    }

    /// Release the source. Safe to call more than once; later reads yield `None`.
    pub fn close(&mut self) {
        self.source = None;
        self.pos = 0;
        self.len = 0;
        self.eof = true;
    }
}

impl<R: Read + Seek> RecordReader<R> {
    /// Reposition at record `index` (counted from the start of the source).
    /// Resets the discarded-byte count along with the read position.
    pub fn seek_to_record(&mut self, index: u64) -> io::Result<()> {
        let src = self
            .source
            .as_mut()
            .ok_or_else(|| io::Error::other("reader is closed"))?;
        src.seek(SeekFrom::Start(index * self.record_size as u64))?;
        self.pos = 0;
        self.len = 0;
        self.eof = false;
        self.records_read = index;
        self.discarded = 0;
        Ok(())
    }
}

/// Decoded records. Yields at most one I/O error, then ends.
pub struct Records<'a, R> {
    reader: &'a mut RecordReader<R>,
    layout: &'a RecordLayout,
    failed: bool,
}

impl<R: Read> Iterator for Records<'_, R> {
    type Item = Result<Record>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        match self.reader.next_block() {
            Ok(Some(block)) => Some(codec::decode(self.layout, block).map_err(Error::from)),
            Ok(None) => None,
            Err(e) => {
                self.failed = true;
                Some(Err(e.into()))
            }
        }
    }
}

impl<R: Read> FusedIterator for Records<'_, R> {}

/// Decoded sales orders. Yields at most one I/O error, then ends.
pub struct SalesOrders<'a, R> {
    reader: &'a mut RecordReader<R>,
    failed: bool,
}

impl<R: Read> Iterator for SalesOrders<'_, R> {
    type Item = Result<SalesOrder>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        match self.reader.next_block() {
            Ok(Some(block)) => Some(SalesOrder::decode(block).map_err(Error::from)),
            Ok(None) => None,
            Err(e) => {
                self.failed = true;
                Some(Err(e.into()))
            }
        }
    }
}

impl<R: Read> FusedIterator for SalesOrders<'_, R> {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::sales_order_layout;
    use crate::record::tests::sample_order;
    use crate::value::Value;
    use std::io::Cursor;

    fn small() -> RecordLayout {
        RecordLayout::builder().u32("id").f64("price").u8("code").build().unwrap()
    }

    fn small_file(n: u32) -> Vec<u8> {
        let l = small();
        let mut out = Vec::new();
        for i in 0..n {
            let r = Record::new().with("id", i).with("price", i as f64 * 1.5).with("code", (i % 3) as u8);
            out.extend(codec::encode(&l, &r).unwrap());
        }
        out
    }

    /// Hands out at most `step` bytes per read.
    struct Trickle {
        data: Vec<u8>,
        at: usize,
        step: usize,
    }

    impl Read for Trickle {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            let n = self.step.min(buf.len()).min(self.data.len() - self.at);
            buf[..n].copy_from_slice(&self.data[self.at..self.at + n]);
            self.at += n;
            Ok(n)
        }
    }

    fn collect_ids<R: Read>(r: &mut RecordReader<R>, l: &RecordLayout) -> Vec<u32> {
        r.records(l).map(|rec| rec.unwrap().get("id").and_then(Value::as_u32).unwrap()).collect()
    }

    #[test]
    fn trailing_partial_record_is_dropped() {
        let l = small();
        let mut data = small_file(3);
        data.push(0xAB);
        assert_eq!(data.len(), 40);
        let mut r = RecordReader::open(Cursor::new(data), &l);
        let mut n = 0;
        while let Some(block) = r.next_block().unwrap() {
            assert_eq!(block.len(), 13);
            n += 1;
        }
        assert_eq!(n, 3);
        assert_eq!(r.discarded_bytes(), 1);
        assert!(r.next_block().unwrap().is_none());
    }

    #[test]
    fn chunk_size_does_not_change_output() {
        let l = small();
        let mut data = small_file(25);
        data.extend_from_slice(&[1, 2, 3, 4, 5]);
        let expected: Vec<u32> = (0..25).collect();
        for chunk_records in [0, 1, 2, 7, 25, 100] {
            let mut r = RecordReader::with_options(Cursor::new(data.clone()), &l, ReaderOptions { chunk_records });
            assert_eq!(collect_ids(&mut r, &l), expected, "chunk_records={chunk_records}");
            assert_eq!(r.discarded_bytes(), 5);
            assert_eq!(r.records_read(), 25);
        }
    }

    #[test]
    fn huge_chunk_request_is_clamped() {
        let l = RecordLayout::builder().u32("id").build().unwrap();
        let data: Vec<u8> = (0..10u32).flat_map(u32::to_le_bytes).collect();
        for chunk_records in [usize::MAX, 1 << 62, MAX_CHUNK_BYTES] {
            let mut r = RecordReader::with_options(Cursor::new(data.clone()), &l, ReaderOptions { chunk_records });
            assert_eq!(collect_ids(&mut r, &l), (0..10u32).collect::<Vec<_>>());
            assert_eq!(r.discarded_bytes(), 0);
        }
    }

    #[test]
    fn short_reads_never_split_records() {
        let l = small();
        let data = small_file(10);
        for step in [1, 5, 12, 14, 50] {
            let src = Trickle { data: data.clone(), at: 0, step };
            let mut r = RecordReader::with_options(src, &l, ReaderOptions { chunk_records: 3 });
            assert_eq!(collect_ids(&mut r, &l), (0..10u32).collect::<Vec<_>>(), "step={step}");
            assert_eq!(r.discarded_bytes(), 0);
        }
    }

    #[test]
    fn empty_and_tiny_sources() {
        let l = small();
        let mut r = RecordReader::open(Cursor::new(Vec::new()), &l);
        assert!(r.next_block().unwrap().is_none());
        assert_eq!(r.discarded_bytes(), 0);

        let mut r = RecordReader::open(Cursor::new(vec![0u8; 12]), &l);
        assert!(r.next_block().unwrap().is_none());
        assert_eq!(r.discarded_bytes(), 12);
    }

    #[test]
    fn close_is_idempotent() {
        let l = small();
        let mut r = RecordReader::open(Cursor::new(small_file(4)), &l);
        assert!(r.next_block().unwrap().is_some());
        r.close();
        r.close();
        assert!(r.is_closed());
        assert!(r.next_block().unwrap().is_none());

        let mut r = RecordReader::open(Cursor::new(small_file(1)), &l);
        while r.next_block().unwrap().is_some() {}
        r.close();
        assert!(r.next_block().unwrap().is_none());
    }

    #[test]
    fn seek_to_record_gives_random_access() {
        let l = small();
        let mut r = RecordReader::with_options(Cursor::new(small_file(20)), &l, ReaderOptions { chunk_records: 4 });
        r.seek_to_record(17).unwrap();
        assert_eq!(collect_ids(&mut r, &l), vec![17, 18, 19]);
        r.seek_to_record(2).unwrap();
        let block = r.next_block().unwrap().unwrap();
        assert_eq!(codec::decode_field(&l, block, "id").unwrap(), Value::U32(2));
        r.close();
        assert!(r.seek_to_record(0).is_err());
    }

    #[test]
    fn rewinding_resets_discarded_count() {
        let l = RecordLayout::builder().u32("id").build().unwrap();
        let mut data: Vec<u8> = (0..2u32).flat_map(u32::to_le_bytes).collect();
        data.push(0xAB);
        let mut r = RecordReader::open(Cursor::new(data), &l);
        for _ in 0..3 {
            assert_eq!(collect_ids(&mut r, &l), vec![0, 1]);
            assert_eq!(r.discarded_bytes(), 1);
            r.seek_to_record(0).unwrap();
            assert_eq!(r.discarded_bytes(), 0);
        }
    }

    #[test]
    fn io_errors_surface() {
        struct Broken;
        impl Read for Broken {
            fn read(&mut self, _: &mut [u8]) -> io::Result<usize> {
                Err(io::Error::other("disk gone"))
            }
        }
        let l = small();
        let mut r = RecordReader::open(Broken, &l);
        assert!(r.next_block().is_err());
        let mut it = r.records(&l);
        assert!(matches!(it.next(), Some(Err(Error::Io(_)))));
        assert!(it.next().is_none());
        assert_eq!(r.records(&l).count(), 1);
        assert_eq!(r.sales_orders().filter(Result::is_err).count(), 1);
    }

    #[test]
    fn sales_orders_iterate() {
        let mut data = Vec::new();
        for id in 0..5 {
            data.extend(sample_order(id).encode().unwrap());
        }
        data.extend_from_slice(&[0u8; 100]);
        let mut r = RecordReader::open(Cursor::new(data), sales_order_layout());
        let orders: Vec<SalesOrder> = r.sales_orders().map(|o| o.unwrap()).collect();
        assert_eq!(orders.len(), 5);
        assert_eq!(orders[4], sample_order(4));
        assert_eq!(r.discarded_bytes(), 100);
    }
}
