//! Brotli compression of WOFF2 table data.

use std::io;

use super::{FontWriter, TableRecord};

/// Streams table data without inter-table padding, as WOFF2 requires.
#[derive(Debug)]
struct TableStream<'a> {
    records: &'a [TableRecord],
    table_data: &'a [u8],
    /// Bytes of data of `records[0]` already read.
    pos: usize,
}

impl<'a> TableStream<'a> {
    fn new(writer: &'a FontWriter) -> Self {
        Self {
            records: &writer.tables,
            table_data: &writer.table_data,
            pos: 0,
        }
    }
}

impl io::Read for TableStream<'_> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        while let Some((record, rest)) = self.records.split_first() {
            let remaining = &self.table_data[record.data_range()][self.pos..];
            if remaining.is_empty() {
                self.records = rest;
                self.pos = 0;
                continue;
            }
            let len = remaining.len().min(buf.len());
            buf[..len].copy_from_slice(&remaining[..len]);
            self.pos += len;
            return Ok(len);
        }
        Ok(0)
    }
}

impl FontWriter {
    pub(super) fn compress_table_data(&self) -> Vec<u8> {
        let mut stream = TableStream::new(self);
        let mut compressed = vec![];
        let params = brotli::enc::BrotliEncoderParams::default();
        // Neither reading from `TableStream` nor writing to a `Vec` can fail.
        if let Err(err) = brotli::BrotliCompress(&mut stream, &mut compressed, &params) {
            log::error!("failed compressing table data: {err}");
        }
        compressed
    }
}
