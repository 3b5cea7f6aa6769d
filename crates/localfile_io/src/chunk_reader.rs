// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Parquet reader integration.
//!
//! [`LocalSeekableInputStream`] implements [`ChunkReader`] so it can be handed directly to
//! `SerializedFileReader` or `ParquetRecordBatchReaderBuilder`. The output side needs no glue:
//! [`LocalPositionOutputStream`](crate::LocalPositionOutputStream) implements
//! [`std::io::Write`], which is all `ArrowWriter` and `SerializedFileWriter` require.

use bytes::Bytes;
use parquet::errors::{ParquetError, Result};
use parquet::file::reader::{ChunkReader, Length};

use crate::input_stream::{LocalSeekableInputStream, PositionalReader, SeekableInputStream};

impl Length for LocalSeekableInputStream {
    fn len(&self) -> u64 {
        self.length()
    }
}

impl ChunkReader for LocalSeekableInputStream {
    type T = PositionalReader;

    fn get_read(&self, start: u64) -> Result<Self::T> {
        if start > self.length() {
            return Err(ParquetError::EOF(format!(
                "read start {start} is beyond the length {} of {}",
                self.length(),
                self.path().display()
            )));
        }
        Ok(self.reader_from(start))
    }

    fn get_bytes(&self, start: u64, length: usize) -> Result<Bytes> {
        Ok(self.read_exact_at(start, length)?)
    }
}

#[cfg(test)]
mod tests {
    use std::io::Read;

    use super::*;

    #[test]
    fn chunk_reader_serves_ranges() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("chunks.bin");
        std::fs::write(&path, b"header|payload|footer").unwrap();
        let stream = LocalSeekableInputStream::open(&path).unwrap();

        assert_eq!(Length::len(&stream), 21);
        assert_eq!(&ChunkReader::get_bytes(&stream, 7, 7).unwrap()[..], b"payload");

        let mut tail = String::new();
        let _ = stream.get_read(15).unwrap().read_to_string(&mut tail).unwrap();
        assert_eq!(tail, "footer");
    }

    #[test]
    fn chunk_reader_rejects_out_of_range() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("chunks.bin");
        std::fs::write(&path, b"short").unwrap();
        let stream = LocalSeekableInputStream::open(&path).unwrap();

        let _ = stream.get_read(6).unwrap_err();
        let _ = ChunkReader::get_bytes(&stream, 3, 10).unwrap_err();
    }
}
