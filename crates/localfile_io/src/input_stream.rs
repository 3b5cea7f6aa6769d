// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::fs::File;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use bytes::Bytes;
use tracing::{Level, event};

use crate::error::{Error, Operation, Result};

/// A random-access input stream with no shared cursor.
///
/// Every read names its own offset, so reads may be issued in any order and never depend on
/// earlier calls. All methods take `&self`.
pub trait SeekableInputStream {
    /// Reads up to `len` bytes starting at `offset`, making a best effort to return the full
    /// amount.
    ///
    /// Fewer bytes are returned only when the end of the file is reached first. An offset at
    /// or past the end yields an empty buffer.
    ///
    /// # Errors
    ///
    /// Returns an error if a read fails.
    fn read_at(&self, offset: u64, len: usize) -> Result<Bytes>;

    /// Reads exactly `len` bytes starting at `offset`.
    ///
    /// # Errors
    ///
    /// Returns an error with kind [`ErrorKind::UnexpectedEof`] if the file ends before `len`
    /// bytes are read, or another error if a read fails.
    fn read_exact_at(&self, offset: u64, len: usize) -> Result<Bytes>;

    /// Returns the total size of the underlying file in bytes.
    fn length(&self) -> u64;
}

/// A positional input stream over a local file.
///
/// Reads use `pread` on Unix and `seek_read` on Windows. The handle is shared through an
/// [`Arc`] so that readers handed out to a storage reader keep it open.
///
/// Obtain one through [`FileAdapterFactory::open_for_read`](crate::FileAdapterFactory::open_for_read)
/// or [`InputFile::new_stream`](crate::InputFile::new_stream).
#[derive(Clone, Debug)]
pub struct LocalSeekableInputStream {
    path: Arc<PathBuf>,
    file: Arc<File>,
    len: u64,
}

impl LocalSeekableInputStream {
    pub(crate) fn open(path: &Path) -> Result<Self> {
        let file = File::open(path).map_err(|e| Error::from_io(path, Operation::Open, e))?;
        let len = file
            .metadata()
            .map_err(|e| Error::from_io(path, Operation::Metadata, e))?
            .len();

        event!(
            Level::DEBUG,
            message = "input stream opened",
            path = %path.display(),
            len,
        );

        Ok(Self {
            path: Arc::new(path.to_path_buf()),
            file: Arc::new(file),
            len,
        })
    }

    /// Returns the path of the file this stream reads from.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns a [`std::io::Read`] implementation that starts at `offset` and stops at the end
    /// of the file, without affecting any other reader.
    #[must_use]
    pub fn reader_from(&self, offset: u64) -> PositionalReader {
        PositionalReader {
            file: Arc::clone(&self.file),
            offset,
        }
    }

    fn fill_at(&self, offset: u64, buf: &mut [u8]) -> Result<usize> {
        let mut total = 0;
        while total < buf.len() {
            let current_offset = offset.saturating_add(total as u64);
            match positional_read(&self.file, &mut buf[total..], current_offset) {
                Ok(0) => break,
                Ok(n) => total += n,
                Err(e) if e.kind() == ErrorKind::Interrupted => {}
                Err(e) => return Err(Error::from_io(&self.path, Operation::Read, e)),
            }
        }
        Ok(total)
    }

    fn unexpected_eof(&self, offset: u64, len: usize, available: u64) -> Error {
        Error::Io {
            path: self.path.to_path_buf(),
            operation: Operation::Read,
            source: std::io::Error::new(
                ErrorKind::UnexpectedEof,
                format!("requested {len} bytes at offset {offset}, file ended after {available}"),
            ),
        }
    }
}

impl SeekableInputStream for LocalSeekableInputStream {
    fn read_at(&self, offset: u64, len: usize) -> Result<Bytes> {
        let available = usize::try_from(self.len.saturating_sub(offset)).unwrap_or(usize::MAX);
        let mut buf = vec![0; len.min(available)];
        let n = self.fill_at(offset, &mut buf)?;
        buf.truncate(n);
        Ok(Bytes::from(buf))
    }

    fn read_exact_at(&self, offset: u64, len: usize) -> Result<Bytes> {
        if offset.checked_add(len as u64).is_none_or(|end| end > self.len) {
            return Err(self.unexpected_eof(offset, len, self.len.saturating_sub(offset)));
        }
        let mut buf = vec![0; len];
        let n = self.fill_at(offset, &mut buf)?;
        if n < len {
            return Err(self.unexpected_eof(offset, len, n as u64));
        }
        Ok(Bytes::from(buf))
    }

    fn length(&self) -> u64 {
        self.len
    }
}

/// A sequential reader over a region of a local file that owns its own offset.
///
/// Created by [`LocalSeekableInputStream::reader_from`]. Several readers may be live over the
/// same file at once; none of them observes the others.
#[derive(Debug)]
pub struct PositionalReader {
    file: Arc<File>,
    offset: u64,
}

impl PositionalReader {
    /// Returns the offset the next read starts at.
    #[must_use]
    pub const fn offset(&self) -> u64 {
        self.offset
    }
}

impl std::io::Read for PositionalReader {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        let n = positional_read(&self.file, buf, self.offset)?;
        self.offset += n as u64;
        Ok(n)
    }
}

/// Reads bytes at `offset` without relying on the cursor.
#[cfg(unix)]
fn positional_read(file: &File, buf: &mut [u8], offset: u64) -> std::io::Result<usize> {
    use std::os::unix::fs::FileExt;
    file.read_at(buf, offset)
}

/// Reads bytes at `offset` without relying on the cursor.
#[cfg(windows)]
fn positional_read(file: &File, buf: &mut [u8], offset: u64) -> std::io::Result<usize> {
    use std::os::windows::fs::FileExt;
    file.seek_read(buf, offset)
}
