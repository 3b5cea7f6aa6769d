// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::fs::File;
use std::io::{BufWriter, ErrorKind, Write};
use std::path::{Path, PathBuf};

use tracing::{Level, event};

use crate::error::{Error, Operation, Result};
use crate::open_intent::{AdapterOptions, OpenIntent};

/// A sequential output stream that reports how many bytes it has accepted.
///
/// Storage writers record offsets of pages and footers as they go. They expect the stream to
/// report its position natively; this trait makes that capability explicit.
pub trait PositionOutputStream {
    /// Appends `data` to the stream and advances the position by `data.len()`.
    ///
    /// # Errors
    ///
    /// Returns an error if the stream is released or the underlying file fails.
    fn write_slice(&mut self, data: &[u8]) -> Result<()>;

    /// Forces buffered bytes to the underlying file without releasing it.
    ///
    /// # Errors
    ///
    /// Returns an error if the stream is released or the underlying file fails.
    fn flush(&mut self) -> Result<()>;

    /// Returns the total number of bytes accepted since the stream was opened.
    fn position(&self) -> u64;

    /// Flushes and releases the underlying file.
    ///
    /// Releasing an already released stream does nothing.
    ///
    /// # Errors
    ///
    /// Returns an error if the final flush fails. The file is released regardless.
    fn close(&mut self) -> Result<()>;
}

/// A buffered, position-tracked output stream over a local file.
///
/// The position is a software counter: the file handle is opened for plain sequential writes
/// and never queried for its cursor. Each instance exclusively owns its handle and counter;
/// all methods take `&mut self`.
///
/// Obtain one through [`FileAdapterFactory::open_for_write`](crate::FileAdapterFactory::open_for_write)
/// or [`OutputFile`](crate::OutputFile).
#[derive(Debug)]
pub struct LocalPositionOutputStream {
    path: PathBuf,
    channel: Option<BufWriter<File>>,
    position: u64,
}

impl LocalPositionOutputStream {
    pub(crate) fn open(path: &Path, intent: OpenIntent, options: AdapterOptions) -> Result<Self> {
        if !intent.is_write() {
            return Err(Error::from_io(
                path,
                Operation::Create,
                std::io::Error::new(ErrorKind::InvalidInput, "output streams require a write intent"),
            ));
        }

        let file = intent
            .to_std()
            .open(path)
            .map_err(|e| Error::from_io(path, Operation::Create, e))?;

        event!(
            Level::DEBUG,
            message = "output stream opened",
            path = %path.display(),
            intent = ?intent,
            buffer_size = options.get_buffer_size(),
        );

        Ok(Self {
            path: path.to_path_buf(),
            channel: Some(BufWriter::with_capacity(options.get_buffer_size(), file)),
            position: 0,
        })
    }

    /// Returns the path of the file this stream writes to.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns `true` once [`close`](PositionOutputStream::close) has been called.
    #[must_use]
    pub const fn is_closed(&self) -> bool {
        self.channel.is_none()
    }

    fn channel(&mut self, operation: Operation) -> Result<&mut BufWriter<File>> {
        match self.channel.as_mut() {
            Some(channel) => Ok(channel),
            None => Err(Error::Io {
                path: self.path.clone(),
                operation,
                source: std::io::Error::new(ErrorKind::BrokenPipe, "output stream is closed"),
            }),
        }
    }
}

impl PositionOutputStream for LocalPositionOutputStream {
    fn write_slice(&mut self, data: &[u8]) -> Result<()> {
        let channel = self.channel(Operation::Write)?;
        if let Err(e) = channel.write_all(data) {
            return Err(Error::from_io(&self.path, Operation::Write, e));
        }
        self.position += data.len() as u64;
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        let channel = self.channel(Operation::Flush)?;
        if let Err(e) = channel.flush() {
            return Err(Error::from_io(&self.path, Operation::Flush, e));
        }
        Ok(())
    }

    fn position(&self) -> u64 {
        self.position
    }

    fn close(&mut self) -> Result<()> {
        let Some(mut channel) = self.channel.take() else {
            return Ok(());
        };

        let flushed = channel.flush();
        // Discard whatever could not be flushed so that dropping the writer does not retry.
        let (_file, _unflushed) = channel.into_parts();

        event!(
            Level::DEBUG,
            message = "output stream closed",
            path = %self.path.display(),
            position = self.position,
            ok = flushed.is_ok(),
        );

        flushed.map_err(|e| Error::from_io(&self.path, Operation::Close, e))
    }
}

impl Write for LocalPositionOutputStream {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        let channel = self.channel(Operation::Write)?;
        let written = channel
            .write(buf)
            .map_err(|e| std::io::Error::from(Error::from_io(&self.path, Operation::Write, e)))?;
        self.position += written as u64;
        Ok(written)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        PositionOutputStream::flush(self).map_err(Into::into)
    }
}

impl Drop for LocalPositionOutputStream {
    fn drop(&mut self) {
        if let Err(e) = self.close() {
            event!(
                Level::WARN,
                message = "failed to flush output stream on drop",
                path = %self.path.display(),
                error = %e,
            );
        }
    }
}
