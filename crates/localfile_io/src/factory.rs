// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::path::Path;

use crate::error::Result;
use crate::input_file::LocalInputFile;
use crate::input_stream::LocalSeekableInputStream;
use crate::open_intent::{AdapterOptions, OpenIntent};
use crate::output_file::LocalOutputFile;
use crate::output_stream::LocalPositionOutputStream;

/// Produces local file adapters from a path and an [`OpenIntent`].
///
/// This is the integration point for storage writer and reader builders: hand them the result
/// of [`output_file`](Self::output_file) / [`input_file`](Self::input_file), or open the
/// streams directly.
#[derive(Clone, Copy, Debug, Default)]
pub struct FileAdapterFactory {
    options: AdapterOptions,
}

impl FileAdapterFactory {
    /// Creates a factory with default adapter options.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            options: AdapterOptions::new(),
        }
    }

    /// Creates a factory that applies `options` to every adapter it produces.
    #[must_use]
    pub const fn with_options(options: AdapterOptions) -> Self {
        Self { options }
    }

    /// Returns the options applied to produced adapters.
    #[must_use]
    pub const fn options(&self) -> AdapterOptions {
        self.options
    }

    /// Opens `path` for position-tracked sequential writes.
    ///
    /// # Errors
    ///
    /// * [`Error::AlreadyExists`](crate::Error::AlreadyExists) if `intent` is
    ///   [`OpenIntent::CreateExclusive`] and the file exists; the file is left untouched.
    /// * [`Error::Io`](crate::Error::Io) with kind
    ///   [`InvalidInput`](std::io::ErrorKind::InvalidInput) if `intent` is
    ///   [`OpenIntent::ReadOnly`].
    /// * [`Error::Io`](crate::Error::Io) for any other fault.
    pub fn open_for_write(&self, path: impl AsRef<Path>, intent: OpenIntent) -> Result<LocalPositionOutputStream> {
        LocalPositionOutputStream::open(path.as_ref(), intent, self.options)
    }

    /// Opens an existing `path` for positional reads.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`](crate::Error::NotFound) if the file does not exist, or
    /// [`Error::Io`](crate::Error::Io) for any other fault.
    pub fn open_for_read(&self, path: impl AsRef<Path>) -> Result<LocalSeekableInputStream> {
        LocalSeekableInputStream::open(path.as_ref())
    }

    /// Describes an output file at `path` without touching the filesystem.
    #[must_use]
    pub fn output_file(&self, path: impl AsRef<Path>) -> LocalOutputFile {
        LocalOutputFile::with_options(path, self.options)
    }

    /// Describes an input file at `path` without touching the filesystem.
    #[must_use]
    pub fn input_file(&self, path: impl AsRef<Path>) -> LocalInputFile {
        LocalInputFile::new(path)
    }
}

/// Describes an output file at `path` with default adapter options.
#[must_use]
pub fn output_file(path: impl AsRef<Path>) -> LocalOutputFile {
    FileAdapterFactory::new().output_file(path)
}

/// Describes an input file at `path`.
#[must_use]
pub fn input_file(path: impl AsRef<Path>) -> LocalInputFile {
    FileAdapterFactory::new().input_file(path)
}
