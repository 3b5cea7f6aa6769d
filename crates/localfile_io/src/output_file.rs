// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::open_intent::{AdapterOptions, OpenIntent};
use crate::output_stream::{LocalPositionOutputStream, PositionOutputStream};

/// The "output file" contract a storage writer builder consumes.
pub trait OutputFile {
    /// The stream type produced when the file is opened.
    type Stream: PositionOutputStream;

    /// Creates the file, failing if it already exists.
    ///
    /// # Errors
    ///
    /// Returns [`Error::AlreadyExists`](crate::Error::AlreadyExists) if the file exists, or
    /// another error if it cannot be created.
    fn create(&self, block_size_hint: u64) -> Result<Self::Stream>;

    /// Creates the file, or truncates it to zero length if it already exists.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be created or truncated.
    fn create_or_overwrite(&self, block_size_hint: u64) -> Result<Self::Stream>;

    /// Returns `true` if the backing store honors block size hints.
    fn supports_block_size(&self) -> bool;

    /// Returns the preferred block size, or zero when there is none.
    fn default_block_size(&self) -> u64;
}

/// An [`OutputFile`] backed by a path on the local filesystem.
///
/// The file is not touched until [`create`](OutputFile::create) or
/// [`create_or_overwrite`](OutputFile::create_or_overwrite) is called. A local file has no
/// block structure, so block size hints are ignored.
#[derive(Clone, Debug)]
pub struct LocalOutputFile {
    path: PathBuf,
    options: AdapterOptions,
}

impl LocalOutputFile {
    /// Describes an output file at `path` with default adapter options.
    #[must_use]
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self::with_options(path, AdapterOptions::default())
    }

    /// Describes an output file at `path` with the given adapter options.
    #[must_use]
    pub fn with_options(path: impl AsRef<Path>, options: AdapterOptions) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            options,
        }
    }

    /// Returns the path the file will be written to.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl OutputFile for LocalOutputFile {
    type Stream = LocalPositionOutputStream;

    fn create(&self, _block_size_hint: u64) -> Result<Self::Stream> {
        LocalPositionOutputStream::open(&self.path, OpenIntent::CreateExclusive, self.options)
    }

    fn create_or_overwrite(&self, _block_size_hint: u64) -> Result<Self::Stream> {
        LocalPositionOutputStream::open(&self.path, OpenIntent::CreateOrOverwrite, self.options)
    }

    fn supports_block_size(&self) -> bool {
        false
    }

    fn default_block_size(&self) -> u64 {
        0
    }
}
