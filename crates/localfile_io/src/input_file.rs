// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::path::{Path, PathBuf};

use crate::error::{Error, Operation, Result};
use crate::input_stream::{LocalSeekableInputStream, SeekableInputStream};

/// The "input file" contract a storage reader builder consumes.
pub trait InputFile {
    /// The stream type produced when the file is opened.
    type Stream: SeekableInputStream;

    /// Returns the size of the file in bytes.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if the file does not exist, or another error if its metadata
    /// cannot be read.
    fn length(&self) -> Result<u64>;

    /// Opens a new positional stream over the file.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if the file does not exist, or another error if it cannot be
    /// opened.
    fn new_stream(&self) -> Result<Self::Stream>;
}

/// An [`InputFile`] backed by a path on the local filesystem.
#[derive(Clone, Debug)]
pub struct LocalInputFile {
    path: PathBuf,
}

impl LocalInputFile {
    /// Describes an input file at `path`.
    #[must_use]
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Returns the path the file is read from.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl InputFile for LocalInputFile {
    type Stream = LocalSeekableInputStream;

    fn length(&self) -> Result<u64> {
        std::fs::metadata(&self.path)
            .map(|m| m.len())
            .map_err(|e| Error::from_io(&self.path, Operation::Metadata, e))
    }

    fn new_stream(&self) -> Result<Self::Stream> {
        LocalSeekableInputStream::open(&self.path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn length_and_stream_agree() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("in.bin");
        std::fs::write(&path, b"twelve bytes").unwrap();

        let file = LocalInputFile::new(&path);
        assert_eq!(file.length().unwrap(), 12);
        assert_eq!(file.new_stream().unwrap().length(), 12);
    }

    #[test]
    fn missing_file_is_not_found() {
        let tmp = tempfile::tempdir().unwrap();
        let file = LocalInputFile::new(tmp.path().join("missing.bin"));
        assert!(matches!(file.length().unwrap_err(), Error::NotFound { .. }));
        assert!(matches!(file.new_stream().unwrap_err(), Error::NotFound { .. }));
    }
}
