// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::fmt;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use thiserror::Error;

/// The file operation that was being attempted when an I/O fault occurred.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[non_exhaustive]
pub enum Operation {
    /// Creating or truncating the target file.
    Create,
    /// Opening an existing file.
    Open,
    /// Querying file metadata, such as its length.
    Metadata,
    /// Writing bytes through an output adapter.
    Write,
    /// Forcing buffered bytes to the underlying file.
    Flush,
    /// Releasing an output adapter.
    Close,
    /// Reading bytes at an offset.
    Read,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Create => "create",
            Self::Open => "open",
            Self::Metadata => "metadata",
            Self::Write => "write",
            Self::Flush => "flush",
            Self::Close => "close",
            Self::Read => "read",
        })
    }
}

/// Any error raised by the local file adapters.
///
/// Errors propagate unchanged to the storage writer or reader that drives the adapter. No
/// operation is retried.
///
/// # Thread safety
///
/// This type is thread-safe.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// An exclusive create was requested but the target already exists.
    #[error("file already exists: {}", path.display())]
    AlreadyExists {
        /// The path that was to be created.
        path: PathBuf,
    },

    /// A read was requested but the target does not exist.
    #[error("file not found: {}", path.display())]
    NotFound {
        /// The path that was to be opened.
        path: PathBuf,
    },

    /// The underlying file reported a fault.
    #[error("{operation} failed for {}: {source}", path.display())]
    Io {
        /// The file the operation was applied to.
        path: PathBuf,
        /// The attempted operation.
        operation: Operation,
        /// The fault reported by the operating system.
        #[source]
        source: std::io::Error,
    },
}

impl Error {
    /// Classifies a standard I/O error raised while operating on `path`.
    ///
    /// `AlreadyExists` and `NotFound` kinds become their dedicated variants; everything else is
    /// reported as [`Error::Io`].
    pub(crate) fn from_io(path: &Path, operation: Operation, source: std::io::Error) -> Self {
        match source.kind() {
            ErrorKind::AlreadyExists => Self::AlreadyExists { path: path.to_path_buf() },
            ErrorKind::NotFound => Self::NotFound { path: path.to_path_buf() },
            _ => Self::Io {
                path: path.to_path_buf(),
                operation,
                source,
            },
        }
    }

    /// Returns the path the failed operation was applied to.
    #[must_use]
    pub fn path(&self) -> &Path {
        match self {
            Self::AlreadyExists { path } | Self::NotFound { path } | Self::Io { path, .. } => path,
        }
    }

    /// Returns the closest matching standard I/O error kind.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::AlreadyExists { .. } => ErrorKind::AlreadyExists,
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::Io { source, .. } => source.kind(),
        }
    }
}

/// A specialized `Result` for use with the local file adapters.
pub type Result<T> = std::result::Result<T, Error>;

/// Represents an adapter error as a standard I/O error, keeping its kind.
///
/// This is used when the adapters are driven through `std::io::Write`.
impl From<Error> for std::io::Error {
    fn from(value: Error) -> Self {
        match value {
            Error::Io { source, .. } if source.get_ref().is_none() => source,
            other => Self::new(other.kind(), other),
        }
    }
}

impl From<Error> for parquet::errors::ParquetError {
    fn from(value: Error) -> Self {
        Self::External(Box::new(value))
    }
}
