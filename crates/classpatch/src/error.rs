// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::path::{Path, PathBuf};

use thiserror::Error;

/// Any error raised while locating, rewriting or re-emitting a compiled class.
///
/// Every variant names the class, method or path it concerns. A failing build step reports the
/// error to its caller; nothing is retried.
///
/// # Thread safety
///
/// This type is thread-safe.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// The target class could not be found, or its name does not map to an artifact path.
    #[error("class {class_name} is not resolvable: {reason}")]
    ClassNotResolvable {
        /// The qualified class name that was requested.
        class_name: String,
        /// What went wrong.
        reason: String,
    },

    /// Zero or several methods matched the rewrite target.
    #[error("expected exactly one method matching {method} in {class_name}, found {candidates}")]
    TargetMethodNotFound {
        /// The class that was searched.
        class_name: String,
        /// The method matcher, formatted like a Java declaration.
        method: String,
        /// How many methods matched.
        candidates: usize,
    },

    /// The replacement behavior does not fit the matched method.
    #[error("replacement for {method} in {class_name} is not compatible: {reason}")]
    IncompatibleReplacement {
        /// The class holding the method.
        class_name: String,
        /// The method matcher, formatted like a Java declaration.
        method: String,
        /// What does not line up.
        reason: String,
    },

    /// The build trigger fired on an element it cannot act on, or without a usable
    /// class-output directory.
    #[error("malformed trigger on {element}: {reason}")]
    MalformedTrigger {
        /// The marked element, as displayed by
        /// [`MarkedElement`](crate::MarkedElement).
        element: String,
        /// What is wrong with it.
        reason: String,
    },

    /// The rewritten artifact could not be written, or the stale one could not be removed.
    #[error("failed to write artifact {}: {source}", path.display())]
    ArtifactWriteFailure {
        /// The artifact path.
        path: PathBuf,
        /// The fault reported by the operating system.
        #[source]
        source: std::io::Error,
    },

    /// Bytes that should hold a class file do not.
    #[error("malformed class file: {reason}")]
    MalformedClassFile {
        /// What could not be decoded.
        reason: String,
    },

    /// The Java parser could not be set up or produced no syntax tree.
    #[error("failed to parse Java source {source_name}: {reason}")]
    SourceParse {
        /// The source file, or `<input>` for text without a path.
        source_name: String,
        /// What the parser reported.
        reason: String,
    },

    /// Reading a class or source file failed.
    #[error("failed to read {}: {source}", path.display())]
    Io {
        /// The file or directory being read.
        path: PathBuf,
        /// The fault reported by the operating system.
        #[source]
        source: std::io::Error,
    },
}

impl Error {
    pub(crate) fn malformed(reason: impl Into<String>) -> Self {
        Self::MalformedClassFile { reason: reason.into() }
    }

    pub(crate) fn io(path: &Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }

    pub(crate) fn write_failure(path: &Path, source: std::io::Error) -> Self {
        Self::ArtifactWriteFailure {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// A specialized `Result` for class rewriting operations.
pub type Result<T> = std::result::Result<T, Error>;
