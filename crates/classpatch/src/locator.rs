// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::{Level, event};

use crate::error::{Error, Result};

/// Where a compiled class lives inside a class-output directory.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ArtifactTarget {
    class_name: String,
    path: PathBuf,
}

impl ArtifactTarget {
    /// Maps `class_name` (a binary name such as `org.apache.avro.Schema` or
    /// `org.example.Outer$Inner`) into `class_output_dir`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ClassNotResolvable`] if the name is empty or has an empty segment.
    pub fn new(class_name: &str, class_output_dir: impl AsRef<Path>) -> Result<Self> {
        let path = resolve_artifact_path(class_name, class_output_dir)?;
        Ok(Self {
            class_name: class_name.to_owned(),
            path,
        })
    }

    /// Returns the class's binary name.
    #[must_use]
    pub fn class_name(&self) -> &str {
        &self.class_name
    }

    /// Returns the artifact path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Returns `<class_output_dir>/<package segments>/<SimpleName>.class` for a binary class name.
///
/// This is pure path arithmetic: nothing is read or checked on disk.
///
/// # Errors
///
/// Returns [`Error::ClassNotResolvable`] if the name is empty, has an empty segment, or a
/// segment contains a path separator.
pub fn resolve_artifact_path(class_name: &str, class_output_dir: impl AsRef<Path>) -> Result<PathBuf> {
    let segments = name_segments(class_name)?;
    let mut path = class_output_dir.as_ref().to_path_buf();
    if let Some((simple, package)) = segments.split_last() {
        path.extend(package);
        path.push(format!("{simple}.class"));
    }
    Ok(path)
}

/// Returns the `/`-separated archive member that holds `class_name`, such as
/// `org/apache/avro/Schema.class`.
pub(crate) fn archive_entry_name(class_name: &str) -> Result<String> {
    Ok(format!("{}.class", name_segments(class_name)?.join("/")))
}

fn name_segments(class_name: &str) -> Result<Vec<&str>> {
    let not_resolvable = |reason: &str| Error::ClassNotResolvable {
        class_name: class_name.to_owned(),
        reason: reason.to_owned(),
    };

    if class_name.is_empty() {
        return Err(not_resolvable("empty class name"));
    }
    let segments: Vec<&str> = class_name.split('.').collect();
    for segment in &segments {
        if segment.is_empty() {
            return Err(not_resolvable("empty name segment"));
        }
        if segment.contains(['/', '\\']) {
            return Err(not_resolvable("name segment contains a path separator"));
        }
    }
    Ok(segments)
}

/// Removes a previously emitted artifact so a fresh one can take its place.
///
/// A missing file counts as success, so calling this twice is harmless.
///
/// # Errors
///
/// Returns [`Error::ArtifactWriteFailure`] if the file exists and cannot be removed.
pub fn delete_stale_artifact(path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    match std::fs::remove_file(path) {
        Ok(()) => {
            event!(Level::DEBUG, message = "stale artifact removed", path = %path.display());
            Ok(())
        }
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
        Err(e) => Err(Error::write_failure(path, e)),
    }
}
