// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::ffi::OsStr;
use std::fs::File;
use std::io::{BufReader, ErrorKind, Read};
use std::path::{Path, PathBuf};

use bytes::Bytes;
use tracing::{Level, event};
use zip::ZipArchive;
use zip::result::ZipError;

use crate::error::{Error, Result};
use crate::locator::{archive_entry_name, resolve_artifact_path};

/// A class file found on the [`Classpath`].
#[derive(Clone, Debug)]
pub struct LoadedClass {
    /// The class file, or the archive holding it.
    pub origin: PathBuf,
    /// The archive member the bytes were read from, when `origin` is an archive.
    pub archive_entry: Option<String>,
    /// The raw class file.
    pub bytes: Bytes,
}

/// An ordered list of class directories and `.jar` / `.zip` archives searched for compiled
/// classes.
///
/// The first entry holding the class wins. Entries that do not exist are skipped, the way a
/// JVM tolerates stale classpath elements.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Classpath {
    entries: Vec<PathBuf>,
}

impl Classpath {
    /// Creates an empty classpath.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a platform path list, such as the value of a `CLASSPATH`-style variable.
    ///
    /// Empty elements are ignored.
    #[must_use]
    pub fn from_path_list(list: &OsStr) -> Self {
        Self {
            entries: std::env::split_paths(list).filter(|p| !p.as_os_str().is_empty()).collect(),
        }
    }

    /// Appends `entry` unless it is already present.
    #[must_use]
    pub fn with_entry(mut self, entry: impl Into<PathBuf>) -> Self {
        self.push(entry);
        self
    }

    /// Appends `entry` unless it is already present.
    pub fn push(&mut self, entry: impl Into<PathBuf>) {
        let entry = entry.into();
        if !self.entries.contains(&entry) {
            self.entries.push(entry);
        }
    }

    /// Returns the entries in search order.
    #[must_use]
    pub fn entries(&self) -> &[PathBuf] {
        &self.entries
    }

    /// Reads the class file for `class_name` from the first entry that holds it.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ClassNotResolvable`] if the name is malformed or no entry holds the class,
    /// and [`Error::Io`] if a candidate file exists but cannot be read, or an archive on the
    /// classpath is corrupt.
    pub fn load(&self, class_name: &str) -> Result<LoadedClass> {
        for entry in &self.entries {
            let found = if is_archive(entry) {
                load_from_archive(entry, class_name)?
            } else {
                load_from_directory(entry, class_name)?
            };
            if let Some(loaded) = found {
                event!(
                    Level::DEBUG,
                    message = "class resolved",
                    class = class_name,
                    origin = %loaded.origin.display(),
                    archive_entry = loaded.archive_entry.as_deref(),
                    len = loaded.bytes.len()
                );
                return Ok(loaded);
            }
        }

        Err(Error::ClassNotResolvable {
            class_name: class_name.to_owned(),
            reason: format!("not found in {} classpath entries", self.entries.len()),
        })
    }
}

fn is_archive(entry: &Path) -> bool {
    entry
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("jar") || ext.eq_ignore_ascii_case("zip"))
        && !entry.is_dir()
}

fn load_from_directory(dir: &Path, class_name: &str) -> Result<Option<LoadedClass>> {
    let candidate = resolve_artifact_path(class_name, dir)?;
    match std::fs::read(&candidate) {
        Ok(bytes) => Ok(Some(LoadedClass {
            origin: candidate,
            archive_entry: None,
            bytes: Bytes::from(bytes),
        })),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) => Err(Error::io(&candidate, e)),
    }
}

fn load_from_archive(archive: &Path, class_name: &str) -> Result<Option<LoadedClass>> {
    let name = archive_entry_name(class_name)?;
    let file = match File::open(archive) {
        Ok(file) => file,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(Error::io(archive, e)),
    };

    let mut zip = ZipArchive::new(BufReader::new(file)).map_err(|e| Error::io(archive, invalid_archive(e)))?;
    let mut bytes = Vec::new();
    {
        let mut member = match zip.by_name(&name) {
            Ok(member) => member,
            Err(ZipError::FileNotFound) => return Ok(None),
            Err(e) => return Err(Error::io(archive, invalid_archive(e))),
        };
        let _ = member.read_to_end(&mut bytes).map_err(|e| Error::io(archive, e))?;
    }

    Ok(Some(LoadedClass {
        origin: archive.to_path_buf(),
        archive_entry: Some(name),
        bytes: Bytes::from(bytes),
    }))
}

fn invalid_archive(e: ZipError) -> std::io::Error {
    std::io::Error::new(ErrorKind::InvalidData, e)
}
