// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use crate::classpath::Classpath;

/// Where a [`BuildTrigger`](crate::BuildTrigger) reads classes from and writes them to.
///
/// The class-output directory is the trigger's configuration token: without it, a trigger
/// fails with [`Error::MalformedTrigger`](crate::Error::MalformedTrigger). It is always searched
/// first when resolving classes, ahead of the extra classpath entries.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TriggerConfig {
    classes_dir: Option<PathBuf>,
    classpath: Classpath,
}

impl TriggerConfig {
    /// Environment variable naming the class-output directory.
    pub const CLASSES_DIR_VAR: &'static str = "CLASSPATCH_CLASSES_DIR";

    /// Environment variable holding extra classpath entries as a platform path list.
    pub const CLASSPATH_VAR: &'static str = "CLASSPATCH_CLASSPATH";

    /// Class-output directory used when [`CLASSES_DIR_VAR`](Self::CLASSES_DIR_VAR) is unset.
    pub const DEFAULT_CLASSES_DIR: &'static str = "target/classes";

    /// Creates a configuration with no class-output directory and no classpath entries.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads the configuration from the process environment.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var_os(name))
    }

    /// Reads the configuration through `lookup`, which maps a variable name to its value.
    ///
    /// An unset class-output variable falls back to
    /// [`DEFAULT_CLASSES_DIR`](Self::DEFAULT_CLASSES_DIR); a variable set to an empty value is
    /// kept as-is and rejected when the trigger fires.
    #[must_use]
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<OsString>) -> Self {
        let classes_dir = lookup(Self::CLASSES_DIR_VAR).map_or_else(|| PathBuf::from(Self::DEFAULT_CLASSES_DIR), PathBuf::from);
        let classpath = lookup(Self::CLASSPATH_VAR)
            .map(|list| Classpath::from_path_list(&list))
            .unwrap_or_default();
        Self {
            classes_dir: Some(classes_dir),
            classpath,
        }
    }

    /// Sets the class-output directory.
    #[must_use]
    pub fn classes_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.classes_dir = Some(dir.into());
        self
    }

    /// Appends an extra classpath entry.
    #[must_use]
    pub fn classpath_entry(mut self, entry: impl Into<PathBuf>) -> Self {
        self.classpath.push(entry);
        self
    }

    /// Returns the class-output directory, if configured.
    #[must_use]
    pub fn get_classes_dir(&self) -> Option<&Path> {
        self.classes_dir.as_deref()
    }

    /// Returns the classpath classes are resolved on: the class-output directory first, then the
    /// extra entries.
    #[must_use]
    pub fn effective_classpath(&self) -> Classpath {
        let mut classpath = Classpath::new();
        if let Some(dir) = &self.classes_dir {
            classpath.push(dir);
        }
        for entry in self.classpath.entries() {
            classpath.push(entry);
        }
        classpath
    }
}
