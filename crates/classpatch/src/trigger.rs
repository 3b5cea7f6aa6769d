// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::fmt;
use std::path::{Path, PathBuf};

use tracing::{Level, event};

use crate::config::TriggerConfig;
use crate::error::{Error, Result};
use crate::rewrite::{MethodRewriteEngine, RewriteOutcome, RewriteSpec};
use crate::source_scan::{CompilationUnit, Marker, marked_elements, scan_tree};

/// What kind of declaration an annotation sits on.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum ElementKind {
    /// A `package` declaration.
    Package,
    /// A class.
    Class,
    /// An interface.
    Interface,
    /// An enum.
    Enum,
    /// A record.
    Record,
    /// An `@interface`.
    AnnotationType,
    /// A method.
    Method,
    /// A constructor.
    Constructor,
    /// A field or enum constant.
    Field,
}

impl ElementKind {
    /// Returns `true` for classes, enums and records.
    #[must_use]
    pub const fn is_class(self) -> bool {
        matches!(self, Self::Class | Self::Enum | Self::Record)
    }
}

impl fmt::Display for ElementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Package => "package",
            Self::Class => "class",
            Self::Interface => "interface",
            Self::Enum => "enum",
            Self::Record => "record",
            Self::AnnotationType => "annotation type",
            Self::Method => "method",
            Self::Constructor => "constructor",
            Self::Field => "field",
        })
    }
}

/// A declaration carrying the marker annotation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MarkedElement {
    /// What is declared.
    pub kind: ElementKind,
    /// The simple name.
    pub name: String,
    /// The qualified name, for packages and types.
    pub qualified_name: Option<String>,
    /// The source file, if known.
    pub source: Option<PathBuf>,
    /// 1-based line of the marker annotation.
    pub line: usize,
}

impl fmt::Display for MarkedElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.kind, self.qualified_name.as_deref().unwrap_or(&self.name))?;
        if let Some(source) = &self.source {
            write!(f, " ({}:{})", source.display(), self.line)?;
        }
        Ok(())
    }
}

/// What a [`BuildTrigger`] run did.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TriggerOutcome {
    /// No marked element was present; nothing was touched.
    Idle,
    /// The first marked element triggered one rewrite.
    Rewritten {
        /// The element that triggered the rewrite.
        element: MarkedElement,
        /// What the rewrite produced.
        outcome: RewriteOutcome,
    },
}

/// Runs one rewrite when a compilation carries the marker annotation.
///
/// Only the first marked element is examined; any number of marked elements cause exactly one
/// rewrite.
///
/// # Examples
///
/// ```no_run
/// # fn example() -> classpatch::Result<()> {
/// use classpatch::{TriggerConfig, TriggerOutcome, avro};
///
/// let trigger = avro::build_trigger(TriggerConfig::from_env());
/// match trigger.run_on_sources("src/main/java")? {
///     TriggerOutcome::Idle => println!("nothing to patch"),
///     TriggerOutcome::Rewritten { element, outcome } => {
///         println!("{element} patched {}", outcome.artifact.display());
///     }
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Debug)]
pub struct BuildTrigger {
    marker: Marker,
    spec: RewriteSpec,
    config: TriggerConfig,
}

impl BuildTrigger {
    /// Creates a trigger that applies `spec` when `marker` is present.
    #[must_use]
    pub fn new(marker: Marker, spec: RewriteSpec, config: TriggerConfig) -> Self {
        Self { marker, spec, config }
    }

    /// Returns the marker annotation.
    #[must_use]
    pub fn marker(&self) -> &Marker {
        &self.marker
    }

    /// Returns the rewrite applied when the trigger fires.
    #[must_use]
    pub fn spec(&self) -> &RewriteSpec {
        &self.spec
    }

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> &TriggerConfig {
        &self.config
    }

    /// Fires on the first of `marked`, or does nothing if it is empty.
    ///
    /// # Errors
    ///
    /// [`Error::MalformedTrigger`] if the first element is not a class, enum or record, has no
    /// qualified name, or the class-output directory is missing or not a directory. Otherwise any
    /// error of [`MethodRewriteEngine::rewrite_method`].
    pub fn run(&self, marked: &[MarkedElement]) -> Result<TriggerOutcome> {
        let Some(element) = marked.first() else {
            event!(Level::TRACE, message = "no marked element", marker = self.marker.qualified_name());
            return Ok(TriggerOutcome::Idle);
        };

        let classes_dir = self.validate(element)?;
        event!(
            Level::DEBUG,
            message = "trigger fired",
            element = %element,
            marked = marked.len(),
            classes_dir = %classes_dir.display()
        );

        let engine = MethodRewriteEngine::new(self.config.effective_classpath());
        let outcome = engine.rewrite_method(&self.spec, classes_dir)?;
        Ok(TriggerOutcome::Rewritten {
            element: element.clone(),
            outcome,
        })
    }

    /// Finds marked elements in already scanned units and fires on the first.
    ///
    /// # Errors
    ///
    /// See [`run`](Self::run).
    pub fn run_on_units(&self, units: &[CompilationUnit]) -> Result<TriggerOutcome> {
        self.run(&marked_elements(units, &self.marker))
    }

    /// Scans the Java sources under `source_root` and fires on the first marked element.
    ///
    /// # Errors
    ///
    /// [`Error::Io`] if the tree cannot be scanned; otherwise see [`run`](Self::run).
    pub fn run_on_sources(&self, source_root: impl AsRef<Path>) -> Result<TriggerOutcome> {
        self.run_on_units(&scan_tree(source_root)?)
    }

    fn validate(&self, element: &MarkedElement) -> Result<&Path> {
        let malformed = |reason: String| Error::MalformedTrigger {
            element: element.to_string(),
            reason,
        };

        if !element.kind.is_class() {
            return Err(malformed(format!(
                "the marker must be applied to a class, enum or record, not a {}",
                element.kind
            )));
        }
        if element.qualified_name.as_deref().is_none_or(str::is_empty) {
            return Err(malformed("the element has no qualified name".to_owned()));
        }

        let classes_dir = self
            .config
            .get_classes_dir()
            .filter(|dir| !dir.as_os_str().is_empty())
            .ok_or_else(|| malformed("no class-output directory is configured".to_owned()))?;
        if classes_dir.exists() && !classes_dir.is_dir() {
            return Err(malformed(format!(
                "class-output path {} is not a directory",
                classes_dir.display()
            )));
        }
        Ok(classes_dir)
    }
}
