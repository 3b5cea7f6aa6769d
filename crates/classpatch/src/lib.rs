// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
#![cfg_attr(docsrs, feature(doc_cfg))]

//! Build-time replacement of one private static method body in a compiled JVM class.
//!
//! Some libraries enforce constraints in private static helpers that cannot be overridden. This
//! crate rewrites the compiled class instead: it resolves the class on a [`Classpath`], swaps the
//! helper's body for a pass-through (or a call to a compatible delegate) and writes the result
//! into the class-output directory, where it shadows the library's copy at run time.
//!
//! The pieces, bottom up:
//!
//! * [`class_file`] decodes and re-encodes class files without losing a byte.
//! * [`rewrite_class`] is the pure transform from `(bytes, RewriteSpec)` to bytes.
//! * [`MethodRewriteEngine`] adds classpath resolution and artifact replacement.
//! * [`BuildTrigger`] runs the engine once when sources carry a marker annotation, as found by
//!   [`scan_source`] / [`scan_tree`].
//! * [`avro`] packages the Apache Avro schema-name relaxation.
//!
//! # Patching a class directly
//!
//! ```no_run
//! # fn example() -> classpatch::Result<()> {
//! use classpatch::{Classpath, MethodRewriteEngine, avro};
//!
//! let classpath = Classpath::new()
//!     .with_entry("target/classes")
//!     .with_entry("target/dependency");
//! let engine = MethodRewriteEngine::new(classpath);
//! let outcome = engine.rewrite_method(&avro::schema_name_relaxation(), "target/classes")?;
//! println!("wrote {}", outcome.artifact.display());
//! # Ok(())
//! # }
//! ```
//!
//! # Errors
//!
//! Every fallible operation returns [`Error`]. A rewrite that cannot be applied (the class is
//! missing, the method is gone or ambiguous, the replacement does not fit) fails before the
//! output directory is modified.

pub use crate::classpath::{Classpath, LoadedClass};
pub use crate::config::TriggerConfig;
pub use crate::descriptor::{FieldType, MethodDescriptor};
pub use crate::error::{Error, Result};
pub use crate::locator::{ArtifactTarget, delete_stale_artifact, resolve_artifact_path};
pub use crate::rewrite::{MethodMatcher, MethodRewriteEngine, Replacement, RewriteOutcome, RewriteSpec, rewrite_class};
pub use crate::source_scan::{
    Annotation, CompilationUnit, Declaration, Import, Marker, marked_elements, scan_source, scan_tree,
};
pub use crate::trigger::{BuildTrigger, ElementKind, MarkedElement, TriggerOutcome};

pub mod avro;
pub mod class_file;
mod classpath;
mod config;
mod descriptor;
mod error;
mod locator;
mod rewrite;
mod source_scan;
mod trigger;
