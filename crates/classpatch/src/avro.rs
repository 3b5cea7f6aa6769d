// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Relaxes Apache Avro's schema name validation.
//!
//! Avro rejects record and field names that are not valid Java identifiers by calling the
//! private static `org.apache.avro.Schema.validateName(String)`. The rewrite here turns that
//! method into one that returns its argument, so any name is accepted.

use crate::config::TriggerConfig;
use crate::descriptor::FieldType;
use crate::rewrite::{MethodMatcher, Replacement, RewriteSpec};
use crate::source_scan::Marker;
use crate::trigger::BuildTrigger;

/// The class holding the validation method.
pub const SCHEMA_CLASS: &str = "org.apache.avro.Schema";

/// The validation method.
pub const VALIDATE_NAME: &str = "validateName";

/// The annotation that requests the rewrite when present on a class being compiled.
pub const MARKER: &str = "com.tideworks.annotation.InvokeByteCodePatching";

/// `private static String validateName(String)` in [`SCHEMA_CLASS`] becomes `return name;`.
#[must_use]
pub fn schema_name_relaxation() -> RewriteSpec {
    RewriteSpec::new(
        SCHEMA_CLASS,
        MethodMatcher::new(VALIDATE_NAME, vec![FieldType::string()], Some(FieldType::string())),
        Replacement::ReturnArgument(0),
    )
}

/// Returns the [`MARKER`] annotation.
#[must_use]
pub fn marker() -> Marker {
    Marker::new(MARKER)
}

/// A trigger that applies [`schema_name_relaxation`] when [`MARKER`] is present.
#[must_use]
pub fn build_trigger(config: TriggerConfig) -> BuildTrigger {
    BuildTrigger::new(marker(), schema_name_relaxation(), config)
}
