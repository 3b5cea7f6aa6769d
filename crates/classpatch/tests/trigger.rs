// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

#![allow(clippy::unwrap_used, reason = "Tests use unwrap for brevity")]
#![allow(clippy::missing_panics_doc, reason = "Tests")]
#![allow(missing_docs, reason = "Tests")]

//! A build trigger driven by Java sources on disk.

use std::path::Path;

use classpatch::{ElementKind, Error, TriggerConfig, TriggerOutcome, avro, rewrite_class, scan_tree};
use pretty_assertions::assert_eq;
use tempfile::TempDir;

mod util;

struct Build {
    sources: TempDir,
    classes: TempDir,
    dependency: TempDir,
}

impl Build {
    fn new() -> Self {
        let build = Self {
            sources: TempDir::new().unwrap(),
            classes: TempDir::new().unwrap(),
            dependency: TempDir::new().unwrap(),
        };
        util::put_class(build.dependency.path(), avro::SCHEMA_CLASS, &util::schema_class());
        build
    }

    fn source(&self, relative: &str, text: &str) -> &Self {
        let path = self.sources.path().join(relative);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, text).unwrap();
        self
    }

    fn config(&self) -> TriggerConfig {
        TriggerConfig::new()
            .classes_dir(self.classes.path())
            .classpath_entry(self.dependency.path())
    }

    fn artifact(&self) -> std::path::PathBuf {
        self.classes.path().join("org/apache/avro/Schema.class")
    }
}

const DATA_LOAD: &str = r"
package com.tideworks.data_load;

import com.tideworks.annotation.InvokeByteCodePatching;
import org.apache.avro.Schema;

@InvokeByteCodePatching
public class DataLoad {
    public static void main(String[] args) throws Exception {
        Schema schema = new Schema.Parser().parse(args[0]);
    }
}
";

const PLAIN: &str = r#"
package com.tideworks.data_load;

/** Mentions @InvokeByteCodePatching only in a comment. */
@SuppressWarnings("unused")
final class Plain {
    private static final String NOTE = "@InvokeByteCodePatching";
}
"#;

#[test]
fn no_marker_leaves_classes_untouched() {
    let build = Build::new();
    build.source("com/tideworks/data_load/Plain.java", PLAIN);
    std::fs::write(build.classes.path().join("Existing.class"), b"compiled").unwrap();
    let before = util::dir_checksum(build.classes.path());

    let trigger = avro::build_trigger(build.config());
    let outcome = trigger.run_on_sources(build.sources.path()).unwrap();

    assert_eq!(outcome, TriggerOutcome::Idle);
    assert_eq!(util::dir_checksum(build.classes.path()), before);
}

#[test]
fn marked_class_patches_the_schema() {
    let build = Build::new();
    build
        .source("com/tideworks/data_load/DataLoad.java", DATA_LOAD)
        .source("com/tideworks/data_load/Plain.java", PLAIN);

    let trigger = avro::build_trigger(build.config());
    let TriggerOutcome::Rewritten { element, outcome } = trigger.run_on_sources(build.sources.path()).unwrap() else {
        panic!("the trigger did not fire");
    };

    assert_eq!(element.kind, ElementKind::Class);
    assert_eq!(element.qualified_name.as_deref(), Some("com.tideworks.data_load.DataLoad"));
    assert_eq!(element.line, 7);
    assert_eq!(outcome.artifact, build.artifact());
    assert_eq!(
        std::fs::read(build.artifact()).unwrap(),
        rewrite_class(&util::schema_class(), &avro::schema_name_relaxation()).unwrap()
    );
}

#[test]
fn several_marked_elements_rewrite_once_from_the_first() {
    let build = Build::new();
    build
        .source("a/First.java", "package a; @com.tideworks.annotation.InvokeByteCodePatching class First {}")
        .source("b/Second.java", "package b; @com.tideworks.annotation.InvokeByteCodePatching enum Second {}");

    let units = scan_tree(build.sources.path()).unwrap();
    let marked = classpatch::marked_elements(&units, &avro::marker());
    assert_eq!(marked.len(), 2);

    let outcome = avro::build_trigger(build.config()).run_on_units(&units).unwrap();
    let TriggerOutcome::Rewritten { element, .. } = outcome else {
        panic!("the trigger did not fire");
    };
    assert_eq!(element.name, "First");
    assert_eq!(std::fs::read_dir(build.classes.path()).unwrap().count(), 1);
}

#[test]
fn marker_on_an_interface_is_rejected_before_any_write() {
    let build = Build::new();
    build.source(
        "a/Api.java",
        "package a; import com.tideworks.annotation.*; @InvokeByteCodePatching public interface Api {}",
    );
    let before = util::dir_checksum(build.classes.path());

    let err = avro::build_trigger(build.config())
        .run_on_sources(build.sources.path())
        .unwrap_err();

    match &err {
        Error::MalformedTrigger { element, .. } => assert!(element.starts_with("interface a.Api"), "{element}"),
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(util::dir_checksum(build.classes.path()), before);
}

#[test]
fn schema_missing_from_classpath() {
    let build = Build::new();
    build.source("DataLoad.java", DATA_LOAD);
    let config = TriggerConfig::new().classes_dir(build.classes.path());

    let err = avro::build_trigger(config).run_on_sources(build.sources.path()).unwrap_err();
    assert!(matches!(err, Error::ClassNotResolvable { .. }), "{err}");
    assert!(!build.artifact().exists());
}

#[test]
fn unreadable_source_root() {
    let missing = Path::new("definitely/not/a/source/root");
    let err = avro::build_trigger(TriggerConfig::new())
        .run_on_sources(missing)
        .unwrap_err();
    assert!(matches!(err, Error::Io { .. }), "{err}");
}
