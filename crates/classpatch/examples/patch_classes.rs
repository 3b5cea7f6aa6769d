// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Relaxes Avro schema name validation when the sources ask for it.
//!
//! Usage: `cargo run --example patch_classes -- [source_root]` (default: `src/main/java`).
//!
//! The class-output directory and extra classpath entries come from `CLASSPATCH_CLASSES_DIR`
//! and `CLASSPATCH_CLASSPATH`. Set `RUST_LOG=debug` to see how the class was resolved.

use std::error::Error;
use std::path::PathBuf;

use classpatch::{TriggerConfig, TriggerOutcome, avro};
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt().with_env_filter(EnvFilter::from_default_env()).init();

    let source_root = std::env::args_os()
        .nth(1)
        .map_or_else(|| PathBuf::from("src/main/java"), PathBuf::from);

    let trigger = avro::build_trigger(TriggerConfig::from_env());
    match trigger.run_on_sources(&source_root)? {
        TriggerOutcome::Idle => {
            println!("no @{} in {}", trigger.marker().simple_name(), source_root.display());
        }
        TriggerOutcome::Rewritten { element, outcome } => {
            println!(
                "{element}: patched {} from {} ({} bytes)",
                outcome.artifact.display(),
                outcome.origin.display(),
                outcome.len
            );
        }
    }
    Ok(())
}
