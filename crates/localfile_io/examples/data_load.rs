// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Writes a few records to a Parquet file on the local filesystem and reads them back.
//!
//! Usage: `cargo run --example data_load -- [record_count] [path]` (defaults: 10 records,
//! `sample.parquet` in the working directory). An existing file at the path is replaced. Set
//! `RUST_LOG=debug` to see the adapters' events.

use std::error::Error;
use std::io::ErrorKind;
use std::path::PathBuf;
use std::sync::Arc;

use arrow_array::cast::AsArray;
use arrow_array::types::Int32Type;
use arrow_array::{ArrayRef, Int32Array, RecordBatch, StringArray};
use arrow_schema::{DataType, Field, Schema};
use localfile_io::{InputFile, OutputFile, PositionOutputStream};
use parquet::arrow::ArrowWriter;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use parquet::basic::Compression;
use parquet::file::properties::WriterProperties;
use tracing::{Level, event};
use tracing_subscriber::EnvFilter;

const STRING_LEN: usize = 64;

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt().with_env_filter(EnvFilter::from_default_env()).init();

    let mut args = std::env::args().skip(1);
    let record_count: i32 = match args.next() {
        Some(arg) => arg.parse()?,
        None => 10,
    };
    let path = args.next().map_or_else(|| PathBuf::from("sample.parquet"), PathBuf::from);

    match std::fs::remove_file(&path) {
        Err(e) if e.kind() != ErrorKind::NotFound => return Err(e.into()),
        _ => {}
    }

    let schema = Arc::new(Schema::new(vec![
        Field::new("c1", DataType::Int32, false),
        Field::new("c2", DataType::Utf8, false),
    ]));

    let mut rng = fastrand::Rng::new();
    let ids: Vec<i32> = (1..=record_count).collect();
    let names: Vec<String> = ids
        .iter()
        .map(|_| (0..STRING_LEN).map(|_| rng.alphanumeric()).collect())
        .collect();
    let batch = RecordBatch::try_new(
        Arc::clone(&schema),
        vec![
            Arc::new(Int32Array::from(ids)) as ArrayRef,
            Arc::new(StringArray::from(names)) as ArrayRef,
        ],
    )?;

    let props = WriterProperties::builder()
        .set_max_row_group_size(256 * 1024 * 1024)
        .set_data_page_size_limit(128 * 1024)
        .set_compression(Compression::SNAPPY)
        .set_dictionary_enabled(false)
        .build();

    let stream = localfile_io::output_file(&path).create(0)?;
    let mut writer = ArrowWriter::try_new(stream, schema, Some(props))?;
    writer.write(&batch)?;
    let mut stream = writer.into_inner()?;
    event!(Level::INFO, message = "parquet file written", path = %path.display(), bytes = stream.position());
    stream.close()?;

    let input = localfile_io::input_file(&path).new_stream()?;
    let reader = ParquetRecordBatchReaderBuilder::try_new(input)?.build()?;
    for batch in reader {
        let batch = batch?;
        let c1 = batch.column(0).as_primitive::<Int32Type>();
        let c2 = batch.column(1).as_string::<i32>();
        for (id, name) in c1.values().iter().zip(c2.iter()) {
            println!("{{\"c1\": {id}, \"c2\": \"{}\"}}", name.unwrap_or_default());
        }
    }

    Ok(())
}
