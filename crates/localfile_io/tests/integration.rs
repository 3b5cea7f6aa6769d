// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

#![allow(clippy::unwrap_used, reason = "Tests use unwrap for brevity")]
#![allow(clippy::missing_panics_doc, reason = "Tests")]
#![allow(missing_docs, reason = "Tests")]
#![allow(clippy::cast_possible_truncation, reason = "Tests use small sizes")]

//! Integration tests for the local file adapters using only the public API.

use std::path::PathBuf;
use std::sync::Arc;

use arrow_array::cast::AsArray;
use arrow_array::types::Int32Type;
use arrow_array::{ArrayRef, Int32Array, RecordBatch, StringArray};
use arrow_schema::{DataType, Field, Schema};
use localfile_io::{
    AdapterOptions, Error, FileAdapterFactory, InputFile, OpenIntent, OutputFile, PositionOutputStream, SeekableInputStream,
};
use parquet::arrow::ArrowWriter;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use parquet::basic::Compression;
use parquet::file::properties::WriterProperties;
use pretty_assertions::assert_eq;
use rstest::rstest;
use tempfile::TempDir;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn scratch(name: &str) -> (TempDir, PathBuf) {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join(name);
    (tmp, path)
}

fn pattern(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i % 251) as u8).collect()
}

// ===========================================================================
// Output adapter
// ===========================================================================

mod output {
    use super::*;
    use pretty_assertions::assert_eq;

    #[rstest]
    #[case::default_buffer(AdapterOptions::new())]
    #[case::tiny_buffer(AdapterOptions::new().buffer_size(7))]
    #[case::huge_buffer(AdapterOptions::new().buffer_size(1 << 20))]
    fn position_is_cumulative_and_content_is_concatenated(#[case] options: AdapterOptions) {
        let (_tmp, path) = scratch("out.bin");
        let factory = FileAdapterFactory::with_options(options);
        let payloads: Vec<Vec<u8>> = [0, 1, 13, 4096, 16_384, 40_000, 3].iter().map(|&n| pattern(n)).collect();

        let mut stream = factory.open_for_write(&path, OpenIntent::CreateExclusive).unwrap();
        let mut expected = Vec::new();
        for payload in &payloads {
            stream.write_slice(payload).unwrap();
            expected.extend_from_slice(payload);
            assert_eq!(stream.position(), expected.len() as u64);
        }
        stream.close().unwrap();

        assert_eq!(std::fs::read(&path).unwrap(), expected);
    }

    #[test]
    fn create_exclusive_leaves_existing_file_untouched() {
        let (_tmp, path) = scratch("existing.bin");
        std::fs::write(&path, b"precious contents").unwrap();

        let err = FileAdapterFactory::new()
            .open_for_write(&path, OpenIntent::CreateExclusive)
            .unwrap_err();

        assert!(matches!(err, Error::AlreadyExists { .. }));
        assert_eq!(err.path(), path);
        assert_eq!(std::fs::read(&path).unwrap(), b"precious contents");
    }

    #[test]
    fn create_or_overwrite_truncates_before_first_write() {
        let (_tmp, path) = scratch("override.bin");
        std::fs::write(&path, [0xFFu8; 1000]).unwrap();

        let mut stream = FileAdapterFactory::new()
            .open_for_write(&path, OpenIntent::CreateOrOverwrite)
            .unwrap();
        assert_eq!(std::fs::metadata(&path).unwrap().len(), 0);
        assert_eq!(stream.position(), 0);

        stream.write_slice(b"new").unwrap();
        stream.close().unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), b"new");
    }

    #[test]
    fn create_or_overwrite_creates_missing_file() {
        let (_tmp, path) = scratch("fresh.bin");
        let stream = FileAdapterFactory::new()
            .open_for_write(&path, OpenIntent::CreateOrOverwrite)
            .unwrap();
        drop(stream);
        assert!(path.exists());
    }

    #[test]
    fn missing_parent_directory_is_not_found() {
        let (_tmp, dir) = scratch("no_such_dir");
        let err = FileAdapterFactory::new()
            .open_for_write(dir.join("out.bin"), OpenIntent::CreateExclusive)
            .unwrap_err();
        // The parent is missing, which the OS reports as NotFound.
        assert!(matches!(err, Error::NotFound { .. }));
    }

    #[test]
    fn output_file_contract() {
        let (_tmp, path) = scratch("contract.bin");
        let file = FileAdapterFactory::new().output_file(&path);

        assert!(!file.supports_block_size());
        assert_eq!(file.default_block_size(), 0);

        let mut stream = file.create(128 * 1024 * 1024).unwrap();
        stream.write_slice(b"once").unwrap();
        stream.close().unwrap();

        assert!(matches!(file.create(0).unwrap_err(), Error::AlreadyExists { .. }));

        let mut stream = file.create_or_overwrite(0).unwrap();
        stream.write_slice(b"twice").unwrap();
        stream.close().unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), b"twice");
    }
}

// ===========================================================================
// Input adapter
// ===========================================================================

mod input {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn open_missing_file_fails_with_not_found() {
        let (_tmp, path) = scratch("missing.bin");
        let err = FileAdapterFactory::new().open_for_read(&path).unwrap_err();
        assert!(matches!(err, Error::NotFound { .. }));
    }

    #[rstest]
    #[case::forward(vec![(0, 10), (10, 100), (110, 1000), (1110, 5000)])]
    #[case::backward(vec![(9000, 1000), (5000, 4000), (100, 4900), (0, 100)])]
    #[case::overlapping(vec![(50, 500), (0, 1000), (499, 2), (9999, 1)])]
    #[case::scattered(vec![(7777, 3), (0, 1), (4096, 4096), (123, 0), (8191, 2)])]
    fn reads_are_order_independent(#[case] ranges: Vec<(u64, usize)>) {
        let (_tmp, path) = scratch("random.bin");
        let content = pattern(10_000);
        std::fs::write(&path, &content).unwrap();

        let stream = FileAdapterFactory::new().open_for_read(&path).unwrap();
        assert_eq!(stream.length(), 10_000);

        for (offset, len) in ranges {
            let start = offset as usize;
            let expected = &content[start..start + len];
            assert_eq!(&stream.read_at(offset, len).unwrap()[..], expected);
        }
    }

    #[test]
    fn input_file_contract() {
        let (_tmp, path) = scratch("contract.bin");
        std::fs::write(&path, pattern(300)).unwrap();

        let file = FileAdapterFactory::new().input_file(&path);
        assert_eq!(file.length().unwrap(), 300);

        let a = file.new_stream().unwrap();
        let b = file.new_stream().unwrap();
        assert_eq!(a.read_at(250, 100).unwrap().len(), 50);
        assert_eq!(b.read_exact_at(0, 300).unwrap().len(), 300);
    }
}

// ===========================================================================
// Parquet round trip
// ===========================================================================

mod parquet_round_trip {
    use super::*;
    use pretty_assertions::assert_eq;

    fn schema() -> Arc<Schema> {
        Arc::new(Schema::new(vec![
            Field::new("c1", DataType::Int32, false),
            Field::new("c2", DataType::Utf8, false),
        ]))
    }

    fn random_string(rng: &mut fastrand::Rng, len: usize) -> String {
        (0..len).map(|_| rng.alphanumeric()).collect()
    }

    #[test]
    fn ten_records_round_trip() {
        let (_tmp, path) = scratch("sample.parquet");
        let mut rng = fastrand::Rng::with_seed(7);

        let ids: Vec<i32> = (1..=10).collect();
        let names: Vec<String> = ids.iter().map(|_| random_string(&mut rng, 64)).collect();

        let batch = RecordBatch::try_new(
            schema(),
            vec![
                Arc::new(Int32Array::from(ids.clone())) as ArrayRef,
                Arc::new(StringArray::from(names.clone())) as ArrayRef,
            ],
        )
        .unwrap();

        let props = WriterProperties::builder()
            .set_compression(Compression::SNAPPY)
            .set_dictionary_enabled(false)
            .set_data_page_size_limit(128 * 1024)
            .build();

        let factory = FileAdapterFactory::new();
        let stream = factory.output_file(&path).create(0).unwrap();
        let mut writer = ArrowWriter::try_new(stream, schema(), Some(props)).unwrap();
        writer.write(&batch).unwrap();
        let mut stream = writer.into_inner().unwrap();

        let written = stream.position();
        stream.close().unwrap();
        assert_eq!(std::fs::metadata(&path).unwrap().len(), written);

        let input = factory.input_file(&path).new_stream().unwrap();
        let reader = ParquetRecordBatchReaderBuilder::try_new(input).unwrap().build().unwrap();

        let mut read_ids = Vec::new();
        let mut read_names = Vec::new();
        for batch in reader {
            let batch = batch.unwrap();
            read_ids.extend(batch.column(0).as_primitive::<Int32Type>().values().iter().copied());
            read_names.extend(batch.column(1).as_string::<i32>().iter().map(|s| s.unwrap().to_owned()));
        }

        assert_eq!(read_ids, ids);
        assert_eq!(read_names, names);
    }

    #[test]
    fn overwriting_an_existing_parquet_file() {
        let (_tmp, path) = scratch("sample.parquet");
        std::fs::write(&path, pattern(5000)).unwrap();

        let batch = RecordBatch::try_new(
            schema(),
            vec![
                Arc::new(Int32Array::from(vec![42])) as ArrayRef,
                Arc::new(StringArray::from(vec!["only"])) as ArrayRef,
            ],
        )
        .unwrap();

        let stream = localfile_io::output_file(&path).create_or_overwrite(0).unwrap();
        let mut writer = ArrowWriter::try_new(stream, schema(), None).unwrap();
        writer.write(&batch).unwrap();
        let _ = writer.close().unwrap();

        let input = localfile_io::input_file(&path).new_stream().unwrap();
        let builder = ParquetRecordBatchReaderBuilder::try_new(input).unwrap();
        assert_eq!(builder.metadata().file_metadata().num_rows(), 1);
    }

    #[test]
    fn rerun_removes_the_previous_file_before_creating() {
        let (_tmp, path) = scratch("sample.parquet");
        let write_one = |id: i32| {
            let batch = RecordBatch::try_new(
                schema(),
                vec![
                    Arc::new(Int32Array::from(vec![id])) as ArrayRef,
                    Arc::new(StringArray::from(vec!["run"])) as ArrayRef,
                ],
            )
            .unwrap();
            let stream = localfile_io::output_file(&path).create(0).unwrap();
            let mut writer = ArrowWriter::try_new(stream, schema(), None).unwrap();
            writer.write(&batch).unwrap();
            let _ = writer.close().unwrap();
        };

        write_one(1);
        let err = localfile_io::output_file(&path).create(0).unwrap_err();
        assert!(matches!(err, Error::AlreadyExists { .. }), "{err}");

        std::fs::remove_file(&path).unwrap();
        write_one(2);

        let input = localfile_io::input_file(&path).new_stream().unwrap();
        let reader = ParquetRecordBatchReaderBuilder::try_new(input).unwrap().build().unwrap();
        let ids: Vec<i32> = reader
            .flat_map(|batch| batch.unwrap().column(0).as_primitive::<Int32Type>().values().to_vec())
            .collect();
        assert_eq!(ids, vec![2]);
    }
}
