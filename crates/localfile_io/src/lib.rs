// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
#![cfg_attr(docsrs, feature(doc_cfg))]

//! Position-tracked local file adapters for columnar storage writers and readers.
//!
//! Storage formats such as Parquet are usually written through a filesystem client that
//! reports stream positions natively and serves reads at arbitrary offsets. This crate
//! provides the same contract on top of an ordinary local file:
//!
//! * [`LocalPositionOutputStream`] wraps a buffered sequential file handle and maintains a
//!   software byte counter standing in for a native position query.
//! * [`LocalSeekableInputStream`] serves reads at explicit offsets with no shared cursor, so
//!   reads may be issued in any order.
//! * [`FileAdapterFactory`] maps a path and an [`OpenIntent`] to the right adapter.
//!
//! The contracts themselves are traits: [`OutputFile`] / [`PositionOutputStream`] on the
//! write side and [`InputFile`] / [`SeekableInputStream`] on the read side.
//!
//! # Writing and reading back
//!
//! ```no_run
//! # fn example() -> localfile_io::Result<()> {
//! use localfile_io::{FileAdapterFactory, OpenIntent, PositionOutputStream, SeekableInputStream};
//!
//! let factory = FileAdapterFactory::new();
//!
//! let mut out = factory.open_for_write("sample.bin", OpenIntent::CreateOrOverwrite)?;
//! out.write_slice(b"header")?;
//! assert_eq!(out.position(), 6);
//! out.close()?;
//!
//! let input = factory.open_for_read("sample.bin")?;
//! let header = input.read_at(0, 6)?;
//! assert_eq!(&header[..], b"header");
//! # Ok(())
//! # }
//! ```
//!
//! # Parquet
//!
//! [`LocalPositionOutputStream`] implements [`std::io::Write`] and can be passed to
//! `parquet::arrow::ArrowWriter`. [`LocalSeekableInputStream`] implements
//! [`parquet::file::reader::ChunkReader`] and can be passed to
//! `ParquetRecordBatchReaderBuilder::try_new`.
//!
//! ```ignore
//! let out = localfile_io::output_file("sample.parquet").create_or_overwrite(0)?;
//! let mut writer = ArrowWriter::try_new(out, schema, None)?;
//! writer.write(&batch)?;
//! let out = writer.into_inner()?;
//!
//! let input = localfile_io::input_file("sample.parquet").new_stream()?;
//! let reader = ParquetRecordBatchReaderBuilder::try_new(input)?.build()?;
//! ```
//!
//! # Errors
//!
//! Every fallible operation returns [`Error`], which names the offending path. Faults are never
//! retried and never swallowed, with one exception: dropping an output stream that was not
//! closed flushes it on a best-effort basis and logs a failure instead of panicking.

pub use crate::error::{Error, Operation, Result};
pub use crate::factory::{FileAdapterFactory, input_file, output_file};
pub use crate::input_file::{InputFile, LocalInputFile};
pub use crate::input_stream::{LocalSeekableInputStream, PositionalReader, SeekableInputStream};
pub use crate::open_intent::{AdapterOptions, OpenIntent};
pub use crate::output_file::{LocalOutputFile, OutputFile};
pub use crate::output_stream::{LocalPositionOutputStream, PositionOutputStream};

mod chunk_reader;
mod error;
mod factory;
mod input_file;
mod input_stream;
mod open_intent;
mod output_file;
mod output_stream;
