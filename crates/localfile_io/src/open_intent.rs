// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

/// How a file should be opened by the adapter factory.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum OpenIntent {
    /// Create a new file; fail if the target already exists.
    ///
    /// The existence check and the creation are a single atomic operation.
    CreateExclusive,

    /// Create the file if it is absent, otherwise truncate it to zero length.
    CreateOrOverwrite,

    /// Open an existing file for positional reads; fail if it does not exist.
    ReadOnly,
}

impl OpenIntent {
    /// Returns `true` if the intent produces an output adapter.
    #[must_use]
    pub const fn is_write(self) -> bool {
        matches!(self, Self::CreateExclusive | Self::CreateOrOverwrite)
    }

    pub(crate) fn to_std(self) -> std::fs::OpenOptions {
        let mut options = std::fs::OpenOptions::new();
        match self {
            Self::CreateExclusive => {
                let _ = options.write(true).create_new(true);
            }
            Self::CreateOrOverwrite => {
                let _ = options.write(true).create(true).truncate(true);
            }
            Self::ReadOnly => {
                let _ = options.read(true);
            }
        }
        options
    }
}

/// Tunables for the adapters produced by the factory.
///
/// None of these are part of the external contract; they may be retuned without affecting
/// correctness.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AdapterOptions {
    buffer_size: usize,
}

impl AdapterOptions {
    /// Default capacity of the write buffer in front of the file.
    pub const DEFAULT_BUFFER_SIZE: usize = 16 * 1024;

    /// Creates options with the default buffer size.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            buffer_size: Self::DEFAULT_BUFFER_SIZE,
        }
    }

    /// Sets the capacity of the write buffer in bytes. Zero is raised to one.
    #[must_use]
    pub const fn buffer_size(mut self, buffer_size: usize) -> Self {
        self.buffer_size = if buffer_size == 0 { 1 } else { buffer_size };
        self
    }

    /// Returns the configured write buffer capacity.
    #[must_use]
    pub const fn get_buffer_size(&self) -> usize {
        self.buffer_size
    }
}

impl Default for AdapterOptions {
    fn default() -> Self {
        Self::new()
    }
}
