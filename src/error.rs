//! Error types for file persistence of a `HashTable`

use std::{io, path::PathBuf};

/// Errors that can occur while loading a table from, or writing it to, a file
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// The input file could not be opened.
    #[error("failed to open {}: {source}", .path.display())]
    Open {
        /// Path of the input file
        path: PathBuf,
        /// Underlying I/O failure
        #[source]
        source: io::Error,
    },

    /// The input file was opened but could not be read to the end as UTF-8 text.
    #[error("failed to read {}: {source}", .path.display())]
    Read {
        /// Path of the input file
        path: PathBuf,
        /// Underlying I/O failure
        #[source]
        source: io::Error,
    },

    /// The output file could not be created or truncated.
    #[error("failed to create {}: {source}", .path.display())]
    Create {
        /// Path of the output file
        path: PathBuf,
        /// Underlying I/O failure
        #[source]
        source: io::Error,
    },

    /// A pair renders to text the line format cannot hold. The output file was left untouched.
    #[error("cannot write {}: pair {line} is unrepresentable, {reason}", .path.display())]
    Unrepresentable {
        /// Path of the output file
        path: PathBuf,
        /// 1-based line the pair would have occupied
        line: usize,
        /// Which rule of the line format the pair breaks
        reason: &'static str,
    },

    /// Writing or flushing a pair to the output file failed.
    #[error("failed to write {}: {source}", .path.display())]
    Write {
        /// Path of the output file
        path: PathBuf,
        /// Underlying I/O failure
        #[source]
        source: io::Error,
    },
}

/// Result alias used by the fallible persistence functions
pub type Result<T> = std::result::Result<T, Error>;
