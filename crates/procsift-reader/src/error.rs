#![forbid(unsafe_code)]

use std::{io, path::PathBuf};

use thiserror::Error;

/// Result type used by `procsift-reader`.
pub type ReaderResult<T> = Result<T, ReaderError>;

/// Errors produced by byte sources.
///
/// Every variant carries enough context (operation, offset/count, source
/// description, underlying OS error) to diagnose a failure without
/// re-running the read.
#[derive(Debug, Error)]
pub enum ReaderError {
    /// Both the sysroot-prefixed and the plain open attempt failed.
    #[error("cannot open file '{}': {source}", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The size query (fstat) failed.
    #[error("stat failed: cannot find size of {desc}: {source}")]
    Stat {
        desc: String,
        #[source]
        source: io::Error,
    },

    /// A positioned read returned an OS-level error.
    ///
    /// Distinct from a short or zero-length successful read, which is the
    /// normal end-of-data signal and not an error.
    #[error("read of {count} bytes at offset {offset} on {desc} failed: {source}")]
    Read {
        count: usize,
        offset: u64,
        desc: String,
        #[source]
        source: io::Error,
    },

    /// A memory-source read started strictly past the end of the buffer.
    #[error("read past end of memory: offset {offset} beyond length {len}")]
    OutOfRange { offset: u64, len: u64 },
}
