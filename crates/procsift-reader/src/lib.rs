//! # procsift-reader
//!
//! Byte-addressable readers for random-access binary inspection (ELF
//! images, debug info, core files). Higher layers fetch arbitrary
//! `(offset, length)` ranges through one uniform [`ByteSource`] trait,
//! regardless of whether the bytes live in an open file, an in-memory
//! image, or behind a paging cache.
//!
//! ## Core Components
//!
//! - [`ByteSource`]: random-access read contract shared by every backend
//! - [`FileSource`]: pread-backed file reader with lazy, memoized size
//! - [`MemorySource`]: non-owning view over caller-provided bytes
//! - [`PageCache`]: bounded LRU page cache over any other source, plus a
//!   memoized NUL-terminated string lookup
//! - [`load_file`]: the standard "open this path for cached random
//!   access" entry point
//!
//! ## EOF Semantics (Normative)
//!
//! **Contract:** `read_at` returns `Ok(n)` with `0 <= n <= buf.len()`.
//! A short count means no more data exists at that position; it is never
//! a retryable condition. File and cache sources report a read at or past
//! the end as `Ok(0)`. A [`MemorySource`] instead fails with
//! [`ReaderError::OutOfRange`] when the starting offset lies strictly
//! past its length (`offset == len` still yields `Ok(0)`). The asymmetry
//! is deliberate and covered by tests.
//!
//! ## Fault Absorption (Normative)
//!
//! A [`PageCache`] never surfaces upstream read errors from `read_at`:
//! a failed page load becomes a zero-valid page, indistinguishable from
//! end-of-data for its callers. The absorption is observable through
//! [`PageCache::absorbed_faults`] and `tracing` output. `size()` and
//! `open` still fail loudly.

#![forbid(unsafe_code)]

mod cache;
mod error;
mod file;
mod loader;
mod memory;
mod path;
mod source;

pub use cache::{MAX_PAGES, PAGE_SIZE, PageCache};
pub use error::{ReaderError, ReaderResult};
pub use file::{FileOptions, FileSource};
pub use loader::load_file;
pub use memory::MemorySource;
pub use path::resolve_link;
pub use source::ByteSource;
