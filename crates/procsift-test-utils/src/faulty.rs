#![forbid(unsafe_code)]

use std::io;

use procsift_reader::{ByteSource, ReaderError, ReaderResult};

/// [`ByteSource`] wrapper that injects read faults from a given offset.
///
/// Reads starting at or past `fail_from` fail with a
/// [`ReaderError::Read`]; everything below passes through. Lets tests
/// observe how callers (in particular the page cache) treat upstream
/// failures.
pub struct FaultySource<U> {
    inner: U,
    fail_from: u64,
}

impl<U: ByteSource> FaultySource<U> {
    pub fn new(inner: U, fail_from: u64) -> Self {
        Self { inner, fail_from }
    }
}

impl<U: ByteSource> ByteSource for FaultySource<U> {
    fn size(&self) -> ReaderResult<u64> {
        self.inner.size()
    }

    fn read_at(&self, offset: u64, buf: &mut [u8]) -> ReaderResult<usize> {
        if offset >= self.fail_from {
            return Err(ReaderError::Read {
                count: buf.len(),
                offset,
                desc: self.describe(),
                source: io::Error::other("injected fault"),
            });
        }
        self.inner.read_at(offset, buf)
    }

    fn describe(&self) -> String {
        format!("faulty wrapper over {}", self.inner.describe())
    }
}
