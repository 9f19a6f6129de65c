#![forbid(unsafe_code)]

use std::sync::atomic::{AtomicU64, Ordering};

use procsift_reader::{ByteSource, ReaderResult};

/// [`ByteSource`] wrapper that counts positioned reads.
///
/// Used to verify cache behavior: a read served from a page cache must
/// not reach the upstream source a second time.
pub struct CountingSource<U> {
    inner: U,
    reads: AtomicU64,
}

impl<U: ByteSource> CountingSource<U> {
    pub fn new(inner: U) -> Self {
        Self {
            inner,
            reads: AtomicU64::new(0),
        }
    }

    /// Number of `read_at` calls that reached the wrapped source.
    pub fn reads(&self) -> u64 {
        self.reads.load(Ordering::Relaxed)
    }
}

impl<U: ByteSource> ByteSource for CountingSource<U> {
    fn size(&self) -> ReaderResult<u64> {
        self.inner.size()
    }

    fn read_at(&self, offset: u64, buf: &mut [u8]) -> ReaderResult<usize> {
        self.reads.fetch_add(1, Ordering::Relaxed);
        self.inner.read_at(offset, buf)
    }

    fn describe(&self) -> String {
        format!("counting wrapper over {}", self.inner.describe())
    }
}
