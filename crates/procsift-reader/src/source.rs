#![forbid(unsafe_code)]

use crate::ReaderResult;

/// Random-access read capability shared by file-backed, memory-backed and
/// cached readers.
///
/// This trait is intentionally small:
/// - `size`/`read_at` cover the random-access path.
/// - `read_string` has a generic byte-at-a-time default; the page cache
///   overrides it to memoize results.
///
/// Handles are shared via `Arc` where a consumer (such as a
/// [`PageCache`](crate::PageCache)) must not outlive its upstream.
pub trait ByteSource {
    /// Total addressable length of the underlying content.
    ///
    /// Fails for a file-backed source if the stat call fails; infallible
    /// for memory-backed sources.
    fn size(&self) -> ReaderResult<u64>;

    /// Read up to `buf.len()` bytes starting at `offset`.
    ///
    /// Returns the number of bytes actually placed into `buf`. A short
    /// count signals end-of-data, never a retryable condition.
    fn read_at(&self, offset: u64, buf: &mut [u8]) -> ReaderResult<usize>;

    /// Human-readable label for diagnostics only; no behavioral contract.
    fn describe(&self) -> String;

    /// Read a NUL-terminated string starting at `offset`.
    ///
    /// Accumulates bytes one at a time until a zero byte or the `size()`
    /// boundary. A read failure partway through truncates the result
    /// rather than propagating.
    fn read_string(&self, offset: u64) -> String {
        read_string_from(self, offset)
    }
}

/// Generic byte-at-a-time string read, shared between the trait default
/// and the page cache's memoizing override.
pub(crate) fn read_string_from<S>(source: &S, offset: u64) -> String
where
    S: ByteSource + ?Sized,
{
    let Ok(end) = source.size() else {
        return String::new();
    };

    let mut bytes = Vec::new();
    let mut byte = [0u8; 1];
    let mut pos = offset;
    while pos < end {
        match source.read_at(pos, &mut byte) {
            Ok(1) => {
                if byte[0] == 0 {
                    break;
                }
                bytes.push(byte[0]);
                pos += 1;
            }
            // Short read or failure truncates the string.
            _ => break,
        }
    }

    String::from_utf8_lossy(&bytes).into_owned()
}
