#![forbid(unsafe_code)]

use std::{
    collections::{HashMap, VecDeque},
    sync::Arc,
};

use parking_lot::Mutex;
use tracing::debug;

use crate::{
    ByteSource, ReaderResult,
    source::read_string_from,
};

/// Fixed page size in bytes. Power of two.
pub const PAGE_SIZE: usize = 4096;

/// Maximum number of resident pages per cache.
pub const MAX_PAGES: usize = 16;

/// One cached page: an aligned window into the upstream source.
///
/// `valid` may be short of the page size at end-of-data, or zero when the
/// upstream load failed. The buffer is allocated once per slot and reused
/// for whatever offset the slot is refreshed to; slots are only freed
/// together with the cache.
struct Page {
    offset: u64,
    valid: usize,
    data: Box<[u8]>,
}

impl Page {
    fn new(page_size: usize) -> Self {
        Self {
            offset: 0,
            valid: 0,
            data: vec![0u8; page_size].into_boxed_slice(),
        }
    }
}

/// Cache state mutated on every read.
struct CacheState {
    /// Slot arena, capped at the configured page count.
    slots: Vec<Page>,
    /// Slot indices in recency order, front = most recently used.
    /// Invariant: every allocated slot appears exactly once, so resident
    /// page offsets are unique.
    lru: VecDeque<usize>,
    /// NUL-terminated string results keyed by start offset. Never
    /// invalidated: strings in the backing source are assumed immutable.
    strings: HashMap<u64, String>,
    /// Upstream read errors converted into empty pages.
    absorbed_faults: u64,
}

/// [`ByteSource`] that wraps another source behind a bounded set of
/// fixed-size pages with least-recently-used eviction, plus a memoized
/// NUL-terminated string lookup.
///
/// The upstream handle is shared (`Arc`), not owned outright: the same
/// file may be read directly and through a cache at the same time. The
/// cache assumes the upstream's content does not change between loads;
/// that is documented, not enforced.
///
/// `read_at` never fails on its own. Upstream errors during a page load
/// are absorbed into a zero-valid page, which callers see as ordinary
/// end-of-data; [`absorbed_faults`](Self::absorbed_faults) exposes how
/// often that happened. `size()` delegates upstream and still fails
/// loudly.
///
/// One instance is designed for use from one thread at a time; internal
/// state sits behind a `Mutex` only so that reads can go through `&self`.
pub struct PageCache<U: ?Sized> {
    page_size: usize,
    max_pages: usize,
    state: Mutex<CacheState>,
    upstream: Arc<U>,
}

impl<U: ByteSource + ?Sized> PageCache<U> {
    /// Cache with the default geometry ([`PAGE_SIZE`], [`MAX_PAGES`]).
    pub fn new(upstream: Arc<U>) -> Self {
        Self::with_geometry(upstream, PAGE_SIZE, MAX_PAGES)
    }

    /// Cache with an explicit geometry.
    ///
    /// # Panics
    ///
    /// Panics if `page_size` is not a power of two or `max_pages` is zero.
    pub fn with_geometry(upstream: Arc<U>, page_size: usize, max_pages: usize) -> Self {
        assert!(page_size.is_power_of_two(), "page size must be a power of two");
        assert!(max_pages > 0, "cache must hold at least one page");
        Self {
            page_size,
            max_pages,
            state: Mutex::new(CacheState {
                slots: Vec::with_capacity(max_pages),
                lru: VecDeque::with_capacity(max_pages),
                strings: HashMap::new(),
                absorbed_faults: 0,
            }),
            upstream,
        }
    }

    /// Number of upstream read errors absorbed into empty pages so far.
    ///
    /// From a caller's point of view an absorbed fault is identical to
    /// end-of-data; this counter is the only way to tell the two apart.
    pub fn absorbed_faults(&self) -> u64 {
        self.state.lock().absorbed_faults
    }

    /// Number of pages currently resident. Never exceeds the configured
    /// maximum.
    pub fn resident_pages(&self) -> usize {
        self.state.lock().slots.len()
    }

    /// Find or load the page starting at `page_offset`, marking it most
    /// recently used. Returns its slot index.
    fn page_slot(&self, state: &mut CacheState, page_offset: u64) -> usize {
        debug_assert_eq!(page_offset % self.page_size as u64, 0);

        if let Some(pos) = state
            .lru
            .iter()
            .position(|&slot| state.slots[slot].offset == page_offset)
        {
            if pos != 0 {
                let slot = state.lru.remove(pos).expect("position came from this deque");
                state.lru.push_front(slot);
            }
            return state.lru[0];
        }

        // Miss: reclaim the least recently used slot at capacity,
        // otherwise grow the arena by one.
        let slot = if state.slots.len() == self.max_pages {
            state
                .lru
                .pop_back()
                .expect("lru order tracks every allocated slot")
        } else {
            state.slots.push(Page::new(self.page_size));
            state.slots.len() - 1
        };

        // Exactly one upstream read per load. Errors become an empty
        // page; callers cannot tell that apart from end-of-data.
        let valid = match self.upstream.read_at(page_offset, &mut state.slots[slot].data) {
            Ok(n) => n,
            Err(err) => {
                state.absorbed_faults += 1;
                debug!(
                    offset = page_offset,
                    error = %err,
                    "upstream page load failed, serving empty page"
                );
                0
            }
        };

        let page = &mut state.slots[slot];
        page.offset = page_offset;
        page.valid = valid;
        state.lru.push_front(slot);
        slot
    }
}

impl<U: ByteSource + ?Sized> ByteSource for PageCache<U> {
    fn size(&self) -> ReaderResult<u64> {
        self.upstream.size()
    }

    fn read_at(&self, offset: u64, buf: &mut [u8]) -> ReaderResult<usize> {
        let mut state = self.state.lock();
        let page_size = self.page_size as u64;

        let mut copied = 0usize;
        while copied < buf.len() {
            let pos = offset + copied as u64;
            let in_page = (pos % page_size) as usize;
            let page_offset = pos - in_page as u64;

            let slot = self.page_slot(&mut state, page_offset);
            let page = &state.slots[slot];

            let chunk = page.valid.saturating_sub(in_page).min(buf.len() - copied);
            buf[copied..copied + chunk].copy_from_slice(&page.data[in_page..in_page + chunk]);
            copied += chunk;

            // A short page is the end-of-data signal (or an absorbed
            // upstream fault); requesting further bytes is pointless.
            if page.valid != self.page_size {
                break;
            }
        }

        Ok(copied)
    }

    fn read_string(&self, offset: u64) -> String {
        {
            let state = self.state.lock();
            if let Some(value) = state.strings.get(&offset) {
                return value.clone();
            }
        }

        // Routed through our own read_at, so the underlying bytes are
        // themselves page-cached. Computed outside the lock: the generic
        // algorithm re-enters read_at.
        let value = read_string_from(self, offset);
        self.state
            .lock()
            .strings
            .entry(offset)
            .or_insert(value)
            .clone()
    }

    fn describe(&self) -> String {
        self.upstream.describe()
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use procsift_test_utils::CountingSource;
    use rstest::*;

    use super::*;
    // The unit-test target is a second compilation of this crate, while
    // `CountingSource` was built against the lib artifact; use that copy
    // of the types so the trait impls line up.
    use procsift_reader::{ByteSource, MemorySource, PageCache};

    fn counting_cache(
        data: &[u8],
        page_size: usize,
        max_pages: usize,
    ) -> (Arc<CountingSource<MemorySource<'_>>>, PageCache<CountingSource<MemorySource<'_>>>) {
        let upstream = Arc::new(CountingSource::new(MemorySource::new(data)));
        let cache = PageCache::with_geometry(Arc::clone(&upstream), page_size, max_pages);
        (upstream, cache)
    }

    #[rstest]
    #[timeout(Duration::from_secs(1))]
    #[test]
    fn assembles_full_reads_from_page_loads() {
        let data = b"0123456789";
        let (upstream, cache) = counting_cache(data, 4, 16);

        let mut buf = [0u8; 10];
        let n = cache.read_at(0, &mut buf).unwrap();
        assert_eq!(n, 10);
        assert_eq!(&buf, b"0123456789");
        // Pages at offsets 0, 4 and 8, one upstream load each.
        assert_eq!(upstream.reads(), 3);
    }

    #[rstest]
    #[timeout(Duration::from_secs(1))]
    #[test]
    fn repeated_reads_hit_the_cache() {
        let data = b"0123456789";
        let (upstream, cache) = counting_cache(data, 4, 16);

        let mut buf = [0u8; 10];
        cache.read_at(0, &mut buf).unwrap();
        let loads = upstream.reads();

        for _ in 0..5 {
            let n = cache.read_at(0, &mut buf).unwrap();
            assert_eq!(n, 10);
        }
        assert_eq!(upstream.reads(), loads);
    }

    #[rstest]
    #[timeout(Duration::from_secs(1))]
    #[test]
    fn lru_page_is_evicted_first() {
        let data = [7u8; 64];
        let (upstream, cache) = counting_cache(&data, 4, 2);
        let mut byte = [0u8; 1];

        // Touch pages 0, 4, 8: page 0 falls off a 2-page cache.
        cache.read_at(0, &mut byte).unwrap();
        cache.read_at(4, &mut byte).unwrap();
        cache.read_at(8, &mut byte).unwrap();
        assert_eq!(upstream.reads(), 3);
        assert_eq!(cache.resident_pages(), 2);

        // Page 8 is still resident, page 0 needs one fresh load.
        cache.read_at(8, &mut byte).unwrap();
        assert_eq!(upstream.reads(), 3);
        cache.read_at(0, &mut byte).unwrap();
        assert_eq!(upstream.reads(), 4);
    }

    #[rstest]
    #[timeout(Duration::from_secs(1))]
    #[test]
    fn touching_a_page_protects_it_from_eviction() {
        let data = [7u8; 64];
        let (upstream, cache) = counting_cache(&data, 4, 2);
        let mut byte = [0u8; 1];

        cache.read_at(0, &mut byte).unwrap();
        cache.read_at(4, &mut byte).unwrap();
        // Re-touch page 0, making page 4 the eviction candidate.
        cache.read_at(0, &mut byte).unwrap();
        cache.read_at(8, &mut byte).unwrap();
        assert_eq!(upstream.reads(), 3);

        // Page 0 survived; page 4 did not.
        cache.read_at(0, &mut byte).unwrap();
        assert_eq!(upstream.reads(), 3);
        cache.read_at(4, &mut byte).unwrap();
        assert_eq!(upstream.reads(), 4);
    }

    #[rstest]
    #[timeout(Duration::from_secs(1))]
    #[test]
    fn capacity_is_never_exceeded() {
        let data = [1u8; 4096];
        let (_upstream, cache) = counting_cache(&data, 4, 3);
        let mut byte = [0u8; 1];

        for page in 0..32u64 {
            cache.read_at(page * 4, &mut byte).unwrap();
            assert!(cache.resident_pages() <= 3);
        }
        assert_eq!(cache.resident_pages(), 3);
    }

    #[rstest]
    #[timeout(Duration::from_secs(1))]
    #[test]
    fn read_string_is_memoized() {
        let data = b"ab\0cd";
        let (upstream, cache) = counting_cache(data, 4, 16);

        assert_eq!(cache.read_string(0), "ab");
        let loads = upstream.reads();

        // Second lookup comes from the string cache, no upstream reads.
        assert_eq!(cache.read_string(0), "ab");
        assert_eq!(upstream.reads(), loads);
    }

    #[rstest]
    #[timeout(Duration::from_secs(1))]
    #[test]
    fn read_string_truncates_at_end_of_data() {
        let data = b"ab\0cd";
        let (_upstream, cache) = counting_cache(data, 4, 16);

        assert_eq!(cache.read_string(3), "cd");
    }

    #[rstest]
    #[timeout(Duration::from_secs(1))]
    #[test]
    fn read_at_or_past_end_returns_zero_not_error() {
        let data = b"0123456789";
        let (_upstream, cache) = counting_cache(data, 4, 16);
        let mut buf = [0u8; 4];

        assert_eq!(cache.read_at(10, &mut buf).unwrap(), 0);
        // Unlike the bare memory source, the cache absorbs even a
        // strictly-past-the-end start into an empty result.
        assert_eq!(cache.read_at(11, &mut buf).unwrap(), 0);
        assert_eq!(cache.read_at(4096, &mut buf).unwrap(), 0);
    }

    #[rstest]
    #[timeout(Duration::from_secs(1))]
    #[test]
    fn geometry_defaults_match_constants() {
        let data = [0u8; 1];
        let upstream = Arc::new(crate::MemorySource::new(&data));
        let cache = super::PageCache::new(upstream);
        assert_eq!(cache.page_size, PAGE_SIZE);
        assert_eq!(cache.max_pages, MAX_PAGES);
    }

    #[test]
    #[should_panic(expected = "power of two")]
    fn rejects_non_power_of_two_pages() {
        let data = [0u8; 1];
        let upstream = Arc::new(MemorySource::new(&data));
        let _ = PageCache::with_geometry(upstream, 3, 2);
    }
}
