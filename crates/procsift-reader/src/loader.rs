#![forbid(unsafe_code)]

use std::{path::PathBuf, sync::Arc};

use crate::{ByteSource, FileOptions, FileSource, PageCache, ReaderResult};

/// Open `path` for cached random access.
///
/// Composes a [`FileSource`] with a [`PageCache`] and hands the result
/// back as a shared handle, so multiple consumers can share one cache
/// instance over one file.
pub fn load_file(
    path: impl Into<PathBuf>,
    options: &FileOptions,
) -> ReaderResult<Arc<dyn ByteSource + Send + Sync>> {
    let file = FileSource::open(path, options)?;
    Ok(Arc::new(PageCache::new(Arc::new(file))))
}
