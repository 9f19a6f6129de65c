#![forbid(unsafe_code)]

use std::{
    fs::File,
    os::unix::fs::FileExt,
    path::PathBuf,
    sync::OnceLock,
};

use tracing::debug;

use crate::{ByteSource, ReaderError, ReaderResult};

/// Configuration for opening file-backed sources.
///
/// Passed explicitly to [`FileSource::open`] and [`load_file`](crate::load_file)
/// instead of living in process-wide state, so callers can open files
/// from different roots side by side.
#[derive(Clone, Debug, Default)]
pub struct FileOptions {
    /// Alternate root to try first when opening.
    ///
    /// When set, opens attempt `sysroot ++ path` (byte concatenation, so
    /// an absolute `path` lands inside the root) before falling back to
    /// `path` unmodified.
    pub sysroot: Option<PathBuf>,
}

impl FileOptions {
    /// Set the sysroot prefix.
    pub fn with_sysroot(mut self, sysroot: impl Into<PathBuf>) -> Self {
        self.sysroot = Some(sysroot.into());
        self
    }
}

/// [`ByteSource`] backed by an open file handle.
///
/// Reads are positioned (`pread`), so they never move a shared cursor.
/// The size is resolved lazily on the first `size()` call and memoized;
/// the file is assumed immutable for the reader's lifetime. The handle is
/// released on drop regardless of how reads went.
#[derive(Debug)]
pub struct FileSource {
    path: PathBuf,
    file: File,
    size: OnceLock<u64>,
}

impl FileSource {
    /// Open `path` for read-only access.
    ///
    /// With a configured sysroot, the prefixed path is tried first and
    /// the plain path is the fallback. Fails only when every attempt
    /// fails, carrying the OS error of the plain open.
    pub fn open(path: impl Into<PathBuf>, options: &FileOptions) -> ReaderResult<Self> {
        let path = path.into();

        if let Some(prefix) = &options.sysroot {
            let mut prefixed = prefix.as_os_str().to_os_string();
            prefixed.push(path.as_os_str());
            let prefixed = PathBuf::from(prefixed);
            match File::open(&prefixed) {
                Ok(file) => {
                    debug!(path = %prefixed.display(), "opened file under sysroot prefix");
                    return Ok(Self {
                        path,
                        file,
                        size: OnceLock::new(),
                    });
                }
                Err(err) => {
                    debug!(
                        path = %prefixed.display(),
                        error = %err,
                        "sysroot open failed, falling back to plain path"
                    );
                }
            }
        }

        match File::open(&path) {
            Ok(file) => {
                debug!(path = %path.display(), "opened file");
                Ok(Self {
                    path,
                    file,
                    size: OnceLock::new(),
                })
            }
            Err(source) => Err(ReaderError::Open { path, source }),
        }
    }
}

impl ByteSource for FileSource {
    fn size(&self) -> ReaderResult<u64> {
        if let Some(len) = self.size.get() {
            return Ok(*len);
        }
        let meta = self.file.metadata().map_err(|source| ReaderError::Stat {
            desc: self.describe(),
            source,
        })?;
        Ok(*self.size.get_or_init(|| meta.len()))
    }

    fn read_at(&self, offset: u64, buf: &mut [u8]) -> ReaderResult<usize> {
        // One positioned read; a short count is the normal EOF signal.
        self.file
            .read_at(buf, offset)
            .map_err(|source| ReaderError::Read {
                count: buf.len(),
                offset,
                desc: self.describe(),
                source,
            })
    }

    fn describe(&self) -> String {
        format!("file {}", self.path.display())
    }
}
